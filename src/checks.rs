use crate::config::{Config, GateScope};
use crate::error::Error;
use crate::utils::permissions::{self, Verdict};
use crate::Context;
use tracing::debug;

/// What the global check still has to verify before a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Trusted,
}

/// Disabled commands are refused outright; otherwise the gate scope decides
/// whether the trusted-role check applies to `command`.
pub fn gate_for(config: &Config, command: &str) -> Result<Gate, Error> {
    if config.is_disabled(command) {
        return Err(Error::CommandDisabled);
    }

    Ok(match config.gate_scope {
        GateScope::Global => Gate::Trusted,
        GateScope::Sensitive => Gate::Open,
    })
}

/// Global pre-command check.
///
/// Gated commands carry [`trusted`] themselves under the default scope.
pub async fn command_check(ctx: Context<'_>) -> Result<bool, Error> {
    match gate_for(&ctx.data().config, &ctx.command().name)? {
        Gate::Trusted => trusted(ctx).await,
        Gate::Open => Ok(true),
    }
}

/// Passes for trusted operators anywhere, and for members of the trusted
/// role inside a guild. A plain `false` is a silent refusal.
pub async fn trusted(ctx: Context<'_>) -> Result<bool, Error> {
    let verdict = permissions::evaluate(&ctx.data().config, ctx.author().id, ctx.guild_id())?;

    let allowed = match verdict {
        Verdict::Operator => true,
        Verdict::Denied => false,
        Verdict::RequiresRole(role) => ctx
            .author_member()
            .await
            .is_some_and(|member| member.roles.contains(&role)),
    };

    if !allowed {
        debug!(
            user = %ctx.author().name,
            command = %ctx.command().name,
            "Trusted role check failed"
        );
    }

    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scope: &str, disabled: &str) -> Config {
        let vars = [
            ("DISCORD_TOKEN", "token"),
            ("WEBHOOK_URL", crate::config::TEST_WEBHOOK_URL),
            ("GATE_SCOPE", scope),
            ("DISABLED_COMMANDS", disabled),
        ];
        Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn sensitive_scope_leaves_commands_open() {
        let config = config("sensitive", "");
        assert_eq!(gate_for(&config, "ping").unwrap(), Gate::Open);
        assert_eq!(gate_for(&config, "status").unwrap(), Gate::Open);
    }

    #[test]
    fn global_scope_gates_every_command() {
        let config = config("global", "");
        assert_eq!(gate_for(&config, "ping").unwrap(), Gate::Trusted);
        assert_eq!(gate_for(&config, "help").unwrap(), Gate::Trusted);
    }

    #[test]
    fn disabled_command_is_refused_under_any_scope() {
        for scope in ["sensitive", "global"] {
            let config = config(scope, "pancake");
            assert!(matches!(
                gate_for(&config, "pancake"),
                Err(Error::CommandDisabled)
            ));
            assert!(gate_for(&config, "ping").is_ok());
        }
    }
}

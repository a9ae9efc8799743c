use crate::error::Error;
use crate::integrations::webhook::WebhookTarget;
use serenity::all::{RoleId, UserId};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 1800;
pub const DEFAULT_IP_SERVICE_URL: &str = "http://ipinfo.io/ip";
pub const DEFAULT_QUERY_PORT: u16 = 27015;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;

#[cfg(test)]
pub(crate) const TEST_WEBHOOK_URL: &str =
    "https://discord.com/api/webhooks/1234567890123456789/abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

/// Which commands the trusted-role gate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateScope {
    /// Every command is gated.
    Global,
    /// Only commands that reveal operational details (`ip`) are gated.
    #[default]
    Sensitive,
}

impl FromStr for GateScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "all" => Ok(GateScope::Global),
            "sensitive" | "ip" => Ok(GateScope::Sensitive),
            other => Err(Error::Config(format!(
                "Invalid GATE_SCOPE '{other}', expected 'global' or 'sensitive'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub webhook: WebhookTarget,
    pub trusted_operators: Vec<UserId>,
    pub trusted_role: Option<RoleId>,
    pub check_interval: Duration,
    pub ip_state_path: PathBuf,
    pub ip_service_url: String,
    pub query_host: String,
    pub query_port: u16,
    pub query_timeout: Duration,
    pub command_prefix: String,
    pub gate_scope: GateScope,
    pub disabled_commands: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DISCORD_TOKEN` — Bot token from Discord Developer Portal
    /// - `WEBHOOK_URL` — Webhook that receives IP announcements
    ///
    /// Optional:
    /// - `TRUSTED_OPERATOR_IDS` — Comma-separated user IDs that bypass every check
    /// - `TRUSTED_ROLE_ID` — Role whose members may use gated commands
    /// - `CHECK_INTERVAL_SECS` — Seconds between IP checks (default 1800)
    /// - `IP_STATE_PATH` — File holding the last seen IP (default `ip.txt`)
    /// - `IP_SERVICE_URL` — Plain-text "what is my IP" endpoint
    /// - `QUERY_HOST` / `QUERY_PORT` / `QUERY_TIMEOUT_SECS` — Game server query target
    /// - `COMMAND_PREFIX` — Prefix for text commands (default `?`)
    /// - `GATE_SCOPE` — `sensitive` (default) or `global`
    /// - `DISABLED_COMMANDS` — Comma-separated command names to refuse
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` is the production caller.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = var("DISCORD_TOKEN")
            .ok_or_else(|| Error::Config("DISCORD_TOKEN environment variable is required".into()))?;

        let webhook_url = var("WEBHOOK_URL")
            .ok_or_else(|| Error::Config("WEBHOOK_URL environment variable is required".into()))?;
        let webhook = WebhookTarget::parse(&webhook_url)?;

        let trusted_operators =
            parse_id_list::<UserId>("TRUSTED_OPERATOR_IDS", var("TRUSTED_OPERATOR_IDS"))?;
        let trusted_role = parse_optional_id::<RoleId>("TRUSTED_ROLE_ID", var("TRUSTED_ROLE_ID"))?;

        let check_interval = Duration::from_secs(parse_or(
            "CHECK_INTERVAL_SECS",
            var("CHECK_INTERVAL_SECS"),
            DEFAULT_CHECK_INTERVAL_SECS,
        )?);
        if check_interval.is_zero() {
            return Err(Error::Config("CHECK_INTERVAL_SECS must be greater than zero".into()));
        }

        let query_timeout = Duration::from_secs(parse_or(
            "QUERY_TIMEOUT_SECS",
            var("QUERY_TIMEOUT_SECS"),
            DEFAULT_QUERY_TIMEOUT_SECS,
        )?);

        let gate_scope = match var("GATE_SCOPE") {
            Some(raw) => raw.parse()?,
            None => GateScope::default(),
        };

        let disabled_commands = var("DISABLED_COMMANDS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            discord_token,
            webhook,
            trusted_operators,
            trusted_role,
            check_interval,
            ip_state_path: var("IP_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ip.txt")),
            ip_service_url: var("IP_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_IP_SERVICE_URL.into()),
            query_host: var("QUERY_HOST").unwrap_or_else(|| "127.0.0.1".into()),
            query_port: parse_or("QUERY_PORT", var("QUERY_PORT"), DEFAULT_QUERY_PORT)?,
            query_timeout,
            command_prefix: var("COMMAND_PREFIX").unwrap_or_else(|| "?".into()),
            gate_scope,
            disabled_commands,
        })
    }

    pub fn is_trusted_operator(&self, user: UserId) -> bool {
        self.trusted_operators.contains(&user)
    }

    pub fn is_disabled(&self, command: &str) -> bool {
        self.disabled_commands
            .iter()
            .any(|name| name.eq_ignore_ascii_case(command))
    }
}

fn parse_id_list<T>(var: &str, value: Option<String>) -> Result<Vec<T>, Error>
where
    T: From<u64>,
{
    match value {
        Some(val) => val
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|id| *id != 0)
                    .map(T::from)
                    .ok_or_else(|| Error::Config(format!("Invalid ID in {var}: '{s}'")))
            })
            .collect(),
        None => Ok(Vec::new()),
    }
}

fn parse_optional_id<T>(var: &str, value: Option<String>) -> Result<Option<T>, Error>
where
    T: From<u64>,
{
    match value {
        Some(val) => {
            let id = val
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .ok_or_else(|| Error::Config(format!("Invalid ID for {var}: '{val}'")))?;
            Ok(Some(T::from(id)))
        }
        None => Ok(None),
    }
}

fn parse_or<T: FromStr>(var: &str, value: Option<String>, default: T) -> Result<T, Error> {
    match value {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("Invalid value for {var}: '{val}'"))),
        None => Ok(default),
    }
}

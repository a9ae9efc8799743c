use crate::config::Config;
use crate::error::Error;
use serenity::all::{GuildId, RoleId, UserId};

/// What the trusted-role gate decided before any Discord lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Trusted operator, always allowed.
    Operator,
    /// Allowed only if the invoking member holds this role.
    RequiresRole(RoleId),
    /// No role is configured, so only operators get through.
    Denied,
}

/// Decide how an invocation is authorized.
///
/// Operators pass anywhere. Everyone else needs a guild: a direct message
/// fails with [`Error::PrivateContextNotAllowed`] before any role lookup.
pub fn evaluate(config: &Config, user: UserId, guild: Option<GuildId>) -> Result<Verdict, Error> {
    if config.is_trusted_operator(user) {
        return Ok(Verdict::Operator);
    }

    if guild.is_none() {
        return Err(Error::PrivateContextNotAllowed);
    }

    Ok(match config.trusted_role {
        Some(role) => Verdict::RequiresRole(role),
        None => Verdict::Denied,
    })
}

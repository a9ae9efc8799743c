//! Centralized command error handling.
//!
//! Every framework error is first turned into a [`Fault`], then [`classify`]
//! maps the fault to an [`Action`]. Only the final step talks to Discord.

use crate::error::{error_chain, Error};
use crate::utils::{embeds, text};
use crate::{Context, Data};
use async_trait::async_trait;
use serenity::all::{CreateMessage, UserId};
use std::time::Duration;
use tracing::{error, warn};

const GENERIC_FAILURE: &str = "Sorry, an unexpected error occurred.";
const PLACEHOLDER_DETAIL_LIMIT: usize = 1500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    PrivateContextNotAllowed,
    UnknownCommand,
    CommandDisabled,
    UserMissingPermission,
    BotMissingPermission,
    AuthorizationDenied,
    OnCooldown(Duration),
    InvalidArgument(String),
    Unclassified { detail: String, trace: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Silent,
    Reply(String),
    ReplyWithHelp(String),
    Escalate {
        reply: String,
        detail: String,
        trace: String,
    },
}

impl Fault {
    pub fn from_command_error(error: &Error) -> Self {
        match error {
            Error::PrivateContextNotAllowed => Fault::PrivateContextNotAllowed,
            Error::CommandDisabled => Fault::CommandDisabled,
            Error::InvalidArgument(detail) => Fault::InvalidArgument(detail.clone()),
            other => Fault::Unclassified {
                detail: other.to_string(),
                trace: error_chain(other),
            },
        }
    }

    /// `None` for framework errors that aren't about a command invocation
    /// (setup, event handler, ...); those go to poise's default handler.
    pub fn from_framework(error: &poise::FrameworkError<'_, Data, Error>) -> Option<Self> {
        use poise::FrameworkError as E;

        let fault = match error {
            E::GuildOnly { .. } => Fault::PrivateContextNotAllowed,
            E::UnknownCommand { .. } => Fault::UnknownCommand,
            E::MissingUserPermissions { .. } => Fault::UserMissingPermission,
            E::MissingBotPermissions { .. } => Fault::BotMissingPermission,
            E::CommandCheckFailed { error: None, .. } => Fault::AuthorizationDenied,
            E::CommandCheckFailed { error: Some(e), .. } => Fault::from_command_error(e),
            E::CooldownHit {
                remaining_cooldown, ..
            } => Fault::OnCooldown(*remaining_cooldown),
            E::ArgumentParse { error, input, .. } => Fault::InvalidArgument(match input {
                Some(input) => format!("Could not parse `{input}`: {error}"),
                None => error.to_string(),
            }),
            E::Command { error, .. } => Fault::from_command_error(error),
            E::CommandPanic { payload, .. } => Fault::Unclassified {
                detail: "Command panicked".into(),
                trace: payload.clone().unwrap_or_default(),
            },
            _ => return None,
        };
        Some(fault)
    }
}

pub fn classify(fault: &Fault, command: &str) -> Action {
    match fault {
        Fault::PrivateContextNotAllowed => {
            Action::Reply(format!("{command} cannot be used in DMs"))
        }
        Fault::UnknownCommand => Action::Silent,
        Fault::CommandDisabled => Action::Reply(format!("{command} has been disabled")),
        Fault::UserMissingPermission => {
            Action::Reply(format!("You are Missing Permissions for {command}"))
        }
        Fault::BotMissingPermission => {
            Action::Reply(format!("I am Missing Permissions for {command}"))
        }
        Fault::AuthorizationDenied => Action::Silent,
        Fault::OnCooldown(remaining) => Action::Reply(format!(
            "This command is on a cooldown. Try again in {} seconds",
            remaining.as_secs()
        )),
        Fault::InvalidArgument(detail) => Action::ReplyWithHelp(detail.clone()),
        Fault::Unclassified { detail, trace } => Action::Escalate {
            reply: GENERIC_FAILURE.into(),
            detail: detail.clone(),
            trace: trace.clone(),
        },
    }
}

/// Poise `on_error` hook.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    let Some(fault) = Fault::from_framework(&error) else {
        if let Err(e) = poise::builtins::on_error(error).await {
            error!(error = %e, "Error handling error");
        }
        return;
    };

    // unknown commands never resolve to a command context
    let Some(ctx) = error.ctx() else {
        return;
    };
    let command = ctx.command().name.clone();

    match classify(&fault, &command) {
        Action::Silent => {}
        Action::Reply(message) => reply(ctx, &message).await,
        Action::ReplyWithHelp(message) => {
            reply(ctx, &message).await;
            let help = poise::builtins::help(
                ctx,
                Some(command.as_str()),
                poise::builtins::HelpConfiguration::default(),
            )
            .await;
            if let Err(e) = help {
                warn!(command = %command, error = %e, "Failed to send command help");
            }
        }
        Action::Escalate {
            reply: message,
            detail,
            trace,
        } => {
            error!(
                command = %command,
                user = %ctx.author().name,
                error = %detail,
                trace = %trace,
                "Unexpected command error"
            );
            reply(ctx, &message).await;
            report_to_operators(
                &DiscordDm(ctx.serenity_context()),
                &ctx.data().config.trusted_operators,
                &ctx.author().name,
                &command,
                &detail,
                &trace,
            )
            .await;
        }
    }
}

async fn reply(ctx: Context<'_>, message: &str) {
    let embed = embeds::error_embed().description(text::escape_mentions(message));
    if let Err(e) = ctx.send(poise::CreateReply::default().embed(embed)).await {
        error!(error = %e, "Failed to send error reply");
    }
}

/// Private message channel to a single user.
#[async_trait]
pub trait DirectMessenger: Send + Sync {
    async fn direct_message(&self, user: UserId, content: &str) -> Result<(), Error>;
}

struct DiscordDm<'a>(&'a serenity::all::Context);

#[async_trait]
impl DirectMessenger for DiscordDm<'_> {
    async fn direct_message(&self, user: UserId, content: &str) -> Result<(), Error> {
        let channel = user.create_dm_channel(self.0).await?;
        channel
            .id
            .send_message(self.0, CreateMessage::new().content(content))
            .await?;
        Ok(())
    }
}

/// DM every operator the full report, falling back to a short placeholder
/// when the full one is rejected.
pub async fn report_to_operators(
    dm: &dyn DirectMessenger,
    operators: &[UserId],
    user: &str,
    command: &str,
    detail: &str,
    trace: &str,
) {
    let full = operator_report(user, command, detail, trace);
    let placeholder = operator_placeholder(user, command, detail);

    for &operator in operators {
        if let Err(e) = dm.direct_message(operator, &full).await {
            warn!(operator = %operator, error = %e, "Full error report rejected, sending placeholder");
            if let Err(e) = dm.direct_message(operator, &placeholder).await {
                error!(operator = %operator, error = %e, "Failed to notify operator");
            }
        }
    }
}

pub fn operator_report(user: &str, command: &str, detail: &str, trace: &str) -> String {
    format!("[Error Handler] [{user} used {command}]: {detail}\n```\n{trace}\n```")
}

pub fn operator_placeholder(user: &str, command: &str, detail: &str) -> String {
    format!(
        "[Error Handler] [{user} used {command}]: {}\n```Error too large, check server logs```",
        text::truncate(detail, PLACEHOLDER_DETAIL_LIMIT)
    )
}

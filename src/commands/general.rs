use crate::Context;
use std::time::Duration;

type Error = crate::error::Error;

/// Pong!
#[poise::command(prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(latency_reply("Pong!", ctx.ping().await)).await?;
    Ok(())
}

/// Ping!
#[poise::command(prefix_command)]
pub async fn pong(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(latency_reply("Ping!", ctx.ping().await)).await?;
    Ok(())
}

/// Pancake
#[poise::command(prefix_command)]
pub async fn pancake(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("\u{1F95E}").await?;
    Ok(())
}

/// List all available commands.
#[poise::command(prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to get help for"] command: Option<String>,
) -> Result<(), Error> {
    if let Some(name) = command.as_deref() {
        let known = ctx
            .framework()
            .options()
            .commands
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name) || c.aliases.iter().any(|a| a == name));
        if !known {
            return Err(Error::InvalidArgument(format!("No command called `{name}`")));
        }
    }

    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: "Type ?help command for more info on a command.",
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

/// Gateway latency rendered as whole milliseconds.
pub fn latency_reply(label: &str, latency: Duration) -> String {
    format!("{label} {} ms", latency.as_millis())
}

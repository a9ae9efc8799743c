use crate::integrations::ip_service::fetch_ip;
use crate::integrations::metrics::{self, CPU_SAMPLE_WINDOW};
use crate::integrations::query::{QueryError, ServerInfo};
use crate::utils::embeds;
use crate::Context;
use tracing::warn;

type Error = crate::error::Error;

/// Gets the IP
#[poise::command(
    prefix_command,
    check = "crate::checks::trusted",
    required_bot_permissions = "SEND_MESSAGES | EMBED_LINKS"
)]
pub async fn ip(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let ip = fetch_ip(&data.http_client, &data.config.ip_service_url).await?;

    let embed = embeds::info_embed()
        .title("IP")
        .description(format!("|| {ip} ||"));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// System's status. Note this will take 2 seconds or longer to run
#[poise::command(prefix_command, user_cooldown = 5)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let query = &ctx.data().query;
    let (system, server) = tokio::join!(metrics::sample(CPU_SAMPLE_WINDOW), query.info());

    if let Err(e) = &server {
        warn!(server = %query.target(), error = %e, "Game server query failed");
    }

    let embed = embeds::info_embed()
        .title("System Status")
        .field("CPU Usage Percent", system.cpu_field(), false)
        .field("Memory Usage", system.memory_field(), false)
        .field("Game Server", server_field(&server), false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// A failed query means the server is down; it never becomes a command error.
pub fn server_field(result: &Result<ServerInfo, QueryError>) -> String {
    match result {
        Ok(info) => format!(
            "{}: {}/{} players on {}",
            info.name, info.players, info.max_players, info.map
        ),
        Err(_) => "Server is currently down".to_string(),
    }
}

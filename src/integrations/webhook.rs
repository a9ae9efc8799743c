use crate::error::Error;
use crate::utils::embeds;
use crate::watcher::Notifier;
use async_trait::async_trait;
use serenity::all::{CreateEmbed, ExecuteWebhook, WebhookId};
use serenity::http::Http;
use std::sync::Arc;

/// Embed-style message carried by a webhook post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    pub description: String,
    pub color: u32,
}

impl Announcement {
    pub fn to_embed(&self) -> CreateEmbed {
        embeds::info_embed()
            .title(&self.title)
            .description(&self.description)
            .color(self.color)
    }
}

/// Display name and avatar the webhook posts under.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Id and token of a Discord webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub id: WebhookId,
    pub token: String,
}

impl WebhookTarget {
    /// Parse a `https://discord.com/api/webhooks/{id}/{token}` URL.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let invalid = || Error::Config(format!("Invalid Discord webhook URL: '{url}'"));
        let parsed = reqwest::Url::parse(url.trim()).map_err(|_| invalid())?;
        let (id, token) = serenity::utils::parse_webhook(&parsed).ok_or_else(invalid)?;
        Ok(Self {
            id,
            token: token.to_string(),
        })
    }
}

/// Posts messages to a single Discord webhook, impersonating the bot.
#[derive(Clone)]
pub struct WebhookSink {
    http: Arc<Http>,
    target: WebhookTarget,
    identity: Identity,
}

impl WebhookSink {
    pub fn new(http: Arc<Http>, target: WebhookTarget, identity: Identity) -> Self {
        Self {
            http,
            target,
            identity,
        }
    }

    pub async fn send(&self, content: Option<&str>, embed: Option<CreateEmbed>) -> Result<(), Error> {
        let mut builder = ExecuteWebhook::new().username(&self.identity.username);
        if let Some(avatar_url) = &self.identity.avatar_url {
            builder = builder.avatar_url(avatar_url);
        }
        if let Some(content) = content {
            builder = builder.content(content);
        }
        if let Some(embed) = embed {
            builder = builder.embed(embed);
        }

        self.http
            .execute_webhook(self.target.id, None, &self.target.token, false, Vec::new(), &builder)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookSink {
    async fn notify(&self, announcement: Announcement) -> Result<(), Error> {
        self.send(None, Some(announcement.to_embed())).await
    }
}

//! Background loop that watches the host's external IP address.
//!
//! Each tick fetches the current address, compares it with the last one seen
//! and, when it changed (or nothing was known yet), announces it through the
//! notifier before persisting it. The loop supervises its own ticks: no fault
//! is allowed to end it.

use crate::error::{error_chain, Error};
use crate::integrations::webhook::Announcement;
use crate::utils::embeds;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Delay before retrying a tick that could not reach the network.
pub const CONNECTIVITY_RETRY: Duration = Duration::from_secs(10);

/// Where the current external IP comes from.
#[async_trait]
pub trait IpSource: Send + Sync {
    async fn current_ip(&self) -> Result<String, Error>;
}

/// Durable storage for the last announced IP.
#[async_trait]
pub trait IpStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, Error>;
    async fn save(&self, ip: &str) -> Result<(), Error>;
}

/// Outbound announcement channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, announcement: Announcement) -> Result<(), Error>;
}

/// Result of a single successful tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was known before; the address was announced as a fresh start.
    Established(String),
    /// The address differs from the stored one.
    Changed { old: String, new: String },
    Unchanged,
}

pub struct IpWatcher<S, P, N> {
    source: S,
    store: P,
    notifier: N,
    interval: Duration,
    current: Option<String>,
}

impl<S, P, N> IpWatcher<S, P, N>
where
    S: IpSource,
    P: IpStore,
    N: Notifier,
{
    pub fn new(source: S, store: P, notifier: N, interval: Duration) -> Self {
        Self {
            source,
            store,
            notifier,
            interval,
            current: None,
        }
    }

    /// The address held in memory, if one has been established.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Run one fetch/compare/persist/notify cycle.
    ///
    /// On the first tick the stored address is adopted before comparing, so a
    /// restart with an unchanged IP stays quiet. An unreadable state file is
    /// treated like a missing one.
    ///
    /// Once an announcement is delivered the address is held in memory even if
    /// persisting it fails, so the same change is never announced twice.
    pub async fn tick(&mut self) -> Result<TickOutcome, Error> {
        if self.current.is_none() {
            match self.store.load().await {
                Ok(Some(saved)) => {
                    info!(ip = %saved, "Loaded last known IP from state file");
                    self.current = Some(saved);
                }
                Ok(None) => debug!("No stored IP, treating this as a cold start"),
                Err(e) => warn!(error = %e, "Could not read stored IP, treating this as a cold start"),
            }
        }

        let fetched = self.source.current_ip().await?;

        let (outcome, announcement) = match self.current.as_deref() {
            None => (
                TickOutcome::Established(fetched.clone()),
                started_announcement(&fetched),
            ),
            Some(known) if known != fetched => (
                TickOutcome::Changed {
                    old: known.to_string(),
                    new: fetched.clone(),
                },
                changed_announcement(&fetched),
            ),
            Some(_) => return Ok(TickOutcome::Unchanged),
        };

        self.notifier.notify(announcement).await?;
        self.current = Some(fetched.clone());
        self.store.save(&fetched).await?;

        Ok(outcome)
    }

    /// Tick forever. Connectivity faults retry after [`CONNECTIVITY_RETRY`];
    /// everything else waits the full interval.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "IP watcher started");
        loop {
            let delay = match self.tick().await {
                Ok(TickOutcome::Established(ip)) => {
                    info!(ip = %ip, "Announced IP on startup");
                    self.interval
                }
                Ok(TickOutcome::Changed { old, new }) => {
                    info!(old = %old, new = %new, "IP changed");
                    self.interval
                }
                Ok(TickOutcome::Unchanged) => {
                    debug!("IP unchanged");
                    self.interval
                }
                Err(e) if e.is_connectivity() => {
                    error!(error = %e, "Connection error, retrying in 10 seconds");
                    CONNECTIVITY_RETRY
                }
                Err(e) => {
                    error!(error = %e, detail = %error_chain(&e), "IP check failed");
                    self.interval
                }
            };
            tokio::time::sleep(delay).await;
        }
    }
}

pub fn started_announcement(ip: &str) -> Announcement {
    Announcement {
        title: "Bot started".into(),
        description: format!(
            "The bot has restarted / started. Just in case, here is the ip. Please use || {ip} ||"
        ),
        color: embeds::random_color(),
    }
}

pub fn changed_announcement(ip: &str) -> Announcement {
    Announcement {
        title: "New IP".into(),
        description: format!("IP has changed. Please use || {ip} ||"),
        color: embeds::random_color(),
    }
}

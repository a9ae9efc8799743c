use crate::integrations::ip_service::IpService;
use crate::integrations::webhook::{Identity, WebhookSink};
use crate::state::FileStore;
use crate::watcher::IpWatcher;
use crate::Data;
use serenity::all::{ActivityData, Context, FullEvent, Ready};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pause before a panicked background task is started again.
pub const RESTART_DELAY: Duration = Duration::from_secs(10);

/// One-shot latch: only the first [`StartLatch::try_claim`] returns true.
#[derive(Debug, Default)]
pub struct StartLatch(AtomicBool);

impl StartLatch {
    pub fn try_claim(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle lifecycle events. Ready may fire again after every reconnect.
pub async fn handle_event(ctx: &Context, event: &FullEvent, data: &Data) {
    if let FullEvent::Ready { data_about_bot } = event {
        handle_ready(ctx, data_about_bot, data).await;
    }
}

async fn handle_ready(ctx: &Context, ready: &Ready, data: &Data) {
    info!(bot = %ready.user.name, guilds = ready.guilds.len(), "Logged in");
    ctx.set_activity(Some(ActivityData::watching("the server IP")));

    if !data.watcher_latch.try_claim() {
        debug!("IP watcher already running, ignoring repeated ready");
        return;
    }

    let identity = Identity {
        username: ready
            .user
            .global_name
            .clone()
            .unwrap_or_else(|| ready.user.name.clone()),
        avatar_url: Some(ready.user.face()),
    };
    let config = data.config.clone();
    let http_client = data.http_client.clone();
    let discord = ctx.http.clone();

    tokio::spawn(supervise("ip-watcher", move || {
        IpWatcher::new(
            IpService::new(http_client.clone(), config.ip_service_url.clone()),
            FileStore::new(config.ip_state_path.clone()),
            WebhookSink::new(discord.clone(), config.webhook.clone(), identity.clone()),
            config.check_interval,
        )
        .run()
    }));
}

/// Run the task built by `make` and build a fresh one whenever it panics.
///
/// Returns once a task finishes without panicking.
pub async fn supervise<F, Fut>(name: &'static str, make: F)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        match tokio::spawn(make()).await {
            Ok(()) => {
                warn!(task = name, "Background task exited");
                return;
            }
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                error!(task = name, reason = %reason, "Background task panicked, restarting");
            }
            Err(e) => {
                warn!(task = name, error = %e, "Background task cancelled");
                return;
            }
        }
        tokio::time::sleep(RESTART_DELAY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn latch_opens_once() {
        let latch = StartLatch::default();
        assert!(!latch.is_claimed());
        assert!(latch.try_claim());
        assert!(latch.is_claimed());
        assert!(!latch.try_claim());
        assert!(!latch.try_claim());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ready_signals_claim_once() {
        let latch = Arc::new(StartLatch::default());
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let latch = Arc::clone(&latch);
                tokio::spawn(async move { latch.try_claim() })
            })
            .collect();

        let mut claimed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                claimed += 1;
            }
        }
        assert_eq!(claimed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panicked_task_is_started_again() {
        let starts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&starts);

        tokio::spawn(supervise("flaky", move || {
            let run = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if run == 0 {
                    panic!("first run blows up");
                }
                std::future::pending::<()>().await;
            }
        }));

        tokio::time::sleep(RESTART_DELAY / 2).await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        tokio::time::sleep(RESTART_DELAY).await;
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn finished_task_is_not_restarted() {
        let starts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&starts);

        supervise("oneshot", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        })
        .await;

        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }
}

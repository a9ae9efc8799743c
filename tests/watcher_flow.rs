//! End-to-end watcher ticks against a mock IP service and webhook, with the
//! state kept in a real file.

use ipwatch_bot::integrations::ip_service::IpService;
use ipwatch_bot::integrations::webhook::{Identity, WebhookSink, WebhookTarget};
use serenity::all::WebhookId;
use serenity::http::HttpBuilder;
use ipwatch_bot::state::FileStore;
use ipwatch_bot::watcher::{IpStore, IpWatcher, TickOutcome};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Watcher = IpWatcher<IpService, FileStore, WebhookSink>;

const HOOK_ID: u64 = 1234567890123456789;
const HOOK_PATH: &str = "/api/v10/webhooks/1234567890123456789/hook-token";

/// A webhook sink whose Discord API calls land on `server`.
fn sink(server: &MockServer, identity: Identity) -> WebhookSink {
    let http = HttpBuilder::new("test-token")
        .proxy(server.uri())
        .ratelimiter_disabled(true)
        .build();
    WebhookSink::new(
        Arc::new(http),
        WebhookTarget {
            id: WebhookId::new(HOOK_ID),
            token: "hook-token".into(),
        },
        identity,
    )
}

struct Harness {
    ip_service: MockServer,
    webhook: MockServer,
    dir: TempDir,
}

impl Harness {
    async fn new(current_ip: &str) -> Self {
        let ip_service = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("{current_ip}\n")))
            .mount(&ip_service)
            .await;

        let webhook = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(HOOK_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&webhook)
            .await;

        Self {
            ip_service,
            webhook,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn state_path(&self) -> std::path::PathBuf {
        self.dir.path().join("ip.txt")
    }

    fn watcher(&self) -> Watcher {
        let http = reqwest::Client::new();
        IpWatcher::new(
            IpService::new(http, format!("{}/ip", self.ip_service.uri())),
            FileStore::new(self.state_path()),
            sink(
                &self.webhook,
                Identity {
                    username: "IP Watch".into(),
                    avatar_url: None,
                },
            ),
            Duration::from_secs(1800),
        )
    }

    async fn fetches(&self) -> usize {
        self.ip_service.received_requests().await.unwrap().len()
    }

    /// Title and description of every embed posted to the webhook, in order.
    async fn announcements(&self) -> Vec<(String, String)> {
        self.webhook
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|req| {
                let body: serde_json::Value = req.body_json().unwrap();
                let embed = &body["embeds"][0];
                assert_eq!(body["username"], "IP Watch");
                (
                    embed["title"].as_str().unwrap().to_string(),
                    embed["description"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }
}

fn read_state(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

#[tokio::test]
async fn cold_start_announces_bot_started_with_ip() {
    let harness = Harness::new("203.0.113.10").await;
    let mut watcher = harness.watcher();

    let outcome = watcher.tick().await.unwrap();

    assert_eq!(outcome, TickOutcome::Established("203.0.113.10".into()));
    assert_eq!(harness.fetches().await, 1);
    assert_eq!(read_state(&harness.state_path()).as_deref(), Some("203.0.113.10"));

    let sent = harness.announcements().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Bot started");
    assert!(sent[0].1.contains("203.0.113.10"));
}

#[tokio::test]
async fn warm_start_with_changed_ip_announces_new_ip_only() {
    let harness = Harness::new("5.6.7.8").await;
    std::fs::write(harness.state_path(), "1.2.3.4").unwrap();
    let mut watcher = harness.watcher();

    let outcome = watcher.tick().await.unwrap();

    assert_eq!(
        outcome,
        TickOutcome::Changed {
            old: "1.2.3.4".into(),
            new: "5.6.7.8".into()
        }
    );
    assert_eq!(read_state(&harness.state_path()).as_deref(), Some("5.6.7.8"));

    let sent = harness.announcements().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "New IP");
    assert!(sent[0].1.contains("5.6.7.8"));
}

#[tokio::test]
async fn restart_with_unchanged_ip_stays_quiet() {
    let harness = Harness::new("1.2.3.4").await;
    std::fs::write(harness.state_path(), "1.2.3.4\n").unwrap();

    // two process lifetimes, each with a couple of ticks
    for _ in 0..2 {
        let mut watcher = harness.watcher();
        assert_eq!(watcher.tick().await.unwrap(), TickOutcome::Unchanged);
        assert_eq!(watcher.tick().await.unwrap(), TickOutcome::Unchanged);
    }

    assert_eq!(harness.fetches().await, 4);
    assert!(harness.announcements().await.is_empty());
    assert_eq!(
        FileStore::new(harness.state_path()).load().await.unwrap().as_deref(),
        Some("1.2.3.4")
    );
}

#[tokio::test]
async fn webhook_failure_is_retried_on_next_tick() {
    let harness = Harness::new("9.9.9.9").await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&webhook)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&webhook)
        .await;

    let http = reqwest::Client::new();
    let mut watcher = IpWatcher::new(
        IpService::new(http, format!("{}/ip", harness.ip_service.uri())),
        FileStore::new(harness.state_path()),
        sink(&webhook, Identity::default()),
        Duration::from_secs(1800),
    );

    assert!(watcher.tick().await.is_err());
    assert_eq!(read_state(&harness.state_path()), None);

    assert_eq!(
        watcher.tick().await.unwrap(),
        TickOutcome::Established("9.9.9.9".into())
    );
    assert_eq!(read_state(&harness.state_path()).as_deref(), Some("9.9.9.9"));
    assert_eq!(webhook.received_requests().await.unwrap().len(), 2);
}

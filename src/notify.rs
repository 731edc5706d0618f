//! Best-effort startup notifications: registering the subscription URL with
//! an aggregator and enrolling the project URL with a keep-alive service.
//!
//! Both calls are made once, concurrently, on a detached task. Failures are
//! logged and dropped; nothing here can affect the HTTP server.

use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{config::Config, subscription};

#[derive(Debug)]
pub enum NotifyError {
    Request(reqwest::Error),
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(err) => write!(f, "request failed: {err}"),
            Self::Status { status, url } => write!(f, "unexpected status {status} from {url}"),
        }
    }
}

impl std::error::Error for NotifyError {}

impl From<reqwest::Error> for NotifyError {
    fn from(value: reqwest::Error) -> Self {
        Self::Request(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Skipped,
    Failed,
}

pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("argo-sub/{}", crate::version::VERSION))
        .build()
}

/// Spawns the startup notifications. Callers must not await the handle
/// before serving.
pub fn spawn_startup_tasks(config: Arc<Config>, client: reqwest::Client) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_startup_tasks(&config, &client).await;
    })
}

pub async fn run_startup_tasks(config: &Config, client: &reqwest::Client) -> (Outcome, Outcome) {
    let payload = subscription::build_base64(config);
    debug!(sub_path = %config.sub_path, %payload, "subscription payload");

    let outcomes = tokio::join!(
        register_subscription(client, config),
        add_keepalive_task(client, config)
    );
    info!("app is running");
    outcomes
}

pub async fn register_subscription(client: &reqwest::Client, config: &Config) -> Outcome {
    if config.upload_url.is_empty() {
        info!("skipping subscription upload: UPLOAD_URL not set");
        return Outcome::Skipped;
    }
    let Some(subscription_url) = config.subscription_url() else {
        info!("skipping subscription upload: PROJECT_URL not set, nothing to register");
        return Outcome::Skipped;
    };

    let url = format!(
        "{}/api/add-subscriptions",
        config.upload_url.trim_end_matches('/')
    );
    let body = json!({ "subscription": [subscription_url] });
    match post_json(client, &url, &body).await {
        Ok(()) => {
            info!(%subscription_url, "subscription uploaded");
            Outcome::Sent
        }
        Err(err) => {
            error!(%err, "failed to upload subscription");
            Outcome::Failed
        }
    }
}

pub async fn add_keepalive_task(client: &reqwest::Client, config: &Config) -> Outcome {
    if !config.auto_access || config.project_url.is_empty() {
        info!("skipping automatic access task");
        return Outcome::Skipped;
    }

    let body = json!({ "url": config.project_url });
    match post_json(client, &config.keepalive_url, &body).await {
        Ok(()) => {
            info!(project_url = %config.project_url, "automatic access task added");
            Outcome::Sent
        }
        Err(err) => {
            error!(%err, "failed to add automatic access task");
            Outcome::Failed
        }
    }
}

async fn post_json(
    client: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
) -> Result<(), NotifyError> {
    let resp = client.post(url).json(body).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(NotifyError::Status {
            status,
            url: url.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::test_config;

    fn client() -> reqwest::Client {
        build_client().unwrap()
    }

    #[tokio::test]
    async fn registers_subscription_url_with_aggregator() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add-subscriptions"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "subscription": ["https://app.example.com/sub"]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.upload_url = server.uri();
        config.project_url = "https://app.example.com".to_string();

        assert_eq!(
            register_subscription(&client(), &config).await,
            Outcome::Sent
        );
    }

    #[tokio::test]
    async fn registration_requires_both_urls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.upload_url = server.uri();
        assert_eq!(
            register_subscription(&client(), &config).await,
            Outcome::Skipped
        );

        config.upload_url = String::new();
        config.project_url = "https://app.example.com".to_string();
        assert_eq!(
            register_subscription(&client(), &config).await,
            Outcome::Skipped
        );
    }

    #[tokio::test]
    async fn non_success_status_is_reported_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add-subscriptions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.upload_url = server.uri();
        config.project_url = "https://app.example.com".to_string();

        assert_eq!(
            register_subscription(&client(), &config).await,
            Outcome::Failed
        );
    }

    #[tokio::test]
    async fn unreachable_aggregator_is_reported_as_failure() {
        let mut config = test_config();
        // Port 1 on loopback refuses connections.
        config.upload_url = "http://127.0.0.1:1".to_string();
        config.project_url = "https://app.example.com".to_string();

        assert_eq!(
            register_subscription(&client(), &config).await,
            Outcome::Failed
        );
    }

    #[tokio::test]
    async fn keepalive_posts_project_url_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/add-url"))
            .and(body_json(json!({ "url": "https://app.example.com" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.auto_access = true;
        config.project_url = "https://app.example.com".to_string();
        config.keepalive_url = format!("{}/add-url", server.uri());

        assert_eq!(add_keepalive_task(&client(), &config).await, Outcome::Sent);
    }

    #[tokio::test]
    async fn keepalive_is_skipped_without_auto_access_or_project_url() {
        let mut config = test_config();
        config.keepalive_url = "http://127.0.0.1:1/add-url".to_string();
        config.project_url = "https://app.example.com".to_string();
        assert_eq!(
            add_keepalive_task(&client(), &config).await,
            Outcome::Skipped
        );

        config.auto_access = true;
        config.project_url = String::new();
        assert_eq!(
            add_keepalive_task(&client(), &config).await,
            Outcome::Skipped
        );
    }

    #[tokio::test]
    async fn startup_tasks_run_both_notifications_independently() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add-subscriptions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/add-url"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.upload_url = server.uri();
        config.project_url = "https://app.example.com".to_string();
        config.auto_access = true;
        config.keepalive_url = format!("{}/add-url", server.uri());

        let outcomes = run_startup_tasks(&config, &client()).await;
        assert_eq!(outcomes, (Outcome::Failed, Outcome::Sent));
    }

    #[tokio::test]
    async fn spawned_tasks_do_not_block_the_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.upload_url = server.uri();
        config.project_url = "https://app.example.com".to_string();

        let started = std::time::Instant::now();
        let handle = spawn_startup_tasks(Arc::new(config), client());
        assert!(started.elapsed() < Duration::from_secs(1));

        // Let the task start and reach the delayed mock before checking on it.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}

//! reqwest-backed transport for submissions, polls, legacy forms and robot cards.

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use reqwest::{Client, Url, header};
use serde_json::Value;
use tracing::warn;

use crate::judge::{
    error::{PollError, TransportError},
    poller::StateSource,
    step_flow::LegacyForm,
    submission::{SubmitCardBody, SubmitTransport, TransportResponse},
    view::escape_html,
};

/// Shared HTTP client resolving relative endpoints against a base URL.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Arc<str>,
}

impl HttpClient {
    /// Build a client for the server at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    /// Absolute form of `path`; absolute URLs pass through.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// POST the legacy multi-step form to `path` (normally `/submit_match`).
    pub async fn submit_legacy_form(
        &self,
        path: &str,
        form: &LegacyForm,
    ) -> Result<u16, TransportError> {
        let url = self.resolve(path);
        let response = self
            .client
            .post(&url)
            .form(&form.fields())
            .send()
            .await
            .map_err(|source| TransportError { url, source })?;
        Ok(response.status().as_u16())
    }

    /// Robot card HTML for `name` in `weight_class`.
    ///
    /// Failures produce a small error fragment naming the robot instead.
    pub async fn fetch_robot_card(&self, weight_class: &str, name: &str) -> String {
        let result: Result<String, String> = async {
            let mut url = Url::parse(&self.resolve("/robot_card2")).map_err(|err| err.to_string())?;
            url.path_segments_mut()
                .map_err(|()| "base URL cannot carry a path".to_string())?
                .push(weight_class)
                .push(name);

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| err.to_string())?;
            if !response.status().is_success() {
                return Err(format!("Not found ({})", response.status().as_u16()));
            }
            response.text().await.map_err(|err| err.to_string())
        }
        .await;

        result.unwrap_or_else(|reason| {
            warn!(weight_class, name, %reason, "robot card fetch failed");
            robot_card_error(weight_class, name, &reason)
        })
    }
}

impl SubmitTransport for HttpClient {
    fn post_card(
        &self,
        url: String,
        body: SubmitCardBody,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
        let client = self.client.clone();
        let url = self.resolve(&url);
        async move {
            let response = client
                .post(&url)
                .header(header::ACCEPT, "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|source| TransportError {
                    url: url.clone(),
                    source,
                })?;
            let status = response.status().as_u16();
            let body = response.json::<Value>().await.ok();
            Ok(TransportResponse { status, body })
        }
        .boxed()
    }
}

impl StateSource for HttpClient {
    fn fetch_state(&self, url: String) -> BoxFuture<'static, Result<Value, PollError>> {
        let client = self.client.clone();
        let url = self.resolve(&url);
        async move {
            let response = client
                .get(&url)
                .header(header::ACCEPT, "application/json")
                .header(header::CACHE_CONTROL, "no-store")
                .send()
                .await
                .map_err(|source| PollError::Transport {
                    url: url.clone(),
                    source,
                })?;
            if !response.status().is_success() {
                return Err(PollError::Status {
                    url,
                    status: response.status().as_u16(),
                });
            }
            response
                .json::<Value>()
                .await
                .map_err(|source| PollError::Decode { url, source })
        }
        .boxed()
    }
}

/// Fragment shown in the robot modal when the card cannot be loaded.
pub fn robot_card_error(weight_class: &str, name: &str, reason: &str) -> String {
    format!(
        "<h3 class='error'>Could not load robot card</h3><p class='small'>{} in {}</p><p class='small'>{}</p>",
        escape_html(name),
        escape_html(weight_class),
        escape_html(reason)
    )
}

//! HTTP client for the Meraki Dashboard API v1.
//!
//! Every call is sent on its own and awaited before the next one. Rate
//! limiting (429) and server errors (5xx) are retried up to `max_retries`
//! times, honouring `Retry-After` when the dashboard sends it.

use super::types::{
    ApiErrors, CreateNetworkRequest, Network, Organization, Vlan, VlanRequest,
    VlanSettingsRequest, APPLIANCE,
};
use super::Dashboard;
use crate::config::{self, Config};
use crate::error::RemoteError;
use crate::models::VlanRecord;
use async_trait::async_trait;
use colored::Colorize;
use reqwest::header::{HeaderMap, ACCEPT, LINK, RETRY_AFTER};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// Longest error body kept in a [`RemoteError`] message.
const MAX_ERROR_BODY: usize = 300;

/// Dashboard API client, built once per invocation and passed where needed.
pub struct MerakiClient {
    http: Client,
    base_url: String,
    token: String,
    max_retries: u32,
}

impl MerakiClient {
    pub fn new(config: &Config, token: String) -> Result<MerakiClient, RemoteError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("meraki-vlan-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(MerakiClient {
            http,
            base_url: config.base_url.clone(),
            token,
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request, retrying retryable failures, and decode the body.
    /// Returns the decoded body and the `rel=next` link when paginated.
    async fn send<T, B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<(T, Option<String>), RemoteError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut attempt: u32 = 0;
        loop {
            log::debug!("{method} {url}", method = method.as_str().on_blue());
            let mut request = self
                .http
                .request(method.clone(), url)
                .bearer_auth(&self.token)
                .header(ACCEPT, "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                let next = next_link(response.headers());
                let text = response.text().await?;
                log::trace!("{method} {url} => {status} len={}", text.len());
                return Ok((decode(&text, url)?, next));
            }

            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            let error = RemoteError::new(Some(status.as_u16()), error_message(&text));

            if let Some(wait) = retry_delay(&error, retry_after, attempt, self.max_retries) {
                log::warn!(
                    "{failed} {method} {url}: {error}, retry {n}/{max} in {wait:?}",
                    failed = "failed".on_red(),
                    n = attempt + 1,
                    max = self.max_retries,
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            log::warn!(
                "{failed} {method} {url}: {error}",
                failed = "failed".on_red()
            );
            return Err(error);
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let (value, _next) = self.send::<T, ()>(Method::GET, &self.url(path), None).await?;
        Ok(value)
    }

    /// Follow `Link: rel=next` headers until the last page.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RemoteError> {
        collect_pages(self.url(path), move |url| async move {
            self.send::<Vec<T>, ()>(Method::GET, &url, None).await
        })
        .await
    }

    async fn write<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (value, _next) = self.send(method, &self.url(path), Some(body)).await?;
        Ok(value)
    }
}

#[async_trait]
impl Dashboard for MerakiClient {
    async fn list_organizations(&self) -> Result<Vec<Organization>, RemoteError> {
        self.get_all("/organizations").await
    }

    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>, RemoteError> {
        self.get_all(&format!(
            "/organizations/{org_id}/networks?perPage={}",
            config::PER_PAGE
        ))
        .await
    }

    async fn create_network(&self, org_id: &str, name: &str) -> Result<Network, RemoteError> {
        let body = CreateNetworkRequest {
            name,
            product_types: vec![APPLIANCE],
        };
        self.write(Method::POST, &format!("/organizations/{org_id}/networks"), &body)
            .await
    }

    async fn enable_vlans(&self, network_id: &str) -> Result<(), RemoteError> {
        let body = VlanSettingsRequest {
            vlans_enabled: true,
        };
        let _: serde_json::Value = self
            .write(
                Method::PUT,
                &format!("/networks/{network_id}/appliance/vlans/settings"),
                &body,
            )
            .await?;
        Ok(())
    }

    async fn list_vlans(&self, network_id: &str) -> Result<Vec<Vlan>, RemoteError> {
        self.get(&format!("/networks/{network_id}/appliance/vlans"))
            .await
    }

    async fn create_vlan(&self, network_id: &str, vlan: &VlanRecord) -> Result<Vlan, RemoteError> {
        self.write(
            Method::POST,
            &format!("/networks/{network_id}/appliance/vlans"),
            &VlanRequest::create(vlan),
        )
        .await
    }

    async fn update_vlan(&self, network_id: &str, vlan: &VlanRecord) -> Result<Vlan, RemoteError> {
        self.write(
            Method::PUT,
            &format!("/networks/{network_id}/appliance/vlans/{}", vlan.vlan_id),
            &VlanRequest::update(vlan),
        )
        .await
    }
}

/// Pause before retrying `error`, `None` when it must not be retried.
/// `attempt` counts the retries already made.
fn retry_delay(
    error: &RemoteError,
    retry_after: Option<u64>,
    attempt: u32,
    max_retries: u32,
) -> Option<Duration> {
    if !error.is_retryable() || attempt >= max_retries {
        return None;
    }
    Some(
        retry_after
            .map(Duration::from_secs)
            .unwrap_or_else(|| backoff(attempt)),
    )
}

/// Fetch pages starting at `first` until one has no next link.
async fn collect_pages<T, F, Fut>(first: String, mut fetch: F) -> Result<Vec<T>, RemoteError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>), RemoteError>>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut url = Some(first);
    let mut page = 0;
    while let Some(current) = url {
        if !seen.insert(current.clone()) {
            return Err(RemoteError::new(
                None,
                format!("next page link not unique - possible infinite loop: {current}"),
            ));
        }
        let (mut batch, next) = fetch(current).await?;
        log::info!(
            "got page#{page:2} record_count=+{count:3} => {total:3}",
            count = batch.len(),
            total = items.len() + batch.len()
        );
        items.append(&mut batch);
        url = next;
        page += 1;
    }
    Ok(items)
}

/// Exponential pause before retry number `attempt + 1`.
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(config::SLEEP_MSEC.saturating_mul(1u64 << attempt.min(6)))
}

fn decode<T: DeserializeOwned>(text: &str, url: &str) -> Result<T, RemoteError> {
    // some write calls answer with an empty body
    let text = if text.trim().is_empty() { "null" } else { text };
    let mut deserializer = serde_json::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{text}\n\nOUTPUT END\n");
        RemoteError::new(
            None,
            format!("Error parsing JSON from {url}: path={} error={}", e.path(), e),
        )
    })
}

/// Message of an error response, `errors` joined when the body is API JSON.
fn error_message(text: &str) -> String {
    match serde_json::from_str::<ApiErrors>(text) {
        Ok(body) if !body.errors.is_empty() => body.errors.join("; "),
        _ => {
            let text = text.trim();
            if text.is_empty() {
                "no response body".to_string()
            } else {
                text.chars().take(MAX_ERROR_BODY).collect()
            }
        }
    }
}

/// URL tagged `rel=next` in a `Link` header, if any.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let url = pieces.next()?.trim().trim_start_matches('<').trim_end_matches('>');
        let is_next = pieces.any(|p| {
            let p = p.trim().replace('"', "");
            p == "rel=next"
        });
        is_next.then(|| url.to_string())
    })
}

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Volunteer,
    protocol::{GraphqlError, GraphqlRequest, GraphqlResponse, VolunteersPayload},
};
use tracing::{debug, warn};
use url::Url;

use crate::source::{FetchError, Page, PageSource};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Reads the volunteer roster from a GraphQL endpoint, one cursor at a time.
pub struct GraphqlPageSource {
    http: Client,
    endpoint: Url,
}

impl GraphqlPageSource {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim())
            .with_context(|| format!("invalid roster endpoint '{endpoint}'"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build roster http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PageSource<Volunteer> for GraphqlPageSource {
    async fn fetch_page(&self, cursor: usize) -> Result<Page<Volunteer>, FetchError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GraphqlRequest::volunteers(cursor))
            .send()
            .await
            .map_err(|err| FetchError::new(cursor, format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = rejection_message(status, &body);
            warn!(cursor, status = status.as_u16(), "pagination: roster request rejected");
            return Err(FetchError::new(cursor, message).with_status(status.as_u16()));
        }

        let body: GraphqlResponse<VolunteersPayload> = response
            .json()
            .await
            .map_err(|err| FetchError::new(cursor, format!("malformed roster response: {err}")))?;

        if !body.errors.is_empty() {
            return Err(FetchError::new(cursor, join_errors(&body.errors)));
        }

        let payload = body
            .data
            .ok_or_else(|| FetchError::new(cursor, "roster response carried no data"))?;
        debug!(
            cursor,
            returned = payload.users.len(),
            total_count = payload.user_aggregates.total_count,
            "pagination: roster page received"
        );

        Ok(Page {
            items: payload.users,
            total_count: payload.user_aggregates.total_count,
        })
    }
}

fn join_errors(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// GraphQL servers may reject a request with a non-2xx status and still send
/// an `errors` envelope; anything else is reported by status and raw body.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<GraphqlResponse<serde_json::Value>>(body) {
        if !envelope.errors.is_empty() {
            return join_errors(&envelope.errors);
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("server responded with {status}")
    } else {
        format!("server responded with {status}: {body}")
    }
}

#[cfg(test)]
#[path = "tests/graphql_source_tests.rs"]
mod tests;

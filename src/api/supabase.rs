use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::api::collaborators::{RecordStore, SurveyRecord};
use crate::error::StoreError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Inserts rows through Supabase's PostgREST endpoint.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    conflict_column: Option<String>,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            conflict_column: None,
        }
    }

    /// Rows repeating a value of `column` are silently skipped instead of duplicated.
    pub fn with_conflict_column(mut self, column: impl Into<String>) -> Self {
        self.conflict_column = Some(column.into());
        self
    }

    fn insert_url(&self, table: &str) -> String {
        match &self.conflict_column {
            Some(column) => format!(
                "{}/rest/v1/{}?on_conflict={}",
                self.base_url,
                urlencoding::encode(table),
                urlencoding::encode(column)
            ),
            None => format!("{}/rest/v1/{}", self.base_url, urlencoding::encode(table)),
        }
    }
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn insert(&self, table: &str, record: &SurveyRecord) -> Result<(), StoreError> {
        let prefer = if self.conflict_column.is_some() {
            "return=minimal,resolution=ignore-duplicates"
        } else {
            "return=minimal"
        };
        let response = self
            .client
            .post(self.insert_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", prefer)
            .json(&[record])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| body["message"].as_str().map(str::to_string))
                .unwrap_or(text);
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!("Inserted row into {}", table);
        Ok(())
    }
}

//! Hosted remote store: a PostgREST table plus a realtime change channel.

use tracing::debug;

use super::error::SyncError;
use super::protocol::{ClassRoomRow, DataColumn, TABLE};
use super::realtime;
use super::remote::{ChangeChannel, RemoteSettings, RowStore, Subscription};
use super::timestamp::SyncStamp;
use crate::models::ClassData;
use crate::share::ShareCode;

const REALTIME_PATH: &str = "/realtime/v1/websocket";

/// Client for the hosted `class_rooms` table.
#[derive(Debug, Clone)]
pub struct SupabaseBackend {
    settings: RemoteSettings,
    http: reqwest::Client,
}

impl SupabaseBackend {
    pub fn new(settings: RemoteSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }

    /// Builds an HTTP URL for the given path on the project host.
    fn build_http_url(&self, path: &str) -> String {
        let url = &self.settings.url;
        // Convert ws(s) to http(s) if needed
        let base_url = if url.starts_with("ws://") {
            url.replacen("ws://", "http://", 1)
        } else if url.starts_with("wss://") {
            url.replacen("wss://", "https://", 1)
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            format!("https://{}", url)
        } else {
            url.clone()
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    /// Builds the realtime WebSocket URL.
    fn build_ws_url(&self) -> String {
        let http_url = self.build_http_url(REALTIME_PATH);
        let base_url = if http_url.starts_with("http://") {
            http_url.replacen("http://", "ws://", 1)
        } else {
            http_url.replacen("https://", "wss://", 1)
        };

        format!(
            "{}?apikey={}&vsn=1.0.0",
            base_url,
            urlencoding::encode(&self.settings.key)
        )
    }

    fn table_url(&self) -> String {
        self.build_http_url(&format!("/rest/v1/{}", TABLE))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.settings.key)
            .bearer_auth(&self.settings.key)
    }
}

impl RowStore for SupabaseBackend {
    async fn upsert(&self, code: &ShareCode, data: &ClassData) -> Result<(), SyncError> {
        let url = format!("{}?on_conflict=code", self.table_url());
        let row = ClassRoomRow {
            code: code.as_str(),
            data,
            updated_at: SyncStamp::now().to_string(),
        };

        debug!("Upserting class {} to {}", code, url);
        let response = self
            .authorized(self.http.post(&url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    async fn fetch(&self, code: &ShareCode) -> Result<Option<ClassData>, SyncError> {
        let url = format!(
            "{}?select=data&code=eq.{}",
            self.table_url(),
            urlencoding::encode(code.as_str())
        );

        debug!("Fetching class {} from {}", code, url);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;

        let rows: Vec<DataColumn> = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        Ok(rows.into_iter().next().map(|row| row.data))
    }
}

impl ChangeChannel for SupabaseBackend {
    async fn subscribe(&self, code: &ShareCode) -> Result<Subscription, SyncError> {
        realtime::subscribe(&self.build_ws_url(), code).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(SyncError::Service { status, message })
}

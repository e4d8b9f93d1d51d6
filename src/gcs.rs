//! Google Cloud Storage [`ObjectStore`] over the GCS JSON API.
//!
//! Requests are authenticated with an OAuth2 bearer token (`GCS_ACCESS_TOKEN`) and carry the
//! configured client timeout. Listing follows `nextPageToken` until exhausted. Renames use
//! the server-side `objects.move` call, so a vanished source comes back as 404.
//!
//! HTTP outcomes map onto [`BackendError`]:
//!
//! | Response | BackendError |
//! |----------|--------------|
//! | 401, 403 | `PermissionDenied` |
//! | 404 | `NotFound` |
//! | 409, 412 | `Conflict` |
//! | 408, 429, 500, 502, 503, 504 | `Transient` |
//! | timeout / connect failure | `Transient` |
//! | other | `Other` |

use std::time::Duration;

use async_trait::async_trait;
use codeclarity_core::contract::{BackendError, ObjectInfo, ObjectStore};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

pub struct GcsObjectStore {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    gcp_project: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GcsObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<GcsObject>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

impl GcsObjectStore {
    pub fn new(
        endpoint: &str,
        token: String,
        gcp_project: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!(endpoint, timeout = ?timeout, "Initialized GCS client");
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
            gcp_project,
        })
    }

    fn bucket_url(&self, bucket: &str) -> String {
        format!(
            "{}/storage/v1/b/{}",
            self.endpoint,
            urlencoding::encode(bucket)
        )
    }

    fn object_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/o/{}", self.bucket_url(bucket), urlencoding::encode(name))
    }

    fn upload_url(&self, bucket: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o",
            self.endpoint,
            urlencoding::encode(bucket)
        )
    }

    fn move_url(&self, bucket: &str, source: &str, destination: &str) -> String {
        format!(
            "{}/moveTo/o/{}",
            self.object_url(bucket, source),
            urlencoding::encode(destination)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(%status, body = %body, "GCS request failed");
        Err(classify_status(status, &body))
    }

    /// Like [`Self::send`], mapping 404 to `Ok(false)`.
    async fn probe(&self, url: String) -> Result<bool, BackendError> {
        match self.send(self.client.get(url)).await {
            Ok(_) => Ok(true),
            Err(BackendError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendError::PermissionDenied(format!("{status}: {body}"))
        }
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => BackendError::Conflict,
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => BackendError::Transient(status.to_string()),
        _ => BackendError::Other(format!("{status}: {body}")),
    }
}

fn classify_transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() || err.is_connect() {
        BackendError::Transient(err.to_string())
    } else {
        BackendError::Other(err.to_string())
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        self.probe(self.bucket_url(bucket)).await
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        let project = self.gcp_project.as_deref().ok_or_else(|| {
            BackendError::Other("storage.gcp_project is required to create buckets".to_string())
        })?;
        let url = format!("{}/storage/v1/b", self.endpoint);
        let request = self
            .client
            .post(url)
            .query(&[("project", project)])
            .json(&serde_json::json!({ "name": bucket }));
        self.send(request).await?;
        info!(bucket, project, "Created GCS bucket");
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, BackendError> {
        let url = format!("{}/o", self.bucket_url(bucket));
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("prefix", prefix.to_string()),
                ("fields", "items(name),nextPageToken".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let response = self.send(self.client.get(&url).query(&query)).await?;
            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| BackendError::Other(format!("invalid list response: {e}")))?;
            objects.extend(page.items.into_iter().map(|o| ObjectInfo::new(o.name)));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(bucket, prefix, count = objects.len(), "Listed GCS objects");
        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BackendError> {
        let request = self
            .client
            .get(self.object_url(bucket, name))
            .query(&[("alt", "media")]);
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(classify_transport)?;
        Ok(bytes.to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.upload_url(bucket))
            .query(&[("uploadType", "media"), ("name", name)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content);
        self.send(request).await?;
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool, BackendError> {
        self.probe(self.object_url(bucket, name)).await
    }

    async fn rename_object(
        &self,
        bucket: &str,
        source: &str,
        destination: &str,
    ) -> Result<String, BackendError> {
        let request = self.client.post(self.move_url(bucket, source, destination));
        let response = self.send(request).await?;
        let moved: GcsObject = response
            .json()
            .await
            .map_err(|e| BackendError::Other(format!("invalid move response: {e}")))?;
        Ok(moved.name)
    }

    fn object_uri(&self, bucket: &str, name: &str) -> String {
        format!("gs://{bucket}/{name}")
    }
}

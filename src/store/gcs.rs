//! Google Cloud Storage over the JSON API
//!
//! ## Module Structure
//! - `auth`: service account key file, JWT signing, token cache

mod auth;

pub use auth::ServiceAccountKey;

use auth::GcsAuth;

use crate::error::{SyncError, SyncResult};
use crate::store::types::{ObjectStore, download_path};

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketPage {
    #[serde(default)]
    items: Vec<BucketItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BucketItem {
    name: String,
}

/// Which request a failed status belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Request {
    List,
    Upload,
    Download,
}

/// Map a non-success HTTP status onto the error taxonomy
///
/// Uploads only ever fail with `Auth`, `Upload` or `Transport`; a missing
/// bucket on upload is an upload failure.
fn classify_status(status: StatusCode, request: Request, detail: String) -> SyncError {
    match (status, request) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            SyncError::Auth(format!("{}: {}", status, detail))
        }
        (_, Request::Upload) => SyncError::Upload(format!("{}: {}", status, detail)),
        (StatusCode::NOT_FOUND, _) => SyncError::NotFound(detail),
        _ => SyncError::Transport(format!("{}: {}", status, detail)),
    }
}

fn transport_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::Transport(format!("request timed out: {}", e))
    } else {
        SyncError::Transport(e.to_string())
    }
}

pub struct GcsStore {
    client: Client,
    endpoint: reqwest::Url,
    auth: GcsAuth,
    download_dir: PathBuf,
}

impl GcsStore {
    pub fn new(
        endpoint: String,
        credentials_path: PathBuf,
        static_token: Option<String>,
        timeout: Duration,
        download_dir: PathBuf,
    ) -> SyncResult<Self> {
        let endpoint = reqwest::Url::parse(&endpoint)
            .map_err(|e| SyncError::InvalidConfig(format!("bad endpoint '{}': {}", endpoint, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;

        Ok(GcsStore {
            client,
            endpoint,
            auth: GcsAuth::new(credentials_path, static_token),
            download_dir,
        })
    }

    fn url(&self, segments: &[&str]) -> SyncResult<reqwest::Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidConfig(format!("bad endpoint '{}'", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn check(response: Response, request: Request, what: &str) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        debug!("{} failed with {}: {}", what, status, body);
        Err(classify_status(status, request, what.to_string()))
    }
}

impl ObjectStore for GcsStore {
    fn name(&self) -> &str {
        "gcs"
    }

    fn list_buckets(&self) -> SyncResult<Vec<String>> {
        let project = self.auth.project_id()?;
        let token = self.auth.access_token(&self.client)?;
        let url = self.url(&["storage", "v1", "b"])?;

        let mut buckets = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("project", project.clone())];
            if let Some(page) = &page_token {
                query.push(("pageToken", page.clone()));
            }

            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&token)
                .query(&query)
                .send()
                .map_err(transport_error)?;
            let page: BucketPage = Self::check(response, Request::List, "list buckets")?
                .json()
                .map_err(|e| SyncError::Transport(format!("malformed bucket list: {}", e)))?;

            buckets.extend(page.items.into_iter().map(|b| b.name));
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(buckets)
    }

    fn upload(&self, local_blob: &Path, bucket: &str, key: &str) -> SyncResult<()> {
        let file = File::open(local_blob).map_err(|e| {
            SyncError::Upload(format!("cannot open {}: {}", local_blob.display(), e))
        })?;
        let token = self.auth.access_token(&self.client)?;
        let url = self.url(&["upload", "storage", "v1", "b", bucket, "o"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&token)
            .query(&[("uploadType", "media"), ("name", key)])
            .header(CONTENT_TYPE, "application/zip")
            .body(reqwest::blocking::Body::from(file))
            .send()
            .map_err(transport_error)?;
        Self::check(response, Request::Upload, &format!("gs://{}/{}", bucket, key))?;

        info!("Uploaded {} to gs://{}/{}", local_blob.display(), bucket, key);
        Ok(())
    }

    fn download(&self, bucket: &str, key: &str) -> SyncResult<PathBuf> {
        let token = self.auth.access_token(&self.client)?;
        let url = self.url(&["storage", "v1", "b", bucket, "o", key])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .map_err(transport_error)?;
        let mut response =
            Self::check(response, Request::Download, &format!("gs://{}/{}", bucket, key))?;

        std::fs::create_dir_all(&self.download_dir).map_err(|e| {
            SyncError::Transport(format!("{}: {}", self.download_dir.display(), e))
        })?;
        let dest = download_path(&self.download_dir);
        let written = File::create(&dest).and_then(|mut file| {
            response.copy_to(&mut file).map_err(std::io::Error::other)?;
            file.sync_all()
        });
        if let Err(e) = written {
            crate::util::remove_quietly(&dest);
            return Err(SyncError::Transport(format!(
                "failed writing gs://{}/{}: {}",
                bucket, key, e
            )));
        }

        info!("Downloaded gs://{}/{} to {}", bucket, key, dest.display());
        Ok(dest)
    }
}

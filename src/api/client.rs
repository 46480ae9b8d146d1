//! HTTP implementation of [`FileApi`] over the panel REST API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION};
use reqwest::{multipart, Body, Client, Method, RequestBuilder, Response};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::FileApi;
use crate::config::ClientConfig;
use crate::files::error::FileError;
use crate::files::path_utils::{to_wire_path, RemoteDir};
use crate::files::progress::ProgressFn;
use crate::files::types::constants::{REQUEST_TIMEOUT, UPLOAD_CHUNK_SIZE, UPLOAD_TIMEOUT};
use crate::files::types::{DownloadedFile, Entry, UploadFile, UploadSource};

const FOLDER_ENDPOINT: &str = "filebrowser/folder";
const FILE_ENDPOINT: &str = "filebrowser/file";
const ARCHIVE_ENDPOINT: &str = "filebrowser/archive";
const UNARCHIVE_ENDPOINT: &str = "filebrowser/unarchive";

/// REST client for the panel's file browser endpoints
#[derive(Debug, Clone)]
pub struct HttpFileApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl HttpFileApi {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:7867/api/`).
    pub fn new(base_url: &str) -> Result<Self, FileError> {
        let client = Client::builder().build()?;
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            client,
            base_url,
            token: None,
            request_timeout: REQUEST_TIMEOUT,
            upload_timeout: UPLOAD_TIMEOUT,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, FileError> {
        let mut api = Self::new(&config.base_url)?
            .with_timeouts(config.request_timeout(), config.upload_timeout());
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            api = api.with_token(token);
        }
        Ok(api)
    }

    /// Send `Authorization: Basic <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeouts(mut self, request: Duration, upload: Duration) -> Self {
        self.request_timeout = request;
        self.upload_timeout = upload;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str, timeout: Duration) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, endpoint))
            .timeout(timeout);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Basic {}", token));
        }
        builder
    }

    /// Send and require a 2xx answer.
    async fn send(&self, builder: RequestBuilder, timeout: Duration) -> Result<Response, FileError> {
        let response = builder.send().await.map_err(|e| map_send_error(e, timeout))?;
        let status = response.status();
        if !status.is_success() {
            debug!("Request to {} failed with HTTP {}", response.url(), status.as_u16());
            return Err(FileError::Http(status.as_u16()));
        }
        Ok(response)
    }

    async fn send_form(
        &self,
        method: Method,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<(), FileError> {
        let builder = self
            .request(method, endpoint, self.request_timeout)
            .form(form);
        self.send(builder, self.request_timeout).await?;
        Ok(())
    }

    async fn send_batch(
        &self,
        endpoint: &str,
        dir: &RemoteDir,
        names: &[String],
    ) -> Result<(), FileError> {
        let path = to_wire_path(dir.as_str());
        let files = serde_json::to_string(names)?;
        self.send_form(
            Method::POST,
            endpoint,
            &[("path", path.as_str()), ("files", files.as_str())],
        )
        .await
    }
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> FileError {
    if err.is_timeout() {
        FileError::Timeout(timeout)
    } else {
        FileError::Request(err)
    }
}

/// Extract the filename from a `Content-Disposition` header value.
///
/// Handles quoted and bare values and ignores any trailing parameters.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let value = rest.split(';').next()?.trim().replace('"', "");
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Build a streaming body that reports bytes as they are handed to the transport.
async fn progress_body(file: &UploadFile, progress: Option<ProgressFn>) -> Result<Body, FileError> {
    let chunks: BoxStream<'static, std::io::Result<Bytes>> = match &file.source {
        UploadSource::Memory(data) => {
            let data = data.clone();
            let parts: Vec<std::io::Result<Bytes>> = (0..data.len())
                .step_by(UPLOAD_CHUNK_SIZE)
                .map(|start| Ok(data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len()))))
                .collect();
            stream::iter(parts).boxed()
        }
        UploadSource::Disk(path) => {
            let handle = tokio::fs::File::open(path).await?;
            ReaderStream::with_capacity(handle, UPLOAD_CHUNK_SIZE).boxed()
        }
    };

    let total = file.size;
    let mut sent = 0u64;
    let reporting = chunks.map(move |chunk| {
        if let (Ok(bytes), Some(report)) = (&chunk, &progress) {
            sent += bytes.len() as u64;
            report(sent, total);
        }
        chunk
    });
    Ok(Body::wrap_stream(reporting))
}

#[async_trait]
impl FileApi for HttpFileApi {
    async fn list_folder(&self, dir: &RemoteDir) -> Result<Vec<Entry>, FileError> {
        let path = to_wire_path(dir.as_str());
        let builder = self
            .request(Method::GET, FOLDER_ENDPOINT, self.request_timeout)
            .query(&[("path", path.as_str())]);
        let body = self
            .send(builder, self.request_timeout)
            .await?
            .text()
            .await
            .map_err(|e| map_send_error(e, self.request_timeout))?;
        serde_json::from_str(&body)
            .map_err(|e| FileError::InvalidResponse(format!("listing of {}: {}", dir, e)))
    }

    async fn archive(&self, dir: &RemoteDir, names: &[String]) -> Result<(), FileError> {
        self.send_batch(ARCHIVE_ENDPOINT, dir, names).await
    }

    async fn unarchive(&self, dir: &RemoteDir, names: &[String]) -> Result<(), FileError> {
        self.send_batch(UNARCHIVE_ENDPOINT, dir, names).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), FileError> {
        let path = to_wire_path(path);
        self.send_form(Method::DELETE, FILE_ENDPOINT, &[("path", path.as_str())])
            .await
    }

    async fn delete_folder(&self, path: &str) -> Result<(), FileError> {
        let path = to_wire_path(path);
        self.send_form(Method::DELETE, FOLDER_ENDPOINT, &[("path", path.as_str())])
            .await
    }

    async fn rename(&self, path: &str, is_folder: bool, new_name: &str) -> Result<(), FileError> {
        let endpoint = if is_folder { FOLDER_ENDPOINT } else { FILE_ENDPOINT };
        let path = to_wire_path(path);
        self.send_form(
            Method::PATCH,
            endpoint,
            &[("path", path.as_str()), ("newName", new_name)],
        )
        .await
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        let path = to_wire_path(path);
        self.send_form(
            Method::PATCH,
            FILE_ENDPOINT,
            &[("path", path.as_str()), ("content", content)],
        )
        .await
    }

    async fn create_folder(&self, path: &str) -> Result<(), FileError> {
        let path = to_wire_path(path);
        self.send_form(Method::PUT, FOLDER_ENDPOINT, &[("path", path.as_str())])
            .await
    }

    async fn upload_file(
        &self,
        dir: &RemoteDir,
        file: UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<(), FileError> {
        let path = to_wire_path(dir.as_str());
        let body = progress_body(&file, progress).await?;
        let part = multipart::Part::stream_with_length(body, file.size)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type())?;
        let form = multipart::Form::new().part("file", part);

        let builder = self
            .request(Method::PUT, FILE_ENDPOINT, self.upload_timeout)
            .query(&[("path", path.as_str())])
            .multipart(form);
        self.send(builder, self.upload_timeout).await?;
        Ok(())
    }

    async fn fetch_file(&self, path: &str) -> Result<DownloadedFile, FileError> {
        let wire = to_wire_path(path);
        let builder = self
            .request(Method::GET, FILE_ENDPOINT, self.request_timeout)
            .query(&[("path", wire.as_str())]);
        let response = self.send(builder, self.request_timeout).await?;

        let suggested = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition);
        let filename = match suggested {
            Some(name) => name,
            None => {
                warn!("No filename in response for {}, using requested name", path);
                path.rsplit('/').next().unwrap_or(path).to_string()
            }
        };

        let data = response
            .bytes()
            .await
            .map_err(|e| map_send_error(e, self.request_timeout))?;
        Ok(DownloadedFile { filename, data })
    }
}

//! Transport to the image service.
//!
//! [`ImageService`] is the seam the upload client and the lister talk to.
//! [`HttpImageService`] implements it over HTTP with a shared `reqwest` client.

use std::path::Path;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{header::CONTENT_TYPE, Client, Response};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{ImageList, ImageListing, WelcomeResponse};

/// File name used when the upload path has none.
const DEFAULT_FILE_NAME: &str = "upload.bin";

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent with the multipart part.
    pub name: String,
    /// MIME type sent with the multipart part.
    pub mime_type: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl UploadFile {
    /// Create an upload from in-memory contents, guessing the MIME type from the name.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            mime_type,
            data,
        }
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_name()
            .map_or_else(|| DEFAULT_FILE_NAME.to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, data))
    }
}

/// Status and raw body of an upload reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

/// Operations the client needs from the image service.
#[async_trait::async_trait]
pub trait ImageService: Send + Sync {
    /// Upload one file.
    ///
    /// Any HTTP status is a reply; only failures to get one are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent or the body read.
    async fn upload(&self, file: &UploadFile) -> Result<ServiceReply>;

    /// Fetch all previously processed images, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable body.
    async fn list_images(&self) -> Result<Vec<ImageListing>>;

    /// Fetch the server's greeting.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable body.
    async fn welcome(&self) -> Result<String>;

    /// Fetch a processed artifact. `url` may be absolute or relative to the
    /// service base URL.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or when the
    /// server answers with a JSON error document instead of the file.
    async fn download(&self, url: &str) -> Result<Bytes>;
}

/// [`ImageService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpImageService {
    client: Client,
    base_url: Url,
    upload_url: Url,
    images_url: Url,
    file_field: String,
    quality: Option<u8>,
}

impl HttpImageService {
    /// Build a service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        Self::with_client(builder.build()?, config)
    }

    /// Build a service around an existing client.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid.
    pub fn with_client(client: Client, config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;
        let upload_url = join(&base_url, &config.server.upload_path)?;
        let images_url = join(&base_url, &config.server.images_path)?;
        Ok(Self {
            client,
            base_url,
            upload_url,
            images_url,
            file_field: config.server.file_field.clone(),
            quality: config.upload.quality,
        })
    }

    /// Base URL all endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let body = success_body(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|source| Error::invalid_url(path, source))
}

async fn success_body(response: Response) -> Result<Bytes> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(Error::status(
            status.as_u16(),
            &String::from_utf8_lossy(&body),
        ));
    }
    Ok(body)
}

#[async_trait::async_trait]
impl ImageService for HttpImageService {
    async fn upload(&self, file: &UploadFile) -> Result<ServiceReply> {
        let part = Part::bytes(file.data.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(self.file_field.clone(), part);

        let mut request = self.client.post(self.upload_url.clone()).multipart(form);
        if let Some(quality) = self.quality {
            request = request.query(&[("quality", quality)]);
        }

        info!(
            "uploading {} ({} bytes) to {}",
            file.name,
            file.data.len(),
            self.upload_url
        );
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!("upload reply: status {status}, {} bytes", body.len());

        Ok(ServiceReply { status, body })
    }

    async fn list_images(&self) -> Result<Vec<ImageListing>> {
        let list: ImageList = self.get_json(self.images_url.clone()).await?;
        debug!("server lists {} images", list.images.len());
        Ok(list.images)
    }

    async fn welcome(&self) -> Result<String> {
        let welcome: WelcomeResponse = self.get_json(self.base_url.clone()).await?;
        Ok(welcome.message)
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        let url = join(&self.base_url, url)?;
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        let body = success_body(response).await?;

        // A missing file comes back as a JSON error document.
        if is_json {
            return Err(Error::status(status, &String::from_utf8_lossy(&body)));
        }
        Ok(body)
    }
}

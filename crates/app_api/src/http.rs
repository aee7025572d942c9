//! REST implementation of the gateway

use crate::{
    ApiError, Bucket, DiskInfo, EntryKind, FileEntry, PublishSettings, RemoteFileGateway, Result,
};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://cloud-api.yandex.net/v1/disk/";

/// Media types the listing screens care about
const MEDIA_TYPES: &str = "document,image,spreadsheet";

const ROOT_PATH: &str = "disk:/";

/// Settings for [`HttpGateway`]
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Preview size hint, e.g. `S` or `120x120`
    pub preview_size: String,
    pub preview_crop: bool,
    /// Sort field for bucket listings
    pub sort: String,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            preview_size: "S".to_string(),
            preview_crop: true,
            sort: "created".to_string(),
        }
    }
}

/// Resource list as returned by both the flat listings (`items`) and the
/// folder metadata endpoint (`_embedded.items`)
#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    items: Option<Vec<RawResource>>,
    #[serde(rename = "_embedded")]
    embedded: Option<Embedded>,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(default)]
    items: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    name: String,
    path: String,
    size: Option<u64>,
    created: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    media_type: Option<String>,
    mime_type: Option<String>,
    file: Option<String>,
    preview: Option<String>,
    public_url: Option<String>,
}

impl From<RawResource> for FileEntry {
    fn from(raw: RawResource) -> Self {
        let kind = match raw.kind.as_deref() {
            Some("dir") => EntryKind::Dir,
            _ => EntryKind::File,
        };
        FileEntry {
            name: raw.name,
            path: raw.path,
            size: raw.size,
            created: raw.created.unwrap_or_default(),
            kind,
            media_type: raw.media_type,
            mime_type: raw.mime_type,
            file_url: raw.file,
            preview_url: raw.preview,
            public_url: raw.public_url,
        }
        .normalized()
    }
}

impl ResourceList {
    fn into_entries(self) -> Vec<FileEntry> {
        let raw = match (self.items, self.embedded) {
            (Some(items), _) => items,
            (None, Some(embedded)) => embedded.items,
            (None, None) => Vec::new(),
        };
        raw.into_iter().map(FileEntry::from).collect()
    }
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct PublicUrl {
    public_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    description: Option<String>,
}

/// Gateway speaking the Yandex-Disk-style REST API
pub struct HttpGateway {
    client: Client,
    options: GatewayOptions,
}

impl HttpGateway {
    pub fn new(mut options: GatewayOptions) -> Result<Self> {
        if !options.base_url.starts_with("https://") && !options.base_url.starts_with("http://") {
            return Err(ApiError::InvalidUrl(options.base_url));
        }
        if !options.base_url.ends_with('/') {
            options.base_url.push('/');
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self { client, options })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.options.base_url, endpoint)
    }

    fn auth_header(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(&format!("OAuth {}", self.options.token))
            .map_err(|_| ApiError::Unauthorized)
    }

    fn request(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        Ok(builder
            .header(AUTHORIZATION, self.auth_header()?)
            .header(ACCEPT, "application/json"))
    }

    fn preview_params(&self) -> [(&'static str, String); 2] {
        [
            ("preview_size", self.options.preview_size.clone()),
            ("preview_crop", self.options.preview_crop.to_string()),
        ]
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.request(builder)?.send().await.map_err(classify_transport)?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn bucket_endpoint(bucket: Bucket) -> &'static str {
        match bucket {
            Bucket::AllFiles => "resources",
            Bucket::Published => "resources/public",
            Bucket::LastUploaded => "resources/last-uploaded",
        }
    }

    /// One window of a bucket; `kind` narrows it where the endpoint honours `type`
    async fn bucket_page(
        &self,
        bucket: Bucket,
        kind: Option<EntryKind>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FileEntry>> {
        let mut builder = self
            .client
            .get(self.url(Self::bucket_endpoint(bucket)))
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("media_type", MEDIA_TYPES.to_string()),
                ("sort", self.options.sort.clone()),
            ])
            .query(&self.preview_params());
        if let Some(kind) = kind {
            builder = builder.query(&[("type", kind.as_str())]);
        }
        if bucket == Bucket::AllFiles {
            builder = builder.query(&[("path", ROOT_PATH)]);
        }

        tracing::debug!(%bucket, ?kind, limit, offset, "Listing bucket");
        let entries = self.get_json::<ResourceList>(builder).await?.into_entries();

        match kind {
            // Endpoints that ignore `type` still must not leak the other kind
            Some(kind) => Ok(entries.into_iter().filter(|e| e.kind == kind).collect()),
            None => Ok(entries),
        }
    }

    async fn resource(&self, path: &str) -> Result<FileEntry> {
        let builder = self
            .client
            .get(self.url("resources"))
            .query(&[("path", path)])
            .query(&self.preview_params());
        let raw: RawResource = self.get_json(builder).await?;
        Ok(raw.into())
    }
}

#[async_trait]
impl RemoteFileGateway for HttpGateway {
    async fn list_files(&self, bucket: Bucket, limit: usize, offset: usize) -> Result<Vec<FileEntry>> {
        self.bucket_page(bucket, Some(EntryKind::File), limit, offset).await
    }

    async fn list_dirs(&self, bucket: Bucket, limit: usize, offset: usize) -> Result<Vec<FileEntry>> {
        self.bucket_page(bucket, Some(EntryKind::Dir), limit, offset).await
    }

    async fn list_bucket(&self, bucket: Bucket, limit: usize, offset: usize) -> Result<Vec<FileEntry>> {
        self.bucket_page(bucket, None, limit, offset).await
    }

    async fn list_folder(&self, path: &str, limit: usize, offset: usize) -> Result<Vec<FileEntry>> {
        let builder = self
            .client
            .get(self.url("resources"))
            .query(&[
                ("path", path.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .query(&self.preview_params());

        tracing::debug!(path, limit, offset, "Listing folder");
        let list: ResourceList = self.get_json(builder).await?;
        Ok(list.into_entries())
    }

    async fn publish(&self, path: &str, settings: &PublishSettings) -> Result<()> {
        let builder = self
            .client
            .put(self.url("resources/publish"))
            .query(&[
                ("path", path.to_string()),
                ("allow_address_access", settings.allow_address_access.to_string()),
            ])
            .json(&serde_json::json!({ "public_settings": settings }));
        self.send(builder).await?;
        tracing::info!(path, "Resource published");
        Ok(())
    }

    async fn unpublish(&self, path: &str) -> Result<()> {
        let builder = self
            .client
            .put(self.url("resources/unpublish"))
            .query(&[("path", path)]);
        self.send(builder).await?;
        tracing::info!(path, "Resource unpublished");
        Ok(())
    }

    async fn fetch_public_url(&self, path: &str) -> Result<String> {
        let builder = self
            .client
            .get(self.url("resources"))
            .query(&[("path", path), ("fields", "public_url")]);
        let body: PublicUrl = self.get_json(builder).await?;
        body.public_url
            .ok_or_else(|| ApiError::Decode(format!("{} has no public_url", path)))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<FileEntry> {
        let builder = self
            .client
            .post(self.url("resources/move"))
            .query(&[("from", from), ("path", to), ("overwrite", "false")]);
        self.send(builder).await?;
        tracing::info!(from, to, "Resource moved");
        self.resource(to).await
    }

    async fn delete(&self, path: &str, permanently: bool) -> Result<()> {
        let builder = self
            .client
            .delete(self.url("resources"))
            .query(&[("path", path.to_string()), ("permanently", permanently.to_string())]);
        self.send(builder).await?;
        tracing::info!(path, permanently, "Resource deleted");
        Ok(())
    }

    async fn request_download_link(&self, path: &str) -> Result<String> {
        let builder = self
            .client
            .get(self.url("resources/download"))
            .query(&[("path", path)]);
        let link: Link = self.get_json(builder).await?;
        Ok(link.href)
    }

    async fn download_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(self.client.get(url)).await?;
        let bytes = response.bytes().await.map_err(classify_transport)?;
        tracing::debug!(len = bytes.len(), "Downloaded content");
        Ok(bytes.to_vec())
    }

    async fn disk_info(&self) -> Result<DiskInfo> {
        self.get_json(self.client.get(self.url(""))).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

/// Map a non-success status and its body to an error
fn status_error(status: StatusCode, body: &str) -> ApiError {
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Unauthorized;
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.description.or(b.message))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    ApiError::Http { status: status.as_u16(), message }
}

fn classify_transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        return ApiError::Timeout;
    }
    if e.is_connect() {
        let chain = error_chain(&e);
        if is_dns_failure(&chain) {
            let host = e
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown host")
                .to_string();
            return ApiError::HostNotFound(host);
        }
        return ApiError::Offline;
    }
    if e.is_decode() {
        return ApiError::Decode(e.to_string());
    }
    ApiError::Transport(e.to_string())
}

fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![e.to_string()];
    let mut source = e.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

/// Resolver failures as worded by getaddrinfo and hyper
fn is_dns_failure(chain: &str) -> bool {
    let chain = chain.to_lowercase();
    [
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "nodename nor servname",
        "no such host",
        "temporary failure in name resolution",
    ]
    .iter()
    .any(|needle| chain.contains(needle))
}

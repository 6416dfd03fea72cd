use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::models::*;
use crate::errors::ClientError;

/// Number of artists and albums requested for the front page.
pub const CATALOG_ALBUMS: u32 = 10;
pub const CATALOG_ARTISTS: u32 = 5;

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"filename=(.+)").expect("static regex"));

/// HTTP client for the gateway.
///
/// Stateless apart from the connection pool: the bearer token is passed to
/// each call, so the same client can serve any session. Failures are never
/// retried.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request and turn transport failures and non-2xx statuses into
    /// `ClientError`.
    async fn send(action: &'static str, req: RequestBuilder) -> Result<Response, ClientError> {
        let resp = req
            .send()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;

        let status = resp.status();
        debug!(action, %status, url = %resp.url(), "gateway responded");
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::Status {
            action,
            status,
            message: error_message(&body, status),
        })
    }

    async fn json<T: DeserializeOwned>(action: &'static str, resp: Response) -> Result<T, ClientError> {
        let body = resp
            .text()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;
        serde_json::from_str(&body).map_err(|e| ClientError::Format {
            action,
            detail: e.to_string(),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let req = self
            .http
            .get(self.url("/login"))
            .basic_auth(email, Some(password));
        let resp = Self::send("Login", req).await?;
        Self::json("Login", resp).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        let req = self.http.post(self.url("/registration")).json(registration);
        Self::send("Registration", req).await?;
        Ok(())
    }

    pub async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let req = self.http.post(self.url("/logout")).bearer_auth(token);
        Self::send("Logout", req).await?;
        Ok(())
    }

    pub async fn search(
        &self,
        token: Option<&str>,
        query: &str,
    ) -> Result<SearchResults, ClientError> {
        let req = self
            .http
            .post(self.url("/search"))
            .json(&SearchRequest { query });
        let resp = Self::send("Search", Self::authorized(req, token)).await?;
        Self::json("Search", resp).await
    }

    pub async fn catalog(
        &self,
        token: Option<&str>,
        albums_count: u32,
        artists_count: u32,
    ) -> Result<Catalog, ClientError> {
        let req = self.http.post(self.url("/")).json(&CatalogRequest {
            albums_count,
            artists_count,
        });
        let resp = Self::send("Fetch catalog", Self::authorized(req, token)).await?;
        Self::json("Fetch catalog", resp).await
    }

    async fn entity<T: DeserializeOwned>(
        &self,
        token: Option<&str>,
        kind: EntityKind,
        id: i64,
    ) -> Result<T, ClientError> {
        let url = self.url(&format!("/{}/{}", kind.path_segment(), id));
        let req = Self::authorized(self.http.get(url), token);
        let resp = Self::send("Fetch profile", req).await?;
        Self::json("Fetch profile", resp).await
    }

    pub async fn artist_profile(
        &self,
        token: Option<&str>,
        id: ArtistId,
    ) -> Result<ArtistProfile, ClientError> {
        self.entity(token, EntityKind::Artists, id).await
    }

    pub async fn album_profile(
        &self,
        token: Option<&str>,
        id: AlbumId,
    ) -> Result<AlbumProfile, ClientError> {
        self.entity(token, EntityKind::Albums, id).await
    }

    pub async fn user_profile(&self, token: &str) -> Result<UserProfile, ClientError> {
        let req = self.http.get(self.url("/profile")).bearer_auth(token);
        let resp = Self::send("Fetch user profile", req).await?;
        Self::json("Fetch user profile", resp).await
    }

    pub async fn add_to_order(&self, token: Option<&str>, id: AlbumId) -> Result<(), ClientError> {
        let req = self.http.post(self.url(&format!("/add/{id}")));
        Self::send("Add album to order", Self::authorized(req, token)).await?;
        Ok(())
    }

    pub async fn remove_from_order(
        &self,
        token: Option<&str>,
        id: AlbumId,
    ) -> Result<(), ClientError> {
        let req = self.http.post(self.url(&format!("/remove/{id}")));
        Self::send("Remove album from order", Self::authorized(req, token)).await?;
        Ok(())
    }

    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, ClientError> {
        let req = self.http.get(self.url("/orders/")).bearer_auth(token);
        let resp = Self::send("Fetch orders", req).await?;
        let envelope: OrdersEnvelope = Self::json("Fetch orders", resp).await?;
        Ok(envelope.orders)
    }

    pub async fn buy(&self, token: Option<&str>) -> Result<(), ClientError> {
        let req = self.http.post(self.url("/buy"));
        Self::send("Buy order", Self::authorized(req, token)).await?;
        Ok(())
    }

    pub async fn deposit(&self, token: &str, money: u64) -> Result<(), ClientError> {
        let req = self
            .http
            .post(self.url("/deposit"))
            .bearer_auth(token)
            .json(&DepositRequest { money });
        Self::send("Deposit", req).await?;
        Ok(())
    }

    pub async fn delete_album(&self, token: &str, id: AlbumId) -> Result<(), ClientError> {
        let req = self
            .http
            .delete(self.url(&format!("/admin-panel/delete/{id}")))
            .bearer_auth(token);
        Self::send("Delete album", req).await?;
        Ok(())
    }

    pub async fn logs(
        &self,
        token: &str,
        page: u32,
        page_size: u32,
    ) -> Result<LogsPage, ClientError> {
        let req = self
            .http
            .get(self.url(&format!("/admin-panel/logs/{page}")))
            .query(&[("pageSize", page_size)])
            .bearer_auth(token);
        let resp = Self::send("Fetch logs", req).await?;
        Self::json("Fetch logs", resp).await
    }

    /// Stream the database dump into `dir`, naming the file after the
    /// `Content-Disposition` header. Returns the written path.
    pub async fn save_dump(&self, token: &str, dir: &Path) -> Result<PathBuf, ClientError> {
        const ACTION: &str = "Save dump";
        let req = self
            .http
            .get(self.url("/admin-panel/save-dump"))
            .bearer_auth(token);
        let mut resp = Self::send(ACTION, req).await?;

        let file_name = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_filename)
            .ok_or(ClientError::MissingFilename)?;

        let path = dir.join(file_name);
        let io_err = |source| ClientError::Io {
            path: path.clone(),
            source,
        };
        let mut file = tokio::fs::File::create(&path).await.map_err(io_err)?;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|source| ClientError::Transport { action: ACTION, source })?
        {
            file.write_all(&chunk).await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;

        debug!(path = %path.display(), "dump saved");
        Ok(path)
    }

    /// Upload a dump as the multipart part `dump`.
    pub async fn load_dump(
        &self,
        token: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<(), ClientError> {
        const ACTION: &str = "Upload database dump";
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("application/sql")
            .map_err(|source| ClientError::Transport { action: ACTION, source })?;
        let form = reqwest::multipart::Form::new().part("dump", part);
        let req = self
            .http
            .post(self.url("/admin-panel/load-dump"))
            .bearer_auth(token)
            .multipart(form);
        Self::send(ACTION, req).await?;
        Ok(())
    }
}

/// Message to surface for a rejected request: the gateway's `{"error": ...}`
/// text when present, else the raw body, else the status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(body) {
        return error;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

/// Pull the file name out of a `Content-Disposition` header value.
///
/// Surrounding quotes and any directory components are dropped so the
/// server cannot steer the write outside the target directory.
pub fn extract_filename(header: &str) -> Option<String> {
    let raw = FILENAME_RE.captures(header)?.get(1)?.as_str();
    let raw = raw.split(';').next().unwrap_or(raw).trim().trim_matches('"');
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

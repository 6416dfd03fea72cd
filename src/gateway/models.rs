use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub type AlbumId = i64;
pub type ArtistId = i64;
pub type UserId = i64;

/// Shown wherever the gateway hands back an empty or unusable image URL.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/150";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub number: u32,
    pub name: String,
}

/// Album as returned by catalog, search, order and profile endpoints.
///
/// Listing endpoints omit tracks and author; only the album profile
/// carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub author: Option<Artist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub total_price: f64,
    #[serde(default)]
    pub is_paid: bool,
    pub date: DateTime<FixedOffset>,
    #[serde(default)]
    pub albums: Vec<Album>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
}

/// Body of `POST /` and `POST /search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub albums: Vec<Album>,
}

pub type SearchResults = Catalog;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtistProfile {
    pub artist: Artist,
    #[serde(default)]
    pub albums: Vec<Album>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlbumProfile {
    pub album: Album,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user: User,
    #[serde(default)]
    pub purchased_albums: Vec<Album>,
}

/// One purchase entry from the admin log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyLog {
    pub buyer: User,
    pub album: Album,
    pub logging_time: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsPage {
    #[serde(default)]
    pub logs: Vec<BuyLog>,
    pub logs_count: u64,
}

/// Both fields are required; a body missing either is a format error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub jwt: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub is_admin: bool,
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CatalogRequest {
    pub albums_count: u32,
    pub artists_count: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DepositRequest {
    pub money: u64,
}

/// Entity kinds reachable through `GET /{entityType}/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Artists,
    Albums,
}

impl EntityKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Artists => "artists",
            Self::Albums => "albums",
        }
    }
}

/// Image URL to display, falling back to a placeholder when the stored one
/// is empty or not an absolute http(s) URL.
pub fn display_image_url(url: &str) -> &str {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => url,
        _ => PLACEHOLDER_IMAGE_URL,
    }
}

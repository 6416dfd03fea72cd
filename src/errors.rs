//! Typed error hierarchy for the albums client.
//!
//! Every gateway call and every storefront handler returns `ClientError`.
//! Variants fall into three groups:
//! - transport failures: `Transport` (network, timeout) and `Status` (non-2xx)
//! - `Format`: the gateway answered 2xx but the body had an unexpected shape
//! - local preconditions that are rejected before any request is sent

use reqwest::StatusCode;
use thiserror::Error;

use crate::gateway::models::AlbumId;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{action} failed: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{action} failed: {message} ({status})")]
    Status {
        action: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("{action} failed: invalid response format ({detail})")]
    Format {
        action: &'static str,
        detail: String,
    },

    #[error("You must be logged in to do that")]
    NotLoggedIn,

    #[error("Admin privileges required")]
    AdminRequired,

    #[error("Album {album_id} is already in the order")]
    AlreadyInOrder { album_id: AlbumId },

    #[error("Album {album_id} is not in the order")]
    NotInOrder { album_id: AlbumId },

    #[error("Order already purchased; add an album before buying again")]
    AlreadyPurchased,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to extract filename from the response header")]
    MissingFilename,

    #[error("File error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Network failures and non-2xx responses.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// HTTP status of a rejected request, if the gateway answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

//! Typed access to the albums gateway.
//!
//! | Module    | Responsibility                                          |
//! |-----------|---------------------------------------------------------|
//! | `client`  | `GatewayClient`: one method per gateway endpoint        |
//! | `models`  | Wire types: `Album`, `Artist`, `Order`, `LogsPage`, ... |
//!
//! The client never retries and never caches; caching decisions live in the
//! session.

pub mod client;
pub mod models;

pub use client::{CATALOG_ALBUMS, CATALOG_ARTISTS, GatewayClient, extract_filename};
pub use models::display_image_url;

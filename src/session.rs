//! Client-side state for one logged-in (or anonymous) user.

use std::collections::BTreeSet;

use tracing::info;

use crate::errors::ClientError;
use crate::gateway::models::{AlbumId, Catalog};
use crate::notifications::{ListenerState, NotificationListener, NotificationLog};
use crate::pager::LogPager;

/// Everything the storefront remembers between user actions.
///
/// Created empty, populated by [`authenticate`](Self::authenticate), wiped by
/// [`clear`](Self::clear). The session owns its notification listener, so at
/// most one socket exists per session and it goes away with the token.
#[derive(Debug)]
pub struct Session {
    notifications_url: String,
    token: Option<String>,
    is_admin: bool,
    pending_order: BTreeSet<AlbumId>,
    bought: bool,
    reload_catalog: bool,
    catalog: Option<Catalog>,
    pager: LogPager,
    notifications: NotificationLog,
    listener: Option<NotificationListener>,
}

impl Session {
    pub fn new(notifications_url: impl Into<String>) -> Self {
        Self {
            notifications_url: notifications_url.into(),
            token: None,
            is_admin: false,
            pending_order: BTreeSet::new(),
            bought: false,
            reload_catalog: false,
            catalog: None,
            pager: LogPager::new(),
            notifications: NotificationLog::new(),
            listener: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn require_token(&self) -> Result<&str, ClientError> {
        self.token().ok_or(ClientError::NotLoggedIn)
    }

    pub fn require_admin(&self) -> Result<&str, ClientError> {
        let token = self.require_token()?;
        if !self.is_admin {
            return Err(ClientError::AdminRequired);
        }
        Ok(token)
    }

    /// Store the credentials from a successful login and start the
    /// notification listener. A listener left over from an earlier login is
    /// shut down first.
    ///
    /// A different token starts from empty per-user state (pending order,
    /// purchase flag, cached catalog, pager); the notification log is kept.
    pub async fn authenticate(&mut self, token: String, is_admin: bool) {
        if let Some(old) = self.listener.take() {
            old.shutdown().await;
        }
        if self.token.as_deref() != Some(token.as_str()) {
            let url = std::mem::take(&mut self.notifications_url);
            let log = self.notifications.clone();
            *self = Self {
                notifications: log,
                ..Self::new(url)
            };
        }
        self.listener = Some(NotificationListener::spawn(
            self.notifications_url.clone(),
            token.clone(),
            self.notifications.clone(),
        ));
        self.token = Some(token);
        self.is_admin = is_admin;
        info!(is_admin, "session authenticated");
    }

    /// Drop every piece of session state and stop the listener.
    ///
    /// The notification log is replaced rather than truncated; a handle to
    /// the old log keeps seeing every entry it ever had.
    pub async fn clear(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.shutdown().await;
        }
        let url = std::mem::take(&mut self.notifications_url);
        *self = Self::new(url);
        info!("session cleared");
    }

    pub fn pending_order(&self) -> &BTreeSet<AlbumId> {
        &self.pending_order
    }

    pub fn is_pending(&self, album_id: AlbumId) -> bool {
        self.pending_order.contains(&album_id)
    }

    pub(crate) fn insert_pending(&mut self, album_id: AlbumId) -> bool {
        self.pending_order.insert(album_id)
    }

    pub(crate) fn remove_pending(&mut self, album_id: AlbumId) -> bool {
        self.pending_order.remove(&album_id)
    }

    /// Replace the pending set with the albums of the latest unpaid orders.
    pub fn replace_pending(&mut self, album_ids: impl IntoIterator<Item = AlbumId>) {
        self.pending_order = album_ids.into_iter().collect();
    }

    /// True right after a purchase; buying again is refused until the next
    /// add.
    pub fn bought(&self) -> bool {
        self.bought
    }

    pub(crate) fn set_bought(&mut self, bought: bool) {
        self.bought = bought;
    }

    pub(crate) fn mark_purchased(&mut self) {
        self.pending_order.clear();
        self.bought = true;
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_catalog
    }

    pub fn request_catalog_reload(&mut self) {
        self.reload_catalog = true;
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub(crate) fn store_catalog(&mut self, catalog: Catalog) {
        self.catalog = Some(catalog);
        self.reload_catalog = false;
    }

    pub fn pager(&self) -> &LogPager {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut LogPager {
        &mut self.pager
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn listener(&self) -> Option<&NotificationListener> {
        self.listener.as_ref()
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener
            .as_ref()
            .map_or(ListenerState::Disconnected, NotificationListener::state)
    }
}

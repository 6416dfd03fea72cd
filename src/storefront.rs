//! One async handler per user action.
//!
//! Every handler takes the shared [`GatewayClient`] and the caller's
//! [`Session`]. Local preconditions (login, admin flag, pending-order
//! membership, input checks) are enforced here before any request goes out;
//! the gateway remains the authority on everything else.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::ClientError;
use crate::gateway::models::{
    AlbumId, AlbumProfile, ArtistId, ArtistProfile, Catalog, LogsPage, Order, Registration,
    SearchResults, UserProfile,
};
use crate::gateway::{CATALOG_ALBUMS, CATALOG_ARTISTS, GatewayClient};
use crate::notifications::Notification;
use crate::pager::PAGE_SIZE;
use crate::session::Session;

/// Image URL sent when the user leaves the field blank.
pub const NO_IMAGE: &str = "-";

/// Input collected by the registration form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub image_url: String,
    /// Passphrase entered to register as admin. `None` or empty registers a
    /// regular user.
    pub admin_passphrase: Option<String>,
}

impl RegistrationForm {
    /// Check required fields and the admin passphrase, producing the body
    /// the gateway expects.
    pub fn validate(&self, config: &Config) -> Result<Registration, ClientError> {
        if [&self.email, &self.nickname, &self.password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(ClientError::InvalidInput(
                "Please fill all required fields.".into(),
            ));
        }

        let is_admin = match self.admin_passphrase.as_deref() {
            None | Some("") => false,
            Some(pass) if config.is_admin_passphrase(pass) => true,
            Some(_) => {
                return Err(ClientError::InvalidInput(
                    "Invalid admin passphrase.".into(),
                ));
            }
        };

        let image_url = match self.image_url.trim() {
            "" => NO_IMAGE.to_string(),
            url => url.to_string(),
        };

        Ok(Registration {
            email: self.email.trim().to_string(),
            nickname: self.nickname.trim().to_string(),
            password: self.password.clone(),
            is_admin,
            image_url,
        })
    }
}

/// Log in and start the notification listener.
///
/// The session is only touched once the gateway accepts the credentials.
pub async fn login(
    api: &GatewayClient,
    session: &mut Session,
    email: &str,
    password: &str,
) -> Result<(), ClientError> {
    let response = api.login(email, password).await?;
    session.authenticate(response.jwt, response.is_admin).await;
    info!(email, is_admin = session.is_admin(), "logged in");

    if let Err(e) = refresh_pending_order(api, session).await {
        warn!(error = %e, "could not restore pending order after login");
    }
    Ok(())
}

/// Register a new account. Returns whether it was created as admin.
pub async fn register(
    api: &GatewayClient,
    config: &Config,
    form: &RegistrationForm,
) -> Result<bool, ClientError> {
    let registration = form.validate(config)?;
    api.register(&registration).await?;
    info!(email = %registration.email, is_admin = registration.is_admin, "registered");
    Ok(registration.is_admin)
}

pub async fn logout(api: &GatewayClient, session: &mut Session) -> Result<(), ClientError> {
    let token = session.require_token()?.to_string();
    api.logout(&token).await?;
    session.clear().await;
    info!("logged out");
    Ok(())
}

pub async fn search(
    api: &GatewayClient,
    session: &Session,
    query: &str,
) -> Result<SearchResults, ClientError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ClientError::InvalidInput("Please enter a search query.".into()));
    }
    api.search(session.token(), query).await
}

/// Front-page catalog, served from the session cache unless `force` is set,
/// nothing is cached yet, or a delete asked for a reload.
pub async fn catalog(
    api: &GatewayClient,
    session: &mut Session,
    force: bool,
) -> Result<Catalog, ClientError> {
    if force || session.reload_requested() || session.catalog().is_none() {
        debug!(force, reload = session.reload_requested(), "fetching catalog");
        let fresh = api
            .catalog(session.token(), CATALOG_ALBUMS, CATALOG_ARTISTS)
            .await?;
        session.store_catalog(fresh);
    }
    Ok(session.catalog().cloned().unwrap_or_default())
}

pub async fn artist_profile(
    api: &GatewayClient,
    session: &Session,
    id: ArtistId,
) -> Result<ArtistProfile, ClientError> {
    api.artist_profile(session.token(), id).await
}

pub async fn album_profile(
    api: &GatewayClient,
    session: &Session,
    id: AlbumId,
) -> Result<AlbumProfile, ClientError> {
    api.album_profile(session.token(), id).await
}

pub async fn user_profile(
    api: &GatewayClient,
    session: &Session,
) -> Result<UserProfile, ClientError> {
    api.user_profile(session.require_token()?).await
}

/// Add an album to the pending order. Nothing is sent if it is already
/// there; the local insert is undone if the gateway refuses.
pub async fn add_to_order(
    api: &GatewayClient,
    session: &mut Session,
    album_id: AlbumId,
) -> Result<(), ClientError> {
    if session.is_pending(album_id) {
        return Err(ClientError::AlreadyInOrder { album_id });
    }

    session.insert_pending(album_id);
    let was_bought = session.bought();
    session.set_bought(false);

    if let Err(e) = api.add_to_order(session.token(), album_id).await {
        session.remove_pending(album_id);
        session.set_bought(was_bought);
        return Err(e);
    }
    debug!(album_id, "added to order");
    Ok(())
}

pub async fn remove_from_order(
    api: &GatewayClient,
    session: &mut Session,
    album_id: AlbumId,
) -> Result<(), ClientError> {
    if !session.is_pending(album_id) {
        return Err(ClientError::NotInOrder { album_id });
    }

    session.remove_pending(album_id);
    if let Err(e) = api.remove_from_order(session.token(), album_id).await {
        session.insert_pending(album_id);
        return Err(e);
    }
    debug!(album_id, "removed from order");
    Ok(())
}

/// Every order of the logged-in user, paid or not.
pub async fn orders(api: &GatewayClient, session: &Session) -> Result<Vec<Order>, ClientError> {
    api.orders(session.require_token()?).await
}

pub fn unpaid_orders(orders: Vec<Order>) -> Vec<Order> {
    orders.into_iter().filter(|order| !order.is_paid).collect()
}

/// Whether the purchase action should be offered for `order`.
pub fn can_buy(session: &Session, order: &Order) -> bool {
    !order.is_paid && !session.bought()
}

/// Replace the pending set with the albums of the user's unpaid orders.
pub async fn refresh_pending_order(
    api: &GatewayClient,
    session: &mut Session,
) -> Result<(), ClientError> {
    let all = api.orders(session.require_token()?).await?;
    let ids: Vec<AlbumId> = unpaid_orders(all)
        .iter()
        .flat_map(|order| order.albums.iter().map(|album| album.id))
        .collect();
    debug!(count = ids.len(), "pending order refreshed");
    session.replace_pending(ids);
    Ok(())
}

/// Purchase the pending order. Refused locally while the last purchase has
/// not been followed by a new add.
pub async fn buy(api: &GatewayClient, session: &mut Session) -> Result<(), ClientError> {
    if session.bought() {
        return Err(ClientError::AlreadyPurchased);
    }
    api.buy(session.token()).await?;
    session.mark_purchased();
    info!("order purchased");
    Ok(())
}

pub async fn deposit(
    api: &GatewayClient,
    session: &Session,
    amount: u64,
) -> Result<(), ClientError> {
    let token = session.require_token()?;
    if amount == 0 {
        return Err(ClientError::InvalidInput(
            "Please enter a valid amount greater than zero.".into(),
        ));
    }
    api.deposit(token, amount).await
}

/// Delete an album and mark the cached catalog stale.
pub async fn delete_album(
    api: &GatewayClient,
    session: &mut Session,
    album_id: AlbumId,
) -> Result<(), ClientError> {
    api.delete_album(session.require_admin()?, album_id).await?;
    session.request_catalog_reload();
    info!(album_id, "album deleted");
    Ok(())
}

/// Fetch the purchase log page the pager currently points at.
pub async fn logs(api: &GatewayClient, session: &mut Session) -> Result<LogsPage, ClientError> {
    let token = session.require_admin()?;
    let page = api.logs(token, session.pager().page(), PAGE_SIZE).await?;
    session.pager_mut().record_total(page.logs_count);
    Ok(page)
}

/// Advance one page and fetch it. `Ok(None)` when already on the last page.
pub async fn next_logs_page(
    api: &GatewayClient,
    session: &mut Session,
) -> Result<Option<LogsPage>, ClientError> {
    session.require_admin()?;
    if !session.pager_mut().next() {
        return Ok(None);
    }
    match logs(api, session).await {
        Ok(page) => Ok(Some(page)),
        Err(e) => {
            session.pager_mut().prev();
            Err(e)
        }
    }
}

/// Step back one page and fetch it. `Ok(None)` when already on page 1.
pub async fn prev_logs_page(
    api: &GatewayClient,
    session: &mut Session,
) -> Result<Option<LogsPage>, ClientError> {
    session.require_admin()?;
    if !session.pager_mut().prev() {
        return Ok(None);
    }
    match logs(api, session).await {
        Ok(page) => Ok(Some(page)),
        Err(e) => {
            session.pager_mut().next();
            Err(e)
        }
    }
}

/// Download the database dump into `dir`.
pub async fn save_dump(
    api: &GatewayClient,
    session: &Session,
    dir: &Path,
) -> Result<PathBuf, ClientError> {
    let path = api.save_dump(session.require_admin()?, dir).await?;
    info!(path = %path.display(), "dump saved");
    Ok(path)
}

/// Upload a dump file, then resync the pending order with the restored data.
pub async fn load_dump(
    api: &GatewayClient,
    session: &mut Session,
    path: &Path,
) -> Result<(), ClientError> {
    let token = session.require_admin()?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ClientError::InvalidInput(format!("Not a file: {}", path.display())))?
        .to_string();
    let contents = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    api.load_dump(token, &file_name, contents).await?;
    info!(file = %file_name, "dump uploaded");

    if let Err(e) = refresh_pending_order(api, session).await {
        warn!(error = %e, "could not refresh pending order after dump upload");
    }
    Ok(())
}

/// Everything the listener has received so far, oldest first.
pub async fn notifications(session: &Session) -> Result<Vec<Notification>, ClientError> {
    session.require_token()?;
    Ok(session.notifications().snapshot().await)
}

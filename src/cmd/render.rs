//! Plain-text rendering of gateway data for the terminal.
//!
//! Functions return `String` so the shell and the one-shot commands share
//! them and tests can inspect the output without a terminal.

use std::collections::BTreeSet;
use std::fmt::Write;

use albums_client::gateway::display_image_url;
use albums_client::gateway::models::{
    Album, AlbumId, AlbumProfile, Artist, ArtistProfile, Catalog, LogsPage, Order, UserProfile,
};
use albums_client::notifications::Notification;
use albums_client::pager::LogPager;
use console::style;

pub fn success(message: impl std::fmt::Display) -> String {
    style(message.to_string()).green().to_string()
}

pub fn failure(message: impl std::fmt::Display) -> String {
    style(format!("Error: {message}")).red().to_string()
}

fn artist_line(artist: &Artist) -> String {
    let genre = if artist.genre.is_empty() {
        String::new()
    } else {
        format!(" ({})", artist.genre)
    };
    format!(
        "  #{:<5} {}{}  {}",
        artist.id,
        artist.name,
        genre,
        style(display_image_url(&artist.image_url)).dim()
    )
}

fn album_line(album: &Album) -> String {
    let author = album
        .author
        .as_ref()
        .map(|a| format!(" by {}", a.name))
        .unwrap_or_default();
    format!(
        "  #{:<5} {}{}  ${:.2}",
        album.id, album.name, author, album.price
    )
}

/// Catalog and search results share a shape.
pub fn catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style("Artists").bold());
    if catalog.artists.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for artist in &catalog.artists {
        let _ = writeln!(out, "{}", artist_line(artist));
    }
    let _ = writeln!(out, "{}", style("Albums").bold());
    if catalog.albums.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for album in &catalog.albums {
        let _ = writeln!(out, "{}", album_line(album));
    }
    out
}

pub fn artist_profile(profile: &ArtistProfile) -> String {
    let mut out = String::new();
    let artist = &profile.artist;
    let _ = writeln!(out, "{}", style(&artist.name).bold());
    if !artist.genre.is_empty() {
        let _ = writeln!(out, "Genre: {}", artist.genre);
    }
    let _ = writeln!(out, "Image: {}", display_image_url(&artist.image_url));
    let _ = writeln!(out, "Albums:");
    for album in &profile.albums {
        let _ = writeln!(out, "{}", album_line(album));
    }
    out
}

pub fn album_profile(profile: &AlbumProfile, pending: bool) -> String {
    let mut out = String::new();
    let album = &profile.album;
    let _ = writeln!(out, "{}", style(&album.name).bold());
    if let Some(author) = &album.author {
        let _ = writeln!(out, "Artist: {} (#{})", author.name, author.id);
    }
    let _ = writeln!(out, "Price: ${:.2}", album.price);
    let _ = writeln!(out, "Image: {}", display_image_url(&album.image_url));
    if pending {
        let _ = writeln!(out, "{}", style("In your order").yellow());
    }
    if !album.tracks.is_empty() {
        let _ = writeln!(out, "Tracks:");
        for track in &album.tracks {
            let _ = writeln!(out, "  {:>2}. {}", track.number, track.name);
        }
    }
    out
}

pub fn user_profile(profile: &UserProfile) -> String {
    let mut out = String::new();
    let user = &profile.user;
    let role = if user.is_admin { " [admin]" } else { "" };
    let _ = writeln!(out, "{}{}", style(&user.nickname).bold(), role);
    let _ = writeln!(out, "Email: {}", user.email);
    let _ = writeln!(out, "Balance: ${:.2}", user.balance);
    let _ = writeln!(out, "Avatar: {}", display_image_url(&user.image_url));
    let _ = writeln!(out, "Purchased albums:");
    if profile.purchased_albums.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for album in &profile.purchased_albums {
        let _ = writeln!(out, "{}", album_line(album));
    }
    out
}

pub fn pending_order(pending: &BTreeSet<AlbumId>) -> String {
    if pending.is_empty() {
        return "Your order is empty.".to_string();
    }
    let ids: Vec<String> = pending.iter().map(|id| format!("#{id}")).collect();
    format!("Albums in your order: {}", ids.join(", "))
}

/// `buyable` is evaluated per order by the caller.
pub fn orders(orders: &[(Order, bool)]) -> String {
    if orders.is_empty() {
        return "No orders.\n".to_string();
    }
    let mut out = String::new();
    for (order, buyable) in orders {
        let status = if order.is_paid {
            style("paid").green().to_string()
        } else {
            style("unpaid").yellow().to_string()
        };
        let _ = writeln!(
            out,
            "Order #{} ({}) {} total ${:.2}",
            order.id,
            order.date.format("%Y-%m-%d %H:%M"),
            status,
            order.total_price
        );
        for album in &order.albums {
            let _ = writeln!(out, "{}", album_line(album));
        }
        if *buyable {
            let _ = writeln!(out, "  -> type `buy` to purchase");
        }
    }
    out
}

pub fn logs(page: &LogsPage, pager: &LogPager) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (page {}, {} entries total)",
        style("Purchase log").bold(),
        pager.page(),
        pager.total()
    );
    if page.logs.is_empty() {
        let _ = writeln!(out, "  (no entries)");
    }
    for entry in &page.logs {
        let _ = writeln!(
            out,
            "  {}  {} bought \"{}\" (#{}) for ${:.2}",
            entry.logging_time.format("%Y-%m-%d %H:%M:%S"),
            entry.buyer.nickname,
            entry.album.name,
            entry.album.id,
            entry.album.price
        );
    }
    let mut nav = Vec::new();
    if pager.can_prev() {
        nav.push("`logs prev`");
    }
    if pager.can_next() {
        nav.push("`logs next`");
    }
    if !nav.is_empty() {
        let _ = writeln!(out, "  {}", nav.join(" | "));
    }
    out
}

pub fn notifications(entries: &[Notification]) -> String {
    if entries.is_empty() {
        return "No notifications yet.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let line = if entry.success {
            success(&entry.message)
        } else {
            style(&entry.message).red().to_string()
        };
        let _ = writeln!(out, "{line}");
    }
    out
}

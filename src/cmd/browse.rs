//! One-shot anonymous commands: `search`, `catalog`, `artist`, `album`,
//! `register`.

use albums_client::config::Config;
use albums_client::gateway::GatewayClient;
use albums_client::session::Session;
use albums_client::storefront::{self, RegistrationForm};
use anyhow::Result;

use super::render;

fn connect(config: &Config) -> (GatewayClient, Session) {
    (
        GatewayClient::new(config.gateway_url()),
        Session::new(config.notifications_url()),
    )
}

pub async fn cmd_search(config: &Config, query: &str) -> Result<()> {
    let (api, session) = connect(config);
    let results = storefront::search(&api, &session, query).await?;
    print!("{}", render::catalog(&results));
    Ok(())
}

pub async fn cmd_catalog(config: &Config) -> Result<()> {
    let (api, mut session) = connect(config);
    let catalog = storefront::catalog(&api, &mut session, false).await?;
    print!("{}", render::catalog(&catalog));
    Ok(())
}

pub async fn cmd_artist(config: &Config, id: i64) -> Result<()> {
    let (api, session) = connect(config);
    let profile = storefront::artist_profile(&api, &session, id).await?;
    print!("{}", render::artist_profile(&profile));
    Ok(())
}

pub async fn cmd_album(config: &Config, id: i64) -> Result<()> {
    let (api, session) = connect(config);
    let profile = storefront::album_profile(&api, &session, id).await?;
    print!("{}", render::album_profile(&profile, false));
    Ok(())
}

pub async fn cmd_register(config: &Config, form: &RegistrationForm) -> Result<()> {
    let api = GatewayClient::new(config.gateway_url());
    let is_admin = storefront::register(&api, config, form).await?;
    let kind = if is_admin { "Admin account" } else { "Account" };
    println!("{}", render::success(format!("{kind} created for {}", form.email)));
    Ok(())
}

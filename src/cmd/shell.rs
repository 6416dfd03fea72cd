//! Interactive storefront session: `albums shell`.
//!
//! Each input line is parsed with clap in multicall mode, so the first word
//! is the command name and `help` works like it does on the real CLI. One
//! `Session` lives for the whole loop; handler errors are printed inline and
//! the loop keeps going.

use std::io::Write;
use std::path::PathBuf;

use albums_client::config::Config;
use albums_client::errors::ClientError;
use albums_client::gateway::GatewayClient;
use albums_client::session::Session;
use albums_client::storefront::{self, RegistrationForm};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum, error::ErrorKind};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::render;

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ShellCommand {
    /// Log in and start receiving notifications
    Login { email: String, password: String },
    /// Log out and stop notifications
    Logout,
    /// Create an account
    Register {
        email: String,
        nickname: String,
        password: String,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        passphrase: Option<String>,
    },
    /// Search artists and albums
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show the front-page catalog
    Catalog {
        /// Fetch again even if cached
        #[arg(long)]
        reload: bool,
    },
    Artist { id: i64 },
    Album { id: i64 },
    /// Show your account and purchased albums
    Profile,
    /// Add an album to your order
    Add { id: i64 },
    /// Remove an album from your order
    Remove { id: i64 },
    /// List albums in your pending order
    Order,
    /// List your unpaid orders
    Orders {
        /// Include paid orders
        #[arg(long)]
        all: bool,
    },
    /// Purchase the pending order
    Buy,
    /// Add money to your balance
    Deposit { amount: u64 },
    /// Delete an album (admin)
    Delete { id: i64 },
    /// Show the purchase log (admin)
    Logs { direction: Option<PageDirection> },
    /// Download a database dump (admin)
    SaveDump { dir: Option<PathBuf> },
    /// Upload a database dump (admin)
    LoadDump { file: PathBuf },
    /// Show received notifications
    Notifications,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PageDirection {
    Next,
    Prev,
}

pub fn parse_line(line: &str) -> Result<ShellCommand, clap::Error> {
    ShellLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command)
}

pub async fn cmd_shell(config: &Config) -> Result<()> {
    let api = GatewayClient::new(config.gateway_url());
    let mut session = Session::new(config.notifications_url());
    let interactive = console::user_attended();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if interactive {
        println!("albums shell on {} (type `help`)", api.base_url());
    }

    loop {
        if interactive {
            print!("albums> ");
            std::io::stdout().flush().context("Failed to flush stdout")?;
        }
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                print!("{e}");
                continue;
            }
            Err(e) => {
                print!("{}", console::style(e.to_string()).red());
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }

        match execute(&api, config, &mut session, command).await {
            Ok(output) => println!("{}", output.trim_end()),
            Err(e) => println!("{}", render::failure(e)),
        }
    }

    session.clear().await;
    Ok(())
}

pub async fn execute(
    api: &GatewayClient,
    config: &Config,
    session: &mut Session,
    command: ShellCommand,
) -> Result<String, ClientError> {
    let output = match command {
        ShellCommand::Login { email, password } => {
            storefront::login(api, session, &email, &password).await?;
            let role = if session.is_admin() { " (admin)" } else { "" };
            render::success(format!("Logged in as {email}{role}"))
        }
        ShellCommand::Logout => {
            storefront::logout(api, session).await?;
            render::success("Logged out")
        }
        ShellCommand::Register {
            email,
            nickname,
            password,
            image,
            passphrase,
        } => {
            let form = RegistrationForm {
                email,
                nickname,
                password,
                image_url: image.unwrap_or_default(),
                admin_passphrase: passphrase,
            };
            let is_admin = storefront::register(api, config, &form).await?;
            let kind = if is_admin { "Admin account" } else { "Account" };
            render::success(format!("{kind} created, you can log in now"))
        }
        ShellCommand::Search { query } => {
            let results = storefront::search(api, session, &query.join(" ")).await?;
            render::catalog(&results)
        }
        ShellCommand::Catalog { reload } => {
            let catalog = storefront::catalog(api, session, reload).await?;
            render::catalog(&catalog)
        }
        ShellCommand::Artist { id } => {
            render::artist_profile(&storefront::artist_profile(api, session, id).await?)
        }
        ShellCommand::Album { id } => {
            let profile = storefront::album_profile(api, session, id).await?;
            render::album_profile(&profile, session.is_pending(id))
        }
        ShellCommand::Profile => render::user_profile(&storefront::user_profile(api, session).await?),
        ShellCommand::Add { id } => {
            storefront::add_to_order(api, session, id).await?;
            render::success(format!("Album #{id} added to your order"))
        }
        ShellCommand::Remove { id } => {
            storefront::remove_from_order(api, session, id).await?;
            render::success(format!("Album #{id} removed from your order"))
        }
        ShellCommand::Order => render::pending_order(session.pending_order()),
        ShellCommand::Orders { all } => {
            let mut orders = storefront::orders(api, session).await?;
            if !all {
                orders = storefront::unpaid_orders(orders);
            }
            let session: &Session = session;
            let rows: Vec<_> = orders
                .into_iter()
                .map(|order| {
                    let buyable = storefront::can_buy(session, &order);
                    (order, buyable)
                })
                .collect();
            render::orders(&rows)
        }
        ShellCommand::Buy => {
            storefront::buy(api, session).await?;
            render::success("Order purchased")
        }
        ShellCommand::Deposit { amount } => {
            storefront::deposit(api, session, amount).await?;
            render::success(format!(
                "Deposit of {amount} requested; the result arrives as a notification"
            ))
        }
        ShellCommand::Delete { id } => {
            storefront::delete_album(api, session, id).await?;
            render::success(format!("Album #{id} deleted"))
        }
        ShellCommand::Logs { direction } => {
            let page = match direction {
                None => Some(storefront::logs(api, session).await?),
                Some(PageDirection::Next) => storefront::next_logs_page(api, session).await?,
                Some(PageDirection::Prev) => storefront::prev_logs_page(api, session).await?,
            };
            match page {
                Some(page) => render::logs(&page, session.pager()),
                None => "No more pages in that direction.".to_string(),
            }
        }
        ShellCommand::SaveDump { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let path = storefront::save_dump(api, session, &dir).await?;
            render::success(format!("Dump saved to {}", path.display()))
        }
        ShellCommand::LoadDump { file } => {
            storefront::load_dump(api, session, &file).await?;
            render::success("Dump uploaded")
        }
        ShellCommand::Notifications => {
            render::notifications(&storefront::notifications(session).await?)
        }
        ShellCommand::Quit => String::new(),
    };
    Ok(output)
}

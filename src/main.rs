use albums_client::config::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "albums")]
#[command(version, about = "Terminal storefront for the albums gateway")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search artists and albums
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show the front-page catalog
    Catalog,
    /// Show an artist and their albums
    Artist { id: i64 },
    /// Show an album with its track list
    Album { id: i64 },
    /// Create an account
    Register {
        email: String,
        nickname: String,
        password: String,

        /// Avatar URL
        #[arg(long)]
        image: Option<String>,

        /// Admin passphrase; must match ADMIN_PASS
        #[arg(long)]
        passphrase: Option<String>,
    },
    /// Interactive session: log in, manage orders, receive notifications
    Shell,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::prelude::*;

    let default_directive = if verbose { "albums_client=debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.config.validate()?;

    let config = &cli.config;
    match &cli.command {
        Commands::Search { query } => cmd::cmd_search(config, &query.join(" ")).await?,
        Commands::Catalog => cmd::cmd_catalog(config).await?,
        Commands::Artist { id } => cmd::cmd_artist(config, *id).await?,
        Commands::Album { id } => cmd::cmd_album(config, *id).await?,
        Commands::Register {
            email,
            nickname,
            password,
            image,
            passphrase,
        } => {
            let form = albums_client::storefront::RegistrationForm {
                email: email.clone(),
                nickname: nickname.clone(),
                password: password.clone(),
                image_url: image.clone().unwrap_or_default(),
                admin_passphrase: passphrase.clone(),
            };
            cmd::cmd_register(config, &form).await?;
        }
        Commands::Shell => cmd::cmd_shell(config).await?,
    }

    Ok(())
}

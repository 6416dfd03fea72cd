use clap::Args;

/// Connection settings for the gateway and its notification socket.
///
/// Every field can come from the command line or the environment; `main`
/// loads a `.env` file with `dotenvy` before parsing. The ports have no
/// defaults; [`validate`](Self::validate) rejects a config without them.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Host running the gateway and the notifications service
    #[arg(long, env = "GATEWAY_HOST", default_value = "localhost", global = true)]
    pub gateway_host: String,

    /// Gateway HTTP port
    #[arg(long, env = "GATEWAY_PORT", global = true)]
    pub gateway_port: Option<u16>,

    /// Notifications WebSocket port
    #[arg(long, env = "NOTIFICATIONS_PORT", global = true)]
    pub notifications_port: Option<u16>,

    /// Passphrase that unlocks admin registration
    #[arg(long, env = "ADMIN_PASS", hide_env_values = true, global = true)]
    pub admin_pass: Option<String>,
}

impl Config {
    pub fn new(host: impl Into<String>, gateway_port: u16, notifications_port: u16) -> Self {
        Self {
            gateway_host: host.into(),
            gateway_port: Some(gateway_port),
            notifications_port: Some(notifications_port),
            admin_pass: None,
        }
    }

    pub fn with_admin_pass(mut self, pass: impl Into<String>) -> Self {
        self.admin_pass = Some(pass.into());
        self
    }

    /// Fails with a readable message when a required port is missing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gateway_port.is_none() {
            anyhow::bail!("GATEWAY_PORT is not set (use --gateway-port or the environment)");
        }
        if self.notifications_port.is_none() {
            anyhow::bail!(
                "NOTIFICATIONS_PORT is not set (use --notifications-port or the environment)"
            );
        }
        Ok(())
    }

    /// Base URL of the HTTP gateway, without a trailing slash.
    pub fn gateway_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.gateway_host,
            self.gateway_port.unwrap_or_default()
        )
    }

    pub fn notifications_url(&self) -> String {
        format!(
            "ws://{}:{}/ws",
            self.gateway_host,
            self.notifications_port.unwrap_or_default()
        )
    }

    /// True only when a non-empty passphrase is configured and matches.
    pub fn is_admin_passphrase(&self, candidate: &str) -> bool {
        match self.admin_pass.as_deref() {
            Some(expected) if !expected.is_empty() => expected == candidate,
            _ => false,
        }
    }
}

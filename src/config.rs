use anyhow::{Context, Result};

/// Maximum number of numbered provider slots read from the environment.
pub const MAX_PROVIDER_SLOTS: usize = 15;

/// Seconds between reconciliation cycles when REFRESH_INTERVAL is unset.
pub const DEFAULT_REFRESH_INTERVAL: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub mailbox: MailboxConfig,
    pub http: HttpConfig,
    pub providers: Vec<Provider>,
    pub refresh_interval: u64,
    pub database_path: String,
}

#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub server: String,
    pub port: u16,
    pub address: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// An external service whose incident status is tracked via the sender
/// address it uses for notification emails. Loaded once at startup, never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub name: String,
    pub mail_address: String,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Missing mailbox parameters are a configuration error, not a
        // runtime error: abort startup, never retry.
        Self::check_required_env_vars()?;

        Ok(Config {
            mailbox: MailboxConfig {
                server: std::env::var("IMAP_SERVER").context("IMAP_SERVER must be set")?,
                port: std::env::var("IMAP_PORT")
                    .context("IMAP_PORT must be set")?
                    .parse()
                    .context("IMAP_PORT must be a valid port number")?,
                address: std::env::var("EMAIL_ADDRESS").context("EMAIL_ADDRESS must be set")?,
                password: std::env::var("EMAIL_PASSWORD").context("EMAIL_PASSWORD must be set")?,
            },
            http: HttpConfig {
                bind: std::env::var("HTTP_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: match std::env::var("HTTP_PORT") {
                    Ok(value) => value.parse().context("HTTP_PORT must be a valid port number")?,
                    Err(_) => 8000,
                },
            },
            providers: Self::load_providers(),
            refresh_interval: match std::env::var("REFRESH_INTERVAL") {
                Ok(value) => value
                    .parse()
                    .context("REFRESH_INTERVAL must be a number of seconds")?,
                Err(_) => DEFAULT_REFRESH_INTERVAL,
            },
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "incidents.db".to_string()),
        })
    }

    fn check_required_env_vars() -> Result<()> {
        let required_vars = ["IMAP_SERVER", "IMAP_PORT", "EMAIL_ADDRESS", "EMAIL_PASSWORD"];

        let mut missing_vars = Vec::new();

        for var in &required_vars {
            if std::env::var(var).is_err() {
                missing_vars.push(*var);
            }
        }

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 Create a .env file with your mailbox credentials:\n\
                    cp .env.example .env\n\
                    # then edit .env with your values\n\
                 \n\
                 Or export the variables manually:\n\
                    export IMAP_SERVER=imap.example.com\n\
                    export IMAP_PORT=993\n\
                    export EMAIL_ADDRESS=status@example.com\n\
                    export EMAIL_PASSWORD=...",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }

    /// Reads the numbered provider slots in index order. A slot is included
    /// only when both its name and mail address are present and non-empty;
    /// half-filled slots are skipped entirely.
    fn load_providers() -> Vec<Provider> {
        (1..=MAX_PROVIDER_SLOTS)
            .filter_map(|i| {
                let name = std::env::var(format!("PROVIDER_{}_NAME", i)).ok();
                let mail_address = std::env::var(format!("PROVIDER_{}_EMAIL", i)).ok();
                Provider::from_slot(name, mail_address)
            })
            .collect()
    }
}

impl Provider {
    /// Builds a provider from one numbered slot's variables, if the slot is
    /// completely filled in.
    pub fn from_slot(name: Option<String>, mail_address: Option<String>) -> Option<Provider> {
        let name = name?.trim().to_string();
        let mail_address = mail_address?.trim().to_string();

        if name.is_empty() || mail_address.is_empty() {
            return None;
        }

        Some(Provider { name, mail_address })
    }
}

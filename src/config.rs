use clap::Parser;

use anyhow::Result;

/// Runtime configuration.
///
/// Flags take precedence over environment variables, which take precedence
/// over the built-in defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "loyalty-gateway", about = "Loyalty points gateway server")]
pub struct AppConfig {
    /// HTTP bind address; a leading ':' binds all interfaces
    #[arg(short = 'a', long = "address", env = "RUN_ADDRESS", default_value = ":8080")]
    pub run_address: String,

    /// Accrual service base URL
    #[arg(
        short = 'r',
        long = "accrual",
        env = "ACCRUAL_SYSTEM_ADDRESS",
        default_value = "http://localhost:7070"
    )]
    pub accrual_address: String,

    /// Postgres connection DSN
    #[arg(short = 'd', long = "database", env = "DATABASE_URI")]
    pub database_uri: String,

    /// Number of additional workers (one worker runs regardless)
    #[arg(short = 'n', long = "workers", env = "N_WORKERS", default_value_t = 7)]
    pub worker_number: usize,

    /// Consecutive polling failures tolerated per order
    #[arg(long = "retries", env = "N_RETRIES", default_value_t = 5)]
    pub retry_number: u32,

    /// Symmetric key feeding the credential cipher and the token signer
    #[arg(
        long = "secret",
        env = "SECRET_KEY",
        default_value = "jds__63h3_7ds",
        hide_env_values = true
    )]
    pub secret_key: String,

    /// Default log filter when RUST_LOG is unset
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl AppConfig {
    /// Validate configuration at startup.
    ///
    /// Returns an error if any critical configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_uri.is_empty() {
            anyhow::bail!("Invalid database URI: must not be empty");
        }

        if self.accrual_address.is_empty() {
            anyhow::bail!("Invalid accrual address: must not be empty");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log_level '{}': must be one of {:?}",
                self.log_level,
                valid_levels
            );
        }

        Ok(())
    }

    /// Bind address in the form the listener accepts.
    pub fn bind_address(&self) -> String {
        if self.run_address.starts_with(':') {
            format!("0.0.0.0{}", self.run_address)
        } else {
            self.run_address.clone()
        }
    }
}

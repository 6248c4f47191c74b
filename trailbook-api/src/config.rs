/// Configuration management for the API server
///
/// Loads configuration from environment variables (a `.env` file is read in
/// development) into a type-safe struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string; may contain a
///   `<PASSWORD>` placeholder filled from `DATABASE_PASSWORD`
/// - `DATABASE_PASSWORD`: substituted into the placeholder above
/// - `API_HOST` / `API_PORT`: bind address (default 0.0.0.0:8080)
/// - `PUBLIC_URL`: externally visible base URL (checkout redirects)
/// - `APP_ENV`: "production" enables production behavior
/// - `JWT_SECRET`: secret key for session token signing (required, >= 32 chars)
/// - `JWT_EXPIRES_IN_DAYS`: session token lifetime (default 90)
/// - `JWT_COOKIE_EXPIRES_IN_DAYS`: session cookie lifetime (default 90)
/// - `CORS_ORIGINS`: comma-separated allowed origins ("*" for permissive)
/// - `MAIL_API_URL` / `MAIL_API_KEY` / `MAIL_FROM`: outbound mail transport
/// - `PAYMENT_API_URL` / `PAYMENT_SECRET_KEY`: checkout provider
///
/// # Example
///
/// ```no_run
/// use trailbook_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Outbound mail configuration
    pub mail: MailConfig,

    /// Payment provider configuration
    pub payments: PaymentsConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Externally visible base URL (no trailing slash)
    pub public_url: String,

    /// Production mode: HSTS, Secure cookies, generic 500 bodies
    pub production: bool,

    /// Allowed CORS origins; ["*"] means permissive
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL (password already substituted)
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing
    ///
    /// Must be kept secret and at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in days
    pub expires_in_days: i64,

    /// Session cookie lifetime in days
    pub cookie_expires_days: i64,
}

/// Outbound mail configuration (HTTP mail API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Mail provider send endpoint
    pub api_url: String,

    /// Bearer credential for the provider
    pub api_key: String,

    /// From address, e.g. "Trailbook <hello@trailbook.dev>"
    pub from: String,
}

/// Payment provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Provider API base URL (no trailing slash)
    pub api_url: String,

    /// Secret API key
    pub secret_key: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing, the JWT secret is
    /// too short, or numeric values fail to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let public_url =
            env::var("PUBLIC_URL").unwrap_or_else(|_| format!("http://{}:{}", api_host, api_port));
        let production = env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let raw_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let database_url = substitute_password(&raw_url, env::var("DATABASE_PASSWORD").ok())?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expires_in_days = env::var("JWT_EXPIRES_IN_DAYS")
            .unwrap_or_else(|_| "90".to_string())
            .parse::<i64>()?;
        let cookie_expires_days = env::var("JWT_COOKIE_EXPIRES_IN_DAYS")
            .unwrap_or_else(|_| "90".to_string())
            .parse::<i64>()?;

        let mail = MailConfig {
            api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://mail.example.com/v1/send".to_string()),
            api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Trailbook <hello@trailbook.dev>".to_string()),
        };

        let payments = PaymentsConfig {
            api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            secret_key: env::var("PAYMENT_SECRET_KEY").unwrap_or_default(),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                public_url,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_days,
                cookie_expires_days,
            },
            mail,
            payments,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Fills the `<PASSWORD>` placeholder in a connection URL
///
/// URLs without the placeholder pass through untouched; a placeholder with
/// no `DATABASE_PASSWORD` set is a configuration error.
fn substitute_password(url: &str, password: Option<String>) -> anyhow::Result<String> {
    if !url.contains("<PASSWORD>") {
        return Ok(url.to_string());
    }
    match password {
        Some(password) => Ok(url.replace("<PASSWORD>", &password)),
        None => anyhow::bail!(
            "DATABASE_URL contains a <PASSWORD> placeholder but DATABASE_PASSWORD is not set"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://127.0.0.1:8080".to_string(),
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expires_in_days: 90,
                cookie_expires_days: 90,
            },
            mail: MailConfig {
                api_url: "https://mail.example.com/v1/send".to_string(),
                api_key: "key".to_string(),
                from: "Trailbook <hello@trailbook.dev>".to_string(),
            },
            payments: PaymentsConfig {
                api_url: "https://api.stripe.com".to_string(),
                secret_key: "sk_test".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(sample_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_password_substitution() {
        let url = "postgresql://trailbook:<PASSWORD>@db:5432/trailbook";
        let filled = substitute_password(url, Some("s3cret".to_string())).unwrap();
        assert_eq!(filled, "postgresql://trailbook:s3cret@db:5432/trailbook");
    }

    #[test]
    fn test_password_substitution_without_placeholder() {
        let url = "postgresql://localhost/test";
        assert_eq!(substitute_password(url, None).unwrap(), url);
    }

    #[test]
    fn test_placeholder_without_password_is_an_error() {
        let url = "postgresql://trailbook:<PASSWORD>@db/trailbook";
        assert!(substitute_password(url, None).is_err());
    }
}

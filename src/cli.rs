//! CLI argument parsing, validation, and startup helpers.

use std::net::IpAddr;

use crate::ServerConfig;
use crate::auth::TokenSettings;
use crate::db::{Database, UserRole};
use crate::rate_limit::DEFAULT_LOGIN_PER_MIN;
use clap::Parser;
use jsonwebtoken::Algorithm;
use tracing::{error, info, warn};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// HMAC algorithm used to sign tokens.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JwtAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(value: JwtAlgorithm) -> Self {
        match value {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::Hs384 => Algorithm::HS384,
            JwtAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

/// Header a reverse proxy uses to pass on the client address.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientIpHeader {
    XForwardedFor,
    XRealIp,
}

impl ClientIpHeader {
    pub fn header_name(&self) -> &'static str {
        match self {
            ClientIpHeader::XForwardedFor => "x-forwarded-for",
            ClientIpHeader::XRealIp => "x-real-ip",
        }
    }

    /// Parse the client IP out of a header value. For X-Forwarded-For the
    /// left-most entry is the original client.
    pub fn extract(&self, value: &str) -> Result<String, &'static str> {
        let candidate = match self {
            ClientIpHeader::XForwardedFor => value.split(',').next().unwrap_or_default(),
            ClientIpHeader::XRealIp => value,
        }
        .trim();

        candidate
            .parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|_| "IP header does not contain a valid address")
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "HealthMe", about = "Account and token authentication service")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "healthme.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Algorithm used to sign access and refresh tokens
    #[arg(long, value_enum, default_value = "hs256")]
    pub jwt_algorithm: JwtAlgorithm,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL", default_value = "300")]
    pub access_token_ttl: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_TTL", default_value = "1209600")]
    pub refresh_token_ttl: u64,

    /// Login attempts allowed per minute per client IP
    #[arg(long, default_value_t = DEFAULT_LOGIN_PER_MIN)]
    pub login_rate_limit: u32,

    /// Read the client IP from this header (only when running behind a proxy)
    #[arg(long, value_enum)]
    pub ip_header: Option<ClientIpHeader>,

    /// Grant the admin role to an existing account on startup
    #[arg(long)]
    pub promote_admin: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Check the token lifetimes. Returns None and logs an error if they are unusable.
pub fn validate_token_settings(access_ttl: u64, refresh_ttl: u64) -> Option<TokenSettings> {
    if access_ttl == 0 || refresh_ttl == 0 {
        error!("Token lifetimes must be at least one second");
        return None;
    }

    if refresh_ttl <= access_ttl {
        error!(
            access_ttl,
            refresh_ttl, "Refresh tokens must outlive access tokens"
        );
        return None;
    }

    Some(TokenSettings {
        access_ttl_secs: access_ttl,
        refresh_ttl_secs: refresh_ttl,
    })
}

/// Handle the --promote-admin flag.
pub async fn handle_promote_admin(db: &Database, email: &str) {
    match db.accounts().set_role(email, UserRole::Admin).await {
        Ok(true) => info!(email = %email, "Granted admin role"),
        Ok(false) => warn!(email = %email, "No account to promote"),
        Err(e) => {
            error!(error = %e, "Failed to promote admin");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    jwt_algorithm: JwtAlgorithm,
    token_settings: TokenSettings,
    login_rate_limit: u32,
    ip_header: Option<ClientIpHeader>,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        jwt_algorithm: jwt_algorithm.into(),
        token_settings,
        login_rate_limit,
        ip_header,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

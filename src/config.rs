use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_RESEND_API_BASE: &str = "https://api.resend.com";
const DEFAULT_UPLOAD_DIR: &str = "public/uploads";
const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Application configuration, loaded from `config/{environment}.toml`
/// plus `APP__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (sqlite or postgres)
    pub database_url: String,

    /// JWT signing secret
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,

    /// Server bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment ("development", "test", "production")
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Public base URL of the storefront, used for Stripe redirect URLs
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Stripe secret key; checkout is refused when absent
    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret; webhooks are rejected when absent
    #[serde(default)]
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL (overridden in tests)
    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,

    /// Maximum accepted webhook timestamp skew
    #[serde(default = "default_webhook_tolerance_secs")]
    pub webhook_tolerance_secs: u64,

    /// Resend API key for the contact form; contact is refused when absent
    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default = "default_resend_api_base")]
    pub resend_api_base: String,

    /// Recipient of contact-form submissions
    #[serde(default = "default_contact_recipient")]
    pub contact_recipient: String,

    /// Directory admin image uploads are written to
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Comma-separated list of allowed CORS origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
}

fn default_jwt_expiration() -> u64 {
    3600
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_app_url() -> String {
    DEFAULT_APP_URL.to_string()
}
fn default_stripe_api_base() -> String {
    DEFAULT_STRIPE_API_BASE.to_string()
}
fn default_webhook_tolerance_secs() -> u64 {
    DEFAULT_WEBHOOK_TOLERANCE_SECS
}
fn default_resend_api_base() -> String {
    DEFAULT_RESEND_API_BASE.to_string()
}
fn default_contact_recipient() -> String {
    "kundenservice@ct-studio.store".to_string()
}
fn default_upload_dir() -> String {
    DEFAULT_UPLOAD_DIR.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}

impl AppConfig {
    /// Construct a config programmatically. Used by the test harness;
    /// production goes through [`load_config`].
    pub fn new(database_url: String, jwt_secret: String, environment: String) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration: default_jwt_expiration(),
            host: default_host(),
            port: default_port(),
            environment,
            log_level: default_log_level(),
            auto_migrate: false,
            app_url: default_app_url(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: default_stripe_api_base(),
            webhook_tolerance_secs: default_webhook_tolerance_secs(),
            resend_api_key: None,
            resend_api_base: default_resend_api_base(),
            contact_recipient: default_contact_recipient(),
            upload_dir: default_upload_dir(),
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }

    pub fn success_url(&self) -> String {
        format!(
            "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.app_url
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/checkout/cancel", self.app_url)
    }
}

/// Load configuration from the config directory and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std::env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .set_default("environment", environment.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?;

    let base = Path::new(CONFIG_DIR).join("default");
    let env_file = Path::new(CONFIG_DIR).join(&environment);
    builder = builder
        .add_source(File::from(base).required(false))
        .add_source(File::from(env_file).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    let config: AppConfig = builder.build()?.try_deserialize()?;

    config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

    info!(
        environment = %config.environment,
        port = config.port,
        "configuration loaded"
    );
    Ok(config)
}

/// Initialize the tracing subscriber. Safe to call once per process.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let _ = fmt().with_env_filter(filter).try_init();
}

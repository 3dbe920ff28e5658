use config::ConfigError;

#[derive(serde::Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub security: SecuritySettings,
}

#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "127.0.0.1".to_string(),
            database_name: "taskhive".to_string(),
        }
    }
}

/// Token signing settings.
///
/// Access and refresh tokens are signed with independent secrets so a leaked
/// access secret cannot mint refresh tokens. The 7-day access expiry mirrors
/// the system this replaces; deployments wanting shorter-lived access tokens
/// only need to change `access_token_expiry`.
#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
    /// Refresh token lifetime in seconds when the caller asked to stay
    /// logged in ("remember me").
    pub refresh_token_expiry: i64,
    /// Refresh token lifetime in seconds for ordinary logins.
    pub short_refresh_token_expiry: i64,
    pub issuer: String,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            access_secret: "taskhive-dev-access-secret-change-in-production".to_string(),
            refresh_secret: "taskhive-dev-refresh-secret-change-in-production".to_string(),
            access_token_expiry: 604_800,        // 7 days
            refresh_token_expiry: 2_592_000,     // 30 days
            short_refresh_token_expiry: 604_800, // 7 days
            issuer: "taskhive".to_string(),
        }
    }
}

/// Account protection settings.
#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct SecuritySettings {
    /// Bcrypt work factor.
    pub bcrypt_cost: u32,
    /// Failed logins before the account locks.
    pub max_login_attempts: i32,
    /// How long a locked account stays locked, in seconds.
    pub lockout_duration_secs: i64,
    /// Password-reset token lifetime in seconds.
    pub reset_token_expiry_secs: i64,
    /// Rate limiter window length in seconds.
    pub rate_limit_window_secs: u64,
    /// Requests allowed per client within one window.
    pub rate_limit_max_requests: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: 12,
            max_login_attempts: 5,
            lockout_duration_secs: 900, // 15 minutes
            reset_token_expiry_secs: 3600,
            rate_limit_window_secs: 60,
            rate_limit_max_requests: 100,
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()?;
    settings.try_deserialize::<Settings>()
}

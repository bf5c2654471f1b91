//! 設定の読み込み
//!
//! `config/default.toml` → `config/{RUN_MODE}.toml`（任意）→ 環境変数
//! （`LIBRARY_` 接頭辞、区切りは `__`）の順に重ねる。
//! `DATABASE_URL` と `JWT_SECRET` はそのままの名前でも上書きできる。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::application::ServiceSettings;
use crate::domain::loan::LoanPolicy;

/// 貸出期間の上限（365日）
const MAX_LOAN_PERIOD_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoansConfig {
    /// 承認から返却期限までの秒数
    pub loan_period_secs: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AccountsConfig {
    #[serde(default)]
    pub allowed_email_domains: Vec<String>,
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub loans: LoansConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// ファイルと環境変数から設定を読み込む
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("accounts.allowed_email_domains")
                    .with_list_parse_key("accounts.admin_emails")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        Self::from_config(config)
    }

    /// 読み込んだ設定を型に変換し、値の範囲を検証する
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let period = self.loans.loan_period_secs;
        if period <= 0 || period > MAX_LOAN_PERIOD_SECS {
            return Err(ConfigError::Message(format!(
                "loans.loan_period_secs must be between 1 and {} (got {})",
                MAX_LOAN_PERIOD_SECS, period
            )));
        }
        Ok(())
    }

    /// ユースケースに渡す設定値
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            loan_policy: LoanPolicy::new(chrono::Duration::seconds(self.loans.loan_period_secs)),
            allowed_email_domains: self.accounts.allowed_email_domains.clone(),
            admin_emails: self.accounts.admin_emails.clone(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            loan_period_secs: LoanPolicy::default().loan_period().num_seconds(),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "public/uploads".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "rusty_library_lending=debug,tower_http=debug".to_string(),
        }
    }
}

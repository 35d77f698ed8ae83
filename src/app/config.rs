// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::parse_block_tag;
use crate::domain::constants;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use alloy::rpc::types::eth::BlockId;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,

    // Ledger access
    pub http_provider: Option<String>,
    pub infura_project_id: Option<String>,
    #[serde(default = "default_block_tag")]
    pub block_tag: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_rpc_retry_attempts")]
    pub rpc_retry_attempts: usize,

    // Simulation inputs
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
    #[serde(default = "default_settlement_address")]
    pub settlement_address: Address,
    #[serde(default = "default_wrapped_native")]
    pub wrapped_native: Address,
    #[serde(default = "default_venue_router")]
    pub venue_router: Address,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_block_tag() -> String {
    constants::DEFAULT_BLOCK_TAG.to_string()
}
fn default_request_timeout_ms() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_rpc_retry_attempts() -> usize {
    1
}
fn default_artifacts_dir() -> String {
    "contracts/build".to_string()
}
fn default_settlement_address() -> Address {
    constants::GPV2_SETTLEMENT
}
fn default_wrapped_native() -> Address {
    constants::WETH_MAINNET
}
fn default_venue_router() -> Address {
    constants::UNISWAP_V2_ROUTER02
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(
            target: "config",
            block_tag = %settings.block_tag,
            artifacts_dir = %settings.artifacts_dir,
            settlement = %settings.settlement_address,
            "Settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        self.block_id()?;
        if let Some(raw) = self.configured_http_provider() {
            check_http_url(&raw)?;
        }
        if self.artifacts_dir.trim().is_empty() {
            return Err(AppError::Config("artifacts_dir is empty".to_string()));
        }
        Ok(())
    }

    fn configured_http_provider(&self) -> Option<String> {
        self.http_provider
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// JSON-RPC endpoint: explicit `http_provider`, else Infura mainnet when a
    /// project id is configured.
    pub fn http_provider_url(&self) -> Result<String, AppError> {
        if let Some(url) = self.configured_http_provider() {
            return Ok(url);
        }
        if let Some(project_id) = self
            .infura_project_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return Ok(format!("https://mainnet.infura.io/v3/{project_id}"));
        }
        Err(AppError::Config(
            "http_provider is missing (set HTTP_PROVIDER or INFURA_PROJECT_ID)".to_string(),
        ))
    }

    pub fn block_id(&self) -> Result<BlockId, AppError> {
        parse_block_tag(&self.block_tag).ok_or_else(|| {
            AppError::Config(format!("block_tag `{}` is not a block tag or number", self.block_tag))
        })
    }

    pub fn request_timeout_ms_value(&self) -> u64 {
        self.request_timeout_ms
            .max(constants::MIN_REQUEST_TIMEOUT_MS)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms_value())
    }

    pub fn rpc_retry_attempts_value(&self) -> usize {
        self.rpc_retry_attempts.max(1)
    }
}

fn check_http_url(raw: &str) -> Result<(), AppError> {
    let parsed = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("http_provider `{raw}` is not a URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::Config(format!(
            "http_provider must use http or https, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::types::eth::BlockNumberOrTag;
    use std::sync::{Mutex, OnceLock};

    fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn base_settings() -> GlobalSettings {
        GlobalSettings {
            debug: default_false(),
            log_json: default_false(),
            http_provider: None,
            infura_project_id: None,
            block_tag: default_block_tag(),
            request_timeout_ms: default_request_timeout_ms(),
            rpc_retry_attempts: default_rpc_retry_attempts(),
            artifacts_dir: default_artifacts_dir(),
            settlement_address: default_settlement_address(),
            wrapped_native: default_wrapped_native(),
            venue_router: default_venue_router(),
        }
    }

    fn temp_config(tag: &str, body: &str) -> std::path::PathBuf {
        let tmp = std::env::temp_dir().join(format!(
            "trade-sim-{tag}-{}-{}.toml",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::write(&tmp, body).expect("write temp config");
        tmp
    }

    #[test]
    fn timeout_and_retry_values_have_safe_floor() {
        let mut settings = base_settings();
        settings.request_timeout_ms = 5;
        settings.rpc_retry_attempts = 0;
        assert_eq!(settings.request_timeout_ms_value(), 100);
        assert_eq!(settings.request_timeout(), Duration::from_millis(100));
        assert_eq!(settings.rpc_retry_attempts_value(), 1);

        settings.request_timeout_ms = 45_000;
        assert_eq!(settings.request_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn http_provider_prefers_explicit_url_over_infura() {
        let mut settings = base_settings();
        assert!(matches!(settings.http_provider_url(), Err(AppError::Config(_))));

        settings.infura_project_id = Some(" abc123 ".to_string());
        assert_eq!(
            settings.http_provider_url().expect("infura"),
            "https://mainnet.infura.io/v3/abc123"
        );

        settings.http_provider = Some("http://127.0.0.1:8545".to_string());
        assert_eq!(
            settings.http_provider_url().expect("explicit"),
            "http://127.0.0.1:8545"
        );
    }

    #[test]
    fn block_tag_accepts_names_and_numbers() {
        let mut settings = base_settings();
        assert_eq!(
            settings.block_id().expect("latest"),
            BlockId::Number(BlockNumberOrTag::Latest)
        );
        settings.block_tag = "19000000".to_string();
        assert_eq!(
            settings.block_id().expect("number"),
            BlockId::Number(BlockNumberOrTag::Number(19_000_000))
        );
        settings.block_tag = "yesterday".to_string();
        assert!(matches!(settings.block_id(), Err(AppError::Config(msg)) if msg.contains("block_tag")));
    }

    #[test]
    fn validation_rejects_non_http_provider() {
        let mut settings = base_settings();
        settings.http_provider = Some("ws://localhost:8546".to_string());
        assert!(matches!(settings.validate(), Err(AppError::Config(msg)) if msg.contains("http")));
        settings.http_provider = Some("https://rpc.example.org".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn file_values_fill_defaults() {
        let _env_lock = env_lock_guard();
        let tmp = temp_config(
            "file",
            r#"
block_tag = "finalized"
artifacts_dir = "/opt/artifacts"
venue_router = "0x0000000000000000000000000000000000000042"
"#,
        );
        let loaded = GlobalSettings::load_with_path(Some(tmp.to_str().expect("utf8 path")))
            .expect("load settings");
        assert_eq!(loaded.block_tag, "finalized");
        assert_eq!(loaded.artifacts_dir, "/opt/artifacts");
        assert_eq!(loaded.venue_router, Address::with_last_byte(0x42));
        assert_eq!(loaded.settlement_address, constants::GPV2_SETTLEMENT);
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn env_overrides_selected_file_values() {
        let _env_lock = env_lock_guard();
        let tmp = temp_config("env", "request_timeout_ms = 1000\n");
        let old = std::env::var("REQUEST_TIMEOUT_MS").ok();
        unsafe {
            std::env::set_var("REQUEST_TIMEOUT_MS", "2500");
        }

        let loaded = GlobalSettings::load_with_path(Some(tmp.to_str().expect("utf8 path")))
            .expect("load settings");
        assert_eq!(loaded.request_timeout_ms, 2500);

        std::fs::remove_file(&tmp).ok();
        if let Some(v) = old {
            unsafe { std::env::set_var("REQUEST_TIMEOUT_MS", v) };
        } else {
            unsafe { std::env::remove_var("REQUEST_TIMEOUT_MS") };
        }
    }
}

use crate::error::{ReportError, Result};
use banquet_reports_common::format::{is_valid_date_format, DEFAULT_DATE_FORMAT};
use banquet_reports_common::report::DEFAULT_LOW_STOCK_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_API_TOKEN: &str = "BANQUET_API_TOKEN";
pub const ENV_API_URL: &str = "BANQUET_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_seconds: u64,
    pub low_stock_threshold: u64,
    pub date_format: String,
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default_config())
        }
    }

    /// 設定JSONを読み、使えない日付書式は既定に戻す
    pub fn from_json(content: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(content)?;
        if !is_valid_date_format(&config.date_format) {
            log::warn!(
                "設定の日付書式 {:?} は使えません。{} を使います",
                config.date_format,
                DEFAULT_DATE_FORMAT
            );
            config.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReportError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("banquet-reports").join("config.json"))
    }

    pub fn default_config() -> Self {
        Self {
            base_url: None,
            api_token: None,
            timeout_seconds: 30,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            output_dir: None,
        }
    }

    /// APIのベースURL（環境変数を優先）
    pub fn get_base_url(&self) -> Result<String> {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                return Ok(url.trim_end_matches('/').to_string());
            }
        }

        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ReportError::MissingBaseUrl)
    }

    /// Bearerトークン（環境変数を優先、無ければ未認証で呼ぶ）
    pub fn get_api_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            if !token.trim().is_empty() {
                return Some(token);
            }
        }
        self.api_token.clone()
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        self.base_url = Some(url);
        self.save()
    }

    pub fn set_api_token(&mut self, token: String) -> Result<()> {
        self.api_token = Some(token);
        self.save()
    }

    /// 出力先（未設定ならカレント）
    pub fn output_dir_or_current(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

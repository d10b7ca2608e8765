//! エラー型定義

use thiserror::Error;

/// 共通エラー型（上流JSONの読み込み）
#[derive(Error, Debug)]
pub enum Error {
    #[error("{what}: JSONの解析に失敗: {source}")]
    Payload {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn payload(what: &str, source: serde_json::Error) -> Self {
        Error::Payload {
            what: what.to_string(),
            source,
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

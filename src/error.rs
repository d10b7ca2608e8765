use thiserror::Error;

/// データ取得エラー（画面には通知として出し、処理は継続する）
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("APIがステータス{status}を返しました: {url}")]
    Status { status: u16, url: String },

    #[error("レスポンスの解析に失敗: {0}")]
    Payload(#[from] banquet_reports_common::Error),

    /// 問い合わせと違う種類のデータが返された
    #[error("レスポンスが不正です: {0}")]
    Decode(String),

    #[error("スナップショット読み込みエラー: {0}")]
    Snapshot(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIのURLが設定されていません。`banquet-reports config --set-base-url URL` で設定してください")]
    MissingBaseUrl,

    #[error("データ取得エラー: {0}")]
    Fetch(#[from] FetchError),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("レコードが選択されていません: {0}")]
    NoSelection(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

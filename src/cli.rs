use banquet_reports_common::report::ReportKind;
use banquet_reports_common::types::Granularity;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "banquet-reports")]
#[command(about = "宴会管理データの帳票（PDF/Excel）出力ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 帳票をPDF/Excelで出力
    Export {
        /// 帳票の種類 (events/event/tastings/tasting/inventory/warehouse/maintenance/analysis)
        #[arg(required = true)]
        kind: ReportKind,

        /// 出力形式 (pdf/excel/both)
        #[arg(short, long, default_value = "both")]
        format: ExportFormat,

        /// 出力ディレクトリ（省略時は設定値かカレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// イベント種別ID
        #[arg(short = 't', long)]
        event_type: Option<String>,

        /// 試食会の対象年
        #[arg(long)]
        year: Option<i32>,

        /// 試食会の対象月 (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// 期間分析の粒度 (monthly/quarterly/yearly)
        #[arg(short, long, default_value = "monthly")]
        period: Granularity,

        /// 詳細帳票の対象レコードID
        #[arg(short, long, conflicts_with = "pick")]
        record: Option<String>,

        /// 詳細帳票の対象を対話的に選ぶ
        #[arg(long)]
        pick: bool,

        /// 保存済みJSONのディレクトリから読む（API不要）
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// 読み込んだデータを一覧表示
    List {
        /// 帳票の種類
        #[arg(required = true)]
        kind: ReportKind,

        /// イベント種別ID
        #[arg(short = 't', long)]
        event_type: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        #[arg(short, long, default_value = "monthly")]
        period: Granularity,

        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// イベント種別を一覧表示
    Types {
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// APIトークンを設定
        #[arg(long)]
        set_token: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ExportFormat {
    Pdf,
    Excel,
    #[default]
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use pdf, excel, or both", s)),
        }
    }
}

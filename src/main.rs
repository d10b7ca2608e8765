use banquet_reports::{cli, config, controller, error, fetcher};
use banquet_reports_common::format::format_percentage;
use banquet_reports_common::report::{ReportContext, ReportDataset, ReportKind};
use banquet_reports_common::types::{Granularity, RecordId};
use clap::Parser;
use cli::{Cli, Commands, ExportFormat};
use config::Config;
use controller::{LoadResolution, ReportController};
use dialoguer::Select;
use error::{ReportError, Result};
use fetcher::{DatasetFetcher, HttpFetcher, SnapshotFetcher};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// 取得条件（export/list 共通）
struct LoadArgs {
    kind: ReportKind,
    event_type: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
    period: Granularity,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let config = Config::load()?;

    match cli.command {
        Commands::Export { kind, format, output, event_type, year, month, period, record, pick, snapshot } => {
            println!("📄 banquet-reports - エクスポート\n");

            let args = LoadArgs { kind, event_type, year, month, period };
            let output_dir = output.unwrap_or_else(|| config.output_dir_or_current());
            let ctx = report_context(&config);

            match snapshot {
                Some(dir) => {
                    let fetcher = SnapshotFetcher::new(dir, config.low_stock_threshold);
                    run_export(ReportController::new(fetcher, ctx), &args, &format, output_dir, record, pick).await?;
                }
                None => {
                    let fetcher = http_fetcher(&config)?;
                    run_export(ReportController::new(fetcher, ctx), &args, &format, output_dir, record, pick).await?;
                }
            }
        }

        Commands::List { kind, event_type, year, month, period, snapshot } => {
            let args = LoadArgs { kind, event_type, year, month, period };
            let ctx = report_context(&config);

            match snapshot {
                Some(dir) => {
                    let fetcher = SnapshotFetcher::new(dir, config.low_stock_threshold);
                    run_list(ReportController::new(fetcher, ctx), &args).await?;
                }
                None => {
                    let fetcher = http_fetcher(&config)?;
                    run_list(ReportController::new(fetcher, ctx), &args).await?;
                }
            }
        }

        Commands::Types { snapshot } => {
            let types = match snapshot {
                Some(dir) => SnapshotFetcher::new(dir, config.low_stock_threshold).event_types().await?,
                None => http_fetcher(&config)?.event_types().await?,
            };
            if types.is_empty() {
                println!("イベント種別がありません");
            }
            for t in &types {
                println!("{:>6}  {}", t.id, t.nombre);
            }
        }

        Commands::Config { set_base_url, set_token, show } => {
            let mut config = config;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ APIのURLを設定しました");
            }

            if let Some(token) = set_token {
                config.set_api_token(token)?;
                println!("✔ APIトークンを設定しました");
            }

            if show {
                println!("設定:");
                println!("  URL: {}", config.base_url.as_deref().unwrap_or("未設定"));
                println!("  APIトークン: {}", if config.get_api_token().is_some() { "設定済み" } else { "未設定" });
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  低在庫の閾値: {}", config.low_stock_threshold);
                println!("  日付書式: {}", config.date_format);
                println!("  出力先: {}", config.output_dir_or_current().display());
            }
        }
    }

    Ok(())
}

fn report_context(config: &Config) -> ReportContext {
    ReportContext::new(chrono::Local::now().date_naive()).with_date_format(config.date_format.clone())
}

fn http_fetcher(config: &Config) -> Result<HttpFetcher> {
    let base_url = config.get_base_url()?;
    let fetcher = HttpFetcher::new(
        base_url,
        config.get_api_token(),
        config.timeout_seconds,
        config.low_stock_threshold,
    )?;
    Ok(fetcher)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// 条件を設定してタブを読み込む。取得失敗なら false
async fn load_tab<F: DatasetFetcher>(controller: &mut ReportController<F>, args: &LoadArgs) -> bool {
    let tab = args.kind.tab();

    if let Some(id) = &args.event_type {
        controller.set_event_type(Some(RecordId::from(id.as_str())));
        if let Err(e) = controller.load_event_types().await {
            log::warn!("イベント種別の取得に失敗: {}", e);
        }
    }
    if args.year.is_some() || args.month.is_some() {
        let (default_year, default_month) = controller.tasting_period();
        controller.set_tasting_period(args.year.unwrap_or(default_year), args.month.unwrap_or(default_month));
    }
    controller.set_granularity(args.period);

    let pb = spinner(format!("{} を読み込み中...", tab));
    let resolution = controller.select_tab(tab).await;
    pb.finish_and_clear();

    match resolution {
        Some(LoadResolution::Failed(notice)) => {
            eprintln!("❌ {}", notice);
            false
        }
        None if tab == banquet_reports_common::report::ReportTab::Events && args.event_type.is_none() => {
            println!("※ イベント種別が指定されていません（--event-type）");
            true
        }
        _ => {
            if let Some(ds) = controller.dataset(tab) {
                println!("✔ {}件を読み込み\n", ds.len());
            }
            true
        }
    }
}

async fn run_export<F: DatasetFetcher>(
    mut controller: ReportController<F>,
    args: &LoadArgs,
    format: &ExportFormat,
    output_dir: PathBuf,
    record: Option<String>,
    pick: bool,
) -> Result<()> {
    if !load_tab(&mut controller, args).await {
        return Ok(());
    }

    let tab = args.kind.tab();
    if args.kind.is_detail() {
        let id = match record {
            Some(id) => Some(RecordId::from(id.as_str())),
            None if pick => pick_record(controller.dataset(tab))?,
            None => None,
        };
        match id {
            Some(id) => controller.select_record(tab, id)?,
            None => println!("※ 対象レコードが選択されていません（--record または --pick）"),
        }
    }

    match controller.export(args.kind, format, &output_dir).await {
        Ok(Some(outcome)) => {
            for key in &outcome.degraded_charts {
                println!("⚠ チャートを省略しました: {}", key);
            }
            for file in &outcome.files {
                println!("✔ {}", file.display());
            }
            println!("\n✅ エクスポート完了");
        }
        Ok(None) => println!("出力するデータがありません"),
        Err(notice) => {
            eprintln!("❌ {}", notice);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn run_list<F: DatasetFetcher>(mut controller: ReportController<F>, args: &LoadArgs) -> Result<()> {
    if !load_tab(&mut controller, args).await {
        return Ok(());
    }
    if let Some(ds) = controller.dataset(args.kind.tab()) {
        for line in dataset_lines(ds) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// 詳細帳票の対象を対話的に選ぶ
fn pick_record(dataset: Option<&ReportDataset>) -> Result<Option<RecordId>> {
    let records: Vec<(RecordId, String)> = match dataset {
        Some(ReportDataset::Events(events)) => events
            .iter()
            .map(|e| (e.id.clone(), format!("{} ({})", e.nombre, e.fecha_inicio)))
            .collect(),
        Some(ReportDataset::Tastings(tastings)) => tastings
            .iter()
            .map(|t| (t.id.clone(), format!("{} ({})", t.nombre, t.fecha_degustacion)))
            .collect(),
        _ => Vec::new(),
    };
    if records.is_empty() {
        return Ok(None);
    }

    let labels: Vec<&str> = records.iter().map(|(_, label)| label.as_str()).collect();
    let index = Select::new()
        .with_prompt("対象を選択")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| ReportError::NoSelection(e.to_string()))?;
    Ok(records.get(index).map(|(id, _)| id.clone()))
}

fn dataset_lines(dataset: &ReportDataset) -> Vec<String> {
    match dataset {
        ReportDataset::Events(events) => events
            .iter()
            .map(|e| format!("{:>6}  {}  {}  {}", e.id, e.fecha_inicio, e.nombre, e.estado))
            .collect(),
        ReportDataset::Tastings(tastings) => tastings
            .iter()
            .map(|t| format!("{:>6}  {}  {}  {}", t.id, t.fecha_degustacion, t.nombre, t.estado))
            .collect(),
        ReportDataset::Inventory(items) => items
            .iter()
            .map(|i| format!("{:>6}  {}  {}  {}", i.id, i.categoria, i.nombre, i.cantidad_actual))
            .collect(),
        ReportDataset::Warehouse(report) => report
            .warehouses
            .iter()
            .map(|w| {
                format!(
                    "{:>6}  {}  {}  {}",
                    w.id,
                    w.nombre,
                    w.total_items,
                    format_percentage(w.percentage)
                )
            })
            .collect(),
        ReportDataset::Maintenance(entries) => entries
            .iter()
            .map(|m| format!("{:>6}  {}  {}  {}", m.id, m.nombre, m.cantidad_en_mantenimiento, m.estado))
            .collect(),
        ReportDataset::Analysis(analysis) => analysis
            .periods
            .iter()
            .map(|p| format!("{}  {}  {}", p.period, p.count, format_percentage(p.percentage)))
            .collect(),
    }
}

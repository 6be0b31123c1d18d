//! Jira の検索結果を CSV に書き出す
//!
//! 接続設定は環境変数（または `.env`）から読み込む：
//! `JIRA_BASE_URL`, `JIRA_EMAIL`, `JIRA_API_TOKEN`, 任意で `JQL`,
//! `DEFAULT_BOUND`, `FIELDS`, `EXPAND`。

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use jira_csv::{ExportConfig, JiraClient, IssueExporter};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "export-issues", about = "Export Jira search results as CSV")]
struct Cli {
    /// 出力先ファイル（省略時は標準出力）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 環境変数 JQL を上書きする
    #[arg(long)]
    jql: Option<String>,

    /// ログの詳細度（-v, -vv）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    // 標準出力は CSV 用なのでログは標準エラーへ
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> jira_csv::Result<()> {
    let mut config = ExportConfig::from_env()?;
    if let Some(jql) = cli.jql {
        config = config.jql(jql);
    }
    config.validate()?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let client = JiraClient::new(config.jira_config()?)?;
    let report = IssueExporter::new(&client)
        .with_progress(Box::new(|count: usize| eprint!("Fetched {} issues\r", count)))
        .export_with_report(&config, &cancel)
        .await?;
    eprintln!();

    match cli.output {
        Some(path) => {
            tokio::fs::write(&path, report.csv.as_bytes()).await?;
            info!(path = %path.display(), rows = report.row_count, "CSV written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(report.csv.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

use std::io;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use swo_logs::cli::{Cli, Command, LogsCommand};
use swo_logs::client::HttpLogService;
use swo_logs::config::{Config, Overrides};
use swo_logs::error::Result;
use swo_logs::query::QueryBuilder;
use swo_logs::render::render_filter;
use swo_logs::search::ResultStreamer;
use swo_logs::timeparse::TimeResolver;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 日志输出到 stderr，stdout 只保留检索结果
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Command::Logs(LogsCommand::Get(get)) = cli.command;
    let config = Config::load(&cli.config, Overrides::from_env(cli.api_url))?;

    let resolver = TimeResolver::new(Local::now());
    let plan = QueryBuilder::new().build(&get.into(), &resolver)?;
    tracing::debug!(?plan, "search plan");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_filter(&mut out, plan.request.filter.as_deref())?;

    let service = HttpLogService::new(&config)?;
    ResultStreamer::new(service).run(&plan, &mut out).await?;
    Ok(())
}

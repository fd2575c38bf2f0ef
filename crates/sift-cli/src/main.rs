mod logging;
mod replay;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use replay::ReplayAnalyzer;
use serde_json::json;
use sift_core::{
    FileLister, InMemoryIssueSink, InMemoryTaskStore, JobStatus, LocalFetcher, LocalFileLister,
    ScanConfig, ScanOrchestrator,
};
use sift_recovery::RecoveryParser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

fn cli() -> Command {
    Command::new("sift")
        .version(sift_core::VERSION)
        .about("Recover structured findings from analyzer responses and replay scans")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("parse")
                .about("Run the recovery parser on a saved raw response")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the raw analyzer response"),
                )
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .action(ArgAction::SetTrue)
                        .help("Pretty-print the JSON result"),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("Scan a local directory, replaying recorded analyzer responses")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory to scan"),
                )
                .arg(
                    Arg::new("responses")
                        .long("responses")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of recorded responses (<relative path>.txt)"),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .value_parser(value_parser!(usize))
                        .help("Files analyzed at once"),
                )
                .arg(
                    Arg::new("delay-ms")
                        .long("delay-ms")
                        .value_parser(value_parser!(u64))
                        .help("Pause after each file, per worker"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML scan configuration; flags override it"),
                )
                .arg(
                    Arg::new("ext")
                        .long("ext")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .help("Only scan files with these extensions"),
                ),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init("info", matches.get_flag("log-json"));

    let result = match matches.subcommand() {
        Some(("parse", args)) => parse(args).await,
        Some(("scan", args)) => scan(args).await,
        _ => Ok(ExitCode::SUCCESS),
    };

    result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::from(2)
    })
}

async fn parse(args: &ArgMatches) -> Result<ExitCode> {
    let path = args.get_one::<PathBuf>("file").context("missing response file")?;
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    match RecoveryParser::new().recover(&raw) {
        Ok(recovered) => {
            let out = json!({ "strategy": recovered.strategy, "result": recovered.result });
            let text = if args.get_flag("pretty") {
                serde_json::to_string_pretty(&out)?
            } else {
                serde_json::to_string(&out)?
            };
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            eprintln!("{failure}");
            eprintln!("  strategies tried: {}", failure.strategies_tried.join(", "));
            eprintln!("  first/last char: {:?} / {:?}", failure.first_char, failure.last_char);
            eprintln!("  head: {:?}", failure.head);
            eprintln!("  tail: {:?}", failure.tail);
            Ok(ExitCode::from(1))
        }
    }
}

fn scan_config(args: &ArgMatches) -> Result<ScanConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => ScanConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(&concurrency) = args.get_one::<usize>("concurrency") {
        config = config.with_concurrency(concurrency);
    }
    if let Some(&delay) = args.get_one::<u64>("delay-ms") {
        config = config.with_inter_file_delay_ms(delay);
    }
    config.validate()?;
    Ok(config)
}

async fn scan(args: &ArgMatches) -> Result<ExitCode> {
    let config = scan_config(args)?;
    let dir = args.get_one::<PathBuf>("dir").context("missing --dir")?;
    let responses = args.get_one::<PathBuf>("responses").context("missing --responses")?;

    let mut lister = LocalFileLister::new(dir);
    if let Some(exts) = args.get_many::<String>("ext") {
        lister = lister.with_extensions(exts.cloned());
    }
    let files = lister
        .list()
        .await
        .with_context(|| format!("listing {}", dir.display()))?;

    let analyzer = ReplayAnalyzer::load(responses, &files).await;
    info!(files = files.len(), recorded = analyzer.len(), "replaying scan");

    let store = Arc::new(InMemoryTaskStore::new());
    let sink = Arc::new(InMemoryIssueSink::new());
    let orchestrator = ScanOrchestrator::new(Arc::new(analyzer), Arc::new(LocalFetcher), store, sink.clone())
        .with_config(config);

    let handle = orchestrator.start(files).await?;
    let job_id = handle.job_id();
    let canceller = orchestrator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel(job_id).await;
        }
    });

    let outcome = handle.wait().await?;

    let failures: Vec<_> = outcome
        .failures
        .iter()
        .map(|f| json!({ "path": f.path, "kind": f.failure.kind(), "error": f.failure.to_string() }))
        .collect();
    let issues: Vec<_> = sink
        .issues_for(job_id)
        .into_iter()
        .map(|r| json!({ "path": r.path, "issue": r.issue }))
        .collect();
    let report = json!({ "job": outcome.job, "failures": failures, "issues": issues });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(match outcome.status() {
        JobStatus::Failed => ExitCode::from(1),
        JobStatus::Cancelled => ExitCode::from(130),
        _ => ExitCode::SUCCESS,
    })
}

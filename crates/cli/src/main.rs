use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tothezip_core::config::Settings;
use tothezip_core::domain::contract::RankExplainRequest;
use tothezip_core::llm::gms::GmsExplainer;
use tothezip_core::llm::{DisabledExplainer, Explainer};
use tothezip_core::service::RankExplainService;

#[derive(Debug, Parser)]
#[command(name = "tothezip_cli")]
struct Args {
    /// Rank-explain request JSON. Use `-` to read from stdin.
    #[arg(long, default_value = "-")]
    input: PathBuf,

    /// Rank only; explanations use fallback text and the explainer is never called.
    #[arg(long)]
    no_explainer: bool,

    /// Pretty-print the response.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    // stdout carries the response; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, &args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "rank-explain run failed");
    }
    result
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    let raw = read_input(&args.input).await?;
    let req = parse_request(&raw)?;

    let explainer: Arc<dyn Explainer> = if args.no_explainer {
        Arc::new(DisabledExplainer::new("explainer disabled by --no-explainer"))
    } else if settings.gms_key.is_some() {
        Arc::new(GmsExplainer::from_settings(settings)?)
    } else {
        Arc::new(DisabledExplainer::new("GMS_KEY not set"))
    };

    let service = RankExplainService::new(explainer, settings.explainer_timeout());
    let response = service.rank_explain(&req).await;

    tracing::info!(
        provider = service.provider(),
        candidates_len = req.candidates.len(),
        results_len = response.results.len(),
        model = response.model.as_deref().unwrap_or("-"),
        "rank-explain finished"
    );

    let out = if args.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .context("failed to serialize response")?;
    println!("{out}");

    Ok(())
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read request from stdin")?;
        return Ok(buf);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read request file {}", path.display()))
}

fn parse_request(raw: &str) -> anyhow::Result<RankExplainRequest> {
    let req = serde_json::from_str::<RankExplainRequest>(raw)
        .context("request is not a valid rank-explain request")?;
    req.validate()?;
    Ok(req)
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

//! Git blame line annotator
//!
//! Annotates source lines with git blame metadata (author, commit summary,
//! relative time) and, when configured, the Azure DevOps work item
//! referenced by the commit summary.
//!
//! # Usage
//! ```bash
//! blame-annotator /path/to/repository         # Serve the annotation API
//! blame-annotator annotate src/main.rs 42     # Print one annotation
//! ```

mod annotate;
mod config;
mod error;
mod git;
mod models;
mod routes;
mod tracker;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Args, Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use annotate::BlamePipeline;
use config::Settings;
use error::AppError;
use git::{BlameStore, GitBlameProcess, find_repository_root};
use tracker::{AdoClient, IdentifierExtractor};
use view::{ConsoleView, SequencedView};

/// Git blame line annotator - blame plus work item context for any line
#[derive(Parser)]
#[command(name = "blame-annotator")]
#[command(about = "Annotate source lines with git blame and work item context", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path inside the repository to serve (defaults to the current directory)
    #[arg(value_name = "REPO_PATH")]
    repo_path: Option<String>,

    /// Port to run the server on
    #[arg(short, long, default_value = "3002")]
    port: u16,

    #[command(flatten)]
    tracker: TrackerArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print the annotation for one line
    Annotate {
        /// File path, absolute or relative to the current directory
        file: String,
        /// 1-based line number
        line: u32,
    },
}

#[derive(Args)]
struct TrackerArgs {
    /// Azure DevOps organization URL, e.g. https://dev.azure.com/my-org
    #[arg(long, global = true)]
    organization_url: Option<String>,

    /// Personal access token for the work item API
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Regex matching work item references in commit summaries
    #[arg(long, global = true)]
    identifier_pattern: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (quieter for production)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::resolve(
        cli.tracker.organization_url,
        cli.tracker.access_token,
        cli.tracker.identifier_pattern,
    );

    match cli.command {
        Some(Commands::Annotate { file, line }) => annotate_once(&settings, &file, line).await,
        None => serve(&settings, cli.repo_path, cli.port).await,
    }
}

/// Resolve one annotation and print it, the explicit user-triggered path.
async fn annotate_once(settings: &Settings, file: &str, line: u32) -> anyhow::Result<()> {
    let absolute =
        std::fs::canonicalize(file).with_context(|| format!("cannot resolve {}", file))?;
    let root = find_repository_root(&absolute)
        .ok_or_else(|| AppError::RepoNotFound(absolute.display().to_string()))?;
    let relative = absolute
        .strip_prefix(&root)
        .context("file is outside the repository")?
        .to_string_lossy()
        .to_string();

    let pipeline = build_pipeline(settings, root)?;
    let view = SequencedView::new(ConsoleView);

    let request = view.begin();
    view.set_loading(true);
    let annotation = pipeline.resolve(&relative, line).await;
    view.set_loading(false);

    if annotation.is_cleared() {
        eprintln!("no attribution for {}:{}", relative, line);
    } else {
        view.complete(request, &annotation.text);
    }

    Ok(())
}

async fn serve(settings: &Settings, repo_path: Option<String>, port: u16) -> anyhow::Result<()> {
    let start = repo_path.unwrap_or_else(|| ".".to_string());
    let start =
        std::fs::canonicalize(&start).with_context(|| format!("cannot resolve {}", start))?;
    let root = find_repository_root(&start)
        .ok_or_else(|| AppError::RepoNotFound(start.display().to_string()))?;

    let state = routes::AppState {
        pipeline: Arc::new(build_pipeline(settings, root.clone())?),
        repo_root: root.clone(),
        enrichment_configured: settings.enrichment_configured(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    println!();
    println!("  Repository: {}", root.display());
    println!("  Server:     http://{}", addr);
    if settings.enrichment_configured() {
        println!("  Work items: enabled");
    }
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

fn build_pipeline(settings: &Settings, root: PathBuf) -> anyhow::Result<BlamePipeline<AdoClient>> {
    let source = Arc::new(GitBlameProcess::new(root));
    let store = Arc::new(BlameStore::new(source));
    let extractor = IdentifierExtractor::new(settings.identifier_regex()?);
    let lookup = AdoClient::new(settings);
    Ok(BlamePipeline::new(store, extractor, lookup))
}

//! Accessibility Audit Server
//!
//! Accepts PDF uploads, audits them for accessibility problems and serves
//! the resulting reports. Provides endpoints for:
//!
//! - Upload and audit (`POST /upload`), writing a text and an HTML report
//! - Report download (`GET /download/:filename`)
//! - JSON audit (`POST /api/audit`) returning structured findings
//!
//! ## Architecture
//!
//! Audits are CPU-bound and run on tokio's blocking pool under a timeout.
//! The grammar check calls a LanguageTool service from inside that task;
//! its failures become report findings rather than request errors.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use accessibility_engine::{AccessibilityEngine, AuditConfig, DisabledGrammar, GrammarChecker};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod grammar;
mod storage;

use api::{handle_audit, handle_download, handle_health, handle_upload};
use grammar::{LanguageToolClient, DEFAULT_LANGUAGETOOL_URL};
use storage::ReportStore;

/// Largest accepted request body
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Command-line arguments for the accessibility server
#[derive(Parser, Debug)]
#[command(name = "accessibility-server")]
#[command(about = "PDF accessibility audit server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Directory for uploaded PDFs
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory for generated reports
    #[arg(long, default_value = "reports")]
    report_dir: PathBuf,

    /// Audit configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LanguageTool check endpoint
    #[arg(long, default_value = DEFAULT_LANGUAGETOOL_URL)]
    grammar_url: String,

    /// Grammar request timeout in milliseconds
    #[arg(long, default_value = "10000")]
    grammar_timeout_ms: u64,

    /// Skip the grammar check entirely
    #[arg(long)]
    no_grammar: bool,

    /// Audit timeout in milliseconds
    #[arg(long, default_value = "120000")]
    audit_timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AccessibilityEngine>,
    pub grammar: Arc<dyn GrammarChecker>,
    pub store: ReportStore,
    /// Audit timeout in milliseconds
    pub audit_timeout_ms: u64,
}

/// Routes and middleware shared by the binary and the tests
pub fn build_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // Upload flow
        .route("/upload", post(handle_upload))
        .route("/download/:filename", get(handle_download))
        // JSON API
        .route("/api/audit", post(handle_audit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting accessibility server on {}:{}", args.host, args.port);

    let config = match &args.config {
        Some(path) => AuditConfig::from_file(path)?,
        None => AuditConfig::default(),
    };

    let grammar: Arc<dyn GrammarChecker> = if args.no_grammar {
        info!("Grammar check disabled");
        Arc::new(DisabledGrammar)
    } else {
        Arc::new(LanguageToolClient::new(
            args.grammar_url.clone(),
            args.grammar_timeout_ms,
        ))
    };

    let store = ReportStore::open(&args.upload_dir, &args.report_dir)?;
    info!("Reports written to {}", store.report_dir().display());

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .expect("Failed to create rate limiter config"),
    );

    // Create shared state
    let state = AppState {
        engine: Arc::new(AccessibilityEngine::with_config(config)),
        grammar,
        store,
        audit_timeout_ms: args.audit_timeout_ms,
    };

    let app = build_router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Audit timeout: {}ms", args.audit_timeout_ms);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

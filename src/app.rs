/*
 * Responsibility
 * - Config読み込み → tracing / panic hook 初期化 → 依存生成 → Router 組み立て
 * - Middleware の適用 (HTTP layers / CORS / security headers)
 * - axum::serve() で起動 (Ctrl+C で graceful shutdown)
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::auth_request_repo::SupabaseAuthRequestRepo,
    services::{
        auth::build_auth_service,
        auth_requests::AuthRequestService,
        extraction::{ExtractionService, ImageFileHandler, PassthroughMapper, VisionProcessor},
        supabase::SupabaseClient,
    },
    state::AppState,
};

fn init_tracing(log_level: &str) {
    // RUST_LOG が優先。無ければ LOG_LEVEL (default: info)
    // ex: RUST_LOG=info,prior_auth_copilot=debug,tower_http=debug cargo run
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast. production: default hook, server keeps running
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "loaded configuration");
    if config.openai.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; form extraction calls will be rejected upstream");
    }

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    // process 単位のサービスをここで生成し AppState に注入する
    let supabase = SupabaseClient::new(&config.supabase, config.upstream_timeout)
        .context("failed to build database client")?;

    let auth = build_auth_service(config, supabase.clone());

    let repo = Arc::new(SupabaseAuthRequestRepo::new(supabase));
    let auth_requests = Arc::new(AuthRequestService::new(repo, auth.service_user_id()));

    let processor = VisionProcessor::new(config.openai.clone(), config.upstream_timeout)
        .context("failed to build model client")?;
    let extraction = Arc::new(ExtractionService::new(
        Arc::new(ImageFileHandler::new(config.upload.clone())),
        Arc::new(processor),
        Arc::new(PassthroughMapper),
    ));

    Ok(AppState::new(auth, auth_requests, extraction))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::v1::routes(state.clone()).with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        // without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

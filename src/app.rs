/*
 * Responsibility
 * - tracing + panic hook
 * - load Config -> build collaborators -> initialize the form -> Router
 * - axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{Config, IdentitySource};
use crate::form::{Collaborators, EmployeeForm};
use crate::middleware;
use crate::services::employee_api::HttpEmployeeApi;
use crate::services::identity::{FileIdentity, IdentityProvider, StaticIdentity};
use crate::services::notify::RecordingNotifier;
use crate::services::region_api::HttpRegionApi;
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins; e.g. RUST_LOG=info,employee_me=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash loudly
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting employee-me in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let employees = HttpEmployeeApi::new(
        config.employee_api_root.as_str(),
        config.employee_api_token.clone(),
        config.http_timeout,
    )?;
    let regions = HttpRegionApi::new(config.region_api_root.as_str(), config.http_timeout)?;

    let identity: Arc<dyn IdentityProvider> = match &config.identity {
        IdentitySource::File(path) => Arc::new(FileIdentity::new(path)),
        IdentitySource::Fixed(id) => Arc::new(StaticIdentity::new(id.clone())),
    };

    let notices = Arc::new(RecordingNotifier::new(config.notification_capacity));

    let deps = Collaborators {
        employees: Arc::new(employees),
        regions: Arc::new(regions),
        identity,
        notifier: notices.clone(),
    };

    // Failures are notified, never fatal: the form starts with whatever loaded.
    let mut form = EmployeeForm::new(deps);
    form.initialize().await;

    Ok(AppState::new(form, notices))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    middleware::http::apply(router, config.http_timeout)
}

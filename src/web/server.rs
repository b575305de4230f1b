use crate::auth::raw_body::capture_raw_body;
use crate::config::Config;
use crate::database::Store;
use crate::maintenance::Scheduler;
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(config: Config, store: Store, scheduler: Arc<Scheduler>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let max_payload_bytes = config.max_payload_bytes;

    let state = Arc::new(AppState {
        config,
        store: Arc::new(store),
        scheduler,
    });

    let app = create_router(state.clone(), max_payload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    state.store.close().await;
    Ok(())
}

fn create_router(state: Arc<AppState>, max_payload_bytes: usize) -> Router {
    let api_routes = Router::new()
        .route("/log", post(handlers::log::post_log).get(handlers::log::get_log))
        .layer(middleware::from_fn(capture_raw_body))
        .layer(RequestBodyLimitLayer::new(max_payload_bytes));

    let admin_routes = Router::new()
        .route("/projects", post(handlers::admin::create_project).get(handlers::admin::list_projects))
        .route("/projects/{slug}", axum::routing::delete(handlers::admin::delete_project));

    Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .nest("/api", api_routes)
        .nest("/admin", admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining in-flight requests");
}

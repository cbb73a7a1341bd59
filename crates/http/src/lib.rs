//! HTTP server facade for FOLIO with Axum, error handling, and OpenAPI support.

use anyhow::Context;

use folio_kernel::{AppState, Module, ModuleRegistry};

pub mod error;
pub mod router;

use axum::routing::get;
use axum::Router;
use router::RouterBuilder;

/// Start the HTTP server with the given module registry and shared state.
/// Returns once the listener shuts down (ctrl-c).
pub async fn start_server(registry: &ModuleRegistry, state: AppState) -> anyhow::Result<()> {
    let host = state.settings.server.host.clone();
    let port = state.settings.server.port;

    tracing::info!("starting HTTP server on {}:{}", host, port);

    let app = build_router(registry, state).context("failed to build HTTP router")?;

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .context("failed to bind to address")?;

    tracing::info!("HTTP server listening on http://{}:{}", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Build the main HTTP router with all module routes mounted
fn build_router(registry: &ModuleRegistry, state: AppState) -> anyhow::Result<Router> {
    let mut router_builder = RouterBuilder::new();

    // Add global middlewares
    router_builder = router_builder
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(state.settings.server.request_timeout_ms);

    // Add health check route
    router_builder = router_builder.route("/healthz", get(health_check));

    // Mount module routes
    for module in registry.modules() {
        let module_name = module.name();

        tracing::info!(
            module = module_name,
            "mounting module routes under /api/{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
    }

    // Add OpenAPI documentation
    router_builder = router_builder.with_openapi(registry);

    Ok(router_builder.build(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}

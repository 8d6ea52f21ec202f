mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::admin::{routes as admin_routes, AdminService};
use crate::features::applications::{routes as applications_routes, ApplicationsService};
use crate::features::assistant::{routes as assistant_routes, AssistantService};
use crate::features::auth::{routes as auth_routes, AuthService, SessionStore};
use crate::features::booking::{routes as booking_routes, BookingService};
use crate::features::catalog::{routes as catalog_routes, CatalogService};
use crate::modules::backend::BackendClient;
use crate::shared::constants::SESSION_PURGE_INTERVAL_SECS;

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let backend = BackendClient::new(&config.backend)?;
    tracing::info!("Backend client ready (base URL: {})", config.backend.base_url);

    let sessions = Arc::new(SessionStore::new(config.session.clone()));
    let idle_ttl = config.session.ttl;

    let auth_service = Arc::new(AuthService::new(backend.clone(), Arc::clone(&sessions)));
    let catalog_service = Arc::new(CatalogService::new(backend.clone()));
    let booking_service = Arc::new(BookingService::new(backend.clone(), idle_ttl));
    let assistant_service = Arc::new(AssistantService::new(backend.clone(), idle_ttl));
    let applications_service = Arc::new(ApplicationsService::new(backend.clone()));
    let admin_service = Arc::new(AdminService::new(backend));

    spawn_purge_task(
        Arc::clone(&sessions),
        Arc::clone(&booking_service),
        Arc::clone(&assistant_service),
    );

    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Every API route runs inside a portal session
    let api_routes = Router::new()
        .merge(auth_routes::routes(auth_service))
        .merge(catalog_routes::routes(catalog_service))
        .merge(booking_routes::routes(booking_service))
        .merge(applications_routes::routes(applications_service))
        .merge(assistant_routes::routes(assistant_service))
        .merge(admin_routes::routes(admin_service))
        .layer(from_fn_with_state(
            Arc::clone(&sessions),
            middleware::session_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(
            ServiceBuilder::new()
                // Generate X-Request-Id using UUID v7 (or use client-provided one)
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::cors_layer(
                    config.app.cors_allowed_origins.clone(),
                )),
        );

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(Duration::from_secs(60))
            .with_interval(Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop idle sessions together with their wizards and conversations
fn spawn_purge_task(
    sessions: Arc<SessionStore>,
    booking: Arc<BookingService>,
    assistant: Arc<AssistantService>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let sessions_dropped = sessions.purge_expired().await;
            let wizards_dropped = booking.purge_expired().await;
            let conversations_dropped = assistant.purge_expired().await;

            if sessions_dropped + wizards_dropped + conversations_dropped > 0 {
                tracing::debug!(
                    "Purged {} session(s), {} wizard(s), {} conversation(s)",
                    sessions_dropped,
                    wizards_dropped,
                    conversations_dropped
                );
            }
        }
    });
}

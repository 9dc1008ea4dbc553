use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use devscope_auth::{AuthState, InMemoryUserStorage, auth_router};
use devscope_core::TtlCache;
use devscope_github::{GitHubApi, GitHubClient};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig, explore::ExploreService, handlers, middleware as app_middleware,
};

const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TtlCache>,
    pub explore: Arc<ExploreService>,
    pub github: Arc<dyn GitHubApi>,
    pub auth: AuthState,
    pub expose_error_details: bool,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Assemble state around an upstream client and auth state.
    pub fn new(
        cfg: &AppConfig,
        cache: Arc<TtlCache>,
        github: Arc<dyn GitHubApi>,
        auth: AuthState,
    ) -> Self {
        let explore = Arc::new(ExploreService::new(
            cache.clone(),
            github.clone(),
            cfg.explore.clone(),
        ));
        Self {
            cache,
            explore,
            github,
            auth,
            expose_error_details: cfg.expose_error_details(),
        }
    }

    /// Production state: real GitHub client, system clock, in-memory users.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let github = GitHubClient::new(&cfg.github.client_config())
            .context("failed to build GitHub client")?;
        let auth = AuthState::from_config(
            &cfg.auth,
            Arc::new(InMemoryUserStorage::new()),
            &cfg.github.user_agent,
            cfg.is_production(),
        )
        .context("failed to build auth state")?;

        Ok(Self::new(
            cfg,
            Arc::new(TtlCache::with_system_clock()),
            Arc::new(github),
            auth,
        ))
    }

    /// Drop expired cache entries, sessions and rate-limit windows.
    pub fn purge_expired(&self) {
        let purged_cache = self.cache.purge_expired();
        let purged_sessions = self.auth.sessions.purge_expired();
        self.auth.check_limiter.purge_expired();

        let stats = self.cache.stats();
        tracing::debug!(
            purged_cache,
            purged_sessions,
            cached = stats.live,
            refreshing = stats.locks,
            sessions = self.auth.sessions.active_sessions(),
            "housekeeping done"
        );
    }
}

fn cors_layer(cfg: &AppConfig) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(&cfg.auth.success_redirect())
        .context("auth.client_base_url is not a valid origin")?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(app_middleware::REQUEST_ID_HEADER),
        ]))
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> anyhow::Result<Router> {
    let body_limit = cfg.server.body_limit_bytes;

    let api = Router::new()
        .route("/explore/{language}", get(handlers::explore_popular))
        .route("/users/profile/{username}", get(handlers::user_profile))
        .route("/users/like/{username}", post(handlers::like_profile))
        .route("/users/likes", get(handlers::get_likes))
        .nest("/auth", auth_router(&state.auth));

    Ok(Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api)
        .with_state(state)
        // Middleware stack (outermost last: request id -> trace -> compression/cors -> body limit)
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(cfg)?)
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id)))
}

pub struct DevscopeServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    state: Option<AppState>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            state: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Use prebuilt state instead of building it from the configuration.
    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn build(self) -> anyhow::Result<DevscopeServer> {
        let state = match self.state {
            Some(state) => state,
            None => AppState::from_config(&self.config)?,
        };
        let app = build_app(&self.config, state.clone())?;

        Ok(DevscopeServer {
            addr: self.addr,
            app,
            state,
        })
    }
}

impl DevscopeServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!("listening on {}", self.addr);

        let housekeeping = tokio::spawn(housekeeping(self.state));
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        housekeeping.abort();
        Ok(())
    }
}

async fn housekeeping(state: AppState) {
    let mut interval = tokio::time::interval(HOUSEKEEPING_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        state.purge_expired();
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

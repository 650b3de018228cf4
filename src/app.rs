//! Application instance: configuration, store handle, routers and the shutdown token.
//!
//! Components receive what they need explicitly: handlers get [`AppState`] through axum state,
//! route registration gets `&mut App`.

use axum::{
    middleware,
    response::Response,
    Router,
};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::Config;
use crate::error::HttpError;
use crate::store::Db;

/// Largest accepted request body on the API.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// What request handlers may reach: configuration and the store.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<Config>,
    db: Db,
}

impl AppState {
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

pub struct App {
    shutdown: CancellationToken,
    state: AppState,
    router: Router<AppState>,
    api_router: Router<AppState>,
}

impl App {
    /// The shutdown token is a child of `parent`: cancelling the parent stops the app, not
    /// the other way round.
    pub fn new(parent: &CancellationToken, cfg: Config, db: Db) -> App {
        App {
            shutdown: parent.child_token(),
            state: AppState {
                cfg: Arc::new(cfg),
                db,
            },
            router: Router::new(),
            api_router: Router::new(),
        }
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn config(&self) -> &Config {
        self.state.config()
    }

    pub fn db(&self) -> &Db {
        self.state.db()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Register routes at the root.
    pub fn with_routes(&mut self, f: impl FnOnce(Router<AppState>) -> Router<AppState>) {
        self.router = f(std::mem::take(&mut self.router));
    }

    /// Register routes under `/api`.
    pub fn with_api_routes(&mut self, f: impl FnOnce(Router<AppState>) -> Router<AppState>) {
        self.api_router = f(std::mem::take(&mut self.api_router));
    }

    /// Assemble the service: API routes get error reporting and a body limit, everything gets
    /// request logging.
    pub fn router(&self) -> Router {
        let api = self
            .api_router
            .clone()
            .layer(middleware::map_response(report_errors))
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

        let trace = TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO));

        self.router
            .clone()
            .nest("/api", api)
            .layer(ServiceBuilder::new().layer(trace))
            .with_state(self.state.clone())
    }

    /// Block until the process receives an exit signal, then report which one.
    pub async fn wait_exit_signal(&self) -> std::io::Result<ExitSignal> {
        exit_signal().await
    }

    /// Cancel the app's token; the server stops accepting connections.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitSignal {
    Interrupt,
    Quit,
    Terminate,
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExitSignal::Interrupt => "interrupt",
            ExitSignal::Quit => "quit",
            ExitSignal::Terminate => "terminated",
        })
    }
}

/// Interrupt, quit or terminate; interrupt only off Unix.
pub async fn exit_signal() -> std::io::Result<ExitSignal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut quit = signal(SignalKind::quit())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let sig = tokio::select! {
            _ = interrupt.recv() => ExitSignal::Interrupt,
            _ = quit.recv() => ExitSignal::Quit,
            _ = terminate.recv() => ExitSignal::Terminate,
        };
        Ok(sig)
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(ExitSignal::Interrupt)
    }
}

async fn report_errors(res: Response) -> Response {
    if let Some(e) = res.extensions().get::<HttpError>() {
        if e.status.is_server_error() {
            tracing::error!(status = e.status.as_u16(), message = %e.message, "request failed");
        } else {
            tracing::debug!(status = e.status.as_u16(), message = %e.message, "request rejected");
        }
    }
    res
}

//! `api` subcommand: serve until an exit signal, then drain within the grace period.

use std::future::Future;

use tokio::net::TcpListener;
use tokio::time::Instant;

use crate::app::{exit_signal, App, ExitSignal};
use crate::error::Error;
use crate::routes;

/// `:8000` binds every interface; anything else is used as given.
pub fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

pub async fn serve(app: App, addr: &str) -> Result<(), Error> {
    let listener = TcpListener::bind(normalize_addr(addr)).await?;
    println!("listening on {}", addr);
    serve_on(app, listener, exit_signal()).await
}

/// Serve on `listener` until `exit` resolves. In-flight requests get the configured grace
/// period; whatever is still running after it is abandoned.
pub async fn serve_on<F>(mut app: App, listener: TcpListener, exit: F) -> Result<(), Error>
where
    F: Future<Output = std::io::Result<ExitSignal>>,
{
    routes::init_routes(&mut app);
    tracing::info!(addr = %listener.local_addr()?, env = %app.config().env, "api started");

    let router = app.router();
    let token = app.shutdown_token().clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    });

    tokio::select! {
        sig = exit => {
            println!("{}", sig?);
        }
        res = &mut server => {
            // The server stopped without being asked to.
            app.db().close().await;
            return match res {
                Ok(outcome) => Ok(outcome?),
                Err(e) => Err(Error::Server(e.to_string())),
            };
        }
    }

    app.shutdown();
    let grace = app.config().server.shutdown_grace();
    let deadline = Instant::now() + grace;
    let outcome = match tokio::time::timeout_at(deadline, &mut server).await {
        Ok(Ok(res)) => res.map_err(Error::from),
        Ok(Err(e)) => Err(Error::Server(e.to_string())),
        Err(_) => {
            server.abort();
            tracing::warn!(grace_secs = grace.as_secs(), "shutdown grace period elapsed, abandoning in-flight requests");
            Ok(())
        }
    };
    if tokio::time::timeout_at(deadline, app.db().close()).await.is_err() {
        tracing::warn!("store connections still checked out after the grace period");
    }
    outcome
}

//! Outlay is a web service for tracking personal and small-business expenses.
//!
//! This library provides a JSON REST API for a single-page app: Google
//! sign-in, expenses with user-defined tags, recurring expense templates
//! expanded at read time, vehicle mileage logs with mirrored deduction
//! expenses, CSV bulk import, and spending analytics. The same operations are
//! exposed as MCP-style tools for LLM clients.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod analytics;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod error;
mod expense;
mod logging;
mod mcp;
mod mileage;
mod pagination;
mod parse;
mod recurring;
mod routing;
mod tag;
#[cfg(test)]
mod test_utils;
mod user;
mod vehicle;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::logging_middleware;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

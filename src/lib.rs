//! Family Ledger records household income and expenses.
//!
//! This library provides a small JSON REST API over an append-only ledger
//! stored in SQLite:
//! - `POST /records` validates and stores a new record,
//! - `GET /records` lists every record in the order it was created,
//! - `GET /records/{record_id}` gets a single record,
//! - `GET /records/summary` totals income and expenses for a date range.
//!
//! Use [AppState::new] with an open connection and [build_router] to get an
//! [axum::Router] that serves the API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod database_id;
mod db;
mod endpoints;
mod error;
mod logging;
mod record;
mod routing;
mod timezone;

pub use app_state::AppState;
pub use database_id::{DatabaseId, RecordId};
pub use db::{initialize as initialize_db, open_connection};
pub use error::{Error, ValidationError};
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_SIZE, logging_middleware};
pub use record::{
    Amount, AmountInput, Category, CategoryTotal, LedgerSummary, Period, Record, RecordForm,
    RecordType, create_transaction, get_transaction, list_transactions, summarize_period,
};
pub use routing::build_router;

/// How long in-flight requests get to finish once shutdown starts.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("could not listen for ctrl+c: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::debug!("Received ctrl+c signal."),
        _ = terminate => tracing::debug!("Received terminate signal."),
    }

    tracing::info!("Shutting down, waiting for in-flight requests.");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}

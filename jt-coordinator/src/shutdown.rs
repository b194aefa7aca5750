use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Install a shutdown handler that listens for SIGTERM and SIGINT.
///
/// Returns a `CancellationToken` that is cancelled when either signal is
/// received. The RPC server and both sweepers watch this token. A signal
/// whose handler cannot be installed is logged and never fires.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    // Register before returning so no signal sent after this call is missed.
    let sigterm = listen(SignalKind::terminate(), "SIGTERM");
    let sigint = listen(SignalKind::interrupt(), "SIGINT");

    tokio::spawn(async move {
        tokio::select! {
            _ = received(sigterm) => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = received(sigint) => info!("Received SIGINT, initiating graceful shutdown"),
        }
        trigger.cancel();
    });

    token
}

fn listen(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(stream) => Some(stream),
        Err(e) => {
            error!(signal = name, error = %e, "Failed to install signal handler");
            None
        }
    }
}

async fn received(stream: Option<Signal>) {
    match stream {
        Some(mut stream) => {
            if stream.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

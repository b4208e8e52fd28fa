use tokio::signal;

async fn terminate() {
    #[cfg(unix)]
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::error!("unable to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }

    #[cfg(not(unix))]
    std::future::pending::<()>().await;
}

/// Resolves on Ctrl+C or SIGTERM so axum can drain in-flight requests.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("unable to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            #[cfg(not(windows))]
            println!();
            tracing::info!("Ctrl+C received, finishing in-flight requests.");
        }
        _ = terminate() => {
            tracing::info!("SIGTERM received, finishing in-flight requests.");
        }
    }
}

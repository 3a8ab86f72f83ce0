use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Install the Ctrl+C handler and return the shutdown flag it sets.
///
/// The first Ctrl+C requests a graceful stop: drivers stop requeueing and
/// the pool drains. A second Ctrl+C force-quits.
pub(crate) fn setup_shutdown_handler() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        tracing::warn!("shutdown requested, finishing queued work (Ctrl+C again to force quit)");
        handler_flag.store(true, Ordering::SeqCst);

        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install second Ctrl+C handler");

        eprintln!("Force quit!");
        std::process::exit(130);
    });

    flag
}

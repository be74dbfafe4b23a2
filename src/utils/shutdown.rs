use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels `cancelation` once the process receives Ctrl-C. Used to leave the once-per-second
/// refresh loops.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}

//! Status notifications for humans watching the pipeline.

use std::future::Future;

use tracing::info;

/// Receives plain-text status lines. Delivery problems are the
/// implementation's to log; callers never see them.
pub trait Notifier: Send + Sync {
    fn notify(&self, text: &str) -> impl Future<Output = ()> + Send;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        info!(target: "mailcal::notify", "{}", text);
    }
}

//! Timeout and bounded retry around provider calls.

use std::future::Future;

use tracing::warn;

use crate::config::RetryPolicy;
use crate::error::{MailcalError, MailcalResult};

/// Run `call` under the policy's timeout, retrying transient failures up to
/// `max_retries` times with exponential backoff.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> MailcalResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = MailcalResult<T>>,
{
    let mut retries = 0;
    let mut delay = policy.backoff;

    loop {
        let result = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(MailcalError::ProviderTimeout(policy.timeout.as_secs())),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retries < policy.max_retries => {
                retries += 1;
                warn!(operation, retry = retries, error = %e, "Transient provider error, retrying");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }
}

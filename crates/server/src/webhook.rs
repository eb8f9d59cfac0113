//! Fire-and-forget webhook notification for created quotes.
//!
//! Delivery is best effort: a failed POST is logged and never fails the
//! customer's submission.

use tokio::task::JoinHandle;

pub fn notify_quote_created(
    http: reqwest::Client,
    webhook_url: String,
    payload: serde_json::Value,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match http.post(&webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(
                    event_name = "webhook.delivered",
                    status = response.status().as_u16(),
                    "quote webhook delivered"
                );
            }
            Ok(response) => {
                tracing::warn!(
                    event_name = "webhook.rejected",
                    status = response.status().as_u16(),
                    "quote webhook rejected by receiver"
                );
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "webhook.failed",
                    error = %error,
                    "quote webhook delivery failed"
                );
            }
        }
    })
}

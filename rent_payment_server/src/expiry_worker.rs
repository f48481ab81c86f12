use chrono::Duration;
use log::*;
use rent_payment_engine::{db_types::PaymentRequest, PaymentFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::integrations::daraja::DarajaGateway;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, `Pending` payment requests older than `timeout` are marked as failed.
pub fn start_expiry_worker(api: PaymentFlowApi<SqliteDatabase, DarajaGateway>, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        info!("🕰️ Pending payment request expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running pending payment request expiry job");
            match api.expire_stale_requests(timeout).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No payment requests expired"),
                Ok(expired) => {
                    info!("🕰️ {} payment requests expired", expired.len());
                    debug!("🕰️ Expired payment requests: {}", request_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running payment request expiry job: {e}");
                },
            }
        }
    })
}

fn request_list(requests: &[PaymentRequest]) -> String {
    requests
        .iter()
        .map(|r| format!("[{}] checkout_request_id: {} tenant: {}", r.id, r.checkout_request_id, r.tenant_id))
        .collect::<Vec<String>>()
        .join(", ")
}

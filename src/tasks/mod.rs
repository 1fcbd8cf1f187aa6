//! Background scheduled tasks for the application.
//!
//! The expiry sweep also has an unauthenticated trigger endpoint
//! (`POST /subscriptions/check-expired`) for external cron setups;
//! `spawn_all` keeps a deployment honest when no cron is configured.

use crate::services::SubscriptionService;
use chrono::Utc;

/// Spawn all background tasks.
///
/// Notes
/// - Each task is idempotent as implemented in its service and runs on its own schedule.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(subscription_service: SubscriptionService) {
    // VIP expiry sweep (every 6 hours)
    {
        let svc = subscription_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.sweep_expired(Utc::now()).await {
                    Ok(n) if n > 0 => log::info!("Expired VIP subscriptions processed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to sweep expired subscriptions: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(6 * 3600)).await;
            }
        });
    }
}

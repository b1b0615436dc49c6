use std::sync::Arc;
use std::time::Duration;

use actix_web::rt;

use crate::auth::session::SessionManager;

/// Runs one sweep, logging the outcome. Store failures are logged and swallowed
/// so the next tick can try again.
pub async fn sweep_once(sessions: &SessionManager) -> Option<u64> {
    match sessions.sweep_expired().await {
        Ok(removed) => {
            if removed > 0 {
                log::info!("swept {} expired refresh tokens", removed);
            } else {
                log::debug!("token sweep found nothing to remove");
            }
            Some(removed)
        }
        Err(e) => {
            log::error!("token sweep failed: {}", e);
            None
        }
    }
}

/// Spawns a background task that sweeps expired refresh tokens every `every`.
pub fn spawn_token_sweeper(sessions: Arc<SessionManager>, every: Duration) -> rt::task::JoinHandle<()> {
    rt::spawn(async move {
        let mut ticker = rt::time::interval(every);
        // The first tick completes immediately; skip it so startup stays quiet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(&sessions).await;
        }
    })
}

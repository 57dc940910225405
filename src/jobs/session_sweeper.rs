use std::sync::Arc;
use std::time::Duration;

use crate::AppState;

const MIN_PERIOD: Duration = Duration::from_secs(1);
const MAX_PERIOD: Duration = Duration::from_secs(60);

fn sweep_period(ttl: Duration) -> Duration {
    (ttl / 4).clamp(MIN_PERIOD, MAX_PERIOD)
}

/// Periodically tears down sessions idle for longer than `ttl`. Runs forever.
pub async fn start_sweeper(state: Arc<AppState>, ttl: Duration) {
    let mut interval = tokio::time::interval(sweep_period(ttl));
    tracing::info!("Session sweeper running every {:?} (idle ttl {:?})", sweep_period(ttl), ttl);
    loop {
        interval.tick().await;
        let removed = state.sessions.sweep_idle(ttl);
        if removed > 0 {
            tracing::info!(
                "Swept {} idle landing sessions, {} still live",
                removed,
                state.sessions.len()
            );
        }
    }
}

use std::time::Duration;

use rand::Rng;
use tokio::time::interval;
use tracing::info;

use crate::ingest::Ingestor;

const FULL_REBUILD_PERIOD: Duration = Duration::from_secs(5 * 60);
const SAMPLED_REFRESH_PERIOD: Duration = Duration::from_secs(60);
const SAMPLE_SIZE: usize = 5;

/// Start the two periodic refresh tasks. They share the cache handle with no
/// mutual exclusion: a slow rebuild and a sampled refresh can overlap, and
/// the later write wins. Call once, after the first successful
/// authentication.
pub fn spawn_refresh_tasks(ingestor: Ingestor) {
    let full = ingestor.clone();
    tokio::spawn(async move {
        let mut ticker = interval(FULL_REBUILD_PERIOD);
        // The cold-start load already ran; skip the interval's immediate tick.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!("Scheduled full rebuild starting");
            full.initialize_data().await;
        }
    });

    tokio::spawn(async move {
        let mut ticker = interval(SAMPLED_REFRESH_PERIOD);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sampled_refresh(&ingestor).await;
        }
    });
}

/// Re-fetch posts for up to `SAMPLE_SIZE` user ids drawn uniformly at random
/// with replacement, so the same user can be refreshed twice in one pass.
async fn sampled_refresh(ingestor: &Ingestor) {
    let user_ids = ingestor.cache().user_ids();
    if user_ids.is_empty() {
        return;
    }

    let sample_size = user_ids.len().min(SAMPLE_SIZE);
    for _ in 0..sample_size {
        let index = rand::thread_rng().gen_range(0..user_ids.len());
        ingestor.fetch_posts_for_user(&user_ids[index]).await;
    }
}

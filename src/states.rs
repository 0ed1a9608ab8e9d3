use std::sync::Arc;

use crate::cache::AnalyticsCache;
use crate::ingest::Ingestor;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// `Arc` = Atomic Reference Counter
/// - Allows multiple threads to share ownership safely
/// - When last reference drops, data is cleaned up
///
/// The cache is injected here rather than living in module-level statics so
/// tests can instantiate isolated caches.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<AnalyticsCache>,
    pub ingestor: Ingestor,
}

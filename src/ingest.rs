use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::cache::AnalyticsCache;
use crate::client::UpstreamClient;
use crate::models::{Post, PostPayload};

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<PostPayload>,
}

#[derive(Debug, Deserialize)]
struct CommentsEnvelope {
    #[serde(default)]
    comments: Vec<serde_json::Value>,
}

/// Pulls users, posts, and comment counts from the upstream service into the
/// cache. Every fetch degrades to an empty result on failure; callers cannot
/// distinguish "nothing upstream" from "fetch failed" beyond the warn log.
#[derive(Clone)]
pub struct Ingestor {
    client: Arc<UpstreamClient>,
    cache: Arc<AnalyticsCache>,
}

impl Ingestor {
    pub fn new(client: Arc<UpstreamClient>, cache: Arc<AnalyticsCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &Arc<AnalyticsCache> {
        &self.cache
    }

    /// Fetch the user directory and replace the cached one wholesale.
    pub async fn fetch_users(&self) -> HashMap<String, String> {
        match self.client.get_json::<UsersEnvelope>("/users").await {
            Ok(envelope) => {
                self.cache.replace_users(envelope.users.clone());
                envelope.users
            }
            Err(err) => {
                warn!("Failed to fetch user directory: {}", err);
                HashMap::new()
            }
        }
    }

    /// Fetch one user's posts, replace that user's snapshot, and append to
    /// the global accumulator. Comment counts are fetched fire-and-forget per
    /// post; this function does not wait for them to resolve.
    pub async fn fetch_posts_for_user(&self, user_id: &str) -> Vec<Post> {
        let envelope = match self
            .client
            .get_json::<PostsEnvelope>(&format!("/users/{}/posts", user_id))
            .await
        {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("Failed to fetch posts for user {}: {}", user_id, err);
                return Vec::new();
            }
        };

        let now = Utc::now().timestamp_millis();
        let posts: Vec<Post> = envelope
            .posts
            .into_iter()
            .map(|payload| payload.into_post(now))
            .collect();

        self.cache.replace_user_posts(user_id, posts.clone());

        for post in &posts {
            let ingestor = self.clone();
            let post_id = post.id.clone();
            tokio::spawn(async move {
                ingestor.fetch_comments_for_post(&post_id).await;
            });
        }

        posts
    }

    /// Fetch a post's comments and record only their count. A failed fetch
    /// records nothing and reports 0, which is indistinguishable from a post
    /// that genuinely has no comments.
    pub async fn fetch_comments_for_post(&self, post_id: &str) -> usize {
        match self
            .client
            .get_json::<CommentsEnvelope>(&format!("/posts/{}/comments", post_id))
            .await
        {
            Ok(envelope) => {
                let count = envelope.comments.len();
                self.cache.merge_comment_count(post_id, count);
                count
            }
            Err(err) => {
                debug!("Failed to fetch comments for post {}: {}", post_id, err);
                0
            }
        }
    }

    /// Full cold rebuild: discard all derived data, then refetch the
    /// directory and every user's posts one user at a time. Readers observing
    /// the cache mid-rebuild see a transient partially-empty state.
    pub async fn initialize_data(&self) {
        self.cache.clear();

        let users = self.fetch_users().await;
        for user_id in users.keys() {
            self.fetch_posts_for_user(user_id).await;
        }

        info!("Cache rebuild finished for {} users", users.len());
    }
}

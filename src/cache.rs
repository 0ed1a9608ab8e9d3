use std::collections::HashMap;
use std::sync::RwLock;

use dashmap::DashMap;

use crate::models::Post;

/// In-memory analytics store shared by the ingestion pipeline, the refresh
/// timers, and the query handlers.
///
/// Consistency model: each structure is individually thread-safe, but there
/// is no mutual exclusion across structures or across refresh passes. A full
/// rebuild clears and repopulates while queries read, and overlapping
/// refreshes race with last-write-wins. The cache is eventually refreshed,
/// not linearizable; readers may observe a transient partially-empty state
/// mid-rebuild.
///
/// `all_posts` is an append-only accumulator: re-fetching a user appends that
/// user's posts again without pruning the prior entries, so duplicates build
/// up across sampled refreshes until the next full rebuild. The
/// popular/latest views operate on the accumulator as-is.
#[derive(Default)]
pub struct AnalyticsCache {
    users: DashMap<String, String>,
    post_counts: DashMap<String, usize>,
    posts_by_user: DashMap<String, Vec<Post>>,
    all_posts: RwLock<Vec<Post>>,
    comment_counts: DashMap<String, usize>,
}

impl AnalyticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything derived from posts. The user directory itself is not
    /// cleared here; a full rebuild replaces it via `replace_users` right
    /// after, so the scheduler can still sample user ids in between.
    pub fn clear(&self) {
        self.post_counts.clear();
        self.posts_by_user.clear();
        self.comment_counts.clear();
        self.all_posts.write().unwrap().clear();
    }

    /// Replace the entire user directory. Never partially merged.
    pub fn replace_users(&self, users: HashMap<String, String>) {
        self.users.clear();
        for (id, name) in users {
            self.users.insert(id, name);
        }
    }

    /// Replace one user's post snapshot and append the fetched posts to the
    /// global accumulator.
    pub fn replace_user_posts(&self, user_id: &str, posts: Vec<Post>) {
        self.post_counts.insert(user_id.to_string(), posts.len());
        self.all_posts.write().unwrap().extend(posts.iter().cloned());
        self.posts_by_user.insert(user_id.to_string(), posts);
    }

    /// Record the comment count for a post. Idempotent for a given count, so
    /// a lost or duplicated fire-and-forget fetch only affects when the count
    /// becomes visible.
    pub fn merge_comment_count(&self, post_id: &str, count: usize) {
        self.comment_counts.insert(post_id.to_string(), count);
    }

    pub fn users_is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn posts_is_empty(&self) -> bool {
        self.all_posts.read().unwrap().is_empty()
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.users.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Users sorted by post count descending, truncated to `limit`. Ties keep
    /// whatever order map iteration yielded; there is no secondary key.
    pub fn top_users(&self, limit: usize) -> Vec<(String, Option<String>, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .post_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        counts
            .into_iter()
            .take(limit)
            .map(|(user_id, count)| {
                let name = self.users.get(&user_id).map(|entry| entry.value().clone());
                (user_id, name, count)
            })
            .collect()
    }

    /// Accumulated posts sorted by timestamp descending, truncated to `limit`.
    pub fn latest_posts(&self, limit: usize) -> Vec<Post> {
        let mut posts = self.all_posts.read().unwrap().clone();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        posts.truncate(limit);
        posts
    }

    /// Every accumulated post tied for the maximum known comment count, with
    /// that count attached. Unbounded: ties are never capped. Returns `None`
    /// when no comment count is known yet, which is distinct from "no post
    /// has any comments".
    pub fn popular_posts(&self) -> Option<Vec<(Post, usize)>> {
        let counts: HashMap<String, usize> = self
            .comment_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        if counts.is_empty() {
            return None;
        }

        let max = counts.values().copied().max().unwrap_or(0);
        let all = self.all_posts.read().unwrap();
        Some(
            all.iter()
                .filter(|post| counts.get(&post.id) == Some(&max))
                .map(|post| (post.clone(), max))
                .collect(),
        )
    }
}

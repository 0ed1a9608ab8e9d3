use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub timestamp: i64,
}

/// A post as the upstream service sends it. Upstream sometimes omits the
/// timestamp; ingestion backfills it with the wall clock, so a post's
/// displayed recency can reflect ingestion time rather than authorship time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub timestamp: Option<i64>,
}

impl PostPayload {
    pub fn into_post(self, ingested_at_millis: i64) -> Post {
        Post {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            timestamp: self.timestamp.unwrap_or(ingested_at_millis),
        }
    }
}

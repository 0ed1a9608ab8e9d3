use serde::Serialize;

use crate::models::Post;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUser {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub post_count: usize,
}

/// A post with its resolved comment count, as returned by
/// `GET /posts?type=popular`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularPost {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: usize,
}

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::{dto::PopularPost, dto::PostsQuery, errors::ApiError, states::AppState};

/// GET /posts?type=popular|latest
/// `latest` is the five most recent accumulated posts; `popular` is every
/// post tied for the maximum known comment count, uncapped. The type is
/// validated before any cache work so a bad request never touches the cache.
pub async fn get_posts(
    State(state): State<AppState>,
    Query(params): Query<PostsQuery>,
) -> Result<Response, ApiError> {
    match params.feed_type.as_str() {
        "popular" | "latest" => {}
        other => return Err(ApiError::InvalidType(other.to_string())),
    }

    if state.cache.posts_is_empty() {
        state.ingestor.initialize_data().await;
    }

    if params.feed_type == "popular" {
        let popular: Vec<PopularPost> = state
            .cache
            .popular_posts()
            .ok_or(ApiError::NotReady)?
            .into_iter()
            .map(|(post, comment_count)| PopularPost {
                post,
                comment_count,
            })
            .collect();
        Ok(Json(popular).into_response())
    } else {
        Ok(Json(state.cache.latest_posts(5)).into_response())
    }
}

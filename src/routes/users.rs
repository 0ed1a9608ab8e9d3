use axum::{Json, extract::State};

use crate::{dto::TopUser, states::AppState};

/// GET /users
/// The five users with the most cached posts, descending. An empty user
/// directory triggers a synchronous full rebuild first (cold-start fallback).
pub async fn top_users(State(state): State<AppState>) -> Json<Vec<TopUser>> {
    if state.cache.users_is_empty() {
        state.ingestor.initialize_data().await;
    }

    let top = state
        .cache
        .top_users(5)
        .into_iter()
        .map(|(user_id, user_name, post_count)| TopUser {
            user_id,
            user_name,
            post_count,
        })
        .collect();

    Json(top)
}

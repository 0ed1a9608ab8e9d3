use serde::Deserialize;

/// Query parameters for `GET /posts`. A missing `type` defaults to
/// `popular`; validation of the value happens in the handler so an unknown
/// type maps to a 400 rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    #[serde(rename = "type", default = "default_feed_type")]
    pub feed_type: String,
}

fn default_feed_type() -> String {
    "popular".to_string()
}

mod requests;
mod responses;

pub use requests::PostsQuery;
pub use responses::{PopularPost, TopUser};

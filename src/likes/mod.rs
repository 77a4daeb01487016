mod like_service;
mod visibility;

pub use like_service::LikeService;
pub use visibility::{compose_view, compose_views};

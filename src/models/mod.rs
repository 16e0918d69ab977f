pub mod feed;
pub mod feed_follow;
pub mod post;
pub mod user;

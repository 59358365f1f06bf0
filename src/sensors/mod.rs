mod feed;

pub use feed::{spawn_feed, FeedSource};

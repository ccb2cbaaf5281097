pub mod config;
pub mod dates;
pub mod error;
pub mod filter;
pub mod hooks;
pub mod logger;
pub mod options;
pub mod paginator;
pub mod post;
pub mod posts;
pub mod slug;
pub mod storage;
pub mod tags;
pub mod taxonomy;
#[cfg(test)]
mod test_data;

pub use error::{PostError, Result};
pub use filter::PostFilter;
pub use post::{Post, PostType};
pub use posts::{NewPost, PostUpdate, Posts, QueryContext, QueryResult};

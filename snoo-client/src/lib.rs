mod client;
pub use client::{Client, ListOptions, Pages};

mod comment_tree;
pub use comment_tree::{CommentTree, MoreChildren, PostAndComments};

mod config;
pub use config::{Config, DEFAULT_BASE_URL};

mod error;
pub use error::Error;

mod set;
pub use set::BoundedOrderSet;

pub mod stream;
pub use stream::{StopHandle, StreamConfig, StreamState};

pub mod api {
    pub use snoo_api::*;
}

use chrono::Utc;

mod comment;
pub use comment::{Comment, More, Replies};

mod error;
pub use error::Error;

mod id;
pub use id::{FullId, Kind};

mod listing;
pub use listing::{decode_post_and_comments, decode_things, Listing};

mod post;
pub use post::{Message, Post};

mod subreddit;
pub use subreddit::{ModAction, Multi, Subreddit};

mod thing;
pub use thing::{Identified, Thing};

mod time;

mod user;
pub use user::{Trophy, TrophyList, User};

pub type Time = chrono::DateTime<Utc>;

/// Largest page the platform will hand out for a single listing request
pub const MAX_LIMIT: usize = 100;

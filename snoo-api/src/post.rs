use crate::{FullId, Identified, Time};

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    #[serde(rename = "name")]
    pub full_id: FullId,
    #[serde(rename = "created_utc", with = "crate::time::created")]
    pub created: Option<Time>,
    #[serde(with = "crate::time::edited")]
    pub edited: Option<Time>,

    pub permalink: String,
    pub url: String,

    pub title: String,
    #[serde(rename = "selftext")]
    pub body: String,

    /// `Some(true)` for an upvote, `Some(false)` for a downvote
    pub likes: Option<bool>,
    pub score: i64,
    pub upvote_ratio: f32,
    #[serde(rename = "num_comments")]
    pub number_of_comments: i64,

    #[serde(rename = "subreddit")]
    pub subreddit_name: String,
    pub subreddit_name_prefixed: String,
    pub subreddit_id: String,
    pub subreddit_subscribers: i64,

    pub author: String,
    #[serde(rename = "author_fullname")]
    pub author_id: String,

    pub spoiler: bool,
    pub locked: bool,
    #[serde(rename = "over_18")]
    pub nsfw: bool,
    #[serde(rename = "is_self")]
    pub is_self_post: bool,
    pub saved: bool,
    pub stickied: bool,
}

impl Identified for Post {
    fn full_id(&self) -> FullId {
        self.full_id.clone()
    }
}

/// Private message, or a comment reply delivered to the inbox
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Message {
    pub id: String,
    #[serde(rename = "name")]
    pub full_id: FullId,
    #[serde(rename = "created_utc", with = "crate::time::created")]
    pub created: Option<Time>,

    pub subject: String,
    #[serde(rename = "body")]
    pub text: String,
    pub parent_id: FullId,

    pub author: String,
    #[serde(rename = "dest")]
    pub to: String,

    #[serde(rename = "was_comment")]
    pub is_comment: bool,
}

impl Identified for Message {
    fn full_id(&self) -> FullId {
        self.full_id.clone()
    }
}

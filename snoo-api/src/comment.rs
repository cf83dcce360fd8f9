use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::{thing::ThingRef, FullId, Identified, Listing, Time};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Comment {
    pub id: String,
    #[serde(rename = "name")]
    pub full_id: FullId,
    #[serde(rename = "created_utc", with = "crate::time::created")]
    pub created: Option<Time>,
    #[serde(with = "crate::time::edited")]
    pub edited: Option<Time>,

    /// Post or comment this is a reply to
    pub parent_id: FullId,
    pub permalink: String,

    pub body: String,
    pub author: String,
    #[serde(rename = "author_fullname")]
    pub author_id: String,
    pub author_flair_text: Option<String>,

    #[serde(rename = "subreddit")]
    pub subreddit_name: String,
    pub subreddit_name_prefixed: String,
    pub subreddit_id: String,

    /// `Some(true)` for an upvote, `Some(false)` for a downvote
    pub likes: Option<bool>,
    pub score: i64,
    pub controversiality: i64,

    /// Post this comment belongs to
    #[serde(rename = "link_id")]
    pub post_id: FullId,
    #[serde(rename = "link_title")]
    pub post_title: String,
    #[serde(rename = "link_permalink")]
    pub post_permalink: String,
    #[serde(rename = "link_author")]
    pub post_author: String,
    #[serde(rename = "num_comments")]
    pub post_num_comments: Option<i64>,

    pub is_submitter: bool,
    pub score_hidden: bool,
    pub saved: bool,
    pub stickied: bool,
    pub locked: bool,
    pub can_gild: bool,
    #[serde(rename = "over_18")]
    pub nsfw: bool,

    pub replies: Replies,
}

impl Comment {
    pub fn has_more(&self) -> bool {
        self.replies.has_more()
    }
}

impl Identified for Comment {
    fn full_id(&self) -> FullId {
        self.full_id.clone()
    }
}

/// Stand-in for replies that were not sent along with their parent
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct More {
    pub id: String,
    #[serde(rename = "name")]
    pub full_id: FullId,
    pub parent_id: FullId,

    /// Number of replies to the parent, counting replies to replies recursively
    pub count: i64,
    /// Number of comment levels from the parent down to the deepest one
    pub depth: i64,
    /// Bare ids of the children that still need fetching
    pub children: Vec<String>,
}

impl More {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Identified for More {
    fn full_id(&self) -> FullId {
        self.full_id.clone()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Replies {
    pub comments: Vec<Comment>,
    pub more: Option<More>,
}

impl Replies {
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty() && self.more.is_none()
    }

    pub fn has_more(&self) -> bool {
        self.more.as_ref().map_or(false, |m| !m.is_empty())
    }
}

impl<'de> Deserialize<'de> for Replies {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Replies, D::Error> {
        let raw = Box::<RawValue>::deserialize(d)?;
        // a comment without replies carries `""` instead of an empty listing
        match raw.get().trim() {
            r#""""# | "null" => return Ok(Replies::default()),
            _ => (),
        }
        let (comments, mores) = Listing::from_raw_envelope(&raw)
            .map_err(de::Error::custom)?
            .into_comments_and_mores();
        Ok(Replies {
            comments,
            more: mores.into_iter().next(),
        })
    }
}

impl Serialize for Replies {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            return s.serialize_str("");
        }
        let children = self
            .comments
            .iter()
            .map(ThingRef::Comment)
            .chain(self.more.iter().map(ThingRef::More))
            .collect::<Vec<_>>();
        crate::listing::ListingData {
            children,
            after: None,
            before: None,
        }
        .envelope()
        .serialize(s)
    }
}

use crate::{FullId, Identified, Time};

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Subreddit {
    pub id: String,
    #[serde(rename = "name")]
    pub full_id: FullId,
    #[serde(rename = "created_utc", with = "crate::time::created")]
    pub created: Option<Time>,

    pub url: String,
    #[serde(rename = "display_name")]
    pub name: String,
    #[serde(rename = "display_name_prefixed")]
    pub name_prefixed: String,
    pub title: String,
    #[serde(rename = "public_description")]
    pub description: String,
    #[serde(rename = "subreddit_type")]
    pub kind: String,
    pub suggested_comment_sort: Option<String>,

    pub subscribers: i64,
    pub active_user_count: Option<i64>,
    #[serde(rename = "over18")]
    pub nsfw: bool,
    #[serde(rename = "user_is_moderator")]
    pub user_is_mod: bool,
    #[serde(rename = "user_is_subscriber")]
    pub subscribed: bool,
    #[serde(rename = "user_has_favorited")]
    pub favorite: bool,
}

impl Identified for Subreddit {
    fn full_id(&self) -> FullId {
        self.full_id.clone()
    }
}

/// Entry of a subreddit's moderation log
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ModAction {
    /// Already prefixed, eg. `ModAction_9f1e...`
    pub id: String,
    pub action: String,
    #[serde(rename = "created_utc", with = "crate::time::created")]
    pub created: Option<Time>,

    #[serde(rename = "mod")]
    pub moderator: String,
    #[serde(rename = "mod_id36")]
    pub moderator_id: String,

    pub target_author: String,
    #[serde(rename = "target_fullname")]
    pub target_id: Option<FullId>,
    pub target_title: Option<String>,
    pub target_permalink: Option<String>,
    pub target_body: Option<String>,

    #[serde(rename = "subreddit")]
    pub subreddit_name: String,
    #[serde(rename = "sr_id36")]
    pub subreddit_id: String,

    pub details: Option<String>,
    pub description: Option<String>,
}

impl Identified for ModAction {
    fn full_id(&self) -> FullId {
        FullId(self.id.clone())
    }
}

/// A user-curated collection of subreddits
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Multi {
    pub name: String,
    pub display_name: String,
    /// eg. `/user/alice/m/programming`
    pub path: String,
    #[serde(rename = "description_md")]
    pub description: String,
    pub visibility: String,
    #[serde(with = "subreddit_names")]
    pub subreddits: Vec<String>,

    pub owner: String,
    pub owner_id: String,
    #[serde(rename = "created_utc", with = "crate::time::created")]
    pub created: Option<Time>,

    #[serde(rename = "num_subscribers")]
    pub number_of_subscribers: i64,
    #[serde(rename = "is_favorited")]
    pub favorite: bool,
    pub can_edit: bool,
    #[serde(rename = "over_18")]
    pub nsfw: bool,
}

impl Identified for Multi {
    fn full_id(&self) -> FullId {
        FullId(self.path.clone())
    }
}

// the wire shape is `[{"name": "rust"}, ...]`
mod subreddit_names {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize, Serialize)]
    struct Named<S> {
        name: S,
    }

    pub fn serialize<S: Serializer>(names: &[String], s: S) -> Result<S::Ok, S::Error> {
        names
            .iter()
            .map(|name| Named { name })
            .collect::<Vec<_>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(Vec::<Named<String>>::deserialize(d)?
            .into_iter()
            .map(|n| n.name)
            .collect())
    }
}

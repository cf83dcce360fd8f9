use crate::{FullId, Identified, Kind, Time};

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    /// The username, not the full id
    pub name: String,
    #[serde(rename = "created_utc", with = "crate::time::created")]
    pub created: Option<Time>,

    #[serde(rename = "link_karma")]
    pub post_karma: i64,
    pub comment_karma: i64,

    pub is_friend: bool,
    pub is_employee: bool,
    pub has_verified_email: bool,
    #[serde(rename = "over_18")]
    pub nsfw: bool,
    pub is_suspended: bool,
}

impl Identified for User {
    fn full_id(&self) -> FullId {
        FullId::new(Kind::User, &self.id)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Trophy {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "icon_70")]
    pub icon: Option<String>,
    pub award_id: Option<String>,
    pub url: Option<String>,
    #[serde(with = "crate::time::created")]
    pub granted_at: Option<Time>,
}

impl Identified for Trophy {
    fn full_id(&self) -> FullId {
        match &self.id {
            Some(id) => FullId::new(Kind::Trophy, id),
            None => FullId::new(Kind::Trophy, &self.name),
        }
    }
}

/// Trophies, as wrapped by the `TrophyList` kind
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrophyList {
    pub trophies: Vec<Trophy>,
}

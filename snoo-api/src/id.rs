use std::{fmt, str::FromStr};

use crate::Error;

/// Kind-prefixed identifier, eg. `t3_abc` for post `abc`
#[derive(
    Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct FullId(pub String);

impl FullId {
    pub fn new(kind: Kind, id: &str) -> FullId {
        FullId(format!("{}_{}", kind.code(), id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first underscore, if any
    pub fn kind_prefix(&self) -> Option<&str> {
        self.0.split_once('_').map(|(k, _)| k)
    }

    /// The bare identifier, without its kind prefix
    pub fn id(&self) -> &str {
        self.0.split_once('_').map(|(_, id)| id).unwrap_or(&self.0)
    }

    pub fn is_kind(&self, kind: Kind) -> bool {
        self.kind_prefix() == Some(kind.code())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FullId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FullId {
    fn from(s: &str) -> FullId {
        FullId(s.to_string())
    }
}

impl From<String> for FullId {
    fn from(s: String) -> FullId {
        FullId(s)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Comment,
    User,
    Post,
    Message,
    Subreddit,
    Trophy,
    More,
    ModAction,
    Multi,
    TrophyList,
    Listing,
}

impl Kind {
    pub const ALL: [Kind; 11] = [
        Kind::Comment,
        Kind::User,
        Kind::Post,
        Kind::Message,
        Kind::Subreddit,
        Kind::Trophy,
        Kind::More,
        Kind::ModAction,
        Kind::Multi,
        Kind::TrophyList,
        Kind::Listing,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Kind::Comment => "t1",
            Kind::User => "t2",
            Kind::Post => "t3",
            Kind::Message => "t4",
            Kind::Subreddit => "t5",
            Kind::Trophy => "t6",
            Kind::More => "more",
            Kind::ModAction => "modaction",
            Kind::Multi => "LabeledMulti",
            Kind::TrophyList => "TrophyList",
            Kind::Listing => "Listing",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Kind, Error> {
        Kind::ALL
            .into_iter()
            .find(|k| k.code() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

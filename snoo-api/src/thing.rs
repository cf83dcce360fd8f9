use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::{
    listing::RawListingData, Comment, Error, FullId, Kind, Listing, Message, ModAction, More,
    Multi, Post, Subreddit, Trophy, TrophyList, User,
};

/// Anything that carries a stable full id
pub trait Identified {
    fn full_id(&self) -> FullId;
}

/// A decoded `{kind, data}` envelope
#[derive(Clone, Debug, PartialEq)]
pub enum Thing {
    Comment(Comment),
    More(More),
    User(User),
    Post(Post),
    Message(Message),
    Subreddit(Subreddit),
    ModAction(ModAction),
    Multi(Multi),
    Trophy(Trophy),
    TrophyList(TrophyList),
    Listing(Listing),
}

#[derive(serde::Deserialize)]
struct RawEnvelope {
    kind: String,
    #[serde(default)]
    data: Option<Box<RawValue>>,
}

#[derive(serde::Deserialize)]
struct RawTrophyList {
    #[serde(default)]
    trophies: Vec<Box<RawValue>>,
}

macro_rules! into_variant {
    ( $fn:ident, $variant:ident, $typ:ty ) => {
        pub fn $fn(self) -> Result<$typ, Error> {
            match self {
                Thing::$variant(v) => Ok(v),
                other => Err(Error::UnexpectedKind {
                    expected: Kind::$variant,
                    got: other.kind(),
                }),
            }
        }
    };
}

impl Thing {
    /// Decodes a single envelope. `data` is only parsed once `kind` has
    /// selected the shape to parse it into.
    pub fn decode(body: &[u8]) -> Result<Thing, Error> {
        let env: RawEnvelope =
            serde_json::from_slice(body).map_err(|e| Error::MalformedEnvelope(e.to_string()))?;
        Thing::from_envelope(env)
    }

    pub(crate) fn from_raw(raw: &RawValue) -> Result<Thing, Error> {
        let env: RawEnvelope = serde_json::from_str(raw.get())
            .map_err(|e| Error::MalformedEnvelope(e.to_string()))?;
        Thing::from_envelope(env)
    }

    fn from_envelope(env: RawEnvelope) -> Result<Thing, Error> {
        let kind: Kind = env.kind.parse()?;
        let data = env
            .data
            .ok_or_else(|| Error::malformed_payload(&env.kind, "missing data"))?;
        macro_rules! parse {
            ( $variant:ident ) => {
                Thing::$variant(
                    serde_json::from_str(data.get())
                        .map_err(|e| Error::malformed_payload(&env.kind, e))?,
                )
            };
        }
        Ok(match kind {
            Kind::Comment => parse!(Comment),
            Kind::More => parse!(More),
            Kind::User => parse!(User),
            Kind::Post => parse!(Post),
            Kind::Message => parse!(Message),
            Kind::Subreddit => parse!(Subreddit),
            Kind::ModAction => parse!(ModAction),
            Kind::Multi => parse!(Multi),
            Kind::Trophy => parse!(Trophy),
            Kind::TrophyList => {
                let raw: RawTrophyList = serde_json::from_str(data.get())
                    .map_err(|e| Error::malformed_payload(&env.kind, e))?;
                let trophies = raw
                    .trophies
                    .iter()
                    .map(|t| Thing::from_raw(t)?.into_trophy())
                    .collect::<Result<Vec<_>, _>>()?;
                Thing::TrophyList(TrophyList { trophies })
            }
            Kind::Listing => {
                let raw: RawListingData = serde_json::from_str(data.get())
                    .map_err(|e| Error::malformed_payload(&env.kind, e))?;
                Thing::Listing(Listing::from_children(raw.children, raw.after, raw.before)?)
            }
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            Thing::Comment(_) => Kind::Comment,
            Thing::More(_) => Kind::More,
            Thing::User(_) => Kind::User,
            Thing::Post(_) => Kind::Post,
            Thing::Message(_) => Kind::Message,
            Thing::Subreddit(_) => Kind::Subreddit,
            Thing::ModAction(_) => Kind::ModAction,
            Thing::Multi(_) => Kind::Multi,
            Thing::Trophy(_) => Kind::Trophy,
            Thing::TrophyList(_) => Kind::TrophyList,
            Thing::Listing(_) => Kind::Listing,
        }
    }

    into_variant!(into_comment, Comment, Comment);
    into_variant!(into_more, More, More);
    into_variant!(into_user, User, User);
    into_variant!(into_post, Post, Post);
    into_variant!(into_message, Message, Message);
    into_variant!(into_subreddit, Subreddit, Subreddit);
    into_variant!(into_mod_action, ModAction, ModAction);
    into_variant!(into_multi, Multi, Multi);
    into_variant!(into_trophy, Trophy, Trophy);
    into_variant!(into_trophy_list, TrophyList, TrophyList);
    into_variant!(into_listing, Listing, Listing);

    pub(crate) fn as_ref(&self) -> ThingRef<'_> {
        match self {
            Thing::Comment(v) => ThingRef::Comment(v),
            Thing::More(v) => ThingRef::More(v),
            Thing::User(v) => ThingRef::User(v),
            Thing::Post(v) => ThingRef::Post(v),
            Thing::Message(v) => ThingRef::Message(v),
            Thing::Subreddit(v) => ThingRef::Subreddit(v),
            Thing::ModAction(v) => ThingRef::ModAction(v),
            Thing::Multi(v) => ThingRef::Multi(v),
            Thing::Trophy(v) => ThingRef::Trophy(v),
            Thing::TrophyList(v) => ThingRef::TrophyList(v),
            Thing::Listing(v) => ThingRef::Listing(v),
        }
    }
}

impl Serialize for Thing {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.as_ref().serialize(s)
    }
}

#[derive(serde::Serialize)]
pub(crate) struct Envelope<T> {
    pub kind: &'static str,
    pub data: T,
}

/// Borrowed view of a thing, serialized back into its envelope
#[derive(Clone, Copy)]
pub(crate) enum ThingRef<'a> {
    Comment(&'a Comment),
    More(&'a More),
    User(&'a User),
    Post(&'a Post),
    Message(&'a Message),
    Subreddit(&'a Subreddit),
    ModAction(&'a ModAction),
    Multi(&'a Multi),
    Trophy(&'a Trophy),
    TrophyList(&'a TrophyList),
    Listing(&'a Listing),
}

impl Serialize for ThingRef<'_> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        macro_rules! envelope {
            ( $kind:ident, $data:expr ) => {
                Envelope {
                    kind: Kind::$kind.code(),
                    data: $data,
                }
                .serialize(s)
            };
        }
        match *self {
            ThingRef::Comment(v) => envelope!(Comment, v),
            ThingRef::More(v) => envelope!(More, v),
            ThingRef::User(v) => envelope!(User, v),
            ThingRef::Post(v) => envelope!(Post, v),
            ThingRef::Message(v) => envelope!(Message, v),
            ThingRef::Subreddit(v) => envelope!(Subreddit, v),
            ThingRef::ModAction(v) => envelope!(ModAction, v),
            ThingRef::Multi(v) => envelope!(Multi, v),
            ThingRef::Trophy(v) => envelope!(Trophy, v),
            ThingRef::TrophyList(v) => {
                #[derive(serde::Serialize)]
                struct Trophies<'a> {
                    trophies: Vec<ThingRef<'a>>,
                }
                envelope!(
                    TrophyList,
                    Trophies {
                        trophies: v.trophies.iter().map(ThingRef::Trophy).collect(),
                    }
                )
            }
            ThingRef::Listing(v) => envelope!(Listing, v.data()),
        }
    }
}

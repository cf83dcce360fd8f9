use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::{
    thing::{Envelope, ThingRef},
    Comment, Error, FullId, Kind, Message, ModAction, More, Multi, Post, Subreddit, Thing, Trophy,
    User,
};

/// One page of things, split by variant, with the cursors to the
/// neighbouring pages
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    comments: Vec<Comment>,
    mores: Vec<More>,
    users: Vec<User>,
    posts: Vec<Post>,
    messages: Vec<Message>,
    subreddits: Vec<Subreddit>,
    mod_actions: Vec<ModAction>,
    multis: Vec<Multi>,
    trophies: Vec<Trophy>,

    after: Option<FullId>,
    before: Option<FullId>,
}

#[derive(serde::Deserialize)]
struct RawListing {
    #[serde(default)]
    kind: Option<String>,
    data: Box<RawValue>,
}

#[derive(serde::Deserialize)]
pub(crate) struct RawListingData {
    #[serde(default)]
    pub children: Vec<Box<RawValue>>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

fn cursor(c: Option<String>) -> Option<FullId> {
    c.filter(|c| !c.is_empty()).map(FullId)
}

impl Listing {
    /// Decodes a `{kind: "Listing", data: {children, after, before}}` body
    pub fn decode(body: &[u8]) -> Result<Listing, Error> {
        let raw: RawListing =
            serde_json::from_slice(body).map_err(|e| Error::MalformedEnvelope(e.to_string()))?;
        Listing::from_raw_listing(raw)
    }

    pub(crate) fn from_raw_envelope(raw: &RawValue) -> Result<Listing, Error> {
        let raw: RawListing = serde_json::from_str(raw.get())
            .map_err(|e| Error::MalformedEnvelope(e.to_string()))?;
        Listing::from_raw_listing(raw)
    }

    fn from_raw_listing(raw: RawListing) -> Result<Listing, Error> {
        if let Some(kind) = raw.kind {
            let kind: Kind = kind.parse()?;
            if kind != Kind::Listing {
                return Err(Error::UnexpectedKind {
                    expected: Kind::Listing,
                    got: kind,
                });
            }
        }
        let data: RawListingData = serde_json::from_str(raw.data.get())
            .map_err(|e| Error::malformed_payload(Kind::Listing.code(), e))?;
        Listing::from_children(data.children, data.after, data.before)
    }

    /// Decodes every child in order, failing on the first one that does not
    /// decode
    pub fn from_children(
        children: Vec<Box<RawValue>>,
        after: Option<String>,
        before: Option<String>,
    ) -> Result<Listing, Error> {
        let mut res = Listing {
            after: cursor(after),
            before: cursor(before),
            ..Listing::default()
        };
        for c in children {
            res.push(Thing::from_raw(&c)?);
        }
        Ok(res)
    }

    /// Builds a listing out of already-decoded things, eg. to serve it back
    pub fn from_things<I>(things: I, after: Option<FullId>, before: Option<FullId>) -> Listing
    where
        I: IntoIterator<Item = Thing>,
    {
        let mut res = Listing {
            after: after.filter(|a| !a.is_empty()),
            before: before.filter(|b| !b.is_empty()),
            ..Listing::default()
        };
        for t in things {
            res.push(t);
        }
        res
    }

    fn push(&mut self, t: Thing) {
        match t {
            Thing::Comment(c) => self.comments.push(c),
            Thing::More(m) => self.mores.push(m),
            Thing::User(u) => self.users.push(u),
            Thing::Post(p) => self.posts.push(p),
            Thing::Message(m) => self.messages.push(m),
            Thing::Subreddit(s) => self.subreddits.push(s),
            Thing::ModAction(a) => self.mod_actions.push(a),
            Thing::Multi(m) => self.multis.push(m),
            Thing::Trophy(t) => self.trophies.push(t),
            Thing::TrophyList(l) => self.trophies.extend(l.trophies),
            Thing::Listing(l) => {
                tracing::warn!(children = l.len(), "ignoring listing nested in a listing")
            }
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn mores(&self) -> &[More] {
        &self.mores
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn subreddits(&self) -> &[Subreddit] {
        &self.subreddits
    }

    pub fn mod_actions(&self) -> &[ModAction] {
        &self.mod_actions
    }

    pub fn multis(&self) -> &[Multi] {
        &self.multis
    }

    pub fn trophies(&self) -> &[Trophy] {
        &self.trophies
    }

    /// Cursor to the next page, `None` once there is nothing left
    pub fn after(&self) -> Option<&FullId> {
        self.after.as_ref()
    }

    /// Cursor to the previous page
    pub fn before(&self) -> Option<&FullId> {
        self.before.as_ref()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
            + self.mores.len()
            + self.users.len()
            + self.posts.len()
            + self.messages.len()
            + self.subreddits.len()
            + self.mod_actions.len()
            + self.multis.len()
            + self.trophies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }

    pub fn into_comments(self) -> Vec<Comment> {
        self.comments
    }

    pub fn into_subreddits(self) -> Vec<Subreddit> {
        self.subreddits
    }

    pub fn into_mod_actions(self) -> Vec<ModAction> {
        self.mod_actions
    }

    pub fn into_comments_and_mores(self) -> (Vec<Comment>, Vec<More>) {
        (self.comments, self.mores)
    }

    pub(crate) fn data(&self) -> ListingData<'_> {
        let children = (self.comments.iter().map(ThingRef::Comment))
            .chain(self.mores.iter().map(ThingRef::More))
            .chain(self.users.iter().map(ThingRef::User))
            .chain(self.posts.iter().map(ThingRef::Post))
            .chain(self.messages.iter().map(ThingRef::Message))
            .chain(self.subreddits.iter().map(ThingRef::Subreddit))
            .chain(self.mod_actions.iter().map(ThingRef::ModAction))
            .chain(self.multis.iter().map(ThingRef::Multi))
            .chain(self.trophies.iter().map(ThingRef::Trophy))
            .collect();
        ListingData {
            children,
            after: self.after.as_ref(),
            before: self.before.as_ref(),
        }
    }
}

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.data().envelope().serialize(s)
    }
}

#[derive(serde::Serialize)]
pub(crate) struct ListingData<'a> {
    pub children: Vec<ThingRef<'a>>,
    pub after: Option<&'a FullId>,
    pub before: Option<&'a FullId>,
}

impl<'a> ListingData<'a> {
    pub fn envelope(self) -> Envelope<ListingData<'a>> {
        Envelope {
            kind: Kind::Listing.code(),
            data: self,
        }
    }
}

#[derive(serde::Deserialize)]
struct ThingsResponse {
    json: ThingsJson,
}

#[derive(serde::Deserialize)]
struct ThingsJson {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    data: Option<ThingsData>,
}

#[derive(serde::Deserialize)]
struct ThingsData {
    #[serde(default)]
    things: Vec<Box<RawValue>>,
}

/// Decodes the flat `{"json": {"data": {"things": [..]}}}` answer of the
/// comment expansion endpoint into a cursor-less listing
pub fn decode_things(body: &[u8]) -> Result<Listing, Error> {
    let resp: ThingsResponse =
        serde_json::from_slice(body).map_err(|e| Error::MalformedEnvelope(e.to_string()))?;
    if !resp.json.errors.is_empty() {
        return Err(Error::parse(200, body));
    }
    let things = resp.json.data.map(|d| d.things).unwrap_or_default();
    Listing::from_children(things, None, None)
}

/// Decodes the `[post listing, comment listing]` pair returned for a post's
/// page
pub fn decode_post_and_comments(body: &[u8]) -> Result<(Post, Listing), Error> {
    let parts: Vec<Box<RawValue>> =
        serde_json::from_slice(body).map_err(|e| Error::MalformedEnvelope(e.to_string()))?;
    let [post, comments]: [Box<RawValue>; 2] = parts.try_into().map_err(|p: Vec<_>| {
        Error::MalformedEnvelope(format!(
            "expected a post listing and a comment listing, got {} elements",
            p.len()
        ))
    })?;
    let post = Listing::from_raw_envelope(&post)?
        .into_posts()
        .into_iter()
        .next()
        .ok_or_else(|| Error::malformed_payload(Kind::Listing.code(), "no post in listing"))?;
    let comments = Listing::from_raw_envelope(&comments)?;
    Ok((post, comments))
}

use std::collections::{HashMap, VecDeque};

use chrono::{TimeZone, Utc};
use snoo_client::api::{
    self, Comment, Error, FullId, Kind, Listing, More, Post, Replies, Subreddit, Thing, Trophy,
    TrophyList, User, MAX_LIMIT,
};

mod http;
pub use http::{router, serve, SharedMock};

mod scripted;
pub use scripted::ScriptedSource;

/// Page size when the request does not set one
pub const DEFAULT_LIMIT: usize = 25;

/// In-memory stand-in for the platform
///
/// Everything is kept newest-first, the way the platform lists things.
pub struct MockServer {
    token: Option<String>,
    clock: i64,
    inline_replies: usize,
    subreddits: HashMap<String, DbSubreddit>,
    users: HashMap<String, DbUser>,
    posts: HashMap<FullId, Post>,
    comments: HashMap<FullId, Comment>,
    // parent full id -> replies, oldest first
    replies: HashMap<FullId, Vec<FullId>>,
    failures: VecDeque<(u16, String)>,
    requests: Vec<RecordedRequest>,
}

struct DbSubreddit {
    about: Subreddit,
    posts: Vec<FullId>,
    comments: Vec<FullId>,
}

struct DbUser {
    about: User,
    trophies: Vec<Trophy>,
}

/// What the HTTP layer saw of a request
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub user_agent: Option<String>,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// Whether the raw query string has `name=value`
    pub fn has_param(&self, name: &str, value: &str) -> bool {
        self.query.as_deref().map_or(false, |q| {
            q.split('&')
                .any(|kv| kv.split_once('=') == Some((name, value)))
        })
    }
}

/// Paging parameters, as sent by the client
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub after: Option<String>,
    pub before: Option<String>,
}

fn not_found(what: impl std::fmt::Display) -> Error {
    Error::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            token: None,
            clock: 1_600_000_000,
            inline_replies: usize::MAX,
            subreddits: HashMap::new(),
            users: HashMap::new(),
            posts: HashMap::new(),
            comments: HashMap::new(),
            replies: HashMap::new(),
            failures: VecDeque::new(),
            requests: Vec::new(),
        }
    }

    /// Only accept requests bearing `token`
    pub fn require_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Send at most `n` replies per parent along with a post, the others
    /// being hidden behind a "more" placeholder
    pub fn set_inline_replies(&mut self, n: usize) {
        self.inline_replies = n;
    }

    /// Make the next HTTP request fail with `status`
    pub fn fail_next(&mut self, status: u16, message: impl Into<String>) {
        self.failures.push_back((status, message.into()));
    }

    pub(crate) fn take_failure(&mut self) -> Option<Error> {
        self.failures
            .pop_front()
            .map(|(status, message)| Error::Api { status, message })
    }

    pub(crate) fn record(&mut self, req: RecordedRequest) {
        self.requests.push(req);
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    fn tick(&mut self) -> Option<api::Time> {
        self.clock += 1;
        Utc.timestamp_opt(self.clock, 0).single()
    }

    pub fn add_subreddit(&mut self, name: &str) -> Subreddit {
        let id = format!("sr{}", self.subreddits.len());
        let about = Subreddit {
            full_id: FullId::new(Kind::Subreddit, &id),
            id,
            created: self.tick(),
            url: format!("/r/{name}/"),
            name: name.to_string(),
            name_prefixed: format!("r/{name}"),
            title: name.to_string(),
            kind: String::from("public"),
            ..Subreddit::default()
        };
        self.subreddits.insert(
            name.to_lowercase(),
            DbSubreddit {
                about: about.clone(),
                posts: Vec::new(),
                comments: Vec::new(),
            },
        );
        about
    }

    fn subreddit_mut(&mut self, name: &str) -> Result<&mut DbSubreddit, Error> {
        self.subreddits
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| not_found(format!("subreddit {name}")))
    }

    fn subreddit_ref(&self, name: &str) -> Result<&DbSubreddit, Error> {
        self.subreddits
            .get(&name.to_lowercase())
            .ok_or_else(|| not_found(format!("subreddit {name}")))
    }

    /// Posts `title` as the newest post of `subreddit`
    pub fn add_post(&mut self, subreddit: &str, id: &str, title: &str) -> Result<Post, Error> {
        let created = self.tick();
        let sub = self.subreddit_mut(subreddit)?;
        let full_id = FullId::new(Kind::Post, id);
        let post = Post {
            id: id.to_string(),
            full_id: full_id.clone(),
            created,
            permalink: format!("/r/{}/comments/{id}/", sub.about.name),
            title: title.to_string(),
            subreddit_name: sub.about.name.clone(),
            subreddit_name_prefixed: sub.about.name_prefixed.clone(),
            subreddit_id: sub.about.full_id.to_string(),
            is_self_post: true,
            ..Post::default()
        };
        sub.posts.insert(0, full_id.clone());
        self.posts.insert(full_id, post.clone());
        Ok(post)
    }

    /// Replies to the post or comment `parent`
    pub fn add_comment(&mut self, parent: &FullId, id: &str, body: &str) -> Result<Comment, Error> {
        let post_id = match parent.kind_prefix() {
            Some("t3") if self.posts.contains_key(parent) => parent.clone(),
            Some("t1") => match self.comments.get(parent) {
                Some(c) => c.post_id.clone(),
                None => return Err(not_found(parent)),
            },
            _ => return Err(not_found(parent)),
        };
        let full_id = FullId::new(Kind::Comment, id);
        if self.comments.contains_key(&full_id) {
            return Err(Error::Api {
                status: 409,
                message: format!("{full_id} already exists"),
            });
        }
        let created = self.tick();
        let post = self.posts.get_mut(&post_id).ok_or_else(|| not_found(&post_id))?;
        post.number_of_comments += 1;
        let comment = Comment {
            id: id.to_string(),
            full_id: full_id.clone(),
            created,
            parent_id: parent.clone(),
            permalink: format!("{}{id}/", post.permalink),
            body: body.to_string(),
            subreddit_name: post.subreddit_name.clone(),
            subreddit_name_prefixed: post.subreddit_name_prefixed.clone(),
            subreddit_id: post.subreddit_id.clone(),
            post_id: post_id.clone(),
            post_title: post.title.clone(),
            post_permalink: post.permalink.clone(),
            ..Comment::default()
        };
        let subreddit = post.subreddit_name.clone();
        self.subreddit_mut(&subreddit)?
            .comments
            .insert(0, full_id.clone());
        self.replies
            .entry(parent.clone())
            .or_default()
            .push(full_id.clone());
        self.comments.insert(full_id, comment.clone());
        Ok(comment)
    }

    pub fn add_user(&mut self, name: &str) -> User {
        let about = User {
            id: format!("u{}", self.users.len()),
            name: name.to_string(),
            created: self.tick(),
            has_verified_email: true,
            ..User::default()
        };
        self.users.insert(
            name.to_lowercase(),
            DbUser {
                about: about.clone(),
                trophies: Vec::new(),
            },
        );
        about
    }

    pub fn add_trophy(&mut self, user: &str, name: &str) -> Result<Trophy, Error> {
        let granted_at = self.tick();
        let u = self
            .users
            .get_mut(&user.to_lowercase())
            .ok_or_else(|| not_found(format!("user {user}")))?;
        let trophy = Trophy {
            id: Some(format!("tr{}", u.trophies.len())),
            name: name.to_string(),
            granted_at,
            ..Trophy::default()
        };
        u.trophies.push(trophy.clone());
        Ok(trophy)
    }

    pub fn subreddit(&self, name: &str) -> Result<Subreddit, Error> {
        Ok(self.subreddit_ref(name)?.about.clone())
    }

    pub fn user(&self, name: &str) -> Result<User, Error> {
        self.users
            .get(&name.to_lowercase())
            .map(|u| u.about.clone())
            .ok_or_else(|| not_found(format!("user {name}")))
    }

    pub fn trophies(&self, user: &str) -> Result<TrophyList, Error> {
        self.users
            .get(&user.to_lowercase())
            .map(|u| TrophyList {
                trophies: u.trophies.clone(),
            })
            .ok_or_else(|| not_found(format!("user {user}")))
    }

    pub fn new_posts(&self, subreddit: &str, q: &PageQuery) -> Result<Listing, Error> {
        let sub = self.subreddit_ref(subreddit)?;
        Ok(page(&sub.posts, q, |id| {
            self.posts.get(id).cloned().map(Thing::Post)
        }))
    }

    pub fn subreddit_comments(&self, subreddit: &str, q: &PageQuery) -> Result<Listing, Error> {
        let sub = self.subreddit_ref(subreddit)?;
        Ok(page(&sub.comments, q, |id| {
            self.comments.get(id).cloned().map(Thing::Comment)
        }))
    }

    /// The post listing and the comment listing of a post's page
    pub fn post_and_comments(&self, id: &str) -> Result<(Listing, Listing), Error> {
        let full_id = FullId::new(Kind::Post, id);
        let post = self.posts.get(&full_id).ok_or_else(|| not_found(&full_id))?;
        let post = Listing::from_things([Thing::Post(post.clone())], None, None);
        let replies = self.render_replies(&full_id);
        let comments = Listing::from_things(
            (replies.comments.into_iter().map(Thing::Comment))
                .chain(replies.more.into_iter().map(Thing::More)),
            None,
            None,
        );
        Ok((post, comments))
    }

    fn render_replies(&self, parent: &FullId) -> Replies {
        let ids = self.replies.get(parent).map(|r| &r[..]).unwrap_or(&[]);
        let shown = std::cmp::min(ids.len(), self.inline_replies);
        let comments = ids[..shown]
            .iter()
            .filter_map(|id| {
                let mut c = self.comments.get(id)?.clone();
                c.replies = self.render_replies(id);
                Some(c)
            })
            .collect();
        let hidden = &ids[shown..];
        let more = hidden.first().map(|first| More {
            id: first.id().to_string(),
            full_id: first.clone(),
            parent_id: parent.clone(),
            count: hidden.iter().map(|id| 1 + self.descendants(id)).sum(),
            depth: 1,
            children: hidden.iter().map(|id| id.id().to_string()).collect(),
        });
        Replies { comments, more }
    }

    fn descendants(&self, id: &FullId) -> i64 {
        self.replies
            .get(id)
            .map_or(0, |r| r.iter().map(|c| 1 + self.descendants(c)).sum())
    }

    /// The requested comments and everything below them, flat and
    /// parent-first
    pub fn more_children(&self, link_id: &FullId, children: &[&str]) -> Result<Vec<Thing>, Error> {
        if !self.posts.contains_key(link_id) {
            return Err(not_found(link_id));
        }
        let mut res = Vec::new();
        for id in children {
            let id = FullId::new(Kind::Comment, id);
            match self.comments.get(&id) {
                Some(c) if c.post_id == *link_id => self.flatten(&id, &mut res),
                _ => tracing::debug!(%id, "skipping unknown child"),
            }
        }
        Ok(res)
    }

    fn flatten(&self, id: &FullId, out: &mut Vec<Thing>) {
        if let Some(c) = self.comments.get(id) {
            out.push(Thing::Comment(c.clone()));
            for r in self.replies.get(id).into_iter().flatten() {
                self.flatten(r, out);
            }
        }
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

fn page<F>(ids: &[FullId], q: &PageQuery, get: F) -> Listing
where
    F: Fn(&FullId) -> Option<Thing>,
{
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let position = |cursor: &str| ids.iter().position(|id| id.as_str() == cursor);
    let (start, end) = match (&q.after, &q.before) {
        (Some(after), _) => {
            let start = position(after).map_or(ids.len(), |p| p + 1);
            (start, std::cmp::min(start + limit, ids.len()))
        }
        (None, Some(before)) => {
            let end = position(before).unwrap_or(0);
            (end.saturating_sub(limit), end)
        }
        (None, None) => (0, std::cmp::min(limit, ids.len())),
    };
    let shown = &ids[start..end];
    let after = (end < ids.len()).then(|| shown.last().cloned()).flatten();
    let before = (start > 0).then(|| shown.first().cloned()).flatten();
    Listing::from_things(shown.iter().filter_map(get), after, before)
}

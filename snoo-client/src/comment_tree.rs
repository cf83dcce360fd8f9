use std::collections::HashMap;

use snoo_api::{self as api, Comment, FullId, Listing, More, Post, Replies};

use crate::{Client, Error};

/// Fetches the comments hidden behind a "more" placeholder
#[async_trait::async_trait]
pub trait MoreChildren: Sync {
    async fn more_children(&self, link_id: &FullId, children: &[String])
        -> Result<Listing, Error>;
}

#[async_trait::async_trait]
impl MoreChildren for Client {
    async fn more_children(
        &self,
        link_id: &FullId,
        children: &[String],
    ) -> Result<Listing, Error> {
        Client::more_children(self, link_id, children).await
    }
}

/// Reply tree below a post or a comment
///
/// Comments are stored flat, keyed by full id, with their `replies` emptied;
/// the tree shape lives in `children`. Each parent has at most one pending
/// "more" placeholder.
#[derive(Clone, Debug)]
pub struct CommentTree {
    root: FullId,
    link_id: FullId,
    nodes: HashMap<FullId, Comment>,
    children: HashMap<FullId, Vec<FullId>>,
    mores: HashMap<FullId, More>,
}

impl CommentTree {
    /// Empty tree below `root`, belonging to the post `link_id`
    pub fn new(root: FullId, link_id: FullId) -> CommentTree {
        CommentTree {
            root,
            link_id,
            nodes: HashMap::new(),
            children: HashMap::new(),
            mores: HashMap::new(),
        }
    }

    /// Tree below `comment`, holding the replies that came along with it
    pub fn from_comment(mut comment: Comment) -> CommentTree {
        let replies = std::mem::take(&mut comment.replies);
        let mut res = CommentTree::new(comment.full_id, comment.post_id);
        res.insert_replies(replies);
        res
    }

    pub fn root(&self) -> &FullId {
        &self.root
    }

    /// Post this tree belongs to
    pub fn link_id(&self) -> &FullId {
        &self.link_id
    }

    fn is_placed(&self, id: &FullId) -> bool {
        *id == self.root || self.nodes.contains_key(id)
    }

    /// Places `comment` below its parent, after its already-placed siblings,
    /// along with the replies it carries.
    ///
    /// Returns `false` if the comment was already placed, if it is the root
    /// itself, or if its parent is not part of the tree, in which case it is
    /// dropped. Parents are always
    /// sent before their children, so this only happens on foreign comments.
    pub fn insert_comment(&mut self, mut comment: Comment) -> bool {
        if self.nodes.contains_key(&comment.full_id) || comment.full_id == self.root {
            return false;
        }
        if !self.is_placed(&comment.parent_id) {
            tracing::debug!(
                comment = %comment.full_id,
                parent = %comment.parent_id,
                "dropping comment whose parent is not in the tree"
            );
            return false;
        }
        let replies = std::mem::take(&mut comment.replies);
        let id = comment.full_id.clone();
        self.children
            .entry(comment.parent_id.clone())
            .or_default()
            .push(id.clone());
        self.nodes.insert(id, comment);
        self.insert_replies(replies);
        true
    }

    /// Sets the pending placeholder of `more.parent_id`, replacing any
    /// previous one
    pub fn insert_more(&mut self, more: More) -> bool {
        if !self.is_placed(&more.parent_id) {
            tracing::debug!(
                more = %more.full_id,
                parent = %more.parent_id,
                "dropping placeholder whose parent is not in the tree"
            );
            return false;
        }
        self.mores.insert(more.parent_id.clone(), more);
        true
    }

    fn insert_replies(&mut self, replies: Replies) {
        for c in replies.comments {
            self.insert_comment(c);
        }
        if let Some(m) = replies.more {
            self.insert_more(m);
        }
    }

    /// Places all the comments then all the placeholders of `listing`
    pub fn extend(&mut self, listing: Listing) {
        let (comments, mores) = listing.into_comments_and_mores();
        for c in comments {
            self.insert_comment(c);
        }
        for m in mores {
            self.insert_more(m);
        }
    }

    /// Direct replies to `id`, in arrival order
    pub fn replies(&self, id: &FullId) -> Vec<&Comment> {
        self.children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    pub fn top_level(&self) -> Vec<&Comment> {
        self.replies(&self.root)
    }

    pub fn comment(&self, id: &FullId) -> Option<&Comment> {
        self.nodes.get(id)
    }

    /// Pending placeholder below `id`
    pub fn more(&self, id: &FullId) -> Option<&More> {
        self.mores.get(id)
    }

    pub fn has_more(&self, id: &FullId) -> bool {
        self.mores.get(id).map_or(false, |m| !m.is_empty())
    }

    /// Every placed comment, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &FullId> {
        self.nodes.keys()
    }

    pub fn contains(&self, id: &FullId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of placed comments, the root excluded
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Owned copies of the replies to `id`, with their own replies filled
    /// in recursively
    pub fn nested(&self, id: &FullId) -> Vec<Comment> {
        self.replies(id)
            .into_iter()
            .map(|c| {
                let mut c = c.clone();
                c.replies = Replies {
                    comments: self.nested(&c.full_id),
                    more: self.mores.get(&c.full_id).cloned(),
                };
                c
            })
            .collect()
    }

    /// Fetches the replies hidden behind the placeholder of `target` and
    /// splices them in.
    ///
    /// Does nothing if `target` has no pending placeholder. If the fetch
    /// fails, the placeholder is kept so that expansion can be retried.
    pub async fn load_more<F>(&mut self, fetcher: &F, target: &FullId) -> Result<(), Error>
    where
        F: ?Sized + MoreChildren,
    {
        if !self.is_placed(target) {
            return Err(api::Error::NoSuchTarget(target.clone()).into());
        }
        let more = match self.mores.remove(target) {
            Some(m) if !m.is_empty() => m,
            Some(m) => {
                self.mores.insert(target.clone(), m);
                return Ok(());
            }
            None => return Ok(()),
        };
        match fetcher.more_children(&self.link_id, &more.children).await {
            Ok(listing) => {
                tracing::debug!(
                    target = %target,
                    fetched = listing.len(),
                    "expanded placeholder"
                );
                self.extend(listing);
                Ok(())
            }
            Err(e) => {
                self.mores.insert(target.clone(), more);
                Err(e)
            }
        }
    }
}

/// A post along with the comment tree below it
#[derive(Clone, Debug)]
pub struct PostAndComments {
    pub post: Post,
    pub tree: CommentTree,
}

impl PostAndComments {
    /// Decodes the `[post listing, comment listing]` pair
    pub fn decode(body: &[u8]) -> Result<PostAndComments, api::Error> {
        let (post, comments) = api::decode_post_and_comments(body)?;
        let mut tree = CommentTree::new(post.full_id.clone(), post.full_id.clone());
        tree.extend(comments);
        Ok(PostAndComments { post, tree })
    }

    /// Whether some top-level comments still need fetching
    pub fn has_more(&self) -> bool {
        self.tree.has_more(self.tree.root())
    }

    pub async fn load_more<F>(&mut self, fetcher: &F, target: &FullId) -> Result<(), Error>
    where
        F: ?Sized + MoreChildren,
    {
        self.tree.load_more(fetcher, target).await
    }
}

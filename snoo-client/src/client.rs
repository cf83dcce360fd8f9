use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use snoo_api::{self as api, FullId, Listing, Subreddit, Thing, Trophy, User, MAX_LIMIT};

use crate::{comment_tree::PostAndComments, Config, Error};

/// Paging parameters of a listing request
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub after: Option<FullId>,
    pub before: Option<FullId>,
}

impl ListOptions {
    pub fn limit(mut self, limit: usize) -> ListOptions {
        self.limit = Some(limit);
        self
    }

    pub fn after(mut self, after: FullId) -> ListOptions {
        self.after = Some(after);
        self
    }

    pub fn before(mut self, before: FullId) -> ListOptions {
        self.before = Some(before);
        self
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut res = Vec::new();
        if let Some(limit) = self.limit {
            res.push(("limit", std::cmp::min(limit, MAX_LIMIT).to_string()));
        }
        if let Some(after) = &self.after {
            res.push(("after", after.to_string()));
        }
        if let Some(before) = &self.before {
            res.push(("before", before.to_string()));
        }
        res
    }
}

/// Handle to the platform's REST API
///
/// Cloning is cheap, clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    http: ClientWithMiddleware,
    base_url: String,
    token: Option<String>,
}

impl Client {
    pub fn new(config: Config) -> Result<Client, Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .build()?;
        let http = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Ok(Client {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw body of a successful `GET {base_url}/{path}`
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, Error> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(%url, ?query, "sending request");
        let mut req = self
            .http
            .get(&url)
            .query(&[("raw_json", "1")])
            .query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            tracing::debug!(%url, %status, "request failed");
            return Err(api::Error::parse(status.as_u16(), &body).into());
        }
        Ok(body.to_vec())
    }

    /// Fetches a single envelope
    pub async fn thing(&self, path: &str) -> Result<Thing, Error> {
        let body = self.get(path, &[]).await?;
        Ok(Thing::decode(&body)?)
    }

    pub async fn listing(&self, path: &str, opts: &ListOptions) -> Result<Listing, Error> {
        let body = self.get(path, &opts.query()).await?;
        Ok(Listing::decode(&body)?)
    }

    /// Walks the pages of a listing forward, starting from `opts`
    pub fn pages(&self, path: impl Into<String>, opts: ListOptions) -> Pages<'_> {
        Pages {
            client: self,
            path: path.into(),
            opts,
            budget: None,
            done: false,
        }
    }

    /// Newest posts of a subreddit first
    pub async fn new_posts(&self, subreddit: &str, opts: &ListOptions) -> Result<Listing, Error> {
        self.listing(&format!("r/{subreddit}/new"), opts).await
    }

    /// Newest comments of a subreddit first
    pub async fn subreddit_comments(
        &self,
        subreddit: &str,
        opts: &ListOptions,
    ) -> Result<Listing, Error> {
        self.listing(&format!("r/{subreddit}/comments"), opts).await
    }

    pub async fn subreddit(&self, name: &str) -> Result<Subreddit, Error> {
        Ok(self.thing(&format!("r/{name}/about")).await?.into_subreddit()?)
    }

    pub async fn user(&self, name: &str) -> Result<User, Error> {
        Ok(self.thing(&format!("user/{name}/about")).await?.into_user()?)
    }

    pub async fn trophies(&self, user: &str) -> Result<Vec<Trophy>, Error> {
        let list = self
            .thing(&format!("api/v1/user/{user}/trophies"))
            .await?
            .into_trophy_list()?;
        Ok(list.trophies)
    }

    /// A post along with its comment tree, `id` being either prefixed or not
    pub async fn post_and_comments(&self, id: &str) -> Result<PostAndComments, Error> {
        let id = id.strip_prefix("t3_").unwrap_or(id);
        let body = self.get(&format!("comments/{id}"), &[]).await?;
        Ok(PostAndComments::decode(&body)?)
    }

    /// Comments hidden behind a "more" placeholder, as a flat listing in
    /// parent-before-child order
    pub async fn more_children(
        &self,
        link_id: &FullId,
        children: &[String],
    ) -> Result<Listing, Error> {
        let query = [
            ("link_id", link_id.to_string()),
            ("children", children.join(",")),
            ("api_type", String::from("json")),
        ];
        let body = self.get("api/morechildren", &query).await?;
        Ok(api::decode_things(&body)?)
    }
}

/// Forward iteration over the pages of a listing
pub struct Pages<'a> {
    client: &'a Client,
    path: String,
    opts: ListOptions,
    budget: Option<usize>,
    done: bool,
}

impl<'a> Pages<'a> {
    /// Stop after `pages` more pages, even if the listing goes on
    pub fn max_pages(mut self, pages: usize) -> Pages<'a> {
        self.budget = Some(pages);
        self
    }

    /// `Ok(None)` once the previous page had no `after` cursor or the page
    /// budget ran out
    pub async fn next_page(&mut self) -> Result<Option<Listing>, Error> {
        if self.done || self.budget == Some(0) {
            return Ok(None);
        }
        let page = self.client.listing(&self.path, &self.opts).await?;
        if let Some(budget) = &mut self.budget {
            *budget -= 1;
        }
        self.opts.before = None;
        match page.after() {
            Some(after) => self.opts.after = Some(after.clone()),
            None => self.done = true,
        }
        Ok(Some(page))
    }
}

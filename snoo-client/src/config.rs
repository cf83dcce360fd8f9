use anyhow::Context;

pub const DEFAULT_BASE_URL: &str = "https://oauth.reddit.com";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Root every request path is appended to
    pub base_url: String,
    pub user_agent: String,
    /// Bearer token, obtained out-of-band
    pub token: Option<String>,
    /// Retries on transient failures, with exponential backoff
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            base_url: String::from(DEFAULT_BASE_URL),
            user_agent: format!("snoo/{}", env!("CARGO_PKG_VERSION")),
            token: None,
            max_retries: 3,
        }
    }
}

impl Config {
    /// Defaults, overridden by `SNOO_BASE_URL`, `SNOO_USER_AGENT`,
    /// `SNOO_TOKEN` and `SNOO_MAX_RETRIES` when set
    pub fn from_env() -> anyhow::Result<Config> {
        let mut res = Config::default();
        if let Ok(url) = std::env::var("SNOO_BASE_URL") {
            res.base_url = url;
        }
        if let Ok(ua) = std::env::var("SNOO_USER_AGENT") {
            res.user_agent = ua;
        }
        if let Ok(tok) = std::env::var("SNOO_TOKEN") {
            res.token = Some(tok);
        }
        if let Ok(retries) = std::env::var("SNOO_MAX_RETRIES") {
            res.max_retries = retries
                .parse()
                .context("parsing SNOO_MAX_RETRIES as a number")?;
        }
        Ok(res)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Config {
        self.base_url = url.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Config {
        self.user_agent = ua.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Config {
        self.token = Some(token.into());
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Config {
        self.max_retries = retries;
        self
    }
}

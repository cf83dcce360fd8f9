use snoo_api as api;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] api::Error),

    #[error("Failed sending request: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("Failed reading response: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether trying the same request again later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Api(e) => e.is_transient(),
            Error::Transport(reqwest_middleware::Error::Reqwest(e)) | Error::Http(e) => {
                e.is_timeout() || e.is_connect()
            }
            Error::Transport(_) => false,
        }
    }

    /// The decode or server error, if this is one
    pub fn api(&self) -> Option<&api::Error> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

use std::time::Duration;

use snoo_client::{
    api::{FullId, Kind},
    Client, Config,
};
use snoo_mock_server::{MockServer, SharedMock};

pub const TOKEN: &str = "test-token";
pub const USER_AGENT: &str = "snoo-tests/0.1";

pub const NUM_POSTS: usize = 30;
pub const REPLIES_PER_LEVEL: usize = 3;
pub const TREE_DEPTH: usize = 3;

/// Installs a log subscriber if `RUST_LOG` asks for one
pub fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }
}

/// Subreddit `rust` with posts `p1` (oldest) to `p{NUM_POSTS}`; `p1` has a
/// full comment tree, and user `alice` has two trophies
pub fn populated() -> MockServer {
    let mut mock = MockServer::new();
    mock.require_token(TOKEN);
    mock.add_subreddit("rust");
    for i in 1..=NUM_POSTS {
        mock.add_post("rust", &format!("p{i}"), &format!("Post number {i}"))
            .expect("adding post to existing subreddit");
    }
    add_replies(&mut mock, &FullId::new(Kind::Post, "p1"), "c", TREE_DEPTH);
    mock.add_user("alice");
    mock.add_trophy("alice", "Verified Email")
        .expect("adding trophy to existing user");
    mock.add_trophy("alice", "Five-Year Club")
        .expect("adding trophy to existing user");
    mock
}

// comment ids spell out their path in the tree: c0, c0_1, c0_1_2...
fn add_replies(mock: &mut MockServer, parent: &FullId, prefix: &str, depth: usize) {
    if depth == 0 {
        return;
    }
    for i in 0..REPLIES_PER_LEVEL {
        let id = if prefix == "c" {
            format!("c{i}")
        } else {
            format!("{prefix}_{i}")
        };
        let c = mock
            .add_comment(parent, &id, &format!("comment {id}"))
            .expect("replying to existing thing");
        add_replies(mock, &c.full_id, &id, depth - 1);
    }
}

/// Number of comments `populated` puts below `p1`
pub fn tree_size() -> usize {
    (1..=TREE_DEPTH).map(|d| REPLIES_PER_LEVEL.pow(d as u32)).sum()
}

/// Client configured for a mock served at `addr`
pub fn client_for(addr: std::net::SocketAddr, retries: u32) -> Client {
    let config = Config::default()
        .base_url(format!("http://{addr}"))
        .user_agent(USER_AGENT)
        .token(TOKEN)
        .max_retries(retries);
    Client::new(config).expect("building client")
}

/// Serves `mock` and returns a client talking to it, without retries
pub async fn start(mock: MockServer) -> (Client, SharedMock) {
    init_tracing();
    let (addr, mock) = snoo_mock_server::serve(mock)
        .await
        .expect("serving mock server");
    (client_for(addr, 0), mock)
}

/// Receives the next item, failing the test if it takes too long
pub async fn next<T>(rx: &mut tokio::sync::mpsc::UnboundedReceiver<T>) -> Option<T> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for the stream")
}

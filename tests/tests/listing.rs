use snoo_client::{
    api::{self, FullId},
    ListOptions,
};
use snoo_mock_server::MockServer;
use tests::{populated, start, NUM_POSTS, TOKEN, USER_AGENT};

#[tokio::test]
async fn newest_posts_first() {
    let (client, _mock) = start(populated()).await;
    let page = client
        .new_posts("rust", &ListOptions::default().limit(3))
        .await
        .unwrap();
    let ids = page
        .posts()
        .iter()
        .map(|p| p.full_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["t3_p30", "t3_p29", "t3_p28"]);
    assert_eq!(page.after(), Some(&FullId::from("t3_p28")));
    assert!(page.comments().is_empty());
}

#[tokio::test]
async fn requests_carry_client_identity() {
    let (client, mock) = start(populated()).await;
    client
        .new_posts("rust", &ListOptions::default().limit(500))
        .await
        .unwrap();
    let mock = mock.lock();
    let req = mock.requests().last().unwrap();
    assert_eq!(req.path, "/r/rust/new");
    assert!(req.has_param("raw_json", "1"));
    // above the platform maximum
    assert!(req.has_param("limit", "100"));
    assert_eq!(req.user_agent.as_deref(), Some(USER_AGENT));
    assert_eq!(
        req.authorization.as_deref(),
        Some(format!("Bearer {TOKEN}").as_str())
    );
}

#[tokio::test]
async fn walks_every_page() {
    let (client, _mock) = start(populated()).await;
    let mut pages = client.pages("r/rust/new", ListOptions::default().limit(7));
    let mut seen = Vec::new();
    let mut num_pages = 0;
    while let Some(page) = pages.next_page().await.unwrap() {
        num_pages += 1;
        seen.extend(page.into_posts().into_iter().map(|p| p.id));
    }
    assert_eq!(num_pages, 5);
    assert_eq!(seen.len(), NUM_POSTS);
    assert_eq!(seen.first().map(|s| s.as_str()), Some("p30"));
    assert_eq!(seen.last().map(|s| s.as_str()), Some("p1"));
    // exhausted for good
    assert!(pages.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn page_budget() {
    let (client, _mock) = start(populated()).await;
    let mut pages = client
        .pages("r/rust/new", ListOptions::default().limit(5))
        .max_pages(2);
    assert_eq!(pages.next_page().await.unwrap().unwrap().len(), 5);
    let second = pages.next_page().await.unwrap().unwrap();
    assert_eq!(second.posts()[0].id, "p25");
    assert!(pages.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn single_things() {
    let (client, _mock) = start(populated()).await;

    let sub = client.subreddit("rust").await.unwrap();
    assert_eq!(sub.name, "rust");
    assert!(sub.full_id.is_kind(api::Kind::Subreddit));

    let user = client.user("alice").await.unwrap();
    assert_eq!(user.name, "alice");
    assert!(user.has_verified_email);

    let trophies = client.trophies("alice").await.unwrap();
    assert_eq!(
        trophies.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        vec!["Verified Email", "Five-Year Club"]
    );
}

#[tokio::test]
async fn api_errors() {
    let (client, mock) = start(populated()).await;

    let err = client.subreddit("golang").await.unwrap_err();
    assert_eq!(err.api().and_then(|e| e.status_code()), Some(404));
    assert!(!err.is_transient());

    mock.lock().fail_next(503, "try again later");
    let err = client
        .new_posts("rust", &ListOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.api(),
        Some(&api::Error::Api {
            status: 503,
            message: String::from("try again later"),
        })
    );
    assert!(err.is_transient());

    // the failure was consumed
    client
        .new_posts("rust", &ListOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let mut mock = MockServer::new();
    mock.require_token("another-token");
    mock.add_subreddit("rust");
    let (client, _mock) = start(mock).await;
    let err = client.subreddit("rust").await.unwrap_err();
    assert_eq!(err.api().and_then(|e| e.status_code()), Some(401));
}

#[tokio::test]
async fn transient_failures_are_retried() {
    tests::init_tracing();
    let (addr, mock) = snoo_mock_server::serve(populated()).await.unwrap();
    let client = tests::client_for(addr, 2);
    mock.lock().fail_next(502, "bad gateway");
    let sub = client.subreddit("rust").await.unwrap();
    assert_eq!(sub.name, "rust");
    assert_eq!(mock.lock().requests().len(), 2);
}

use std::{sync::atomic::Ordering, time::Duration};

use snoo_client::{
    api::{self, FullId, Kind, Post},
    stream::{self, Dedup},
    StreamConfig, StreamState,
};
use snoo_mock_server::ScriptedSource;
use tests::{next, populated, start};

fn post(id: &str) -> Post {
    Post {
        id: id.to_string(),
        full_id: FullId::new(Kind::Post, id),
        ..Post::default()
    }
}

fn page(ids: &[&str]) -> Result<Vec<Post>, api::Error> {
    Ok(ids.iter().map(|id| post(id)).collect())
}

fn fast() -> StreamConfig {
    StreamConfig::default().interval(Duration::from_millis(10))
}

#[tokio::test]
async fn scripted_post_stream() {
    tests::init_tracing();
    for (discard_initial, first) in [(false, 1), (true, 3)] {
        let source = ScriptedSource::new(vec![
            page(&["p1", "p2"]),
            page(&["p3", "p1"]),
            page(&["p4", "p5", "p6"]),
            page(&["p7", "p8", "p9", "p10", "p11", "p12"]),
        ]);
        let (mut posts, _errors, stop) = stream::start(
            source,
            Dedup::StopAtSeen,
            fast().max_rounds(4).discard_initial(discard_initial),
        );
        let mut got = Vec::new();
        while let Some(p) = next(&mut posts).await {
            got.push(p.id);
        }
        let expected = (first..=12).map(|i| format!("p{i}")).collect::<Vec<_>>();
        assert_eq!(got, expected, "discard_initial = {discard_initial}");
        assert_eq!(stop.state(), StreamState::Stopped);
    }
}

#[tokio::test]
async fn new_posts_over_http() {
    let (client, mock) = start(populated()).await;
    let (mut posts, mut errors, stop) =
        client.stream_posts("rust", fast().discard_initial(true));

    // a second request means the initial round went through
    while mock.lock().requests().len() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    mock.lock().add_post("rust", "fresh", "Fresh post").unwrap();
    assert_eq!(next(&mut posts).await.map(|p| p.id), Some(String::from("fresh")));

    mock.lock().fail_next(503, "overloaded");
    let err = next(&mut errors).await.unwrap();
    assert!(err.is_transient());

    mock.lock().add_post("rust", "fresher", "Fresher post").unwrap();
    assert_eq!(
        next(&mut posts).await.map(|p| p.id),
        Some(String::from("fresher"))
    );

    stop.stop();
    assert!(stop.is_stopped());
    assert!(next(&mut posts).await.is_none());
    assert!(next(&mut errors).await.is_none());
}

#[tokio::test]
async fn new_comments_over_http() {
    let (client, mock) = start(populated()).await;
    let (mut comments, _errors, stop) =
        client.stream_comments("rust", fast().discard_initial(true));

    while mock.lock().requests().len() < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let parent = FullId::new(Kind::Post, "p2");
    mock.lock().add_comment(&parent, "n1", "first!").unwrap();
    mock.lock().add_comment(&parent, "n2", "second").unwrap();

    let mut got = Vec::new();
    while got.len() < 2 {
        got.push(next(&mut comments).await.unwrap().id);
    }
    got.sort();
    assert_eq!(got, vec![String::from("n1"), String::from("n2")]);
    stop.stop();
}

#[tokio::test]
async fn round_limit_counts_failures() {
    let source = ScriptedSource::new(vec![
        Err(api::Error::Api {
            status: 500,
            message: String::from("down"),
        }),
        page(&["p1"]),
    ]);
    let fetches = source.fetch_counter();
    let (mut posts, mut errors, stop) =
        stream::start(source, Dedup::StopAtSeen, fast().max_rounds(2));
    let err = next(&mut errors).await.unwrap();
    assert_eq!(err.api().and_then(|e| e.status_code()), Some(500));
    assert_eq!(next(&mut posts).await.map(|p| p.id), Some(String::from("p1")));
    assert!(next(&mut posts).await.is_none());
    assert_eq!(stop.state(), StreamState::Stopped);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    // stopping a finished stream is a no-op
    stop.stop();
    assert_eq!(stop.state(), StreamState::Stopped);
}

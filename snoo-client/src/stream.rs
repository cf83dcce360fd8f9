use std::{collections::HashSet, sync::Arc, time::Duration};

use parking_lot::Mutex;
use snoo_api::{Comment, FullId, Identified, Post, MAX_LIMIT};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{BoundedOrderSet, Client, Error, ListOptions};

/// How many post ids a post stream remembers
pub const POST_SEEN_CAPACITY: usize = 2000;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamConfig {
    interval: Duration,
    discard_initial: bool,
    max_rounds: Option<usize>,
}

impl Default for StreamConfig {
    fn default() -> StreamConfig {
        StreamConfig {
            interval: DEFAULT_INTERVAL,
            discard_initial: false,
            max_rounds: None,
        }
    }
}

impl StreamConfig {
    /// Time between the start of two polling rounds
    pub fn interval(mut self, interval: Duration) -> StreamConfig {
        self.interval = interval;
        self
    }

    /// Only remember the items of the first successful round, without
    /// emitting them
    pub fn discard_initial(mut self, discard: bool) -> StreamConfig {
        self.discard_initial = discard;
        self
    }

    /// Stop by itself after this many rounds, failed ones included; 0 means
    /// no limit
    pub fn max_rounds(mut self, rounds: usize) -> StreamConfig {
        self.max_rounds = (rounds > 0).then_some(rounds);
        self
    }
}

/// One page of the newest items of some feed, newest first
#[async_trait::async_trait]
pub trait PageSource: 'static + Send + Sync {
    type Item: 'static + Identified + Send;

    async fn fetch_latest(&self) -> Result<Vec<Self::Item>, Error>;
}

pub struct NewPosts {
    pub client: Client,
    pub subreddit: String,
}

#[async_trait::async_trait]
impl PageSource for NewPosts {
    type Item = Post;

    async fn fetch_latest(&self) -> Result<Vec<Post>, Error> {
        let opts = ListOptions::default().limit(MAX_LIMIT);
        Ok(self
            .client
            .new_posts(&self.subreddit, &opts)
            .await?
            .into_posts())
    }
}

pub struct NewComments {
    pub client: Client,
    pub subreddit: String,
}

#[async_trait::async_trait]
impl PageSource for NewComments {
    type Item = Comment;

    async fn fetch_latest(&self) -> Result<Vec<Comment>, Error> {
        let opts = ListOptions::default().limit(MAX_LIMIT);
        Ok(self
            .client
            .subreddit_comments(&self.subreddit, &opts)
            .await?
            .into_comments())
    }
}

/// How a page is scanned for items not emitted yet
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dedup {
    /// Stop at the first already-seen item, remembering the last
    /// `POST_SEEN_CAPACITY` ids
    StopAtSeen,
    /// Look at every item, remembering every id ever seen
    ScanAll,
}

enum Seen {
    Bounded(BoundedOrderSet<FullId>),
    Unbounded(HashSet<FullId>),
}

impl Seen {
    fn new(dedup: Dedup) -> Seen {
        match dedup {
            Dedup::StopAtSeen => Seen::Bounded(BoundedOrderSet::new(POST_SEEN_CAPACITY)),
            Dedup::ScanAll => Seen::Unbounded(HashSet::new()),
        }
    }

    /// Marks the unseen items of `page` as seen and returns them
    fn scan<T: Identified>(&mut self, page: Vec<T>) -> Vec<T> {
        let mut res = Vec::new();
        for item in page {
            let id = item.full_id();
            match self {
                Seen::Bounded(s) if s.exists(&id) => break,
                Seen::Bounded(s) => s.add(id),
                Seen::Unbounded(s) if s.contains(&id) => continue,
                Seen::Unbounded(s) => {
                    s.insert(id);
                }
            }
            res.push(item);
        }
        res
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamState {
    Running,
    /// Stop was requested, the polling task has not noticed yet
    Stopping,
    Stopped,
}

struct Outputs<T> {
    state: StreamState,
    items: Option<UnboundedSender<T>>,
    errors: Option<UnboundedSender<Error>>,
}

struct Control<T> {
    outputs: Mutex<Outputs<T>>,
    cancel: CancellationToken,
}

impl<T> Control<T> {
    fn emit_item(&self, item: T) {
        let o = self.outputs.lock();
        if let (StreamState::Running, Some(items)) = (o.state, &o.items) {
            if items.send(item).is_err() {
                tracing::debug!("item receiver dropped, discarding item");
            }
        }
    }

    fn emit_error(&self, err: Error) {
        let o = self.outputs.lock();
        if let (StreamState::Running, Some(errors)) = (o.state, &o.errors) {
            if errors.send(err).is_err() {
                tracing::debug!("error receiver dropped, discarding error");
            }
        }
    }

    fn receivers_dropped(&self) -> bool {
        let o = self.outputs.lock();
        o.items.as_ref().map_or(true, |s| s.is_closed())
            && o.errors.as_ref().map_or(true, |s| s.is_closed())
    }

    fn finish(&self) {
        let mut o = self.outputs.lock();
        o.state = StreamState::Stopped;
        o.items = None;
        o.errors = None;
    }
}

trait Stop: Send + Sync {
    fn stop(&self);
    fn state(&self) -> StreamState;
}

impl<T: Send> Stop for Control<T> {
    fn stop(&self) {
        let mut o = self.outputs.lock();
        if o.state != StreamState::Running {
            return;
        }
        o.state = StreamState::Stopping;
        // dropping the senders closes both queues
        o.items = None;
        o.errors = None;
        self.cancel.cancel();
    }

    fn state(&self) -> StreamState {
        self.outputs.lock().state
    }
}

/// Stops the stream it was returned with
///
/// Stopping closes both queues right away. A fetch already in flight is
/// left to finish, but its result is discarded.
#[derive(Clone)]
pub struct StopHandle {
    control: Arc<dyn Stop>,
}

impl StopHandle {
    /// Idempotent
    pub fn stop(&self) {
        self.control.stop()
    }

    pub fn state(&self) -> StreamState {
        self.control.state()
    }

    /// Whether the stream will never emit anything anymore
    pub fn is_stopped(&self) -> bool {
        self.state() != StreamState::Running
    }
}

/// Items and errors of a running stream, and the handle to stop it
pub type Stream<T> = (UnboundedReceiver<T>, UnboundedReceiver<Error>, StopHandle);

/// Polls `source` in a background task until stopped
///
/// The first round runs right away. Must be called from within a tokio
/// runtime.
pub fn start<S: PageSource>(source: S, dedup: Dedup, config: StreamConfig) -> Stream<S::Item> {
    let (items_tx, items_rx) = mpsc::unbounded_channel();
    let (errors_tx, errors_rx) = mpsc::unbounded_channel();
    let control = Arc::new(Control {
        outputs: Mutex::new(Outputs {
            state: StreamState::Running,
            items: Some(items_tx),
            errors: Some(errors_tx),
        }),
        cancel: CancellationToken::new(),
    });
    tokio::spawn(run(source, dedup, config, control.clone()));
    (items_rx, errors_rx, StopHandle { control })
}

async fn run<S: PageSource>(
    source: S,
    dedup: Dedup,
    config: StreamConfig,
    control: Arc<Control<S::Item>>,
) {
    tracing::info!(?dedup, ?config, "starting stream");
    let mut seen = Seen::new(dedup);
    let mut discard = config.discard_initial;
    let mut rounds = 0;
    let mut ticker = tokio::time::interval(config.interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = control.cancel.cancelled() => break,
            _ = ticker.tick() => (),
        }
        let res = source.fetch_latest().await;
        rounds += 1;
        if control.cancel.is_cancelled() {
            tracing::debug!("stream stopped during fetch, discarding its result");
            break;
        }
        match res {
            Err(e) => {
                tracing::warn!(error = %e, round = rounds, "stream fetch failed");
                control.emit_error(e);
            }
            Ok(page) => {
                let fresh = seen.scan(page);
                if discard {
                    tracing::debug!(discarded = fresh.len(), "discarding initial page");
                    discard = false;
                } else {
                    for item in fresh {
                        control.emit_item(item);
                    }
                }
            }
        }
        if config.max_rounds.map_or(false, |max| rounds >= max) {
            tracing::debug!(rounds, "stream reached its round limit");
            break;
        }
        if control.receivers_dropped() {
            tracing::debug!("stream receivers dropped");
            break;
        }
    }
    control.finish();
    tracing::info!(rounds, "stream stopped");
}

impl Client {
    /// Newest posts of `subreddit`, as they get posted
    pub fn stream_posts(&self, subreddit: &str, config: StreamConfig) -> Stream<Post> {
        let source = NewPosts {
            client: self.clone(),
            subreddit: subreddit.to_string(),
        };
        start(source, Dedup::StopAtSeen, config)
    }

    /// Newest comments of `subreddit`, as they get posted
    pub fn stream_comments(&self, subreddit: &str, config: StreamConfig) -> Stream<Comment> {
        let source = NewComments {
            client: self.clone(),
            subreddit: subreddit.to_string(),
        };
        start(source, Dedup::ScanAll, config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use snoo_api as api;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(&'static str);

    impl Identified for Item {
        fn full_id(&self) -> FullId {
            FullId::from(self.0)
        }
    }

    /// Hands out one scripted page per round, then empty pages
    struct Script(Mutex<VecDeque<Result<Vec<&'static str>, u16>>>);

    impl Script {
        fn new(pages: Vec<Result<Vec<&'static str>, u16>>) -> Script {
            Script(Mutex::new(pages.into()))
        }
    }

    #[async_trait::async_trait]
    impl PageSource for Script {
        type Item = Item;

        async fn fetch_latest(&self) -> Result<Vec<Item>, Error> {
            match self.0.lock().pop_front() {
                None => Ok(Vec::new()),
                Some(Ok(page)) => Ok(page.into_iter().map(Item).collect()),
                Some(Err(status)) => Err(api::Error::Api {
                    status,
                    message: String::from("scripted failure"),
                }
                .into()),
            }
        }
    }

    fn pages() -> Vec<Result<Vec<&'static str>, u16>> {
        vec![
            Ok(vec!["p1", "p2"]),
            Ok(vec!["p3", "p1"]),
            Ok(vec!["p4", "p5", "p6"]),
            Ok(vec!["p7", "p8", "p9", "p10", "p11", "p12"]),
        ]
    }

    fn fast() -> StreamConfig {
        StreamConfig::default().interval(Duration::from_millis(1))
    }

    async fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
        let mut res = Vec::new();
        while let Some(i) = rx.recv().await {
            res.push(i);
        }
        res
    }

    fn names(items: Vec<Item>) -> Vec<&'static str> {
        items.into_iter().map(|i| i.0).collect()
    }

    #[tokio::test]
    async fn emits_each_post_once() {
        let (mut items, _errors, stop) =
            start(Script::new(pages()), Dedup::StopAtSeen, fast().max_rounds(4));
        let got = names(drain(&mut items).await);
        assert_eq!(
            got,
            vec!["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9", "p10", "p11", "p12"]
        );
        assert_eq!(stop.state(), StreamState::Stopped);
    }

    #[tokio::test]
    async fn discards_first_page() {
        let (mut items, _errors, _stop) = start(
            Script::new(pages()),
            Dedup::StopAtSeen,
            fast().max_rounds(4).discard_initial(true),
        );
        let got = names(drain(&mut items).await);
        assert_eq!(
            got,
            vec!["p3", "p4", "p5", "p6", "p7", "p8", "p9", "p10", "p11", "p12"]
        );
    }

    #[tokio::test]
    async fn stop_at_seen_skips_older_unseen_items() {
        let (mut items, _errors, _stop) = start(
            Script::new(vec![Ok(vec!["b", "a"]), Ok(vec!["d", "b", "c"])]),
            Dedup::StopAtSeen,
            fast().max_rounds(2),
        );
        assert_eq!(names(drain(&mut items).await), vec!["b", "a", "d"]);

        let (mut items, _errors, _stop) = start(
            Script::new(vec![Ok(vec!["b", "a"]), Ok(vec!["d", "b", "c"])]),
            Dedup::ScanAll,
            fast().max_rounds(2),
        );
        assert_eq!(names(drain(&mut items).await), vec!["b", "a", "d", "c"]);
    }

    #[tokio::test]
    async fn errors_go_to_their_own_queue() {
        let (mut items, mut errors, _stop) = start(
            Script::new(vec![Err(503), Ok(vec!["a"]), Err(429)]),
            Dedup::ScanAll,
            fast().max_rounds(3).discard_initial(true),
        );
        // the failed round does not count as the initial page
        assert!(drain(&mut items).await.is_empty());
        let errors = drain(&mut errors).await;
        assert_eq!(
            errors
                .iter()
                .map(|e| e.api().and_then(|e| e.status_code()))
                .collect::<Vec<_>>(),
            vec![Some(503), Some(429)]
        );
    }

    #[tokio::test]
    async fn stop_closes_queues_once() {
        let (mut items, mut errors, stop) = start(
            Script::new(vec![Ok(vec!["a"])]),
            Dedup::ScanAll,
            StreamConfig::default().interval(Duration::from_secs(3600)),
        );
        assert_eq!(items.recv().await.map(|i| i.0), Some("a"));
        assert_eq!(stop.state(), StreamState::Running);
        stop.stop();
        assert!(stop.is_stopped());
        stop.stop();
        stop.clone().stop();
        assert_eq!(items.recv().await, None);
        assert!(errors.recv().await.is_none());
        for _ in 0..100 {
            if stop.state() == StreamState::Stopped {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(stop.state(), StreamState::Stopped);
    }

    #[tokio::test]
    async fn zero_round_limit_is_unbounded() {
        let pages = ["r1", "r2", "r3", "r4", "r5", "r6"]
            .into_iter()
            .map(|id| Ok(vec![id]))
            .collect();
        let (mut items, _errors, stop) =
            start(Script::new(pages), Dedup::ScanAll, fast().max_rounds(0));
        let mut got = Vec::new();
        while got.len() < 6 {
            got.push(items.recv().await.expect("stream ended early").0);
        }
        assert_eq!(got, vec!["r1", "r2", "r3", "r4", "r5", "r6"]);
        assert_eq!(stop.state(), StreamState::Running);
        stop.stop();
    }

    #[test]
    fn seen_sets() {
        let mut s = Seen::new(Dedup::StopAtSeen);
        assert_eq!(s.scan(vec![Item("a"), Item("b")]), vec![Item("a"), Item("b")]);
        assert_eq!(s.scan(vec![Item("c"), Item("a"), Item("d")]), vec![Item("c")]);
        match &s {
            Seen::Bounded(b) => assert_eq!(b.capacity(), POST_SEEN_CAPACITY),
            Seen::Unbounded(_) => panic!("post streams must be bounded"),
        }
    }
}

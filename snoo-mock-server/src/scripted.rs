use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use snoo_client::{api, stream::PageSource, Error};

/// Stream source handing out one scripted page per round
///
/// Once the script runs out, every round sees an empty page.
pub struct ScriptedSource<T> {
    pages: Mutex<VecDeque<Result<Vec<T>, api::Error>>>,
    fetches: Arc<AtomicUsize>,
}

impl<T> ScriptedSource<T> {
    pub fn new(pages: Vec<Result<Vec<T>, api::Error>>) -> ScriptedSource<T> {
        ScriptedSource {
            pages: Mutex::new(pages.into()),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counts the rounds run so far, still readable once the source was
    /// handed to a stream
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        self.fetches.clone()
    }
}

#[async_trait::async_trait]
impl<T> PageSource for ScriptedSource<T>
where
    T: 'static + api::Identified + Send,
{
    type Item = T;

    async fn fetch_latest(&self) -> Result<Vec<T>, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.pages.lock().pop_front() {
            None => Ok(Vec::new()),
            Some(page) => Ok(page?),
        }
    }
}

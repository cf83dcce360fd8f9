use std::{
    borrow::Borrow,
    collections::{HashSet, VecDeque},
    hash::Hash,
};

use parking_lot::Mutex;

/// Set that only remembers its `capacity` most recently added keys
///
/// Adding an already-present key changes neither the length nor the order in
/// which keys get evicted.
#[derive(Debug)]
pub struct BoundedOrderSet<K> {
    capacity: usize,
    inner: Mutex<Inner<K>>,
}

#[derive(Debug)]
struct Inner<K> {
    keys: HashSet<K>,
    order: VecDeque<K>,
}

impl<K: Clone + Eq + Hash> BoundedOrderSet<K> {
    pub fn new(capacity: usize) -> BoundedOrderSet<K> {
        BoundedOrderSet {
            capacity,
            inner: Mutex::new(Inner {
                keys: HashSet::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn add(&self, key: K) {
        let mut inner = self.inner.lock();
        if inner.keys.contains(&key) {
            return;
        }
        inner.keys.insert(key.clone());
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(old) = inner.order.pop_front() {
                inner.keys.remove(&old);
            }
        }
    }

    pub fn exists<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        self.inner.lock().keys.contains(key)
    }

    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq + Hash,
    {
        let mut inner = self.inner.lock();
        if inner.keys.remove(key) {
            inner.order.retain(|k| k.borrow() != key);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

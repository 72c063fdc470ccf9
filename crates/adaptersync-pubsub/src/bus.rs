//! In-process distribution channel.
//!
//! A [`Bus`] holds the current value of every key on every topic and fans
//! changes out to the feeds attached to that topic. Changes to one topic are
//! applied and delivered under the topic's lock, so every feed observes them
//! in the same order.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::transport::{ChangeSender, ChangeToken, Feed, Transport};

/// Prefix of the sled tree backing a topic.
const TOPIC_TREE_PREFIX: &str = "topic/";

/// A feed attached to a topic.
struct FeedEntry {
    id: u64,
    tx: ChangeSender,
    active: bool,
}

/// Current contents and attached feeds of one topic.
struct TopicState {
    items: BTreeMap<String, Value>,
    feeds: Vec<FeedEntry>,
    tree: Option<sled::Tree>,
}

impl TopicState {
    /// Create topic state, reloading persisted items when a store is present.
    fn load(db: Option<&sled::Db>, topic: &str) -> Result<Self, Error> {
        let mut items = BTreeMap::new();
        let tree = match db {
            Some(db) => {
                let tree = db.open_tree(format!("{TOPIC_TREE_PREFIX}{topic}"))?;
                for entry in tree.iter() {
                    let (key, value) = entry?;
                    let key = String::from_utf8_lossy(&key).into_owned();
                    items.insert(key, serde_json::from_slice(&value)?);
                }
                if !items.is_empty() {
                    tracing::debug!(topic, items = items.len(), "reloaded persisted topic");
                }
                Some(tree)
            }
            None => None,
        };

        Ok(Self {
            items,
            feeds: Vec::new(),
            tree,
        })
    }

    /// Deliver a token to every active feed, pruning feeds whose receiver is gone.
    fn notify(&mut self, token: &ChangeToken) {
        self.feeds.retain(|feed| {
            if feed.tx.is_closed() {
                return false;
            }
            !feed.active || feed.tx.send(token.clone()).is_ok()
        });
    }
}

struct Inner {
    topics: DashMap<String, TopicState>,
    next_feed_id: AtomicU64,
    closed: AtomicBool,
    db: Option<sled::Db>,
}

/// Shared in-process distribution channel.
///
/// Cloning is cheap; clones share the same topics.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Bus {
    /// Create an in-memory bus.
    pub fn new() -> Self {
        Self::with_db(None)
    }

    /// Open a bus whose topics persist in a sled database at `path`.
    pub fn open_persistent(path: impl AsRef<Path>) -> Result<Self, Error> {
        let db = sled::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "opened persistent bus");
        Ok(Self::with_db(Some(db)))
    }

    fn with_db(db: Option<sled::Db>) -> Self {
        Self {
            inner: Arc::new(Inner {
                topics: DashMap::new(),
                next_feed_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
                db,
            }),
        }
    }

    /// Publish or replace the value of `key` on `topic`.
    pub fn publish(&self, topic: &str, key: &str, value: Value) -> Result<(), Error> {
        validate_name("key", key)?;
        let mut state = self.topic_mut(topic)?;

        if let Some(tree) = &state.tree {
            tree.insert(key.as_bytes(), serde_json::to_vec(&value)?)?;
        }
        state.items.insert(key.to_string(), value.clone());
        state.notify(&ChangeToken::modify(key, value));

        tracing::trace!(topic, key, "published");
        Ok(())
    }

    /// Retract `key` from `topic`.
    pub fn unpublish(&self, topic: &str, key: &str) -> Result<(), Error> {
        validate_name("key", key)?;
        let mut state = self.topic_mut(topic)?;

        if !state.items.contains_key(key) {
            return Err(Error::NotFound {
                topic: topic.to_string(),
                key: key.to_string(),
            });
        }
        if let Some(tree) = &state.tree {
            tree.remove(key.as_bytes())?;
        }
        let previous = state.items.remove(key).unwrap_or(Value::Null);
        state.notify(&ChangeToken::delete(key, previous));

        tracing::trace!(topic, key, "unpublished");
        Ok(())
    }

    /// Current value of `key` on `topic`.
    pub fn get(&self, topic: &str, key: &str) -> Option<Value> {
        self.inner
            .topics
            .get(topic)
            .and_then(|state| state.items.get(key).cloned())
    }

    /// Keys currently published on `topic`, in order.
    pub fn keys(&self, topic: &str) -> Vec<String> {
        self.inner
            .topics
            .get(topic)
            .map(|state| state.items.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of feeds attached to `topic`.
    pub fn feed_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .get(topic)
            .map(|state| state.feeds.iter().filter(|f| !f.tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Flush persisted topics to disk. No-op for an in-memory bus.
    pub fn flush(&self) -> Result<(), Error> {
        if let Some(db) = &self.inner.db {
            db.flush()?;
        }
        Ok(())
    }

    /// Close the bus.
    ///
    /// Attached feeds are detached, so their receivers observe end of stream.
    /// Later opens and publishes fail with [`Error::Closed`].
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for mut state in self.inner.topics.iter_mut() {
            state.feeds.clear();
        }
        tracing::debug!("bus closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn topic_mut(&self, topic: &str) -> Result<RefMut<'_, String, TopicState>, Error> {
        validate_name("topic", topic)?;
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let db = self.inner.db.as_ref();
        let state = self
            .inner
            .topics
            .entry(topic.to_string())
            .or_try_insert_with(|| TopicState::load(db, topic))?;
        // `close` clears feeds under the same shard locks.
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(state)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("topics", &self.inner.topics.len())
            .field("persistent", &self.inner.db.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Transport for Bus {
    fn open(&self, topic: &str) -> Result<Feed, Error> {
        let mut state = self.topic_mut(topic)?;
        let id = self.inner.next_feed_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        state.feeds.push(FeedEntry {
            id,
            tx,
            active: false,
        });

        tracing::debug!(topic, feed_id = id, "feed opened");
        Ok(Feed { id, changes: rx })
    }

    fn activate(&self, topic: &str, feed_id: u64) -> Result<(), Error> {
        let mut state = self.topic_mut(topic)?;
        let TopicState { items, feeds, .. } = &mut *state;

        let feed = feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or_else(|| Error::UnknownFeed {
                topic: topic.to_string(),
                feed_id,
            })?;
        if feed.active {
            return Ok(());
        }

        // Replay current contents before any live change.
        for (key, value) in items.iter() {
            if feed.tx.send(ChangeToken::modify(key, value.clone())).is_err() {
                break;
            }
        }
        feed.active = true;

        tracing::debug!(topic, feed_id, replayed = items.len(), "feed activated");
        Ok(())
    }
}

fn validate_name(what: &str, name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidName(format!("{what} must not be empty")));
    }
    Ok(())
}

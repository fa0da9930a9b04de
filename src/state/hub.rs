//! Topic-addressed broadcast hub used to fan frames out to every subscriber
//! of a match.

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::ws::ServerFrame;

/// Per-topic publish/subscribe registry.
///
/// Each topic is backed by a Tokio broadcast channel created lazily on first
/// subscribe. Publishing delivers to every current receiver, including the
/// publisher's own subscription when it holds one; consumers are expected to
/// be idempotent to self-delivery. Concurrent publishers are not serialized —
/// the last frame observed by a given receiver wins for that receiver.
pub struct ChannelHub {
    topics: DashMap<String, broadcast::Sender<ServerFrame>>,
    capacity: usize,
}

impl ChannelHub {
    /// Construct a hub whose per-topic channels buffer `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity,
        }
    }

    /// Register interest in `topic`, creating its channel if needed. The
    /// returned receiver sees every frame published after this call.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<ServerFrame> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Fan `frame` out to every current subscriber of `topic`, returning how
    /// many receivers it reached. A topic nobody listens to swallows the
    /// frame.
    pub fn publish(&self, topic: &str, frame: ServerFrame) -> usize {
        match self.topics.get(topic) {
            Some(sender) => sender.send(frame).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop `topic`'s channel if its last receiver is gone. Called after a
    /// subscriber unsubscribes or disconnects so idle matches do not
    /// accumulate channels.
    pub fn prune(&self, topic: &str) {
        self.topics
            .remove_if(topic, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Number of topics currently holding a channel.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

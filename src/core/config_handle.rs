//! The shared configuration slot: one publisher, many lock-free readers.

use arc_swap::ArcSwap;
use bytes::Bytes;
use std::sync::Arc;

/// Payload and revision, swapped together so readers never see one without
/// the other.
struct Snapshot {
    payload: Arc<Bytes>,
    /// Number of non-empty payloads published so far
    revision: u64,
}

type Slot = ArcSwap<Snapshot>;

/// Read handle to the most recently retrieved configuration payload.
///
/// Cloning is cheap and every clone observes the same slot. Reads are
/// lock-free and never observe a partially written payload: a reader racing a
/// publish sees either the old or the new value.
///
/// # Examples
///
/// ```rust
/// use appconfig_sidecar::core::LatestConfig;
/// use bytes::Bytes;
///
/// let (publisher, config) = LatestConfig::channel();
/// assert!(config.is_empty());
///
/// publisher.publish(Bytes::from_static(b"env=prod"));
/// assert_eq!(config.get_string(), "env=prod");
/// ```
#[derive(Clone)]
pub struct LatestConfig {
    slot: Arc<Slot>,
}

/// Write handle to the configuration slot.
///
/// There is exactly one publisher per slot and it is deliberately not
/// `Clone`; the poll loop takes ownership of it.
pub struct ConfigPublisher {
    slot: Arc<Slot>,
}

impl LatestConfig {
    /// Create an empty slot and return its publisher and reader halves.
    pub fn channel() -> (ConfigPublisher, LatestConfig) {
        let slot = Arc::new(ArcSwap::from_pointee(Snapshot {
            payload: Arc::new(Bytes::new()),
            revision: 0,
        }));
        (
            ConfigPublisher {
                slot: Arc::clone(&slot),
            },
            LatestConfig { slot },
        )
    }

    /// Get a reference-counted handle to the current payload.
    ///
    /// Empty until the first successful poll that carried configuration.
    pub fn get(&self) -> Arc<Bytes> {
        Arc::clone(&self.slot.load().payload)
    }

    /// The current revision and payload, read together.
    pub fn snapshot(&self) -> (u64, Arc<Bytes>) {
        let snapshot = self.slot.load();
        (snapshot.revision, Arc::clone(&snapshot.payload))
    }

    /// The current payload rendered as text.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn get_string(&self) -> String {
        String::from_utf8_lossy(&self.slot.load().payload).into_owned()
    }

    /// Whether no configuration has been published yet.
    pub fn is_empty(&self) -> bool {
        self.slot.load().payload.is_empty()
    }

    /// Number of payloads published so far. Zero means nothing has arrived.
    ///
    /// Use [`snapshot`](Self::snapshot) to read the revision together with
    /// the payload it belongs to.
    pub fn revision(&self) -> u64 {
        self.slot.load().revision
    }
}

impl ConfigPublisher {
    /// Replace the current payload.
    ///
    /// An empty payload means "unchanged since the last poll" and is ignored;
    /// once set, the slot is never cleared. Returns `true` if the payload was
    /// replaced.
    pub fn publish(&self, payload: Bytes) -> bool {
        if payload.is_empty() {
            return false;
        }
        // Single writer: nothing else moves the revision between load and store.
        let revision = self.slot.load().revision + 1;
        self.slot.store(Arc::new(Snapshot {
            payload: Arc::new(payload),
            revision,
        }));
        true
    }

    /// A new reader observing this publisher's slot.
    pub fn subscribe(&self) -> LatestConfig {
        LatestConfig {
            slot: Arc::clone(&self.slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_empty() {
        let (_publisher, config) = LatestConfig::channel();
        assert!(config.is_empty());
        assert_eq!(config.get_string(), "");
        assert_eq!(config.revision(), 0);
    }

    #[test]
    fn test_publish_replaces_payload() {
        let (publisher, config) = LatestConfig::channel();

        assert!(publisher.publish(Bytes::from_static(b"env=prod")));
        assert_eq!(config.get_string(), "env=prod");

        assert!(publisher.publish(Bytes::from_static(b"env=staging")));
        assert_eq!(config.get_string(), "env=staging");
        assert_eq!(config.revision(), 2);
    }

    #[test]
    fn test_empty_publish_keeps_previous_payload() {
        let (publisher, config) = LatestConfig::channel();
        publisher.publish(Bytes::from_static(b"env=prod"));

        assert!(!publisher.publish(Bytes::new()));
        assert_eq!(config.get_string(), "env=prod");
        assert_eq!(config.revision(), 1);
    }

    #[test]
    fn test_clones_share_the_slot() {
        let (publisher, config) = LatestConfig::channel();
        let config2 = config.clone();
        let config3 = publisher.subscribe();

        publisher.publish(Bytes::from_static(b"a=1"));

        assert_eq!(config2.get_string(), "a=1");
        assert_eq!(config3.get_string(), "a=1");
    }

    #[test]
    fn test_invalid_utf8_is_rendered_lossily() {
        let (publisher, config) = LatestConfig::channel();
        publisher.publish(Bytes::from_static(&[b'o', b'k', 0xff]));
        assert_eq!(config.get_string(), "ok\u{fffd}");
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_values() {
        let (publisher, config) = LatestConfig::channel();
        let a = Bytes::from(vec![b'a'; 4096]);
        let b = Bytes::from(vec![b'b'; 4096]);
        publisher.publish(a.clone());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let config = config.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        let payload = config.get();
                        let first = payload[0];
                        assert!(payload.iter().all(|&byte| byte == first));
                    }
                })
            })
            .collect();

        for i in 0..1_000 {
            publisher.publish(if i % 2 == 0 { b.clone() } else { a.clone() });
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_snapshot_pairs_revision_with_its_payload() {
        let (publisher, config) = LatestConfig::channel();
        assert_eq!(config.snapshot(), (0, Arc::new(Bytes::new())));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let config = config.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        let (revision, payload) = config.snapshot();
                        if revision == 0 {
                            assert!(payload.is_empty());
                        } else {
                            assert_eq!(payload.as_ref(), revision.to_string().as_bytes());
                        }
                    }
                })
            })
            .collect();

        for revision in 1..=1_000_u64 {
            publisher.publish(Bytes::from(revision.to_string()));
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(config.revision(), 1_000);
    }
}

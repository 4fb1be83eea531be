//! In-process broker for testing
//!
//! Implements the same stream, consumer-group and pending-entry semantics as
//! Redis without a network dependency. Blocking reads wait on a watch channel
//! that is bumped on every append.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;

use super::error::{BrokerError, BrokerResult};
use super::traits::BrokerClient;
use crate::logging::Logger;
use crate::types::{
    AppendId, ConsumerPending, CreateGroupOptions, FieldMap, GroupReadFrom, GroupReadOptions,
    GroupStart, PendingSummary, ReadFrom, ReadOptions, StreamEntry, StreamId,
};

/// Buffered messages per pub/sub channel before slow listeners lag
const CHANNEL_CAPACITY: usize = 256;

/// A delivered, not yet acknowledged entry
#[derive(Debug, Clone)]
struct PendingEntry {
    consumer: String,
    delivery_count: u64,
    last_delivery: Instant,
}

#[derive(Debug, Default)]
struct GroupState {
    last_delivered: StreamId,
    pel: BTreeMap<StreamId, PendingEntry>,
    consumers: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct StreamState {
    entries: BTreeMap<StreamId, Vec<(String, String)>>,
    last_id: StreamId,
    groups: HashMap<String, GroupState>,
}

#[derive(Default)]
struct BrokerState {
    streams: HashMap<String, StreamState>,
    channels: HashMap<String, broadcast::Sender<String>>,
}

/// In-memory broker
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
    /// Bumped on every append to wake blocked readers
    appended: watch::Sender<u64>,
    logger: Arc<dyn Logger>,
}

impl MemoryBroker {
    /// Create an empty broker
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        let (appended, _) = watch::channel(0);
        Self {
            state: Mutex::new(BrokerState::default()),
            appended,
            logger,
        }
    }

    /// Subscribe to a pub/sub channel
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        let mut state = self.state.lock();
        state
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Number of entries in a stream (0 if it does not exist)
    pub fn stream_len(&self, stream: &str) -> usize {
        self.state
            .lock()
            .streams
            .get(stream)
            .map(|s| s.entries.len())
            .unwrap_or(0)
    }

    /// How many times an entry has been delivered within a group
    pub fn delivery_count(&self, stream: &str, group: &str, id: StreamId) -> Option<u64> {
        let state = self.state.lock();
        state
            .streams
            .get(stream)?
            .groups
            .get(group)?
            .pel
            .get(&id)
            .map(|p| p.delivery_count)
    }

    /// Time since an entry was last delivered within a group
    pub fn idle_time(&self, stream: &str, group: &str, id: StreamId) -> Option<Duration> {
        let state = self.state.lock();
        state
            .streams
            .get(stream)?
            .groups
            .get(group)?
            .pel
            .get(&id)
            .map(|p| p.last_delivery.elapsed())
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn tail(&self, stream: &str) -> StreamId {
        self.state
            .lock()
            .streams
            .get(stream)
            .map(|s| s.last_id)
            .unwrap_or(StreamId::MIN)
    }

    fn entries_after(&self, stream: &str, after: StreamId, count: usize) -> Vec<StreamEntry> {
        let state = self.state.lock();
        let Some(stream) = state.streams.get(stream) else {
            return Vec::new();
        };
        stream
            .entries
            .range((Excluded(after), Unbounded))
            .take(count)
            .map(|(id, fields)| StreamEntry::new(*id, fields.clone()))
            .collect()
    }

    /// Deliver never-delivered entries to `consumer`, advancing the group cursor
    fn deliver_new(&self, options: &GroupReadOptions) -> BrokerResult<Vec<StreamEntry>> {
        let mut state = self.state.lock();
        let no_group = || BrokerError::no_group(&options.stream, &options.group);
        let StreamState { entries, groups, .. } =
            state.streams.get_mut(&options.stream).ok_or_else(no_group)?;
        let group = groups.get_mut(&options.group).ok_or_else(no_group)?;
        group.consumers.insert(options.consumer.clone());

        let batch: Vec<StreamEntry> = entries
            .range((Excluded(group.last_delivered), Unbounded))
            .take(options.count)
            .map(|(id, fields)| StreamEntry::new(*id, fields.clone()))
            .collect();

        if let Some(last) = batch.last() {
            group.last_delivered = last.id;
        }
        for entry in &batch {
            group.pel.insert(
                entry.id,
                PendingEntry {
                    consumer: options.consumer.clone(),
                    delivery_count: 1,
                    last_delivery: Instant::now(),
                },
            );
        }
        Ok(batch)
    }

    /// Re-deliver this consumer's own pending entries after `after`
    fn redeliver_pending(
        &self,
        options: &GroupReadOptions,
        after: StreamId,
    ) -> BrokerResult<Vec<StreamEntry>> {
        let mut state = self.state.lock();
        let no_group = || BrokerError::no_group(&options.stream, &options.group);
        let StreamState { entries, groups, .. } =
            state.streams.get_mut(&options.stream).ok_or_else(no_group)?;
        let group = groups.get_mut(&options.group).ok_or_else(no_group)?;
        group.consumers.insert(options.consumer.clone());

        let mut batch = Vec::new();
        for (id, pending) in group.pel.range_mut((Excluded(after), Unbounded)) {
            if batch.len() >= options.count {
                break;
            }
            if pending.consumer != options.consumer {
                continue;
            }
            if let Some(fields) = entries.get(id) {
                pending.delivery_count += 1;
                pending.last_delivery = Instant::now();
                batch.push(StreamEntry::new(*id, fields.clone()));
            }
        }
        Ok(batch)
    }
}

#[async_trait]
impl BrokerClient for MemoryBroker {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> BrokerResult<String> {
        Ok("PONG".to_string())
    }

    async fn publish(&self, channel: &str, message: &str) -> BrokerResult<u64> {
        let state = self.state.lock();
        let delivered = state
            .channels
            .get(channel)
            .and_then(|tx| tx.send(message.to_string()).ok())
            .unwrap_or(0);
        Ok(delivered as u64)
    }

    async fn append(&self, stream: &str, id: AppendId, fields: &FieldMap) -> BrokerResult<StreamId> {
        let new_id = {
            let mut state = self.state.lock();
            let last_id = state
                .streams
                .get(stream)
                .map(|s| s.last_id)
                .unwrap_or(StreamId::MIN);
            let new_id = match id {
                AppendId::Auto => last_id.next_after(Self::now_millis()).ok_or_else(|| {
                    BrokerError::command("ERR", "The stream has exhausted the last possible ID")
                })?,
                AppendId::Explicit(id) if id == StreamId::MIN => {
                    return Err(BrokerError::command(
                        "ERR",
                        "The ID specified in XADD must be greater than 0-0",
                    ));
                }
                AppendId::Explicit(id) if id <= last_id => {
                    return Err(BrokerError::command(
                        "ERR",
                        "The ID specified in XADD is equal or smaller than the target stream top item",
                    ));
                }
                AppendId::Explicit(id) => id,
            };
            let target = state.streams.entry(stream.to_string()).or_default();
            target.entries.insert(new_id, fields.to_text_pairs());
            target.last_id = new_id;
            new_id
        };

        self.appended.send_modify(|n| *n = n.wrapping_add(1));
        crate::log_debug!(self.logger, "[MemoryBroker] {} <- {}", stream, new_id);
        Ok(new_id)
    }

    async fn read(&self, options: &ReadOptions) -> BrokerResult<Vec<StreamEntry>> {
        // Subscribe before resolving `$` so no append in between is missed
        let mut changes = self.appended.subscribe();
        let after = match options.from {
            ReadFrom::Latest => self.tail(&options.stream),
            ReadFrom::After(id) => id,
        };
        let deadline = options.block.map(|d| Instant::now() + d);

        loop {
            let batch = self.entries_after(&options.stream, after, options.count);
            if !batch.is_empty() {
                return Ok(batch);
            }
            let Some(deadline) = deadline else {
                return Ok(batch);
            };
            if tokio::time::timeout_at(deadline, changes.changed()).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn create_group(&self, options: &CreateGroupOptions) -> BrokerResult<()> {
        let mut state = self.state.lock();
        if !state.streams.contains_key(&options.stream) && !options.mkstream {
            return Err(BrokerError::command(
                "ERR",
                "The XGROUP subcommand requires the key to exist. Note that for CREATE you may want to use the MKSTREAM option to create an empty stream automatically.",
            ));
        }
        let stream = state.streams.entry(options.stream.clone()).or_default();
        if stream.groups.contains_key(&options.group) {
            return Err(BrokerError::group_exists(&options.stream, &options.group));
        }
        let last_delivered = match options.start {
            GroupStart::Latest => stream.last_id,
            GroupStart::At(id) => id,
        };
        stream.groups.insert(
            options.group.clone(),
            GroupState {
                last_delivered,
                ..Default::default()
            },
        );
        crate::log_debug!(
            self.logger,
            "[MemoryBroker] group {} on {} at {}",
            options.group, options.stream, last_delivered
        );
        Ok(())
    }

    async fn read_group(&self, options: &GroupReadOptions) -> BrokerResult<Vec<StreamEntry>> {
        if let GroupReadFrom::PendingAfter(after) = options.from {
            return self.redeliver_pending(options, after);
        }

        let mut changes = self.appended.subscribe();
        let deadline = options.block.map(|d| Instant::now() + d);

        loop {
            let batch = self.deliver_new(options)?;
            if !batch.is_empty() {
                return Ok(batch);
            }
            let Some(deadline) = deadline else {
                return Ok(batch);
            };
            if tokio::time::timeout_at(deadline, changes.changed()).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn ack(&self, stream: &str, group: &str, ids: &[StreamId]) -> BrokerResult<u64> {
        let mut state = self.state.lock();
        let Some(group_state) = state
            .streams
            .get_mut(stream)
            .and_then(|s| s.groups.get_mut(group))
        else {
            return Ok(0);
        };
        let removed = ids
            .iter()
            .filter(|id| group_state.pel.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn pending(&self, stream: &str, group: &str) -> BrokerResult<PendingSummary> {
        let state = self.state.lock();
        let group_state = state
            .streams
            .get(stream)
            .and_then(|s| s.groups.get(group))
            .ok_or_else(|| BrokerError::no_group(stream, group))?;

        let mut per_consumer: BTreeMap<&str, u64> = BTreeMap::new();
        for pending in group_state.pel.values() {
            *per_consumer.entry(pending.consumer.as_str()).or_default() += 1;
        }

        Ok(PendingSummary {
            count: group_state.pel.len() as u64,
            first_id: group_state.pel.keys().next().copied(),
            last_id: group_state.pel.keys().next_back().copied(),
            consumers: per_consumer
                .into_iter()
                .map(|(name, pending)| ConsumerPending {
                    name: name.to_string(),
                    pending,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use std::time::Duration;

    fn broker() -> MemoryBroker {
        MemoryBroker::new(Arc::new(NoOpLogger::new()))
    }

    fn fields(msg: &str) -> FieldMap {
        FieldMap::from_pairs([("msg", msg)]).unwrap()
    }

    #[tokio::test]
    async fn test_auto_ids_strictly_increase() {
        let broker = broker();
        let mut last = StreamId::MIN;
        for i in 0..50 {
            let id = broker.append("s", AppendId::Auto, &fields(&i.to_string())).await.unwrap();
            assert!(id > last, "{} should be greater than {}", id, last);
            last = id;
        }
        assert_eq!(broker.stream_len("s"), 50);
    }

    #[tokio::test]
    async fn test_explicit_id_must_exceed_tail() {
        let broker = broker();
        let first = StreamId::new(5, 0);
        broker.append("s", AppendId::Explicit(first), &fields("a")).await.unwrap();

        let err = broker
            .append("s", AppendId::Explicit(first), &fields("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Command { .. }));

        let err = broker
            .append("s", AppendId::Explicit(StreamId::new(4, 9)), &fields("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Command { .. }));

        let next = StreamId::new(5, 1);
        assert_eq!(broker.append("s", AppendId::Explicit(next), &fields("c")).await.unwrap(), next);

        // the explicit id is the new tail for auto ids too
        let auto = broker.append("s", AppendId::Auto, &fields("d")).await.unwrap();
        assert!(auto > next);
    }

    #[tokio::test]
    async fn test_auto_id_after_full_sequence() {
        let broker = broker();
        let tail = StreamId::new(99_999_999_999_999, u64::MAX);
        broker.append("s", AppendId::Explicit(tail), &fields("first")).await.unwrap();

        let next = broker.append("s", AppendId::Auto, &fields("second")).await.unwrap();
        assert_eq!(next, StreamId::new(100_000_000_000_000, 0));
        assert_eq!(broker.stream_len("s"), 2);

        let entries = broker
            .read(&ReadOptions::new("s").with_from(ReadFrom::After(StreamId::MIN)).with_count(10))
            .await
            .unwrap();
        assert_eq!(entries[0].get("msg"), Some("first"));
        assert_eq!(entries[1].get("msg"), Some("second"));
    }

    #[tokio::test]
    async fn test_auto_id_exhausted() {
        let broker = broker();
        let last = StreamId::new(u64::MAX, u64::MAX);
        broker.append("s", AppendId::Explicit(last), &fields("a")).await.unwrap();

        let err = broker.append("s", AppendId::Auto, &fields("b")).await.unwrap_err();
        assert_eq!(err.code(), "ERR");
        assert_eq!(broker.stream_len("s"), 1);
    }

    #[tokio::test]
    async fn test_zero_id_rejected() {
        let broker = broker();
        let err = broker
            .append("s", AppendId::Explicit(StreamId::MIN), &fields("a"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ERR");
    }

    #[tokio::test]
    async fn test_read_does_not_touch_groups() {
        let broker = broker();
        broker
            .create_group(&CreateGroupOptions::new("s", "g").with_start(GroupStart::At(StreamId::MIN)))
            .await
            .unwrap();
        broker.append("s", AppendId::Auto, &fields("a")).await.unwrap();

        let read = broker
            .read(&ReadOptions::new("s").with_from(ReadFrom::After(StreamId::MIN)).with_count(10))
            .await
            .unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(broker.pending("s", "g").await.unwrap().count, 0);

        let delivered = broker
            .read_group(&GroupReadOptions::new("s", "g", "c").with_block(None))
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);
    }

    #[tokio::test]
    async fn test_read_latest_without_block_is_empty() {
        let broker = broker();
        broker.append("s", AppendId::Auto, &fields("a")).await.unwrap();
        let read = broker.read(&ReadOptions::new("s")).await.unwrap();
        assert!(read.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_read_times_out_empty() {
        let broker = broker();
        let started = Instant::now();
        let read = broker
            .read(&ReadOptions::new("never").with_block(Some(Duration::from_millis(200))))
            .await
            .unwrap();
        assert!(read.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_blocking_read_wakes_on_append() {
        let broker = Arc::new(broker());
        let reader = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move {
                broker
                    .read(&ReadOptions::new("s").with_block(Some(Duration::from_secs(5))))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let id = broker.append("s", AppendId::Auto, &fields("late")).await.unwrap();

        let read = reader.await.unwrap().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, id);
        assert_eq!(read[0].get("msg"), Some("late"));
    }

    #[tokio::test]
    async fn test_create_group_twice() {
        let broker = broker();
        let options = CreateGroupOptions::new("s", "g");
        broker.create_group(&options).await.unwrap();
        let err = broker.create_group(&options).await.unwrap_err();
        assert!(err.is_group_exists());
        assert_eq!(err.code(), "BUSYGROUP");
    }

    #[tokio::test]
    async fn test_create_group_requires_stream_without_mkstream() {
        let broker = broker();
        let err = broker
            .create_group(&CreateGroupOptions::new("missing", "g").with_mkstream(false))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Command { .. }));
    }

    #[tokio::test]
    async fn test_group_read_missing_group() {
        let broker = broker();
        let err = broker
            .read_group(&GroupReadOptions::new("s", "nope", "c").with_block(None))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::NoGroup { .. }));
        assert!(matches!(
            broker.pending("s", "nope").await,
            Err(BrokerError::NoGroup { .. })
        ));
    }

    #[tokio::test]
    async fn test_pending_history_redelivery() {
        let broker = broker();
        broker.create_group(&CreateGroupOptions::new("s", "g")).await.unwrap();
        let a = broker.append("s", AppendId::Auto, &fields("a")).await.unwrap();
        let b = broker.append("s", AppendId::Auto, &fields("b")).await.unwrap();

        let opts = GroupReadOptions::new("s", "g", "c1").with_count(10).with_block(None);
        assert_eq!(broker.read_group(&opts).await.unwrap().len(), 2);

        // another consumer sees none of c1's history
        let other = GroupReadOptions::new("s", "g", "c2")
            .with_from(GroupReadFrom::PendingAfter(StreamId::MIN))
            .with_count(10)
            .with_block(None);
        assert!(broker.read_group(&other).await.unwrap().is_empty());

        let history = opts.clone().with_from(GroupReadFrom::PendingAfter(StreamId::MIN));
        let redelivered = broker.read_group(&history).await.unwrap();
        assert_eq!(redelivered.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(broker.delivery_count("s", "g", a), Some(2));

        broker.ack("s", "g", &[a]).await.unwrap();
        let redelivered = broker.read_group(&history).await.unwrap();
        assert_eq!(redelivered.iter().map(|e| e.id).collect::<Vec<_>>(), vec![b]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redelivery_resets_idle_time() {
        let broker = broker();
        broker.create_group(&CreateGroupOptions::new("s", "g")).await.unwrap();
        let id = broker.append("s", AppendId::Auto, &fields("a")).await.unwrap();
        let opts = GroupReadOptions::new("s", "g", "c1").with_block(None);
        broker.read_group(&opts).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(broker.idle_time("s", "g", id).unwrap() >= Duration::from_secs(30));

        let history = opts.with_from(GroupReadFrom::PendingAfter(StreamId::MIN));
        broker.read_group(&history).await.unwrap();
        assert!(broker.idle_time("s", "g", id).unwrap() < Duration::from_secs(1));
        assert_eq!(broker.idle_time("s", "g", StreamId::new(1, 0)), None);
    }

    #[tokio::test]
    async fn test_ack_unknown_group_counts_zero() {
        let broker = broker();
        assert_eq!(broker.ack("s", "g", &[StreamId::new(1, 0)]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_counts_listeners() {
        let broker = broker();
        assert_eq!(broker.publish("news", "nobody").await.unwrap(), 0);

        let mut first = broker.subscribe("news");
        let mut second = broker.subscribe("news");
        assert_eq!(broker.publish("news", "hello").await.unwrap(), 2);
        assert_eq!(first.recv().await.unwrap(), "hello");
        assert_eq!(second.recv().await.unwrap(), "hello");

        drop(second);
        assert_eq!(broker.publish("news", "again").await.unwrap(), 1);
    }
}

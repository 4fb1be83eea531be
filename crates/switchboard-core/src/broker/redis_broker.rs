//! Redis broker client
//!
//! One multiplexed connection per process, cloned per call. Every trait
//! method is a single Redis command.

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamId as RedisEntry, StreamPendingReply, StreamReadReply};
use redis::{Cmd, RedisError};

use super::error::{BrokerError, BrokerResult};
use super::traits::BrokerClient;
use crate::logging::Logger;
use crate::types::{
    AppendId, ConsumerPending, CreateGroupOptions, FieldMap, GroupReadOptions, PendingSummary,
    ReadOptions, StreamEntry, StreamId,
};

impl From<RedisError> for BrokerError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
        {
            return BrokerError::Connection(err.to_string());
        }
        match err.code() {
            Some(code) => BrokerError::command(code, err.detail().unwrap_or_default()),
            None => BrokerError::Protocol(err.to_string()),
        }
    }
}

/// Map an error from a group command, keeping the group-specific codes structured
fn group_error(err: RedisError, stream: &str, group: &str) -> BrokerError {
    match err.code() {
        Some("BUSYGROUP") => BrokerError::group_exists(stream, group),
        Some("NOGROUP") => BrokerError::no_group(stream, group),
        _ => err.into(),
    }
}

/// Broker client backed by a Redis server
pub struct RedisBroker {
    url: String,
    conn: MultiplexedConnection,
    logger: Arc<dyn Logger>,
}

impl RedisBroker {
    /// Connect to Redis (e.g. `redis://127.0.0.1:6379`)
    pub async fn connect(url: &str, logger: Arc<dyn Logger>) -> BrokerResult<Self> {
        crate::log_info!(logger, "[RedisBroker] Connecting to {}", url);

        let client = redis::Client::open(url)
            .map_err(|e| BrokerError::Connection(format!("invalid redis url {}: {}", url, e)))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        logger.info("[RedisBroker] Connected");

        Ok(Self {
            url: url.to_string(),
            conn,
            logger,
        })
    }

    /// Connection URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse_id(raw: &str) -> BrokerResult<StreamId> {
        raw.parse()
            .map_err(|_| BrokerError::Protocol(format!("unexpected stream id {:?}", raw)))
    }

    fn convert_entry(entry: &RedisEntry) -> BrokerResult<StreamEntry> {
        let mut fields: Vec<(String, String)> = entry
            .map
            .iter()
            .map(|(field, value)| {
                let text = redis::from_redis_value::<String>(value).map_err(|e| {
                    BrokerError::Protocol(format!(
                        "field {:?} of entry {} is not text: {}",
                        field, entry.id, e
                    ))
                })?;
                Ok((field.clone(), text))
            })
            .collect::<BrokerResult<_>>()?;
        // the reply map is unordered
        fields.sort();
        Ok(StreamEntry::new(Self::parse_id(&entry.id)?, fields))
    }

    fn convert_reply(reply: Option<StreamReadReply>) -> BrokerResult<Vec<StreamEntry>> {
        let Some(reply) = reply else {
            return Ok(Vec::new());
        };
        reply
            .keys
            .iter()
            .flat_map(|key| key.ids.iter())
            .map(Self::convert_entry)
            .collect()
    }

    /// Append `COUNT` and, when waiting, `BLOCK` (`BLOCK 0` would wait forever)
    fn read_args(cmd: &mut Cmd, count: usize, block: Option<std::time::Duration>) {
        cmd.arg("COUNT").arg(count);
        if let Some(block) = block {
            cmd.arg("BLOCK").arg(block.as_millis().max(1) as u64);
        }
    }
}

#[async_trait]
impl BrokerClient for RedisBroker {
    fn name(&self) -> &str {
        "redis"
    }

    async fn ping(&self) -> BrokerResult<String> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }

    async fn publish(&self, channel: &str, message: &str) -> BrokerResult<u64> {
        let mut conn = self.conn.clone();
        let receivers: u64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut conn)
            .await?;
        Ok(receivers)
    }

    async fn append(&self, stream: &str, id: AppendId, fields: &FieldMap) -> BrokerResult<StreamId> {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(stream).arg(id.to_string());
        for (field, value) in fields.to_text_pairs() {
            cmd.arg(field).arg(value);
        }

        let mut conn = self.conn.clone();
        let new_id: String = cmd.query_async(&mut conn).await?;
        crate::log_debug!(self.logger, "[RedisBroker] XADD {} -> {}", stream, new_id);
        Self::parse_id(&new_id)
    }

    async fn read(&self, options: &ReadOptions) -> BrokerResult<Vec<StreamEntry>> {
        let mut cmd = redis::cmd("XREAD");
        Self::read_args(&mut cmd, options.count, options.block);
        cmd.arg("STREAMS")
            .arg(&options.stream)
            .arg(options.from.to_string());

        let mut conn = self.conn.clone();
        let reply: Option<StreamReadReply> = cmd.query_async(&mut conn).await?;
        Self::convert_reply(reply)
    }

    async fn create_group(&self, options: &CreateGroupOptions) -> BrokerResult<()> {
        let mut cmd = redis::cmd("XGROUP");
        cmd.arg("CREATE")
            .arg(&options.stream)
            .arg(&options.group)
            .arg(options.start.to_string());
        if options.mkstream {
            cmd.arg("MKSTREAM");
        }

        let mut conn = self.conn.clone();
        let _: () = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| group_error(e, &options.stream, &options.group))?;
        crate::log_info!(
            self.logger,
            "[RedisBroker] Created group {} on {} at {}",
            options.group, options.stream, options.start
        );
        Ok(())
    }

    async fn read_group(&self, options: &GroupReadOptions) -> BrokerResult<Vec<StreamEntry>> {
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP").arg(&options.group).arg(&options.consumer);
        Self::read_args(&mut cmd, options.count, options.block);
        cmd.arg("STREAMS")
            .arg(&options.stream)
            .arg(options.from.to_string());

        let mut conn = self.conn.clone();
        let reply: Option<StreamReadReply> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| group_error(e, &options.stream, &options.group))?;
        Self::convert_reply(reply)
    }

    async fn ack(&self, stream: &str, group: &str, ids: &[StreamId]) -> BrokerResult<u64> {
        let mut cmd = redis::cmd("XACK");
        cmd.arg(stream).arg(group);
        for id in ids {
            cmd.arg(id.to_string());
        }

        let mut conn = self.conn.clone();
        let removed: u64 = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| group_error(e, stream, group))?;
        Ok(removed)
    }

    async fn pending(&self, stream: &str, group: &str) -> BrokerResult<PendingSummary> {
        let mut conn = self.conn.clone();
        let reply: StreamPendingReply = redis::cmd("XPENDING")
            .arg(stream)
            .arg(group)
            .query_async(&mut conn)
            .await
            .map_err(|e| group_error(e, stream, group))?;

        match reply {
            StreamPendingReply::Empty => Ok(PendingSummary::default()),
            StreamPendingReply::Data(data) => {
                let mut consumers: Vec<ConsumerPending> = data
                    .consumers
                    .into_iter()
                    .filter(|c| c.pending > 0)
                    .map(|c| ConsumerPending {
                        name: c.name,
                        pending: c.pending as u64,
                    })
                    .collect();
                consumers.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(PendingSummary {
                    count: data.count as u64,
                    first_id: Some(Self::parse_id(&data.start_id)?),
                    last_id: Some(Self::parse_id(&data.end_id)?),
                    consumers,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::{GroupReadFrom, GroupStart};

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    #[test]
    fn test_read_args_skip_block_zero() {
        let mut cmd = redis::cmd("XREAD");
        RedisBroker::read_args(&mut cmd, 3, None);
        let packed = String::from_utf8_lossy(&cmd.get_packed_command()).to_string();
        assert!(packed.contains("COUNT"));
        assert!(!packed.contains("BLOCK"));
    }

    fn redis_entry(fields: &[(&str, redis::Value)]) -> RedisEntry {
        RedisEntry {
            id: "1-0".to_string(),
            map: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_convert_entry_sorts_fields() {
        let entry = redis_entry(&[
            ("msg", redis::Value::BulkString(b"hello".to_vec())),
            ("kind", redis::Value::BulkString(b"build".to_vec())),
        ]);
        let converted = RedisBroker::convert_entry(&entry).unwrap();
        assert_eq!(converted.id, StreamId::new(1, 0));
        assert_eq!(
            converted.fields,
            vec![
                ("kind".to_string(), "build".to_string()),
                ("msg".to_string(), "hello".to_string())
            ]
        );
    }

    #[test]
    fn test_convert_entry_rejects_binary_value() {
        let entry = redis_entry(&[
            ("ok", redis::Value::BulkString(b"fine".to_vec())),
            ("blob", redis::Value::BulkString(vec![0xff, 0xfe])),
        ]);
        let err = RedisBroker::convert_entry(&entry).unwrap_err();
        assert!(matches!(err, BrokerError::Protocol(ref message) if message.contains("blob")));
    }

    // Needs a live Redis: `REDIS_URL=redis://localhost:6379 cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn test_group_round_trip_against_redis() {
        let broker = RedisBroker::connect(&redis_url(), Arc::new(NoOpLogger::new()))
            .await
            .unwrap();
        assert_eq!(broker.ping().await.unwrap(), "PONG");

        let stream = format!("switchboard:test:{}", std::process::id());
        let create = CreateGroupOptions::new(&stream, "g").with_start(GroupStart::Latest);
        broker.create_group(&create).await.unwrap();
        assert!(broker.create_group(&create).await.unwrap_err().is_group_exists());

        let fields = FieldMap::from_pairs([("msg", "a")]).unwrap();
        let id = broker.append(&stream, AppendId::Auto, &fields).await.unwrap();

        let delivered = broker
            .read_group(
                &GroupReadOptions::new(&stream, "g", "c1")
                    .with_from(GroupReadFrom::Undelivered)
                    .with_block(None),
            )
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, id);
        assert_eq!(delivered[0].get("msg"), Some("a"));

        let pending = broker.pending(&stream, "g").await.unwrap();
        assert_eq!(pending.count, 1);
        assert_eq!(pending.pending_for("c1"), 1);

        assert_eq!(broker.ack(&stream, "g", &[id]).await.unwrap(), 1);
        assert_eq!(broker.ack(&stream, "g", &[id]).await.unwrap(), 0);

        let mut conn = broker.conn.clone();
        let _: () = redis::cmd("DEL").arg(&stream).query_async(&mut conn).await.unwrap();
    }
}

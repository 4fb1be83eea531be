//! Tool arguments and their resolution into operation options
//!
//! Argument structs mirror what a remote caller may send: every name and
//! position is optional and falls back to the configured defaults. `resolve`
//! validates the shape and produces the typed options the broker takes.

use rmcp::schemars;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ValidationError;
use crate::config::StreamDefaults;
use crate::types::{
    block_duration, AppendId, CreateGroupOptions, FieldMap, GroupReadFrom, GroupReadOptions,
    GroupStart, ReadFrom, ReadOptions, StreamId, DEFAULT_COUNT, DEFAULT_GROUP_READ_BLOCK_MS,
    DEFAULT_MKSTREAM, DEFAULT_READ_BLOCK_MS,
};

/// Use `value` when given (rejecting empty strings), otherwise the default
fn name_or(
    value: Option<String>,
    default: &str,
    argument: &'static str,
) -> Result<String, ValidationError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ValidationError::Empty(argument)),
        Some(v) => Ok(v),
        None => Ok(default.to_string()),
    }
}

fn required(value: String, argument: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(argument))
    } else {
        Ok(value)
    }
}

fn count_or_default(count: Option<u64>) -> Result<usize, ValidationError> {
    match count {
        Some(0) => Err(ValidationError::ZeroCount),
        Some(n) => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
        None => Ok(DEFAULT_COUNT),
    }
}

/// Parse an optional position argument, falling back to its default marker
fn position<T>(value: Option<String>, default: T, argument: &'static str) -> Result<T, ValidationError>
where
    T: std::str::FromStr<Err = crate::types::ParseIdError>,
{
    match value {
        Some(raw) => raw.parse().map_err(|e| ValidationError::id(argument, e)),
        None => Ok(default),
    }
}

/// Arguments for `redis_publish`
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PublishArgs {
    #[schemars(description = "Pub/sub channel name")]
    pub channel: String,
    #[schemars(description = "Message payload")]
    pub message: String,
}

impl PublishArgs {
    pub fn resolve(self) -> Result<(String, String), ValidationError> {
        Ok((required(self.channel, "channel")?, self.message))
    }
}

/// Arguments for `redis_xadd`
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AppendArgs {
    #[schemars(description = "Stream name (default: configured events stream)")]
    #[serde(default)]
    pub stream: Option<String>,
    #[schemars(description = "Entry fields; values must be strings, numbers or booleans")]
    pub fields: Map<String, Value>,
    #[schemars(description = "Explicit entry id `<millis>-<seq>`, must exceed the stream's last id (default: `*`, broker-assigned)")]
    #[serde(default)]
    pub id: Option<String>,
}

/// A validated append
#[derive(Debug, Clone, PartialEq)]
pub struct AppendCall {
    pub stream: String,
    pub id: AppendId,
    pub fields: FieldMap,
}

impl AppendArgs {
    pub fn resolve(self, defaults: &StreamDefaults) -> Result<AppendCall, ValidationError> {
        Ok(AppendCall {
            stream: name_or(self.stream, &defaults.stream, "stream")?,
            id: position(self.id, AppendId::Auto, "id")?,
            fields: FieldMap::from_json(&self.fields)?,
        })
    }
}

/// Arguments for `redis_xread`
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ReadArgs {
    #[schemars(description = "Stream name (default: configured events stream)")]
    #[serde(default)]
    pub stream: Option<String>,
    #[schemars(description = "Return entries after this id (default: `$`, only entries appended after the call begins)")]
    #[serde(default)]
    pub last_id: Option<String>,
    #[schemars(description = "Milliseconds to wait for data; 0 returns immediately (default: 0)")]
    #[serde(default)]
    pub block_ms: Option<u64>,
    #[schemars(description = "Maximum entries to return (default: 1)")]
    #[serde(default)]
    pub count: Option<u64>,
}

impl ReadArgs {
    pub fn resolve(self, defaults: &StreamDefaults) -> Result<ReadOptions, ValidationError> {
        Ok(ReadOptions {
            stream: name_or(self.stream, &defaults.stream, "stream")?,
            from: position(self.last_id, ReadFrom::Latest, "last_id")?,
            count: count_or_default(self.count)?,
            block: block_duration(self.block_ms.unwrap_or(DEFAULT_READ_BLOCK_MS)),
        })
    }
}

/// Arguments for `redis_xgroup_create`
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateGroupArgs {
    #[schemars(description = "Stream name (default: configured events stream)")]
    #[serde(default)]
    pub stream: Option<String>,
    #[schemars(description = "Consumer group name (default: configured group)")]
    #[serde(default)]
    pub group: Option<String>,
    #[schemars(description = "Deliver entries after this id (default: `$`, only future entries)")]
    #[serde(default)]
    pub id: Option<String>,
    #[schemars(description = "Create the stream if it does not exist (default: true)")]
    #[serde(default)]
    pub mkstream: Option<bool>,
}

impl CreateGroupArgs {
    pub fn resolve(self, defaults: &StreamDefaults) -> Result<CreateGroupOptions, ValidationError> {
        Ok(CreateGroupOptions {
            stream: name_or(self.stream, &defaults.stream, "stream")?,
            group: name_or(self.group, &defaults.group, "group")?,
            start: position(self.id, GroupStart::Latest, "id")?,
            mkstream: self.mkstream.unwrap_or(DEFAULT_MKSTREAM),
        })
    }
}

/// Arguments for `redis_xreadgroup`
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GroupReadArgs {
    #[schemars(description = "Stream name (default: configured events stream)")]
    #[serde(default)]
    pub stream: Option<String>,
    #[schemars(description = "Consumer group name (default: configured group)")]
    #[serde(default)]
    pub group: Option<String>,
    #[schemars(description = "Consumer name within the group (default: configured consumer)")]
    #[serde(default)]
    pub consumer: Option<String>,
    #[schemars(description = "Maximum entries to return (default: 1)")]
    #[serde(default)]
    pub count: Option<u64>,
    #[schemars(description = "Milliseconds to wait for new entries; 0 returns immediately (default: 15000)")]
    #[serde(default)]
    pub block_ms: Option<u64>,
    #[schemars(description = "`>` for entries never delivered to this group (default), or an id to re-read this consumer's pending entries after it")]
    #[serde(default)]
    pub id: Option<String>,
}

impl GroupReadArgs {
    pub fn resolve(self, defaults: &StreamDefaults) -> Result<GroupReadOptions, ValidationError> {
        Ok(GroupReadOptions {
            stream: name_or(self.stream, &defaults.stream, "stream")?,
            group: name_or(self.group, &defaults.group, "group")?,
            consumer: name_or(self.consumer, &defaults.consumer, "consumer")?,
            from: position(self.id, GroupReadFrom::Undelivered, "id")?,
            count: count_or_default(self.count)?,
            block: block_duration(self.block_ms.unwrap_or(DEFAULT_GROUP_READ_BLOCK_MS)),
        })
    }
}

/// Arguments for `redis_xack`
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AckArgs {
    #[schemars(description = "Stream name (default: configured events stream)")]
    #[serde(default)]
    pub stream: Option<String>,
    #[schemars(description = "Consumer group name (default: configured group)")]
    #[serde(default)]
    pub group: Option<String>,
    #[schemars(description = "Entry ids to acknowledge")]
    pub ids: Vec<String>,
}

/// A validated acknowledgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckCall {
    pub stream: String,
    pub group: String,
    pub ids: Vec<StreamId>,
}

impl AckArgs {
    pub fn resolve(self, defaults: &StreamDefaults) -> Result<AckCall, ValidationError> {
        if self.ids.is_empty() {
            return Err(ValidationError::NoIds);
        }
        let ids = self
            .ids
            .iter()
            .map(|raw| raw.parse::<StreamId>().map_err(|e| ValidationError::id("ids", e)))
            .collect::<Result<Vec<StreamId>, _>>()?;
        Ok(AckCall {
            stream: name_or(self.stream, &defaults.stream, "stream")?,
            group: name_or(self.group, &defaults.group, "group")?,
            ids,
        })
    }
}

/// Arguments for `redis_xpending`
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PendingArgs {
    #[schemars(description = "Stream name (default: configured events stream)")]
    #[serde(default)]
    pub stream: Option<String>,
    #[schemars(description = "Consumer group name (default: configured group)")]
    #[serde(default)]
    pub group: Option<String>,
}

impl PendingArgs {
    pub fn resolve(self, defaults: &StreamDefaults) -> Result<(String, String), ValidationError> {
        Ok((
            name_or(self.stream, &defaults.stream, "stream")?,
            name_or(self.group, &defaults.group, "group")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn defaults() -> StreamDefaults {
        StreamDefaults::default()
    }

    #[test]
    fn test_omitted_arguments_use_defaults() {
        let read: ReadArgs = serde_json::from_value(json!({})).unwrap();
        let read = read.resolve(&defaults()).unwrap();
        assert_eq!(read.stream, "agent:events");
        assert_eq!(read.from, ReadFrom::Latest);
        assert_eq!(read.count, 1);
        assert_eq!(read.block, None);

        let group_read: GroupReadArgs = serde_json::from_value(json!({})).unwrap();
        let group_read = group_read.resolve(&defaults()).unwrap();
        assert_eq!(group_read.group, "triage");
        assert_eq!(group_read.consumer, "worker-1");
        assert_eq!(group_read.from, GroupReadFrom::Undelivered);
        assert_eq!(group_read.block, Some(Duration::from_millis(15_000)));

        let create: CreateGroupArgs = serde_json::from_value(json!({})).unwrap();
        let create = create.resolve(&defaults()).unwrap();
        assert_eq!(create.start, GroupStart::Latest);
        assert!(create.mkstream);
    }

    #[test]
    fn test_explicit_arguments() {
        let args: GroupReadArgs = serde_json::from_value(json!({
            "stream": "jobs",
            "group": "builders",
            "consumer": "b-2",
            "count": 5,
            "block_ms": 0,
            "id": "0"
        }))
        .unwrap();
        let options = args.resolve(&defaults()).unwrap();
        assert_eq!(options.stream, "jobs");
        assert_eq!(options.consumer, "b-2");
        assert_eq!(options.count, 5);
        assert_eq!(options.block, None);
        assert_eq!(options.from, GroupReadFrom::PendingAfter(StreamId::MIN));
    }

    #[test]
    fn test_append_validation() {
        let args: AppendArgs = serde_json::from_value(json!({"fields": {}})).unwrap();
        assert!(matches!(
            args.resolve(&defaults()),
            Err(ValidationError::Fields(_))
        ));

        let args: AppendArgs =
            serde_json::from_value(json!({"fields": {"a": 1}, "id": "not-an-id"})).unwrap();
        assert!(matches!(
            args.resolve(&defaults()),
            Err(ValidationError::Id { argument: "id", .. })
        ));

        let args: AppendArgs =
            serde_json::from_value(json!({"stream": "", "fields": {"a": 1}})).unwrap();
        assert_eq!(args.resolve(&defaults()), Err(ValidationError::Empty("stream")));

        let args: AppendArgs =
            serde_json::from_value(json!({"fields": {"a": 1}, "id": "*"})).unwrap();
        assert_eq!(args.resolve(&defaults()).unwrap().id, AppendId::Auto);
    }

    #[test]
    fn test_count_zero_rejected() {
        let args: ReadArgs = serde_json::from_value(json!({"count": 0})).unwrap();
        assert_eq!(args.resolve(&defaults()), Err(ValidationError::ZeroCount));
    }

    #[test]
    fn test_ack_validation() {
        let args: AckArgs = serde_json::from_value(json!({"ids": []})).unwrap();
        assert_eq!(args.resolve(&defaults()), Err(ValidationError::NoIds));

        let args: AckArgs = serde_json::from_value(json!({"ids": ["1-0", ">"]})).unwrap();
        assert!(matches!(
            args.resolve(&defaults()),
            Err(ValidationError::Id { argument: "ids", .. })
        ));

        let args: AckArgs = serde_json::from_value(json!({"ids": ["1-0", "2-5"]})).unwrap();
        let call = args.resolve(&defaults()).unwrap();
        assert_eq!(call.ids, vec![StreamId::new(1, 0), StreamId::new(2, 5)]);
        assert_eq!(call.group, "triage");
    }

    #[test]
    fn test_publish_requires_channel() {
        let args = PublishArgs {
            channel: String::new(),
            message: "hi".to_string(),
        };
        assert_eq!(args.resolve(), Err(ValidationError::Empty("channel")));

        let args = PublishArgs {
            channel: " \t".to_string(),
            message: "hi".to_string(),
        };
        assert_eq!(args.resolve(), Err(ValidationError::Empty("channel")));
    }

    #[test]
    fn test_append_keeps_field_order() {
        let args: AppendArgs =
            serde_json::from_str(r#"{"fields": {"z": 1, "a": 2}}"#).unwrap();
        let call = args.resolve(&defaults()).unwrap();
        assert_eq!(
            call.fields.to_text_pairs(),
            vec![
                ("z".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string())
            ]
        );
    }
}

//! Stream operations behind the tool surface
//!
//! `StreamFacade` validates tool arguments, fills in configured defaults,
//! performs one broker call and shapes the reply. It holds no state between
//! calls, so one instance is shared by every request.

use std::sync::Arc;

use super::args::{
    AckArgs, AppendArgs, CreateGroupArgs, GroupReadArgs, PendingArgs, PublishArgs, ReadArgs,
};
use super::error::FacadeResult;
use super::reply::{
    Acknowledged, Appended, GroupCreated, Pending, Pong, Published, ReadData, Reply,
    GROUP_EXISTS_NOTE,
};
use crate::broker::{BrokerClient, BrokerError};
use crate::config::StreamDefaults;
use crate::logging::Logger;

pub struct StreamFacade {
    broker: Arc<dyn BrokerClient>,
    defaults: StreamDefaults,
    logger: Arc<dyn Logger>,
}

impl StreamFacade {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        defaults: StreamDefaults,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            broker,
            defaults,
            logger,
        }
    }

    pub fn defaults(&self) -> &StreamDefaults {
        &self.defaults
    }

    pub fn broker(&self) -> &Arc<dyn BrokerClient> {
        &self.broker
    }

    /// Health check
    pub async fn ping(&self) -> FacadeResult<Reply<Pong>> {
        let pong = self.broker.ping().await?;
        Ok(Reply::ok(Pong { pong }))
    }

    /// Fire-and-forget publish; replies with the listener count
    pub async fn publish(&self, args: PublishArgs) -> FacadeResult<Reply<Published>> {
        let (channel, message) = args.resolve()?;
        let subscribers = self.broker.publish(&channel, &message).await?;
        crate::log_debug!(
            self.logger,
            "[StreamFacade] Published to {} ({} subscribers)",
            channel, subscribers
        );
        Ok(Reply::ok(Published { subscribers }))
    }

    /// Append one entry
    pub async fn append(&self, args: AppendArgs) -> FacadeResult<Reply<Appended>> {
        let call = args.resolve(&self.defaults)?;
        let id = self.broker.append(&call.stream, call.id, &call.fields).await?;
        crate::log_debug!(
            self.logger,
            "[StreamFacade] Appended {} to {} ({} fields)",
            id,
            call.stream,
            call.fields.len()
        );
        Ok(Reply::ok(Appended {
            stream: call.stream,
            id,
        }))
    }

    /// Plain read; touches no group state
    pub async fn read(&self, args: ReadArgs) -> FacadeResult<Reply<ReadData>> {
        let options = args.resolve(&self.defaults)?;
        let entries = self.broker.read(&options).await?;
        Ok(Reply::ok(ReadData::from_entries(&options.stream, entries)))
    }

    /// Create a consumer group; an existing group is reported with a note
    pub async fn create_group(&self, args: CreateGroupArgs) -> FacadeResult<Reply<GroupCreated>> {
        let requested = args.id.clone();
        let options = args.resolve(&self.defaults)?;
        let note = match self.broker.create_group(&options).await {
            Ok(()) => None,
            Err(BrokerError::GroupExists { .. }) => {
                crate::log_debug!(
                    self.logger,
                    "[StreamFacade] Group {} already exists on {}",
                    options.group, options.stream
                );
                Some(GROUP_EXISTS_NOTE.to_string())
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Reply::ok(GroupCreated {
            stream: options.stream,
            group: options.group,
            id: requested.unwrap_or_else(|| options.start.to_string()),
            note,
        }))
    }

    /// Read as a group consumer
    pub async fn group_read(&self, args: GroupReadArgs) -> FacadeResult<Reply<ReadData>> {
        let options = args.resolve(&self.defaults)?;
        let entries = self.broker.read_group(&options).await?;
        if !entries.is_empty() {
            crate::log_debug!(
                self.logger,
                "[StreamFacade] Delivered {} entries from {} to {}/{}",
                entries.len(),
                options.stream,
                options.group,
                options.consumer
            );
        }
        Ok(Reply::ok(ReadData::from_entries(&options.stream, entries)))
    }

    /// Acknowledge entries; the count covers only entries that were pending
    pub async fn ack(&self, args: AckArgs) -> FacadeResult<Reply<Acknowledged>> {
        let call = args.resolve(&self.defaults)?;
        let acknowledged = self.broker.ack(&call.stream, &call.group, &call.ids).await?;
        if acknowledged < call.ids.len() as u64 {
            crate::log_debug!(
                self.logger,
                "[StreamFacade] Acknowledged {} of {} ids on {}/{}",
                acknowledged,
                call.ids.len(),
                call.stream,
                call.group
            );
        }
        Ok(Reply::ok(Acknowledged { acknowledged }))
    }

    /// Summarize a group's pending entries
    pub async fn pending(&self, args: PendingArgs) -> FacadeResult<Reply<Pending>> {
        let (stream, group) = args.resolve(&self.defaults)?;
        let pending = self.broker.pending(&stream, &group).await?;
        Ok(Reply::ok(Pending { pending }))
    }
}

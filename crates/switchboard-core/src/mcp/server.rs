//! MCP server exposing the stream tools
//!
//! Each tool forwards to `StreamFacade` and returns the reply envelope as a
//! single JSON text item. Argument problems are protocol-level
//! `invalid_params` errors; broker failures are tool results flagged as errors
//! so the calling agent can read the code and decide what to do.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;

use crate::facade::{
    AckArgs, AppendArgs, CreateGroupArgs, ErrorReply, FacadeError, FacadeResult, GroupReadArgs,
    PendingArgs, PublishArgs, ReadArgs, StreamFacade,
};
use crate::logging::Logger;

/// Name advertised during initialization
pub const SERVER_NAME: &str = "agent-switchboard-mcp";

/// Tool names, in registration order
pub const TOOL_NAMES: [&str; 8] = [
    "redis_ping",
    "redis_publish",
    "redis_xadd",
    "redis_xread",
    "redis_xgroup_create",
    "redis_xreadgroup",
    "redis_xack",
    "redis_xpending",
];

#[derive(Clone)]
pub struct SwitchboardServer {
    facade: Arc<StreamFacade>,
    logger: Arc<dyn Logger>,
    tool_router: ToolRouter<Self>,
}

impl SwitchboardServer {
    fn render<T: Serialize>(
        &self,
        tool: &str,
        result: FacadeResult<T>,
    ) -> Result<CallToolResult, McpError> {
        match result {
            Ok(reply) => Ok(CallToolResult::success(vec![Content::text(to_json(&reply)?)])),
            Err(FacadeError::Validation(err)) => {
                crate::log_debug!(self.logger, "[SwitchboardServer] {} rejected: {}", tool, err);
                Err(McpError::invalid_params(err.to_string(), None))
            }
            Err(err) => {
                crate::log_warn!(self.logger, "[SwitchboardServer] {} failed: {}", tool, err);
                let reply = ErrorReply::from(&err);
                Ok(CallToolResult::error(vec![Content::text(to_json(&reply)?)]))
            }
        }
    }

    fn instructions(&self) -> String {
        let defaults = self.facade.defaults();
        format!(
            "Redis streams and pub/sub for coordinating agents.\n\
             Omitted arguments default to stream `{}`, group `{}`, consumer `{}`.\n\
             - redis_xadd appends an event; redis_xread reads without a group\n\
             - redis_xgroup_create, then redis_xreadgroup with id `>` to claim new entries\n\
             - redis_xack once an entry is handled; redis_xpending shows what is still owed\n\
             - re-read your own unacknowledged entries with redis_xreadgroup id `0`\n\
             Stream `{}` is reserved for session logs.",
            defaults.stream, defaults.group, defaults.consumer, defaults.session_stream
        )
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl SwitchboardServer {
    pub fn new(facade: Arc<StreamFacade>, logger: Arc<dyn Logger>) -> Self {
        Self {
            facade,
            logger,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(name = "redis_ping", description = "Check that the broker is reachable")]
    async fn ping(&self) -> Result<CallToolResult, McpError> {
        self.render("redis_ping", self.facade.ping().await)
    }

    #[tool(
        name = "redis_publish",
        description = "Publish a message on a pub/sub channel. Fire-and-forget: only current subscribers receive it. Returns the subscriber count."
    )]
    async fn publish(
        &self,
        Parameters(args): Parameters<PublishArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.render("redis_publish", self.facade.publish(args).await)
    }

    #[tool(
        name = "redis_xadd",
        description = "Append an entry to a stream. Fields are a flat object of strings, numbers or booleans. Returns the assigned id."
    )]
    async fn append(
        &self,
        Parameters(args): Parameters<AppendArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.render("redis_xadd", self.facade.append(args).await)
    }

    #[tool(
        name = "redis_xread",
        description = "Read entries after an id without a consumer group. Optionally wait up to block_ms for new entries."
    )]
    async fn read(&self, Parameters(args): Parameters<ReadArgs>) -> Result<CallToolResult, McpError> {
        self.render("redis_xread", self.facade.read(args).await)
    }

    #[tool(
        name = "redis_xgroup_create",
        description = "Create a consumer group on a stream. Creating an existing group succeeds with a note."
    )]
    async fn create_group(
        &self,
        Parameters(args): Parameters<CreateGroupArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.render("redis_xgroup_create", self.facade.create_group(args).await)
    }

    #[tool(
        name = "redis_xreadgroup",
        description = "Read as a consumer of a group. Each new entry goes to exactly one consumer and stays pending until acknowledged."
    )]
    async fn group_read(
        &self,
        Parameters(args): Parameters<GroupReadArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.render("redis_xreadgroup", self.facade.group_read(args).await)
    }

    #[tool(
        name = "redis_xack",
        description = "Acknowledge processed entries. Returns how many were pending; repeating an ack is harmless."
    )]
    async fn ack(&self, Parameters(args): Parameters<AckArgs>) -> Result<CallToolResult, McpError> {
        self.render("redis_xack", self.facade.ack(args).await)
    }

    #[tool(
        name = "redis_xpending",
        description = "Summarize a group's delivered but unacknowledged entries, per consumer."
    )]
    async fn pending(
        &self,
        Parameters(args): Parameters<PendingArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.render("redis_xpending", self.facade.pending(args).await)
    }
}

#[tool_handler]
impl ServerHandler for SwitchboardServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: Some("Agent Switchboard".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
            instructions: Some(self.instructions()),
            ..Default::default()
        }
    }
}

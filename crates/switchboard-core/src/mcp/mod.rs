//! MCP (Model Context Protocol) server module
//!
//! Serves the stream tools over any rmcp transport. The binary uses stdio:
//!
//! ```rust,ignore
//! use rmcp::{transport::stdio, ServiceExt};
//! use switchboard_core::mcp::SwitchboardServer;
//!
//! let server = SwitchboardServer::new(facade, logger);
//! server.serve(stdio()).await?.waiting().await?;
//! ```

mod server;

pub use server::{SwitchboardServer, SERVER_NAME, TOOL_NAMES};

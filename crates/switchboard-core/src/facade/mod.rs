//! Stream operations facade
//!
//! Sits between the tool surfaces (MCP server, REST bridge) and the broker:
//!
//! - `args`: tool arguments and their validation
//! - `reply`: reply envelopes
//! - `StreamFacade`: one method per operation

mod args;
mod error;
mod reply;
mod stream_facade;

pub use args::{
    AckArgs, AckCall, AppendArgs, AppendCall, CreateGroupArgs, GroupReadArgs, PendingArgs,
    PublishArgs, ReadArgs,
};
pub use error::{FacadeError, FacadeResult, ValidationError};
pub use reply::{
    Acknowledged, Appended, ErrorBody, ErrorReply, GroupCreated, Message, Pending, Pong,
    Published, ReadData, Reply, StreamMessages, GROUP_EXISTS_NOTE,
};
pub use stream_facade::StreamFacade;

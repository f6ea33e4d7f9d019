//! Client-side conversation logic for a streaming chat agent: the
//! transcript, the reducer folding agent events into it, and a session
//! driving one exchange at a time over any transport.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod display;
mod error;
mod reducer;
mod session;
pub mod transcript;

pub use display::{ToolDisplay, ToolDisplayRegistry};
pub use error::{ExchangeError, SessionClosedError};
pub use reducer::{
    Applied, ExchangeStage, StreamingTranscriptReducer, SubmitRejection,
};
pub use session::{
    ChatSession, ChatSessionBuilder, SessionSnapshot, SubmitOutcome,
};
pub use transcript::{
    ConversationTurn, InvocationId, Role, ToolInvocation, ToolStatus,
    Transcript, TurnId,
};

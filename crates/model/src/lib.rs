//! The protocol between a chat client and a remote agent service.
//!
//! This crate describes what one exchange with the agent looks like: the
//! request the client sends, and the ordered events the agent streams
//! back. It deliberately knows nothing about how the bytes travel, so
//! the transcript logic can be driven by an HTTP transport in production
//! and by a scripted one in tests.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod request;
mod response;
mod transport;

pub use error::*;
pub use request::*;
pub use response::*;
pub use transport::*;

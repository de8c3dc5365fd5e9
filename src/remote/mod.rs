// ABOUTME: Remote resource client abstraction for cloud labs.
// ABOUTME: Capability traits, poll-to-completion, errors, and an in-memory lab.

mod error;
pub mod memory;
mod poll;
mod traits;

pub use error::RemoteError;
pub use poll::{OperationStatus, PollOptions, poll_to_completion};
pub use traits::*;

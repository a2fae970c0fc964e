//! Abstract interface for addressable, bounded, replayable message streams
//! connecting the nodes of a dataflow graph.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

/// Handles address streams and mint sequence-numbered messages.
pub mod handle;

/// Messages are immutable envelopes carried by streams.
pub mod message;

/// Nodes own the streams they open.
pub mod node;

/// Readers are per-consumer cursors over a stream.
pub mod reader;

/// Requests and commands exchanged with the execution runtime.
pub mod request;

/// Set identifiers scope streams to a streaming session.
pub mod set_id;

/// Streams are ordered, indexed sequences of messages.
pub mod stream;

pub use error::Error;
pub use handle::{Handle, Header};
pub use message::{Message, Payload};
pub use node::NodeRef;
pub use reader::StreamReader;
pub use request::{Command, CreateStream, MakeFile, MessageRequest, Pullable};
pub use set_id::SetId;
pub use stream::{ReplayStream, Stream, StreamError, StreamOptions, StreamState};

use crate::handle::{Handle, Header};
use crate::message::Message;
use crate::node::NodeRef;
use crate::request::{CreateStream, Pullable};
use crate::set_id::SetId;

use std::error::Error;
use std::fmt::Debug;

/// Marker trait for stream errors
pub trait StreamError: Clone + Debug + Error + Send + Sync + 'static {}

/// Marker trait for stream options
pub trait StreamOptions: Clone + Debug + Default + Send + Sync + 'static {}

/// Lifecycle of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Nothing appended yet; the next message must be the self-announcement.
    Unannounced,

    /// Announced and accepting messages.
    Open,

    /// The end-of-stream message was appended. No further appends.
    Ended,

    /// The stream was destroyed and no longer serves reads or writes.
    Destroyed,
}

/// A read-only view of a stream's identity and state.
pub trait Stream<T>
where
    Self: Debug + Send + Sync + 'static,
    T: Clone + Debug + Send + Sync + 'static,
{
    /// The stream address.
    fn handle(&self) -> &Handle;

    /// Current lifecycle state.
    fn state(&self) -> StreamState;

    /// Diagnostic dump of the retained messages, newest first.
    fn info(&self) -> Vec<String>;

    /// The session the stream belongs to.
    fn set_id(&self) -> SetId {
        self.handle().set_id()
    }

    /// The node owning the stream.
    fn node(&self) -> &NodeRef {
        self.handle().node()
    }

    /// The stream name.
    fn name(&self) -> &str {
        self.handle().name()
    }

    /// Whether this is a group stream.
    fn is_group(&self) -> bool {
        self.handle().is_group()
    }

    /// Whether the end-of-stream message has been appended.
    fn is_ended(&self) -> bool;
}

/// A stream retaining a window of recent messages for point lookups.
///
/// Producers append messages in index order; any number of consumers read by
/// index at their own pace. Reads are never blocking: a message that has not
/// been produced yet is reported as `None`, and the caller is expected to
/// retry once the producer made progress.
pub trait ReplayStream<T>
where
    Self: Stream<T> + Clone + Sized,
    T: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the stream.
    type Error: StreamError;

    /// The options for the stream.
    type Options: StreamOptions;

    /// Creates a stream for the given handle.
    ///
    /// # Errors
    ///
    /// Fails if the options are invalid.
    fn new(handle: Handle, options: Self::Options) -> Result<Self, Self::Error>;

    /// Appends the next message.
    ///
    /// # Errors
    ///
    /// Fails if the message is addressed to another stream, is out of order,
    /// arrives after the end of the stream, or carries a payload the stream
    /// does not accept.
    fn append(&self, message: Message<T>) -> Result<(), Self::Error>;

    /// Looks up the message at the requested index.
    ///
    /// Returns `Ok(None)` if the message was not produced yet.
    ///
    /// # Errors
    ///
    /// Fails if the request is addressed to another stream or the message
    /// already left the retention window.
    fn get<R>(&self, request: &R) -> Result<Option<Message<T>>, Self::Error>
    where
        R: Pullable;

    /// Creates a child stream below this group stream.
    ///
    /// # Errors
    ///
    /// Fails if this is not a group stream.
    fn spawn_child<N>(&self, name: N, group: bool, header: Header) -> Result<Self, Self::Error>
    where
        N: Into<String>;

    /// Fulfills a child stream request addressed to this stream.
    ///
    /// # Errors
    ///
    /// Fails if the request targets another stream or the child cannot be
    /// spawned.
    fn fulfill(&self, request: &CreateStream) -> Result<Self, Self::Error>;

    /// The oldest and newest retained indices, if anything is retained.
    fn window(&self) -> Option<(i64, i64)>;

    /// Releases the retained messages. Children are not affected.
    fn destroy(&self);
}

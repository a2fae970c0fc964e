use flowline_streams::StreamError;
use thiserror::Error;

/// Error type for memory stream operations.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The stream has been destroyed.
    #[error("stream {0} was destroyed")]
    Destroyed(String),

    /// A child with this name was already spawned.
    #[error("child stream {0} already exists")]
    DuplicateChildName(String),

    /// Capacity must be at least one message.
    #[error("stream capacity must be at least 1")]
    InvalidCapacity,

    /// Index -1 must carry the stream's own handle.
    #[error("stream {0} must be announced with its own handle")]
    InvalidAnnouncement(String),

    /// Data streams only carry a handle in the self-announcement.
    #[error("data stream {stream} got a handle at index {index}")]
    InvalidDataPayload {
        /// The stream address.
        stream: String,
        /// The offending index.
        index: i64,
    },

    /// Group streams only carry handles and the end-of-stream marker.
    #[error("group stream {stream} got data at index {index}")]
    InvalidGroupPayload {
        /// The stream address.
        stream: String,
        /// The offending index.
        index: i64,
    },

    /// The message was addressed to another stream.
    #[error("message for {actual} appended to {expected}")]
    MisroutedEnvelope {
        /// The stream that received the message.
        expected: String,
        /// The stream the message belongs to.
        actual: String,
    },

    /// The request was addressed to another stream.
    #[error("request for {actual} sent to {expected}")]
    MisroutedRequest {
        /// The stream that received the request.
        expected: String,
        /// The stream the request is addressed to.
        actual: String,
    },

    /// Messages and requests need an index.
    #[error("missing index for stream {0}")]
    MissingIndex(String),

    /// Only child streams of group streams can be spawned.
    #[error("{0} is not a group stream")]
    NotAGroupHandle(String),

    /// Messages must be appended without gaps or duplicates.
    #[error("out of order append: expected index {expected}, got {actual}")]
    OutOfOrderAppend {
        /// The next index the stream accepts.
        expected: i64,
        /// The index that was appended.
        actual: i64,
    },

    /// The requested message already left the retention window.
    #[error("message {index} is no longer retained (offset {offset})")]
    RequestedMessageTooOld {
        /// The requested index.
        index: i64,
        /// Distance from the newest retained message.
        offset: i64,
    },

    /// The end-of-stream message was already appended.
    #[error("stream {0} already ended")]
    StreamAlreadyEnded(String),
}

impl StreamError for Error {}

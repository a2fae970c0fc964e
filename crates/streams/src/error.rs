use thiserror::Error;

/// Errors raised while addressing streams or building messages.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The handle already minted its self-announcement (or later messages).
    #[error("{0} was already announced")]
    AlreadyAnnounced(String),

    /// Message indices start at -1.
    #[error("invalid message index {0}")]
    InvalidIndex(i64),

    /// Group handles only carry nested handles or the end-of-stream marker.
    #[error("group handle {0} only carries handles or end-of-stream")]
    InvalidPayloadKind(String),

    /// Child streams can only be requested from group handles.
    #[error("{0} is not a group handle")]
    NotAGroupHandle(String),

    /// The handle header has no such key.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
}

use crate::Error;
use crate::handle::Handle;

use std::fmt;

/// What a message carries.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload<T> {
    /// Application data.
    Data(T),

    /// A stream address. On group streams this announces a child stream; at
    /// index -1 it is the stream announcing itself.
    Handle(Handle),

    /// End of stream. Always the last message of a stream.
    End,
}

impl<T> Payload<T> {
    /// Whether this is application data.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Whether this is a nested handle.
    #[must_use]
    pub const fn is_handle(&self) -> bool {
        matches!(self, Self::Handle(_))
    }

    /// Whether this is the end-of-stream marker.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// The application data, if any.
    #[must_use]
    pub const fn as_data(&self) -> Option<&T> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    /// The nested handle, if any.
    #[must_use]
    pub const fn as_handle(&self) -> Option<&Handle> {
        match self {
            Self::Handle(handle) => Some(handle),
            _ => None,
        }
    }
}

impl<T> From<Handle> for Payload<T> {
    fn from(handle: Handle) -> Self {
        Self::Handle(handle)
    }
}

/// An immutable `(index, handle, payload)` envelope.
///
/// Two messages are equal when they occupy the same slot, i.e. have the same
/// index on the same stream. The payload is not compared.
#[derive(Clone)]
pub struct Message<T> {
    index: Option<i64>,
    handle: Handle,
    payload: Payload<T>,
}

impl<T> Message<T> {
    /// Creates a message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if `index` is below -1.
    pub fn new(index: Option<i64>, handle: Handle, payload: Payload<T>) -> Result<Self, Error> {
        match index {
            Some(index) if index < -1 => Err(Error::InvalidIndex(index)),
            _ => Ok(Self::from_parts(index, handle, payload)),
        }
    }

    /// Creates a message that has not been assigned an index yet.
    #[must_use]
    pub const fn pending(handle: Handle, payload: Payload<T>) -> Self {
        Self::from_parts(None, handle, payload)
    }

    pub(crate) const fn from_parts(
        index: Option<i64>,
        handle: Handle,
        payload: Payload<T>,
    ) -> Self {
        Self {
            index,
            handle,
            payload,
        }
    }

    /// Position of the message in its stream, if assigned.
    #[must_use]
    pub const fn index(&self) -> Option<i64> {
        self.index
    }

    /// The stream this message belongs to.
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    /// What the message carries.
    #[must_use]
    pub const fn payload(&self) -> &Payload<T> {
        &self.payload
    }

    /// Whether this is the stream's self-announcement.
    #[must_use]
    pub fn is_announcement(&self) -> bool {
        self.index == Some(-1) && self.payload.as_handle() == Some(&self.handle)
    }

    /// Whether this message ends its stream.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.payload.is_end()
    }

    /// Splits the message into its index, handle and payload.
    #[must_use]
    pub fn into_parts(self) -> (Option<i64>, Handle, Payload<T>) {
        (self.index, self.handle, self.payload)
    }
}

impl<T> PartialEq for Message<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.handle == other.handle
    }
}

impl<T> Eq for Message<T> {}

impl<T> fmt::Debug for Message<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = match self.payload {
            Payload::Data(_) => "",
            Payload::Handle(_) => " HANDLE",
            Payload::End => " THEEND",
        };

        match self.index {
            Some(index) => write!(f, "Message({index}, {:?}{flag})", self.handle),
            None => write!(f, "Message(pending, {:?}{flag})", self.handle),
        }
    }
}

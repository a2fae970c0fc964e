use crate::handle::{Handle, Header};
use crate::message::Message;

/// Something a consumer can pull a message with.
pub trait Pullable {
    /// The stream the pull is addressed to.
    fn handle(&self) -> &Handle;

    /// The requested message index, if known.
    fn index(&self) -> Option<i64>;
}

impl<T> Pullable for Message<T> {
    fn handle(&self) -> &Handle {
        Self::handle(self)
    }

    fn index(&self) -> Option<i64> {
        Self::index(self)
    }
}

/// Request for the message at one index of a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRequest {
    handle: Handle,
    index: i64,
}

impl MessageRequest {
    /// Creates a request for `index` on the stream addressed by `handle`.
    #[must_use]
    pub const fn new(handle: Handle, index: i64) -> Self {
        Self { handle, index }
    }

    /// The same request one index further along. Saturates at `i64::MAX`.
    #[must_use]
    pub fn next(&self) -> Self {
        Self::new(self.handle.clone(), self.index.saturating_add(1))
    }
}

impl Pullable for MessageRequest {
    fn handle(&self) -> &Handle {
        &self.handle
    }

    fn index(&self) -> Option<i64> {
        Some(self.index)
    }
}

/// Request for the runtime to open a child stream below a group stream.
///
/// The runtime fulfills it by asking the parent stream to spawn the child.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateStream {
    parent: Handle,
    name: String,
    group: bool,
    header: Header,
}

impl CreateStream {
    pub(crate) fn new<N>(parent: Handle, name: N, group: bool, header: Header) -> Self
    where
        N: Into<String>,
    {
        Self {
            parent,
            name: name.into(),
            group,
            header,
        }
    }

    /// The group stream the child is opened below.
    #[must_use]
    pub const fn parent(&self) -> &Handle {
        &self.parent
    }

    /// The child stream name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the child is itself a group stream.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        self.group
    }

    /// The child stream metadata.
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }
}

/// Request for the runtime to create an output file on behalf of a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MakeFile {
    handle: Handle,
    name: String,
}

impl MakeFile {
    pub(crate) fn new<N>(handle: Handle, name: N) -> Self
    where
        N: Into<String>,
    {
        Self {
            handle,
            name: name.into(),
        }
    }

    /// The stream asking for the file.
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    /// The file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Everything a node hands over to the runtime that drives it.
#[derive(Clone, Debug)]
pub enum Command<T> {
    /// Append a message to its stream.
    Emit(Message<T>),

    /// Wait until a message is available and deliver it.
    Pull(MessageRequest),

    /// Open a child stream.
    CreateStream(CreateStream),

    /// Create an output file.
    MakeFile(MakeFile),
}

impl<T> Command<T> {
    /// The stream the command is about.
    pub const fn handle(&self) -> &Handle {
        match self {
            Self::Emit(message) => message.handle(),
            Self::Pull(request) => &request.handle,
            Self::CreateStream(request) => request.parent(),
            Self::MakeFile(request) => request.handle(),
        }
    }
}

impl<T> From<Message<T>> for Command<T> {
    fn from(message: Message<T>) -> Self {
        Self::Emit(message)
    }
}

impl<T> From<MessageRequest> for Command<T> {
    fn from(request: MessageRequest) -> Self {
        Self::Pull(request)
    }
}

impl<T> From<CreateStream> for Command<T> {
    fn from(request: CreateStream) -> Self {
        Self::CreateStream(request)
    }
}

impl<T> From<MakeFile> for Command<T> {
    fn from(request: MakeFile) -> Self {
        Self::MakeFile(request)
    }
}

use crate::Error;
use crate::message::{Message, Payload};
use crate::node::NodeRef;
use crate::request::{CreateStream, MakeFile, MessageRequest};
use crate::set_id::SetId;

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Stream metadata, fixed when the handle is created.
pub type Header = BTreeMap<String, serde_json::Value>;

struct HandleInner {
    set_id: SetId,
    node: NodeRef,
    name: String,
    group: bool,
    header: Header,
    // Next index to hand out. Starts at -1, the self-announcement slot.
    next_index: AtomicI64,
}

/// Stable address of a stream and the source of its message indices.
///
/// A handle is identified by `(set_id, node, name)`. Clones refer to the same
/// handle and therefore share one sequence cursor, so envelopes can embed the
/// handle freely without forking the index sequence.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<HandleInner>,
}

impl Handle {
    /// Creates a handle whose group mode follows the owning node.
    pub fn new<N>(set_id: SetId, node: NodeRef, name: N) -> Self
    where
        N: Into<String>,
    {
        let group = node.is_group();
        Self::with_options(set_id, node, name, group, Header::new())
    }

    /// Creates a handle with an explicit group mode and header.
    pub fn with_options<N>(
        set_id: SetId,
        node: NodeRef,
        name: N,
        group: bool,
        header: Header,
    ) -> Self
    where
        N: Into<String>,
    {
        Self {
            inner: Arc::new(HandleInner {
                set_id,
                node,
                name: name.into(),
                group,
                header,
                next_index: AtomicI64::new(-1),
            }),
        }
    }

    /// The session this stream belongs to.
    #[must_use]
    pub fn set_id(&self) -> SetId {
        self.inner.set_id
    }

    /// The node owning this stream.
    #[must_use]
    pub fn node(&self) -> &NodeRef {
        &self.inner.node
    }

    /// The stream name, unique within node and session.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether this stream carries child handles instead of data.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.inner.group
    }

    /// The stream metadata.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.inner.header
    }

    /// Looks up a header value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAttribute`] if the header has no such key.
    pub fn attribute(&self, key: &str) -> Result<&serde_json::Value, Error> {
        self.inner
            .header
            .get(key)
            .ok_or_else(|| Error::UnknownAttribute(key.to_string()))
    }

    /// Dotted short address, `setid.node.name`.
    #[must_use]
    pub fn abbrev(&self) -> String {
        format!(
            "{}.{}.{}",
            self.inner.set_id.abbrev(),
            self.inner.node.abbrev(),
            self.inner.name
        )
    }

    /// The index the next minted message will receive.
    #[must_use]
    pub fn next_index(&self) -> i64 {
        self.inner.next_index.load(Ordering::Acquire)
    }

    /// Mints the next message of this stream.
    ///
    /// The first message minted by a handle has index -1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPayloadKind`] if this is a group handle and the
    /// payload is application data. The cursor is not advanced in that case.
    pub fn mint<T>(&self, payload: Payload<T>) -> Result<Message<T>, Error> {
        if self.is_group() && payload.is_data() {
            return Err(Error::InvalidPayloadKind(self.abbrev()));
        }

        let index = self.inner.next_index.fetch_add(1, Ordering::AcqRel);

        Ok(Message::from_parts(Some(index), self.clone(), payload))
    }

    /// Mints a data message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPayloadKind`] on group handles.
    pub fn data<T>(&self, data: T) -> Result<Message<T>, Error> {
        self.mint(Payload::Data(data))
    }

    /// Mints the self-announcement message (index -1, payload is this handle).
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyAnnounced`] if any message was minted before.
    pub fn announce<T>(&self) -> Result<Message<T>, Error> {
        self.inner
            .next_index
            .compare_exchange(-1, 0, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AlreadyAnnounced(self.abbrev()))?;

        Ok(Message::from_parts(
            Some(-1),
            self.clone(),
            Payload::Handle(self.clone()),
        ))
    }

    /// Mints the end-of-stream message.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the end marker is valid on every handle.
    pub fn finish<T>(&self) -> Result<Message<T>, Error> {
        self.mint(Payload::End)
    }

    /// Builds a request asking the runtime to open a child stream below this
    /// group stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAGroupHandle`] if this handle carries data.
    pub fn request_child_stream<N>(
        &self,
        name: N,
        group: bool,
        header: Header,
    ) -> Result<CreateStream, Error>
    where
        N: Into<String>,
    {
        if !self.is_group() {
            return Err(Error::NotAGroupHandle(self.abbrev()));
        }

        Ok(CreateStream::new(self.clone(), name, group, header))
    }

    /// Builds a request asking the runtime to create an output file for this
    /// stream.
    pub fn request_file_output<N>(&self, name: N) -> MakeFile
    where
        N: Into<String>,
    {
        MakeFile::new(self.clone(), name)
    }

    /// Builds a pull request for the message at `index`.
    #[must_use]
    pub fn request(&self, index: i64) -> MessageRequest {
        MessageRequest::new(self.clone(), index)
    }

    fn key(&self) -> (&SetId, &NodeRef, &str) {
        (&self.inner.set_id, &self.inner.node, &self.inner.name)
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.key() == other.key()
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Handle {}>", self.abbrev())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.abbrev())
    }
}

mod error;

pub use error::Error;

use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use flowline_streams::{
    CreateStream, Handle, Header, Message, Payload, Pullable, ReplayStream, Stream, StreamOptions,
    StreamState,
};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Number of messages a stream retains unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 50;

/// What to do when a group stream spawns a child under a name it already used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildNamePolicy {
    /// Refuse the second spawn.
    #[default]
    Reject,

    /// Spawn a fresh child; the runtime's latest registration wins.
    Replace,
}

/// Options for in-memory streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStreamOptions {
    /// How many of the most recent messages are retained.
    pub capacity: usize,

    /// Warn when a read lands within this many slots of eviction. 0 disables.
    pub near_miss_margin: usize,

    /// How duplicate child names are handled.
    pub child_names: ChildNamePolicy,
}

impl Default for MemoryStreamOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            near_miss_margin: 0,
            child_names: ChildNamePolicy::default(),
        }
    }
}

impl StreamOptions for MemoryStreamOptions {}

struct State<T> {
    // Newest first.
    retained: VecDeque<Message<T>>,
    newest: Option<i64>,
    ended: bool,
    destroyed: bool,
    evicted: u64,
    children: HashSet<String>,
}

struct Inner<T> {
    handle: Handle,
    options: MemoryStreamOptions,
    parent: Option<Weak<Inner<T>>>,
    state: Mutex<State<T>>,
}

/// An in-memory bounded replay stream.
///
/// Retains the last `capacity` messages, newest first. Reads address messages
/// by absolute index; reading a message that was evicted fails with
/// [`Error::RequestedMessageTooOld`] instead of returning something else.
///
/// Clones share the same buffer. Children spawned from a group stream keep a
/// weak reference to their parent and are not destroyed with it.
pub struct MemoryStream<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for MemoryStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> MemoryStream<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    fn build(
        handle: Handle,
        options: MemoryStreamOptions,
        parent: Option<Weak<Inner<T>>>,
    ) -> Result<Self, Error> {
        if options.capacity == 0 {
            return Err(Error::InvalidCapacity);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    retained: VecDeque::with_capacity(options.capacity.min(DEFAULT_CAPACITY)),
                    newest: None,
                    ended: false,
                    destroyed: false,
                    evicted: 0,
                    children: HashSet::new(),
                }),
                handle,
                options,
                parent,
            }),
        })
    }

    /// The stream this one was spawned from, if it is still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Self { inner })
    }

    /// Whether both values refer to the same stream instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The options the stream was created with.
    #[must_use]
    pub fn options(&self) -> &MemoryStreamOptions {
        &self.inner.options
    }

    /// Maximum number of retained messages.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.options.capacity
    }

    /// Number of currently retained messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().retained.len()
    }

    /// Whether no messages are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().retained.is_empty()
    }

    /// Number of messages dropped from the window so far.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.lock().evicted
    }

    /// Index of the last appended message.
    #[must_use]
    pub fn newest_index(&self) -> Option<i64> {
        self.lock().newest
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.inner.state.lock()
    }

    fn address(&self) -> String {
        self.inner.handle.abbrev()
    }

    fn check_payload(&self, index: i64, message: &Message<T>) -> Result<(), Error> {
        let group = self.inner.handle.is_group();

        match message.payload() {
            Payload::Data(_) if group => {
                return Err(Error::InvalidGroupPayload {
                    stream: self.address(),
                    index,
                });
            }
            Payload::Handle(_) if !group && index != -1 => {
                return Err(Error::InvalidDataPayload {
                    stream: self.address(),
                    index,
                });
            }
            _ => {}
        }

        if index == -1 && !message.is_announcement() {
            return Err(Error::InvalidAnnouncement(self.address()));
        }

        Ok(())
    }

    fn note_near_miss(&self, state: &State<T>, index: i64, position: usize) {
        let margin = self.inner.options.near_miss_margin;
        let capacity = self.inner.options.capacity;

        if margin > 0
            && state.retained.len() == capacity
            && position >= capacity.saturating_sub(margin)
        {
            warn!(
                stream = %self.address(),
                index,
                position,
                capacity,
                "read close to the eviction edge"
            );
        }
    }
}

impl<T> Debug for MemoryStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStream")
            .field("handle", &self.inner.handle)
            .field("capacity", &self.inner.options.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> Stream<T> for MemoryStream<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    fn state(&self) -> StreamState {
        let state = self.lock();

        if state.destroyed {
            StreamState::Destroyed
        } else if state.ended {
            StreamState::Ended
        } else if state.newest.is_none() {
            StreamState::Unannounced
        } else {
            StreamState::Open
        }
    }

    fn info(&self) -> Vec<String> {
        self.lock()
            .retained
            .iter()
            .map(|message| format!("{message:?}"))
            .collect()
    }

    fn is_ended(&self) -> bool {
        self.lock().ended
    }
}

impl<T> ReplayStream<T> for MemoryStream<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    type Error = Error;

    type Options = MemoryStreamOptions;

    fn new(handle: Handle, options: MemoryStreamOptions) -> Result<Self, Self::Error> {
        Self::build(handle, options, None)
    }

    fn append(&self, message: Message<T>) -> Result<(), Self::Error> {
        if message.handle() != &self.inner.handle {
            return Err(Error::MisroutedEnvelope {
                expected: self.address(),
                actual: message.handle().abbrev(),
            });
        }

        let Some(index) = message.index() else {
            return Err(Error::MissingIndex(self.address()));
        };

        let mut state = self.lock();

        if state.destroyed {
            return Err(Error::Destroyed(self.address()));
        }

        if state.ended {
            return Err(Error::StreamAlreadyEnded(self.address()));
        }

        let expected = state.newest.map_or(-1, |newest| newest + 1);
        if index != expected {
            return Err(Error::OutOfOrderAppend {
                expected,
                actual: index,
            });
        }

        self.check_payload(index, &message)?;

        debug!(stream = %self.address(), ?message, "added message");

        state.ended = message.is_end();
        state.newest = Some(index);
        state.retained.push_front(message);

        if state.retained.len() > self.inner.options.capacity {
            state.retained.pop_back();
            state.evicted += 1;
        }

        Ok(())
    }

    fn get<R>(&self, request: &R) -> Result<Option<Message<T>>, Self::Error>
    where
        R: Pullable,
    {
        if request.handle() != &self.inner.handle {
            return Err(Error::MisroutedRequest {
                expected: self.address(),
                actual: request.handle().abbrev(),
            });
        }

        let Some(index) = request.index() else {
            return Err(Error::MissingIndex(self.address()));
        };

        let state = self.lock();

        if state.destroyed {
            return Err(Error::Destroyed(self.address()));
        }

        let Some(newest) = state.newest else {
            return Ok(None);
        };

        let offset = newest.saturating_sub(index);
        if offset < 0 {
            return Ok(None);
        }

        let found = usize::try_from(offset)
            .ok()
            .and_then(|position| state.retained.get(position).map(|message| (position, message)));

        let Some((position, message)) = found else {
            warn!(
                stream = %self.address(),
                index,
                offset,
                retained = state.retained.len(),
                "requested message too old"
            );
            return Err(Error::RequestedMessageTooOld { index, offset });
        };

        self.note_near_miss(&state, index, position);
        debug!(stream = %self.address(), ?message, "return message");

        Ok(Some(message.clone()))
    }

    fn spawn_child<N>(&self, name: N, group: bool, header: Header) -> Result<Self, Self::Error>
    where
        N: Into<String>,
    {
        let name = name.into();

        if !self.inner.handle.is_group() {
            return Err(Error::NotAGroupHandle(self.address()));
        }

        {
            let mut state = self.lock();

            if state.destroyed {
                return Err(Error::Destroyed(self.address()));
            }

            if self.inner.options.child_names == ChildNamePolicy::Reject {
                // A child named like its parent would share the parent's address
                if name == self.inner.handle.name() || !state.children.insert(name.clone()) {
                    return Err(Error::DuplicateChildName(name));
                }
            }
        }

        let handle = Handle::with_options(
            self.inner.handle.set_id(),
            self.inner.handle.node().clone(),
            name,
            group,
            header,
        );
        let child = Self::build(
            handle,
            self.inner.options.clone(),
            Some(Arc::downgrade(&self.inner)),
        )?;

        debug!(stream = %self.address(), child = %child.address(), "spawned child stream");

        Ok(child)
    }

    fn fulfill(&self, request: &CreateStream) -> Result<Self, Self::Error> {
        if request.parent() != &self.inner.handle {
            return Err(Error::MisroutedRequest {
                expected: self.address(),
                actual: request.parent().abbrev(),
            });
        }

        self.spawn_child(request.name(), request.is_group(), request.header().clone())
    }

    fn window(&self) -> Option<(i64, i64)> {
        let state = self.lock();
        let oldest = state.retained.back()?.index()?;
        let newest = state.retained.front()?.index()?;

        Some((oldest, newest))
    }

    fn destroy(&self) {
        let mut state = self.lock();
        state.retained.clear();
        state.children.clear();
        state.destroyed = true;

        debug!(stream = %self.address(), "destroyed stream");
    }
}

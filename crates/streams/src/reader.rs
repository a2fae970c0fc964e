use crate::handle::Handle;
use crate::message::Message;
use crate::request::MessageRequest;
use crate::stream::ReplayStream;

use std::fmt::Debug;

/// A consumer's read position on one stream.
///
/// Positions only move forward. Several readers can follow the same stream
/// independently.
#[derive(Clone, Debug)]
pub struct StreamReader {
    handle: Handle,
    next_index: i64,
    finished: bool,
}

impl StreamReader {
    /// Creates a reader starting at the self-announcement.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self::starting_at(handle, -1)
    }

    /// Creates a reader starting at `index`.
    #[must_use]
    pub const fn starting_at(handle: Handle, index: i64) -> Self {
        Self {
            handle,
            next_index: index,
            finished: false,
        }
    }

    /// The stream being read.
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    /// The index the next poll asks for.
    #[must_use]
    pub const fn next_index(&self) -> i64 {
        self.next_index
    }

    /// Whether the end-of-stream message was read.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reads the next message, if it is available.
    ///
    /// # Errors
    ///
    /// Propagates stream errors, notably when the reader fell behind the
    /// retention window.
    pub fn poll<T, S>(&mut self, stream: &S) -> Result<Option<Message<T>>, S::Error>
    where
        S: ReplayStream<T>,
        T: Clone + Debug + Send + Sync + 'static,
    {
        if self.finished {
            return Ok(None);
        }

        let request = MessageRequest::new(self.handle.clone(), self.next_index);
        let message = stream.get(&request)?;

        if let Some(message) = &message {
            self.next_index = self.next_index.saturating_add(1);
            self.finished = message.is_end();
        }

        Ok(message)
    }

    /// Moves the reader forward to `index`. Earlier positions are ignored.
    pub fn skip_to(&mut self, index: i64) {
        self.next_index = self.next_index.max(index);
    }

    /// Moves the reader to the oldest message the stream still retains.
    ///
    /// Returns the new position, or `None` if the stream retains nothing.
    pub fn resubscribe<T, S>(&mut self, stream: &S) -> Option<i64>
    where
        S: ReplayStream<T>,
        T: Clone + Debug + Send + Sync + 'static,
    {
        let (oldest, _) = stream.window()?;
        self.skip_to(oldest);

        Some(self.next_index)
    }
}

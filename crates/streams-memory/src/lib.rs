//! In-memory bounded replay streams for single-process dataflow graphs.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod stream;

pub use stream::{ChildNamePolicy, DEFAULT_CAPACITY, Error, MemoryStream, MemoryStreamOptions};

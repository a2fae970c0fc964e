use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of the computation unit that owns a stream.
///
/// Nodes themselves live in the runtime; streams only need their name and
/// whether the streams they open are group streams by default.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    name: String,
    #[serde(default)]
    group: bool,
}

impl NodeRef {
    /// Creates a reference to a node whose streams carry data.
    #[must_use]
    pub fn new<N>(name: N) -> Self
    where
        N: Into<String>,
    {
        Self {
            name: name.into(),
            group: false,
        }
    }

    /// Creates a reference to a node whose streams are group streams.
    #[must_use]
    pub fn group<N>(name: N) -> Self
    where
        N: Into<String>,
    {
        Self {
            name: name.into(),
            group: true,
        }
    }

    /// The node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether handles created for this node default to group mode.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        self.group
    }

    /// Short form used in stream addresses.
    #[must_use]
    pub fn abbrev(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

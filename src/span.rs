use std::fmt;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// Half-open byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn of(node: Node<'_>) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True when the two spans share bytes but neither encloses the other.
    pub fn partially_overlaps(&self, other: Span) -> bool {
        self.start < other.end
            && other.start < self.end
            && !self.contains(other)
            && !other.contains(*self)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// 1-based line of the node's first byte.
pub fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

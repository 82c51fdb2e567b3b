use std::fmt;

use serde::Serialize;
use tree_sitter::Node;

use crate::span::line_of;

pub const WARNING_PREFIX: &str = "jest-codemods warning";

/// Non-fatal finding about a construct that was not (fully) rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    /// `jest-codemods warning: (<file>[ line <n>]) <message>`
    pub fn render(&self, file_name: &str) -> String {
        match self.line {
            Some(line) => format!(
                "{WARNING_PREFIX}: ({file_name} line {line}) {}",
                self.message
            ),
            None => format!("{WARNING_PREFIX}: ({file_name}) {}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Append-only diagnostics sink for one file.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Recorded>,
}

/// A diagnostic plus the start byte of the node it was raised on.
#[derive(Debug)]
struct Recorded {
    origin: Option<usize>,
    diagnostic: Diagnostic,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn_file(&mut self, message: impl Into<String>) {
        self.push(
            None,
            Diagnostic {
                line: None,
                message: message.into(),
            },
        );
    }

    /// Line-addressed entry for `node`. Raising the same message twice on one node records it once.
    pub fn warn_at(&mut self, node: Node<'_>, message: impl Into<String>) {
        self.push(
            Some(node.start_byte()),
            Diagnostic {
                line: Some(line_of(node)),
                message: message.into(),
            },
        );
    }

    fn push(&mut self, origin: Option<usize>, diagnostic: Diagnostic) {
        if self
            .entries
            .iter()
            .any(|entry| entry.origin == origin && entry.diagnostic == diagnostic)
        {
            return;
        }
        tracing::debug!(%diagnostic, "recorded diagnostic");
        self.entries.push(Recorded { origin, diagnostic });
    }

    /// File-level entries first, then source order.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.entries
            .sort_by_key(|entry| (entry.diagnostic.line.unwrap_or(0), entry.origin));
        self.entries
            .into_iter()
            .map(|entry| entry.diagnostic)
            .collect()
    }
}

pub fn incompatible_package(package: &str) -> String {
    format!("Usage of package \"{package}\" might be incompatible with Jest")
}

pub fn unsupported_property(context: &str, method: &str) -> String {
    format!("\"{context}.{method}\" is currently not supported")
}

pub fn unsupported_destructured_use(context: &str, method: &str) -> String {
    format!("\"{context}.{method}\" is only supported when called directly")
}

pub fn unknown_method(name: &str) -> String {
    format!("Unknown AVA method \"{name}\"")
}

pub const HOOK_SKIP_UNSUPPORTED: &str = "Skipping setup/teardown hooks is currently not supported";
pub const UNSUPPORTED_CONTEXT_PATTERN: &str =
    "Destructuring the test context this way is currently not supported";
pub const EXTRA_CALLBACK_PARAMETERS: &str =
    "Test callbacks with parameters after the test context are currently not supported";
pub const HOOK_FOCUS_UNSUPPORTED: &str = "Focusing setup/teardown hooks is currently not supported";

#[cfg(test)]
mod tests {
    use super::{Diagnostic, Diagnostics, unknown_method, unsupported_property};
    use crate::provider::TreeSitterProvider;

    #[test]
    fn render_includes_line_when_present() {
        let diagnostic = Diagnostic {
            line: Some(4),
            message: unsupported_property("t", "unknownAssert"),
        };
        assert_eq!(
            diagnostic.render("test.js"),
            "jest-codemods warning: (test.js line 4) \"t.unknownAssert\" is currently not supported"
        );
    }

    #[test]
    fn render_omits_line_for_file_level_entries() {
        let diagnostic = Diagnostic {
            line: None,
            message: super::incompatible_package("testdouble"),
        };
        assert_eq!(
            diagnostic.render("test.js"),
            "jest-codemods warning: (test.js) Usage of package \"testdouble\" might be incompatible with Jest"
        );
    }

    fn nodes(source: &str) -> (tree_sitter::Tree, Vec<usize>) {
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let starts = source
            .match_indices("skip(")
            .map(|(index, _)| index)
            .collect();
        (tree, starts)
    }

    #[test]
    fn same_line_occurrences_are_kept_and_revisits_dropped() {
        let source = "a.skip(1); b.skip(2);\n\nc.skip(3);\n";
        let (tree, starts) = nodes(source);
        let root = tree.root_node();
        let at = |byte: usize| {
            root.descendant_for_byte_range(byte, byte)
                .expect("node at byte")
        };

        let mut diagnostics = Diagnostics::new();
        diagnostics.warn_at(at(starts[2]), unknown_method("failing"));
        diagnostics.warn_at(at(starts[0]), unknown_method("failing"));
        diagnostics.warn_at(at(starts[1]), unknown_method("failing"));
        diagnostics.warn_at(at(starts[0]), unknown_method("failing"));
        diagnostics.warn_file("file level");

        let sorted = diagnostics.into_sorted();
        let lines = sorted.iter().map(|entry| entry.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![None, Some(1), Some(1), Some(3)]);
    }
}

use std::path::Path;

use tree_sitter::Tree;

use crate::error::CodemodError;
use crate::provider::normalize_extension;

mod catalog;
mod parser;

pub use catalog::{LanguageSpec, bundled_language_specs, javascript_language_spec};
use parser::parse_with_spec;

/// Parser front-end for one bundled grammar.
#[derive(Debug, Clone, Copy)]
pub struct TreeSitterProvider {
    spec: &'static LanguageSpec,
}

impl TreeSitterProvider {
    pub fn bundled() -> Vec<Self> {
        bundled_language_specs()
            .iter()
            .map(|spec| Self { spec })
            .collect()
    }

    pub fn javascript() -> Self {
        Self {
            spec: javascript_language_spec(),
        }
    }

    pub fn parse(&self, source: &[u8]) -> Result<Tree, CodemodError> {
        parse_with_spec(self.spec, source)
    }

    pub fn can_handle(&self, path: &Path) -> bool {
        let requested = path
            .extension()
            .and_then(|value| value.to_str())
            .and_then(normalize_extension);

        let Some(requested) = requested else {
            return false;
        };

        self.spec
            .extensions
            .iter()
            .filter_map(|supported| normalize_extension(supported))
            .any(|supported| supported == requested)
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn supported_extensions(&self) -> &'static [&'static str] {
        self.spec.extensions
    }
}

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::CodemodError;

mod tree_sitter;
mod util;

pub use tree_sitter::{LanguageSpec, TreeSitterProvider};
pub(crate) use util::{node_text, normalize_bare_cr_for_parser};

pub(crate) fn normalize_extension(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let without_dot = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if without_dot.is_empty() {
        return None;
    }

    Some(without_dot.to_lowercase())
}

pub struct ProviderRegistry {
    providers: Vec<TreeSitterProvider>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self {
            providers: TreeSitterProvider::bundled(),
        }
    }
}

impl ProviderRegistry {
    pub fn provider_for(&self, path: &Path) -> Result<&TreeSitterProvider, CodemodError> {
        if let Some(provider) = self
            .providers
            .iter()
            .find(|provider| provider.can_handle(path))
        {
            return Ok(provider);
        }

        let extension = path
            .extension()
            .and_then(|value| value.to_str())
            .and_then(normalize_extension)
            .unwrap_or_else(|| "<none>".to_string());

        Err(CodemodError::NoProvider {
            extension,
            supported_extensions: self.supported_extensions(),
        })
    }

    fn supported_extensions(&self) -> Vec<String> {
        let mut unique = BTreeSet::new();

        for provider in &self.providers {
            for extension in provider.supported_extensions() {
                if let Some(normalized) = normalize_extension(extension) {
                    unique.insert(normalized);
                }
            }
        }

        unique.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{ProviderRegistry, normalize_extension};
    use crate::error::CodemodError;

    #[test]
    fn provider_for_selects_grammar_by_extension() {
        let registry = ProviderRegistry::default();

        let js = registry
            .provider_for(Path::new("test/app.spec.js"))
            .expect("js should resolve");
        assert_eq!(js.name(), "tree-sitter-javascript");

        let ts = registry
            .provider_for(Path::new("test/app.spec.ts"))
            .expect("ts should resolve");
        assert_eq!(ts.name(), "tree-sitter-typescript");

        let tsx = registry
            .provider_for(Path::new("View.test.TSX"))
            .expect("tsx should resolve case-insensitively");
        assert_eq!(tsx.name(), "tree-sitter-tsx");
    }

    #[test]
    fn provider_for_reports_sorted_supported_extensions() {
        let registry = ProviderRegistry::default();
        let error = registry
            .provider_for(Path::new("notes.py"))
            .expect_err("python is not supported");

        match error {
            CodemodError::NoProvider {
                extension,
                supported_extensions,
            } => {
                assert_eq!(extension, "py");
                assert_eq!(
                    supported_extensions,
                    vec!["cjs", "cts", "js", "jsx", "mjs", "mts", "ts", "tsx"]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_extension_is_reported_as_none() {
        let registry = ProviderRegistry::default();
        let error = registry
            .provider_for(Path::new("Jakefile"))
            .expect_err("no extension");
        assert!(matches!(
            error,
            CodemodError::NoProvider { ref extension, .. } if extension == "<none>"
        ));
    }

    #[test]
    fn normalize_extension_strips_dot_and_lowercases() {
        assert_eq!(normalize_extension(".JS"), Some("js".to_string()));
        assert_eq!(normalize_extension("  "), None);
    }
}

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::CodemodError;

pub type BundledLanguageLoader = fn() -> tree_sitter::Language;

#[derive(Clone, Copy)]
pub struct LanguageSpec {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub(super) loader: BundledLanguageLoader,
    pub(super) syntax_error_message: &'static str,
    pub(super) normalize_bare_cr: bool,
}

impl LanguageSpec {
    pub(super) fn load(&self) -> Result<tree_sitter::Language, CodemodError> {
        catch_unwind(AssertUnwindSafe(self.loader)).map_err(|payload| {
            CodemodError::LanguageSetup {
                message: format!(
                    "panic while loading bundled tree-sitter language: {}",
                    panic_payload_to_string(payload)
                ),
            }
        })
    }
}

impl std::fmt::Debug for LanguageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageSpec")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .finish()
    }
}

const JAVASCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];
const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "mts", "cts"];
const TSX_EXTENSIONS: &[&str] = &["tsx"];

const JAVASCRIPT_LANGUAGE_SPEC: LanguageSpec = LanguageSpec {
    name: "tree-sitter-javascript",
    extensions: JAVASCRIPT_EXTENSIONS,
    loader: load_javascript_language,
    syntax_error_message: "Syntax errors detected in JavaScript source",
    normalize_bare_cr: true,
};

const TYPESCRIPT_LANGUAGE_SPEC: LanguageSpec = LanguageSpec {
    name: "tree-sitter-typescript",
    extensions: TYPESCRIPT_EXTENSIONS,
    loader: load_typescript_language,
    syntax_error_message: "Syntax errors detected in TypeScript source",
    normalize_bare_cr: true,
};

const TSX_LANGUAGE_SPEC: LanguageSpec = LanguageSpec {
    name: "tree-sitter-tsx",
    extensions: TSX_EXTENSIONS,
    loader: load_tsx_language,
    syntax_error_message: "Syntax errors detected in TSX source",
    normalize_bare_cr: true,
};

const BUNDLED_LANGUAGE_SPECS: &[LanguageSpec] = &[
    JAVASCRIPT_LANGUAGE_SPEC,
    TYPESCRIPT_LANGUAGE_SPEC,
    TSX_LANGUAGE_SPEC,
];

pub fn bundled_language_specs() -> &'static [LanguageSpec] {
    BUNDLED_LANGUAGE_SPECS
}

pub fn javascript_language_spec() -> &'static LanguageSpec {
    &JAVASCRIPT_LANGUAGE_SPEC
}

fn load_javascript_language() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn load_typescript_language() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn load_tsx_language() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

fn panic_payload_to_string(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }

    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "unknown panic payload".to_string()
}

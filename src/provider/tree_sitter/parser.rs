use std::borrow::Cow;

use tree_sitter::{Parser, Tree};

use crate::error::CodemodError;
use crate::provider::normalize_bare_cr_for_parser;

use super::catalog::LanguageSpec;

pub(super) fn parse_with_spec(spec: &LanguageSpec, source: &[u8]) -> Result<Tree, CodemodError> {
    let parse_source = if spec.normalize_bare_cr {
        normalize_bare_cr_for_parser(source)
    } else {
        Cow::Borrowed(source)
    };
    debug_assert_eq!(parse_source.len(), source.len());
    let tree = parse_tree_from_source(parse_source.as_ref(), spec)?;

    if tree.root_node().has_error() {
        return Err(CodemodError::ParseFailure {
            provider: spec.name,
            message: spec.syntax_error_message.to_string(),
        });
    }

    Ok(tree)
}

fn parse_tree_from_source(source: &[u8], spec: &LanguageSpec) -> Result<Tree, CodemodError> {
    let mut parser = Parser::new();
    let language = spec.load()?;

    parser
        .set_language(&language)
        .map_err(|error| CodemodError::LanguageSetup {
            message: error.to_string(),
        })?;

    parser
        .parse(source, None)
        .ok_or_else(|| CodemodError::ParseFailure {
            provider: spec.name,
            message: "Tree-sitter returned no syntax tree".to_string(),
        })
}

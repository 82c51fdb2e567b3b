//! Per-file orchestration: detection gate, registration discovery and rewriting.

use std::path::Path;

use serde::Serialize;
use tree_sitter::{Node, Tree};

use crate::callback::CallbackRewriter;
use crate::changeset::ChangeSet;
use crate::config::TransformOptions;
use crate::detect::{FrameworkUsage, detect_framework, incompatible_packages, scan_imports};
use crate::diagnostics::{Diagnostic, Diagnostics, incompatible_package};
use crate::error::CodemodError;
use crate::modifiers::{Modifier, normalize, parse_chain};
use crate::provider::{ProviderRegistry, node_text};
use crate::scope::ScopeTree;
use crate::span::{Span, line_of};
use crate::syntax::{call_arguments, is_callback_literal, member_chain};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformOutput {
    pub output: String,
    pub changed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformOutput {
    fn unchanged(source: &str) -> Self {
        Self {
            output: source.to_string(),
            changed: false,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics in their `jest-codemods warning: (..)` form.
    pub fn rendered_warnings(&self, file_name: &str) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|diagnostic| diagnostic.render(file_name))
            .collect()
    }
}

/// Parses `source` with the grammar registered for `path` and transforms it.
pub fn transform_source(
    path: &Path,
    source: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, CodemodError> {
    transform_source_with(&ProviderRegistry::default(), path, source, options)
}

pub fn transform_source_with(
    registry: &ProviderRegistry,
    path: &Path,
    source: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, CodemodError> {
    let provider = registry.provider_for(path)?;
    let tree = provider.parse(source.as_bytes())?;
    tracing::debug!(path = %path.display(), provider = provider.name(), "parsed source");
    transform_tree(&tree, source, options)
}

pub fn transform_tree(
    tree: &Tree,
    source: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, CodemodError> {
    let root = tree.root_node();
    let scopes = ScopeTree::build(root, source);
    let imports = scan_imports(root, source, &scopes);

    let Some(usage) = detect_framework(&imports, options) else {
        tracing::debug!("legacy framework not imported; leaving source untouched");
        return Ok(TransformOutput::unchanged(source));
    };
    tracing::debug!(
        roots = ?usage.roots,
        scopes = scopes.scope_count(),
        "legacy framework detected"
    );

    let mut changes = ChangeSet::new(source);
    let mut diagnostics = Diagnostics::new();

    for package in incompatible_packages(&imports) {
        diagnostics.warn_file(incompatible_package(package));
    }
    for statement in &usage.statements {
        changes.delete_statement_and_trailing_blank_lines(Span::of(*statement))?;
    }

    let mut registrations = 0usize;
    for call in calls_in_source_order(root) {
        if let Some(registration) = Registration::match_call(call, source, &scopes, &usage) {
            registrations += 1;
            registration.rewrite(source, &scopes, &mut changes, &mut diagnostics)?;
        }
    }

    let output = changes.render();
    let changed = output != source;
    tracing::debug!(registrations, edits = changes.len(), changed, "transform finished");

    Ok(TransformOutput {
        output,
        changed,
        diagnostics: diagnostics.into_sorted(),
    })
}

/// A framework call such as `test.serial.skip('title', t => { .. })`.
#[derive(Debug)]
struct Registration<'t> {
    call: Node<'t>,
    callee: Node<'t>,
    modifiers: Vec<Modifier>,
    callback: Option<Node<'t>>,
}

impl<'t> Registration<'t> {
    fn match_call(
        call: Node<'t>,
        source: &str,
        scopes: &ScopeTree,
        usage: &FrameworkUsage<'_>,
    ) -> Option<Self> {
        let callee = call.child_by_field_name("function")?;
        let (root, names) = member_chain(callee, source)?;
        let root_name = node_text(root, source);
        if !usage.matches(root_name, scopes.resolve(root, source), scopes) {
            return None;
        }

        let callback = call_arguments(call)?
            .into_iter()
            .rev()
            .find(|argument| is_callback_literal(*argument));

        Some(Self {
            call,
            callee,
            modifiers: parse_chain(names),
            callback,
        })
    }

    fn rewrite<'s>(
        &self,
        source: &'s str,
        scopes: &ScopeTree,
        changes: &mut ChangeSet<'s>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CodemodError> {
        let completion_callback = match normalize(&self.modifiers) {
            Ok(normalized) => {
                tracing::debug!(
                    line = line_of(self.call),
                    target = normalized.target.callee(),
                    "rewriting registration"
                );
                changes.replace(Span::of(self.callee), normalized.target.callee())?;
                normalized.completion_callback
            }
            Err(unsupported) => {
                diagnostics.warn_at(self.call, unsupported.message());
                if !unsupported.rewrites_callback() {
                    return Ok(());
                }
                self.modifiers.contains(&Modifier::Cb)
            }
        };

        let Some(callback) = self.callback else {
            return Ok(());
        };
        CallbackRewriter {
            scopes,
            source,
            changes,
            diagnostics,
            callback,
        }
        .rewrite(completion_callback)
    }
}

fn calls_in_source_order(root: Node<'_>) -> Vec<Node<'_>> {
    let mut calls = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "call_expression" {
            calls.push(node);
        }
        let mut cursor = node.walk();
        let children = node.children(&mut cursor).collect::<Vec<_>>();
        stack.extend(children.into_iter().rev());
    }
    calls
}

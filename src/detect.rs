//! Module-level import/require scanning: is the legacy framework in use, and under which names?

use tree_sitter::Node;

use crate::config::TransformOptions;
use crate::provider::node_text;
use crate::scope::{BindingId, ScopeTree};
use crate::syntax::{call_arguments, named_children, string_value};

pub const LEGACY_PACKAGE: &str = "ava";
pub const DEFAULT_TEST_FUNCTION_NAME: &str = "test";

/// Companion packages whose behaviour assumes the legacy runner.
pub const INCOMPATIBLE_PACKAGES: &[&str] = &["testdouble", "mockery"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStyle {
    Default,
    Namespace,
    Named,
    Require,
    SideEffect,
}

#[derive(Debug, Clone)]
pub struct ImportBinding<'t> {
    pub local_name: Option<String>,
    pub package: String,
    pub style: ImportStyle,
    /// Top-level statement carrying the import.
    pub statement: Node<'t>,
    pub binding: Option<BindingId>,
    /// Whether the statement declares nothing but this import.
    pub sole_declaration: bool,
}

/// How registrations of the legacy framework are recognized in this file.
#[derive(Debug, Clone)]
pub struct FrameworkUsage<'t> {
    pub roots: Vec<FrameworkRoot>,
    pub statements: Vec<Node<'t>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkRoot {
    pub name: String,
    /// `None` when detection was bypassed and the name is an unbound global.
    pub binding: Option<BindingId>,
}

impl FrameworkUsage<'_> {
    /// Does an identifier resolving to `resolved` and spelled `name` refer to the framework?
    pub fn matches(&self, name: &str, resolved: Option<BindingId>, scopes: &ScopeTree) -> bool {
        self.roots.iter().any(|root| match root.binding {
            Some(binding) => resolved == Some(binding),
            None => {
                root.name == name
                    && resolved.is_none_or(|id| scopes.binding(id).scope == ScopeTree::PROGRAM)
            }
        })
    }
}

pub fn scan_imports<'t>(root: Node<'t>, source: &str, scopes: &ScopeTree) -> Vec<ImportBinding<'t>> {
    let mut imports = Vec::new();

    for statement in named_children(root) {
        match statement.kind() {
            "import_statement" => scan_import_statement(statement, source, scopes, &mut imports),
            "lexical_declaration" | "variable_declaration" => {
                let declarators = named_children(statement)
                    .into_iter()
                    .filter(|child| child.kind() == "variable_declarator")
                    .collect::<Vec<_>>();
                let sole_declaration = declarators.len() == 1;
                for declarator in declarators {
                    scan_require_declarator(
                        statement,
                        declarator,
                        sole_declaration,
                        source,
                        scopes,
                        &mut imports,
                    );
                }
            }
            "expression_statement" => {
                if let Some(expression) = statement.named_child(0)
                    && let Some(package) = required_package(expression, source)
                {
                    imports.push(ImportBinding {
                        local_name: None,
                        package: package.to_string(),
                        style: ImportStyle::SideEffect,
                        statement,
                        binding: None,
                        sole_declaration: true,
                    });
                }
            }
            _ => {}
        }
    }

    imports
}

fn scan_import_statement<'t>(
    statement: Node<'t>,
    source: &str,
    scopes: &ScopeTree,
    imports: &mut Vec<ImportBinding<'t>>,
) {
    let Some(package) = statement
        .child_by_field_name("source")
        .and_then(|node| string_value(node, source))
    else {
        return;
    };

    let mut locals = Vec::new();
    for child in named_children(statement) {
        if child.kind() != "import_clause" {
            continue;
        }
        for part in named_children(child) {
            match part.kind() {
                "identifier" => locals.push((part, ImportStyle::Default)),
                "namespace_import" => {
                    if let Some(name) = named_children(part)
                        .into_iter()
                        .find(|node| node.kind() == "identifier")
                    {
                        locals.push((name, ImportStyle::Namespace));
                    }
                }
                "named_imports" => {
                    for specifier in named_children(part) {
                        let local = specifier
                            .child_by_field_name("alias")
                            .or_else(|| specifier.child_by_field_name("name"));
                        if let Some(local) = local {
                            locals.push((local, ImportStyle::Named));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if locals.is_empty() {
        imports.push(ImportBinding {
            local_name: None,
            package: package.to_string(),
            style: ImportStyle::SideEffect,
            statement,
            binding: None,
            sole_declaration: true,
        });
        return;
    }

    for (local, style) in locals {
        imports.push(ImportBinding {
            local_name: Some(node_text(local, source).to_string()),
            package: package.to_string(),
            style,
            statement,
            binding: scopes.binding_declared_at(local),
            sole_declaration: true,
        });
    }
}

fn scan_require_declarator<'t>(
    statement: Node<'t>,
    declarator: Node<'t>,
    sole_declaration: bool,
    source: &str,
    scopes: &ScopeTree,
    imports: &mut Vec<ImportBinding<'t>>,
) {
    let Some(package) = declarator
        .child_by_field_name("value")
        .and_then(|value| required_package(value, source))
    else {
        return;
    };
    let Some(name) = declarator.child_by_field_name("name") else {
        return;
    };

    let (local_name, style, binding) = if name.kind() == "identifier" {
        (
            Some(node_text(name, source).to_string()),
            ImportStyle::Require,
            scopes.binding_declared_at(name),
        )
    } else {
        (None, ImportStyle::Named, None)
    };

    imports.push(ImportBinding {
        local_name,
        package: package.to_string(),
        style,
        statement,
        binding,
        sole_declaration,
    });
}

/// `require('<package>')`, possibly followed by `.default`.
fn required_package<'s>(expression: Node<'_>, source: &'s str) -> Option<&'s str> {
    let call = if expression.kind() == "member_expression" {
        expression.child_by_field_name("object")?
    } else {
        expression
    };
    if call.kind() != "call_expression" {
        return None;
    }
    let function = call.child_by_field_name("function")?;
    if function.kind() != "identifier" || node_text(function, source) != "require" {
        return None;
    }
    match call_arguments(call)?.as_slice() {
        [argument] => string_value(*argument, source),
        _ => None,
    }
}

/// Applies the detection gate. `None` means the file must be left untouched.
pub fn detect_framework<'t>(
    imports: &[ImportBinding<'t>],
    options: &TransformOptions,
) -> Option<FrameworkUsage<'t>> {
    let legacy = imports
        .iter()
        .filter(|import| import.package == LEGACY_PACKAGE)
        .collect::<Vec<_>>();

    let mut statements = Vec::new();
    for import in &legacy {
        if import.sole_declaration
            && !statements
                .iter()
                .any(|statement: &Node<'t>| statement.id() == import.statement.id())
        {
            statements.push(import.statement);
        }
    }

    let mut roots = legacy
        .iter()
        .filter(|import| {
            matches!(
                import.style,
                ImportStyle::Default | ImportStyle::Namespace | ImportStyle::Require
            )
        })
        .filter_map(|import| {
            Some(FrameworkRoot {
                name: import.local_name.clone()?,
                binding: import.binding,
            })
        })
        .collect::<Vec<_>>();

    if legacy.is_empty() && !options.skip_import_detection {
        return None;
    }

    if roots.is_empty() {
        roots.push(FrameworkRoot {
            name: options
                .test_function_name
                .clone()
                .unwrap_or_else(|| DEFAULT_TEST_FUNCTION_NAME.to_string()),
            binding: None,
        });
    }

    Some(FrameworkUsage { roots, statements })
}

/// Companion packages from [`INCOMPATIBLE_PACKAGES`] imported by the file, in source order.
pub fn incompatible_packages(imports: &[ImportBinding<'_>]) -> Vec<&'static str> {
    let mut found = Vec::new();
    for import in imports {
        if let Some(package) = INCOMPATIBLE_PACKAGES
            .iter()
            .find(|candidate| **candidate == import.package)
            && !found.contains(package)
        {
            found.push(*package);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::{ImportStyle, detect_framework, incompatible_packages, scan_imports};
    use crate::config::TransformOptions;
    use crate::provider::TreeSitterProvider;
    use crate::scope::ScopeTree;

    fn with_imports<R>(source: &str, check: impl FnOnce(&[super::ImportBinding<'_>]) -> R) -> R {
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let scopes = ScopeTree::build(tree.root_node(), source);
        let imports = scan_imports(tree.root_node(), source, &scopes);
        check(&imports)
    }

    #[test]
    fn default_import_name_is_the_framework_root() {
        with_imports("import foo from 'ava';\nfoo(() => {});\n", |imports| {
            assert_eq!(imports.len(), 1);
            assert_eq!(imports[0].style, ImportStyle::Default);
            let usage = detect_framework(imports, &TransformOptions::default()).expect("detected");
            assert_eq!(usage.roots.len(), 1);
            assert_eq!(usage.roots[0].name, "foo");
            assert!(usage.roots[0].binding.is_some());
            assert_eq!(usage.statements.len(), 1);
        });
    }

    #[test]
    fn require_is_detected() {
        with_imports("const test = require('ava');\n", |imports| {
            assert_eq!(imports[0].style, ImportStyle::Require);
            let usage = detect_framework(imports, &TransformOptions::default()).expect("detected");
            assert_eq!(usage.roots[0].name, "test");
        });
    }

    #[test]
    fn other_packages_do_not_pass_the_gate() {
        with_imports("const test = require('testlib');\n", |imports| {
            assert!(detect_framework(imports, &TransformOptions::default()).is_none());
        });
    }

    #[test]
    fn bypass_uses_configured_name_without_binding() {
        with_imports("it(t => {});\n", |imports| {
            let options = TransformOptions {
                skip_import_detection: true,
                test_function_name: Some("it".to_string()),
            };
            let usage = detect_framework(imports, &options).expect("bypassed");
            assert_eq!(usage.roots[0].name, "it");
            assert_eq!(usage.roots[0].binding, None);
            assert!(usage.statements.is_empty());
        });
    }

    #[test]
    fn incompatible_packages_ignore_proxyquire_and_the_framework() {
        let source = "import ava from 'ava';\nimport proxyquire from 'proxyquire';\nimport td from 'testdouble';\nconst mockery = require('mockery');\n";
        with_imports(source, |imports| {
            assert_eq!(incompatible_packages(imports), vec!["testdouble", "mockery"]);
        });
    }
}

//! Lexical scope table for one parsed file.
//!
//! Built once before any rewriting and consulted read-only afterwards. Scopes
//! live in an arena with parent links; bindings are hoisted to their scope so
//! a reference resolves to the same binding regardless of declaration order.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::provider::node_text;
use crate::syntax::{is_function, named_children};

pub type ScopeId = usize;
pub type BindingId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    names: HashMap<String, BindingId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub scope: ScopeId,
}

#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    scope_by_node: HashMap<usize, ScopeId>,
    binding_by_node: HashMap<usize, BindingId>,
}

impl ScopeTree {
    pub const PROGRAM: ScopeId = 0;

    pub fn build(root: Node<'_>, source: &str) -> Self {
        let mut tree = Self {
            scopes: Vec::new(),
            bindings: Vec::new(),
            scope_by_node: HashMap::new(),
            binding_by_node: HashMap::new(),
        };
        let program = tree.open(root, ScopeKind::Program, None);
        let mut builder = Builder {
            tree: &mut tree,
            source,
        };
        builder.visit_children(root, program);
        tree
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id]
    }

    #[cfg(test)]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Binding introduced by a declaring identifier node.
    pub fn binding_declared_at(&self, node: Node<'_>) -> Option<BindingId> {
        self.binding_by_node.get(&node.id()).copied()
    }

    /// Innermost scope enclosing `node`.
    pub fn scope_of(&self, node: Node<'_>) -> ScopeId {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if let Some(scope) = self.scope_by_node.get(&candidate.id()) {
                return *scope;
            }
            current = candidate.parent();
        }
        Self::PROGRAM
    }

    /// Nearest binding of the identifier's name as seen from its position.
    pub fn resolve(&self, identifier: Node<'_>, source: &str) -> Option<BindingId> {
        self.lookup(node_text(identifier, source), self.scope_of(identifier))
    }

    pub fn lookup(&self, name: &str, from: ScopeId) -> Option<BindingId> {
        let mut current = Some(from);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id];
            if let Some(binding) = scope.names.get(name) {
                return Some(*binding);
            }
            current = scope.parent;
        }
        None
    }

    /// Every identifier under `root` that resolves to `binding`, declarations excluded.
    pub fn references_within<'t>(
        &self,
        root: Node<'t>,
        binding: BindingId,
        source: &str,
    ) -> Vec<Node<'t>> {
        let name = self.bindings[binding].name.as_str();
        let mut found = Vec::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if matches!(node.kind(), "identifier" | "shorthand_property_identifier")
                && node_text(node, source) == name
                && !self.binding_by_node.contains_key(&node.id())
                && self.resolve(node, source) == Some(binding)
            {
                found.push(node);
            }

            let mut cursor = node.walk();
            let children = node.children(&mut cursor).collect::<Vec<_>>();
            stack.extend(children.into_iter().rev());
        }

        found.sort_by_key(|node| node.start_byte());
        found
    }

    fn open(&mut self, node: Node<'_>, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            parent,
            names: HashMap::new(),
        });
        self.scope_by_node.insert(node.id(), id);
        id
    }

    fn nearest_function_scope(&self, from: ScopeId) -> ScopeId {
        let mut current = from;
        loop {
            let scope = &self.scopes[current];
            match (scope.kind, scope.parent) {
                (ScopeKind::Function | ScopeKind::Program, _) | (_, None) => return current,
                (ScopeKind::Block, Some(parent)) => current = parent,
            }
        }
    }
}

struct Builder<'a, 's> {
    tree: &'a mut ScopeTree,
    source: &'s str,
}

impl Builder<'_, '_> {
    fn visit_children(&mut self, node: Node<'_>, scope: ScopeId) {
        let mut cursor = node.walk();
        let children = node.children(&mut cursor).collect::<Vec<_>>();
        for child in children {
            self.visit(child, scope);
        }
    }

    fn visit(&mut self, node: Node<'_>, scope: ScopeId) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare_pattern(name, scope);
                }
                self.visit_function(node, scope);
            }
            "class_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare_pattern(name, scope);
                }
                self.visit_children(node, scope);
            }
            kind if is_function(node) => {
                let inner = self.tree.open(node, ScopeKind::Function, Some(scope));
                if matches!(kind, "function_expression" | "function" | "generator_function")
                    && let Some(name) = node.child_by_field_name("name")
                {
                    self.declare_pattern(name, inner);
                }
                self.declare_parameters(node, inner);
                self.visit_children(node, inner);
            }
            "statement_block" => {
                let function_body = node.parent().is_some_and(is_function);
                if function_body {
                    self.visit_children(node, scope);
                } else {
                    let inner = self.tree.open(node, ScopeKind::Block, Some(scope));
                    self.visit_children(node, inner);
                }
            }
            "for_statement" | "for_in_statement" | "switch_body" | "class_static_block" => {
                let inner = self.tree.open(node, ScopeKind::Block, Some(scope));
                if node.kind() == "for_in_statement" {
                    self.declare_loop_binding(node, inner);
                }
                self.visit_children(node, inner);
            }
            "catch_clause" => {
                let inner = self.tree.open(node, ScopeKind::Block, Some(scope));
                if let Some(parameter) = node.child_by_field_name("parameter") {
                    self.declare_pattern(parameter, inner);
                }
                self.visit_children(node, inner);
            }
            "variable_declaration" => {
                let target = self.tree.nearest_function_scope(scope);
                self.declare_declarators(node, target);
                self.visit_children(node, scope);
            }
            "lexical_declaration" => {
                self.declare_declarators(node, scope);
                self.visit_children(node, scope);
            }
            "import_statement" => {
                self.declare_imports(node, scope);
            }
            _ => self.visit_children(node, scope),
        }
    }

    fn visit_function(&mut self, node: Node<'_>, scope: ScopeId) {
        let inner = self.tree.open(node, ScopeKind::Function, Some(scope));
        self.declare_parameters(node, inner);
        self.visit_children(node, inner);
    }

    fn declare_parameters(&mut self, function: Node<'_>, scope: ScopeId) {
        if let Some(parameter) = function.child_by_field_name("parameter") {
            self.declare_pattern(parameter, scope);
        }
        if let Some(parameters) = function.child_by_field_name("parameters") {
            for parameter in named_children(parameters) {
                self.declare_pattern(parameter, scope);
            }
        }
    }

    fn declare_declarators(&mut self, declaration: Node<'_>, scope: ScopeId) {
        for declarator in named_children(declaration) {
            if declarator.kind() == "variable_declarator"
                && let Some(name) = declarator.child_by_field_name("name")
            {
                self.declare_pattern(name, scope);
            }
        }
    }

    fn declare_loop_binding(&mut self, node: Node<'_>, loop_scope: ScopeId) {
        let Some(kind) = node.child_by_field_name("kind") else {
            return;
        };
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let target = if node_text(kind, self.source) == "var" {
            self.tree.nearest_function_scope(loop_scope)
        } else {
            loop_scope
        };
        self.declare_pattern(left, target);
    }

    fn declare_imports(&mut self, import: Node<'_>, scope: ScopeId) {
        let mut stack = named_children(import);
        while let Some(node) = stack.pop() {
            match node.kind() {
                "import_clause" | "named_imports" | "namespace_import" => {
                    stack.extend(named_children(node));
                }
                "identifier" => self.declare_pattern(node, scope),
                "import_specifier" => {
                    let local = node
                        .child_by_field_name("alias")
                        .or_else(|| node.child_by_field_name("name"));
                    if let Some(local) = local {
                        self.declare_pattern(local, scope);
                    }
                }
                _ => {}
            }
        }
    }

    fn declare_pattern(&mut self, pattern: Node<'_>, scope: ScopeId) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" | "type_identifier" => {
                self.declare_name(pattern, scope);
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for child in named_children(pattern) {
                    self.declare_pattern(child, scope);
                }
            }
            "pair_pattern" => {
                if let Some(value) = pattern.child_by_field_name("value") {
                    self.declare_pattern(value, scope);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = pattern.child_by_field_name("left") {
                    self.declare_pattern(left, scope);
                }
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(inner) = pattern.child_by_field_name("pattern") {
                    self.declare_pattern(inner, scope);
                }
            }
            _ => {}
        }
    }

    fn declare_name(&mut self, node: Node<'_>, scope: ScopeId) {
        let name = node_text(node, self.source);
        if name.is_empty() {
            return;
        }

        let binding = match self.tree.scopes[scope].names.get(name) {
            Some(existing) => *existing,
            None => {
                let id = self.tree.bindings.len();
                self.tree.bindings.push(Binding {
                    name: name.to_string(),
                    scope,
                });
                self.tree.scopes[scope].names.insert(name.to_string(), id);
                id
            }
        };
        self.tree.binding_by_node.insert(node.id(), binding);
    }
}

#[cfg(test)]
mod tests {
    use tree_sitter::Node;

    use super::{ScopeKind, ScopeTree};
    use crate::provider::TreeSitterProvider;

    fn find_nth<'t>(node: Node<'t>, source: &str, kind: &str, text: &str, nth: usize) -> Node<'t> {
        let mut matches = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.kind() == kind && &source[current.byte_range()] == text {
                matches.push(current);
            }
            let mut cursor = current.walk();
            let children = current.children(&mut cursor).collect::<Vec<_>>();
            stack.extend(children.into_iter().rev());
        }
        matches.sort_by_key(|node| node.start_byte());
        matches[nth]
    }

    #[test]
    fn nested_parameter_shadows_outer_parameter() {
        let source = "test(t => {\n  t.is(1, 1);\n  const inner = (t) => t.is(2, 2);\n});\n";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let scopes = ScopeTree::build(tree.root_node(), source);

        let outer_param = find_nth(tree.root_node(), source, "identifier", "t", 0);
        let outer_binding = scopes
            .binding_declared_at(outer_param)
            .expect("outer parameter binding");

        let outer_use = find_nth(tree.root_node(), source, "identifier", "t", 1);
        assert_eq!(scopes.resolve(outer_use, source), Some(outer_binding));

        let inner_use = find_nth(tree.root_node(), source, "identifier", "t", 3);
        let inner_binding = scopes.resolve(inner_use, source).expect("inner binding");
        assert_ne!(inner_binding, outer_binding);

        let references = scopes.references_within(tree.root_node(), outer_binding, source);
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].id(), outer_use.id());
    }

    #[test]
    fn block_scoped_const_shadows_only_inside_its_block() {
        let source = "function f(x) {\n  { const x = 1; use(x); }\n  use(x);\n}\n";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let scopes = ScopeTree::build(tree.root_node(), source);

        let param = find_nth(tree.root_node(), source, "identifier", "x", 0);
        let param_binding = scopes.binding_declared_at(param).expect("param");
        let inside_block = find_nth(tree.root_node(), source, "identifier", "x", 2);
        let after_block = find_nth(tree.root_node(), source, "identifier", "x", 3);

        assert_ne!(scopes.resolve(inside_block, source), Some(param_binding));
        assert_eq!(scopes.resolve(after_block, source), Some(param_binding));
    }

    #[test]
    fn var_is_hoisted_to_function_scope() {
        let source = "function f() {\n  use(v);\n  if (ok) { var v = 1; }\n}\n";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let scopes = ScopeTree::build(tree.root_node(), source);

        let first_use = find_nth(tree.root_node(), source, "identifier", "v", 0);
        let binding = scopes.resolve(first_use, source).expect("hoisted var");
        assert_eq!(
            scopes.scope(scopes.binding(binding).scope).kind,
            ScopeKind::Function
        );
    }

    #[test]
    fn imports_bind_in_program_scope_and_globals_stay_unresolved() {
        let source = "import test from 'ava';\nimport { a as b } from 'x';\ntest(b, expect);\n";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let scopes = ScopeTree::build(tree.root_node(), source);

        let test_use = find_nth(tree.root_node(), source, "identifier", "test", 1);
        let binding = scopes.resolve(test_use, source).expect("import binding");
        assert_eq!(scopes.binding(binding).scope, ScopeTree::PROGRAM);

        let alias_use = find_nth(tree.root_node(), source, "identifier", "b", 1);
        assert!(scopes.resolve(alias_use, source).is_some());

        let global = find_nth(tree.root_node(), source, "identifier", "expect", 0);
        assert_eq!(scopes.resolve(global, source), None);
    }

    #[test]
    fn catch_and_loop_bindings_are_local() {
        let source = "for (const t of items) { t.ok(); }\ntry {} catch (t) { t.ok(); }\nt.ok();\n";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let scopes = ScopeTree::build(tree.root_node(), source);

        let loop_use = find_nth(tree.root_node(), source, "identifier", "t", 1);
        let catch_use = find_nth(tree.root_node(), source, "identifier", "t", 3);
        let top_use = find_nth(tree.root_node(), source, "identifier", "t", 4);

        assert!(scopes.resolve(loop_use, source).is_some());
        assert!(scopes.resolve(catch_use, source).is_some());
        assert_eq!(scopes.resolve(top_use, source), None);
    }
}

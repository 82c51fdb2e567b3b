//! Small shape queries over tree-sitter JavaScript/TypeScript nodes.

use tree_sitter::Node;

use crate::provider::node_text;

pub const FUNCTION_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
    "function_declaration",
    "generator_function_declaration",
    "method_definition",
];

pub fn is_function(node: Node<'_>) -> bool {
    FUNCTION_KINDS.contains(&node.kind())
}

/// Function literals that can be passed as a test callback.
pub fn is_callback_literal(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

/// Named children without interleaved comments.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Argument expressions of a call, or `None` for tagged templates.
pub fn call_arguments<'t>(call: Node<'t>) -> Option<Vec<Node<'t>>> {
    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        return None;
    }
    Some(named_children(arguments))
}

/// Splits `a.b.c` into the root identifier `a` and the property names `[b, c]`.
pub fn member_chain<'t, 's>(node: Node<'t>, source: &'s str) -> Option<(Node<'t>, Vec<&'s str>)> {
    match node.kind() {
        "identifier" => Some((node, Vec::new())),
        "member_expression" => {
            let object = node.child_by_field_name("object")?;
            let property = node.child_by_field_name("property")?;
            if property.kind() != "property_identifier" {
                return None;
            }
            let (root, mut names) = member_chain(object, source)?;
            names.push(node_text(property, source));
            Some((root, names))
        }
        _ => None,
    }
}

/// The call whose callee is exactly `node`, if any.
pub fn enclosing_call_of_callee<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let parent = node.parent()?;
    if parent.kind() != "call_expression" {
        return None;
    }
    let function = parent.child_by_field_name("function")?;
    (function.id() == node.id()).then_some(parent)
}

/// The member expression using `node` as its object, if any.
pub fn member_with_object<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let parent = node.parent()?;
    if parent.kind() != "member_expression" {
        return None;
    }
    let object = parent.child_by_field_name("object")?;
    (object.id() == node.id()).then_some(parent)
}

pub fn property_name<'s>(member: Node<'_>, source: &'s str) -> Option<&'s str> {
    let property = member.child_by_field_name("property")?;
    (property.kind() == "property_identifier").then(|| node_text(property, source))
}

/// Text of a string literal without its quotes.
pub fn string_value<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    text.get(1..text.len().checked_sub(1)?)
}

#[cfg(test)]
mod tests {
    use super::{call_arguments, member_chain, string_value};
    use crate::provider::TreeSitterProvider;

    fn first_call<'t>(node: tree_sitter::Node<'t>) -> Option<tree_sitter::Node<'t>> {
        if node.kind() == "call_expression" {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children = node.children(&mut cursor).collect::<Vec<_>>();
        children.into_iter().find_map(first_call)
    }

    #[test]
    fn member_chain_collects_modifiers_left_to_right() {
        let source = "test.serial.skip(t => {});";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let call = first_call(tree.root_node()).expect("call");
        let callee = call.child_by_field_name("function").expect("callee");

        let (root, names) = member_chain(callee, source).expect("chain");
        assert_eq!(&source[root.byte_range()], "test");
        assert_eq!(names, vec!["serial", "skip"]);
    }

    #[test]
    fn member_chain_rejects_computed_roots() {
        let source = "makeTest().skip(t => {});";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let call = first_call(tree.root_node()).expect("call");
        let callee = call.child_by_field_name("function").expect("callee");
        assert!(member_chain(callee, source).is_none());
    }

    #[test]
    fn call_arguments_skip_comments() {
        let source = "t.is(a, /* expected */ b);";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let call = first_call(tree.root_node()).expect("call");
        let args = call_arguments(call).expect("arguments");
        let texts = args
            .iter()
            .map(|arg| &source[arg.byte_range()])
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn string_value_strips_quotes() {
        let source = "require('ava');";
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let call = first_call(tree.root_node()).expect("call");
        let args = call_arguments(call).expect("arguments");
        assert_eq!(string_value(args[0], source), Some("ava"));
    }
}

//! Rewrites a single context method call (`t.is(a, b)`, `ok(a)`) into its target form.

use tree_sitter::Node;

use crate::changeset::{ChangeSet, Template};
use crate::diagnostics::Diagnostics;
use crate::error::CodemodError;
use crate::rules::{Expected, RuleEntry, Target};
use crate::span::Span;
use crate::syntax::call_arguments;

/// Placeholder for arguments a best-effort rewrite has to invent.
pub const MISSING_ARGUMENT: &str = "undefined";

/// Statement containers from which an expression statement can be dropped safely.
const STATEMENT_LISTS: &[&str] = &["statement_block", "program", "switch_case", "switch_default"];

#[derive(Debug, Clone, Copy)]
pub struct AssertionCall<'t, 'a> {
    pub call: Node<'t>,
    /// `t.is` for member calls, `is` for destructured members.
    pub callee: Node<'t>,
    /// Name the context is reported under in diagnostics.
    pub context: &'a str,
    pub method: &'a str,
}

pub fn rewrite_assertion(
    site: &AssertionCall<'_, '_>,
    rule: &RuleEntry,
    completion_token: &str,
    changes: &mut ChangeSet<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<(), CodemodError> {
    let arguments = call_arguments(site.call).unwrap_or_default();
    if rule.arity.missing(arguments.len()) > 0 {
        diagnostics.warn_at(
            site.call,
            format!(
                "\"{}.{}\" {}",
                site.context,
                site.method,
                rule.arity.describe()
            ),
        );
    }

    let span = Span::of(site.call);
    match rule.target {
        Target::Matcher { matcher, expected } => {
            let mut template = subject(&arguments);
            if rule.negated {
                template = template.text(".not");
            }
            template = template.text(".").text(matcher).text("(");
            template = match expected {
                Expected::Nothing => template,
                Expected::Literal(value) => template.text(value),
                Expected::SecondArgument => argument_or_missing(template, &arguments, 1),
            };
            changes.push(template.text(")").finish(span))
        }
        Target::Throws => {
            let mut template = subject(&arguments);
            if rule.negated {
                template = template.text(".not");
            }
            template = match arguments.get(1) {
                Some(error) => template
                    .text(".toThrowError(")
                    .source(Span::of(*error))
                    .text(")"),
                None => template.text(".toThrow()"),
            };
            changes.push(template.finish(span))
        }
        Target::Assertions => {
            let template = argument_or_missing(Template::new().text("expect.assertions("), &arguments, 0);
            changes.push(template.text(")").finish(span))
        }
        Target::Snapshot => {
            let mut template = subject(&arguments).text(".toMatchSnapshot(");
            if let Some(message) = snapshot_message(&arguments) {
                template = template.source(Span::of(message));
            }
            changes.push(template.text(")").finish(span))
        }
        Target::Remove => remove_call(site.call, changes),
        Target::CompletionFail => changes.replace(
            Span::of(site.callee),
            &format!("{completion_token}.fail"),
        ),
        Target::CompletionEnd => changes.replace(Span::of(site.callee), completion_token),
    }
}

/// `expect(<first argument>)`
fn subject(arguments: &[Node<'_>]) -> Template {
    argument_or_missing(Template::new().text("expect("), arguments, 0).text(")")
}

fn argument_or_missing(template: Template, arguments: &[Node<'_>], index: usize) -> Template {
    match arguments.get(index) {
        Some(argument) => template.source(Span::of(*argument)),
        None => template.text(MISSING_ARGUMENT),
    }
}

/// The last argument after the value that is not an options object.
fn snapshot_message<'t>(arguments: &[Node<'t>]) -> Option<Node<'t>> {
    arguments
        .iter()
        .skip(1)
        .rev()
        .find(|argument| argument.kind() != "object")
        .copied()
}

fn remove_call(call: Node<'_>, changes: &mut ChangeSet<'_>) -> Result<(), CodemodError> {
    if let Some(statement) = call.parent()
        && statement.kind() == "expression_statement"
        && statement
            .parent()
            .is_some_and(|list| STATEMENT_LISTS.contains(&list.kind()))
    {
        return changes.delete_statement(Span::of(statement));
    }
    changes.replace(Span::of(call), MISSING_ARGUMENT)
}

#[cfg(test)]
mod tests {
    use tree_sitter::Node;

    use super::{AssertionCall, rewrite_assertion};
    use crate::changeset::ChangeSet;
    use crate::diagnostics::Diagnostics;
    use crate::provider::TreeSitterProvider;
    use crate::rules::lookup;
    use crate::syntax::property_name;

    fn calls<'t>(node: Node<'t>, found: &mut Vec<Node<'t>>) {
        if node.kind() == "call_expression" {
            found.push(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            calls(child, found);
        }
    }

    /// Rewrites every outermost `t.<method>(..)` call in `source`.
    fn rewrite(source: &str) -> (String, Vec<String>) {
        let tree = TreeSitterProvider::javascript()
            .parse(source.as_bytes())
            .expect("parse");
        let mut found = Vec::new();
        calls(tree.root_node(), &mut found);

        let mut changes = ChangeSet::new(source);
        let mut diagnostics = Diagnostics::new();
        for call in found {
            let callee = call.child_by_field_name("function").expect("callee");
            let Some(method) = property_name(callee, source) else {
                continue;
            };
            let rule = lookup(method).expect("known method");
            let site = AssertionCall {
                call,
                callee,
                context: "t",
                method,
            };
            rewrite_assertion(&site, rule, "done", &mut changes, &mut diagnostics)
                .expect("rewrite");
        }

        let messages = diagnostics
            .into_sorted()
            .into_iter()
            .map(|diagnostic| diagnostic.to_string())
            .collect();
        (changes.render(), messages)
    }

    #[test]
    fn matchers_keep_argument_text() {
        assert_eq!(rewrite("t.is(a.b, 'x');").0, "expect(a.b).toBe('x');");
        assert_eq!(rewrite("t.not(a, 'x')").0, "expect(a).not.toBe('x')");
        assert_eq!(rewrite("t.true(value)").0, "expect(value).toBe(true)");
        assert_eq!(rewrite("t.falsy(value)").0, "expect(value).toBeFalsy()");
    }

    #[test]
    fn extra_message_arguments_are_dropped() {
        assert_eq!(
            rewrite("t.deepEqual(a, b, 'should match')").0,
            "expect(a).toEqual(b)"
        );
    }

    #[test]
    fn missing_arguments_are_filled_and_reported() {
        let (output, messages) = rewrite("t.is(1);");
        assert_eq!(output, "expect(1).toBe(undefined);");
        assert_eq!(messages, vec!["line 1: \"t.is\" should have 2 arguments"]);
    }

    #[test]
    fn throws_picks_matcher_from_argument_count() {
        assert_eq!(rewrite("t.throws(fn, 'boom')").0, "expect(fn).toThrowError('boom')");
        assert_eq!(rewrite("t.throws(fn)").0, "expect(fn).toThrow()");
        assert_eq!(rewrite("t.notThrows(fn)").0, "expect(fn).not.toThrow()");
    }

    #[test]
    fn snapshot_variants() {
        assert_eq!(rewrite("t.snapshot(v)").0, "expect(v).toMatchSnapshot()");
        assert_eq!(rewrite("t.snapshot(v, 'm')").0, "expect(v).toMatchSnapshot('m')");
        assert_eq!(rewrite("t.snapshot(v, {id: 'x'})").0, "expect(v).toMatchSnapshot()");
        assert_eq!(rewrite("t.snapshot(v, {}, 'm')").0, "expect(v).toMatchSnapshot('m')");
    }

    #[test]
    fn plan_becomes_expect_assertions() {
        assert_eq!(rewrite("t.plan(3)").0, "expect.assertions(3)");
    }

    #[test]
    fn pass_statement_is_removed_with_its_line() {
        assert_eq!(rewrite("a();\n  t.pass('yes');\nb();\n").0, "a();\nb();\n");
        assert_eq!(rewrite("const x = t.pass();").0, "const x = undefined;");
        assert_eq!(rewrite("if (x) t.pass();").0, "if (x) undefined;");
    }

    #[test]
    fn completion_methods_use_the_token() {
        assert_eq!(rewrite("t.fail('no');").0, "done.fail('no');");
        assert_eq!(rewrite("t.end();").0, "done();");
    }

    #[test]
    fn nested_assertions_render_inside_slots() {
        assert_eq!(
            rewrite("t.true(t.is(a, b))").0,
            "expect(expect(a).toBe(b)).toBe(true)"
        );
    }
}

//! Rewrites a registration callback: its context parameter and every use of it in the body.

use tree_sitter::Node;

use crate::assertions::{AssertionCall, rewrite_assertion};
use crate::changeset::ChangeSet;
use crate::diagnostics::{
    Diagnostics, EXTRA_CALLBACK_PARAMETERS, UNSUPPORTED_CONTEXT_PATTERN,
    unsupported_destructured_use, unsupported_property,
};
use crate::error::CodemodError;
use crate::provider::node_text;
use crate::rules::{RuleEntry, Target, lookup};
use crate::scope::ScopeTree;
use crate::span::Span;
use crate::syntax::{
    call_arguments, enclosing_call_of_callee, member_with_object, named_children, property_name,
};

/// Parameter name of completion-callback style tests.
pub const COMPLETION_TOKEN: &str = "done";

const COMPLETION_FAIL: &str = "done.fail";

/// Name destructured members are reported under.
const DESTRUCTURED_CONTEXT: &str = "t";

pub struct CallbackRewriter<'a, 's, 't> {
    pub scopes: &'a ScopeTree,
    pub source: &'s str,
    pub changes: &'a mut ChangeSet<'s>,
    pub diagnostics: &'a mut Diagnostics,
    pub callback: Node<'t>,
}

/// How the context parameter is used at one reference.
#[derive(Debug, Clone, Copy)]
enum UseKind<'t, 's> {
    /// `t.<method>(..)` with a rule.
    Assertion {
        call: Node<'t>,
        member: Node<'t>,
        method: &'s str,
        rule: &'static RuleEntry,
    },
    /// `t.<method>(..)` without a rule.
    Unmapped { call: Node<'t>, method: &'s str },
    /// `t.end` as a value.
    EndValue { member: Node<'t> },
    /// `t.fail` as a value.
    FailValue,
    /// `t.context` as the object of a called member.
    ContextCall { member: Node<'t> },
    /// Any other `t.context` access.
    ContextAccess,
    /// A non-call member access without a target equivalent.
    Property,
    /// `t` passed around or stored.
    Whole,
}

#[derive(Debug, Clone, Copy)]
struct ContextUse<'t, 's> {
    reference: Node<'t>,
    kind: UseKind<'t, 's>,
}

impl ContextUse<'_, '_> {
    fn needs_completion(&self) -> bool {
        match self.kind {
            UseKind::Assertion { rule, .. } => rule.target.uses_completion_callback(),
            UseKind::EndValue { .. } | UseKind::FailValue => true,
            _ => false,
        }
    }

    fn keeps_parameter(&self) -> bool {
        matches!(
            self.kind,
            UseKind::Unmapped { .. } | UseKind::Property | UseKind::Whole
        )
    }
}

impl<'s, 't> CallbackRewriter<'_, 's, 't> {
    pub fn rewrite(&mut self, completion_callback: bool) -> Result<(), CodemodError> {
        let parameters = callback_parameters(self.callback);
        let Some(first) = parameters.first().copied() else {
            return Ok(());
        };
        let pattern = unwrap_typed_parameter(first);

        match pattern.kind() {
            "identifier" => {
                self.rewrite_named_context(&parameters, first, pattern, completion_callback)
            }
            "object_pattern" => {
                self.rewrite_destructured_context(&parameters, first, pattern, completion_callback)
            }
            _ => Ok(()),
        }
    }

    fn rewrite_named_context(
        &mut self,
        parameters: &[Node<'t>],
        first: Node<'t>,
        pattern: Node<'t>,
        completion_callback: bool,
    ) -> Result<(), CodemodError> {
        let Some(binding) = self.scopes.binding_declared_at(pattern) else {
            return Ok(());
        };
        let Some(body) = self.callback.child_by_field_name("body") else {
            return Ok(());
        };
        let context = node_text(pattern, self.source);
        let uses = self
            .scopes
            .references_within(body, binding, self.source)
            .into_iter()
            .map(|reference| ContextUse {
                reference,
                kind: classify(reference, self.source),
            })
            .collect::<Vec<_>>();

        let completion = completion_callback || uses.iter().any(ContextUse::needs_completion);
        let keep = uses.iter().any(ContextUse::keeps_parameter);
        tracing::debug!(
            context,
            references = uses.len(),
            completion,
            keep,
            "rewriting context parameter"
        );

        for context_use in &uses {
            self.apply_use(context, context_use, completion)?;
        }

        if completion {
            self.changes.replace(Span::of(first), COMPLETION_TOKEN)
        } else if keep {
            Ok(())
        } else {
            self.remove_parameter(parameters)
        }
    }

    fn apply_use(
        &mut self,
        context: &str,
        context_use: &ContextUse<'t, 's>,
        completion: bool,
    ) -> Result<(), CodemodError> {
        match context_use.kind {
            UseKind::Assertion {
                call,
                member,
                method,
                rule,
            } => {
                let site = AssertionCall {
                    call,
                    callee: member,
                    context,
                    method,
                };
                rewrite_assertion(&site, rule, COMPLETION_TOKEN, self.changes, self.diagnostics)
            }
            UseKind::Unmapped { call, method } => {
                self.diagnostics
                    .warn_at(call, unsupported_property(context, method));
                self.rename_if(completion, context_use.reference)
            }
            UseKind::EndValue { member } => self.changes.replace(Span::of(member), COMPLETION_TOKEN),
            UseKind::FailValue => self
                .changes
                .replace(Span::of(context_use.reference), COMPLETION_TOKEN),
            UseKind::ContextCall { member } => self.changes.replace(Span::of(member), "context"),
            UseKind::ContextAccess | UseKind::Property | UseKind::Whole => {
                self.rename_if(completion, context_use.reference)
            }
        }
    }

    /// Keeps leftover references bound once the parameter becomes the completion token.
    fn rename_if(&mut self, completion: bool, reference: Node<'t>) -> Result<(), CodemodError> {
        if !completion {
            return Ok(());
        }
        self.replace_reference(reference, COMPLETION_TOKEN)
    }

    /// `({ ok, is: equal, end }) => ..` is rewritten only when every member maps onto a target
    /// shape and, apart from `end` and `fail`, is only ever called directly. Anything else is
    /// reported and leaves the callback alone.
    fn rewrite_destructured_context(
        &mut self,
        parameters: &[Node<'t>],
        first: Node<'t>,
        pattern: Node<'t>,
        completion_callback: bool,
    ) -> Result<(), CodemodError> {
        let Some(body) = self.callback.child_by_field_name("body") else {
            return Ok(());
        };
        let Some(members) = destructured_members(pattern, self.source) else {
            self.diagnostics.warn_at(pattern, UNSUPPORTED_CONTEXT_PATTERN);
            return Ok(());
        };

        let mut planned = Vec::new();
        let mut completion = completion_callback;
        for (method, local) in members {
            let Some(rule) = lookup(method) else {
                self.diagnostics
                    .warn_at(local, unsupported_property(DESTRUCTURED_CONTEXT, method));
                return Ok(());
            };
            let Some(binding) = self.scopes.binding_declared_at(local) else {
                return Ok(());
            };
            completion |= rule.target.uses_completion_callback();

            for reference in self.scopes.references_within(body, binding, self.source) {
                match destructured_use(reference, method, rule) {
                    Some(planned_use) => planned.push(planned_use),
                    None => {
                        self.diagnostics.warn_at(
                            reference,
                            unsupported_destructured_use(DESTRUCTURED_CONTEXT, method),
                        );
                        return Ok(());
                    }
                }
            }
        }

        for planned_use in &planned {
            match planned_use {
                DestructuredUse::Call(site, rule) => rewrite_assertion(
                    site,
                    rule,
                    COMPLETION_TOKEN,
                    self.changes,
                    self.diagnostics,
                )?,
                DestructuredUse::Value { reference, target } => {
                    self.replace_reference(*reference, target)?
                }
            }
        }

        if completion {
            self.changes.replace(Span::of(first), COMPLETION_TOKEN)
        } else {
            self.remove_parameter(parameters)
        }
    }

    fn replace_reference(&mut self, reference: Node<'t>, target: &str) -> Result<(), CodemodError> {
        let replacement = if reference.kind() == "shorthand_property_identifier" {
            format!("{}: {target}", node_text(reference, self.source))
        } else {
            target.to_string()
        };
        self.changes.replace(Span::of(reference), &replacement)
    }

    /// Drops the context parameter. With further parameters after it the list is kept, since
    /// shifting them would hand the runner's completion callback to the next one.
    fn remove_parameter(&mut self, parameters: &[Node<'t>]) -> Result<(), CodemodError> {
        if let Some(parameter) = self.callback.child_by_field_name("parameter") {
            return self.changes.replace(Span::of(parameter), "()");
        }
        let Some(list) = self.callback.child_by_field_name("parameters") else {
            return Ok(());
        };
        match parameters {
            [] => Ok(()),
            [_] => self.changes.replace(Span::of(list), "()"),
            [_, _, ..] => {
                self.diagnostics.warn_at(list, EXTRA_CALLBACK_PARAMETERS);
                Ok(())
            }
        }
    }
}

/// One reference to a destructured context member.
#[derive(Debug, Clone, Copy)]
enum DestructuredUse<'t, 's> {
    /// `ok(a)`, `fail('x')`, `end()`
    Call(AssertionCall<'t, 's>, &'static RuleEntry),
    /// `end` or `fail` handed on as a value.
    Value {
        reference: Node<'t>,
        target: &'static str,
    },
}

fn destructured_use<'t, 's>(
    reference: Node<'t>,
    method: &'s str,
    rule: &'static RuleEntry,
) -> Option<DestructuredUse<'t, 's>> {
    if let Some(call) = enclosing_call_of_callee(reference)
        && call_arguments(call).is_some()
    {
        return Some(DestructuredUse::Call(
            AssertionCall {
                call,
                callee: reference,
                context: DESTRUCTURED_CONTEXT,
                method,
            },
            rule,
        ));
    }
    match rule.target {
        Target::CompletionEnd => Some(DestructuredUse::Value {
            reference,
            target: COMPLETION_TOKEN,
        }),
        Target::CompletionFail => Some(DestructuredUse::Value {
            reference,
            target: COMPLETION_FAIL,
        }),
        _ => None,
    }
}

fn callback_parameters(callback: Node<'_>) -> Vec<Node<'_>> {
    if let Some(parameter) = callback.child_by_field_name("parameter") {
        return vec![parameter];
    }
    callback
        .child_by_field_name("parameters")
        .map(named_children)
        .unwrap_or_default()
}

/// `t: ExecutionContext` is handled like `t`.
fn unwrap_typed_parameter(parameter: Node<'_>) -> Node<'_> {
    match parameter.kind() {
        "required_parameter" | "optional_parameter" => parameter
            .child_by_field_name("pattern")
            .unwrap_or(parameter),
        _ => parameter,
    }
}

/// `(method, local identifier)` pairs, or `None` for patterns with defaults, rests or nesting.
fn destructured_members<'t, 's>(
    pattern: Node<'t>,
    source: &'s str,
) -> Option<Vec<(&'s str, Node<'t>)>> {
    let mut members = Vec::new();
    for member in named_children(pattern) {
        match member.kind() {
            "shorthand_property_identifier_pattern" => {
                members.push((node_text(member, source), member));
            }
            "pair_pattern" => {
                let key = member.child_by_field_name("key")?;
                let value = member.child_by_field_name("value")?;
                if key.kind() != "property_identifier" || value.kind() != "identifier" {
                    return None;
                }
                members.push((node_text(key, source), value));
            }
            _ => return None,
        }
    }
    Some(members)
}

fn classify<'t, 's>(reference: Node<'t>, source: &'s str) -> UseKind<'t, 's> {
    let Some(member) = member_with_object(reference) else {
        return UseKind::Whole;
    };
    let Some(method) = property_name(member, source) else {
        return UseKind::Property;
    };

    if let Some(call) = enclosing_call_of_callee(member)
        && call_arguments(call).is_some()
    {
        return match lookup(method) {
            Some(rule) => UseKind::Assertion {
                call,
                member,
                method,
                rule,
            },
            None => UseKind::Unmapped { call, method },
        };
    }

    match method {
        "end" => UseKind::EndValue { member },
        "fail" => UseKind::FailValue,
        "context" => match member_with_object(member).and_then(enclosing_call_of_callee) {
            Some(_) => UseKind::ContextCall { member },
            None => UseKind::ContextAccess,
        },
        _ => UseKind::Property,
    }
}

//! Mapping from legacy context methods (`t.is`, `t.deepEqual`, ...) to target call shapes.
//!
//! The table is static and read-only, so it is shared freely between files
//! transformed in parallel.

/// How many arguments a legacy method expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` values; anything after them is an assertion message the target has no slot for.
    Exactly(usize),
    /// At least `n` values; optional trailing arguments are consumed by the target shape.
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Number of arguments missing from a call with `given` arguments.
    pub fn missing(self, given: usize) -> usize {
        match self {
            Self::Exactly(required) | Self::AtLeast(required) => required.saturating_sub(given),
            Self::Any => 0,
        }
    }

    pub fn describe(self) -> String {
        match self {
            Self::Exactly(required) => format!("should have {}", plural_arguments(required)),
            Self::AtLeast(required) => {
                format!("should have at least {}", plural_arguments(required))
            }
            Self::Any => "accepts any arguments".to_string(),
        }
    }
}

fn plural_arguments(count: usize) -> String {
    if count == 1 {
        "1 argument".to_string()
    } else {
        format!("{count} arguments")
    }
}

/// Value passed to the target matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Nothing,
    /// The legacy call's second argument.
    SecondArgument,
    Literal(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `expect(a)[.not].<matcher>(<expected>)`
    Matcher {
        matcher: &'static str,
        expected: Expected,
    },
    /// `toThrowError(b)` with a second argument, `toThrow()` without.
    Throws,
    /// `expect.assertions(n)`
    Assertions,
    /// `expect(v).toMatchSnapshot([message])`
    Snapshot,
    /// No target equivalent; the call disappears.
    Remove,
    /// `done.fail(...)`; forces the completion-callback style.
    CompletionFail,
    /// `done`; forces the completion-callback style.
    CompletionEnd,
}

impl Target {
    pub fn uses_completion_callback(self) -> bool {
        matches!(self, Self::CompletionFail | Self::CompletionEnd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleEntry {
    pub method: &'static str,
    pub target: Target,
    pub arity: Arity,
    pub negated: bool,
}

const fn matcher(
    method: &'static str,
    matcher: &'static str,
    expected: Expected,
    arity: usize,
    negated: bool,
) -> RuleEntry {
    RuleEntry {
        method,
        target: Target::Matcher { matcher, expected },
        arity: Arity::Exactly(arity),
        negated,
    }
}

static RULES: &[RuleEntry] = &[
    matcher("ok", "toBeTruthy", Expected::Nothing, 1, false),
    matcher("truthy", "toBeTruthy", Expected::Nothing, 1, false),
    matcher("notOk", "toBeFalsy", Expected::Nothing, 1, false),
    matcher("falsy", "toBeFalsy", Expected::Nothing, 1, false),
    matcher("ifError", "toBeFalsy", Expected::Nothing, 1, false),
    matcher("error", "toBeFalsy", Expected::Nothing, 1, false),
    matcher("true", "toBe", Expected::Literal("true"), 1, false),
    matcher("false", "toBe", Expected::Literal("false"), 1, false),
    matcher("is", "toBe", Expected::SecondArgument, 2, false),
    matcher("not", "toBe", Expected::SecondArgument, 2, true),
    matcher("same", "toEqual", Expected::SecondArgument, 2, false),
    matcher("deepEqual", "toEqual", Expected::SecondArgument, 2, false),
    matcher("notSame", "toEqual", Expected::SecondArgument, 2, true),
    matcher("notDeepEqual", "toEqual", Expected::SecondArgument, 2, true),
    matcher("regex", "toMatch", Expected::SecondArgument, 2, false),
    matcher("notRegex", "toMatch", Expected::SecondArgument, 2, true),
    RuleEntry {
        method: "throws",
        target: Target::Throws,
        arity: Arity::AtLeast(1),
        negated: false,
    },
    RuleEntry {
        method: "notThrows",
        target: Target::Throws,
        arity: Arity::AtLeast(1),
        negated: true,
    },
    RuleEntry {
        method: "plan",
        target: Target::Assertions,
        arity: Arity::Exactly(1),
        negated: false,
    },
    RuleEntry {
        method: "snapshot",
        target: Target::Snapshot,
        arity: Arity::AtLeast(1),
        negated: false,
    },
    RuleEntry {
        method: "pass",
        target: Target::Remove,
        arity: Arity::Any,
        negated: false,
    },
    RuleEntry {
        method: "fail",
        target: Target::CompletionFail,
        arity: Arity::Any,
        negated: false,
    },
    RuleEntry {
        method: "end",
        target: Target::CompletionEnd,
        arity: Arity::Any,
        negated: false,
    },
];

pub fn lookup(method: &str) -> Option<&'static RuleEntry> {
    RULES.iter().find(|entry| entry.method == method)
}

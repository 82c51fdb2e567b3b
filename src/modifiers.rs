//! Canonicalization of registration modifier chains (`test.serial.skip`, `test.after.always`, ...).

use crate::diagnostics::{HOOK_FOCUS_UNSUPPORTED, HOOK_SKIP_UNSUPPORTED, unknown_method};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Serial,
    Skip,
    Only,
    Before,
    After,
    BeforeEach,
    AfterEach,
    Always,
    Cb,
    Todo,
    Unknown(String),
}

impl Modifier {
    pub fn parse(name: &str) -> Self {
        match name {
            "serial" => Self::Serial,
            "skip" => Self::Skip,
            "only" => Self::Only,
            "before" => Self::Before,
            "after" => Self::After,
            "beforeEach" => Self::BeforeEach,
            "afterEach" => Self::AfterEach,
            "always" => Self::Always,
            "cb" => Self::Cb,
            "todo" => Self::Todo,
            other => Self::Unknown(other.to_string()),
        }
    }

    fn hook(&self) -> Option<Hook> {
        match self {
            Self::Before => Some(Hook::BeforeAll),
            Self::After => Some(Hook::AfterAll),
            Self::BeforeEach => Some(Hook::BeforeEach),
            Self::AfterEach => Some(Hook::AfterEach),
            _ => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Serial => "serial",
            Self::Skip => "skip",
            Self::Only => "only",
            Self::Before => "before",
            Self::After => "after",
            Self::BeforeEach => "beforeEach",
            Self::AfterEach => "afterEach",
            Self::Always => "always",
            Self::Cb => "cb",
            Self::Todo => "todo",
            Self::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl Hook {
    pub fn target_name(self) -> &'static str {
        match self {
            Self::BeforeAll => "beforeAll",
            Self::AfterAll => "afterAll",
            Self::BeforeEach => "beforeEach",
            Self::AfterEach => "afterEach",
        }
    }

    fn is_teardown(self) -> bool {
        matches!(self, Self::AfterAll | Self::AfterEach)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    None,
    Only,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCall {
    Test(Focus),
    Hook(Hook),
    Todo,
}

impl TargetCall {
    /// Callee text of the target registration.
    pub fn callee(self) -> &'static str {
        match self {
            Self::Test(Focus::None) => "test",
            Self::Test(Focus::Only) => "test.only",
            Self::Test(Focus::Skip) => "test.skip",
            Self::Hook(hook) => hook.target_name(),
            Self::Todo => "test.todo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    pub target: TargetCall,
    pub completion_callback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// The call is left exactly as written.
    UnknownMethod(String),
    /// The callee is kept; the callback body is still rewritten.
    HookSkip,
    HookFocus,
}

impl Unsupported {
    pub fn message(&self) -> String {
        match self {
            Self::UnknownMethod(name) => unknown_method(name),
            Self::HookSkip => HOOK_SKIP_UNSUPPORTED.to_string(),
            Self::HookFocus => HOOK_FOCUS_UNSUPPORTED.to_string(),
        }
    }

    pub fn rewrites_callback(&self) -> bool {
        !matches!(self, Self::UnknownMethod(_))
    }
}

pub fn parse_chain<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Modifier> {
    names.into_iter().map(Modifier::parse).collect()
}

/// Reduces a modifier chain to its target form; the order of `serial`, `skip`
/// and `only` in the chain does not matter.
pub fn normalize(chain: &[Modifier]) -> Result<Normalized, Unsupported> {
    let mut hook: Option<Hook> = None;
    let mut skip = false;
    let mut only = false;
    let mut todo = false;
    let mut completion_callback = false;

    for modifier in chain {
        match modifier {
            Modifier::Unknown(name) => return Err(Unsupported::UnknownMethod(name.clone())),
            Modifier::Serial => {}
            Modifier::Skip => skip = true,
            Modifier::Only => only = true,
            Modifier::Cb => completion_callback = true,
            Modifier::Todo => todo = true,
            Modifier::Always => {
                if !hook.is_some_and(Hook::is_teardown) {
                    return Err(Unsupported::UnknownMethod(modifier.name().to_string()));
                }
            }
            Modifier::Before | Modifier::After | Modifier::BeforeEach | Modifier::AfterEach => {
                if hook.is_some() || todo {
                    return Err(Unsupported::UnknownMethod(modifier.name().to_string()));
                }
                hook = modifier.hook();
            }
        }
    }

    if let Some(hook) = hook {
        if skip {
            return Err(Unsupported::HookSkip);
        }
        if only {
            return Err(Unsupported::HookFocus);
        }
        return Ok(Normalized {
            target: TargetCall::Hook(hook),
            completion_callback,
        });
    }

    if todo {
        return Ok(Normalized {
            target: TargetCall::Todo,
            completion_callback: false,
        });
    }

    let focus = if skip {
        Focus::Skip
    } else if only {
        Focus::Only
    } else {
        Focus::None
    };

    Ok(Normalized {
        target: TargetCall::Test(focus),
        completion_callback,
    })
}

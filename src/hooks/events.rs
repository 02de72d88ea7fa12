use std::fmt;

/// Outbound event emitted on the host bus after every successful build.
///
/// Reserved: user bindings may not claim it.
pub const BUILD_COMPLETED_EVENT: &str = "after:make:build";

/// Host lifecycle events the orchestrator always handles itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinEvent {
    Initialize,
    BeforeOfflineStart,
    BeforePackage,
}

impl BuiltinEvent {
    pub const ALL: [BuiltinEvent; 3] = [
        BuiltinEvent::Initialize,
        BuiltinEvent::BeforeOfflineStart,
        BuiltinEvent::BeforePackage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinEvent::Initialize => "initialize",
            BuiltinEvent::BeforeOfflineStart => "before:offline:start",
            BuiltinEvent::BeforePackage => "before:package:createDeploymentArtifacts",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

impl fmt::Display for BuiltinEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook does when its event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Accept the event and do nothing.
    Noop,
    /// Build the configured target, optionally arming the watch-rebuild loop.
    Build { watch: bool },
    /// Build one specific target, never watching.
    Make { target: String },
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookAction::Noop => f.write_str("noop"),
            HookAction::Build { watch: false } => f.write_str("build"),
            HookAction::Build { watch: true } => f.write_str("build --watch"),
            HookAction::Make { target } => write!(f, "make {target:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Builtin,
    UserBound,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::Builtin => "builtin",
            HookKind::UserBound => "user",
        })
    }
}

/// One entry of the hook table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub kind: HookKind,
    pub action: HookAction,
}

impl Hook {
    pub fn builtin(action: HookAction) -> Self {
        Self {
            kind: HookKind::Builtin,
            action,
        }
    }

    pub fn user_bound(target: impl Into<String>) -> Self {
        Self {
            kind: HookKind::UserBound,
            action: HookAction::Make {
                target: target.into(),
            },
        }
    }
}

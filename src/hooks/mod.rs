pub mod events;
pub mod registry;

pub use events::{BuiltinEvent, Hook, HookAction, HookKind, BUILD_COMPLETED_EVENT};
pub use registry::{builtin_hooks, register, HookTable};

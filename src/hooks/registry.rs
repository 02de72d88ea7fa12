use std::collections::BTreeMap;

use crate::config::BuildConfig;
use crate::log::BuildLog;

use super::events::{BuiltinEvent, Hook, HookAction, HookKind, BUILD_COMPLETED_EVENT};

/// Built-in bindings for a given configuration.
///
/// The offline start hook watches only when host-reload rebuilds are enabled;
/// packaging always builds once.
pub fn builtin_hooks(config: &BuildConfig) -> BTreeMap<String, HookAction> {
    BuiltinEvent::ALL
        .into_iter()
        .map(|event| {
            let action = match event {
                BuiltinEvent::Initialize => HookAction::Noop,
                BuiltinEvent::BeforeOfflineStart => HookAction::Build {
                    watch: config.rebuild_on_host_reload,
                },
                BuiltinEvent::BeforePackage => HookAction::Build { watch: false },
            };
            (event.as_str().to_string(), action)
        })
        .collect()
}

/// Merge user bindings into the built-in set.
///
/// Every user binding is checked against the built-in names only, so the
/// result does not depend on binding order. A binding that names a built-in
/// or the reserved completion event is dropped with one warning.
pub fn register(
    builtins: BTreeMap<String, HookAction>,
    user_bindings: &BTreeMap<String, String>,
    log: &dyn BuildLog,
) -> HookTable {
    let mut hooks: BTreeMap<String, Hook> = builtins
        .into_iter()
        .map(|(event, action)| (event, Hook::builtin(action)))
        .collect();

    for (event, target) in user_bindings {
        if hooks.get(event).is_some_and(|h| h.kind == HookKind::Builtin) {
            log.warning(&format!(
                "Unable to override registered internal hook \"{event}\"!"
            ));
            continue;
        }
        if event == BUILD_COMPLETED_EVENT {
            log.warning(&format!(
                "Unable to bind reserved hook \"{event}\"; it is emitted after each build"
            ));
            continue;
        }
        hooks.insert(event.clone(), Hook::user_bound(target.clone()));
    }

    HookTable { hooks }
}

/// Immutable event name -> hook mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookTable {
    hooks: BTreeMap<String, Hook>,
}

impl HookTable {
    pub fn get(&self, event: &str) -> Option<&Hook> {
        self.hooks.get(event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.hooks.contains_key(event)
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Hook)> {
        self.hooks.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::testing::{Level, RecordingLog};

    fn bindings(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builtins_follow_reload_flag() {
        let mut config = BuildConfig::default();
        let hooks = builtin_hooks(&config);
        assert_eq!(hooks.len(), 3);
        assert_eq!(hooks["initialize"], HookAction::Noop);
        assert_eq!(
            hooks["before:offline:start"],
            HookAction::Build { watch: false }
        );

        config.rebuild_on_host_reload = true;
        let hooks = builtin_hooks(&config);
        assert_eq!(
            hooks["before:offline:start"],
            HookAction::Build { watch: true }
        );
        assert_eq!(
            hooks["before:package:createDeploymentArtifacts"],
            HookAction::Build { watch: false }
        );
    }

    #[test]
    fn user_binding_is_installed_as_make_target() {
        let log = RecordingLog::default();
        let table = register(
            builtin_hooks(&BuildConfig::default()),
            &bindings(&[("before:deploy:function", "prep")]),
            &log,
        );
        assert_eq!(table.len(), 4);
        let hook = table.get("before:deploy:function").unwrap();
        assert_eq!(hook.kind, HookKind::UserBound);
        assert_eq!(
            hook.action,
            HookAction::Make {
                target: "prep".into()
            }
        );
        assert!(log.lines(Level::Warning).is_empty());
    }

    #[test]
    fn builtin_override_is_rejected_with_one_warning() {
        let log = RecordingLog::default();
        let builtins = builtin_hooks(&BuildConfig::default());
        let expected = builtins["before:offline:start"].clone();

        let table = register(
            builtins,
            &bindings(&[("before:offline:start", "evil")]),
            &log,
        );

        let hook = table.get("before:offline:start").unwrap();
        assert_eq!(hook.kind, HookKind::Builtin);
        assert_eq!(hook.action, expected);
        assert_eq!(
            log.lines(Level::Warning),
            vec![r#"Unable to override registered internal hook "before:offline:start"!"#]
        );
    }

    #[test]
    fn every_builtin_is_protected() {
        for event in crate::hooks::BuiltinEvent::ALL {
            let log = RecordingLog::default();
            let builtins = builtin_hooks(&BuildConfig::default());
            let before = builtins[event.as_str()].clone();
            let table = register(builtins, &bindings(&[(event.as_str(), "x")]), &log);
            assert_eq!(table.get(event.as_str()).unwrap().action, before);
            assert_eq!(log.lines(Level::Warning).len(), 1);
        }
    }

    #[test]
    fn reserved_completion_event_cannot_be_bound() {
        let log = RecordingLog::default();
        let table = register(
            builtin_hooks(&BuildConfig::default()),
            &bindings(&[(BUILD_COMPLETED_EVENT, "loop")]),
            &log,
        );
        assert!(!table.contains(BUILD_COMPLETED_EVENT));
        assert_eq!(log.lines(Level::Warning).len(), 1);
    }

    #[test]
    fn rejected_bindings_do_not_block_others() {
        let log = RecordingLog::default();
        let table = register(
            builtin_hooks(&BuildConfig::default()),
            &bindings(&[
                ("initialize", "a"),
                ("after:deploy:deploy", "b"),
                ("before:package:createDeploymentArtifacts", "c"),
                ("before:invoke:local:invoke", "d"),
            ]),
            &log,
        );
        assert_eq!(table.len(), 5);
        assert!(table.contains("after:deploy:deploy"));
        assert!(table.contains("before:invoke:local:invoke"));
        assert_eq!(log.lines(Level::Warning).len(), 2);
    }

    #[test]
    fn no_builtins_means_everything_binds() {
        let log = RecordingLog::default();
        let table = register(
            BTreeMap::new(),
            &bindings(&[("initialize", "a")]),
            &log,
        );
        assert_eq!(table.get("initialize").unwrap().kind, HookKind::UserBound);
        assert!(log.lines(Level::Warning).is_empty());
    }
}

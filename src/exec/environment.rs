use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Variables handed to a spawned build.
///
/// `None` marks a variable the host wants removed from the child even when the
/// ambient environment defines it. Keys and values are kept as OS strings so
/// ambient variables that are not valid UTF-8 still reach the child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, Option<OsString>>,
}

impl Environment {
    /// Overlay `host` onto the current process environment.
    pub fn capture<I>(host: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        Self::overlay(std::env::vars_os(), host)
    }

    /// Overlay `host` onto `ambient`. Host entries win on every collision.
    pub fn overlay<A, K, V, H>(ambient: A, host: H) -> Self
    where
        A: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
        H: IntoIterator<Item = (String, Option<String>)>,
    {
        let mut vars: BTreeMap<OsString, Option<OsString>> = ambient
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .collect();
        vars.extend(host.into_iter().map(|(k, v)| (k.into(), v.map(Into::into))));
        Self { vars }
    }

    /// UTF-8 view of a present variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_os(key).and_then(OsStr::to_str)
    }

    pub fn get_os(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars
            .get(key.as_ref())
            .and_then(|v| v.as_deref())
    }

    /// Variables that should be present in the child.
    pub fn present(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_os_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.present().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

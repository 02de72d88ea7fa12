use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::paths::join_under;

/// `*` and `?` never cross a path separator; `**` does.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One configured watch path: an exact path or a glob pattern.
///
/// Either may name something that does not exist yet. A change matches when
/// the changed path, or any directory above it, is the entry's path or
/// matches its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    path: PathBuf,
    pattern: Option<Pattern>,
}

impl WatchEntry {
    /// Absolute path, or the absolute pattern text for globs.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_glob(&self) -> bool {
        self.pattern.is_some()
    }

    /// Whether a change at `changed` concerns this entry.
    pub fn matches(&self, changed: &Path) -> bool {
        changed.ancestors().any(|candidate| match &self.pattern {
            Some(pattern) => pattern.matches_path_with(candidate, MATCH_OPTIONS),
            None => candidate == self.path,
        })
    }

    /// Deepest path without glob characters. `root` itself is taken literally.
    fn literal_prefix(&self, root: &Path) -> PathBuf {
        if self.pattern.is_none() {
            return self.path.clone();
        }
        let (base, rest) = match self.path.strip_prefix(root) {
            Ok(rel) => (root.to_path_buf(), rel),
            Err(_) => (PathBuf::new(), self.path.as_path()),
        };
        let literal: PathBuf = rest
            .components()
            .take_while(|c| match c {
                Component::Normal(part) => !is_glob(&part.to_string_lossy()),
                _ => true,
            })
            .collect();
        base.join(literal)
    }
}

/// Absolute paths observed while watch mode is armed.
///
/// The build file always comes first, followed by the configured watch paths
/// in order. Paths and patterns are resolved under the service root; nothing
/// is expanded up front, so files created after arming are still seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    root: PathBuf,
    entries: Vec<WatchEntry>,
}

impl WatchSet {
    pub fn resolve(root: &Path, build_file: &Path, patterns: &[String]) -> Self {
        let mut set = Self {
            root: root.to_path_buf(),
            entries: Vec::new(),
        };
        set.push(WatchEntry {
            path: build_file.to_path_buf(),
            pattern: None,
        });
        for raw in patterns {
            let path = join_under(root, Path::new(raw));
            if !is_glob(raw) {
                set.push(WatchEntry {
                    path,
                    pattern: None,
                });
                continue;
            }
            // Escape the root so its own characters are matched literally.
            let text = match path.strip_prefix(root) {
                Ok(rel) => Path::new(&Pattern::escape(&root.to_string_lossy()))
                    .join(rel)
                    .to_string_lossy()
                    .into_owned(),
                Err(_) => path.to_string_lossy().into_owned(),
            };
            match Pattern::new(&text) {
                Ok(pattern) => set.push(WatchEntry {
                    path,
                    pattern: Some(pattern),
                }),
                Err(e) => warn!(pattern = %raw, "invalid watch pattern: {e}"),
            }
        }
        set
    }

    pub fn entries(&self) -> &[WatchEntry] {
        &self.entries
    }

    /// Whether a change at `changed` concerns any entry.
    pub fn matches(&self, changed: &Path) -> bool {
        self.entries.iter().any(|e| e.matches(changed))
    }

    /// Existing paths to poll so that every entry is covered.
    ///
    /// An entry is polled at its literal prefix, or the nearest existing
    /// directory above it inside the service root. Entries outside the root
    /// are polled only if they exist. Anchors nested in another directory
    /// anchor are dropped.
    pub fn anchors(&self) -> Vec<PathBuf> {
        let mut anchors: Vec<PathBuf> = Vec::new();
        for entry in &self.entries {
            let prefix = entry.literal_prefix(&self.root);
            let found = prefix
                .ancestors()
                .find(|p| p.exists())
                .filter(|p| p.starts_with(&self.root) || *p == prefix.as_path());
            match found {
                Some(anchor) => {
                    if anchor != prefix.as_path() {
                        debug!(
                            path = %entry.path.display(),
                            anchor = %anchor.display(),
                            "watch path does not exist yet, polling nearest parent"
                        );
                    }
                    anchors.push(anchor.to_path_buf());
                }
                None => warn!(
                    path = %entry.path.display(),
                    "no existing directory to watch, skipping"
                ),
            }
        }
        anchors.sort();
        anchors.dedup();
        let dirs: Vec<PathBuf> = anchors.iter().filter(|p| p.is_dir()).cloned().collect();
        anchors.retain(|a| !dirs.iter().any(|d| a != d && a.starts_with(d)));
        anchors
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: WatchEntry) {
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

//! Lexical path helpers shared by the build file and watch set resolution.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` under `root`, then normalize.
///
/// An absolute `path` does not replace `root`: its root and prefix are
/// dropped, so `/Makefile.ci` under `/srv/app` is `/srv/app/Makefile.ci`.
pub(crate) fn join_under(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    normalize(&root.join(relative))
}

/// Lexically drop `.` segments and fold `..` into its parent.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dot_segments() {
        assert_eq!(
            normalize(Path::new("/srv/app/./Makefile")),
            PathBuf::from("/srv/app/Makefile")
        );
        assert_eq!(
            normalize(Path::new("/srv/app/build/../Makefile")),
            PathBuf::from("/srv/app/Makefile")
        );
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn relative_paths_join_under_root() {
        assert_eq!(
            join_under(Path::new("/srv/app"), Path::new("./build/Makefile")),
            PathBuf::from("/srv/app/build/Makefile")
        );
        assert_eq!(
            join_under(Path::new("/srv/app"), Path::new("src/")),
            PathBuf::from("/srv/app/src")
        );
    }

    #[cfg(unix)]
    #[test]
    fn absolute_paths_stay_under_root() {
        assert_eq!(
            join_under(Path::new("/srv/app"), Path::new("/Makefile.ci")),
            PathBuf::from("/srv/app/Makefile.ci")
        );
        assert_eq!(
            join_under(Path::new("/srv/app"), Path::new("/etc/includes")),
            PathBuf::from("/srv/app/etc/includes")
        );
    }
}

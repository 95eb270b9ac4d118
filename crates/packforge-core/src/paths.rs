//! Path helpers shared by the pipeline stages.

use std::path::{Component, Path, PathBuf};

/// Convert a path taken from build metadata to a host path.
///
/// Build metadata is frequently written with `\` separators; on hosts that
/// use `/` those are rewritten so the path splits into components.
pub fn from_build_path(raw: &str) -> PathBuf {
    if std::path::MAIN_SEPARATOR == '/' {
        PathBuf::from(raw.replace('\\', "/"))
    } else {
        PathBuf::from(raw)
    }
}

/// Make `path` absolute against `base` and remove `.` and `..` components.
///
/// This is purely lexical; the file system is not consulted.
pub fn normalize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Render a relative path with `/` separators, as used inside packages.
pub fn to_package_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Join two in-package path segments with `/`, skipping empty segments.
pub fn join_package_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_paths_use_host_separators() {
        let path = from_build_path(r"proj\lib\ref.csproj");
        if std::path::MAIN_SEPARATOR == '/' {
            assert_eq!(path, PathBuf::from("proj/lib/ref.csproj"));
        }
        assert_eq!(path.file_name().unwrap(), "ref.csproj");
    }

    #[test]
    fn normalize_resolves_relative_components() {
        let base = Path::new("/work/app");
        assert_eq!(
            normalize(base, Path::new("../shared/./readme.txt")),
            PathBuf::from("/work/shared/readme.txt")
        );
        assert_eq!(
            normalize(base, Path::new("/abs/file.txt")),
            PathBuf::from("/abs/file.txt")
        );
    }

    #[test]
    fn package_paths_use_forward_slashes() {
        assert_eq!(to_package_path(Path::new("runtimes/win/native")), "runtimes/win/native");
        assert_eq!(to_package_path(Path::new("")), "");
        assert_eq!(join_package_path("lib/net45/", "a.dll"), "lib/net45/a.dll");
        assert_eq!(join_package_path("", "a.dll"), "a.dll");
    }
}

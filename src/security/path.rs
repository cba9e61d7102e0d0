use std::path::{Component, Path, PathBuf};

use reqwest::Url;

use crate::error::ShellError;

/// Resolve a user-supplied path against `base_dir`, refusing traversal.
///
/// `None` (or an empty string) resolves to `base_dir` itself. Relative
/// targets are joined onto `base_dir`; absolute targets are taken as-is.
/// A `..` segment in the raw input is rejected outright, and the
/// normalized result is checked again. On platforms with drive prefixes a
/// result on a different drive than `base_dir` is rejected too.
///
/// No filesystem access happens here.
pub fn resolve_safe_path(target: Option<&str>, base_dir: &Path) -> Result<PathBuf, ShellError> {
    let Some(target) = target.filter(|t| !t.is_empty()) else {
        return Ok(base_dir.to_path_buf());
    };

    // Split on both separators so `a\..\b` is caught on every platform.
    if target.split(['/', '\\']).any(|seg| seg == "..") {
        log::warn!("rejected traversal in path: {target}");
        return Err(ShellError::PathTraversal(
            "cannot use .. in paths".into(),
        ));
    }

    let joined = if Path::new(target).is_absolute() {
        PathBuf::from(target)
    } else {
        base_dir.join(target)
    };
    let normalized = normalize(&joined);

    if normalized
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ShellError::PathTraversal(
            "resolved path contains ..".into(),
        ));
    }

    if drive_of(base_dir) != drive_of(&normalized) {
        return Err(ShellError::PathTraversal(
            "cannot access different drive".into(),
        ));
    }

    Ok(normalized)
}

/// Lexically normalize a path: drop `.` segments, fold `..` into its parent.
/// A `..` that would climb above the root is kept so the caller can see it.
fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// The drive/UNC prefix of a path, if the platform has one.
fn drive_of(path: &Path) -> Option<std::ffi::OsString> {
    match path.components().next() {
        Some(Component::Prefix(p)) => Some(p.as_os_str().to_ascii_uppercase()),
        _ => None,
    }
}

/// Parse a fetch target and allow only `http` and `https`.
///
/// Pure validation: no network access.
pub fn validate_fetch_url(raw: &str) -> Result<Url, ShellError> {
    let url = Url::parse(raw).map_err(|_| ShellError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => {
            log::warn!("rejected fetch scheme {other}: {raw}");
            Err(ShellError::UnsafeProtocol(format!("{other}:")))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn resolve(target: Option<&str>) -> Result<PathBuf, ShellError> {
        resolve_safe_path(target, Path::new("/home/user"))
    }

    #[test]
    fn absent_target_is_base() {
        assert_eq!(resolve(None).unwrap(), PathBuf::from("/home/user"));
        assert_eq!(resolve(Some("")).unwrap(), PathBuf::from("/home/user"));
    }

    #[test]
    fn relative_target_joins_base() {
        assert_eq!(
            resolve(Some("sub/dir")).unwrap(),
            PathBuf::from("/home/user/sub/dir")
        );
    }

    #[test]
    fn dot_segments_are_normalized() {
        assert_eq!(
            resolve(Some("./sub/./file.txt")).unwrap(),
            PathBuf::from("/home/user/sub/file.txt")
        );
        assert_eq!(resolve(Some(".")).unwrap(), PathBuf::from("/home/user"));
    }

    #[test]
    fn absolute_target_is_kept() {
        assert_eq!(resolve(Some("/tmp/x")).unwrap(), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn parent_segments_are_rejected() {
        for t in ["../../etc/passwd", "..", "sub/../../x", "/tmp/../etc", "a\\..\\b"] {
            assert!(
                matches!(resolve(Some(t)), Err(ShellError::PathTraversal(_))),
                "target: {t}"
            );
        }
    }

    #[test]
    fn dotted_names_are_not_traversal() {
        assert_eq!(
            resolve(Some("..hidden/x..y")).unwrap(),
            PathBuf::from("/home/user/..hidden/x..y")
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        assert_eq!(resolve(Some("a/b")).unwrap(), resolve(Some("a/b")).unwrap());
    }

    #[test]
    fn normalize_keeps_root() {
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn http_and_https_pass() {
        assert_eq!(validate_fetch_url("http://example.com/").unwrap().scheme(), "http");
        assert_eq!(
            validate_fetch_url("HTTPS://example.com/a?b=1").unwrap().scheme(),
            "https"
        );
    }

    #[test]
    fn other_schemes_fail() {
        for raw in ["file:///etc/passwd", "ftp://host/x", "javascript:alert(1)"] {
            assert!(
                matches!(validate_fetch_url(raw), Err(ShellError::UnsafeProtocol(_))),
                "url: {raw}"
            );
        }
    }

    #[test]
    fn malformed_urls_fail() {
        assert!(matches!(validate_fetch_url("not a url"), Err(ShellError::InvalidUrl)));
        assert!(matches!(validate_fetch_url("http://"), Err(ShellError::InvalidUrl)));
    }
}

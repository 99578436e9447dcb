//! Virtual path utilities
//!
//! Pure string manipulation for the absolute, `/`-separated paths used by the
//! virtual filesystem. Every path handed to the store goes through
//! [`normalize`] first, so the rest of the crate can compare paths as plain
//! strings.

/// The root of every virtual tree
pub const ROOT: &str = "/";

/// Normalize a virtual path
///
/// The result is always absolute: a leading `/` is added, empty and `.`
/// segments are dropped, `..` pops a segment (clamped at the root) and any
/// trailing slash is removed.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(path.matches('/').count() + 1);

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    let mut result = String::with_capacity(path.len() + 1);
    for part in &parts {
        result.push('/');
        result.push_str(part);
    }

    if result.is_empty() {
        return ROOT.to_string();
    }

    result
}

/// Join a base directory and a (possibly relative) path
///
/// An absolute `path` resets the join, like POSIX `path.join` semantics
/// applied to a resolved base.
pub fn join(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        return normalize(path);
    }

    let mut joined = String::with_capacity(base.len() + path.len() + 1);
    joined.push_str(base);
    if !joined.ends_with('/') {
        joined.push('/');
    }
    joined.push_str(path);

    normalize(&joined)
}

/// Get the parent directory of a normalized path
#[inline]
pub fn dirname(path: &str) -> &str {
    let path = path.trim_end_matches('/');

    match path.rfind('/') {
        Some(0) | None => ROOT,
        Some(idx) => &path[..idx],
    }
}

/// Get the last segment of a path
#[inline]
pub fn basename(path: &str) -> &str {
    let path = path.trim_end_matches('/');

    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Get the extension of a path, including the leading dot
#[inline]
pub fn extname(path: &str) -> &str {
    let base = basename(path);

    if base.is_empty() || base == "." || base == ".." {
        return "";
    }

    // A leading dot marks a hidden file, not an extension
    match base.rfind('.') {
        Some(dot_idx) if dot_idx > 0 => &base[dot_idx..],
        _ => "",
    }
}

/// Split a normalized path into its segments (the root has none)
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Check whether `path` equals `ancestor` or lives somewhere below it
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return true;
    }

    match path.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Move `path` from under `from` to under `to`
///
/// Returns `None` when `path` is not within `from`.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if !is_within(path, from) {
        return None;
    }

    let rest = if from == ROOT { path } else { &path[from.len()..] };
    Some(join(to, rest.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/foo/bar//baz/asdf/quux/.."), "/foo/bar/baz/asdf");
        assert_eq!(normalize("foo/bar/../baz"), "/foo/baz");
        assert_eq!(normalize("./foo/bar"), "/foo/bar");
        assert_eq!(normalize("/components/"), "/components");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/../.."), "/");
        assert_eq!(normalize("/a/../../b"), "/b");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/components", "./Button.jsx"), "/components/Button.jsx");
        assert_eq!(join("/components/ui", "../App"), "/components/App");
        assert_eq!(join("/", "lib/utils"), "/lib/utils");
        assert_eq!(join("/components", "/App.jsx"), "/App.jsx");
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/foo/bar/baz"), "/foo/bar");
        assert_eq!(dirname("/foo"), "/");
        assert_eq!(dirname("/"), "/");
    }

    #[test]
    fn test_basename_and_extname() {
        assert_eq!(basename("/components/Button.jsx"), "Button.jsx");
        assert_eq!(basename("/"), "");
        assert_eq!(extname("/components/Button.jsx"), ".jsx");
        assert_eq!(extname("/index.coffee.md"), ".md");
        assert_eq!(extname("/.env"), "");
        assert_eq!(extname("/README"), "");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/a/b/c.jsx", "/a"));
        assert!(is_within("/a", "/a"));
        assert!(is_within("/anything", "/"));
        assert!(!is_within("/ab", "/a"));
        assert!(!is_within("/a", "/a/b"));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(rebase("/old/x/y.jsx", "/old", "/new").as_deref(), Some("/new/x/y.jsx"));
        assert_eq!(rebase("/old", "/old", "/new").as_deref(), Some("/new"));
        assert_eq!(rebase("/other", "/old", "/new"), None);
    }

    #[test]
    fn test_segments() {
        assert_eq!(segments("/a/b/c").collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(segments("/").count(), 0);
    }
}

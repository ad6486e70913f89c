//! Path Algebra
//!
//! Stateless helpers over `/`-separated model paths. A full path can mix two
//! addressing domains: the page path (an absolute path to a page node) and the
//! item path (a path through `items` maps inside that page). The two are
//! separated by the [`CONTENT_DELIMITER`] segment:
//!
//! ```text
//! /content/site/page/jcr:content/root/child0010
//! └──── page path ──┘            └─ item path ─┘
//! ```
//!
//! Functions that can fail return `Option` instead of an empty string so that
//! callers cannot mistake "no parent" for "the root".

use crate::models::CONTENT_DELIMITER;

/// A full path split at the first content delimiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContentPaths {
    pub page_path: String,
    pub item_path: Option<String>,
}

/// Prefix `/` unless already present. Empty input stays empty.
pub fn make_absolute(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Strip one leading `/`
pub fn make_relative(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Collapse runs of `/` into a single separator
pub fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut previous_slash = false;

    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(c);
    }

    normalized
}

/// Join the non-empty segments with `/`, then normalize
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let joined = segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    normalize(&joined)
}

/// Last segment of the path
///
/// `None` for an empty path or a path ending in `/`.
pub fn node_name(path: &str) -> Option<&str> {
    let start = path.rfind('/').map_or(0, |index| index + 1);
    if start >= path.len() {
        return None;
    }
    Some(&path[start..])
}

/// Everything before the last segment
///
/// `None` when the path has no separator, ends with `/`, or the parent would
/// be empty (`"/page"`).
pub fn parent_node_path(path: &str) -> Option<&str> {
    let index = path.rfind('/')?;
    if index + 1 >= path.len() || index == 0 {
        return None;
    }
    Some(&path[..index])
}

/// Suffix of `target` below `root`
///
/// Both paths are compared segment by segment after dropping a leading `/`.
/// Returns `target` unchanged when `root` is not a segment prefix of it.
pub fn subpath(target: &str, root: &str) -> String {
    if target.is_empty() {
        return String::new();
    }

    let target_segments: Vec<&str> = make_relative(target).split('/').collect();
    let root_segments: Vec<&str> = make_relative(root).split('/').collect();

    if target_segments.len() < root_segments.len() {
        return target.to_string();
    }

    if target_segments[..root_segments.len()] == root_segments[..] {
        target_segments[root_segments.len()..].join("/")
    } else {
        target.to_string()
    }
}

/// Split `path` on every delimiter in turn
///
/// A delimiter only matches as a full segment preceded by `/`, or as the whole
/// fragment. Each delimiter pass operates on the fragments left by the
/// previous one. Empty fragments are dropped.
pub fn split_by_delimiters(path: &str, delimiters: &[&str]) -> Vec<String> {
    let mut paths = vec![path.to_string()];

    for delimiter in delimiters {
        let mut fragments = Vec::new();

        for path in &paths {
            let segments: Vec<&str> = path.split('/').collect();
            let mut current: Vec<&str> = Vec::new();

            for (index, segment) in segments.iter().enumerate() {
                if segment == delimiter && (index > 0 || segments.len() == 1) {
                    fragments.push(current.join("/"));
                    current.clear();
                } else {
                    current.push(*segment);
                }
            }
            fragments.push(current.join("/"));
        }

        paths = fragments
            .into_iter()
            .filter(|fragment| !fragment.is_empty())
            .collect();
    }

    paths
}

fn strip_segment_prefix<'a>(path: &'a str, segment: &str) -> Option<&'a str> {
    path.strip_prefix(segment)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn strip_segment_suffix<'a>(path: &'a str, segment: &str) -> Option<&'a str> {
    path.strip_suffix(segment)
        .filter(|rest| rest.is_empty() || rest.ends_with('/'))
}

/// Repeatedly strip any of `strings` from both ends of `path`, as whole segments
pub fn trim_strings(path: &str, strings: &[&str]) -> String {
    let mut trimmed = path.to_string();

    for string in strings.iter().filter(|s| !s.is_empty()) {
        while let Some(rest) = strip_segment_prefix(&trimmed, string) {
            trimmed = make_relative(rest).to_string();
        }

        while let Some(rest) = strip_segment_suffix(&trimmed, string) {
            trimmed = rest.strip_suffix('/').unwrap_or(rest).to_string();
        }
    }

    trimmed
}

/// The run of `strings` segments found at the start of `path`, joined with `/`
pub fn leading_strings(path: &str, strings: &[&str]) -> String {
    let mut remaining = path;
    let mut leading = Vec::new();

    for string in strings.iter().filter(|s| !s.is_empty()) {
        while let Some(rest) = strip_segment_prefix(remaining, string) {
            remaining = make_relative(rest);
            leading.push(*string);
        }
    }

    leading.join("/")
}

/// Split a full path at the first `/<delimiter>/`
///
/// Without a delimiter the whole input is the page path.
pub fn split_page_content_paths(path: &str) -> PageContentPaths {
    let anchored = format!("/{}/", CONTENT_DELIMITER);

    match path.split_once(anchored.as_str()) {
        Some((page_path, item_path)) => PageContentPaths {
            page_path: page_path.to_string(),
            item_path: Some(item_path.to_string()).filter(|item| !item.is_empty()),
        },
        None => PageContentPaths {
            page_path: path.to_string(),
            item_path: None,
        },
    }
}

/// Whether the path addresses an item inside a page (`<page>/<delimiter>/<item>`)
pub fn is_item(path: &str) -> bool {
    let anchored = format!("/{}/", CONTENT_DELIMITER);

    path.match_indices(anchored.as_str())
        .any(|(index, matched)| index > 0 && index + matched.len() < path.len())
}

/// Drop a trailing `/<delimiter>` so `page/jcr:content` addresses `page`
pub fn strip_content_suffix(path: &str) -> &str {
    path.strip_suffix(CONTENT_DELIMITER)
        .and_then(|rest| rest.strip_suffix('/'))
        .unwrap_or(path)
}

/// Build `<page>/<delimiter>/<item>`
pub fn content_path(page_path: &str, item_path: &str) -> String {
    if item_path.is_empty() {
        return page_path.to_string();
    }
    format!("{}/{}/{}", page_path, CONTENT_DELIMITER, item_path)
}

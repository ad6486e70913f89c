//! Model URL Helpers
//!
//! Rewrites page locations into model request URLs and back:
//!
//! - `/content/site/page.html` → `/content/site/page.model.json` ([`to_model_url`])
//! - `http://localhost:4502/ctx/content/site/page.html` → `/content/site/page` ([`sanitize`])
//!
//! The optional context path (a prefix the site is deployed under) is derived
//! from a location with [`context_path_of`] and passed explicitly; nothing here
//! reads global state.

use crate::utils::path::make_absolute;
use regex::Regex;
use std::sync::OnceLock;

/// Everything before the first repository root segment is the context path
const CONTEXT_PATH_PATTERN: &str = r"^(.*)/(?:content|conf|apps|libs|etc)/.*$";

/// Scheme, host and optional port in front of the path
const ORIGIN_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^/]+(/.*)?$";

/// resource, selectors + extension, suffix, query parameters
const RESOURCE_PATTERN: &str =
    r"^([/a-zA-Z0-9:_-]*)\.?([a-zA-Z0-9._-]*)/?([a-zA-Z0-9/._-]*)\??([a-zA-Z0-9=&]*)$";

const HTML_EXTENSION_PATTERN: &str = r"\.html?$";

fn context_path_regex() -> &'static Regex {
    static CONTEXT_PATH_REGEX: OnceLock<Regex> = OnceLock::new();
    CONTEXT_PATH_REGEX.get_or_init(|| Regex::new(CONTEXT_PATH_PATTERN).unwrap())
}

fn origin_regex() -> &'static Regex {
    static ORIGIN_REGEX: OnceLock<Regex> = OnceLock::new();
    ORIGIN_REGEX.get_or_init(|| Regex::new(ORIGIN_PATTERN).unwrap())
}

fn resource_regex() -> &'static Regex {
    static RESOURCE_REGEX: OnceLock<Regex> = OnceLock::new();
    RESOURCE_REGEX.get_or_init(|| Regex::new(RESOURCE_PATTERN).unwrap())
}

fn html_extension_regex() -> &'static Regex {
    static HTML_EXTENSION_REGEX: OnceLock<Regex> = OnceLock::new();
    HTML_EXTENSION_REGEX.get_or_init(|| Regex::new(HTML_EXTENSION_PATTERN).unwrap())
}

/// Context path of a location (`/ctx/content/site` → `/ctx`)
pub fn context_path_of(location: &str) -> String {
    context_path_regex()
        .captures(location)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Remove the context path from the front of `url`
pub fn internalize(url: &str, context_path: &str) -> String {
    if url.is_empty() || context_path.is_empty() {
        return url.to_string();
    }

    let prefix = if context_path.ends_with('/') {
        context_path.to_string()
    } else {
        format!("{}/", context_path)
    };

    if url.starts_with(&prefix) {
        url.replacen(context_path, "", 1)
    } else {
        url.to_string()
    }
}

/// Prefix `url` with the context path unless already there
pub fn externalize(url: &str, context_path: &str) -> String {
    if context_path.is_empty() || url.starts_with(context_path) {
        url.to_string()
    } else {
        format!("{}{}", context_path, url)
    }
}

/// Reduce a location to a page path
///
/// Drops scheme/host/port, everything from the first `.` (selectors and
/// extension), and the context path. `None` for an empty location.
pub fn sanitize(location: &str, context_path: &str) -> Option<String> {
    if location.is_empty() {
        return None;
    }

    let path = match origin_regex().captures(location) {
        Some(caps) => caps.get(1).map_or("/", |m| m.as_str()).to_string(),
        None => location.to_string(),
    };

    let path = match path.find('.') {
        Some(index) => &path[..index],
        None => path.as_str(),
    };

    Some(internalize(path, context_path))
}

/// Insert `.selector` before the first `.` of the path, or append it
pub fn add_selector(path: &str, selector: &str) -> String {
    if selector.is_empty() {
        return path.to_string();
    }

    let selector = if selector.starts_with('.') {
        selector.to_string()
    } else {
        format!(".{}", selector)
    };

    if path.is_empty() || path.contains(&selector) {
        return path.to_string();
    }

    match path.find('.') {
        Some(index) if index > 0 => format!("{}{}{}", &path[..index], selector, &path[index..]),
        _ => format!("{}{}", path, selector),
    }
}

/// Give the path the `.extension`, replacing a trailing `.html`/`.htm`
///
/// A suffix and query parameters are kept after the extension.
pub fn add_extension(path: &str, extension: &str) -> String {
    if extension.is_empty() {
        return path.to_string();
    }

    let extension = if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    };

    if path.is_empty() || path.contains(&extension) {
        return path.to_string();
    }

    let Some(caps) = resource_regex().captures(path) else {
        return format!("{}{}", path, extension);
    };

    let resource = caps.get(1).map_or("", |m| m.as_str());
    let selectors = caps.get(2).map_or("", |m| m.as_str());
    let suffix = caps.get(3).map_or("", |m| m.as_str());
    let parameters = caps.get(4).map_or("", |m| m.as_str());

    let mut base = resource.to_string();
    if !selectors.is_empty() {
        let selectors = format!(".{}", selectors);
        base.push_str(&html_extension_regex().replace(&selectors, extension.as_str()));
    }
    if !base.ends_with(&extension) {
        base.push_str(&extension);
    }

    if !suffix.is_empty() {
        base.push('/');
        base.push_str(suffix);
    }
    if !parameters.is_empty() {
        base.push('?');
        base.push_str(parameters);
    }

    base
}

/// Request URL for the model of `path`
pub fn to_model_url(path: &str, selector: &str, extension: &str, context_path: &str) -> String {
    let url = add_selector(path, selector);
    let url = add_extension(&url, extension);
    make_absolute(&externalize(&url, context_path))
}

//! Post-login destination sanitizing

/// Where to go when no usable destination was given
pub const DEFAULT_RETURN_TO: &str = "/";

/// Keep `candidate` only if it is a same-origin absolute path
///
/// Accepts `/path?query`; rejects absolute URLs, protocol-relative `//host`
/// and `/\host` forms, and anything with control characters.
pub fn sanitize_return_to(candidate: Option<&str>) -> String {
    match candidate {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => DEFAULT_RETURN_TO.to_string(),
    }
}

fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(char::is_control)
}

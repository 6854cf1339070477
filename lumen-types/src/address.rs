//! Address string helpers.
//!
//! Addresses are `/`-delimited, case-sensitive paths such as
//! `/Light1/FXLight/intensity`. Spaces are never part of an address.

/// Canonical form: spaces removed, runs of slashes collapsed, exactly one
/// leading slash. An address that is empty after stripping stays empty.
pub fn normalize(address: &str) -> String {
    let stripped = strip_spaces(address);
    if stripped.is_empty() {
        return stripped;
    }
    collapse_slashes(&format!("/{}", stripped))
}

fn strip_spaces(address: &str) -> String {
    address.chars().filter(|c| *c != ' ').collect()
}

/// Join a prefix and a member name into a single absolute address.
///
/// Runs of slashes collapse to one and spaces are stripped, so
/// `join("/Light 1/FXLight/", "intensity")` yields `/Light1/FXLight/intensity`.
pub fn join(prefix: &str, member: &str) -> String {
    normalize(&format!("{}/{}", prefix, member))
}

/// Make sure an address starts with exactly one slash.
pub fn with_leading_slash(address: &str) -> String {
    collapse_slashes(&format!("/{}", strip_spaces(address)))
}

/// Canonical storage form for group target lists: no leading slash.
pub fn strip_leading_slash(address: &str) -> String {
    normalize(address).trim_start_matches('/').to_string()
}

fn collapse_slashes(address: &str) -> String {
    let mut out = String::with_capacity(address.len());
    let mut last_was_slash = false;
    for c in address.chars() {
        if c == '/' {
            if !last_was_slash {
                out.push(c);
            }
            last_was_slash = true;
        } else {
            out.push(c);
            last_was_slash = false;
        }
    }
    out
}

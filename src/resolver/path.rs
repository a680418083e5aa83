//! Project path derivation from clone URLs and partial paths.
//!
//! Turns decorated references into the namespaced path the API understands:
//!
//! | Reference | Derived path |
//! |-----------|--------------|
//! | `https://host/grp/proj.git` | `grp/proj` |
//! | `https://host/api/v4/grp/proj` | `grp/proj` |
//! | `git@host:grp/sub/proj.git` | `grp/sub/proj` |
//! | `host.example.com/grp/proj` | `grp/proj` |
//! | `grp/proj` | `grp/proj` |

/// Leading segment pair identifying the REST API root inside a URL path.
const API_PREFIX: [&str; 2] = ["api", "v4"];

/// Derives a namespaced project path from a reference.
///
/// Steps:
/// 1. strip a leading `scheme://`;
/// 2. discard the host segment (`host/...`, or `user@host:` for scp-style
///    SSH references); a schemeless reference only has a host segment when its
///    first segment looks like one (contains `.` or `:`, or is `localhost`);
/// 3. strip trailing slashes and a trailing `.git`;
/// 4. drop exactly one leading `api/v4` pair, keeping the rest unchanged.
///
/// Returns `None` when nothing remains.
///
/// A schemeless first segment is kept unless it looks like a host, so a bare
/// `proj` or `grp/proj` still reaches the path lookup instead of collapsing to
/// an empty path.
#[must_use]
pub fn extract_project_path(reference: &str) -> Option<String> {
    let reference = reference.trim();
    let remainder = match reference.split_once("://") {
        Some((_, rest)) => strip_host(rest)?,
        None => strip_schemeless_host(reference),
    };

    let remainder = remainder.trim_end_matches('/');
    let remainder = remainder.strip_suffix(".git").unwrap_or(remainder);

    let segments: Vec<&str> = remainder.split('/').collect();
    let path = if segments.len() >= 2 && segments[..2] == API_PREFIX {
        segments[2..].join("/")
    } else {
        remainder.to_string()
    };

    (!path.is_empty()).then_some(path)
}

/// Returns the last `/` segment of a derived path, used as a bare project name.
#[must_use]
pub fn project_name_from_path(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

fn strip_host(after_scheme: &str) -> Option<&str> {
    after_scheme.split_once('/').map(|(_, path)| path)
}

fn strip_schemeless_host(reference: &str) -> &str {
    if let Some((host, path)) = reference.split_once(':')
        && host.contains('@')
        && !host.contains('/')
    {
        return path;
    }

    match reference.split_once('/') {
        Some((first, rest)) if looks_like_host(first) => rest,
        _ => reference,
    }
}

fn looks_like_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

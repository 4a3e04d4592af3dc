use log::warn;
use std::path::{Path, PathBuf};

const INDEX_FILES: &[&str] = &["index.html", "index.htm"];

#[derive(Debug, PartialEq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory without an index file; `display_path` is the decoded URL path.
    Listing { dir: PathBuf, display_path: String },
    /// Directory requested without its trailing slash.
    Redirect(String),
}

#[derive(Debug, PartialEq)]
pub enum ResolveError {
    NotFound,
    Traversal,
}

/// Splits a request target into its path and optional query, dropping any fragment.
fn split_target(target: &str) -> (&str, Option<&str>) {
    let target = target.split('#').next().unwrap_or("");
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

pub fn resolve(root: &Path, target: &str) -> Result<Resolved, ResolveError> {
    let (raw_path, query) = split_target(target);

    let decoded = percent_encoding::percent_decode_str(raw_path)
        .decode_utf8()
        .map_err(|_| ResolveError::NotFound)?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or(ResolveError::Traversal)?;
            }
            s if s.contains(['\\', '\0']) => return Err(ResolveError::Traversal),
            s => segments.push(s),
        }
    }

    let mut path = root.to_path_buf();
    path.extend(&segments);

    let canonical = path.canonicalize().map_err(|_| ResolveError::NotFound)?;
    if !canonical.starts_with(root) {
        warn!(
            "Path escapes served root: {} -> {}",
            target,
            canonical.display()
        );
        return Err(ResolveError::Traversal);
    }

    if canonical.is_dir() {
        if !raw_path.ends_with('/') {
            let location = match query {
                Some(q) => format!("{}/?{}", raw_path, q),
                None => format!("{}/", raw_path),
            };
            return Ok(Resolved::Redirect(location));
        }

        for index in INDEX_FILES {
            let candidate = canonical.join(index);
            if candidate.is_file() {
                return Ok(Resolved::File(candidate));
            }
        }

        return Ok(Resolved::Listing {
            dir: canonical,
            display_path: decoded.into_owned(),
        });
    }

    if raw_path.ends_with('/') || !canonical.is_file() {
        return Err(ResolveError::NotFound);
    }

    Ok(Resolved::File(canonical))
}

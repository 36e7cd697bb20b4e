//! Static asset serving for paths under the configured prefix.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("txt", "text/plain; charset=utf-8"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("woff2", "font/woff2"),
];

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file read from the static directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Files under one base directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Content type for `path`, by extension (case-insensitive).
    #[must_use]
    pub fn content_type_for(path: &Path) -> &'static str {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FALLBACK_CONTENT_TYPE;
        };
        CONTENT_TYPES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map_or(FALLBACK_CONTENT_TYPE, |(_, ct)| ct)
    }

    /// Read the asset at `rel` (relative to the mount prefix). Escaping the
    /// root and missing files are both `NotFound`.
    pub fn load(&self, rel: &str) -> io::Result<Asset> {
        let path = resolve_under(&self.root, rel).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("refused asset path '{rel}'"))
        })?;
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no asset at {}", path.display()),
            ));
        }
        Ok(Asset {
            bytes: fs::read(&path)?,
            content_type: Self::content_type_for(&path),
        })
    }
}

/// Join `rel` onto `root` one normal component at a time.
///
/// Parent, root and prefix components are refused outright, so the result
/// never leaves `root`. An empty `rel` has nothing to name and is refused too.
pub(crate) fn resolve_under(root: &Path, rel: &str) -> Option<PathBuf> {
    let mut parts = Path::new(rel.trim_start_matches('/'))
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .peekable();
    parts.peek()?;
    parts.try_fold(root.to_path_buf(), |mut acc, c| match c {
        Component::Normal(seg) => {
            acc.push(seg);
            Some(acc)
        }
        _ => None,
    })
}

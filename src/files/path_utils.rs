//! Remote directory path model
//!
//! Remote directories are always `/`-delimited, start and end with `/`, and are
//! relative to the root the server exposes. `..` never survives normalization:
//! going up strips the last segment instead of appending `..`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized absolute remote directory (e.g. `/`, `/mods/`, `/world/region/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RemoteDir(String);

/// One clickable ancestor in the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Segment name shown to the user
    pub label: String,
    /// Directory up to and including this segment
    pub path: RemoteDir,
}

impl RemoteDir {
    /// The server root, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalize an arbitrary path string into a directory.
    ///
    /// Empty and `.` segments are dropped, `..` pops the previous segment
    /// (and is ignored at the root), and the result is re-wrapped in slashes.
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }
        Self::from_segments(&segments)
    }

    fn from_segments(segments: &[&str]) -> Self {
        if segments.is_empty() {
            return Self::root();
        }
        let mut path = String::from("/");
        for segment in segments {
            path.push_str(segment);
            path.push('/');
        }
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Enter the child directory `name`.
    ///
    /// `..` is treated as [`ascend`](Self::ascend) and `.`/empty as "stay" so the
    /// invariant holds even for hand-typed names.
    pub fn descend(&self, name: &str) -> Self {
        match name {
            "" | "." => self.clone(),
            ".." => self.ascend(),
            name => Self(format!("{}{}/", self.0, name)),
        }
    }

    /// Parent directory; the root is its own parent.
    pub fn ascend(&self) -> Self {
        if self.is_root() {
            return self.clone();
        }
        let trimmed = &self.0[..self.0.len() - 1];
        match trimmed.rfind('/') {
            Some(idx) => Self(trimmed[..=idx].to_string()),
            None => Self::root(),
        }
    }

    /// Every ancestor segment with the prefix that leads to it. Empty for `/`.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = Vec::new();
        let mut prefix = String::from("/");
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            prefix.push_str(segment);
            prefix.push('/');
            crumbs.push(Breadcrumb {
                label: segment.to_string(),
                path: Self(prefix.clone()),
            });
        }
        crumbs
    }

    /// Full remote path of an entry inside this directory (no trailing slash).
    pub fn entry_path(&self, name: &str) -> String {
        format!("{}{}", self.0, name)
    }

    /// Directory name as shown in titles (`/` for the root).
    pub fn name(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("/")
    }
}

impl Default for RemoteDir {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for RemoteDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RemoteDir {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for RemoteDir {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<RemoteDir> for String {
    fn from(value: RemoteDir) -> Self {
        value.0
    }
}

/// Wire form of a remote path: the server resolves paths relative to its root,
/// so every path is sent with a leading `.`.
pub fn to_wire_path(path: &str) -> String {
    format!(".{}", path)
}

//! Path addressing for ConfigTree lookups
//!
//! Every accessor on [`ConfigTree`](super::ConfigTree) takes a path that is
//! either a single `/`-delimited string or an explicit list of segments.
//! Empty segments (leading, trailing or doubled slashes) are dropped.

/// Anything that can be turned into an ordered list of path segments.
///
/// A string is split on `/`. A list is taken segment by segment, so a list
/// element containing `/` is kept as one literal segment.
pub trait CfgPath {
    /// Returns the non-empty segments of this path.
    fn segments(&self) -> Vec<&str>;

    /// Renders the path back as a `/`-joined string, for error messages.
    fn display(&self) -> String {
        self.segments().join("/")
    }
}

impl CfgPath for str {
    fn segments(&self) -> Vec<&str> {
        self.split('/').filter(|s| !s.is_empty()).collect()
    }
}

impl CfgPath for String {
    fn segments(&self) -> Vec<&str> {
        self.as_str().segments()
    }
}

impl CfgPath for [&str] {
    fn segments(&self) -> Vec<&str> {
        self.iter().copied().filter(|s| !s.is_empty()).collect()
    }
}

impl<const N: usize> CfgPath for [&str; N] {
    fn segments(&self) -> Vec<&str> {
        self.as_slice().segments()
    }
}

impl CfgPath for Vec<&str> {
    fn segments(&self) -> Vec<&str> {
        self.as_slice().segments()
    }
}

impl CfgPath for [String] {
    fn segments(&self) -> Vec<&str> {
        self.iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl CfgPath for Vec<String> {
    fn segments(&self) -> Vec<&str> {
        self.as_slice().segments()
    }
}

//! Time-series paths.
//!
//! A path names a device or a measurement under a device, as dot-joined
//! components: `root.sg.d` is a device, `root.sg.d.s1` one of its
//! measurements.

use std::fmt;

/// A dot-joined time-series path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    components: Vec<String>,
}

impl Path {
    pub fn new(components: Vec<String>) -> Self {
        Self { components }
    }

    /// Parses a dot-joined path string.
    pub fn parse(s: &str) -> Self {
        Self {
            components: s.split('.').map(str::to_string).collect(),
        }
    }

    /// Returns this path extended by one component.
    pub fn child(&self, component: impl Into<String>) -> Path {
        let mut components = self.components.clone();
        components.push(component.into());
        Path { components }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("."))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = Path::parse("root.sg.d");
        assert_eq!(path.components(), ["root", "sg", "d"]);
        assert_eq!(path.to_string(), "root.sg.d");
    }

    #[test]
    fn test_child() {
        let device = Path::parse("root.sg.d");
        let measurement = device.child("s1");
        assert_eq!(measurement, Path::parse("root.sg.d.s1"));
        // Parent unchanged.
        assert_eq!(device.components().len(), 3);
    }

    #[test]
    fn test_ordering() {
        assert!(Path::parse("root.sg.d.s1") < Path::parse("root.sg.d.s2"));
    }
}

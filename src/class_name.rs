use serde::Serialize;
use std::fmt;

use crate::error::{ClassError, Result};

pub const CLASS_SUFFIX: &str = ".class";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ClassError::Argument("class name cannot be empty".to_string()));
        }
        if name.starts_with('.')
            || name.ends_with('.')
            || name.contains("..")
            || name.contains(['/', '\\'])
        {
            return Err(ClassError::Argument(format!("invalid class name [{name}]")));
        }
        Ok(Self(name))
    }

    pub fn parse_lenient(raw: &str) -> Result<Self> {
        let mut s = raw.trim();
        if let Some(rest) = s.strip_prefix("import ") {
            s = rest.trim();
        }
        if s.ends_with(';') {
            s = s.trim_end_matches(';').trim();
        }
        Self::new(s.chars().filter(|c| !c.is_whitespace()).collect::<String>())
    }

    pub(crate) fn known(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn from_resource_path(path: &str) -> Option<Self> {
        let stem = path.strip_suffix(CLASS_SUFFIX)?;
        Self::new(stem.replace(['/', '\\'], ".")).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `a.b.C` -> `a/b/C.class`
    pub fn resource_path(&self) -> String {
        format!("{}{CLASS_SUFFIX}", self.0.replace('.', "/"))
    }

    pub fn package_dir(&self) -> Option<String> {
        self.0
            .rsplit_once('.')
            .map(|(package, _)| package.replace('.', "/"))
    }

    pub fn file_name(&self) -> String {
        let simple = self.0.rsplit('.').next().unwrap_or(&self.0);
        format!("{simple}{CLASS_SUFFIX}")
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ClassName {
    type Err = ClassError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_path_mirrors_package_structure() {
        let name = ClassName::new("org.example.pkg.Widget").unwrap();
        assert_eq!(name.resource_path(), "org/example/pkg/Widget.class");
        assert_eq!(name.package_dir().as_deref(), Some("org/example/pkg"));
        assert_eq!(name.file_name(), "Widget.class");
    }

    #[test]
    fn default_package_has_no_directory() {
        let name = ClassName::new("Standalone").unwrap();
        assert_eq!(name.resource_path(), "Standalone.class");
        assert_eq!(name.package_dir(), None);
        assert_eq!(name.file_name(), "Standalone.class");
    }

    #[test]
    fn nested_classes_keep_dollar_sign() {
        let name = ClassName::new("a.Outer$Inner").unwrap();
        assert_eq!(name.resource_path(), "a/Outer$Inner.class");
    }

    #[test]
    fn rejects_empty_and_malformed_names() {
        assert!(matches!(ClassName::new(""), Err(ClassError::Argument(_))));
        assert!(matches!(ClassName::new("a..B"), Err(ClassError::Argument(_))));
        assert!(matches!(ClassName::new(".A"), Err(ClassError::Argument(_))));
    }

    #[test]
    fn rejects_path_separators() {
        for raw in ["x/y", "a.b/C", "a\\B"] {
            let err = ClassName::new(raw).unwrap_err();
            assert!(matches!(err, ClassError::Argument(_)), "{raw}");
            assert!(err.to_string().contains(raw), "{raw}");
        }
        assert!(ClassName::parse_lenient("import x/y;").is_err());
    }

    #[test]
    fn parse_lenient_strips_import_whitespace_and_semicolon() {
        let name = ClassName::parse_lenient("import org.springframework.stereotype. Component ;").unwrap();
        assert_eq!(name.as_str(), "org.springframework.stereotype.Component");
    }

    #[test]
    fn from_resource_path_inverts_resource_path() {
        let name = ClassName::from_resource_path("org/example/A.class").unwrap();
        assert_eq!(name.as_str(), "org.example.A");
        assert!(ClassName::from_resource_path("META-INF/MANIFEST.MF").is_none());
    }
}

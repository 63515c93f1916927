use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{ClassError, Result};
use crate::probe;
use crate::scan;

// `!` is escaped so it cannot be mistaken for the entry delimiter.
const PATH_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'!');

pub const ENTRY_DELIMITER: &str = "!/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassPathEntry {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ClassPathEntry {
    pub fn parse(raw: &str) -> Self {
        let path = scan::expand_home(raw);
        if is_archive_name(&path) || path.is_file() {
            Self::Archive(path)
        } else {
            Self::Directory(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(p) | Self::Archive(p) => p,
        }
    }

    fn locate(&self, name: &str) -> Result<Option<ResourceLocation>> {
        match self {
            Self::Directory(dir) => {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Ok(Some(ResourceLocation::new(Protocol::File, dir, name)));
                }
                Ok(None)
            }
            Self::Archive(archive_path) => {
                // A class path may name archives that were never built.
                if !archive_path.is_file() {
                    return Ok(None);
                }
                if probe::archive_contains(archive_path, name)? {
                    return Ok(Some(ResourceLocation::new(Protocol::Jar, archive_path, name)));
                }
                Ok(None)
            }
        }
    }
}

fn is_archive_name(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    File,
    Jar,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Jar => "jar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    protocol: Protocol,
    container: PathBuf,
    entry: String,
}

impl ResourceLocation {
    fn new(protocol: Protocol, container: &Path, entry: &str) -> Self {
        let container = std::path::absolute(container).unwrap_or_else(|_| container.to_path_buf());
        Self {
            protocol,
            container,
            entry: entry.to_string(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn container(&self) -> &Path {
        &self.container
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn url(&self) -> String {
        match self.protocol {
            Protocol::File => format!("file:{}", encode_path(&self.container.join(&self.entry))),
            Protocol::Jar => format!(
                "jar:file:{}{ENTRY_DELIMITER}{}",
                encode_path(&self.container),
                self.entry
            ),
        }
    }

    pub fn open(&self) -> Result<ResourceHandle> {
        let reader: Box<dyn Read + Send> = match self.protocol {
            Protocol::File => {
                let path = self.container.join(&self.entry);
                let file = File::open(&path).map_err(|e| {
                    ClassError::io(format!("could not open resource [{}]", path.display()), e)
                })?;
                Box::new(file)
            }
            Protocol::Jar => {
                let bytes = probe::read_entry(&self.container, &self.entry)?.ok_or_else(|| {
                    ClassError::NotFound(format!(
                        "resource not found [{}] in archive [{}]",
                        self.entry,
                        self.container.display()
                    ))
                })?;
                Box::new(Cursor::new(bytes))
            }
        };
        Ok(ResourceHandle {
            location: self.clone(),
            reader,
        })
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

fn encode_path(path: &Path) -> String {
    let mut raw = path.to_string_lossy().replace('\\', "/");
    if !raw.starts_with('/') {
        raw.insert(0, '/');
    }
    utf8_percent_encode(&raw, PATH_SET).to_string()
}

pub struct ResourceHandle {
    location: ResourceLocation,
    reader: Box<dyn Read + Send>,
}

impl ResourceHandle {
    pub fn location(&self) -> &ResourceLocation {
        &self.location
    }
}

impl Read for ResourceHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("location", &self.location.url())
            .finish_non_exhaustive()
    }
}

pub trait ResourceScope: Send + Sync + fmt::Debug {
    fn find_resources(&self, name: &str) -> Result<Vec<ResourceLocation>>;

    fn open_resource(&self, name: &str) -> Result<Option<ResourceHandle>> {
        match self.find_resources(name)?.first() {
            Some(location) => location.open().map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchScope {
    entries: Vec<ClassPathEntry>,
}

impl SearchScope {
    pub fn new(entries: Vec<ClassPathEntry>) -> Self {
        Self { entries }
    }

    pub fn parse(class_path: &str) -> Result<Self> {
        Ok(Self::new(scan::expand_class_path(class_path)?))
    }

    pub fn entries(&self) -> &[ClassPathEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ClassPathEntry) {
        self.entries.push(entry);
    }
}

impl ResourceScope for SearchScope {
    fn find_resources(&self, name: &str) -> Result<Vec<ResourceLocation>> {
        if !is_valid_resource_name(name) {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in &self.entries {
            if let Some(location) = entry.locate(name)? {
                debug!(resource = name, location = %location, "resource candidate");
                found.push(location);
            }
        }
        Ok(found)
    }

    fn open_resource(&self, name: &str) -> Result<Option<ResourceHandle>> {
        if !is_valid_resource_name(name) {
            return Ok(None);
        }

        for entry in &self.entries {
            if let Some(location) = entry.locate(name)? {
                debug!(resource = name, location = %location, "resource resolved");
                return location.open().map(Some);
            }
        }
        Ok(None)
    }
}

fn is_valid_resource_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('/') || name.contains('\\') {
        return false;
    }
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::tests::write_jar;
    use std::io::Read;

    fn read_all(mut handle: ResourceHandle) -> Vec<u8> {
        let mut out = Vec::new();
        handle.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn entry_kind_follows_extension() {
        assert!(matches!(ClassPathEntry::parse("lib/a.jar"), ClassPathEntry::Archive(_)));
        assert!(matches!(ClassPathEntry::parse("lib/a.ZIP"), ClassPathEntry::Archive(_)));
        assert!(matches!(
            ClassPathEntry::parse("does-not-exist/classes"),
            ClassPathEntry::Directory(_)
        ));
    }

    #[test]
    fn find_resources_enumerates_in_entry_order() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        std::fs::create_dir_all(classes.join("a")).unwrap();
        std::fs::write(classes.join("a/B.class"), b"dir").unwrap();
        let jar = dir.path().join("lib.jar");
        write_jar(&jar, &[("a/B.class", b"jar")]);

        let scope = SearchScope::new(vec![
            ClassPathEntry::Directory(classes.clone()),
            ClassPathEntry::Archive(jar.clone()),
        ]);
        let found = scope.find_resources("a/B.class").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].protocol(), Protocol::File);
        assert_eq!(found[1].protocol(), Protocol::Jar);
        assert_eq!(found[1].container(), jar.as_path());

        let handle = scope.open_resource("a/B.class").unwrap().unwrap();
        assert_eq!(read_all(handle), b"dir");
    }

    #[test]
    fn missing_entries_contribute_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let scope = SearchScope::new(vec![
            ClassPathEntry::Directory(dir.path().join("nope")),
            ClassPathEntry::Archive(dir.path().join("nope.jar")),
        ]);
        assert!(scope.find_resources("a/B.class").unwrap().is_empty());
        assert!(scope.open_resource("a/B.class").unwrap().is_none());
    }

    #[test]
    fn corrupt_archive_fails_enumeration() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("bad.jar");
        std::fs::write(&jar, b"garbage").unwrap();

        let scope = SearchScope::new(vec![ClassPathEntry::Archive(jar)]);
        assert!(scope.find_resources("a/B.class").is_err());
    }

    #[test]
    fn names_escaping_the_entry_are_not_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        std::fs::create_dir_all(&classes).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();

        let scope = SearchScope::new(vec![ClassPathEntry::Directory(classes)]);
        assert!(scope.find_resources("../secret.txt").unwrap().is_empty());
        assert!(scope.find_resources("/etc/hosts").unwrap().is_empty());
    }

    #[test]
    fn jar_url_escapes_spaces_and_bangs() {
        let location = ResourceLocation::new(Protocol::Jar, Path::new("/opt/my libs!/x.jar"), "a/B.class");
        assert_eq!(location.url(), "jar:file:/opt/my%20libs%21/x.jar!/a/B.class");
    }

    #[test]
    fn file_url_points_at_the_loose_file() {
        let location = ResourceLocation::new(Protocol::File, Path::new("/opt/classes"), "a/B.class");
        assert_eq!(location.url(), "file:/opt/classes/a/B.class");
    }
}

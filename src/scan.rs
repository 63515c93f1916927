use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::error::{ClassError, Result};
use crate::scope::ClassPathEntry;

const WILDCARD_SUFFIXES: [&str; 2] = ["/*", "\\*"];

pub fn scan_archives(base_path: &Path) -> Result<Vec<PathBuf>> {
    if !base_path.is_dir() {
        return Ok(Vec::new());
    }

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .build();

    let mut archives = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            ClassError::io(
                format!("could not scan directory [{}]", base_path.display()),
                std::io::Error::other(e),
            )
        })?;
        let path = entry.path();
        if entry.file_type().is_some_and(|t| t.is_file())
            && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("jar"))
        {
            archives.push(path.to_path_buf());
        }
    }

    archives.sort();
    Ok(archives)
}

pub fn expand_class_path(class_path: &str) -> Result<Vec<ClassPathEntry>> {
    let mut entries = Vec::new();
    for raw in std::env::split_paths(class_path) {
        let raw = raw.to_string_lossy().to_string();
        if raw.trim().is_empty() {
            continue;
        }

        if let Some(dir) = WILDCARD_SUFFIXES.iter().find_map(|s| raw.strip_suffix(s)) {
            let dir = expand_home(dir);
            entries.extend(scan_archives(&dir)?.into_iter().map(ClassPathEntry::Archive));
            continue;
        }

        entries.push(ClassPathEntry::parse(&raw));
    }
    Ok(entries)
}

pub fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(raw),
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(raw),
    }
}

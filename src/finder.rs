use percent_encoding::percent_decode_str;
use std::path::PathBuf;
use tracing::debug;

use crate::error::Result;
use crate::registry::ClassDef;
use crate::scope::Protocol;

pub fn locate_archive(class: &ClassDef) -> Result<Option<PathBuf>> {
    let Some(origin) = class.origin.as_ref() else {
        return Ok(None);
    };

    let class_file = class.resource_path();
    for location in origin.find_resources(&class_file)? {
        if let Some(path) = archive_path_from_location(&location.url()) {
            debug!(class = %class.name, archive = %path.display(), "archive located");
            return Ok(Some(path));
        }
    }
    Ok(None)
}

// `jar:file:/opt/x%20y.jar!/a/B.class` -> `/opt/x y.jar`
pub fn archive_path_from_location(url: &str) -> Option<PathBuf> {
    let (protocol, path) = url.split_once(':')?;
    if protocol != Protocol::Jar.as_str() {
        return None;
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let path = match path.find('!') {
        Some(idx) => &path[..idx],
        None => path,
    };
    if path.is_empty() {
        return None;
    }

    let decoded = percent_decode_str(path).decode_utf8_lossy().to_string();
    Some(PathBuf::from(native_path(decoded)))
}

#[cfg(windows)]
fn native_path(decoded: String) -> String {
    // `/C:/lib/a.jar` -> `C:/lib/a.jar`
    let bytes = decoded.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'/' && bytes[2] == b':' {
        return decoded[1..].to_string();
    }
    decoded
}

#[cfg(not(windows))]
fn native_path(decoded: String) -> String {
    decoded
}

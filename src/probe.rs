use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::class_name::{CLASS_SUFFIX, ClassName};
use crate::error::{ClassError, Result};

pub type MappedArchive = ZipArchive<Cursor<Mmap>>;

pub fn open_archive(archive_path: &Path) -> Result<MappedArchive> {
    let file = File::open(archive_path).map_err(|e| {
        ClassError::io(format!("could not open archive [{}]", archive_path.display()), e)
    })?;
    // SAFETY: The file is opened read-only and the map is owned by the returned archive.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
        ClassError::io(format!("could not map archive [{}]", archive_path.display()), e)
    })?;
    ZipArchive::new(Cursor::new(mmap)).map_err(|e| ClassError::archive(archive_path, e))
}

pub fn archive_contains(archive_path: &Path, entry: &str) -> Result<bool> {
    let mut archive = open_archive(archive_path)?;
    let found = contains_entry(&mut archive, archive_path, entry)?;
    Ok(found)
}

pub(crate) fn contains_entry(archive: &mut MappedArchive, archive_path: &Path, entry: &str) -> Result<bool> {
    match archive.by_name(entry) {
        Ok(_) => Ok(true),
        Err(ZipError::FileNotFound) => Ok(false),
        Err(e) => Err(ClassError::archive(archive_path, e)),
    }
}

/// Reads one entry fully; `None` when the archive has no such entry.
pub fn read_entry(archive_path: &Path, entry: &str) -> Result<Option<Vec<u8>>> {
    let mut archive = open_archive(archive_path)?;
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ClassError::archive(archive_path, e)),
    };

    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes).map_err(|e| {
        ClassError::io(
            format!("could not read [{entry}] from archive [{}]", archive_path.display()),
            e,
        )
    })?;
    Ok(Some(bytes))
}

pub fn list_classes(archive_path: &Path, top_level_only: bool) -> Result<Vec<ClassName>> {
    let mut archive = open_archive(archive_path)?;

    let mut classes = Vec::new();
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ClassError::archive(archive_path, e))?;
        let name = entry.name();
        if !name.ends_with(CLASS_SUFFIX) {
            continue;
        }
        if top_level_only && name.contains('$') {
            continue;
        }
        if let Some(class_name) = ClassName::from_resource_path(name) {
            classes.push(class_name);
        }
    }

    classes.sort();
    classes.dedup();
    Ok(classes)
}

use ignore::WalkBuilder;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;
use tracing::{debug, warn};
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::class_name::ClassName;
use crate::error::{ClassError, Result};
use crate::locator::ResourceLocator;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const DEFAULT_MANIFEST: &[u8] = b"Manifest-Version: 1.0\r\n\r\n";

// Names are `class-kit-<pid>-<counter>-<random>`.
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct StagingDirectory {
    dir: Option<TempDir>,
}

impl StagingDirectory {
    pub fn create(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            ClassError::io(format!("could not create dir [{}]", root.display()), e)
        })?;

        let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        let prefix = format!("class-kit-{}-{n}-", std::process::id());
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(root)
            .map_err(|e| {
                ClassError::io(format!("could not create staging dir in [{}]", root.display()), e)
            })?;
        debug!(staging = %dir.path().display(), "staging directory created");
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match self.dir.as_ref() {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    pub fn close(mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let path = dir.path().to_path_buf();
        dir.close()
            .map_err(|e| ClassError::io(format!("could not delete dir [{}]", path.display()), e))
    }
}

impl Drop for StagingDirectory {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(staging = %path.display(), error = %e, "could not delete staging directory");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedEntry {
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub entries: Vec<StagedEntry>,
    pub created_package_dirs: usize,
}

#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    locator: ResourceLocator,
    staging_root: PathBuf,
}

impl ArchiveBuilder {
    pub fn new(locator: ResourceLocator) -> Self {
        Self {
            locator,
            staging_root: std::env::temp_dir(),
        }
    }

    pub fn staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }

    pub fn build_to_path(&self, path: &Path, classes: &[ClassName]) -> Result<BuildSummary> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClassError::io(format!("could not create dir [{}]", parent.display()), e)
            })?;
        }

        let file = File::create(path)
            .map_err(|e| ClassError::io(format!("could not create file [{}]", path.display()), e))?;
        let result = self.build(BufWriter::new(file), classes);
        if result.is_err()
            && let Err(e) = std::fs::remove_file(path)
        {
            warn!(output = %path.display(), error = %e, "could not remove incomplete archive");
        }
        result
    }

    /// Stages every class, then streams the staged tree into `output`.
    ///
    /// `output` must be seekable because the zip writer patches entry headers
    /// after writing them. For a plain stream such as stdout, build into a
    /// `Cursor<Vec<u8>>` and copy it out, or use `build_to_path`.
    ///
    /// Nothing is written to `output` unless every class was staged. If the
    /// build fails and removing the staging directory fails too, the build
    /// error is returned and the cleanup failure is only logged.
    pub fn build<W: Write + Seek>(&self, output: W, classes: &[ClassName]) -> Result<BuildSummary> {
        let staging = StagingDirectory::create(&self.staging_root)?;

        let result = self
            .stage_all(staging.path(), classes)
            .and_then(|summary| package_dir(staging.path(), output).map(|_| summary));

        match result {
            Ok(summary) => {
                staging.close()?;
                Ok(summary)
            }
            Err(primary) => {
                if let Err(cleanup) = staging.close() {
                    warn!(error = %cleanup, "staging cleanup failed after build error");
                }
                Err(primary)
            }
        }
    }

    fn stage_all(&self, staging: &Path, classes: &[ClassName]) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();
        for class in classes {
            let dir = match class.package_dir() {
                Some(package) => staging.join(package),
                None => staging.to_path_buf(),
            };
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    ClassError::io(format!("could not create dir [{}]", dir.display()), e)
                })?;
                summary.created_package_dirs += 1;
            }

            let entry = self.stage_class(class, &dir)?;
            match summary.entries.iter_mut().find(|e| e.path == entry.path) {
                Some(existing) => *existing = entry,
                None => summary.entries.push(entry),
            }
        }
        Ok(summary)
    }

    fn stage_class(&self, class: &ClassName, dir: &Path) -> Result<StagedEntry> {
        let resource_path = class.resource_path();
        let mut source = self
            .locator
            .get_resource(&resource_path)?
            .ok_or_else(|| ClassError::NotFound(format!("class resource not found [{resource_path}]")))?;

        let target = dir.join(class.file_name());
        let file = File::create(&target)
            .map_err(|e| ClassError::io(format!("could not create file [{}]", target.display()), e))?;
        let mut sink = HashingWriter::new(BufWriter::new(file));
        let size = io::copy(&mut source, &mut sink)
            .and_then(|n| sink.flush().map(|_| n))
            .map_err(|e| ClassError::io(format!("could not stage [{resource_path}]"), e))?;

        debug!(class = %class, from = %source.location(), size, "class staged");
        Ok(StagedEntry {
            path: resource_path,
            size,
            sha256: sink.finish(),
        })
    }
}

fn package_dir<W: Write + Seek>(root: &Path, output: W) -> Result<()> {
    let files = staged_files(root)?;

    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(output);
    zip.start_file(MANIFEST_PATH, options)
        .map_err(|e| ClassError::zip("failed to write archive manifest", e))?;
    zip.write_all(DEFAULT_MANIFEST)
        .map_err(|e| ClassError::io("failed to write archive manifest", e))?;

    for (entry_name, path) in files {
        zip.start_file(entry_name.as_str(), options)
            .map_err(|e| ClassError::zip(format!("failed to add [{entry_name}] to archive"), e))?;
        let mut file = File::open(&path)
            .map_err(|e| ClassError::io(format!("could not open [{}]", path.display()), e))?;
        io::copy(&mut file, &mut zip)
            .map_err(|e| ClassError::io(format!("failed to add [{entry_name}] to archive"), e))?;
        debug!(entry = %entry_name, "archive entry written");
    }

    let mut output = zip
        .finish()
        .map_err(|e| ClassError::zip("failed to finish archive", e))?;
    output
        .flush()
        .map_err(|e| ClassError::io("failed to flush archive", e))
}

fn staged_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            ClassError::io(
                format!("could not walk dir [{}]", root.display()),
                io::Error::other(e),
            )
        })?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, entry.path().to_path_buf()));
    }

    files.sort();
    Ok(files)
}

struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

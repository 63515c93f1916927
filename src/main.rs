use anyhow::{Context, Result};
use clap::Parser;
use class_kit::builder::{ArchiveBuilder, BuildSummary};
use class_kit::class_name::ClassName;
use class_kit::cli::{Cli, Commands};
use class_kit::config::{build_locator, init_logging, resolve_staging_root};
use class_kit::finder::locate_archive;
use class_kit::locator::ResourceLocator;
use class_kit::probe::list_classes;
use class_kit::registry::{ClassDef, ClassRegistry};
use class_kit::resolver::{ResolvedMember, resolve_constant, resolve_method};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command.clone() {
        Commands::Resource { name, output } => {
            let locator = build_locator(&cli)?;
            copy_resource(&locator, &name, output.as_deref())?;
        }
        Commands::Locate { class_name } => {
            let locator = build_locator(&cli)?;
            print_json(&locate(&locator, &class_name)?)?;
        }
        Commands::Build { output, classes } => {
            let locator = build_locator(&cli)?;
            let builder = ArchiveBuilder::new(locator).staging_root(resolve_staging_root(&cli));
            print_json(&build(&builder, &output, &classes)?)?;
        }
        Commands::Method {
            class_name,
            method_name,
        } => {
            let method = resolve_method(&ClassRegistry::platform(), &class_name, &method_name)?;
            print_json(&ResolvedMember::Method(method))?;
        }
        Commands::Constant {
            class_name,
            constant_name,
        } => {
            let constant = resolve_constant(&ClassRegistry::platform(), &class_name, &constant_name)?;
            print_json(&ResolvedMember::Constant(constant))?;
        }
        Commands::List { archive, all } => {
            let classes = list_classes(&archive, !all)?;
            print_json(&ListResult {
                archive: archive.to_string_lossy().to_string(),
                classes,
            })?;
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct LocateResult {
    class_name: String,
    archive: Option<String>,
}

#[derive(Debug, Serialize)]
struct BuildResult {
    output: String,
    #[serde(flatten)]
    summary: BuildSummary,
}

#[derive(Debug, Serialize)]
struct ListResult {
    archive: String,
    classes: Vec<ClassName>,
}

fn copy_resource(locator: &ResourceLocator, name: &str, output: Option<&Path>) -> Result<()> {
    let mut handle = locator
        .get_resource(name)?
        .with_context(|| format!("resource not found [{name}]"))?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            std::io::copy(&mut handle, &mut file)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            std::io::copy(&mut handle, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

fn locate(locator: &ResourceLocator, raw_name: &str) -> Result<LocateResult> {
    let class_name = ClassName::parse_lenient(raw_name)?;
    let registry = ClassRegistry::platform();

    let class = match registry.get(class_name.as_str()) {
        Some(class) => class,
        None => {
            let scope = locator.effective_scope();
            if scope.find_resources(&class_name.resource_path())?.is_empty() {
                anyhow::bail!("class not found [{class_name}]");
            }
            Arc::new(ClassDef::new(class_name.clone()).defined_by(scope))
        }
    };

    let archive = locate_archive(&class)?;
    Ok(LocateResult {
        class_name: class_name.to_string(),
        archive: archive.map(|p| p.to_string_lossy().to_string()),
    })
}

fn build(builder: &ArchiveBuilder, output: &Path, classes: &[String]) -> Result<BuildResult> {
    let classes = classes
        .iter()
        .map(|c| ClassName::parse_lenient(c))
        .collect::<class_kit::Result<Vec<_>>>()?;

    let summary = builder
        .build_to_path(output, &classes)
        .with_context(|| format!("Failed to build archive: {}", output.display()))?;

    Ok(BuildResult {
        output: absolute_display(output),
        summary,
    })
}

fn absolute_display(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

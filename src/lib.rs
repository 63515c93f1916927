//! # class-kit
//!
//! Runtime class and resource resolution over an explicit class path, plus
//! ad hoc jar packaging.
//!
//! ## Architecture
//!
//! - **class_name**: Fully-qualified class names and their resource paths
//! - **scope**: Search scopes made of directory and archive entries
//! - **probe**: Archive inspection (entry presence, entry bytes, class lists)
//! - **scan**: Class-path string expansion and archive discovery
//! - **locator**: Two-tier resource lookup (context scope over defining scope)
//! - **finder**: Locating the archive that supplied a class
//! - **builder**: Staging classes and packaging them into a jar
//! - **registry**: Explicit registry of classes and their members
//! - **resolver**: Public static method and constant lookup by name
//! - **error**: Error taxonomy shared by all of the above
//! - **cli** / **config**: Command-line surface and its settings

pub mod builder;
pub mod class_name;
pub mod cli;
pub mod config;
pub mod error;
pub mod finder;
pub mod locator;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod scan;
pub mod scope;

pub use builder::{ArchiveBuilder, BuildSummary, StagedEntry, StagingDirectory};
pub use class_name::ClassName;
pub use error::{ClassError, Result};
pub use finder::locate_archive;
pub use locator::ResourceLocator;
pub use registry::{ClassDef, ClassRegistry, Modifiers, Value};
pub use resolver::{ConstantRef, MethodRef, ResolvedMember, resolve_constant, resolve_method};
pub use scope::{ClassPathEntry, ResourceHandle, ResourceLocation, ResourceScope, SearchScope};

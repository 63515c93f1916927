use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-kit")]
#[command(about = "Locate class archives, read class-path resources, package classes into jars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long = "cp", value_name = "PATH")]
    pub class_path: Option<String>,

    #[arg(long = "context-cp", value_name = "PATH")]
    pub context_class_path: Option<String>,

    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Resource {
        name: String,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    Locate { class_name: String },
    Build {
        output: PathBuf,

        #[arg(value_name = "CLASS")]
        classes: Vec<String>,
    },
    Method {
        class_name: String,
        method_name: String,
    },
    Constant {
        class_name: String,
        constant_name: String,
    },
    List {
        archive: PathBuf,

        #[arg(long)]
        all: bool,
    },
}

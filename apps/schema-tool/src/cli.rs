use std::path::PathBuf;

use clap::{Parser, Subcommand};
use odb_types::Type;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered type conversions
    Conversions {
        /// Only show conversions out of this type
        #[arg(short, long)]
        from: Option<Type>,
    },

    /// Print the fields and secondary keys of a persisted schema
    Inspect {
        /// Schema blob, or version table with --versions
        file: PathBuf,

        /// JSON file with decoding limits
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Read a relation version table instead of a single schema
        #[arg(long)]
        versions: bool,
    },

    /// Compare two persisted schemas structurally
    Diff {
        a: PathBuf,
        b: PathBuf,

        /// JSON file with decoding limits
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

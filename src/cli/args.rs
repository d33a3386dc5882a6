use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dependency graph analysis tool for RPM package repositories.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Location of the manifest file, relative to the root directory
    #[clap(short, long)]
    pub manifest_location: Option<PathBuf>,
    /// Root directory against which relative paths are resolved
    #[clap(short, long)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    ///Computes the transitive closure of a package's runtime and build requirements
    Closure {
        package: String,
        ///Maximum number of expansion rounds
        #[clap(short, long)]
        depth: Option<usize>,
    },
    ///Lists the one-hop requirements of a package
    Requires {
        package: String,
        ///Expand the requirements of the originating source package instead
        #[clap(short, long)]
        build: bool,
    },
    ///Lists all binary packages built from the same source package
    Subpackages { package: String },
    ///Builds the dependency graph for the whole package index
    Graph {
        ///Write the graph to a file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    ///Prints source group and package counts for the loaded snapshot
    Stats,
}

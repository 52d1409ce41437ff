use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pbx",
    about = "Inspect and rewrite project.pbxproj object graphs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with `[decode]` and `[output]` tables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode, re-encode and decode again; report equality and byte stability
    Check(PathArgs),
    /// Print the object graph
    Dump(PathArgs),
    /// Regenerate every identifier and write the result
    Regen(RegenArgs),
    /// Show the differences between two project files
    Diff(DiffArgs),
    /// Count objects by kind
    Stats(PathArgs),
}

#[derive(Args)]
pub struct PathArgs {
    /// A project.pbxproj file or .xcodeproj bundle
    pub path: PathBuf,
}

#[derive(Args)]
pub struct RegenArgs {
    pub path: PathBuf,
    /// Destination; defaults to rewriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Replace the destination if it exists
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    /// Line diff of the encoded files instead of an object diff
    #[arg(long)]
    pub text: bool,
}

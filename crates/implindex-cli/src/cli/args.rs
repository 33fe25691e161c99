use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "implindex",
    version,
    about = "Inspect, check and render rustdoc implementor index files"
)]
pub struct Cli {
    /// Tolerate files without the hook/pending dispatch trailer
    #[arg(long, global = true, env = "IMPLINDEX_LENIENT")]
    pub lenient: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the index embedded in one implementor file
    Show(ShowArgs),
    /// Summarize every implementor file in a docs tree
    List(ListArgs),
    /// Verify files parse and re-render byte for byte
    Check(CheckArgs),
    /// Write an implementor file from a JSON index
    Render(RenderArgs),
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShowFormat {
    #[default]
    Text,
    Json,
    Js,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Implementor file (`implementors/**/trait.*.js`)
    pub file: PathBuf,

    #[arg(short, long, value_enum, default_value_t)]
    pub format: ShowFormat,

    /// Render fragments as plain text instead of HTML
    #[arg(long)]
    pub plain: bool,

    /// Hide packages without implementors
    #[arg(long)]
    pub non_empty: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Docs output directory, or its `implementors/` directory
    #[arg(default_value = "target/doc")]
    pub root: PathBuf,

    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Include traits with no implementors
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Implementor files or docs directories
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// JSON object mapping package name to a list of HTML fragments
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

//! CLI argument parsing for the sketch converter.
//!
//! Flags only carry plain data; all conversion logic lives in the library.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "ino2ubi",
    version,
    about = "Convert Arduino sketches into FLProg user blocks (.ubi)",
    after_help = "Role markers (trailing comments on global declarations):\n  // in    input pin\n  // out   output pin\n  // par   block parameter (also on #define lines)\n\nExamples:\n  ino2ubi inspect --input blink.ino\n  ino2ubi edits-template --input blink.ino > blink.edits.json\n  ino2ubi convert --input blink.ino --edits blink.edits.json --enable-input",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log debug detail to stderr (INO2UBI_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Convert(ConvertArgs),
    Inspect(InspectArgs),
    EditsTemplate(EditsTemplateArgs),
}

/// Convert command inputs.
#[derive(Parser, Debug)]
#[command(about = "Convert a sketch into a .ubi block file")]
pub struct ConvertArgs {
    /// Sketch source file
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Destination file; `.ubi` is appended when missing
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Block name (defaults to the input file stem)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Block description (defaults to the sketch's leading comment)
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    /// Add a boolean `En` input that gates the loop body
    #[arg(long)]
    pub enable_input: bool,

    /// JSON edits file with role, alias and default overrides
    #[arg(long, value_name = "PATH")]
    pub edits: Option<PathBuf>,

    /// Write UTF-8 instead of UTF-16 with BOM
    #[arg(long)]
    pub utf8: bool,
}

/// Inspect command inputs.
#[derive(Parser, Debug)]
#[command(about = "Show what would be extracted from a sketch")]
pub struct InspectArgs {
    /// Sketch source file
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Emit the full fact set as JSON
    #[arg(long)]
    pub json: bool,
}

/// Edits-template command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print an edits file pre-filled from a sketch")]
pub struct EditsTemplateArgs {
    /// Sketch source file
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
}

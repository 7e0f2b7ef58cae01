//! Convert Arduino sketches into FLProg user-block documents.
//!
//! [`sketch::extract`] reads facts out of sketch text, [`edits`] applies user
//! overrides, and [`sixx::render`] projects the result into a `.ubi` document.

pub mod cli;
pub mod commands;
pub mod edits;
pub mod output;
pub mod sixx;
pub mod sketch;

use anyhow::Result;

/// Run a parsed command line.
pub fn run(args: &cli::RootArgs) -> Result<()> {
    commands::dispatch(args)
}

//! Subcommand implementations.
//!
//! These are the only functions that touch the filesystem; the extractor and
//! emitter are called with plain text.
use crate::cli::{Command, ConvertArgs, EditsTemplateArgs, InspectArgs, RootArgs};
use crate::edits::{resolve_block_name, resolve_description, BlockEdits};
use crate::output::{default_output_path, encode_document, with_block_extension, write_atomic, Encoding};
use crate::sixx::{self, RenderRequest};
use crate::sketch::{self, FactSet, Placement};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Run the selected subcommand.
pub fn dispatch(args: &RootArgs) -> Result<()> {
    match &args.command {
        Command::Convert(convert_args) => {
            let written = convert(convert_args).context("error during save")?;
            println!("{}", written.display());
            Ok(())
        }
        Command::Inspect(inspect_args) => inspect(inspect_args),
        Command::EditsTemplate(template_args) => edits_template(template_args),
    }
}

/// Extract, apply edits, render and write; returns the written path.
pub fn convert(args: &ConvertArgs) -> Result<PathBuf> {
    let code = read_sketch(&args.input)?;
    let mut facts = sketch::extract(&code);
    let edits = match &args.edits {
        Some(path) => BlockEdits::load(path)?,
        None => BlockEdits::default(),
    };
    edits.apply(&mut facts)?;

    let block_name = resolve_block_name(args.name.as_deref(), &edits, &args.input);
    let block_description = resolve_description(args.description.as_deref(), &edits, &facts);
    let request = RenderRequest {
        block_name: &block_name,
        block_description: &block_description,
        facts: &facts,
        enable_input: args.enable_input || edits.enable_input.unwrap_or(false),
    };
    let document = sixx::render_document(&request)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let output = with_block_extension(&output);
    let encoding = if args.utf8 {
        Encoding::Utf8
    } else {
        Encoding::Utf16Le
    };
    write_atomic(&output, &encode_document(&document, encoding))?;
    Ok(output)
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let facts = sketch::extract(&read_sketch(&args.input)?);
    if args.json {
        let text = serde_json::to_string_pretty(&facts).context("serialize fact set")?;
        println!("{text}");
    } else {
        print!("{}", format_summary(&facts));
    }
    Ok(())
}

fn edits_template(args: &EditsTemplateArgs) -> Result<()> {
    let facts = sketch::extract(&read_sketch(&args.input)?);
    let mut template = BlockEdits::template(&facts);
    template.name = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    let text = serde_json::to_string_pretty(&template).context("serialize edits template")?;
    println!("{text}");
    Ok(())
}

fn read_sketch(path: &Path) -> Result<String> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read sketch {}", path.display()))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Human-readable overview of extracted facts.
pub fn format_summary(facts: &FactSet) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "variables: {}  functions: {}  includes: {}  defines: {}  opaque: {}\n",
        facts.variables.len(),
        facts.functions.len(),
        facts.includes.len(),
        facts.defines.len(),
        facts.opaque_declarations.len()
    ));
    if let Some(comment) = facts.leading_comment.as_deref() {
        let first_line = comment.lines().next().unwrap_or_default();
        out.push_str(&format!("description: {first_line}\n"));
    }

    let mut variables: Vec<_> = facts.variables.values().collect();
    variables.sort_by_key(|variable| variable.position);
    if !variables.is_empty() {
        out.push_str("\nVARIABLES\n");
        let width = variables.iter().map(|v| v.name.len()).max().unwrap_or(0);
        for variable in variables {
            out.push_str(&format!(
                "  {:width$}  {:<13}  {:<9}",
                variable.name,
                variable.ty.as_str(),
                variable.role.as_str()
            ));
            if variable.is_renamed() {
                out.push_str(&format!("  as {}", variable.alias));
            }
            if let Some(default) = variable.default.as_deref() {
                out.push_str(&format!("  = {default}"));
            }
            out.push('\n');
        }
    }

    if !facts.defines.is_empty() {
        out.push_str("\nDEFINES\n");
        for define in &facts.defines {
            let role = match define.role {
                sketch::DefineRole::Global => "global",
                sketch::DefineRole::Parameter => "parameter",
            };
            out.push_str(&format!(
                "  {} {}  ({}, {})\n",
                define.name, define.value, define.ty, role
            ));
        }
    }

    if !facts.includes.is_empty() || !facts.opaque_declarations.is_empty() {
        out.push_str("\nDECLARATIONS\n");
        for line in facts.includes.iter().chain(&facts.opaque_declarations) {
            out.push_str(&format!("  {line}\n"));
        }
    }

    if !facts.functions.is_empty() {
        out.push_str("\nFUNCTIONS\n");
        for function in &facts.functions {
            let placement = match function.placement {
                Placement::BeforeEntryPoints => "before setup/loop",
                Placement::AfterEntryPoints => "after setup/loop",
            };
            out.push_str(&format!(
                "  {} {}({})  [{}]\n",
                function.return_type, function.name, function.raw_params, placement
            ));
        }
    }

    out.push_str(&format!(
        "\nsetup: {} lines  loop: {} lines\n",
        line_count(&facts.setup_body),
        line_count(&facts.loop_body)
    ));
    out
}

fn line_count(body: &str) -> usize {
    body.lines().count()
}

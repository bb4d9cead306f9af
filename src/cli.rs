//! CLI: schema documents → (python | decls)
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use crate::codegen::{Codegen, CodegenOptions, EnumStyle};
use crate::load;
use crate::module::{Module, assemble};
use crate::schema::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate typed declarations (Python TypedDicts) from JSON Schema documents
#[derive(Parser, Debug)]
#[command(name = "json-typedecl", version)]
pub struct CommandLineInterface {
    /// increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit Python source (TypedDict records, Literal or Enum enumerations)
    Python(PythonOut),
    /// print the resolved declarations as JSON
    Decls(DeclsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer selecting the schema root inside each document (e.g. /components/schemas)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct PythonOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// how enumerations are spelled
    #[arg(long, value_enum, default_value_t = EnumStyle::Literal)]
    enum_style: EnumStyle,

    /// output .py file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct DeclsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every top-level schema of every input, in input order.
    fn load_schemas(&self) -> anyhow::Result<Vec<Schema>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut schemas = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read {}", source_path.display()))?;
            let loaded = load::load_str(&source, self.json_pointer.as_deref())
                .with_context(|| format!("failed to load schema document {}", source_path.display()))?;
            debug!(path = %source_path.display(), schemas = loaded.len(), "loaded input");
            schemas.extend(loaded);
        }
        Ok(schemas)
    }

    fn assemble(&self) -> anyhow::Result<Module> {
        let schemas = self.load_schemas()?;
        assemble(&schemas).context("failed to build declarations")
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Python(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let module = target.input_settings.assemble()?;
                let mut cg = Codegen::new(CodegenOptions { enum_style: target.enum_style });
                cg.emit(&module).context("failed to emit Python source")?;
                write_output(target.out.as_deref(), &cg.into_string())
            }
            Command::Decls(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let module = target.input_settings.assemble()?;
                let decls_src = serde_json::to_string_pretty(&module)
                    .context("failed to serialize declarations")?;
                write_output(target.out.as_deref(), &format!("{decls_src}\n"))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Only called once the whole pipeline succeeded, so a failed run never
/// leaves a partial file behind.
fn write_output(out: Option<&Path>, src: &str) -> anyhow::Result<()> {
    let Some(out) = out else {
        print!("{src}");
        return Ok(());
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), bytes = src.len(), "wrote output");
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let matched = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                bail!("glob pattern matched no files: {pattern}");
            }
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

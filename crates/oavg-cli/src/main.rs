use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::info;

use oavg_core::config::{self, CONFIG_FILE_NAME, OavgConfig};
use oavg_core::ir::{IrSchema, IrSpec};
use oavg_core::parse::{self, spec::OpenApiSpec};
use oavg_core::transform::{self, TransformOptions};
use oavg_core::union::{Flavor, build_response_map};
use oavg_core::{CodeGenerator, GeneratedFile};
use oavg_zod::{ZodGenerator, ZodOptions};

#[derive(Parser)]
#[command(
    name = "oavg",
    about = "Generate runtime-validated TypeScript from OpenAPI 3.x",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate schemas, operations and the support module
    Generate {
        /// Path to the OpenAPI spec file (YAML or JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate an OpenAPI spec
    Validate {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Inspect the resolved IR of an OpenAPI spec
    Inspect {
        /// Path to the OpenAPI spec file
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new oavg configuration
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { input, output } => cmd_generate(input, output),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Inspect { input, format } => cmd_inspect(input, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oavg", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load `.oavg.yaml` from the current directory, falling back to defaults.
fn load_project_config() -> Result<OavgConfig> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    let cfg = config::load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    Ok(cfg.unwrap_or_default())
}

fn read_spec(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse::from_json(&content),
        _ => parse::from_yaml(&content),
    }
    .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

fn load_ir(path: &Path, cfg: &OavgConfig) -> Result<IrSpec> {
    let parsed = read_spec(path)?;
    resolve(&parsed, path, cfg)
}

/// Run the transform under the project's naming settings.
fn resolve(parsed: &OpenApiSpec, path: &Path, cfg: &OavgConfig) -> Result<IrSpec> {
    let ir = transform::transform_with_options(parsed, &TransformOptions::from(cfg))
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    for (old, new) in &ir.renames {
        info!("renamed schema `{old}` to `{new}`");
    }
    Ok(ir)
}

/// Write generated files to disk under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

fn cmd_generate(input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let cfg = load_project_config()?;
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let output_dir = output.unwrap_or_else(|| PathBuf::from(&cfg.output));
    let ir = load_ir(&input, &cfg)?;

    eprintln!("Generating {} → {}", input.display(), output_dir.display());
    let files = ZodGenerator
        .generate(&ir, &ZodOptions::from(&cfg))
        .context("failed to emit TypeScript")?;

    fs::create_dir_all(&output_dir).with_context(|| {
        format!("failed to create output directory {}", output_dir.display())
    })?;
    write_files(&output_dir, &files)?;

    eprintln!("Generated {} files in {}", files.len(), output_dir.display());
    Ok(())
}

fn cmd_validate(input: PathBuf) -> Result<()> {
    let cfg = load_project_config()?;
    let parsed = read_spec(&input)?;

    eprintln!("Valid OpenAPI {} spec: {}", parsed.openapi, parsed.info.title);
    eprintln!("  Version: {}", parsed.info.version);
    eprintln!("  Paths: {}", parsed.paths.len());

    if let Some(ref components) = parsed.components {
        eprintln!("  Schemas: {}", components.schemas.len());
    }

    // Resolution catches dangling refs and name problems the parser cannot.
    let ir = resolve(&parsed, &input, &cfg)?;
    eprintln!("  Operations: {}", ir.operations.len());
    eprintln!("  IR Schemas: {}", ir.schemas.len());
    if !ir.renames.is_empty() {
        eprintln!("  Renamed schemas: {}", ir.renames.len());
    }
    if !ir.recursive.is_empty() {
        eprintln!("  Recursive schemas: {}", ir.recursive.len());
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: PathBuf, format: InspectFormat) -> Result<()> {
    let cfg = load_project_config()?;
    let ir = load_ir(&input, &cfg)?;

    let summary = build_inspect_summary(&ir);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{yaml}");
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{json}");
        }
    }

    Ok(())
}

fn build_inspect_summary(ir: &IrSpec) -> serde_json::Value {
    let schemas: Vec<serde_json::Value> = ir
        .schemas
        .iter()
        .map(|s| {
            let name = s.name().pascal_case.as_str();
            serde_json::json!({
                "name": name,
                "kind": match s {
                    IrSchema::Object(_) => "object",
                    IrSchema::Enum(_) => "enum",
                    IrSchema::Alias(_) => "alias",
                    IrSchema::Union(_) => "union",
                },
                "recursive": ir.is_recursive(name),
            })
        })
        .collect();

    let operations: Vec<serde_json::Value> = ir
        .operations
        .iter()
        .map(|op| {
            let model = build_response_map(op, Flavor::Loose);
            serde_json::json!({
                "name": op.names.camel,
                "method": op.method.as_str(),
                "path": op.path,
                "statuses": op.responses.statuses().map(|s| s.to_string()).collect::<Vec<_>>(),
                "union": model.union.to_string(),
                "tags": op.tags,
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": ir.info.title,
            "version": ir.info.version,
        },
        "renames": ir.renames,
        "schemas": schemas,
        "operations": operations,
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}

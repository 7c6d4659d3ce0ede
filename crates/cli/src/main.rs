use std::path::Path;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use pathchain_core::model::{BezierRef, PathChainFile, PoseRef};
use pathchain_core::{build_index, validate, ResolvedIndex};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Path-definition extraction toolchain.
#[derive(Parser)]
#[command(name = "pathchain", version, about = "Path-definition extraction toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a path-definition document from a Java source file
    Extract {
        /// Path to the .java source file
        file: std::path::PathBuf,
    },

    /// Extract (or re-load) a document and validate every reference in it
    Check {
        /// Path to a .java source file or a .json document
        file: std::path::PathBuf,
    },

    /// Resolve a named pose, bezier, or path chain to concrete geometry
    Resolve {
        /// Path to a .java source file or a .json document
        file: std::path::PathBuf,
        /// Named pose to resolve to a point
        #[arg(long)]
        pose: Option<String>,
        /// Named bezier to resolve to a point sequence
        #[arg(long)]
        bezier: Option<String>,
        /// Named path chain to resolve to point sequences plus heading
        #[arg(long)]
        chain: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { file } => cmd_extract(&file, cli.output, cli.quiet),
        Commands::Check { file } => cmd_check(&file, cli.output, cli.quiet),
        Commands::Resolve {
            file,
            pose,
            bezier,
            chain,
        } => cmd_resolve(
            &file,
            pose.as_deref(),
            bezier.as_deref(),
            chain.as_deref(),
            cli.output,
            cli.quiet,
        ),
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", msg);
            }
        }
    }
}

/// Load a document from either a Java source file (extraction) or a JSON
/// document file (structural re-validation of an untrusted payload).
fn load_document(path: &Path, output: OutputFormat, quiet: bool) -> PathChainFile {
    if path.extension().is_some_and(|e| e == "json") {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                report_error(
                    &format!("error reading file '{}': {}", path.display(), e),
                    output,
                    quiet,
                );
                process::exit(1);
            }
        };
        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                report_error(
                    &format!("error parsing JSON in '{}': {}", path.display(), e),
                    output,
                    quiet,
                );
                process::exit(1);
            }
        };
        match pathchain_interchange::from_document(&value) {
            Ok(doc) => doc,
            Err(e) => {
                report_error(&e.to_string(), output, quiet);
                process::exit(1);
            }
        }
    } else {
        match pathchain_core::extract_file(path) {
            Ok(doc) => doc,
            Err(e) => {
                match output {
                    OutputFormat::Json => eprintln!("{}", e.to_json_value()),
                    OutputFormat::Text => {
                        if !quiet {
                            eprintln!("{}", e);
                        }
                    }
                }
                process::exit(1);
            }
        }
    }
}

/// Validate, printing every violation; exits nonzero on a rejected
/// document.
fn validated_index(doc: &PathChainFile, output: OutputFormat, quiet: bool) -> ResolvedIndex {
    let index = build_index(doc);
    if let Err(violations) = validate(&index) {
        match output {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({ "violations": violations.messages() })
                );
            }
            OutputFormat::Text => {
                if !quiet {
                    for message in violations.messages() {
                        eprintln!("{}", message);
                    }
                }
            }
        }
        process::exit(1);
    }
    index
}

fn print_pretty(value: &serde_json::Value) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

fn cmd_extract(file: &Path, output: OutputFormat, quiet: bool) {
    let doc = load_document(file, output, quiet);
    match serde_json::to_value(&doc) {
        Ok(v) => print_pretty(&v),
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_check(file: &Path, output: OutputFormat, quiet: bool) {
    let doc = load_document(file, output, quiet);
    let _ = validated_index(&doc, output, quiet);
    match output {
        OutputFormat::Json => {
            print_pretty(&serde_json::json!({ "ok": true, "violations": [] }));
        }
        OutputFormat::Text => {
            if !quiet {
                println!("ok");
            }
        }
    }
}

fn cmd_resolve(
    file: &Path,
    pose: Option<&str>,
    bezier: Option<&str>,
    chain: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let selectors = [pose.is_some(), bezier.is_some(), chain.is_some()]
        .iter()
        .filter(|s| **s)
        .count();
    if selectors != 1 {
        report_error(
            "exactly one of --pose, --bezier, or --chain is required",
            output,
            quiet,
        );
        process::exit(2);
    }

    let doc = load_document(file, output, quiet);
    let index = validated_index(&doc, output, quiet);

    let result = if let Some(name) = pose {
        pathchain_core::resolve_pose(&index, &PoseRef::Name(name.to_owned()))
            .map(|p| serde_json::json!({ "pose": name, "point": p }))
    } else if let Some(name) = bezier {
        pathchain_core::resolve_bezier(&index, &BezierRef::Name(name.to_owned()))
            .map(|points| serde_json::json!({ "bezier": name, "points": points }))
    } else {
        let name = chain.unwrap_or_default();
        pathchain_core::resolve_chain(&index, name).map(|(paths, heading)| {
            serde_json::json!({ "chain": name, "paths": paths, "heading": heading })
        })
    };

    match result {
        Ok(value) => print_pretty(&value),
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

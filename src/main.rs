//! krkrtools - TJS script checker
//!
//! # Usage
//!
//! ```bash
//! # Report diagnostics from the preprocessor and the parser
//! krkrtools check startup.tjs
//!
//! # Show the source after @if/@set processing
//! krkrtools preprocess -D DEBUG=1 startup.tjs -o out.tjs
//!
//! # Dump the token stream
//! krkrtools tokens startup.tjs
//!
//! # Ranges disabled by @if, as the editor notification payload
//! krkrtools inactive-regions startup.tjs
//!
//! # What is under the cursor (zero-based line and character)
//! krkrtools query startup.tjs 12 4
//! ```

mod config;
mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use diagnostics::ErrorFormatter;
use log::{info, warn};
use parser::{parse_document, AstWalker, DocumentAnalysis, Position, INACTIVE_REGIONS_METHOD};
use source_map::SourceMap;
use std::path::{Path, PathBuf};
use std::process;

use config::{load_config, parse_define, ProjectConfig};

#[derive(Parser)]
#[command(name = "krkrtools")]
#[command(version = "0.1.0")]
#[command(about = "krkrtools - preprocessor, lexer and parser checks for TJS scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project file with a [defines] table (defaults to ./krkrtools.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Define a macro value, NAME=VALUE or NAME for 1 (repeatable)
    #[arg(short = 'D', long = "define", global = true, value_name = "NAME=VALUE")]
    defines: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a file and print its diagnostics
    Check {
        /// Path to the TJS source file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the preprocessed source
    Preprocess {
        /// Path to the TJS source file
        file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the token stream with kinds and ranges
    Tokens {
        /// Path to the TJS source file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the inactive-region notification for a file
    InactiveRegions {
        /// Path to the TJS source file
        file: PathBuf,
    },

    /// Show the token at a position and the nodes enclosing it
    Query {
        /// Path to the TJS source file
        file: PathBuf,

        /// Zero-based line
        line: usize,

        /// Zero-based character
        character: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Pretty,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        logging::init_with_level(log::LevelFilter::Debug);
    } else if std::env::var_os("RUST_LOG").is_some() {
        logging::init_from_env();
    } else {
        logging::init();
    }

    let result = project_config(cli.config.as_deref(), &cli.defines).and_then(|config| {
        match cli.command {
            Commands::Check { file, format } => check_file(&file, &config, format),
            Commands::Preprocess { file, output } => preprocess_file(&file, &config, output),
            Commands::Tokens { file, format } => dump_tokens(&file, &config, format),
            Commands::InactiveRegions { file } => inactive_regions(&file, &config),
            Commands::Query {
                file,
                line,
                character,
            } => query_position(&file, &config, Position::new(line, character)),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn project_config(path: Option<&Path>, flags: &[String]) -> Result<ProjectConfig, String> {
    let overrides = flags
        .iter()
        .map(|flag| parse_define(flag))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(load_config(path)?.with_overrides(&overrides))
}

fn read_source(file: &Path) -> Result<String, String> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()));
    }
    std::fs::read_to_string(file).map_err(|e| format!("Failed to read file: {}", e))
}

fn analyse(file: &Path, config: &ProjectConfig) -> Result<(String, DocumentAnalysis), String> {
    let source = read_source(file)?;
    let name = file.display().to_string();
    let analysis = parse_document(&name, &source, &config.defines);
    Ok((source, analysis))
}

fn check_file(file: &Path, config: &ProjectConfig, format: OutputFormat) -> Result<(), String> {
    info!("checking {}", file.display());
    let (source, analysis) = analyse(file, config)?;
    let diagnostics = analysis.diagnostics();

    match format {
        OutputFormat::Text | OutputFormat::Pretty => {
            let mut source_map = SourceMap::new();
            let file_id = source_map.add_file(file.display().to_string(), source);
            let source_file = source_map
                .get_file(file_id)
                .ok_or_else(|| format!("Failed to register {}", file.display()))?;
            let formatter = match format {
                OutputFormat::Pretty => ErrorFormatter::with_colors(),
                _ => ErrorFormatter::new(),
            };
            if diagnostics.is_empty() {
                println!("✓ {}: no problems", file.display());
            } else {
                print!("{}", formatter.format_diagnostics(&diagnostics, source_file));
                println!(
                    "{}: {} error(s), {} warning(s)",
                    file.display(),
                    diagnostics.errors().count(),
                    diagnostics.warnings().count()
                );
            }
        }
        OutputFormat::Json => {
            let all: Vec<_> = diagnostics.iter().collect();
            let json = serde_json::to_string_pretty(&all)
                .map_err(|e| format!("Failed to serialize diagnostics: {}", e))?;
            println!("{}", json);
        }
    }

    if diagnostics.has_errors() {
        return Err(format!(
            "{} has {} error(s)",
            file.display(),
            diagnostics.errors().count()
        ));
    }
    Ok(())
}

fn preprocess_file(file: &Path, config: &ProjectConfig, output: Option<PathBuf>) -> Result<(), String> {
    let source = read_source(file)?;
    let pp_config = parser::PreprocessorConfig {
        defines: config.defines.clone(),
    };
    let result = parser::preprocess(&file.display().to_string(), &source, &pp_config);

    for diagnostic in &result.diagnostics {
        warn!("{}: {}: {}", file.display(), diagnostic.range, diagnostic.message);
    }
    for (name, value) in result.defines.iter() {
        info!("define {} = {}", name, value);
    }
    for range in &result.disabled_ranges {
        info!("inactive {}", range);
    }

    match output {
        Some(path) => std::fs::write(&path, &result.chunk)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e)),
        None => {
            print!("{}", result.chunk);
            Ok(())
        }
    }
}

fn dump_tokens(file: &Path, config: &ProjectConfig, format: OutputFormat) -> Result<(), String> {
    let (_, analysis) = analyse(file, config)?;
    let tokens = &analysis.parse.tokens;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(tokens)
                .map_err(|e| format!("Failed to serialize tokens: {}", e))?;
            println!("{}", json);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            for (index, token) in tokens.iter().enumerate() {
                print!("{:5} {:<16} {:<12} {:?}", index, format!("{:?}", token.kind), token.range.to_string(), token.text);
                match &token.diagnostic {
                    Some(cause) => println!("  ! {}", cause),
                    None => println!(),
                }
            }
        }
    }
    Ok(())
}

fn inactive_regions(file: &Path, config: &ProjectConfig) -> Result<(), String> {
    let (_, analysis) = analyse(file, config)?;
    let uri = std::fs::canonicalize(file)
        .map(|path| format!("file://{}", path.display()))
        .unwrap_or_else(|_| file.display().to_string());
    let notification = serde_json::json!({
        "method": INACTIVE_REGIONS_METHOD,
        "params": analysis.inactive_regions(&uri),
    });
    let json = serde_json::to_string_pretty(&notification)
        .map_err(|e| format!("Failed to serialize notification: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn query_position(file: &Path, config: &ProjectConfig, pos: Position) -> Result<(), String> {
    let (_, analysis) = analyse(file, config)?;
    let name = file.display().to_string();
    if AstWalker::is_inactive(&analysis.preprocessed.disabled_ranges, pos) {
        println!("{} is inside an inactive region", pos);
        return Ok(());
    }

    let mut walker = AstWalker::new();
    walker.update_entry(name.clone(), analysis.parse);
    let Some((index, token)) = walker.query_token(&name, pos) else {
        println!("no token at {}", pos);
        return Ok(());
    };
    println!("token #{} {:?} {:?} at {}", index, token.kind, token.text, token.range);

    let entry = walker
        .entry(&name)
        .ok_or_else(|| format!("{} was not indexed", name))?;
    for (depth, id) in walker.walk_ast(&name, index).into_iter().enumerate() {
        let node = entry.ast.node(id);
        let state = if node.completed { "" } else { " (incomplete)" };
        println!("{}{} {}{}", "  ".repeat(depth), node.kind.name(), node.range, state);
    }
    Ok(())
}

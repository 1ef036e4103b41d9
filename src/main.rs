//! masked-config CLI
//!
//! Entry point for the `masked-config` command-line tool. Runs one
//! transform per invocation, typically from a build script or task runner.

use clap::Parser;
use masked_config::config::parse_json_or_toml;
use masked_config::options::DEFAULT_OPTIONS_FILE;
use masked_config::{ExportFormat, MaskedConfig, Options, OptionsFile};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "masked-config")]
#[command(about = "Load, mask and extend a config directory into a JS module", version)]
struct Cli {
    /// Options file (default: masked-config.toml in the working directory, if present)
    #[arg(long, short = 'o')]
    options: Option<PathBuf>,

    /// Change to this directory before doing anything
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Config directory to load
    #[arg(long, short = 's')]
    source: Option<PathBuf>,

    /// Deployment to load (overrides NODE_ENV for this run)
    #[arg(long, short = 'e')]
    env: Option<String>,

    /// Mask as inline JSON, or @path to a JSON/TOML file
    #[arg(long)]
    mask: Option<String>,

    /// Extend values as inline JSON, or @path to a JSON/TOML file
    #[arg(long)]
    extend: Option<String>,

    /// Output file
    #[arg(long, short = 't')]
    target: Option<PathBuf>,

    /// Export statement format: es6 or commonjs
    #[arg(long)]
    export_format: Option<String>,

    /// Trace every transform step
    #[arg(long)]
    debug: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(if cli.debug { cli.verbose.max(2) } else { cli.verbose });

    if let Some(dir) = &cli.cwd {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!("Error changing to {}: {}", dir.display(), e);
            process::exit(1);
        }
    }

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error determining working directory: {}", e);
            process::exit(1);
        }
    };

    let options = match build_options(&cli, &cwd) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Pipeline failures are reported through the log sink.
    match MaskedConfig::new(options).run(&cwd) {
        Ok(target) => info!("wrote {}", target.display()),
        Err(_) => process::exit(1),
    }
}

fn build_options(cli: &Cli, cwd: &Path) -> Result<Options, String> {
    let file = match &cli.options {
        Some(path) => OptionsFile::from_file(&cwd.join(path)).map_err(|e| e.to_string())?,
        None => {
            let default = cwd.join(DEFAULT_OPTIONS_FILE);
            if default.is_file() {
                OptionsFile::from_file(&default).map_err(|e| e.to_string())?
            } else {
                OptionsFile::default()
            }
        }
    };

    let mut options = file.into_options().map_err(|e| e.to_string())?;

    if cli.debug {
        options = options.with_debug(true);
    }
    if let Some(source) = &cli.source {
        options = options.with_source(source);
    }
    if let Some(env) = &cli.env {
        options = options.with_env(env);
    }
    if let Some(mask) = &cli.mask {
        options = options.with_mask(read_value(mask, cwd)?);
    }
    if let Some(extend) = &cli.extend {
        options = options.with_extend(read_value(extend, cwd)?);
    }
    if let Some(target) = &cli.target {
        options = options.with_target(target);
    }
    if let Some(format) = &cli.export_format {
        let format = format
            .parse::<ExportFormat>()
            .map_err(|e| e.to_string())?;
        options = options.with_export_format(format);
    }

    Ok(options)
}

/// Parse an inline JSON value, or the contents of `@path`.
fn read_value(arg: &str, cwd: &Path) -> Result<Value, String> {
    let text = match arg.strip_prefix('@') {
        Some(path) => {
            let path = cwd.join(path);
            fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
        }
        None => arg.to_string(),
    };
    parse_json_or_toml(&text).map_err(|e| format!("Invalid value '{}': {}", arg, e))
}

/// Initialize the tracing subscriber on stderr.
///
/// - 0 (default): warnings and errors, unless RUST_LOG says otherwise
/// - 1 (-v): info
/// - 2+ (-vv or --debug): debug
fn init_tracing(verbose: u8) {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .without_time(),
        )
        .with(filter)
        .try_init();
}

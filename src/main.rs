use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::debug;

use jpq::format::Format;
use jpq::output::pretty::{self, Style};
use jpq::path::Compiled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Parser)]
#[command(
    name = "jpq",
    version,
    about = "Query and rewrite JSON/YAML documents with path expressions"
)]
struct Cli {
    /// Path expression, e.g. '$.store.book[?(@.price < 10)].title'
    path: String,

    /// Input file (reads from stdin if omitted)
    file: Option<PathBuf>,

    /// Replace every match with this JSON literal and print the document
    #[arg(long, value_name = "JSON")]
    set: Option<String>,

    /// Write the replaced document back to the input file
    #[arg(short, long = "in-place", requires = "set")]
    in_place: bool,

    /// Force input format [json, yaml]
    #[arg(short = 'p', long = "input-format")]
    input_format: Option<String>,

    /// Output format [json, yaml] (default: same as input)
    #[arg(short, long = "output-format")]
    output_format: Option<String>,

    /// Compact output (no pretty printing)
    #[arg(short, long)]
    compact: bool,

    /// Raw string output (no quotes for string values)
    #[arg(short, long)]
    raw: bool,

    /// Colorize JSON output
    #[arg(long, value_enum, value_name = "MODE", default_value = "auto")]
    color: ColorMode,

    /// Disable colorized output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.in_place && cli.file.is_none() {
        anyhow::bail!("--in-place requires a file argument");
    }

    let plan = Compiled::compile(&cli.path).with_context(|| format!("compiling {}", cli.path))?;

    let input = match &cli.file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let in_fmt = match (&cli.input_format, &cli.file) {
        (Some(name), _) => Format::from_str_name(name)?,
        (None, Some(path)) => Format::from_extension(path)?,
        (None, None) => Format::sniff(&input),
    };
    let out_fmt = match &cli.output_format {
        Some(name) => Format::from_str_name(name)?,
        None => in_fmt,
    };
    let style = Style {
        compact: cli.compact,
        raw: cli.raw,
        color: should_colorize(&cli),
    };
    debug!(input = %in_fmt, output = %out_fmt, "formats resolved");

    let mut document = in_fmt.decode(&input)?;

    let Some(literal) = &cli.set else {
        let result = plan.lookup(&document)?;
        print!("{}", pretty::format_value(&result, out_fmt, style)?);
        return Ok(());
    };

    let literal: Value = serde_json::from_str(literal)
        .with_context(|| format!("--set value is not JSON: {literal}"))?;
    plan.replace(&mut document, &literal)?;
    match &cli.file {
        Some(path) if cli.in_place => {
            let plain = Style {
                color: false,
                ..style
            };
            write_in_place(path, &pretty::format_value(&document, out_fmt, plain)?)?
        }
        _ => print!("{}", pretty::format_value(&document, out_fmt, style)?),
    }
    Ok(())
}

/// `--no-color` and `NO_COLOR` win over `--color`; `auto` colours a terminal only.
fn should_colorize(cli: &Cli) -> bool {
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    match cli.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Replace `path` atomically through a sibling temporary file.
fn write_in_place(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent).context("creating temporary file")?;
    tmp.write_all(contents.as_bytes())
        .context("writing temporary file")?;
    tmp.persist(path)
        .context("replacing file with updated content")?;
    debug!(file = %path.display(), "wrote document in place");
    Ok(())
}

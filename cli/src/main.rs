mod discover;
mod render;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, info};

use assembler::{BuildConfig, SourceFile};
use quizdoc::DocPath;

use render::Renderer;

#[derive(Parser)]
#[command(name = "quizdoc", version, about = "Assemble and validate a tutorial content corpus")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// More log output (repeat for debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the navigation tree and validate the corpus
    Build(BuildArgs),

    /// Validate the corpus without writing the navigation tree
    Check(CheckArgs),

    /// Parse one document and dump what was extracted
    Inspect(InspectArgs),
}

#[derive(clap::Args)]
struct PipelineArgs {
    /// Content root directory
    root: PathBuf,

    /// Configuration file (defaults to <root>/quizdoc.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parser threads (0 = one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Exit with status 2 when only warnings were reported
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct BuildArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Write the navigation tree here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(clap::Args)]
struct CheckArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// Markdown document to parse
    file: PathBuf,

    /// Quiz fence language / div class
    #[arg(long)]
    quiz_language: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet, cli.no_color);

    let result = match &cli.command {
        Command::Build(args) => do_build(args, cli.no_color),
        Command::Check(args) => do_check(args, cli.no_color),
        Command::Inspect(args) => do_inspect(args, cli.no_color),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool, no_color: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, _) => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

/// Resolve configuration and read every content file under the root.
fn load(args: &PipelineArgs) -> Result<(BuildConfig, Vec<SourceFile>)> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::from_file(path),
        None => BuildConfig::discover(&args.root),
    }
    .context("cannot load configuration")?;
    if let Some(jobs) = args.jobs {
        config.build.jobs = jobs;
    }

    let sources = discover::discover(&args.root, &config)?;
    info!(root = %args.root.display(), files = sources.len(), "content discovered");
    Ok((config, sources))
}

fn do_build(args: &BuildArgs, no_color: bool) -> Result<i32> {
    let (config, sources) = load(&args.pipeline)?;
    let outcome = assembler::run(&sources, &config);

    let renderer = Renderer::new(&sources, no_color);
    renderer.report(&outcome.report);

    if let Some(tree) = &outcome.tree {
        let json = tree.to_json().context("cannot serialize navigation tree")?;
        match &args.output {
            Some(path) => std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("cannot write {}", path.display()))?,
            None => println!("{json}"),
        }
    }
    renderer.summary(&outcome.report, outcome.corpus.len());

    Ok(outcome.exit_code(args.pipeline.strict))
}

fn do_check(args: &CheckArgs, no_color: bool) -> Result<i32> {
    let (config, sources) = load(&args.pipeline)?;
    let outcome = assembler::run(&sources, &config);

    match args.format {
        Format::Text => {
            let renderer = Renderer::new(&sources, no_color);
            renderer.report(&outcome.report);
            renderer.summary(&outcome.report, outcome.corpus.len());
        }
        Format::Json => {
            let json = render::report_json(&outcome.report, outcome.is_aborted())
                .context("cannot serialize report")?;
            println!("{json}");
        }
    }

    Ok(outcome.exit_code(args.pipeline.strict))
}

fn do_inspect(args: &InspectArgs, no_color: bool) -> Result<i32> {
    let bytes =
        std::fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let file = SourceFile::from_bytes(display_path(&args.file), bytes);

    let mut parser = file.parser(0);
    if let Some(language) = &args.quiz_language {
        parser = parser.with_quiz_language(language.as_str());
    }
    let outcome = parser.parse();

    let renderer = Renderer::new(std::slice::from_ref(&file), no_color);
    renderer.diagnostics(&outcome.diagnostics);

    if let Some(document) = &outcome.document {
        let json = serde_json::to_string_pretty(document).context("cannot serialize document")?;
        println!("{json}");
    }

    Ok(if outcome.has_errors() { 1 } else { 0 })
}

fn display_path(path: &Path) -> DocPath {
    DocPath::parse(&path.to_string_lossy())
}

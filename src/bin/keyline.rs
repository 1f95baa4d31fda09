use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "keyline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a project JSON file.
    Validate(ValidateArgs),
    /// Print the per-element property values of a sequence at a given time.
    Sample(SampleArgs),
    /// Export a sequence as a CSS stylesheet.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Sequence id (defaults to the project's active sequence).
    #[arg(long)]
    sequence: Option<String>,

    /// Time in milliseconds.
    #[arg(long)]
    time: u64,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Sequence id (defaults to the project's active sequence).
    #[arg(long)]
    sequence: Option<String>,

    /// Output CSS path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Sample(args) => cmd_sample(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn read_project_json(path: &Path) -> anyhow::Result<keyline::Project> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let r = BufReader::new(f);
    let project: keyline::Project =
        serde_json::from_reader(r).with_context(|| "parse project JSON")?;
    Ok(project)
}

fn resolve_sequence<'a>(
    project: &'a keyline::Project,
    sequence: Option<&str>,
) -> anyhow::Result<&'a keyline::Sequence> {
    match sequence {
        Some(id) => project
            .sequence(id)
            .with_context(|| format!("sequence '{id}' not found")),
        None => project
            .active()
            .context("project has no active sequence; pass --sequence"),
    }
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    project.validate()?;
    eprintln!(
        "ok: {} sequence(s), active: {}",
        project.sequences.len(),
        project.active_sequence.as_deref().unwrap_or("none")
    );
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    project.validate()?;
    let seq = resolve_sequence(&project, args.sequence.as_deref())?;

    let time = (args.time as f64).clamp(0.0, seq.duration.as_f64());
    let values = keyline::sample_sequence(seq, time);

    let json: serde_json::Map<String, serde_json::Value> = values
        .into_iter()
        .map(|(element, map)| {
            let inner: serde_json::Map<String, serde_json::Value> = map
                .into_iter()
                .map(|(prop, value)| {
                    let v = match value {
                        keyline::Value::Numeric(n) => serde_json::json!(n),
                        keyline::Value::Discrete(s) => serde_json::json!(s),
                    };
                    (format!("{prop:?}"), v)
                })
                .collect();
            (element, serde_json::Value::Object(inner))
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    project.validate()?;
    let seq = resolve_sequence(&project, args.sequence.as_deref())?;

    let css = keyline::export_stylesheet(seq);
    match args.out {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(&path, css)
                .with_context(|| format!("write css '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{css}"),
    }
    Ok(())
}

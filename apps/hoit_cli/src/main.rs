mod project;
mod requests;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hoit_core::types::SourceSegment;
use hoit_core::EditorConfig;
use project::ProjectFile;
use requests::{secs, EditRequest, TranscriptSegment};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "hoit")]
#[command(version)]
#[command(about = "Non-destructive subtitle timeline editing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a project from a transcript JSON file
    Init {
        /// Transcript: a list of segments with timed words (seconds)
        transcript: PathBuf,
        /// Project file to write (".hoit" is appended if missing)
        project: PathBuf,
        /// Project name, defaults to the transcript's file stem
        #[arg(long)]
        name: Option<String>,
        /// Media length in seconds, defaults to the last word's end
        #[arg(long)]
        media_duration: Option<f64>,
        /// Editor settings as JSON; missing fields use defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Apply a list of edit requests and save the project
    Edit {
        project: PathBuf,
        /// JSON list of tagged requests, e.g. {"op": "split", ...}
        requests: PathBuf,
    },

    /// Print the playable ranges
    Ranges { project: PathBuf },

    /// Convert between adjusted and original time
    Map {
        project: PathBuf,
        /// Playback position in seconds
        #[arg(long, conflicts_with = "original", required_unless_present = "original")]
        adjusted: Option<f64>,
        /// Media position in seconds
        #[arg(long)]
        original: Option<f64>,
    },

    /// Print the words playing at a timeline position
    Words {
        project: PathBuf,
        /// Timeline position in seconds
        #[arg(long)]
        at: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init {
            transcript,
            project,
            name,
            media_duration,
            config,
        } => init(&transcript, &project, name, media_duration, config.as_deref()),
        Commands::Edit { project, requests } => edit(&project, &requests),
        Commands::Ranges { project } => ranges(&project),
        Commands::Map {
            project,
            adjusted,
            original,
        } => map(&project, adjusted, original),
        Commands::Words { project, at } => words(&project, at),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init(
    transcript: &Path,
    project: &Path,
    name: Option<String>,
    media_duration: Option<f64>,
    config: Option<&Path>,
) -> Result<()> {
    let segments: Vec<TranscriptSegment> = read_json(transcript)?;
    let sources = segments
        .into_iter()
        .map(SourceSegment::try_from)
        .collect::<hoit_core::Result<Vec<_>>>()
        .with_context(|| format!("{} has an unusable word time", transcript.display()))?;
    let media_duration = media_duration
        .map(secs)
        .transpose()
        .context("invalid --media-duration")?;
    let config: EditorConfig = match config {
        Some(path) => read_json(path)?,
        None => EditorConfig::default(),
    };
    let name = name.unwrap_or_else(|| {
        transcript
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let file = ProjectFile::new(name, sources, media_duration, config);
    let path = file.save_to_file(project)?;
    println!("{}", path.display());
    Ok(())
}

fn edit(project: &Path, requests: &Path) -> Result<()> {
    let mut file = ProjectFile::load_from_file(project)?;
    let requests: Vec<EditRequest> = read_json(requests)?;
    let mut editor = file.open_editor()?;

    let mut created = Vec::new();
    for (i, request) in requests.iter().enumerate() {
        let outcome = request
            .apply(&mut editor)
            .with_context(|| format!("request {} ({:?}) failed", i, request))?;
        created.extend(outcome);
    }

    file.update_from(&editor);
    file.save_to_file(project)?;
    tracing::info!(applied = requests.len(), version = editor.version(), "edits applied");
    print_json(&json!({
        "applied": requests.len(),
        "created": created,
        "segments": editor.segments().len(),
        "adjusted_duration": editor.adjusted_duration().as_seconds(),
    }))
}

fn ranges(project: &Path) -> Result<()> {
    let editor = ProjectFile::load_from_file(project)?.open_editor()?;
    print_json(&editor.range_snapshot())
}

fn map(project: &Path, adjusted: Option<f64>, original: Option<f64>) -> Result<()> {
    let editor = ProjectFile::load_from_file(project)?.open_editor()?;
    match (adjusted, original) {
        (Some(a), None) => {
            let adjusted = secs(a).context("invalid --adjusted")?;
            let original = editor.map_to_original_time(adjusted);
            print_json(&json!({
                "adjusted": a,
                "original": original.as_seconds(),
                "decision": editor.should_skip_segment(adjusted),
            }))
        }
        (None, Some(o)) => {
            let original = secs(o).context("invalid --original")?;
            print_json(&json!({
                "original": o,
                "adjusted": editor.map_to_adjusted_time(original).map(|t| t.as_seconds()),
                "decision": editor.should_skip_original(original),
            }))
        }
        _ => bail!("pass exactly one of --adjusted or --original"),
    }
}

fn words(project: &Path, at: f64) -> Result<()> {
    let mut editor = ProjectFile::load_from_file(project)?.open_editor()?;
    let words: Vec<_> = editor
        .active_words_at(secs(at).context("invalid --at")?)?
        .into_iter()
        .map(|w| {
            json!({
                "text": w.word.text,
                "segment": w.segment_id,
                "start": w.timeline_start.as_seconds(),
                "end": w.timeline_end.as_seconds(),
            })
        })
        .collect();
    print_json(&words)
}

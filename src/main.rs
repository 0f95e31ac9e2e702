//! hpce-load CLI: bulk loader for a segmented correlation engine.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use hpce_loader::config::EngineConfig;
use hpce_loader::engine::Engine;
use hpce_loader::observer::ProgressObserver;
use hpce_loader::symbol::SymbolicTriple;

#[derive(Parser)]
#[command(name = "hpce-load", version, about = "Segmented triple-store loader")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server host (overrides the configuration file).
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server web service port (overrides the configuration file).
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load triples from a JSON-lines file.
    ///
    /// Each line is an object with `subject_type`, `subject_item`, `action`,
    /// `object_type` and `object_item`, each a name or a numeric id.
    Load {
        #[arg(long)]
        file: PathBuf,

        /// Log progress every N triples.
        #[arg(long, default_value = "100000")]
        progress: u64,
    },

    /// Delete every triple of one subject.
    DeleteSubject {
        /// Subject type id.
        #[arg(long = "type")]
        type_id: u64,

        /// Subject item id.
        #[arg(long)]
        item: u64,
    },

    /// Delete every subject selected by an engine expression.
    DeleteExpr {
        expr: String,
    },

    /// Ask the store to persist itself.
    Save,

    /// Ask the store to reload its last save.
    Restore,

    /// Drop every triple in the store.
    Empty,

    /// Show segment topology and item range.
    Topology,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let engine = Engine::connect(config)?;

    match cli.command {
        Commands::Load { file, progress } => {
            let reader = std::io::BufReader::new(std::fs::File::open(&file).into_diagnostic()?);
            let observer = Arc::new(ProgressObserver::new(progress));
            engine.set_observer(Some(observer.clone()));

            for (n, line) in reader.lines().enumerate() {
                let line = line.into_diagnostic()?;
                if line.trim().is_empty() {
                    continue;
                }
                let triple: SymbolicTriple = serde_json::from_str(&line)
                    .into_diagnostic()
                    .map_err(|e| e.wrap_err(format!("{}:{}", file.display(), n + 1)))?;
                engine.apply(&triple)?;
            }
            engine.close()?;

            let stats = engine.stats();
            println!(
                "Loaded {} triples from {} ({} skipped)",
                observer.count(),
                file.display(),
                stats.skipped
            );
        }

        Commands::DeleteSubject { type_id, item } => {
            let summary = engine.delete_subject(type_id, item)?;
            engine.close()?;
            println!(
                "Deleted {} triples of subject({type_id},{item})",
                summary.pairs
            );
        }

        Commands::DeleteExpr { expr } => {
            let summary = engine.delete_expression(&expr)?;
            engine.close()?;
            println!(
                "Deleted {} triples of {} subjects matching {expr}",
                summary.pairs, summary.subjects
            );
        }

        Commands::Save => report("save", engine.save()?),
        Commands::Restore => report("restore", engine.load()?),
        Commands::Empty => report("empty", engine.empty()?),

        Commands::Topology => {
            println!("{}", engine.stats());
            if let Some(range) = engine.item_range() {
                println!("items: [{}, {}]", range.min, range.max);
            }
            for (i, segment) in engine.segment_endpoints().iter().enumerate() {
                println!("  segment {i}: {segment}");
            }
        }
    }

    Ok(())
}

fn report(command: &str, ok: bool) {
    if ok {
        println!("{command}: ok");
    } else {
        println!("{command}: store reported failure");
    }
}

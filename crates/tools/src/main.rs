use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use overlay::OverlayConfig;
use tools::{ReplayOptions, replay};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay scene feeds through the overlay engine")]
struct Args {
    /// JSON-lines file with one scene feed per line
    #[arg(long)]
    input: PathBuf,

    /// Overlay config JSON (defaults to OVERLAY_* environment variables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenes submitted before the map surface reports ready
    #[arg(long, default_value_t = 0)]
    ready_after: usize,

    /// Remove every overlay after the last scene
    #[arg(long)]
    teardown: bool,

    /// Print the metrics snapshot to stderr when done
    #[arg(long)]
    metrics: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
            OverlayConfig::from_json_str(&text).map_err(|e| format!("parse {path:?}: {e}"))?
        }
        None => OverlayConfig::from_env(),
    };
    info!(?config, "overlay config");

    let file = File::open(&args.input).map_err(|e| format!("open {:?}: {e}", args.input))?;
    let options = ReplayOptions {
        ready_after: args.ready_after,
        teardown: args.teardown,
    };
    let out = replay(BufReader::new(file), config, &options).map_err(|e| e.to_string())?;

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    for line in &out.lines {
        serde_json::to_writer(&mut w, line).map_err(|e| format!("encode call: {e}"))?;
        w.write_all(b"\n").map_err(|e| format!("write: {e}"))?;
    }
    w.flush().map_err(|e| format!("write: {e}"))?;

    for event in &out.events {
        eprintln!("tick {}: {}: {}", event.tick, event.kind, event.message);
    }
    if args.metrics {
        let snapshot = serde_json::to_string_pretty(&out.metrics)
            .map_err(|e| format!("encode metrics: {e}"))?;
        eprintln!("{snapshot}");
    }
    Ok(())
}

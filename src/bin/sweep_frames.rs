//! sweep_frames - remove representative frames no history entry references

use anyhow::Result;
use clap::Parser;

use pupdex::sweep::sweep_orphan_frames;
use pupdex::{AnalysisConfig, HistoryStore};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Report what would be removed without deleting anything.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = AnalysisConfig::load()?;
    let history = HistoryStore::new(cfg.history_path.clone());

    if args.dry_run {
        let referenced: std::collections::HashSet<String> = history
            .load()?
            .into_iter()
            .filter_map(|e| e.display_image_path)
            .collect();
        let mut orphans = 0usize;
        if cfg.frames_dir.is_dir() {
            for entry in std::fs::read_dir(&cfg.frames_dir)? {
                let path = entry?.path();
                if path.is_file() && !referenced.contains(path.to_string_lossy().as_ref()) {
                    println!("{}", path.display());
                    orphans += 1;
                }
            }
        }
        log::info!("{orphans} orphan frame(s) would be removed");
        return Ok(());
    }

    let stats = sweep_orphan_frames(&cfg.frames_dir, &history)?;
    log::info!(
        "swept {}: {} scanned, {} removed",
        cfg.frames_dir.display(),
        stats.scanned,
        stats.removed
    );
    Ok(())
}

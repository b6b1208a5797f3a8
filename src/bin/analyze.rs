//! analyze - run breed identification on a video or image and record it

use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::Arc;

use pupdex::sweep::sweep_orphan_frames;
use pupdex::{
    analyze_image_for_breeds, format_breed_name, spawn_analysis, AnalysisConfig, AnalysisKind,
    HistoryEntry, HistoryStore, LazyModels, VideoAnalysisResult,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the video (or image, with --image) to analyze. Synthetic
    /// `stub://` sources are accepted for smoke runs.
    path: String,
    /// Treat the input as a still image and classify it directly.
    #[arg(long)]
    image: bool,
    /// Skip the orphan-frame sweep that normally runs before analysis.
    #[arg(long)]
    no_sweep: bool,
    /// Do not record the outcome in the analysis history.
    #[arg(long)]
    no_history: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = AnalysisConfig::load()?;
    let history = HistoryStore::new(cfg.history_path.clone());

    if !args.no_sweep {
        if let Err(e) = sweep_orphan_frames(&cfg.frames_dir, &history) {
            log::warn!("frame sweep failed: {e:#}");
        }
    }

    let models = Arc::new(model_loader(&cfg));

    let result = if args.image {
        let path = std::path::PathBuf::from(&args.path);
        let ranked = analyze_image_for_breeds(&models, &path, &cfg)?;
        VideoAnalysisResult {
            representative_frame_path: Some(path),
            ranked_breeds: ranked,
            error: None,
        }
    } else {
        let handle = spawn_analysis(Arc::clone(&models), args.path.clone(), cfg.clone());
        handle.wait()?
    };

    if !args.no_history {
        record_history(&history, &args, &result)?;
    }

    serde_json::to_writer_pretty(std::io::stdout().lock(), &result)?;
    println!();
    Ok(())
}

fn model_loader(cfg: &AnalysisConfig) -> LazyModels {
    #[cfg(feature = "backend-tract")]
    {
        let cfg = cfg.clone();
        LazyModels::lazy(move || pupdex::ModelService::load(&cfg))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        let _ = cfg;
        LazyModels::lazy(|| {
            Err(pupdex::AnalysisError::ModelFilesMissing(
                "built without the backend-tract feature, no model backend available".to_string(),
            ))
        })
    }
}

fn record_history(
    history: &HistoryStore,
    args: &Args,
    result: &VideoAnalysisResult,
) -> Result<()> {
    let top = result
        .ranked_breeds
        .first()
        .ok_or_else(|| anyhow!("analysis produced an empty breed list"))?;
    let breed = format_breed_name(&top.breed);
    history.record(HistoryEntry {
        original_file_path: args.path.clone(),
        display_image_path: result
            .representative_frame_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        breed: breed.clone(),
        confidence: top.confidence,
        timestamp: chrono::Utc::now(),
        breed_info_text: result
            .error
            .clone()
            .unwrap_or_else(|| format!("{} at {:.1}% confidence", breed, top.confidence)),
        kind: if args.image {
            AnalysisKind::Image
        } else {
            AnalysisKind::Video
        },
    })?;
    Ok(())
}

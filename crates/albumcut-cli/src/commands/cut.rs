use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::args::{CutOptions, OutputFormat as CliFormat};
use albumcut_core::{
    album::{AlbumContext, OutputFormat},
    config::Config,
    pipeline::{Pipeline, PipelineConfig, PipelineStage},
};

pub async fn run(link: &str, options: &CutOptions, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    // Convert CLI types to core types, falling back to the configured format
    let format = match options.format {
        Some(CliFormat::Mp3) => OutputFormat::Mp3,
        Some(CliFormat::Aac) => OutputFormat::Aac,
        Some(CliFormat::Flac) => OutputFormat::Flac,
        Some(CliFormat::Wav) => OutputFormat::Wav,
        Some(CliFormat::Opus) => OutputFormat::Opus,
        None => OutputFormat::from_str(&config.output.default_format).ok_or_else(|| {
            anyhow::anyhow!(
                "invalid default_format {:?} in config",
                config.output.default_format
            )
        })?,
    };

    let album = AlbumContext::new(
        options.artist.clone(),
        options.album_title.clone(),
        options.year,
        options.cover.clone(),
        &options.output,
        format,
    );

    let pipeline_config = PipelineConfig {
        url: link.to_string(),
        tracklist: options.input.clone(),
        album,
        max_parallel: options.parallel.unwrap_or(config.export.max_parallel),
        clean_inputs: options.clean.unwrap_or(config.cleanup.remove_inputs),
        paths: config.paths.clone(),
    };

    // Create progress channel
    let (tx, mut rx) = mpsc::channel(32);

    // Spawn progress handler
    let progress_handle = tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("=>-"),
        );

        let mut track_bar: Option<ProgressBar> = None;

        while let Some(stage) = rx.recv().await {
            match stage {
                PipelineStage::Downloading { url } => {
                    spinner.enable_steady_tick(Duration::from_millis(100));
                    spinner.set_message(format!("Downloading {}", truncate(&url, 50)));
                }
                PipelineStage::Downloaded { title } => {
                    let name = title.unwrap_or_else(|| "source audio".to_string());
                    spinner.println(format!("Downloaded {}", truncate(&name, 60)));
                }
                PipelineStage::LoadingTracklist { path } => {
                    spinner.set_message(format!("Reading tracklist {}", path.display()));
                }
                PipelineStage::Exporting { total } => {
                    spinner.finish_and_clear();
                    let bar = ProgressBar::new(total as u64);
                    bar.set_style(
                        ProgressStyle::with_template(
                            "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                        )
                        .unwrap()
                        .progress_chars("=>-"),
                    );
                    bar.set_message("Exporting tracks...");
                    track_bar = Some(bar);
                }
                PipelineStage::TrackFinished(event) => {
                    if let Some(ref bar) = track_bar {
                        bar.inc(1);
                        if event.ok {
                            bar.println(format!("[OK]     {} - {}", event.number, event.title));
                        } else {
                            bar.println(format!("[FAILED] {} - {}", event.number, event.title));
                        }
                    }
                }
                PipelineStage::Complete {
                    output_dir,
                    duration,
                } => {
                    if let Some(ref bar) = track_bar {
                        bar.finish_with_message(format!(
                            "Done: {} ({:.1}s)",
                            output_dir.display(),
                            duration.as_secs_f32()
                        ));
                    }
                }
                PipelineStage::Failed { stage, error } => {
                    let message = format!("Failed at {stage}: {error}");
                    match track_bar {
                        Some(ref bar) => bar.abandon_with_message(message),
                        None => spinner.abandon_with_message(message),
                    }
                }
            }
        }
    });

    // Run pipeline
    let pipeline = Pipeline::new(pipeline_config, tx);
    let result = pipeline.run().await;

    // Close the progress channel, then wait for the handler to drain it
    drop(pipeline);
    progress_handle.await?;

    match result {
        Ok(output_dir) => {
            println!("\nAlbum exported to {}", output_dir.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError: {e}");
            Err(e.into())
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

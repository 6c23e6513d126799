use albumcut_core::config::Config;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("albumcut configuration\n");

    println!("[paths]");
    if let Some(ref p) = config.paths.yt_dlp {
        println!("  yt_dlp = {:?}", p);
    } else {
        println!("  yt_dlp = (auto-detect)");
    }
    if let Some(ref p) = config.paths.ffmpeg {
        println!("  ffmpeg = {:?}", p);
    } else {
        println!("  ffmpeg = (auto-detect)");
    }

    println!("\n[output]");
    println!("  default_format = {:?}", config.output.default_format);
    println!("  default_directory = {:?}", config.output.default_directory);

    println!("\n[export]");
    println!("  max_parallel = {}", config.export.max_parallel);

    println!("\n[cleanup]");
    println!("  remove_inputs = {}", config.cleanup.remove_inputs);

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    if let Some(p) = config_path {
        println!("  1. {} (specified)", p.display());
    }
    if let Some(config_dir) = dirs::config_dir() {
        println!("  2. {}/albumcut/config.toml", config_dir.display());
    }
    println!("  3. Environment variables (ALBUMCUT_*)");

    Ok(())
}

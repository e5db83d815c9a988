//! `lumen` - render the demo scene to PNG.

mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_renderer::{Channel, RenderConfig, RenderEvent, RenderJob};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "lumen", version, about = "Monte Carlo path tracer")]
struct Cli {
    /// JSON render config; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OBJ model placed in the scene as glass
    #[arg(long)]
    obj: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Samples per pixel
    #[arg(long)]
    spp: Option<u32>,

    /// Maximum bounce depth
    #[arg(long)]
    depth: Option<u32>,

    #[arg(long)]
    shadow_rays: Option<u32>,

    /// Extra samples for noisy pixels
    #[arg(long)]
    adaptive: Option<u32>,

    /// Worker threads (default: all cores)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Output PNG path
    #[arg(short, long, default_value = "img.png")]
    output: PathBuf,

    /// Also write variance, stddev and sample-count images
    #[arg(long)]
    channels: bool,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Load the config file, if any, and apply flag overrides.
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => RenderConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(spp) = self.spp {
            config.samples_per_pixel = spp;
        }
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(shadow_rays) = self.shadow_rays {
            config.shadow_rays = shadow_rays;
        }
        if let Some(adaptive) = self.adaptive {
            config.adaptive_samples = adaptive;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

/// `img.png` + `variance` -> `img_variance.png`
fn channel_path(output: &Path, channel: Channel) -> PathBuf {
    if channel == Channel::Color {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "img".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output.with_file_name(format!("{}_{}.{}", stem, channel.name(), ext))
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = cli.render_config()?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    log::info!("Starting lumen");

    let scene = scene::demo_scene(cli.obj.as_deref())?;
    let camera = scene::demo_camera(&config);
    let height = config.height;

    let job = RenderJob::spawn(Arc::new(scene), camera, config);

    // Progress in 10% steps
    let mut reported = 0;
    for event in job.rx.iter() {
        match event {
            RenderEvent::RowDone { completed, .. } => {
                let percent = completed * 100 / height;
                if percent >= reported + 10 {
                    reported = percent - percent % 10;
                    log::info!("{}% of rows done", reported);
                }
            }
            RenderEvent::Finished(_) => break,
        }
    }

    let (buffer, stats) = job.join().context("Render failed")?;
    log::info!(
        "Finished in {:.2?} with {} samples",
        stats.elapsed,
        stats.samples
    );
    println!("Intersection tests: {}", stats.intersections);

    let channels: &[Channel] = if cli.channels {
        &Channel::ALL
    } else {
        &[Channel::Color]
    };
    for &channel in channels {
        let path = channel_path(&cli.output, channel);
        buffer
            .save_png(&path, channel)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

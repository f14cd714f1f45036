use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use holocard_core::{CardRect, CardState, EffectType, Layers};
use holocard_image_pipeline::{mask_data_url, mask_png, SegmentConfig, Segmenter};

#[derive(Parser)]
#[command(name = "holocard-cli", version, about = "Offline tools for holocard effects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write character and background mask PNGs for an image.
    Masks {
        input: PathBuf,
        #[arg(long, env = "HOLOCARD_MASK_DIR", default_value = ".")]
        out_dir: PathBuf,
        /// TOML file with segmentation settings; flags override it.
        #[arg(long, env = "HOLOCARD_SEGMENT_CONFIG")]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Preset::Balanced)]
        preset: Preset,
        #[arg(long)]
        threshold: Option<f32>,
        #[arg(long)]
        blur: Option<u32>,
        #[arg(long)]
        dilate: Option<u32>,
        #[arg(long)]
        feather: Option<u32>,
        #[arg(long)]
        max_dim: Option<u32>,
        /// Also print the data URLs the browser would use.
        #[arg(long)]
        data_url: bool,
    },
    /// List the effect profiles.
    Effects,
    /// Print the settled frame for a pointer position over a card.
    Frame {
        #[arg(long, default_value = "standard")]
        effect: EffectType,
        /// Pointer x as a percentage of card width.
        #[arg(long, default_value_t = 50.0)]
        x: f32,
        /// Pointer y as a percentage of card height.
        #[arg(long, default_value_t = 50.0)]
        y: f32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Balanced,
    Permissive,
}

const MAX_SETTLE_FRAMES: usize = 100_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Masks {
            input,
            out_dir,
            config,
            preset,
            threshold,
            blur,
            dilate,
            feather,
            max_dim,
            data_url,
        } => {
            let mut settings = match config {
                Some(path) => toml::from_str::<SegmentConfig>(&fs::read_to_string(path)?)?,
                None => match preset {
                    Preset::Balanced => SegmentConfig::default(),
                    Preset::Permissive => SegmentConfig::permissive(),
                },
            };
            if let Some(threshold) = threshold {
                settings.threshold = threshold;
            }
            if let Some(blur) = blur {
                settings.blur_radius = blur;
            }
            if let Some(dilate) = dilate {
                settings.dilate_size = dilate;
            }
            if let Some(feather) = feather {
                settings.feather_edge = feather;
            }
            if max_dim.is_some() {
                settings.max_dim = max_dim;
            }

            let segmenter = Segmenter::new(settings)?;
            let bytes = fs::read(&input)?;
            let rgba = holocard_image_pipeline::decode_rgba(&bytes)?;
            let (width, height) = rgba.dimensions();
            println!("input: {} ({width}x{height})", input.display());
            let masks = segmenter.segment_with_progress(&rgba, |stage| {
                eprintln!("  {}", stage.label());
            })?;

            fs::create_dir_all(&out_dir)?;
            let stem = input
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("card");
            for (kind, mask) in [("character", &masks.character), ("background", &masks.background)] {
                let path = mask_path(&out_dir, stem, kind);
                fs::write(&path, mask_png(mask)?)?;
                println!("{kind}: {} (mean {:.1})", path.display(), mask.mean());
                if data_url {
                    println!("{}", mask_data_url(mask)?);
                }
            }
        }
        Commands::Effects => {
            for effect in EffectType::ALL {
                let profile = effect.profile();
                let layers: Vec<String> = profile
                    .layers
                    .iter_names()
                    .map(|(name, _)| name.to_lowercase())
                    .collect();
                println!(
                    "{:<9} band {}-{} glare {:?} masks {} layers [{}]",
                    effect.as_str(),
                    profile.background_band.lo,
                    profile.background_band.hi,
                    profile.glare,
                    if profile.uses_masks() { "yes" } else { "no" },
                    if profile.layers == Layers::empty() {
                        "transform only".to_string()
                    } else {
                        layers.join(", ")
                    },
                );
            }
        }
        Commands::Frame { effect, x, y } => {
            let rect = CardRect::new(0.0, 0.0, 100.0, 100.0);
            let mut card = CardState::new(effect);
            card.activate();
            card.pointer_move(rect, x, y);
            let mut frames = 0;
            let outcome = loop {
                let outcome = card.step_frame();
                frames += 1;
                if !outcome.animating || frames >= MAX_SETTLE_FRAMES {
                    break outcome;
                }
            };
            let frame = outcome.frame;
            println!("effect: {} ({})", effect.label(), effect.class_name());
            println!("settled after {frames} frames");
            println!("transform: {}", frame.transform);
            println!("inner: {}", frame.inner_transform);
            if let Some(position) = frame.reflection_position {
                println!("reflection: {position}");
            }
            if let Some(glow) = frame.glow_background {
                println!("glow: {glow}");
            }
            if let Some(overlay) = frame.overlay_background {
                println!("overlay: {overlay}");
            }
            if let Some(tint) = frame.sparkle_tint {
                println!("sparkle: {} / {}", tint.color, tint.filter);
            }
            for (name, value) in frame.properties {
                println!("{name}: {value}");
            }
        }
    }

    Ok(())
}

fn mask_path(out_dir: &Path, stem: &str, kind: &str) -> PathBuf {
    out_dir.join(format!("{stem}.{kind}.png"))
}

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use island_cropper::background::BackgroundPolicy;
use island_cropper::config::{CropConfig, SizeMismatch};
use island_cropper::{pipeline, RegionOutcome};

#[derive(Parser, Debug)]
#[command(name = "island_cropper")]
#[command(about = "Crop islands out of a world map and make the ocean transparent")]
struct Args {
    /// JSON config file (fields override built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source map image
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Output directory for the island PNGs
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Background policy: statistical-threshold or edge-sampled-distance
    #[arg(short, long)]
    policy: Option<String>,

    /// Gaussian sigma for alpha smoothing (0 disables)
    #[arg(short, long)]
    blur_radius: Option<f32>,

    /// Spread threshold (statistical) or color distance (edge-sampled)
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Resolution the region coordinates refer to, e.g. "5504x3072"
    #[arg(long, value_parser = parse_size, conflicts_with = "any_size")]
    canonical_size: Option<(u32, u32)>,

    /// Accept any source resolution without checking it
    #[arg(long)]
    any_size: bool,

    /// Rescale regions instead of failing when the source resolution differs
    #[arg(long)]
    rescale: bool,

    /// Only crop the named region (repeatable)
    #[arg(long)]
    only: Vec<String>,

    /// Write manifest.json with placement percentages
    #[arg(short, long)]
    manifest: bool,

    /// Process regions one at a time
    #[arg(long)]
    sequential: bool,

    /// Print the region table and exit
    #[arg(long)]
    list: bool,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height '{}': {}", h, e))?;
    Ok((w, h))
}

impl Args {
    /// Layer command-line flags over the config file (or defaults).
    fn into_config(self) -> Result<CropConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => CropConfig::load(path)?,
            None => CropConfig::default(),
        };

        if let Some(source) = self.source {
            config.source_path = source;
        }
        if let Some(out_dir) = self.out_dir {
            config.output_dir = out_dir;
        }
        if let Some(policy) = &self.policy {
            config.policy = BackgroundPolicy::from_str(policy)
                .ok_or_else(|| format!("unknown policy '{}'", policy))?;
        }
        if self.blur_radius.is_some() {
            config.blur_radius = self.blur_radius;
        }
        if self.threshold.is_some() {
            config.threshold = self.threshold;
        }
        if self.canonical_size.is_some() {
            config.canonical_size = self.canonical_size;
        }
        if self.any_size {
            config.canonical_size = None;
        }
        if self.rescale {
            config.size_mismatch = SizeMismatch::Rescale;
        }
        if !self.only.is_empty() {
            config.only = self.only;
        }
        if self.manifest {
            config.write_manifest = true;
        }
        if self.sequential {
            config.parallel = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let list = args.list;
    let config = args.into_config()?;

    if list {
        let table = config.region_table()?;
        println!("{} regions:", table.len());
        for r in table.iter() {
            println!(
                "  {:<24} center ({}, {})  half size {}x{}",
                r.name, r.center_x, r.center_y, r.half_width, r.half_height
            );
        }
        return Ok(());
    }

    let report = pipeline::run(&config)?;

    println!("Source image: {}x{}", report.source_width, report.source_height);
    for outcome in &report.outcomes {
        match outcome {
            RegionOutcome::Written(r) => {
                let mut line = format!(
                    "  {}: {}x{}px  left {:.2}% top {:.2}% width {:.2}%",
                    r.name,
                    r.bounds.width(),
                    r.bounds.height(),
                    r.placement.left_pct,
                    r.placement.top_pct,
                    r.placement.width_pct
                );
                if let Some([red, green, blue]) = r.background {
                    line.push_str(&format!("  ocean rgb({}, {}, {})", red, green, blue));
                }
                println!("{}", line);
            }
            RegionOutcome::Skipped { name, reason } => {
                println!("  {}: skipped ({})", name, reason);
            }
        }
    }
    if let Some(path) = &report.manifest_path {
        println!("Manifest: {}", path.display());
    }

    println!();
    println!("Done: {} islands cropped into {}", report.written_count(), config.output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("5504x3072"), Ok((5504, 3072)));
        assert_eq!(parse_size("10X20"), Ok((10, 20)));
        assert!(parse_size("5504").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "island_cropper",
            "--source",
            "map.png",
            "--policy",
            "edge",
            "--threshold",
            "30",
            "--any-size",
            "--only",
            "moosewood",
            "--sequential",
        ]);
        let config = args.into_config().unwrap();
        assert_eq!(config.source_path, PathBuf::from("map.png"));
        assert_eq!(config.output_dir, PathBuf::from("islands"));
        assert_eq!(config.policy, BackgroundPolicy::EdgeSampledDistance);
        assert_eq!(config.effective_threshold(), 30.0);
        assert_eq!(config.effective_blur_radius(), 1.5);
        assert_eq!(config.canonical_size, None);
        assert_eq!(config.only, vec!["moosewood".to_string()]);
        assert!(!config.parallel);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let args = Args::parse_from(["island_cropper", "--policy", "magic"]);
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_size_flags() {
        let args = Args::parse_from(["island_cropper", "--canonical-size", "100x50", "--rescale"]);
        let config = args.into_config().unwrap();
        assert_eq!(config.canonical_size, Some((100, 50)));
        assert_eq!(config.size_mismatch, SizeMismatch::Rescale);
    }
}

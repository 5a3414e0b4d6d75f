//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula", about = "Chunked voxel world renderer")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// World size as WIDTHxHEIGHTxDEPTH, e.g. 128x64x128.
    #[arg(long, value_parser = parse_dims)]
    pub size: Option<[i32; 3]>,

    /// Chunk edge length in blocks.
    #[arg(long)]
    pub chunk_size: Option<i32>,

    /// Maximum chunk rebuilds per frame.
    #[arg(long)]
    pub rebuilds_per_frame: Option<usize>,

    /// Directory holding block textures.
    #[arg(long)]
    pub texture_dir: Option<PathBuf>,

    /// Number of frames to run before exiting.
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_dims(s: &str) -> Result<[i32; 3], String> {
    let parts: Vec<&str> = s.split('x').collect();
    let [w, h, d] = parts.as_slice() else {
        return Err(format!("expected WIDTHxHEIGHTxDEPTH, got '{s}'"));
    };
    let parse = |v: &str| -> Result<i32, String> {
        match v.trim().parse::<i32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("'{v}' is not a positive integer")),
        }
    };
    Ok([parse(*w)?, parse(*h)?, parse(*d)?])
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = Some(seed);
        }
        if let Some([w, h, d]) = args.size {
            self.world.width = w;
            self.world.height = h;
            self.world.depth = d;
        }
        if let Some(size) = args.chunk_size {
            self.render.chunk_size = size;
        }
        if let Some(budget) = args.rebuilds_per_frame {
            self.render.rebuilds_per_frame = budget;
        }
        if let Some(ref dir) = args.texture_dir {
            self.atlas.texture_dir = dir.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(99),
            size: Some([64, 32, 48]),
            rebuilds_per_frame: Some(2),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.seed, Some(99));
        assert_eq!(config.world.dims(), [64, 32, 48]);
        assert_eq!(config.render.rebuilds_per_frame, 2);
        // Non-overridden fields retain defaults
        assert_eq!(config.render.chunk_size, 16);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_args() {
        let args = CliArgs::parse_from(["nebula", "--size", "32x16x32", "--frames", "5"]);
        assert_eq!(args.size, Some([32, 16, 32]));
        assert_eq!(args.frames, 5);
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_parse_dims_rejects_bad_input() {
        assert!(parse_dims("32x16").is_err());
        assert!(parse_dims("32x0x32").is_err());
        assert!(parse_dims("axbxc").is_err());
        assert_eq!(parse_dims("1x2x3"), Ok([1, 2, 3]));
    }
}

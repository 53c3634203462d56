use std::path::PathBuf;

use clap::Parser;

use crate::core::data::fractal_params::PngEncoder;

/// Process-wide knobs assembled once at startup: where to bind, how many
/// worker threads to give the draw pool, where `/save` writes files, and
/// which PNG backend a request gets if it doesn't name one explicitly.
#[derive(Parser, Debug, Clone)]
#[command(name = "fractal-server")]
#[command(about = "Interactive Newton-fractal rendering server")]
#[command(version)]
pub struct Config {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "FRACTAL_BIND_ADDRESS", default_value = "127.0.0.1")]
    pub bind_address: String,

    /// Port to bind the HTTP listener to.
    #[arg(long, env = "FRACTAL_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Worker pool size. `0` means `logical_cores - 1` (leaving one core
    /// free for the HTTP runtime).
    #[arg(long, env = "FRACTAL_POOL_SIZE", default_value_t = 0)]
    pub pool_size: usize,

    /// Base directory `/save` writes `<file>.png`/`<file>_metadata.txt` under.
    #[arg(long, env = "FRACTAL_SAVE_DIR", default_value = "./saved")]
    pub save_dir: PathBuf,

    /// PNG backend used when a request doesn't name one.
    #[arg(long, env = "FRACTAL_DEFAULT_PNG_ENCODER", value_enum, default_value_t = PngEncoderArg::A)]
    pub default_png_encoder: PngEncoderArg,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngEncoderArg {
    A,
    B,
}

impl From<PngEncoderArg> for PngEncoder {
    fn from(value: PngEncoderArg) -> Self {
        match value {
            PngEncoderArg::A => PngEncoder::A,
            PngEncoderArg::B => PngEncoder::B,
        }
    }
}

impl Config {
    /// Resolves `pool_size == 0` to `logical_cores - 1`, matching
    /// [`crate::core::sync::thread_pool::ThreadPool::new_with_default_size`].
    #[must_use]
    pub fn resolved_pool_size(&self) -> usize {
        if self.pool_size == 0 {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
                .saturating_sub(1)
                .max(1)
        } else {
            self.pool_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_defaults_with_no_arguments() {
        let config = Config::parse_from(["fractal-server"]);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.pool_size, 0);
    }

    #[test]
    fn test_resolved_pool_size_falls_back_when_zero() {
        let mut config = Config::parse_from(["fractal-server"]);
        config.pool_size = 0;
        assert!(config.resolved_pool_size() >= 1);
    }

    #[test]
    fn test_resolved_pool_size_honors_an_explicit_value() {
        let mut config = Config::parse_from(["fractal-server"]);
        config.pool_size = 7;
        assert_eq!(config.resolved_pool_size(), 7);
    }
}

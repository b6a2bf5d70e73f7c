use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for slidecast
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marker repair tolerances
    pub timing: TimingConfig,

    /// Rasterization and encoding settings
    pub render: RenderConfig,

    /// External program locations
    pub tools: ToolsConfig,

    /// AI-integration worker pool settings
    pub assist: AssistConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        self.render.validate()?;
        self.assist.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Tolerances used by the marker normalizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Headroom kept before the end of the audio so the last slide has a
    /// non-empty interval (seconds)
    pub epsilon: f64,

    /// A first marker at or below this time is snapped to zero; anything later
    /// gets a synthesized slide-1 marker in front of it (seconds)
    pub zero_snap_tolerance: f64,

    /// Lower bound for the minimum spacing between repaired markers (seconds)
    pub min_gap_floor: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.001,
            zero_snap_tolerance: 0.001,
            min_gap_floor: 0.001,
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("timing.epsilon", self.epsilon),
            ("timing.zero_snap_tolerance", self.zero_snap_tolerance),
            ("timing.min_gap_floor", self.min_gap_floor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(key, value).into());
            }
        }
        Ok(())
    }
}

/// Rasterization and encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Rasterization resolution handed to pdftoppm
    pub dpi: u32,

    /// Output frame rate of the slideshow
    pub fps: f64,

    /// Video encoder; "auto" picks hardware encoding on macOS
    pub video_codec: String,

    /// Constant rate factor for software encoding (0-51)
    pub crf: u8,

    /// x264 preset for software encoding
    pub preset: String,

    /// Target bitrate for hardware encoding
    pub hardware_bitrate: String,

    /// Audio codec used when muxing the narration
    pub audio_codec: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            fps: 30.0,
            video_codec: "auto".to_string(),
            crf: 23,
            preset: "fast".to_string(),
            hardware_bitrate: "2M".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl RenderConfig {
    /// Resolve "auto" to a concrete encoder for this platform
    pub fn resolved_video_codec(&self) -> &str {
        if self.video_codec == "auto" {
            if cfg!(target_os = "macos") {
                "h264_videotoolbox"
            } else {
                "libx264"
            }
        } else {
            &self.video_codec
        }
    }

    /// Whether the resolved encoder runs on dedicated hardware
    pub fn is_hardware_codec(&self) -> bool {
        let codec = self.resolved_video_codec();
        codec.ends_with("_videotoolbox")
            || codec.ends_with("_nvenc")
            || codec.ends_with("_vaapi")
            || codec.ends_with("_qsv")
    }

    fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(invalid("render.dpi", self.dpi).into());
        }

        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(invalid("render.fps", self.fps).into());
        }

        if self.crf > 51 {
            return Err(invalid("render.crf", self.crf).into());
        }

        if self.video_codec.trim().is_empty() {
            return Err(invalid("render.video_codec", &self.video_codec).into());
        }

        Ok(())
    }
}

/// Names or paths of the external programs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub pdftoppm: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            pdftoppm: "pdftoppm".to_string(),
        }
    }
}

/// Worker pool settings for per-slide AI calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Maximum number of calls in flight
    pub concurrency: usize,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Attempts per slide, including the first one
    pub max_attempts: u32,

    /// First backoff delay in milliseconds
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get().clamp(1, 8),
            timeout_secs: 60,
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl AssistConfig {
    fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(invalid("assist.concurrency", self.concurrency).into());
        }

        if self.max_attempts == 0 {
            return Err(invalid("assist.max_attempts", self.max_attempts).into());
        }

        if self.timeout_secs == 0 {
            return Err(invalid("assist.timeout_secs", self.timeout_secs).into());
        }

        if self.base_delay_ms > self.max_delay_ms {
            return Err(invalid(
                "assist.delay_range",
                format!("{}-{}", self.base_delay_ms, self.max_delay_ms),
            )
            .into());
        }

        Ok(())
    }
}

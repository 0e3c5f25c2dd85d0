use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::error::GalleryError;

/// Tuning of one gallery instance. Immutable once the gallery is built.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GalleryConfig {
    /// Signed curvature of the strip; zero keeps it flat.
    pub bend: f64,
    /// Corner radius as a fraction of the tile (0 = square, 0.5 = pill).
    pub border_radius: f64,
    /// Multiplier applied to drag and wheel input.
    pub scroll_speed: f64,
    /// Fraction of the remaining distance covered per frame.
    pub scroll_ease: f64,
    /// World-space gap between neighbouring tiles.
    pub padding: f64,
    /// Quiet period after the last wheel event before snapping to a tile.
    #[serde(with = "humantime_serde")]
    pub snap_delay: Duration,
}

impl GalleryConfig {
    const fn default_bend() -> f64 {
        3.0
    }

    const fn default_border_radius() -> f64 {
        0.05
    }

    const fn default_scroll_speed() -> f64 {
        2.0
    }

    const fn default_scroll_ease() -> f64 {
        0.05
    }

    const fn default_padding() -> f64 {
        2.0
    }

    const fn default_snap_delay() -> Duration {
        Duration::from_millis(200)
    }

    /// Reject values the engine cannot run with; clamp a too-large corner radius.
    pub fn validated(mut self) -> Result<Self, GalleryError> {
        if !self.bend.is_finite() {
            return Err(invalid("bend must be a finite number"));
        }
        if !(self.scroll_ease > 0.0 && self.scroll_ease <= 1.0) {
            return Err(invalid("scroll-ease must be in (0, 1]"));
        }
        if !(self.scroll_speed.is_finite() && self.scroll_speed > 0.0) {
            return Err(invalid("scroll-speed must be positive"));
        }
        if !(0.0..=1.0).contains(&self.border_radius) {
            return Err(invalid("border-radius must be in [0, 1]"));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(invalid("padding must be non-negative"));
        }
        if self.border_radius > 0.5 {
            tracing::debug!(
                border_radius = self.border_radius,
                "clamping border radius to half the tile"
            );
            self.border_radius = 0.5;
        }
        Ok(self)
    }
}

fn invalid(msg: &str) -> GalleryError {
    GalleryError::InvalidConfig(msg.to_string())
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            bend: Self::default_bend(),
            border_radius: Self::default_border_radius(),
            scroll_speed: Self::default_scroll_speed(),
            scroll_ease: Self::default_scroll_ease(),
            padding: Self::default_padding(),
            snap_delay: Self::default_snap_delay(),
        }
    }
}

/// Settings for the standalone gallery window.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Directory scanned recursively for images.
    pub photo_library_path: Option<PathBuf>,
    /// Explicit image files, shown before anything found in the library.
    pub images: Vec<PathBuf>,
    pub gallery: GalleryConfig,
    pub window_title: String,
    /// Longest texture edge; larger images are downscaled on decode.
    pub max_texture_dim: u32,
    /// Clear colour behind the tiles.
    pub background: [u8; 3],
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    pub fn validated(mut self) -> Result<Self> {
        ensure!(
            self.max_texture_dim >= 16,
            "max-texture-dim must be at least 16"
        );
        self.gallery = self
            .gallery
            .validated()
            .context("invalid gallery options")?;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photo_library_path: None,
            images: Vec::new(),
            gallery: GalleryConfig::default(),
            window_title: "Circular Gallery".to_string(),
            max_texture_dim: 2048,
            background: [0, 0, 0],
        }
    }
}

use thiserror::Error;

/// Construction-time failures of a gallery.
///
/// Everything after construction is either a soft per-image failure (logged,
/// never returned) or a frame-level surface hiccup handled by the renderer.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The rendering context (adapter, device or surface) is unavailable.
    #[error("engine could not initialize: {0:#}")]
    Init(anyhow::Error),

    /// A gallery option is out of range.
    #[error("invalid gallery configuration: {0}")]
    InvalidConfig(String),

    /// There is nothing to show.
    #[error("gallery playlist is empty")]
    EmptyPlaylist,
}

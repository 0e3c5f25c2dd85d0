//! Background image decoding.
//!
//! One thread walks the playlist, decodes each image to RGBA8 (EXIF
//! orientation applied, oversized images downscaled) and hands it to the
//! engine over a small bounded channel. A failed decode is logged and
//! skipped. When the engine goes away the channel closes and the thread
//! stops at its next send.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, info, warn};

/// One entry of the caller's playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub source: PathBuf,
}

impl MediaItem {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// A decoded image ready for GPU upload.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Position of the source item in the playlist.
    pub media_index: usize,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub pixels: Vec<u8>,
}

/// Start decoding `items` in playlist order.
pub fn spawn_loader(items: &[MediaItem], max_dim: u32) -> Receiver<LoadedImage> {
    let (tx, rx) = bounded::<LoadedImage>(2);
    let paths: Vec<PathBuf> = items.iter().map(|item| item.source.clone()).collect();
    let spawned = thread::Builder::new()
        .name("gallery-loader".into())
        .spawn(move || run(paths, max_dim, tx));
    if let Err(err) = spawned {
        warn!(error = %err, "failed to start image loader; tiles will stay blank");
    }
    rx
}

fn run(paths: Vec<PathBuf>, max_dim: u32, tx: Sender<LoadedImage>) {
    let total = paths.len();
    let mut loaded = 0usize;
    for (media_index, path) in paths.into_iter().enumerate() {
        match decode(&path, max_dim) {
            Ok(img) => {
                let (width, height) = img.dimensions();
                debug!(path = %path.display(), width, height, "decoded image");
                let msg = LoadedImage {
                    media_index,
                    width,
                    height,
                    pixels: img.into_raw(),
                };
                if tx.send(msg).is_err() {
                    debug!("gallery closed; stopping loader");
                    return;
                }
                loaded += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "failed to decode image");
            }
        }
    }
    info!(loaded, total, "image loader finished");
}

/// Decode to RGBA8, apply EXIF orientation and fit inside `max_dim`.
pub fn decode(path: &Path, max_dim: u32) -> Result<image::RgbaImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?;

    let img = if img.width().max(img.height()) > max_dim {
        img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let orientation = read_orientation(path).unwrap_or(1);
    Ok(apply_orientation(img.to_rgba8(), orientation))
}

fn apply_orientation(img: image::RgbaImage, orientation: u16) -> image::RgbaImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate90, rotate180, rotate270};
    match orientation {
        2 => flip_horizontal(&img),
        3 => rotate180(&img),
        4 => flip_vertical(&img),
        5 => flip_horizontal(&rotate90(&img)),
        6 => rotate90(&img),
        7 => flip_horizontal(&rotate270(&img)),
        8 => rotate270(&img),
        _ => img,
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0).map(|v| v as u16)
}

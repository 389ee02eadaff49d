use std::sync::Arc;

use bytes::Bytes;
use image::{load_from_memory_with_format, DynamicImage, GenericImageView};

use crate::config::SizingConfig;
use crate::error::ProviderError;
use crate::files::ImageKind;

#[derive(Debug)]
pub struct ResizedImage {
    pub sizing: SizingConfig,
    pub img: DynamicImage,
}

/// Decodes the source once and resizes it to every given sizing on the
/// rayon pool.
pub fn resize_to_sizes(
    kind: ImageKind,
    sizes: &[SizingConfig],
    data: &Bytes,
) -> Result<Vec<ResizedImage>, ProviderError> {
    let original = load_from_memory_with_format(data.as_ref(), kind.into()).map_err(|e| {
        ProviderError::Decode {
            format: kind,
            cause: e.into(),
        }
    })?;
    let original = Arc::new(original);

    let (tx, rx) = crossbeam::channel::bounded(sizes.len());
    for cfg in sizes {
        let cfg = *cfg;
        let local_tx = tx.clone();
        let local = original.clone();
        rayon::spawn(move || {
            let img = resize(cfg, &local);
            local_tx
                .send(ResizedImage { sizing: cfg, img })
                .expect("Failed to respond to resizing request. Sender already closed.");
        });
    }

    // Needed to prevent deadlock.
    drop(tx);

    let mut finished = Vec::with_capacity(sizes.len());
    while let Ok(resized) = rx.recv() {
        finished.push(resized);
    }

    Ok(finished)
}

/// Resizes to exactly fill the target sizing, cropping overflow while
/// preserving the aspect ratio.
///
/// Sources smaller than the target box are never enlarged: a source
/// that fits entirely inside it is returned untouched, and one that
/// only overflows on a single axis is centre-cropped on that axis at
/// its original scale.
pub fn resize(cfg: SizingConfig, img: &DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();

    if width <= cfg.width && height <= cfg.height {
        return img.clone();
    }

    if width < cfg.width || height < cfg.height {
        let crop_w = width.min(cfg.width);
        let crop_h = height.min(cfg.height);
        let x = (width - crop_w) / 2;
        let y = (height - crop_h) / 2;
        return img.crop_imm(x, y, crop_w, crop_h);
    }

    img.resize_to_fill(cfg.width, cfg.height, cfg.filter.into())
}

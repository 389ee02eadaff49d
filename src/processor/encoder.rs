use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use super::resizer::ResizedImage;
use super::{suffix_for, ImageVariant};
use crate::config::SizingConfig;
use crate::error::ProviderError;
use crate::files::ImageKind;

/// Encodes every planned (sizing, format) pair on the rayon pool.
///
/// The first failed encode fails the whole call, naming the sizing and
/// format it came from.
pub fn encode_resized(
    resized: Vec<ResizedImage>,
    plan: &[(SizingConfig, ImageKind)],
    quality: u8,
) -> Result<Vec<ImageVariant>, ProviderError> {
    let (tx, rx) = crossbeam::channel::bounded(plan.len());

    let mut spawned = 0;
    for entry in resized {
        let sizing = entry.sizing;
        let img = Arc::new(entry.img);

        for (_, kind) in plan.iter().filter(|(s, _)| *s == sizing) {
            let kind = *kind;
            let tx_local = tx.clone();
            let local = img.clone();
            spawned += 1;

            rayon::spawn(move || {
                let result = encode_to(&local, kind, quality)
                    .map(|buff| ImageVariant {
                        sizing,
                        kind,
                        suffix: suffix_for(sizing, kind),
                        buff,
                    })
                    .map_err(|cause| ProviderError::Encode {
                        width: sizing.width,
                        height: sizing.height,
                        format: kind,
                        cause,
                    });

                tx_local
                    .send(result)
                    .expect("Failed to respond to encoding request. Sender already closed.");
            });
        }
    }

    // Needed to prevent deadlock.
    drop(tx);

    let mut processed = Vec::with_capacity(spawned);
    while let Ok(encoded) = rx.recv() {
        processed.push(encoded);
    }

    processed.into_iter().collect()
}

/// Encodes a raster in the given format.
///
/// Quality applies to the lossy encoders; the PNG encoder has no
/// quality parameter.
pub fn encode_to(img: &DynamicImage, kind: ImageKind, quality: u8) -> anyhow::Result<Bytes> {
    match kind {
        ImageKind::Png => {
            let mut buff = Cursor::new(Vec::new());
            img.write_to(&mut buff, ImageFormat::Png)?;
            Ok(Bytes::from(buff.into_inner()))
        }
        ImageKind::Jpeg => {
            // JPEG has no alpha channel, flatten before encoding.
            let rgb = img.to_rgb8();
            let mut buff = Cursor::new(Vec::new());
            JpegEncoder::new_with_quality(&mut buff, quality).encode_image(&rgb)?;
            Ok(Bytes::from(buff.into_inner()))
        }
        ImageKind::Webp => {
            let rgba = img.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            let encoded = encoder.encode(quality as f32);
            Ok(Bytes::from(encoded.to_vec()))
        }
    }
}

pub mod encoder;
pub mod resizer;

use bytes::Bytes;

use crate::config::{ProviderConfig, SizingConfig};
use crate::error::ProviderError;
use crate::files::{self, ImageKind};

/// One encoded variant, ready for upload.
///
/// Only lives between generation and the store call.
pub struct ImageVariant {
    pub sizing: SizingConfig,
    pub kind: ImageKind,
    pub suffix: String,
    pub buff: Bytes,
}

impl ImageVariant {
    pub fn content_type(&self) -> &'static str {
        self.kind.as_content_type()
    }
}

/// The exact (sizing, format) combinations one upload produces for the
/// given source format.
///
/// Delete reconstructs its key set from the same plan, which keeps the
/// two sides in lockstep for any one configuration.
///
/// Sources outside the PNG/JPEG set get no source-format variant; the
/// WebP toggle applies to every decodable source.
pub fn variant_plan(
    config: &ProviderConfig,
    source: ImageKind,
) -> Vec<(SizingConfig, ImageKind)> {
    let mut plan = Vec::with_capacity(config.sizes.len() * 2);

    for sizing in &config.sizes {
        if matches!(source, ImageKind::Png | ImageKind::Jpeg) {
            plan.push((*sizing, source));
        }

        if config.webp {
            plan.push((*sizing, ImageKind::Webp));
        }
    }

    plan
}

/// Decodes the source once, resizes it to every configured sizing and
/// encodes each planned (sizing, format) pair.
///
/// Fails fast on the first decode or encode error; partially generated
/// buffers are discarded with it.
pub fn generate_variants(
    config: &ProviderConfig,
    source: ImageKind,
    data: &Bytes,
) -> Result<Vec<ImageVariant>, ProviderError> {
    let plan = variant_plan(config, source);
    if plan.is_empty() {
        return Ok(Vec::new());
    }

    let resized = resizer::resize_to_sizes(source, &config.sizes, data)?;
    encoder::encode_resized(resized, &plan, config.quality)
}

pub(crate) fn suffix_for(sizing: SizingConfig, kind: ImageKind) -> String {
    files::variant_suffix(sizing.width, sizing.height, kind)
}

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file going through the host's upload pipeline.
///
/// The host owns intake, hashing and persistence; the provider treats
/// everything here as read-only input except [`FileRecord::url`], which is
/// set once the original object has been stored.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// The raw binary content of the file.
    pub data: Bytes,

    /// The content type the host detected for the file, e.g. `image/jpeg`.
    pub content_type: String,

    /// The file extension including the leading dot, e.g. `.jpeg`.
    pub ext: String,

    /// The content hash the host computed, used as the base object key.
    pub hash: String,

    /// An optional logical folder the file lives under.
    pub path: Option<String>,

    /// The public URL of the stored original.
    ///
    /// `None` until an upload succeeds.
    pub url: Option<String>,
}

impl FileRecord {
    /// The image format this file decodes as, if it is one the
    /// provider knows how to handle.
    pub fn kind(&self) -> Option<ImageKind> {
        ImageKind::from_extension(&self.ext)
    }

    /// The key of the original object: `{path/}{hash}{ext}`.
    ///
    /// The host-supplied extension is kept verbatim.
    pub fn original_key(&self) -> String {
        format!("{}{}{}", self.key_prefix(), self.hash, self.ext)
    }

    /// The key of a derived variant: `{path/}{hash}{suffix}`.
    pub fn variant_key(&self, suffix: &str) -> String {
        format!("{}{}{}", self.key_prefix(), self.hash, suffix)
    }

    fn key_prefix(&self) -> String {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => format!("{}/", path.trim_matches('/')),
            _ => String::new(),
        }
    }
}

/// The key suffix of a variant at the given sizing: `-{width}-{height}.{ext}`.
///
/// Upload and delete both derive suffixes through here, so the two key
/// sets always agree for the same configuration.
pub fn variant_suffix(width: u32, height: u32, kind: ImageKind) -> String {
    format!("-{}-{}.{}", width, height, kind.as_file_extension())
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    pub fn variants() -> &'static [ImageKind] {
        &[Self::Png, Self::Jpeg, Self::Webp]
    }

    /// Maps a file extension (with or without the leading dot) onto a kind.
    ///
    /// Both `jpg` and `jpeg` resolve to [`ImageKind::Jpeg`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// The canonical file extension, without the leading dot.
    pub fn as_file_extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn as_content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl From<ImageKind> for image::ImageFormat {
    fn from(kind: ImageKind) -> Self {
        match kind {
            ImageKind::Png => image::ImageFormat::Png,
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
            ImageKind::Webp => image::ImageFormat::WebP,
        }
    }
}

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::anyhow;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::ProviderError;

/// The full configuration of one provider instance.
///
/// Supplied once at initialisation and immutable afterwards; upload and
/// delete both derive their key sets from it, so it must not change
/// between storing a file and removing it again.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// The access key ID used to authenticate against the store.
    pub access_key: String,

    /// The secret access key used to authenticate against the store.
    pub secret_key: String,

    /// The region the bucket lives in.
    pub region: String,

    #[serde(default)]
    /// An optional custom endpoint for S3-compatible stores
    /// (MinIO, DigitalOcean Spaces, etc...)
    pub endpoint: Option<String>,

    /// The bucket objects are stored in.
    pub bucket: String,

    #[serde(default, deserialize_with = "deserialize_sizes")]
    /// The sizings every uploaded image is duplicated into.
    ///
    /// Accepts the compact `"800x600,400x300"` convention or a
    /// structured list of `{ width, height, filter }` entries.
    pub sizes: Vec<SizingConfig>,

    #[serde(default)]
    /// Additionally encode every sizing as WebP.
    pub webp: bool,

    #[serde(default = "default_quality")]
    /// The quality handed to every lossy encoder (10 - 100).
    ///
    /// Defaults to `80`.
    pub quality: u8,
}

impl ProviderConfig {
    /// Loads a config from a YAML or JSON file, selected by extension.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&data)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&data)?),
            _ => Err(anyhow!(
                "unknown config file format, expected json or yaml"
            )),
        }
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.bucket.trim().is_empty() {
            return Err(ProviderError::Config("bucket must not be empty".to_string()));
        }

        if self.region.trim().is_empty() {
            return Err(ProviderError::Config("region must not be empty".to_string()));
        }

        if !(10..=100).contains(&self.quality) {
            return Err(ProviderError::Config(format!(
                "quality must be within 10-100, got {}",
                self.quality,
            )));
        }

        for sizing in &self.sizes {
            if sizing.width == 0 || sizing.height == 0 {
                return Err(ProviderError::Config(format!(
                    "sizing dimensions must be non-zero, got {}",
                    sizing,
                )));
            }
        }

        Ok(())
    }
}

const fn default_quality() -> u8 {
    80
}

/// A single target sizing.
///
/// Uploaded images are duplicated and resized to fill each configured
/// sizing exactly, cropping overflow.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct SizingConfig {
    /// The width to resize the image to.
    pub width: u32,

    /// The height to resize the image to.
    pub height: u32,

    /// The filter used while resizing.
    pub filter: ResizeFilter,
}

impl fmt::Display for SizingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for SizingConfig {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .trim()
            .split_once('x')
            .ok_or_else(|| ProviderError::Config(format!("expected WxH sizing, got {:?}", s)))?;

        let width = width
            .trim()
            .parse()
            .map_err(|_| ProviderError::Config(format!("invalid sizing width {:?}", width)))?;
        let height = height
            .trim()
            .parse()
            .map_err(|_| ProviderError::Config(format!("invalid sizing height {:?}", height)))?;

        Ok(Self {
            width,
            height,
            filter: ResizeFilter::default(),
        })
    }
}

impl<'de> Deserialize<'de> for SizingConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Compact(String),
            Full {
                width: u32,
                height: u32,
                #[serde(default)]
                filter: ResizeFilter,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Compact(s) => s.parse().map_err(D::Error::custom),
            Repr::Full {
                width,
                height,
                filter,
            } => Ok(Self {
                width,
                height,
                filter,
            }),
        }
    }
}

fn deserialize_sizes<'de, D>(deserializer: D) -> Result<Vec<SizingConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Compact(String),
        List(Vec<SizingConfig>),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Compact(s) => s
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| entry.parse().map_err(D::Error::custom))
            .collect(),
        Repr::List(sizes) => Ok(sizes),
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl Default for ResizeFilter {
    fn default() -> Self {
        Self::Lanczos3
    }
}

impl From<ResizeFilter> for image::imageops::FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => Self::Nearest,
            ResizeFilter::Triangle => Self::Triangle,
            ResizeFilter::CatmullRom => Self::CatmullRom,
            ResizeFilter::Gaussian => Self::Gaussian,
            ResizeFilter::Lanczos3 => Self::Lanczos3,
        }
    }
}

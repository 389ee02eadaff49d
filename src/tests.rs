use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, StorageOp};
use crate::files::FileRecord;
use crate::storage::memory::MemoryBackend;
use crate::UploadProvider;

fn setup(sizes: &[&str], webp: bool) -> (UploadProvider, MemoryBackend) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let config = ProviderConfig {
        access_key: "testing".to_string(),
        secret_key: "testing".to_string(),
        region: "us-east-1".to_string(),
        endpoint: None,
        bucket: "test-bucket".to_string(),
        sizes: sizes.iter().map(|s| s.parse().unwrap()).collect(),
        webp,
        quality: 80,
    };

    let backend = MemoryBackend::new();
    let provider = UploadProvider::with_backend(config, Arc::new(backend.clone())).unwrap();
    (provider, backend)
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 120])
    })
}

fn jpeg_fixture(width: u32, height: u32) -> Bytes {
    let mut buff = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut buff, ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(buff.into_inner())
}

fn png_fixture(width: u32, height: u32) -> Bytes {
    let mut buff = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut buff, ImageFormat::Png)
        .unwrap();
    Bytes::from(buff.into_inner())
}

fn webp_fixture(width: u32, height: u32) -> Bytes {
    let img = gradient(width, height);
    let encoded = webp::Encoder::from_rgb(img.as_raw(), width, height).encode(80.0);
    Bytes::from(encoded.to_vec())
}

fn file_record(data: Bytes, ext: &str, content_type: &str, path: Option<&str>) -> FileRecord {
    FileRecord {
        data,
        content_type: content_type.to_string(),
        ext: ext.to_string(),
        hash: "93a2cafe".to_string(),
        path: path.map(String::from),
        url: None,
    }
}

#[tokio::test]
async fn upload_stores_the_exact_key_set() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["800x600", "400x300"], true);
    let mut file = file_record(jpeg_fixture(1000, 1000), ".jpg", "image/jpeg", Some("uploads"));

    provider.upload(&mut file).await?;

    assert_eq!(
        backend.keys(),
        vec![
            "uploads/93a2cafe-400-300.jpg",
            "uploads/93a2cafe-400-300.webp",
            "uploads/93a2cafe-800-600.jpg",
            "uploads/93a2cafe-800-600.webp",
            "uploads/93a2cafe.jpg",
        ],
    );
    assert_eq!(
        file.url.as_deref(),
        Some("https://cdn.example.com/uploads/93a2cafe.jpg"),
    );

    let webp_variant = backend.get("uploads/93a2cafe-400-300.webp").unwrap();
    assert_eq!(webp_variant.content_type, "image/webp");
    let original = backend.get("uploads/93a2cafe.jpg").unwrap();
    assert_eq!(original.content_type, "image/jpeg");
    assert_eq!(original.data, file.data);

    Ok(())
}

#[tokio::test]
async fn delete_removes_exactly_what_upload_stored() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["800x600", "400x300"], true);
    let mut file = file_record(jpeg_fixture(1000, 1000), ".jpg", "image/jpeg", None);

    provider.upload(&mut file).await?;
    assert_eq!(backend.keys().len(), 5);

    provider.delete(&file).await?;
    assert!(backend.is_empty());

    Ok(())
}

#[tokio::test]
async fn variants_are_cover_fit_at_each_sizing() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["400x300"], true);
    let mut file = file_record(jpeg_fixture(1000, 1000), ".jpg", "image/jpeg", None);

    provider.upload(&mut file).await?;

    let jpeg = backend.get("93a2cafe-400-300.jpg").unwrap();
    let decoded = image::load_from_memory_with_format(&jpeg.data, ImageFormat::Jpeg)?;
    assert_eq!(decoded.dimensions(), (400, 300));

    let stored = backend.get("93a2cafe-400-300.webp").unwrap();
    let decoded = webp::Decoder::new(&stored.data).decode().unwrap();
    assert_eq!((decoded.width(), decoded.height()), (400, 300));

    Ok(())
}

#[tokio::test]
async fn small_sources_are_not_enlarged() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["400x300"], false);
    let mut file = file_record(jpeg_fixture(200, 150), ".jpg", "image/jpeg", None);

    provider.upload(&mut file).await?;

    // The key still follows the configured sizing, the raster does not.
    let stored = backend.get("93a2cafe-400-300.jpg").unwrap();
    let decoded = image::load_from_memory_with_format(&stored.data, ImageFormat::Jpeg)?;
    assert_eq!(decoded.dimensions(), (200, 150));

    Ok(())
}

#[tokio::test]
async fn failed_variant_upload_rejects_and_rolls_back() {
    let (provider, backend) = setup(&["800x600", "400x300"], true);
    backend.fail_store_on("93a2cafe-400-300.webp");
    let mut file = file_record(jpeg_fixture(1000, 1000), ".jpg", "image/jpeg", None);

    let err = provider.upload(&mut file).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Storage {
            op: StorageOp::Upload,
            ..
        }
    ));

    assert!(file.url.is_none());
    assert!(backend.is_empty());
}

#[tokio::test]
async fn failed_original_upload_rolls_back_variants() {
    let (provider, backend) = setup(&["400x300"], false);
    backend.fail_store_on("93a2cafe.jpg");
    let mut file = file_record(jpeg_fixture(1000, 1000), ".jpg", "image/jpeg", None);

    let err = provider.upload(&mut file).await.unwrap_err();
    match err {
        ProviderError::Storage { op, key, .. } => {
            assert_eq!(op, StorageOp::Upload);
            assert_eq!(key, "93a2cafe.jpg");
        }
        other => panic!("expected a storage error, got {}", other),
    }

    assert!(file.url.is_none());
    assert!(backend.is_empty());
}

#[tokio::test]
async fn deleting_missing_objects_succeeds() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["400x300"], true);
    let file = file_record(jpeg_fixture(100, 100), ".jpg", "image/jpeg", None);

    // Nothing was ever uploaded.
    provider.delete(&file).await?;
    assert!(backend.is_empty());

    Ok(())
}

#[tokio::test]
async fn unsupported_source_formats_store_only_the_original() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["800x600", "400x300"], true);
    let mut file = file_record(
        Bytes::from_static(b"<svg xmlns='http://www.w3.org/2000/svg'/>"),
        ".svg",
        "image/svg+xml",
        None,
    );

    provider.upload(&mut file).await?;
    assert_eq!(backend.keys(), vec!["93a2cafe.svg"]);
    assert_eq!(
        file.url.as_deref(),
        Some("https://cdn.example.com/93a2cafe.svg"),
    );

    provider.delete(&file).await?;
    assert!(backend.is_empty());

    Ok(())
}

#[tokio::test]
async fn jpeg_extension_normalises_variant_suffixes() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["400x300"], false);
    let mut file = file_record(jpeg_fixture(500, 500), ".jpeg", "image/jpeg", None);

    provider.upload(&mut file).await?;
    assert_eq!(
        backend.keys(),
        vec!["93a2cafe-400-300.jpg", "93a2cafe.jpeg"],
    );

    // Delete reconstructs the same normalised suffixes.
    provider.delete(&file).await?;
    assert!(backend.is_empty());

    Ok(())
}

#[tokio::test]
async fn png_sources_encode_png_variants() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["64x64"], false);
    let mut file = file_record(png_fixture(128, 128), ".png", "image/png", None);

    provider.upload(&mut file).await?;
    assert_eq!(backend.keys(), vec!["93a2cafe-64-64.png", "93a2cafe.png"]);

    let stored = backend.get("93a2cafe-64-64.png").unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(&stored.data[..8], b"\x89PNG\r\n\x1a\n");

    Ok(())
}

#[tokio::test]
async fn webp_sources_yield_webp_variants_only() -> anyhow::Result<()> {
    let (provider, backend) = setup(&["100x100"], true);
    let mut file = file_record(webp_fixture(300, 300), ".webp", "image/webp", None);

    provider.upload(&mut file).await?;
    assert_eq!(
        backend.keys(),
        vec!["93a2cafe-100-100.webp", "93a2cafe.webp"],
    );

    provider.delete(&file).await?;
    assert!(backend.is_empty());

    Ok(())
}

#[tokio::test]
async fn corrupt_sources_reject_before_anything_is_stored() {
    let (provider, backend) = setup(&["400x300"], true);
    let mut file = file_record(
        Bytes::from_static(b"not actually a jpeg"),
        ".jpg",
        "image/jpeg",
        None,
    );

    let err = provider.upload(&mut file).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode { .. }));
    assert!(file.url.is_none());
    assert!(backend.is_empty());
}

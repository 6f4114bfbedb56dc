//! Loading and decoding of map and token images.

use crate::renderer::{RenderResult, RendererError};
use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Resolves an image reference to its encoded bytes.
pub trait ImageSource {
    fn fetch(&self, reference: &str) -> RenderResult<Vec<u8>>;
}

/// Reads image references as paths relative to a root directory.
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageSource for FsImageSource {
    fn fetch(&self, reference: &str) -> RenderResult<Vec<u8>> {
        let path = self.root.join(reference);
        std::fs::read(&path)
            .map_err(|e| RendererError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }
}

/// Encoded images held in memory, keyed by reference.
#[derive(Default)]
pub struct MemoryImageSource {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(reference.into(), bytes);
    }

    pub fn remove(&mut self, reference: &str) {
        self.images.remove(reference);
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, reference: &str) -> RenderResult<Vec<u8>> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| RendererError::ImageUnavailable(reference.to_string()))
    }
}

/// Decode PNG/JPEG/WebP bytes into RGBA image data.
pub fn decode_image(bytes: &[u8]) -> RenderResult<ImageData> {
    let decoded =
        ::image::load_from_memory(bytes).map_err(|e| RendererError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageData {
        data: Blob::new(Arc::new(rgba.into_vec())),
        format: ImageFormat::Rgba8,
        width,
        height,
        alpha_type: ImageAlphaType::Alpha,
    })
}

/// How long a reference that failed to load is left alone before another try.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// A reference that could not be loaded.
struct Failure {
    attempts: u32,
    last_attempt: Instant,
}

/// Decoded images by reference.
///
/// A failed load is retried once the retry interval has passed, or on the next
/// use after [`ImageCache::invalidate`]. A reference that decoded once keeps
/// its last good image while a reload is failing.
pub struct ImageCache {
    source: Box<dyn ImageSource>,
    decoded: HashMap<String, ImageData>,
    stale: HashSet<String>,
    failures: HashMap<String, Failure>,
    retry_interval: Duration,
}

impl ImageCache {
    pub fn new(source: impl ImageSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            decoded: HashMap::new(),
            stale: HashSet::new(),
            failures: HashMap::new(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Image for `reference`, loading it if needed.
    pub fn get(&mut self, reference: &str) -> Option<ImageData> {
        let cached = self.decoded.get(reference).cloned();
        if cached.is_some() && !self.stale.contains(reference) {
            return cached;
        }
        if self
            .failures
            .get(reference)
            .is_some_and(|f| f.last_attempt.elapsed() < self.retry_interval)
        {
            return cached;
        }

        match self.source.fetch(reference).and_then(|bytes| decode_image(&bytes)) {
            Ok(image) => {
                self.stale.remove(reference);
                self.failures.remove(reference);
                self.decoded.insert(reference.to_string(), image.clone());
                Some(image)
            }
            Err(e) => {
                let now = Instant::now();
                let failure = self
                    .failures
                    .entry(reference.to_string())
                    .or_insert(Failure {
                        attempts: 0,
                        last_attempt: now,
                    });
                failure.attempts += 1;
                failure.last_attempt = now;
                if failure.attempts == 1 {
                    log::warn!("image {reference} unavailable: {e}");
                } else {
                    log::debug!(
                        "image {reference} still unavailable after {} attempts: {e}",
                        failure.attempts
                    );
                }
                cached
            }
        }
    }

    /// Reload `reference` on next use. The current image stays as a fallback.
    pub fn invalidate(&mut self, reference: &str) {
        if self.decoded.contains_key(reference) {
            self.stale.insert(reference.to_string());
        }
        self.failures.remove(reference);
    }

    pub fn is_cached(&self, reference: &str) -> bool {
        self.decoded.contains_key(reference)
    }

    pub fn clear(&mut self) {
        self.decoded.clear();
        self.stale.clear();
        self.failures.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Encode a solid-color PNG.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ::image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    /// Source whose contents can change after it's handed to a cache.
    #[derive(Clone, Default)]
    struct SharedSource(Rc<RefCell<MemoryImageSource>>);

    impl ImageSource for SharedSource {
        fn fetch(&self, reference: &str) -> RenderResult<Vec<u8>> {
            self.0.borrow().fetch(reference)
        }
    }

    #[test]
    fn test_decode_png() {
        let image = decode_image(&png_bytes(4, 3)).unwrap();
        assert_eq!((image.width, image.height), (4, 3));
        assert_eq!(image.data.data().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(RendererError::Decode(_))
        ));
    }

    #[test]
    fn test_missing_image_is_retried() {
        let source = SharedSource::default();
        let mut cache = ImageCache::new(source.clone()).with_retry_interval(Duration::ZERO);

        assert!(cache.get("goblin.png").is_none());
        assert!(!cache.is_cached("goblin.png"));

        source.0.borrow_mut().insert("goblin.png", png_bytes(2, 2));
        assert!(cache.get("goblin.png").is_some());
        assert!(cache.is_cached("goblin.png"));
    }

    #[test]
    fn test_failed_reload_keeps_last_good_image() {
        let source = SharedSource::default();
        source.0.borrow_mut().insert("map.png", png_bytes(8, 8));
        let mut cache = ImageCache::new(source.clone());
        assert_eq!(cache.get("map.png").unwrap().width, 8);

        source.0.borrow_mut().insert("map.png", b"corrupt".to_vec());
        cache.invalidate("map.png");
        assert_eq!(cache.get("map.png").unwrap().width, 8);

        source.0.borrow_mut().insert("map.png", png_bytes(16, 16));
        cache.invalidate("map.png");
        assert_eq!(cache.get("map.png").unwrap().width, 16);
    }

    /// Counts how often the cache goes to the source.
    #[derive(Clone, Default)]
    struct CountingSource(Rc<std::cell::Cell<usize>>);

    impl ImageSource for CountingSource {
        fn fetch(&self, reference: &str) -> RenderResult<Vec<u8>> {
            self.0.set(self.0.get() + 1);
            Err(RendererError::ImageUnavailable(reference.to_string()))
        }
    }

    #[test]
    fn test_failure_is_not_refetched_every_frame() {
        let source = CountingSource::default();
        let mut cache =
            ImageCache::new(source.clone()).with_retry_interval(Duration::from_secs(3600));

        for _ in 0..10 {
            assert!(cache.get("broken.png").is_none());
        }
        assert_eq!(source.0.get(), 1);

        // An explicit invalidation allows an immediate retry
        cache.invalidate("broken.png");
        assert!(cache.get("broken.png").is_none());
        assert_eq!(source.0.get(), 2);
    }

    #[test]
    fn test_fs_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("map.png"), png_bytes(5, 5)).unwrap();

        let mut cache = ImageCache::new(FsImageSource::new(dir.path()));
        assert_eq!(cache.get("map.png").unwrap().height, 5);
        assert!(cache.get("missing.png").is_none());
    }
}

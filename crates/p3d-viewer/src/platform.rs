//! Host services consumed by the viewer: assets and textures.
//!
//! Logging is not part of the adapter; the core logs through the `log`
//! facade and the host installs whichever backend it wants.

use crate::gpu::{Gpu, TextureId};
use crate::material::TextureCallback;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

pub trait PlatformAdapter {
    /// Raw bytes of a bundled asset, or `None` when it does not exist.
    fn load_asset(&mut self, path: &str) -> Option<Vec<u8>>;

    /// Starts loading the texture at `url`. `on_loaded` runs once the
    /// texture is uploaded (or failed); any texture it returns must be
    /// released by the adapter.
    fn load_texture(&mut self, url: &str, on_loaded: TextureCallback);

    fn delete_texture(&mut self, gpu: &mut dyn Gpu, texture: TextureId);

    /// Abandons every outstanding texture load. When this returns, no
    /// callback handed to `load_texture` so far will ever run.
    fn cancel_texture_loads(&mut self);

    /// Render-thread hook, called at the start of every frame. Adapters
    /// that decode off-thread finish their uploads here.
    fn poll(&mut self, _gpu: &mut dyn Gpu) {}
}

const BUILTIN_VERTEX_SHADER: &str = include_str!("../shaders/vertex.glsl");
const BUILTIN_FRAGMENT_SHADER: &str = include_str!("../shaders/fragment.glsl");

/// Shader sources compiled into the crate, keyed by their default paths.
pub fn builtin_asset(path: &str) -> Option<&'static str> {
    match path {
        "shaders/vertex.glsl" => Some(BUILTIN_VERTEX_SHADER),
        "shaders/fragment.glsl" => Some(BUILTIN_FRAGMENT_SHADER),
        _ => None,
    }
}

struct DecodedImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

struct Decoded {
    request: u64,
    result: Result<DecodedImage>,
}

/// Filesystem-backed adapter.
///
/// Assets and texture URLs are resolved under `root` (a `file://` scheme is
/// accepted). Textures are decoded on the rayon pool and uploaded on the
/// render thread in [`PlatformAdapter::poll`].
pub struct FsPlatform {
    root: PathBuf,
    next_request: u64,
    pending: HashMap<u64, TextureCallback>,
    tx: Sender<Decoded>,
    rx: Receiver<Decoded>,
}

impl FsPlatform {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            root: root.into(),
            next_request: 0,
            pending: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Texture loads requested but not yet completed.
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        if url.starts_with("http://") || url.starts_with("https://") {
            bail!("remote texture urls are not supported: {}", url);
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(self.root.join(path))
    }
}

fn decode_rgba(path: &Path) -> Result<DecodedImage> {
    let image = image::open(path)
        .with_context(|| format!("decoding texture {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba: image.into_raw(),
    })
}

impl PlatformAdapter for FsPlatform {
    fn load_asset(&mut self, path: &str) -> Option<Vec<u8>> {
        let full = self.root.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(err) => match builtin_asset(path) {
                Some(src) => {
                    log::debug!("Using built-in {} ({}: {})", path, full.display(), err);
                    Some(src.as_bytes().to_vec())
                }
                None => {
                    log::error!("Unable to load asset {}: {}", full.display(), err);
                    None
                }
            },
        }
    }

    fn load_texture(&mut self, url: &str, on_loaded: TextureCallback) {
        self.next_request += 1;
        let request = self.next_request;
        self.pending.insert(request, on_loaded);

        let tx = self.tx.clone();
        match self.resolve(url) {
            Ok(path) => rayon::spawn(move || {
                let result = decode_rgba(&path);
                // The receiver lives as long as the adapter; a send error
                // only means the adapter is gone.
                let _ = tx.send(Decoded { request, result });
            }),
            Err(err) => {
                let _ = tx.send(Decoded {
                    request,
                    result: Err(err),
                });
            }
        }
    }

    fn delete_texture(&mut self, gpu: &mut dyn Gpu, texture: TextureId) {
        gpu.delete_texture(texture);
    }

    fn cancel_texture_loads(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelling {} texture loads", self.pending.len());
        }
        // Decodes still running will find no callback and are discarded
        // before anything reaches the GPU.
        self.pending.clear();
    }

    fn poll(&mut self, gpu: &mut dyn Gpu) {
        while let Ok(decoded) = self.rx.try_recv() {
            let Some(on_loaded) = self.pending.remove(&decoded.request) else {
                continue;
            };
            let texture = match decoded.result {
                Ok(image) => gpu.create_texture_rgba8(image.width, image.height, &image.rgba),
                Err(err) => {
                    log::error!("Texture load failed: {:#}", err);
                    None
                }
            };
            if let Some(release) = on_loaded(texture) {
                gpu.delete_texture(release);
            }
        }
    }
}

//! The host-facing viewer: surface lifecycle, model loading, material
//! properties and camera gestures over one GPU context.

use crate::{
    camera::OrbitCamera,
    config::ViewerConfig,
    error::LoadError,
    gpu::Gpu,
    material::{MaterialProperty, MaterialStore, MaterialUpdate},
    model::ModelLoader,
    platform::PlatformAdapter,
    renderer::{Renderer, Scene},
};

/// Owns everything that lives on the render thread.
///
/// All methods must be called from the thread owning the GPU context.
pub struct Viewer<G: Gpu, P: PlatformAdapter> {
    gpu: G,
    platform: P,
    model: Box<dyn ModelLoader>,
    materials: MaterialStore,
    camera: OrbitCamera,
    renderer: Renderer,
    width: u32,
    height: u32,
    url_prefix: String,
    config: ViewerConfig,
}

impl<G: Gpu, P: PlatformAdapter> Viewer<G, P> {
    pub fn new(gpu: G, platform: P, model: impl ModelLoader + 'static) -> Self {
        Self::with_config(gpu, platform, model, ViewerConfig::default())
    }

    pub fn with_config(
        gpu: G,
        platform: P,
        model: impl ModelLoader + 'static,
        config: ViewerConfig,
    ) -> Self {
        Self {
            gpu,
            platform,
            model: Box::new(model),
            materials: MaterialStore::new(),
            camera: OrbitCamera::new(config.camera.clone()),
            renderer: Renderer::new(),
            width: 0,
            height: 0,
            url_prefix: String::new(),
            config,
        }
    }

    // --- Surface ---

    /// Builds the shader programs for a new GPU context. Calling it again
    /// after a context loss releases the previous programs first.
    pub fn on_surface_created(&mut self) {
        self.renderer
            .on_surface_created(&mut self.gpu, &mut self.platform, &self.config);
        log::debug!("Surface created, depth buffer: {} bits", self.gpu.depth_bits());
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        log::debug!("Surface changed to {}x{}", width, height);
        self.width = width;
        self.height = height;
    }

    pub fn draw_frame(&mut self) {
        self.platform.poll(&mut self.gpu);
        let scene = Scene {
            model: self.model.as_ref(),
            materials: &self.materials,
            camera: &self.camera,
            width: self.width,
            height: self.height,
        };
        self.renderer.draw_frame(&mut self.gpu, &scene, &self.config);
    }

    // --- Model ---

    /// Replaces the current model. An unsupported `format_hint` fails
    /// without touching the loaded model.
    pub fn load_model(&mut self, bytes: &[u8], format_hint: &str) -> Result<(), LoadError> {
        if !self.model.supports(format_hint) {
            log::warn!("Unsupported model format '{}'", format_hint);
            return Err(LoadError::UnsupportedFormat(format_hint.to_owned()));
        }

        self.clear_model();
        if let Err(err) = self.model.load(&mut self.gpu, bytes, format_hint) {
            log::error!("Failed to load model: {}", err);
            return Err(err);
        }

        let material_count = self.model.material_count();
        let radius = self.model.bounding_radius();
        self.materials.ensure_count(material_count);
        self.camera.set_bounding_radius(radius);
        self.camera.reset();
        log::debug!(
            "Loaded model: {} chunks, {} materials, bounding radius {}",
            self.model.chunks().len(),
            material_count,
            radius
        );
        Ok(())
    }

    /// Unloads the model and releases every texture its materials hold.
    pub fn clear_model(&mut self) {
        // No completion may land once materials are gone.
        self.platform.cancel_texture_loads();
        for texture in self.materials.clear() {
            self.platform.delete_texture(&mut self.gpu, texture);
        }
        self.model.clear(&mut self.gpu);
    }

    /// Prefix prepended to every texture URL from now on.
    pub fn set_url_prefix(&mut self, prefix: &str) {
        self.url_prefix = prefix.to_owned();
    }

    /// String-typed material update. Unknown names and indices beyond the
    /// model's material count are ignored.
    pub fn set_material_property(&mut self, index: usize, name: &str, value: &str) {
        if index >= self.model.material_count() {
            log::debug!("Ignoring {} for material {} (out of range)", name, index);
            return;
        }
        let Some(property) = MaterialProperty::from_name(name) else {
            log::debug!("Ignoring unknown material property {}", name);
            return;
        };

        log::trace!("Material {}: {} = {}", index, name, value);
        let update = property.parse(value);
        let url = match &update {
            MaterialUpdate::Texture(_, path) => Some(format!("{}{}", self.url_prefix, path)),
            _ => None,
        };
        if let (Some(on_loaded), Some(url)) = (self.materials.apply(index, update), url) {
            self.platform.load_texture(&url, on_loaded);
        }
    }

    // --- Camera ---

    pub fn start_rotate_camera(&mut self, x: f32, y: f32) {
        self.camera.start_rotate(x, y);
    }

    pub fn rotate_camera(&mut self, x: f32, y: f32) {
        self.camera.rotate(x, y);
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    pub fn zoom_camera(&mut self, factor: f32) {
        self.camera.zoom(factor);
    }

    // --- Accessors ---

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn model(&self) -> &dyn ModelLoader {
        self.model.as_ref()
    }

    pub fn materials(&self) -> &MaterialStore {
        &self.materials
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<G: Gpu, P: PlatformAdapter> Drop for Viewer<G, P> {
    fn drop(&mut self) {
        self.clear_model();
        self.renderer.release(&mut self.gpu);
    }
}

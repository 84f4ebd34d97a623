//! Per-material shading parameters, grown lazily as a model declares them.
//!
//! Texture handles arrive asynchronously from the platform adapter. Each
//! material owns its texture slots through an `Arc`, and completion
//! callbacks capture that `Arc` rather than a position in the store, so a
//! late completion can never write into freed or moved memory.

use crate::gpu::TextureId;
use glam::Vec3;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Slot value marking a material that has been cleared.
const DETACHED: u32 = u32::MAX;

/// Completion handler passed to the platform adapter for one texture load.
///
/// Called with the uploaded texture (`None` if loading failed). Returns a
/// texture the adapter must release: the handle it displaced, or the new
/// handle itself when the material is gone.
pub type TextureCallback = Box<dyn FnOnce(Option<TextureId>) -> Option<TextureId> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

/// One atomically updated texture handle.
#[derive(Debug, Default)]
struct TextureSlot(AtomicU32);

impl TextureSlot {
    fn get(&self) -> Option<TextureId> {
        match self.0.load(Ordering::Acquire) {
            DETACHED => None,
            raw => TextureId::new(raw),
        }
    }

    /// Stores `texture` and returns whatever the caller now has to release.
    fn store(&self, texture: Option<TextureId>) -> Option<TextureId> {
        let new = texture.map_or(0, TextureId::get);
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current == DETACHED {
                return texture;
            }
            match self
                .0
                .compare_exchange_weak(current, new, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(old) => return TextureId::new(old).filter(|old| Some(*old) != texture),
                Err(actual) => current = actual,
            }
        }
    }

    /// Detaches the slot and hands back the handle it held.
    fn detach(&self) -> Option<TextureId> {
        match self.0.swap(DETACHED, Ordering::AcqRel) {
            DETACHED => None,
            raw => TextureId::new(raw),
        }
    }
}

#[derive(Debug, Default)]
struct MaterialTextures {
    diffuse: TextureSlot,
    specular: TextureSlot,
}

impl MaterialTextures {
    fn slot(&self, kind: TextureKind) -> &TextureSlot {
        match kind {
            TextureKind::Diffuse => &self.diffuse,
            TextureKind::Specular => &self.specular,
        }
    }
}

#[derive(Debug)]
pub struct Material {
    pub diff_col: Vec3,
    pub diff_str: f32,
    pub diff_tex_str: f32,
    pub spec_col: Vec3,
    pub spec_str: f32,
    /// Normalised shininess; uploaded as `spec_shininess * 255`.
    pub spec_shininess: f32,
    textures: Arc<MaterialTextures>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diff_col: Vec3::ONE,
            diff_str: 0.8,
            diff_tex_str: 1.0,
            spec_col: Vec3::ONE,
            spec_str: 0.25,
            spec_shininess: 0.2,
            textures: Arc::default(),
        }
    }
}

impl Material {
    pub fn diffuse_texture(&self) -> Option<TextureId> {
        self.textures.diffuse.get()
    }

    pub fn specular_texture(&self) -> Option<TextureId> {
        self.textures.specular.get()
    }

    /// Diffuse color scaled by the texture strength when a diffuse texture
    /// is in use, by the flat strength otherwise.
    pub fn diffuse_color(&self, textured: bool) -> Vec3 {
        if textured {
            self.diff_col * self.diff_tex_str
        } else {
            self.diff_col * self.diff_str
        }
    }

    pub fn specular_color(&self) -> Vec3 {
        self.spec_col * self.spec_str
    }

    /// Completion callback writing into this material's `kind` slot.
    pub fn texture_callback(&self, kind: TextureKind) -> TextureCallback {
        let textures = Arc::clone(&self.textures);
        Box::new(move |texture| textures.slot(kind).store(texture))
    }
}

/// Recognised `set_material_property` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialProperty {
    DiffuseTexture,
    DiffuseColor,
    DiffuseStrength,
    DiffuseTextureStrength,
    SpecularTexture,
    SpecularColor,
    SpecularStrength,
    SpecularShininess,
}

impl MaterialProperty {
    /// Maps an external property name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "diffuseTexture" => Self::DiffuseTexture,
            "diff_col" => Self::DiffuseColor,
            "diff_str" => Self::DiffuseStrength,
            "diff_tex_str" => Self::DiffuseTextureStrength,
            "specTexture" => Self::SpecularTexture,
            "spec_col" => Self::SpecularColor,
            "spec_str" => Self::SpecularStrength,
            "spec_shininess" => Self::SpecularShininess,
            _ => return None,
        })
    }

    /// Parses `value` with this property's parser.
    pub fn parse(self, value: &str) -> MaterialUpdate {
        match self {
            Self::DiffuseTexture => MaterialUpdate::Texture(TextureKind::Diffuse, value.to_owned()),
            Self::SpecularTexture => {
                MaterialUpdate::Texture(TextureKind::Specular, value.to_owned())
            }
            Self::DiffuseColor | Self::SpecularColor => MaterialUpdate::Color(self, parse_color(value)),
            Self::DiffuseStrength
            | Self::DiffuseTextureStrength
            | Self::SpecularStrength
            | Self::SpecularShininess => MaterialUpdate::Scalar(self, parse_decimal(value)),
        }
    }
}

/// A parsed property write.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialUpdate {
    /// Texture URL (not yet prefixed) for the given slot.
    Texture(TextureKind, String),
    Color(MaterialProperty, Vec3),
    Scalar(MaterialProperty, f32),
}

/// Parses `rgb` or `rrggbb` hex into a normalised color.
///
/// Three digits expand each nibble `x` to `x | x << 4`. Anything else goes
/// through the six-digit path; only the leading hex digits are read.
pub fn parse_color(value: &str) -> Vec3 {
    let digits = value.trim_start();
    let end = digits
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(digits.len());
    let raw = u32::from_str_radix(&digits[..end.min(8)], 16).unwrap_or(0);

    let (r, g, b) = if digits.len() == 3 {
        let expand = |nibble: u32| nibble | nibble << 4;
        (
            expand((raw & 0xf00) >> 8),
            expand((raw & 0xf0) >> 4),
            expand(raw & 0xf),
        )
    } else {
        ((raw & 0xff0000) >> 16, (raw & 0xff00) >> 8, raw & 0xff)
    };
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Decimal parse with C `atof` leniency: the longest numeric prefix wins,
/// no number at all reads as `0`.
pub fn parse_decimal(value: &str) -> f32 {
    let value = value.trim();
    if let Ok(v) = value.parse::<f32>() {
        return v;
    }
    (1..value.len())
        .rev()
        .filter(|&end| value.is_char_boundary(end))
        .find_map(|end| value[..end].parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// Materials indexed by the model's material numbers.
#[derive(Debug, Default)]
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Grows to at least `count` default entries. Never shrinks.
    pub fn ensure_count(&mut self, count: usize) {
        if self.materials.len() < count {
            self.materials.resize_with(count, Material::default);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Applies a parsed update to the material at `index`.
    ///
    /// Out-of-range indices are ignored. A texture update returns the
    /// callback the platform adapter should complete.
    pub fn apply(&mut self, index: usize, update: MaterialUpdate) -> Option<TextureCallback> {
        let material = self.materials.get_mut(index)?;
        match update {
            MaterialUpdate::Texture(kind, _) => return Some(material.texture_callback(kind)),
            MaterialUpdate::Color(MaterialProperty::DiffuseColor, color) => material.diff_col = color,
            MaterialUpdate::Color(_, color) => material.spec_col = color,
            MaterialUpdate::Scalar(property, value) => match property {
                MaterialProperty::DiffuseStrength => material.diff_str = value,
                MaterialProperty::DiffuseTextureStrength => material.diff_tex_str = value,
                MaterialProperty::SpecularStrength => material.spec_str = value,
                MaterialProperty::SpecularShininess => material.spec_shininess = value,
                _ => {}
            },
        }
        None
    }

    /// Drops every material and returns the textures they held, each
    /// exactly once. Callbacks still in flight see a detached slot and hand
    /// their texture back to the adapter instead.
    #[must_use = "returned textures must be released"]
    pub fn clear(&mut self) -> Vec<TextureId> {
        let mut released = Vec::new();
        for material in self.materials.drain(..) {
            released.extend(material.textures.diffuse.detach());
            released.extend(material.textures.specular.detach());
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(raw: u32) -> Option<TextureId> {
        TextureId::new(raw)
    }

    #[test]
    fn parses_six_digit_colors() {
        assert_eq!(parse_color("ff0000"), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(parse_color("00ff00"), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(parse_color("336699"), Vec3::new(51.0, 102.0, 153.0) / 255.0);
    }

    #[test]
    fn three_digit_colors_match_their_six_digit_form() {
        assert_eq!(parse_color("f00"), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(parse_color(" f00"), Vec3::new(1.0, 0.0, 0.0));
        for n in 0..16u32 {
            let d = std::char::from_digit(n, 16).unwrap();
            let short: String = [d, d, d].iter().collect();
            let long: String = [d; 6].iter().collect();
            assert_eq!(parse_color(&short), parse_color(&long), "nibble {d}");
        }
    }

    #[test]
    fn decimals_parse_like_atof() {
        assert_eq!(parse_decimal("0.75"), 0.75);
        assert_eq!(parse_decimal(" 2 "), 2.0);
        assert_eq!(parse_decimal("1.5abc"), 1.5);
        assert_eq!(parse_decimal("abc"), 0.0);
        assert_eq!(parse_decimal(""), 0.0);
    }

    #[test]
    fn unknown_property_names_are_not_recognised() {
        assert_eq!(MaterialProperty::from_name("diff_col"), Some(MaterialProperty::DiffuseColor));
        assert_eq!(MaterialProperty::from_name("emissive"), None);
        assert_eq!(MaterialProperty::from_name("DIFF_COL"), None);
    }

    #[test]
    fn ensure_count_is_idempotent() {
        let mut store = MaterialStore::new();
        store.ensure_count(3);
        store.apply(1, MaterialProperty::DiffuseStrength.parse("0.5"));
        store.ensure_count(3);
        store.ensure_count(2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).unwrap().diff_str, 0.5);
        store.ensure_count(5);
        assert_eq!(store.len(), 5);
        assert_eq!(store.get(1).unwrap().diff_str, 0.5);
    }

    #[test]
    fn out_of_range_updates_are_ignored() {
        let mut store = MaterialStore::new();
        store.ensure_count(1);
        let cb = store.apply(4, MaterialProperty::DiffuseTexture.parse("a.png"));
        assert!(cb.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn diffuse_scalings_are_exclusive() {
        let material = Material {
            diff_col: Vec3::new(1.0, 0.5, 0.0),
            diff_str: 0.5,
            diff_tex_str: 2.0,
            ..Material::default()
        };
        assert_eq!(material.diffuse_color(false), Vec3::new(0.5, 0.25, 0.0));
        assert_eq!(material.diffuse_color(true), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn callback_survives_store_growth() {
        let mut store = MaterialStore::new();
        store.ensure_count(1);
        let cb = store
            .apply(0, MaterialProperty::SpecularTexture.parse("spec.png"))
            .unwrap();
        store.ensure_count(1000);

        assert_eq!(cb(tex(9)), None);
        assert_eq!(store.get(0).unwrap().specular_texture(), tex(9));
        assert_eq!(store.get(0).unwrap().diffuse_texture(), None);
    }

    #[test]
    fn replacing_a_texture_releases_the_old_one() {
        let mut store = MaterialStore::new();
        store.ensure_count(1);
        let first = store.apply(0, MaterialProperty::DiffuseTexture.parse("a.png")).unwrap();
        let second = store.apply(0, MaterialProperty::DiffuseTexture.parse("b.png")).unwrap();
        assert_eq!(first(tex(3)), None);
        assert_eq!(second(tex(4)), tex(3));
        assert_eq!(store.clear(), vec![TextureId::new(4).unwrap()]);
    }

    #[test]
    fn late_completion_after_clear_is_handed_back() {
        let mut store = MaterialStore::new();
        store.ensure_count(2);
        let held = store.apply(0, MaterialProperty::DiffuseTexture.parse("a.png")).unwrap();
        let late = store.apply(1, MaterialProperty::SpecularTexture.parse("b.png")).unwrap();
        assert_eq!(held(tex(5)), None);

        let released = store.clear();
        assert_eq!(released, vec![TextureId::new(5).unwrap()]);
        assert!(store.is_empty());

        assert_eq!(late(tex(6)), tex(6));
    }
}

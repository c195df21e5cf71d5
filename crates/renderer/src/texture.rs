//! Texture resource: a BGR8 raster uploaded to the GPU, bound to sampler slots.

use std::rc::Rc;

use asset::RasterImage;

use crate::{
    device::GraphicsDevice,
    error::TextureError,
    shader::ShaderProgram,
};

/// Sampling filter. The mipmapped variants only affect minification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    #[default]
    LinearMipmapLinear,
}

impl FilterMode {
    /// Every mode except plain nearest-neighbour gets a mipmap chain.
    pub fn needs_mipmaps(self) -> bool {
        self != FilterMode::Nearest
    }

    /// Magnification never samples mip levels; reduce to nearest or linear.
    pub fn magnification(self) -> FilterMode {
        match self {
            FilterMode::Nearest
            | FilterMode::NearestMipmapNearest
            | FilterMode::NearestMipmapLinear => FilterMode::Nearest,
            FilterMode::Linear
            | FilterMode::LinearMipmapNearest
            | FilterMode::LinearMipmapLinear => FilterMode::Linear,
        }
    }
}

/// Edge sampling policy, applied to both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    #[default]
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// A GPU texture with its dimensions and the slot it was last activated on.
pub struct Texture<D: GraphicsDevice> {
    device: Rc<D>,
    texture: D::Texture,
    width: u32,
    height: u32,
    filter: FilterMode,
    wrap: WrapMode,
    slot: Option<u32>,
}

impl<D: GraphicsDevice> Texture<D> {
    /// Upload `image` and configure sampling. The host pixel buffer is dropped
    /// once the driver has copied it.
    pub fn create(
        device: Rc<D>,
        image: RasterImage,
        filter: FilterMode,
        wrap: WrapMode,
    ) -> Result<Self, TextureError> {
        let texture = device.create_texture()?;
        let (width, height) = (image.width(), image.height());

        device.upload_texture_bgr8(texture, width, height, image.pixels());
        drop(image);
        device.set_texture_sampling(texture, filter, wrap);
        if filter.needs_mipmaps() {
            device.generate_mipmaps(texture);
        }

        log::info!(
            "Uploaded texture {}x{} ({:?}, {:?})",
            width,
            height,
            filter,
            wrap
        );

        Ok(Self {
            device,
            texture,
            width,
            height,
            filter,
            wrap,
            slot: None,
        })
    }

    /// Make this texture the binding of unit `slot` and remember the slot.
    pub fn activate(&mut self, slot: u32) -> Result<(), TextureError> {
        let available = self.device.max_texture_units();
        if slot >= available {
            return Err(TextureError::SlotOutOfRange { slot, available });
        }
        self.device.bind_texture_unit(slot, Some(self.texture));
        self.slot = Some(slot);
        Ok(())
    }

    /// Point sampler uniform `sampler` of `program` at the active slot.
    /// Returns `false` if the program has no such active uniform.
    pub fn bind_sampler(
        &self,
        program: &ShaderProgram<D>,
        sampler: &str,
    ) -> Result<bool, TextureError> {
        let slot = self.slot.ok_or(TextureError::NotActivated)?;
        Ok(program.set_i32(sampler, slot as i32))
    }

    /// [`activate`](Self::activate) then [`bind_sampler`](Self::bind_sampler).
    pub fn bind(
        &mut self,
        slot: u32,
        program: &ShaderProgram<D>,
        sampler: &str,
    ) -> Result<bool, TextureError> {
        self.activate(slot)?;
        self.bind_sampler(program, sampler)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    pub fn slot(&self) -> Option<u32> {
        self.slot
    }

    pub fn id(&self) -> D::Texture {
        self.texture
    }
}

impl<D: GraphicsDevice> Drop for Texture<D> {
    fn drop(&mut self) {
        self.device.delete_texture(self.texture);
    }
}

/// Which texture feeds which sampler uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerBinding<'a> {
    pub texture: &'a str,
    pub sampler: &'a str,
}

impl<'a> SamplerBinding<'a> {
    pub const fn new(texture: &'a str, sampler: &'a str) -> Self {
        Self { texture, sampler }
    }
}

/// Textures owned by logical name.
pub struct TextureSet<D: GraphicsDevice> {
    entries: Vec<(String, Texture<D>)>,
}

impl<D: GraphicsDevice> Default for TextureSet<D> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<D: GraphicsDevice> TextureSet<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the texture previously stored under `name`.
    pub fn insert(&mut self, name: impl Into<String>, texture: Texture<D>) -> Option<Texture<D>> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, texture)),
            None => {
                self.entries.push((name, texture));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Texture<D>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Texture<D>> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activate each binding's texture on the slot equal to its position in
    /// `bindings` and point the sampler uniform at it. The program must be bound.
    pub fn bind_all(
        &mut self,
        program: &ShaderProgram<D>,
        bindings: &[SamplerBinding<'_>],
    ) -> Result<(), TextureError> {
        for (slot, binding) in bindings.iter().enumerate() {
            let texture = self
                .get_mut(binding.texture)
                .ok_or_else(|| TextureError::Unknown(binding.texture.to_string()))?;
            if !texture.bind(slot as u32, program, binding.sampler)? {
                log::trace!("Sampler '{}' unused by program", binding.sampler);
            }
        }
        Ok(())
    }
}

//! Per-frame rendering toggles.

use tessera_config::RenderConfig;
use tessera_resources::TextureType;

/// What the renderer binds and how tiles are drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderingOptions {
    pub wireframe: bool,
    pub texture_enabled: bool,
    pub night_enabled: bool,
    pub terrain_enabled: bool,
    /// Draw tiles whose day texture has no resident substitute yet.
    pub draw_untextured: bool,
}

impl Default for RenderingOptions {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for RenderingOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            wireframe: config.wireframe,
            texture_enabled: config.texture_enabled,
            night_enabled: config.night_enabled,
            terrain_enabled: config.terrain_enabled,
            draw_untextured: config.draw_untextured,
        }
    }
}

impl RenderingOptions {
    pub fn is_enabled(&self, texture_type: TextureType) -> bool {
        match texture_type {
            TextureType::Day => self.texture_enabled,
            TextureType::Night => self.night_enabled,
            TextureType::HeightMap => self.terrain_enabled,
        }
    }

    /// Texture layers to resolve and stream, in [`TextureType::ALL`] order.
    pub fn texture_types(&self) -> impl Iterator<Item = TextureType> + '_ {
        TextureType::ALL.into_iter().filter(move |&ty| self.is_enabled(ty))
    }
}

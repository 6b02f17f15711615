//! wgpu implementation of [`TextureBackend`].
//!
//! Every upload becomes its own 2D texture with a view and a ready-to-bind
//! [`wgpu::BindGroup`], keyed by [`TextureId`]. The draw code looks bind
//! groups up with [`WgpuTextureBackend::get`].

use rustc_hash::FxHashMap;
use tessera_resources::{DecodedImage, TextureBackend, TextureId};
use tessera_tiling::TileMesh;
use wgpu::util::DeviceExt;

use crate::uniforms::TileVertex;

/// Tile textures are sRGB colour imagery with four channels.
pub const TILE_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A tile texture resident on the GPU.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    pub dimensions: (u32, u32),
}

/// Errors that can occur while uploading a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(
        "texture data size ({actual}) does not match expected ({expected}) for {width}x{height}"
    )]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("texture has {channels} channels, only RGBA8 is supported")]
    UnsupportedChannels { channels: u8 },

    #[error("texture {width}x{height} exceeds the device limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },
}

/// Owns the device handles and every uploaded tile texture.
pub struct WgpuTextureBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    textures: FxHashMap<TextureId, GpuTexture>,
}

impl WgpuTextureBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tile-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tile-texture-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            device,
            queue,
            sampler,
            bind_group_layout,
            textures: FxHashMap::default(),
        }
    }

    /// Layout every tile texture bind group is created with.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn get(&self, id: TextureId) -> Option<&GpuTexture> {
        self.textures.get(&id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Upload a tile mesh as a vertex buffer.
    pub fn upload_mesh(&self, mesh: &TileMesh) -> wgpu::Buffer {
        let vertices = TileVertex::from_mesh(mesh);
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tile-vertex-buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
    }

    fn create(&self, id: TextureId, image: &DecodedImage) -> Result<GpuTexture, TextureError> {
        validate(image, self.device.limits().max_texture_dimension_2d)?;
        let (width, height) = (image.width, image.height);
        let label = id.to_string();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TILE_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * u32::from(image.channels)),
                rows_per_image: None,
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        Ok(GpuTexture {
            texture,
            view,
            bind_group,
            dimensions: (width, height),
        })
    }
}

impl TextureBackend for WgpuTextureBackend {
    type Error = TextureError;

    fn check(&self, image: &DecodedImage) -> Result<(), TextureError> {
        validate(image, self.device.limits().max_texture_dimension_2d)
    }

    fn upload(&mut self, id: TextureId, image: &DecodedImage) -> Result<(), TextureError> {
        let texture = self.create(id, image)?;
        tracing::trace!(%id, width = image.width, height = image.height, "texture uploaded");
        self.textures.insert(id, texture);
        Ok(())
    }

    fn release(&mut self, id: TextureId) {
        if let Some(gpu) = self.textures.remove(&id) {
            gpu.texture.destroy();
        }
    }
}

fn validate(image: &DecodedImage, limit: u32) -> Result<(), TextureError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    if width > limit || height > limit {
        return Err(TextureError::TooLarge {
            width,
            height,
            limit,
        });
    }
    if image.channels != 4 {
        return Err(TextureError::UnsupportedChannels {
            channels: image.channels,
        });
    }
    if image.pixels.len() != image.expected_len() {
        return Err(TextureError::DataSizeMismatch {
            actual: image.pixels.len(),
            expected: image.expected_len(),
            width,
            height,
        });
    }
    Ok(())
}

/// Ask for any adapter and a default device. Returns `None` when no GPU (or
/// software fallback) is available.
pub fn request_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tessera-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: Default::default(),
                ..Default::default()
            })
            .await
            .ok()
    })
}

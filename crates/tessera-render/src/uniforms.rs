//! GPU-facing layouts for tile meshes and per-draw parameters.

use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DVec3};
use tessera_geo::GeoRect;
use tessera_tiling::TileMesh;

use crate::renderer::{TextureBinding, TileDrawCommand};

/// Per-frame shader constants, narrowed to `f32`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Unit direction towards the light in `xyz`; `w` is 1 when lit and 0
    /// when the night layer should stay off.
    pub light_direction: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_projection: &DMat4, light_direction: Option<DVec3>) -> Self {
        let light_direction = match light_direction {
            Some(direction) => direction.as_vec3().extend(1.0).to_array(),
            None => [0.0; 4],
        };
        Self {
            view_proj: view_projection.as_mat4().to_cols_array_2d(),
            light_direction,
        }
    }
}

/// One mesh vertex. For [`tessera_tiling::UnitGridTesselator`] meshes this
/// is `(u, v, 0)` inside the tile, otherwise a geocentric position.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TileVertex {
    pub position: [f32; 3],
}

impl TileVertex {
    pub fn from_mesh(mesh: &TileMesh) -> Vec<Self> {
        mesh.positions
            .iter()
            .map(|p| Self {
                position: p.to_array(),
            })
            .collect()
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TileVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Where `tile` sits inside a texture covering `footprint`, as
/// `[u_offset, v_offset, u_scale, v_scale]`.
///
/// Row 0 of an atlas image is its northern edge, so `v` is measured
/// southwards from the footprint's north edge. A unit-grid vertex `(s, t)`
/// samples at `(u_offset + s * u_scale, v_offset + (1 - t) * v_scale)`.
pub fn texture_window(tile: &GeoRect, footprint: &GeoRect) -> [f32; 4] {
    [
        ((tile.longitude - footprint.longitude) / footprint.longitude_width) as f32,
        ((footprint.north() - tile.north()) / footprint.latitude_width) as f32,
        (tile.longitude_width / footprint.longitude_width) as f32,
        (tile.latitude_width / footprint.latitude_width) as f32,
    ]
}

/// Per-draw uniform for one [`TileDrawCommand`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TileUniform {
    /// West and south edge in degrees.
    pub tile_origin: [f32; 2],
    /// Longitude and latitude span in degrees.
    pub tile_size: [f32; 2],
    pub day_window: [f32; 4],
    pub night_window: [f32; 4],
    pub height_window: [f32; 4],
    /// Non-zero where the day, night and height layer are bound.
    pub bound_layers: [u32; 4],
}

impl TileUniform {
    pub fn from_command(command: &TileDrawCommand) -> Self {
        let rect = &command.tile_rect;
        let window = |binding: Option<TextureBinding>| {
            binding.map_or([0.0; 4], |b| texture_window(rect, &b.footprint))
        };
        Self {
            tile_origin: [rect.longitude as f32, rect.latitude as f32],
            tile_size: [rect.longitude_width as f32, rect.latitude_width as f32],
            day_window: window(command.day),
            night_window: window(command.night),
            height_window: window(command.height),
            bound_layers: [
                u32::from(command.day.is_some()),
                u32::from(command.night.is_some()),
                u32::from(command.height.is_some()),
                0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tessera_geo::Resolution;
    use tessera_resources::TextureId;

    use super::*;
    use crate::renderer::BindingSource;

    fn approx(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<TileVertex>(), 12);
        assert_eq!(std::mem::size_of::<TileUniform>(), 80);
        assert_eq!(TileVertex::layout().array_stride, 12);
    }

    #[test]
    fn test_camera_uniform_flags_light() {
        let lit = CameraUniform::new(&DMat4::IDENTITY, Some(DVec3::Y));
        assert_eq!(lit.light_direction, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(lit.view_proj[0], [1.0, 0.0, 0.0, 0.0]);

        let unlit = CameraUniform::new(&DMat4::IDENTITY, None);
        assert_eq!(unlit.light_direction, [0.0; 4]);
    }

    #[test]
    fn test_texture_window_inside_footprint() {
        let tile = GeoRect::new(90.0, 0.0, 10.0, 10.0);
        let footprint = GeoRect::new(0.0, 0.0, 180.0, 90.0);
        let window = texture_window(&tile, &footprint);
        assert!(approx(window, [0.5, 80.0 / 90.0, 10.0 / 180.0, 10.0 / 90.0]));
    }

    #[test]
    fn test_texture_window_of_identical_rects_is_identity() {
        let rect = GeoRect::new(-180.0, -90.0, 90.0, 45.0);
        assert!(approx(texture_window(&rect, &rect), [0.0, 0.0, 1.0, 1.0]));
    }

    #[test]
    fn test_tile_uniform_marks_bound_layers() {
        let rect = GeoRect::new(90.0, 0.0, 10.0, 10.0);
        let command = TileDrawCommand {
            tile_index: 0,
            level: 1,
            mesh: Arc::new(TileMesh {
                resolution: Resolution::new(2, 2),
                positions: Vec::new(),
            }),
            tile_rect: rect,
            day: Some(TextureBinding {
                id: TextureId(3),
                footprint: GeoRect::new(0.0, 0.0, 180.0, 90.0),
                source: BindingSource::Coarser,
            }),
            night: None,
            height: None,
        };
        let uniform = TileUniform::from_command(&command);
        assert_eq!(uniform.bound_layers, [1, 0, 0, 0]);
        assert_eq!(uniform.tile_origin, [90.0, 0.0]);
        assert_eq!(uniform.night_window, [0.0; 4]);
        assert!((uniform.day_window[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_vertices_copy_mesh_positions() {
        let mesh = TileMesh {
            resolution: Resolution::new(2, 2),
            positions: vec![glam::Vec3::new(1.0, 2.0, 3.0); 6],
        };
        let vertices = TileVertex::from_mesh(&mesh);
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 6 * 12);
    }
}

//! Displacement of a flat base mesh by a composited noise grid.
//!
//! The base mesh fixes the x/z topology; this pass overwrites y from the
//! sampled height, derives a per-vertex normal, and encodes the height
//! into the s texture coordinate for a 1D color-ramp lookup. Output is
//! flat, positionally aligned arrays ready for GPU upload.

use glam::Vec3;

use crate::config::{DisplaceParams, NoiseParams};
use crate::grid::{NoiseGrid, HEIGHT_SENTINEL};
use crate::sample::{estimate_normal, sample_height, MeshBounds};

/// Vertex arrays produced by a displacement pass, index-aligned with the
/// base mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplacedMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
}

impl DisplacedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Raw bytes of the position array, ready for a vertex buffer.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn texcoord_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texcoords)
    }
}

/// Displace every vertex of the base mesh by the height grid.
///
/// x and z are preserved from the input; y becomes
/// `height * height_scale - sea_level`. The s texture coordinate is the
/// output height normalized by the run's total amplitude (times the same
/// vertical scale) and clamped off the ramp ends; t is pinned to 0.5
/// because the ramp texture is one-dimensional.
///
/// A non-finite sample is replaced by [`HEIGHT_SENTINEL`] so NaN never
/// reaches the GPU arrays; consumers can reject those vertices with a
/// plain comparison.
pub fn displace(
    base: &[Vec3],
    grid: &NoiseGrid,
    noise: &NoiseParams,
    params: &DisplaceParams,
) -> DisplacedMesh {
    let Some(bounds) = MeshBounds::from_positions(base) else {
        return DisplacedMesh::default();
    };

    let mut out = DisplacedMesh {
        positions: Vec::with_capacity(base.len()),
        normals: Vec::with_capacity(base.len()),
        texcoords: Vec::with_capacity(base.len()),
    };

    let reference = (noise.total_amplitude() * params.height_scale).max(f32::EPSILON);
    let margin = params.ramp_margin;

    for p in base {
        let h = sample_height(p.x, p.z, grid, &bounds);
        let y = if h.is_finite() && h > HEIGHT_SENTINEL {
            h * params.height_scale - params.sea_level
        } else {
            HEIGHT_SENTINEL
        };

        let normal = estimate_normal(p.x, p.z, grid, &bounds);
        let s = (y / reference).clamp(margin, 1.0 - margin);

        out.positions.push([p.x, y, p.z]);
        out.normals.push(normal.to_array());
        out.texcoords.push([s, 0.5]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::build_height_grid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flat_base(n: usize) -> Vec<Vec3> {
        let mut base = Vec::new();
        for i in 0..n {
            for j in 0..n {
                base.push(Vec3::new(
                    i as f32 / (n - 1) as f32,
                    0.0,
                    j as f32 / (n - 1) as f32,
                ));
            }
        }
        base
    }

    fn displaced_fixture(seed: u64) -> (NoiseParams, DisplacedMesh, Vec<Vec3>) {
        let params = NoiseParams {
            map_size: 16,
            seed,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(params.seed);
        let grid = build_height_grid(&params, &mut rng);
        let base = flat_base(9);
        let mesh = displace(&base, &grid, &params, &DisplaceParams::default());
        (params, mesh, base)
    }

    #[test]
    fn base_xz_is_preserved() {
        let (_, mesh, base) = displaced_fixture(3);
        assert_eq!(mesh.vertex_count(), base.len());
        for (out, original) in mesh.positions.iter().zip(&base) {
            assert_eq!(out[0], original.x);
            assert_eq!(out[2], original.z);
        }
    }

    #[test]
    fn heights_stay_within_scaled_amplitude() {
        let (params, mesh, _) = displaced_fixture(11);
        let ceiling = params.total_amplitude() * DisplaceParams::default().height_scale;
        for p in &mesh.positions {
            assert!(p[1] >= 0.0 && p[1] <= ceiling + 1e-4);
        }
    }

    #[test]
    fn texcoords_are_clamped_onto_the_ramp() {
        let (_, mesh, _) = displaced_fixture(17);
        for t in &mesh.texcoords {
            assert!(t[0] >= 0.001 && t[0] <= 0.999);
            assert_eq!(t[1], 0.5);
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let (_, mesh, _) = displaced_fixture(23);
        for n in &mesh.normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }

    /// Identical seed and parameters twice over: byte-identical arrays.
    #[test]
    fn displacement_is_deterministic() {
        let (_, a, _) = displaced_fixture(5);
        let (_, b, _) = displaced_fixture(5);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_base_mesh_yields_empty_output() {
        let params = NoiseParams::default();
        let mut rng = StdRng::seed_from_u64(0);
        let grid = build_height_grid(&params, &mut rng);
        let mesh = displace(&[], &grid, &params, &DisplaceParams::default());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn nan_sample_becomes_sentinel_not_nan() {
        let params = NoiseParams {
            map_size: 8,
            octaves: 1,
            ..Default::default()
        };
        let mut grid = NoiseGrid::new(8);
        grid.set(0, 0, f32::NAN);
        grid.scrub();
        let base = flat_base(3);
        let mesh = displace(&base, &grid, &params, &DisplaceParams::default());
        for p in &mesh.positions {
            assert!(!p[1].is_nan());
        }
    }

    #[test]
    fn byte_views_cover_every_vertex() {
        let (_, mesh, _) = displaced_fixture(2);
        assert_eq!(mesh.position_bytes().len(), mesh.vertex_count() * 12);
        assert_eq!(mesh.texcoord_bytes().len(), mesh.vertex_count() * 8);
    }
}

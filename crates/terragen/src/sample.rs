//! Continuous resampling of the coarse noise grid.
//!
//! Mesh vertices rarely land on lattice points, so heights are looked up by
//! rescaling mesh-space (x, z) through the mesh bounding box onto grid index
//! space and interpolating the enclosing cell. Normals blend the four
//! corner-triangle normals of the same cell with the same weights, which
//! keeps the normal field exactly as continuous as the height field.

use glam::Vec3;

use crate::grid::NoiseGrid;

/// 1D interpolation between two samples. Each sample is weighted by its
/// distance from the *other* sample. Coincident endpoints are nudged one
/// unit apart instead of dividing by zero.
pub fn linear_interp(x1: f32, x2: f32, v1: f32, v2: f32, tx: f32) -> f32 {
    let x2 = if x2 == x1 { x1 + 1.0 } else { x2 };
    let w1 = (tx - x2).abs();
    let w2 = (tx - x1).abs();
    (v1 * w1 + v2 * w2) / (x2 - x1).abs()
}

/// Bilinear interpolation of the four corners of the cell
/// `[x1, x2] × [z1, z2]`. Corner `(xi, zj)` is weighted by the area of the
/// sub-rectangle spanned by the query point and the diagonally opposite
/// corner, normalized by the total cell area. Degenerate axes are nudged
/// one unit apart.
#[allow(clippy::too_many_arguments)]
pub fn bilinear_interp(
    x1: f32,
    z1: f32,
    x2: f32,
    z2: f32,
    v11: f32,
    v21: f32,
    v12: f32,
    v22: f32,
    tx: f32,
    tz: f32,
) -> f32 {
    let x2 = if x2 == x1 { x1 + 1.0 } else { x2 };
    let z2 = if z2 == z1 { z1 + 1.0 } else { z2 };
    let w11 = ((tx - x2) * (tz - z2)).abs();
    let w21 = ((tx - x1) * (tz - z2)).abs();
    let w12 = ((tx - x2) * (tz - z1)).abs();
    let w22 = ((tx - x1) * (tz - z1)).abs();
    let area = (x2 - x1) * (z2 - z1);
    (v11 * w11 + v21 * w21 + v12 * w12 + v22 * w22) / area
}

/// The x/z bounding box of a base mesh, used to map mesh space onto grid
/// index space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl MeshBounds {
    /// Scan the base mesh once for its extents. Returns `None` for an
    /// empty mesh.
    pub fn from_positions(positions: &[Vec3]) -> Option<Self> {
        let first = positions.first()?;
        let mut bounds = Self {
            x_min: first.x,
            x_max: first.x,
            z_min: first.z,
            z_max: first.z,
        };
        for p in positions {
            bounds.x_min = bounds.x_min.min(p.x);
            bounds.x_max = bounds.x_max.max(p.x);
            bounds.z_min = bounds.z_min.min(p.z);
            bounds.z_max = bounds.z_max.max(p.z);
        }
        Some(bounds)
    }

    /// Rescale a mesh-space point onto `[0, map_size]` grid coordinates.
    /// A flat axis (zero extent) falls back to a unit extent.
    pub fn to_grid(&self, x: f32, z: f32, map_size: usize) -> (f32, f32) {
        let dx = (self.x_max - self.x_min).abs().max(1.0e-6);
        let dz = (self.z_max - self.z_min).abs().max(1.0e-6);
        let gx = (x - self.x_min) / dx * map_size as f32;
        let gz = (z - self.z_min) / dz * map_size as f32;
        (
            gx.clamp(0.0, map_size as f32),
            gz.clamp(0.0, map_size as f32),
        )
    }
}

/// Sample the height grid at a continuous mesh-space position.
///
/// Points landing exactly on a lattice index are returned verbatim; a
/// single exact axis degrades to 1D interpolation along the other axis;
/// everything else is full bilinear interpolation of the enclosing cell.
pub fn sample_height(x: f32, z: f32, grid: &NoiseGrid, bounds: &MeshBounds) -> f32 {
    let (gx, gz) = bounds.to_grid(x, z, grid.map_size());

    let x0 = gx.floor();
    let x1 = gx.ceil();
    let z0 = gz.floor();
    let z1 = gz.ceil();

    let xi0 = x0 as usize;
    let xi1 = x1 as usize;
    let zi0 = z0 as usize;
    let zi1 = z1 as usize;

    if x1 == x0 {
        if z1 == z0 {
            // Dead on a lattice point: no interpolation at all.
            grid.get(xi0, zi0)
        } else {
            linear_interp(z0, z1, grid.get(xi0, zi0), grid.get(xi0, zi1), gz)
        }
    } else if z1 == z0 {
        linear_interp(x0, x1, grid.get(xi0, zi0), grid.get(xi1, zi0), gx)
    } else {
        bilinear_interp(
            x0,
            z0,
            x1,
            z1,
            grid.get(xi0, zi0),
            grid.get(xi1, zi0),
            grid.get(xi0, zi1),
            grid.get(xi1, zi1),
            gx,
            gz,
        )
    }
}

/// Estimate the surface normal at a continuous mesh-space position.
///
/// The four corner-triangle normals of the enclosing cell are blended with
/// the same opposite-area weights the height interpolation uses. The blend
/// runs on every path: on an exact lattice hit the weights collapse to
/// that corner's triangle normal, so there is no special-cased flat vector
/// and the field stays continuous across cell boundaries.
pub fn estimate_normal(x: f32, z: f32, grid: &NoiseGrid, bounds: &MeshBounds) -> Vec3 {
    let map_size = grid.map_size();
    if map_size < 1 {
        return Vec3::Y;
    }
    let (gx, gz) = bounds.to_grid(x, z, map_size);

    // Anchor the cell so x0+1/z0+1 stay in range even on the far edge.
    let xi0 = (gx.floor() as usize).min(map_size - 1);
    let zi0 = (gz.floor() as usize).min(map_size - 1);
    let xi1 = xi0 + 1;
    let zi1 = zi0 + 1;

    let p00 = Vec3::new(xi0 as f32, grid.get(xi0, zi0), zi0 as f32);
    let p10 = Vec3::new(xi1 as f32, grid.get(xi1, zi0), zi0 as f32);
    let p01 = Vec3::new(xi0 as f32, grid.get(xi0, zi1), zi1 as f32);
    let p11 = Vec3::new(xi1 as f32, grid.get(xi1, zi1), zi1 as f32);

    let n00 = corner_normal(p00, p10, p01);
    let n10 = corner_normal(p10, p11, p00);
    let n01 = corner_normal(p01, p00, p11);
    let n11 = corner_normal(p11, p01, p10);

    let x0 = xi0 as f32;
    let x1 = xi1 as f32;
    let z0 = zi0 as f32;
    let z1 = zi1 as f32;
    let w00 = ((gx - x1) * (gz - z1)).abs();
    let w10 = ((gx - x0) * (gz - z1)).abs();
    let w01 = ((gx - x1) * (gz - z0)).abs();
    let w11 = ((gx - x0) * (gz - z0)).abs();

    let blended = n00 * w00 + n10 * w10 + n01 * w01 + n11 * w11;
    blended.normalize_or(Vec3::Y)
}

/// Normal of the triangle formed by a cell corner and its two neighbours,
/// oriented upward.
fn corner_normal(corner: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let n = (a - corner).cross(b - corner);
    let n = if n.y < 0.0 { -n } else { n };
    n.normalize_or(Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> MeshBounds {
        MeshBounds {
            x_min: 0.0,
            x_max: 1.0,
            z_min: 0.0,
            z_max: 1.0,
        }
    }

    #[test]
    fn linear_interp_hits_endpoints_and_midpoint() {
        assert_eq!(linear_interp(0.0, 2.0, 1.0, 3.0, 0.0), 1.0);
        assert_eq!(linear_interp(0.0, 2.0, 1.0, 3.0, 2.0), 3.0);
        assert_eq!(linear_interp(0.0, 2.0, 1.0, 3.0, 1.0), 2.0);
    }

    #[test]
    fn linear_interp_survives_coincident_endpoints() {
        // Zero-width axis must not divide by zero.
        let v = linear_interp(3.0, 3.0, 0.5, 0.9, 3.0);
        assert!(v.is_finite());
    }

    #[test]
    fn bilinear_interp_reproduces_corners() {
        let v = bilinear_interp(0.0, 0.0, 4.0, 4.0, 0.1, 0.2, 0.3, 0.4, 0.0, 0.0);
        assert!((v - 0.1).abs() < 1e-6);
        let v = bilinear_interp(0.0, 0.0, 4.0, 4.0, 0.1, 0.2, 0.3, 0.4, 4.0, 4.0);
        assert!((v - 0.4).abs() < 1e-6);
    }

    #[test]
    fn bilinear_interp_center_is_corner_average() {
        let v = bilinear_interp(0.0, 0.0, 2.0, 2.0, 0.0, 1.0, 1.0, 2.0, 1.0, 1.0);
        assert!((v - 1.0).abs() < 1e-6);
    }

    /// Sampling a point coincident with a grid corner returns exactly the
    /// stored value, with no interpolation drift.
    #[test]
    fn exact_corner_sample_returns_stored_value() {
        let mut grid = NoiseGrid::new(8);
        grid.set(2, 3, 0.77);
        let bounds = unit_bounds();
        // Mesh coordinate that rescales to grid index (2, 3).
        let h = sample_height(2.0 / 8.0, 3.0 / 8.0, &grid, &bounds);
        assert_eq!(h, 0.77);
    }

    /// Approaching a cell boundary from either side converges to the same
    /// value: no seams between adjacent cells.
    #[test]
    fn sampling_is_continuous_across_cell_boundaries() {
        let mut grid = NoiseGrid::new(4);
        for x in 0..=4 {
            for z in 0..=4 {
                grid.set(x, z, (x * 7 + z * 3) as f32 * 0.01);
            }
        }
        let bounds = unit_bounds();
        // The boundary between cells [1,2] and [2,3] sits at gx = 2.
        let eps = 1e-4;
        let left = sample_height((2.0 - eps) / 4.0, 0.4, &grid, &bounds);
        let right = sample_height((2.0 + eps) / 4.0, 0.4, &grid, &bounds);
        assert!(
            (left - right).abs() < 1e-3,
            "seam at cell boundary: {left} vs {right}"
        );
    }

    #[test]
    fn flat_grid_normal_is_up() {
        let mut grid = NoiseGrid::new(4);
        for x in 0..=4 {
            for z in 0..=4 {
                grid.set(x, z, 0.5);
            }
        }
        let bounds = unit_bounds();
        let n = estimate_normal(0.37, 0.61, &grid, &bounds);
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn estimated_normal_is_unit_length() {
        let mut grid = NoiseGrid::new(4);
        for x in 0..=4 {
            for z in 0..=4 {
                grid.set(x, z, ((x * 13 + z * 5) % 7) as f32 * 0.3);
            }
        }
        let bounds = unit_bounds();
        for &(x, z) in &[(0.1, 0.1), (0.5, 0.5), (0.99, 0.2), (0.25, 0.75)] {
            let n = estimate_normal(x, z, &grid, &bounds);
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
    }

    /// An exact lattice hit blends down to a single corner triangle rather
    /// than snapping to a flat up vector.
    #[test]
    fn exact_hit_normal_tilts_with_the_surface() {
        let mut grid = NoiseGrid::new(4);
        for x in 0..=4u32 {
            for z in 0..=4u32 {
                // A plane sloping along x.
                grid.set(x as usize, z as usize, x as f32 * 0.5);
            }
        }
        let bounds = unit_bounds();
        let n = estimate_normal(0.25, 0.25, &grid, &bounds);
        assert!(n.x < 0.0, "normal should lean against the slope: {n}");
        assert!(n.y > 0.0);
        assert!((n.z).abs() < 1e-5);
    }
}

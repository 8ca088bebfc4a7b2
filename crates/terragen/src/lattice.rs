//! Lattice noise: midpoint-subdivision octave fill and octave compositing.
//!
//! Each octave scatters seeded random values over lattice corners at a
//! fixed stride and fills every point in between by bilinear interpolation
//! of the cell it falls in. Summing octaves of shrinking stride and fading
//! amplitude layers coarse shapes under progressively finer detail.

use rand::Rng;

use crate::config::NoiseParams;
use crate::grid::NoiseGrid;
use crate::sample::bilinear_interp;

/// Generate one octave: corner values at `step` stride, interiors filled
/// by bilinear interpolation of the enclosing cell.
///
/// Corners are assigned exactly once and never re-randomized; a cell's
/// interior is filled as soon as its bottom-right corner exists. A stride
/// that does not divide the map size leaves the trailing points past the
/// last complete cell at zero; that is a configuration problem reported
/// by [`NoiseParams::subdivision_step`], not a runtime failure.
pub fn generate_octave<R: Rng>(
    map_size: usize,
    amplitude: f32,
    step: usize,
    rng: &mut R,
) -> NoiseGrid {
    let mut grid = NoiseGrid::new(map_size);
    let step = step.max(1);

    let mut x = 0;
    while x <= map_size {
        let mut z = 0;
        while z <= map_size {
            grid.set(x, z, amplitude * rng.gen::<f32>());
            // Both indices past the stride means a cell just completed:
            // interpolate everything strictly inside it.
            if x >= step && z >= step {
                fill_cell(&mut grid, x - step, z - step, x, z);
            }
            z += step;
        }
        x += step;
    }

    grid
}

/// Bilinear-fill the interior of the cell `[x1, x2] × [z1, z2]` from its
/// four (already assigned) corners.
fn fill_cell(grid: &mut NoiseGrid, x1: usize, z1: usize, x2: usize, z2: usize) {
    let v11 = grid.get(x1, z1);
    let v21 = grid.get(x2, z1);
    let v12 = grid.get(x1, z2);
    let v22 = grid.get(x2, z2);

    for a in x1..=x2 {
        for b in z1..=z2 {
            let on_corner = (a == x1 || a == x2) && (b == z1 || b == z2);
            if on_corner {
                continue;
            }
            grid.set(
                a,
                b,
                bilinear_interp(
                    x1 as f32, z1 as f32, x2 as f32, z2 as f32, v11, v21, v12, v22, a as f32,
                    b as f32,
                ),
            );
        }
    }
}

/// Composite all octaves into one raw (un-normalized) height grid.
///
/// Octave 1 runs at the base amplitude and frequency; every octave after
/// it multiplies the frequency by `persistence` and the amplitude by
/// `lacunarity`, recomputes the subdivision step (clamped to 1), and
/// accumulates a fresh lattice into the running sum. The generator is
/// seeded once per full build by the caller, so octave sequences are
/// reproducible for a given seed.
pub fn build_height_grid<R: Rng>(params: &NoiseParams, rng: &mut R) -> NoiseGrid {
    let mut frequency = params.frequency as f32;
    let mut amplitude = params.amplitude;
    let mut step = params.subdivision_step(frequency);

    let mut map = generate_octave(params.map_size, amplitude, step, rng);

    for _ in 1..params.octaves {
        frequency *= params.persistence;
        amplitude *= params.lacunarity;
        step = params.subdivision_step(frequency);

        let octave = generate_octave(params.map_size, amplitude, step, rng);
        map.accumulate(octave);
    }

    map.scrub();
    map
}

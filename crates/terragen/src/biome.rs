//! Height-based biome classification, vertex colors, and vegetation.
//!
//! Vertices are classified against an ordered band table; the ordering is
//! the classification rule (first band whose threshold covers the height
//! wins). Vegetation markers are scattered opportunistically on the band
//! flagged for it and handed off once to the external instanced renderer.

use glam::Vec3;
use rand::Rng;

use crate::grid::HEIGHT_SENTINEL;

/// Kind of vegetation marker spawned during colorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantKind {
    Flower,
    Tree,
}

/// A vegetation marker with enough metadata to group instances per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    pub kind: PlantKind,
    pub position: Vec3,
    /// Offset of the chunk that spawned this plant.
    pub chunk_offset: (i32, i32),
}

/// One entry of the biome table: every vertex at or below
/// `threshold * mesh_height` (and above all previous bands) gets `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBand {
    /// Normalized height threshold in 0..=1, strictly increasing down the
    /// table.
    pub threshold: f32,
    pub color: [f32; 3],
    /// Whether plants may spawn on this band.
    pub vegetation: bool,
}

fn rgb(r: u8, g: u8, b: u8) -> [f32; 3] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// Chance per vertex of spawning a plant on a vegetation band (5 in 1000).
const PLANT_CHANCE_PER_MILLE: u32 = 5;
/// Of spawned plants, the share that are flowers (70 in 100).
const FLOWER_SHARE_PERCENT: u32 = 70;

/// The ordered band table plus vegetation scatter state.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeColorizer {
    bands: Vec<ColorBand>,
}

impl BiomeColorizer {
    /// The classic five-band palette: shallow water, sand, grass, rock,
    /// snow. `water_height` sets the waterline threshold and the grass
    /// band carries vegetation.
    pub fn classic(water_height: f32) -> Self {
        Self::with_bands(vec![
            ColorBand {
                threshold: water_height,
                color: rgb(60, 100, 190),
                vegetation: false,
            },
            ColorBand {
                threshold: 0.15,
                color: rgb(210, 215, 130),
                vegetation: false,
            },
            ColorBand {
                threshold: 0.30,
                color: rgb(95, 165, 30),
                vegetation: true,
            },
            ColorBand {
                threshold: 0.75,
                color: rgb(90, 65, 60),
                vegetation: false,
            },
            ColorBand {
                threshold: 1.00,
                color: rgb(255, 255, 255),
                vegetation: false,
            },
        ])
    }

    pub fn with_bands(bands: Vec<ColorBand>) -> Self {
        debug_assert!(
            bands.windows(2).all(|w| w[0].threshold <= w[1].threshold),
            "band thresholds must be non-decreasing"
        );
        Self { bands }
    }

    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    /// Index of the band a (mesh-space) height falls into. Heights above
    /// the last threshold clamp to the last band. Linear scan: the table
    /// is small and ordered.
    pub fn classify(&self, height: f32, mesh_height: f32) -> usize {
        for (i, band) in self.bands.iter().enumerate() {
            if height <= band.threshold * mesh_height {
                return i;
            }
        }
        self.bands.len() - 1
    }

    /// Assign one RGB color per vertex and scatter plants on vegetation
    /// bands. Colors are positionally aligned with `positions`; plants
    /// carry the owning chunk offset for later per-chunk instancing.
    ///
    /// Sentinel heights (rejected NaN samples) take the first band's color
    /// and never spawn vegetation. Pass `vegetation = false` to disable
    /// the scatter entirely.
    pub fn colorize<R: Rng>(
        &self,
        positions: &[[f32; 3]],
        mesh_height: f32,
        chunk_offset: (i32, i32),
        vegetation: bool,
        rng: &mut R,
    ) -> (Vec<[f32; 3]>, Vec<Plant>) {
        let mut colors = Vec::with_capacity(positions.len());
        let mut plants = Vec::new();

        for p in positions {
            let y = p[1];
            if y <= HEIGHT_SENTINEL {
                colors.push(self.bands[0].color);
                continue;
            }

            let band_index = self.classify(y, mesh_height);
            let band = &self.bands[band_index];
            colors.push(band.color);

            if vegetation && band.vegetation && rng.gen_range(0..1000) < PLANT_CHANCE_PER_MILLE {
                let kind = if rng.gen_range(0..100) < FLOWER_SHARE_PERCENT {
                    PlantKind::Flower
                } else {
                    PlantKind::Tree
                };
                plants.push(Plant {
                    kind,
                    position: Vec3::new(p[0], y, p[2]),
                    chunk_offset,
                });
            }
        }

        (colors, plants)
    }
}

/// Group plant positions of one kind into per-chunk flat xyz arrays, the
/// layout the external instanced renderer uploads directly. Chunk slot
/// `x + y * chunks_x` holds that chunk's instances; positions are divided
/// by `model_scale` to compensate for the scaled instance model.
pub fn group_instances(
    plants: &[Plant],
    kind: PlantKind,
    model_scale: f32,
    chunks_x: usize,
    chunks_y: usize,
) -> Vec<Vec<f32>> {
    let mut per_chunk = vec![Vec::new(); chunks_x * chunks_y];

    for plant in plants.iter().filter(|p| p.kind == kind) {
        let (cx, cy) = plant.chunk_offset;
        if cx < 0 || cy < 0 {
            continue;
        }
        let (cx, cy) = (cx as usize, cy as usize);
        if cx >= chunks_x || cy >= chunks_y {
            continue;
        }
        let slot = &mut per_chunk[cx + cy * chunks_x];
        slot.push(plant.position.x / model_scale);
        slot.push(plant.position.y / model_scale);
        slot.push(plant.position.z / model_scale);
    }

    per_chunk
}

//! Procedural heightfield terrain synthesis.
//!
//! The crate is a pure computation library: layered lattice noise is
//! composited into a height grid, resampled onto a dense mesh (or built
//! into self-contained chunks), classified into biome colors, and handed
//! back as flat vertex arrays for the external rendering harness to
//! upload. Windowing, input, shaders, and GPU buffers live outside.
//!
//! **Seed-based determinism:** every entry point reseeds its generator
//! from the config, so the same seed and parameters always produce
//! byte-identical output arrays.

pub mod biome;
pub mod chunk;
pub mod config;
pub mod displace;
pub mod grid;
pub mod lattice;
pub mod pipeline;
pub mod sample;

pub use biome::*;
pub use chunk::*;
pub use config::*;
pub use displace::*;
pub use grid::*;
pub use lattice::*;
pub use pipeline::*;
pub use sample::*;

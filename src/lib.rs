//! Cube Hunt - robots hunting monsters inside a cubic voxel world
//!
//! A fixed N×N×N grid of Free and Void cells, rule-driven robots with
//! bounded memory, and reflex monsters that wake every K ticks. Every run
//! is reproducible from a single seed.

pub mod agents;
pub mod core;
pub mod simulation;
pub mod world;

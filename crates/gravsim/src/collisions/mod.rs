//! Collision detection and resolution between moving circles
//!
//! Detection is continuous: [`ccd`] finds the earliest time within a tick at
//! which two circles touch. Resolution either merges the pair into one
//! particle, conserving mass and momentum, or bounces them elastically.

pub mod detection;
pub mod resolution;


pub use detection::{ccd, time_of_impact, CollisionEvent};
pub use resolution::{
    bounce_particles, combined_density, merge_particles, merge_survivor, MaterialLimits,
};

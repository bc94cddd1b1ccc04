//! The weaving engine, leaf-first: selection, per-clip profile and panning,
//! stream sequencing, the intro, and the orchestrator that ties them together.

pub mod config;
pub mod intro;
pub mod pan;
pub mod process;
pub mod profile;
pub mod select;
pub mod sequence;

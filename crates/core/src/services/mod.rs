//! Collaborator seams and the cache-building pipeline.
//!
//! - `elf`, `device`, `trace`: traits for the external tools.
//! - `inspectors`, `adb`, `report_sample`: adapters that shell out to (or
//!   parse in place of) those tools.
//! - `sources`: the binary sources that populate the cache.
//! - `builder`: the orchestrator.

pub mod adb;
pub mod builder;
pub mod device;
pub mod elf;
pub mod inspectors;
pub mod report_sample;
pub mod sources;
pub mod tools;
pub mod trace;

//! Abridge molecular absorption-line catalogs against the wavenumber
//! coverage of a telluric transmission model, and prepare the abridged
//! tables for overlay inspection.

pub mod cli;
pub mod color;
pub mod data;
pub mod molecules;
pub mod pipeline;
pub mod registry;
pub mod view;

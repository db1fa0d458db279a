//! Core utilities for the repro gateway.
//!
//! This crate provides the resource identifier generation shared by the
//! gateway's crates.

pub mod id;

pub use id::{EntropyError, IdPrefix, generate_id, random_hex};

//! # PYRE Shared
//!
//! Math types and engine constants shared by every PYRE crate.
//!
//! This crate is deliberately stateless: it knows nothing about worlds,
//! actors, or the arena. It exists so the core and the frame orchestrator
//! agree on one canonical `Transform` representation and one set of
//! engine limits.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod constants;
pub mod math;

pub use math::{Quaternion, Transform, Vec3};

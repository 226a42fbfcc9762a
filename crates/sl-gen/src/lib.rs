//! Signal generators for siso-lab.
//!
//! A decorator family parallel to the SISO blocks: a constant-valued
//! [`BaseGenerator`] wrapped by periodic and random decorators, each adding
//! its own contribution to the inner signal at a given discrete time.
//!
//! # Architecture
//!
//! - Generators are sampled by time index, `simulate(t) -> f64`; they do not
//!   advance state between calls except for the noise variants
//! - Serialization is tag-prefixed but unframed; chains nest by
//!   concatenation and reconstruct through this crate's own registry
//! - Noise decorators share one process-wide seedable engine
//!   ([`reseed_noise_engine`]) rather than owning per-instance streams

pub mod base;
pub mod error;
pub mod generator;
pub mod noise;
pub mod periodic;

pub use base::BaseGenerator;
pub use error::{GenError, GenResult};
pub use generator::{GenCommon, Generator, deserialize};
pub use noise::{NormalNoise, UniformNoise, reseed_noise_engine};
pub use periodic::{Rectangular, Sawtooth, Sinusoid};

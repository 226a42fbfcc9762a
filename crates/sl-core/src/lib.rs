//! sl-core: stable foundation for siso-lab.
//!
//! Contains:
//! - bytes (little-endian wire codec + envelope framing)
//! - numeric (float helpers + tolerances)
//! - error (shared error types)

pub mod bytes;
pub mod error;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use bytes::{ByteReader, ByteWriter, declared_len, frame, tag_matches};
pub use error::{CoreError, CoreResult};
pub use numeric::*;

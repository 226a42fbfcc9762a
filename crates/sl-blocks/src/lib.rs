//! Single-input/single-output simulation blocks for siso-lab.
//!
//! This crate provides the polymorphic SISO component family: a PID
//! regulator, a clamped linear static function, a stochastic ARX model and a
//! nestable control-loop composite, all sharing one capability set
//! (`simulate`, `reset`, `serialize`) and one self-describing binary wire
//! format.
//!
//! # Architecture
//!
//! - Blocks are scalar `f64 -> f64` processors advancing internal state one
//!   discrete step per call
//! - Serialization is a length-prefixed, tag-dispatched envelope; arbitrary
//!   trees of heterogeneous blocks reconstruct through a registry, without a
//!   central switch
//! - The ARX model owns a seedable PRNG stream whose exact position survives
//!   serialization (reseed + replay, never a state snapshot)
//!
//! # Design Principles
//!
//! - **Open dispatch**: deserialization walks an explicit registry keyed by
//!   ASCII type tags; the dispatcher knows no concrete types
//! - **Round-trip fidelity**: `deserialize(serialize(x))` is structurally
//!   equal to `x` and behaves bit-identically afterwards
//! - **Recoverable errors**: malformed data and out-of-domain parameters are
//!   ordinary errors, never panics

pub mod arx;
pub mod block;
pub mod control_loop;
pub mod error;
pub mod feedback;
pub mod pid;
pub mod static_clamp;
pub mod textio;

pub use arx::ArxModel;
pub use block::{SisoBlock, deserialize};
pub use control_loop::ControlLoop;
pub use error::{BlockError, BlockResult};
pub use feedback::FeedbackSession;
pub use pid::PidRegulator;
pub use static_clamp::{Point, StaticClamp};
pub use textio::TextDump;

//! SISO block trait and the deserialization registry.
//!
//! Every concrete block carries a short ASCII tag that doubles as its wire
//! prefix and its registry key. The free [`deserialize`] dispatcher matches
//! the tag found right after the u32 length prefix against an explicit table
//! of `(tag, factory)` entries; it knows nothing about concrete types, which
//! is what lets [`ControlLoop`](crate::ControlLoop) hold an extensible set of
//! child types without a hardcoded switch.

use downcast_rs::{Downcast, impl_downcast};
use sl_core::{CoreError, bytes};
use std::sync::OnceLock;

use crate::error::{BlockError, BlockResult};
use crate::{ArxModel, ControlLoop, PidRegulator, StaticClamp};

/// A single-input, single-output simulation block.
///
/// `simulate` is a pure function of the current input and internal state;
/// every call advances internal state one discrete step.
pub trait SisoBlock: Downcast + std::fmt::Debug {
    /// Wire-format type tag, unique per concrete block type.
    fn tag(&self) -> &'static str;

    /// Advance one step and return this step's output.
    fn simulate(&mut self, input: f64) -> f64;

    /// Return dynamic state (integrators, queues, PRNG) to its baseline.
    /// Default no-op for stateless blocks.
    fn reset(&mut self) {}

    /// Self-framed binary dump: `[len: u32][tag][payload]`.
    fn serialize(&self) -> Vec<u8>;

    /// Structural equality across trait objects. Mismatched concrete types
    /// compare unequal; this branch is a normal `false`, not a logic error,
    /// since it occurs legitimately when comparing trees built from
    /// different configurations.
    fn eq_block(&self, other: &dyn SisoBlock) -> bool;
}

impl_downcast!(SisoBlock);

impl PartialEq for dyn SisoBlock + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.eq_block(other)
    }
}

/// Shared shape of every concrete `eq_block` implementation.
pub(crate) fn eq_concrete<T>(a: &T, b: &dyn SisoBlock) -> bool
where
    T: SisoBlock + PartialEq,
{
    b.downcast_ref::<T>().is_some_and(|b| a == b)
}

type Factory = fn(&[u8]) -> BlockResult<Box<dyn SisoBlock>>;

struct RegistryEntry {
    tag: &'static str,
    factory: Factory,
}

/// Dispatch table listing every concrete block type.
///
/// Populated once, explicitly, instead of relying on static-initialization
/// side effects scattered across modules. Extending the block family means
/// adding one entry here.
fn registry() -> &'static [RegistryEntry] {
    static REGISTRY: OnceLock<Vec<RegistryEntry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        vec![
            RegistryEntry {
                tag: PidRegulator::TAG,
                factory: |data| Ok(Box::new(PidRegulator::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: StaticClamp::TAG,
                factory: |data| Ok(Box::new(StaticClamp::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: ArxModel::TAG,
                factory: |data| Ok(Box::new(ArxModel::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: ControlLoop::TAG,
                factory: |data| Ok(Box::new(ControlLoop::from_bytes(data)?)),
            },
        ]
    })
}

/// Reconstruct a block from a framed envelope.
///
/// Scans the registry for a tag matching the bytes right after the length
/// prefix and invokes the factory. Fails with a descriptive error when no
/// tag matches or when the payload is malformed.
pub fn deserialize(data: &[u8]) -> BlockResult<Box<dyn SisoBlock>> {
    for entry in registry() {
        if bytes::tag_matches(data, entry.tag) {
            tracing::debug!(tag = entry.tag, len = data.len(), "deserializing block");
            return (entry.factory)(data);
        }
    }
    Err(BlockError::Malformed(CoreError::UnknownTag {
        family: "object",
    }))
}

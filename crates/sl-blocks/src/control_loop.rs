//! Composite feedback-loop block.

use sl_core::{ByteReader, ByteWriter, CoreError, bytes, declared_len, frame};

use crate::block::{SisoBlock, deserialize, eq_concrete};
use crate::error::{BlockError, BlockResult};

/// An ordered chain of child blocks behaving as one block.
///
/// In closed mode the chain input is `u - prev_result`, the classic negative
/// feedback of the previous loop output; in open mode the input passes
/// through unchanged. Children are arbitrary blocks, including further loops,
/// so whole control structures nest and serialize as a single envelope.
#[derive(Debug)]
pub struct ControlLoop {
    closed: bool,
    prev_result: f64,
    children: Vec<Box<dyn SisoBlock>>,
}

impl ControlLoop {
    /// Wire-format type tag.
    pub const TAG: &'static str = "UAR";

    /// Fixed part of the payload: closed flag, previous result, child count.
    const FIXED: usize = size_of::<u8>() + size_of::<f64>() + size_of::<u64>();

    pub fn new(closed: bool, init_val: f64) -> Self {
        Self {
            closed,
            prev_result: init_val,
            children: Vec::new(),
        }
    }

    /// Reconstruct from a framed envelope, children included.
    pub fn from_bytes(data: &[u8]) -> BlockResult<Self> {
        let min = bytes::LEN_PREFIX + Self::TAG.len() + Self::FIXED;
        if data.len() < min {
            return Err(CoreError::ShortBuffer {
                what: "ControlLoop envelope",
                needed: min,
                available: data.len(),
            }
            .into());
        }
        let body_len = declared_len(data)?;
        if data.len() < bytes::LEN_PREFIX + body_len {
            return Err(CoreError::LengthMismatch {
                expected: bytes::LEN_PREFIX + body_len,
                actual: data.len(),
            }
            .into());
        }
        let mut r = ByteReader::new(data);
        r.read_u32("length prefix")?;
        r.expect_tag(Self::TAG)?;
        let closed = r.read_u8("closed flag")? != 0;
        let prev_result = r.read_f64("prev_result")?;
        let child_count = r.read_u64("child count")?;

        // The declared count is untrusted input; cap the preallocation by
        // what the buffer could possibly hold.
        let cap = (child_count as usize).min(r.remaining() / bytes::LEN_PREFIX);
        let mut children = Vec::with_capacity(cap);
        for _ in 0..child_count {
            let child_len = declared_len(&data[r.consumed()..])?;
            let envelope = r.take(bytes::LEN_PREFIX + child_len, "child envelope")?;
            children.push(deserialize(envelope)?);
        }

        Ok(Self {
            closed,
            prev_result,
            children,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Output of the most recent simulation step.
    pub fn prev_result(&self) -> f64 {
        self.prev_result
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a child to the end of the chain.
    pub fn push_back(&mut self, child: Box<dyn SisoBlock>) {
        self.children.push(child);
    }

    /// Insert a child before position `index` (`index == len` appends).
    pub fn insert(&mut self, index: usize, child: Box<dyn SisoBlock>) -> BlockResult<()> {
        if index > self.children.len() {
            return Err(BlockError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        self.children.insert(index, child);
        Ok(())
    }

    /// Insert a whole sequence of children before position `index`.
    pub fn insert_all<I>(&mut self, index: usize, blocks: I) -> BlockResult<()>
    where
        I: IntoIterator<Item = Box<dyn SisoBlock>>,
    {
        if index > self.children.len() {
            return Err(BlockError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        let tail = self.children.split_off(index);
        self.children.extend(blocks);
        self.children.extend(tail);
        Ok(())
    }

    /// Remove and return the child at `index`.
    pub fn remove(&mut self, index: usize) -> BlockResult<Box<dyn SisoBlock>> {
        if index >= self.children.len() {
            return Err(BlockError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        Ok(self.children.remove(index))
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn child(&self, index: usize) -> Option<&dyn SisoBlock> {
        self.children.get(index).map(AsRef::as_ref)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut (dyn SisoBlock + 'static)> {
        self.children.get_mut(index).map(AsMut::as_mut)
    }

    /// Override the persisted previous output without touching the
    /// children. The next closed-loop step forms its error against this
    /// value.
    pub fn prime(&mut self, prev_result: f64) {
        self.prev_result = prev_result;
    }

    /// Reset every child and seed `prev_result` with `init_val`.
    pub fn reset_with(&mut self, init_val: f64) {
        self.prev_result = init_val;
        for child in &mut self.children {
            child.reset();
        }
    }
}

impl PartialEq for ControlLoop {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed
            && self.prev_result == other.prev_result
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.eq_block(b.as_ref()))
    }
}

impl SisoBlock for ControlLoop {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, u: f64) -> f64 {
        let mut x = if self.closed { u - self.prev_result } else { u };
        for child in &mut self.children {
            x = child.simulate(x);
        }
        self.prev_result = x;
        x
    }

    fn reset(&mut self) {
        self.reset_with(0.0);
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(Self::FIXED);
        w.put_u8(self.closed as u8);
        w.put_f64(self.prev_result);
        w.put_u64(self.children.len() as u64);
        for child in &self.children {
            w.put_bytes(&child.serialize());
        }
        frame(Self::TAG, &w.into_vec())
    }

    fn eq_block(&self, other: &dyn SisoBlock) -> bool {
        eq_concrete(self, other)
    }
}

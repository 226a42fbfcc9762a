//! Little-endian wire codec.
//!
//! Every numeric field in the serialized formats is a raw object
//! representation, little-endian on the wire regardless of host byte order
//! (`to_le_bytes`/`from_le_bytes` do the swapping on big-endian hosts).
//! There is no varint coding and no compression; the format is optimized for
//! exactness and round-trip fidelity, not size.
//!
//! The SISO envelope is `[len: u32][tag: ASCII][payload]`, where `len` counts
//! everything after the length field itself. [`frame`] builds such an
//! envelope, [`declared_len`] and [`tag_matches`] inspect one without
//! consuming it.

use crate::error::{CoreError, CoreResult};

/// Byte count of the u32 length prefix in front of a framed envelope.
pub const LEN_PREFIX: usize = size_of::<u32>();

/// Growable output buffer with typed little-endian appends.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Concatenated encodings of a sequence of doubles, no length marker.
    pub fn put_f64_iter<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        for v in values {
            self.put_f64(v);
        }
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_tag(&mut self, tag: &str) {
        self.buf.extend_from_slice(tag.as_bytes());
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a byte slice with checked little-endian reads.
///
/// Every read reports a [`CoreError::ShortBuffer`] instead of reading past
/// the end, which is what makes truncated serialized data a recoverable
/// error everywhere above this layer.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn take(&mut self, n: usize, what: &'static str) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::ShortBuffer {
                what,
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self, what: &'static str) -> CoreResult<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn read_u32(&mut self, what: &'static str) -> CoreResult<u32> {
        let b = self.take(size_of::<u32>(), what)?;
        Ok(u32::from_le_bytes(b.try_into().expect("sized take")))
    }

    pub fn read_u64(&mut self, what: &'static str) -> CoreResult<u64> {
        let b = self.take(size_of::<u64>(), what)?;
        Ok(u64::from_le_bytes(b.try_into().expect("sized take")))
    }

    pub fn read_i32(&mut self, what: &'static str) -> CoreResult<i32> {
        let b = self.take(size_of::<i32>(), what)?;
        Ok(i32::from_le_bytes(b.try_into().expect("sized take")))
    }

    pub fn read_f64(&mut self, what: &'static str) -> CoreResult<f64> {
        let b = self.take(size_of::<f64>(), what)?;
        Ok(f64::from_le_bytes(b.try_into().expect("sized take")))
    }

    pub fn read_f64_vec(&mut self, n: usize, what: &'static str) -> CoreResult<Vec<f64>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_f64(what)?);
        }
        Ok(out)
    }

    /// Consume `tag` or fail with a prefix-mismatch error.
    pub fn expect_tag(&mut self, tag: &'static str) -> CoreResult<()> {
        if self.remaining() < tag.len() || &self.buf[self.pos..self.pos + tag.len()] != tag.as_bytes()
        {
            return Err(CoreError::PrefixMismatch { expected: tag });
        }
        self.pos += tag.len();
        Ok(())
    }

    /// Whether the unread bytes start with `tag`, without consuming.
    pub fn starts_with(&self, tag: &str) -> bool {
        self.buf[self.pos..].starts_with(tag.as_bytes())
    }
}

/// Build a `[len: u32][tag][payload]` envelope.
///
/// `len` counts the tag and the payload, not itself.
pub fn frame(tag: &str, payload: &[u8]) -> Vec<u8> {
    let body_len = tag.len() + payload.len();
    let mut w = ByteWriter::with_capacity(LEN_PREFIX + body_len);
    w.put_u32(body_len as u32);
    w.put_tag(tag);
    w.put_bytes(payload);
    w.into_vec()
}

/// Declared body length of a framed envelope (bytes after the u32 field).
pub fn declared_len(buf: &[u8]) -> CoreResult<usize> {
    let mut r = ByteReader::new(buf);
    Ok(r.read_u32("length prefix")? as usize)
}

/// Whether the envelope's tag (right after the length prefix) is `tag`.
pub fn tag_matches(buf: &[u8], tag: &str) -> bool {
    buf.len() >= LEN_PREFIX && buf[LEN_PREFIX..].starts_with(tag.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut w = ByteWriter::new();
        w.put_u8(7);
        w.put_u32(0xDEAD_BEEF);
        w.put_u64(u64::MAX - 3);
        w.put_i32(-12);
        w.put_f64(-0.125);
        let bytes = w.into_vec();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u8("u8").unwrap(), 7);
        assert_eq!(r.read_u32("u32").unwrap(), 0xDEAD_BEEF);
        assert_eq!(r.read_u64("u64").unwrap(), u64::MAX - 3);
        assert_eq!(r.read_i32("i32").unwrap(), -12);
        assert_eq!(r.read_f64("f64").unwrap(), -0.125);
        assert!(r.is_empty());
    }

    #[test]
    fn little_endian_on_the_wire() {
        let mut w = ByteWriter::new();
        w.put_u32(0x0102_0304);
        assert_eq!(w.into_vec(), vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn short_read_is_an_error() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        let err = r.read_u32("field").unwrap_err();
        assert!(matches!(err, CoreError::ShortBuffer { needed: 4, .. }));
        // Failed read does not consume
        assert_eq!(r.remaining(), 3);
    }

    #[test]
    fn f64_bits_survive_exactly() {
        for v in [0.0, -0.0, 1.5, f64::MIN_POSITIVE, f64::NAN] {
            let mut w = ByteWriter::new();
            w.put_f64(v);
            let bytes = w.into_vec();
            let got = ByteReader::new(&bytes).read_f64("v").unwrap();
            assert_eq!(got.to_bits(), v.to_bits());
        }
    }

    #[test]
    fn frame_layout() {
        let env = frame("mARX", &[0xAA, 0xBB]);
        assert_eq!(env.len(), 4 + 4 + 2);
        assert_eq!(declared_len(&env).unwrap(), 6);
        assert!(tag_matches(&env, "mARX"));
        assert!(!tag_matches(&env, "rPID"));
    }

    #[test]
    fn expect_tag_mismatch() {
        let env = frame("Stat", &[]);
        let mut r = ByteReader::new(&env);
        r.read_u32("len").unwrap();
        assert!(r.expect_tag("mARX").is_err());
        assert!(r.expect_tag("Stat").is_ok());
    }
}

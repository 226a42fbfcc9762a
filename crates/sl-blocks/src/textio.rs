//! Human-readable text dumps for the leaf blocks.
//!
//! Secondary format next to the binary envelope: whitespace-delimited tokens
//! in the exact field order of the binary layout, tag first. Meant for
//! inspection and for shuttling single blocks through text files; composites
//! stay binary-only.

use crate::arx::{ArxModel, ArxParts};
use crate::error::{BlockError, BlockResult};
use crate::pid::PidRegulator;

/// Text dump/parse, implemented by the blocks with a flat field set.
pub trait TextDump: Sized {
    fn to_text(&self) -> String;
    fn from_text(text: &str) -> BlockResult<Self>;
}

struct Tokens<'a> {
    it: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            it: text.split_whitespace(),
        }
    }

    fn next(&mut self, what: &'static str) -> BlockResult<&'a str> {
        self.it.next().ok_or(BlockError::InvalidParam { what })
    }

    fn tag(&mut self, expected: &'static str) -> BlockResult<()> {
        if self.next("text dump is missing its type tag")? != expected {
            return Err(BlockError::invalid("text dump has the wrong type tag"));
        }
        Ok(())
    }

    fn f64(&mut self, what: &'static str) -> BlockResult<f64> {
        self.next(what)?
            .parse()
            .map_err(|_| BlockError::InvalidParam { what })
    }

    fn u64(&mut self, what: &'static str) -> BlockResult<u64> {
        self.next(what)?
            .parse()
            .map_err(|_| BlockError::InvalidParam { what })
    }

    fn f64_vec(&mut self, n: usize, what: &'static str) -> BlockResult<Vec<f64>> {
        (0..n).map(|_| self.f64(what)).collect()
    }

    fn finish(mut self) -> BlockResult<()> {
        if self.it.next().is_some() {
            return Err(BlockError::invalid("trailing tokens in text dump"));
        }
        Ok(())
    }
}

fn push_f64s(out: &mut String, values: impl IntoIterator<Item = f64>) {
    use std::fmt::Write;
    for v in values {
        // `{}` prints the shortest representation that parses back to the
        // same bits, so the text path is as lossless as the binary one.
        write!(out, " {v}").expect("write to String");
    }
}

impl TextDump for PidRegulator {
    fn to_text(&self) -> String {
        let mut out = String::from(Self::TAG);
        let (integral, prev_e) = self.state();
        push_f64s(
            &mut out,
            [self.k(), self.ti(), self.td(), integral, prev_e],
        );
        out
    }

    fn from_text(text: &str) -> BlockResult<Self> {
        let mut t = Tokens::new(text);
        t.tag(Self::TAG)?;
        let k = t.f64("k")?;
        let ti = t.f64("ti")?;
        let td = t.f64("td")?;
        let integral = t.f64("integral")?;
        let prev_e = t.f64("prev_e")?;
        t.finish()?;
        let mut pid = Self::new(k, ti, td)?;
        pid.restore_state(integral, prev_e);
        Ok(pid)
    }
}

impl TextDump for ArxModel {
    fn to_text(&self) -> String {
        use std::fmt::Write;
        let p = self.parts();
        let mut out = String::from(Self::TAG);
        write!(out, " {} {}", p.coeff_a.len(), p.coeff_b.len()).expect("write to String");
        push_f64s(&mut out, [p.dist_mean, p.dist_stddev]);
        write!(
            out,
            " {} {} {} {} {}",
            p.input_mem.len(),
            p.output_mem.len(),
            p.delay_mem.len(),
            p.init_seed,
            p.n_generated
        )
        .expect("write to String");
        push_f64s(&mut out, p.coeff_a);
        push_f64s(&mut out, p.coeff_b);
        push_f64s(&mut out, p.input_mem);
        push_f64s(&mut out, p.output_mem);
        push_f64s(&mut out, p.delay_mem);
        out
    }

    fn from_text(text: &str) -> BlockResult<Self> {
        let mut t = Tokens::new(text);
        t.tag(Self::TAG)?;
        let n_coeff_a = t.u64("n_coeff_a")? as usize;
        let n_coeff_b = t.u64("n_coeff_b")? as usize;
        let dist_mean = t.f64("dist_mean")?;
        let dist_stddev = t.f64("dist_stddev")?;
        let in_n = t.u64("in_n")? as usize;
        let out_n = t.u64("out_n")? as usize;
        let delay_n = t.u64("delay_n")? as usize;
        let init_seed = t.u64("init_seed")?;
        let n_generated = t.u64("n_generated")?;
        let parts = ArxParts {
            coeff_a: t.f64_vec(n_coeff_a, "coeff_a")?,
            coeff_b: t.f64_vec(n_coeff_b, "coeff_b")?,
            input_mem: t.f64_vec(in_n, "input_mem")?,
            output_mem: t.f64_vec(out_n, "output_mem")?,
            delay_mem: t.f64_vec(delay_n, "delay_mem")?,
            dist_mean,
            dist_stddev,
            init_seed,
            n_generated,
        };
        t.finish()?;
        Ok(parts.build())
    }
}

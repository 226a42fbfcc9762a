//! Scenario schema definitions.

use serde::{Deserialize, Serialize};

/// A complete simulation scenario: a control structure, an optional input
/// signal and a default step count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    #[serde(rename = "loop")]
    pub control_loop: BlockDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<GeneratorDef>,
    #[serde(default = "default_steps")]
    pub steps: u32,
}

fn default_steps() -> u32 {
    50
}

/// Declarative form of a SISO block tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum BlockDef {
    Pid {
        k: f64,
        ti: f64,
        td: f64,
    },
    Static {
        p1: [f64; 2],
        p2: [f64; 2],
    },
    Arx {
        coeff_a: Vec<f64>,
        coeff_b: Vec<f64>,
        delay: usize,
        #[serde(default)]
        stddev: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
    Loop {
        closed: bool,
        #[serde(default)]
        init_val: f64,
        #[serde(default)]
        children: Vec<BlockDef>,
    },
}

/// Declarative form of a generator decorator chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GeneratorDef {
    Base {
        value: f64,
        #[serde(default)]
        t_start: i32,
        #[serde(default)]
        t_end: i32,
    },
    Sine {
        amplitude: f64,
        period: u32,
        #[serde(default)]
        t_start: i32,
        #[serde(default)]
        t_end: i32,
        inner: Box<GeneratorDef>,
    },
    Pwm {
        amplitude: f64,
        period: u32,
        duty_cycle: f64,
        #[serde(default)]
        t_start: i32,
        #[serde(default)]
        t_end: i32,
        inner: Box<GeneratorDef>,
    },
    Saw {
        amplitude: f64,
        period: u32,
        #[serde(default)]
        t_start: i32,
        #[serde(default)]
        t_end: i32,
        inner: Box<GeneratorDef>,
    },
    UniformNoise {
        amplitude: f64,
        #[serde(default)]
        t_start: i32,
        #[serde(default)]
        t_end: i32,
        inner: Box<GeneratorDef>,
    },
    NormalNoise {
        mean: f64,
        stddev: f64,
        #[serde(default)]
        t_start: i32,
        #[serde(default)]
        t_end: i32,
        inner: Box<GeneratorDef>,
    },
}

impl GeneratorDef {
    /// The wrapped definition, if this is a decorator.
    pub fn inner(&self) -> Option<&GeneratorDef> {
        match self {
            GeneratorDef::Base { .. } => None,
            GeneratorDef::Sine { inner, .. }
            | GeneratorDef::Pwm { inner, .. }
            | GeneratorDef::Saw { inner, .. }
            | GeneratorDef::UniformNoise { inner, .. }
            | GeneratorDef::NormalNoise { inner, .. } => Some(inner),
        }
    }

    /// Activity window of this layer.
    pub fn window(&self) -> (i32, i32) {
        match *self {
            GeneratorDef::Base { t_start, t_end, .. }
            | GeneratorDef::Sine { t_start, t_end, .. }
            | GeneratorDef::Pwm { t_start, t_end, .. }
            | GeneratorDef::Saw { t_start, t_end, .. }
            | GeneratorDef::UniformNoise { t_start, t_end, .. }
            | GeneratorDef::NormalNoise { t_start, t_end, .. } => (t_start, t_end),
        }
    }
}

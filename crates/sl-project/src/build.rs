//! Building domain objects from scenario definitions.
//!
//! Thin mapping onto the domain constructors, which are the single place
//! where block and generator invariants are enforced.

use sl_blocks::{ArxModel, ControlLoop, PidRegulator, SisoBlock, StaticClamp};
use sl_gen::{BaseGenerator, Generator, NormalNoise, Rectangular, Sawtooth, Sinusoid, UniformNoise};

use crate::ScenarioResult;
use crate::schema::{BlockDef, GeneratorDef};

pub fn build_block(def: &BlockDef) -> ScenarioResult<Box<dyn SisoBlock>> {
    Ok(match def {
        BlockDef::Pid { k, ti, td } => Box::new(PidRegulator::new(*k, *ti, *td)?),
        BlockDef::Static { p1, p2 } => {
            Box::new(StaticClamp::new((p1[0], p1[1]), (p2[0], p2[1]))?)
        }
        BlockDef::Arx {
            coeff_a,
            coeff_b,
            delay,
            stddev,
            seed,
        } => match seed {
            Some(seed) => Box::new(ArxModel::with_seed(
                coeff_a.clone(),
                coeff_b.clone(),
                *delay,
                *stddev,
                *seed,
            )?),
            None => Box::new(ArxModel::new(
                coeff_a.clone(),
                coeff_b.clone(),
                *delay,
                *stddev,
            )?),
        },
        BlockDef::Loop {
            closed,
            init_val,
            children,
        } => {
            let mut control_loop = ControlLoop::new(*closed, *init_val);
            for child in children {
                control_loop.push_back(build_block(child)?);
            }
            Box::new(control_loop)
        }
    })
}

pub fn build_generator(def: &GeneratorDef) -> ScenarioResult<Box<dyn Generator>> {
    Ok(match def {
        GeneratorDef::Base {
            value,
            t_start,
            t_end,
        } => Box::new(BaseGenerator::new(*value, *t_start, *t_end)?),
        GeneratorDef::Sine {
            amplitude,
            period,
            t_start,
            t_end,
            inner,
        } => Box::new(Sinusoid::new(
            build_generator(inner)?,
            *amplitude,
            *period,
            *t_start,
            *t_end,
        )?),
        GeneratorDef::Pwm {
            amplitude,
            period,
            duty_cycle,
            t_start,
            t_end,
            inner,
        } => Box::new(Rectangular::new(
            build_generator(inner)?,
            *amplitude,
            *period,
            *duty_cycle,
            *t_start,
            *t_end,
        )?),
        GeneratorDef::Saw {
            amplitude,
            period,
            t_start,
            t_end,
            inner,
        } => Box::new(Sawtooth::new(
            build_generator(inner)?,
            *amplitude,
            *period,
            *t_start,
            *t_end,
        )?),
        GeneratorDef::UniformNoise {
            amplitude,
            t_start,
            t_end,
            inner,
        } => Box::new(UniformNoise::new(
            build_generator(inner)?,
            *amplitude,
            *t_start,
            *t_end,
        )?),
        GeneratorDef::NormalNoise {
            mean,
            stddev,
            t_start,
            t_end,
            inner,
        } => Box::new(NormalNoise::new(
            build_generator(inner)?,
            *mean,
            *stddev,
            *t_start,
            *t_end,
        )?),
    })
}

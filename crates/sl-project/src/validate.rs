//! Scenario validation logic.
//!
//! Structural checks over the declarative definitions, before any domain
//! object is built. The domain constructors enforce the same invariants;
//! validating first turns them into named, path-aware errors instead of a
//! failure deep inside the build.

use crate::schema::{BlockDef, GeneratorDef, Scenario};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Empty loop: the top-level loop must contain at least one block")]
    EmptyLoop,
}

fn invalid(field: &str, value: impl std::fmt::Display, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }
    if let BlockDef::Loop { children, .. } = &scenario.control_loop {
        if children.is_empty() {
            return Err(ValidationError::EmptyLoop);
        }
    }
    validate_block(&scenario.control_loop, "loop")?;
    if let Some(input) = &scenario.input {
        validate_generator(input, "input")?;
    }
    Ok(())
}

fn validate_block(block: &BlockDef, path: &str) -> Result<(), ValidationError> {
    match block {
        BlockDef::Pid { k, ti, td } => {
            for (name, v) in [("k", *k), ("ti", *ti), ("td", *td)] {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(
                        &format!("{path}.{name}"),
                        v,
                        "must be finite and nonnegative",
                    ));
                }
            }
        }
        BlockDef::Static { p1, p2 } => {
            for v in p1.iter().chain(p2) {
                if !v.is_finite() {
                    return Err(invalid(&format!("{path}.points"), v, "must be finite"));
                }
            }
            if p1[0] == p2[0] {
                return Err(invalid(
                    &format!("{path}.points"),
                    p1[0],
                    "points must have distinct x coordinates",
                ));
            }
        }
        BlockDef::Arx {
            coeff_a,
            coeff_b,
            delay,
            stddev,
            ..
        } => {
            if coeff_a.is_empty() || coeff_b.is_empty() {
                return Err(invalid(
                    &format!("{path}.coeffs"),
                    "[]",
                    "coefficient vectors must be nonempty",
                ));
            }
            if *delay < 1 {
                return Err(invalid(
                    &format!("{path}.delay"),
                    delay,
                    "must be at least 1",
                ));
            }
            if !stddev.is_finite() || *stddev < 0.0 {
                return Err(invalid(
                    &format!("{path}.stddev"),
                    stddev,
                    "must be finite and nonnegative",
                ));
            }
        }
        BlockDef::Loop { children, .. } => {
            for (i, child) in children.iter().enumerate() {
                validate_block(child, &format!("{path}.children[{i}]"))?;
            }
        }
    }
    Ok(())
}

fn validate_generator(def: &GeneratorDef, path: &str) -> Result<(), ValidationError> {
    let (t_start, t_end) = def.window();
    if t_end < t_start {
        return Err(invalid(
            &format!("{path}.window"),
            format!("({t_start}, {t_end})"),
            "t_end cannot be smaller than t_start",
        ));
    }
    match def {
        GeneratorDef::Sine { period, .. }
        | GeneratorDef::Pwm { period, .. }
        | GeneratorDef::Saw { period, .. }
            if *period == 0 =>
        {
            return Err(invalid(&format!("{path}.period"), period, "must be at least 1"));
        }
        GeneratorDef::Pwm { duty_cycle, .. }
            if !duty_cycle.is_finite() || *duty_cycle <= 0.0 || *duty_cycle >= 1.0 =>
        {
            return Err(invalid(
                &format!("{path}.duty_cycle"),
                duty_cycle,
                "must be strictly between 0 and 1",
            ));
        }
        GeneratorDef::NormalNoise { stddev, .. }
            if !stddev.is_finite() || *stddev < 0.0 =>
        {
            return Err(invalid(
                &format!("{path}.stddev"),
                stddev,
                "must be finite and nonnegative",
            ));
        }
        _ => {}
    }
    if let Some(inner) = def.inner() {
        validate_generator(inner, &format!("{path}.inner"))?;
    }
    Ok(())
}

//! Opaque binary block/generator files.
//!
//! `.lmod` holds one serialized SISO block tree, `.gens` one generator
//! chain; both are the raw wire dumps with no extra framing, so files
//! written here match blobs produced by any other tool speaking the format.

use std::path::Path;

use sl_blocks::SisoBlock;
use sl_gen::Generator;

use crate::ScenarioResult;

pub fn write_loop_file(path: &Path, block: &dyn SisoBlock) -> ScenarioResult<()> {
    std::fs::write(path, block.serialize())?;
    Ok(())
}

pub fn read_loop_file(path: &Path) -> ScenarioResult<Box<dyn SisoBlock>> {
    let data = std::fs::read(path)?;
    Ok(sl_blocks::deserialize(&data)?)
}

pub fn write_input_file(path: &Path, generator: &dyn Generator) -> ScenarioResult<()> {
    std::fs::write(path, generator.serialize())?;
    Ok(())
}

pub fn read_input_file(path: &Path) -> ScenarioResult<Box<dyn Generator>> {
    let data = std::fs::read(path)?;
    Ok(sl_gen::deserialize(&data)?)
}

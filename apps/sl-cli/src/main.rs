use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sl_blocks::{ArxModel, ControlLoop, PidRegulator, SisoBlock, StaticClamp, TextDump};
use sl_gen::{BaseGenerator, Generator, reseed_noise_engine};
use sl_project::{
    ScenarioResult, ValidationError, build_block, build_generator, load_yaml, read_loop_file,
    validate_scenario, write_input_file, write_loop_file,
};

#[derive(Parser)]
#[command(name = "sl-cli")]
#[command(about = "siso-lab CLI - SISO control loop simulation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
    /// Run a scenario and print or export the trajectory
    Run {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Override the scenario's step count
        #[arg(long)]
        steps: Option<u32>,
        /// Seed for the shared noise engine
        #[arg(long)]
        seed: Option<u64>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serialize the scenario's loop into a binary .lmod file
    ExportLoop {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Output .lmod file path
        output: PathBuf,
    },
    /// Summarize the contents of a binary .lmod file
    ShowLoop {
        /// Path to the .lmod file
        loop_path: PathBuf,
    },
    /// Serialize the scenario's input generator into a binary .gens file
    ExportInput {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Output .gens file path
        output: PathBuf,
    },
}

fn main() -> ScenarioResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run {
            scenario_path,
            steps,
            seed,
            output,
        } => cmd_run(&scenario_path, steps, seed, output.as_deref()),
        Commands::ExportLoop {
            scenario_path,
            output,
        } => cmd_export_loop(&scenario_path, &output),
        Commands::ShowLoop { loop_path } => cmd_show_loop(&loop_path),
        Commands::ExportInput {
            scenario_path,
            output,
        } => cmd_export_input(&scenario_path, &output),
    }
}

fn cmd_validate(scenario_path: &Path) -> ScenarioResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = load_yaml(scenario_path)?;
    validate_scenario(&scenario)?;
    println!("✓ Scenario is valid: {}", scenario.name);
    Ok(())
}

fn cmd_run(
    scenario_path: &Path,
    steps: Option<u32>,
    seed: Option<u64>,
    output: Option<&Path>,
) -> ScenarioResult<()> {
    let scenario = load_yaml(scenario_path)?;
    if let Some(seed) = seed {
        reseed_noise_engine(seed);
    }

    let mut block = build_block(&scenario.control_loop)?;
    let mut input: Box<dyn Generator> = match &scenario.input {
        Some(def) => build_generator(def)?,
        // Unit setpoint when the scenario declares no input signal
        None => Box::new(BaseGenerator::constant(1.0)),
    };

    let steps = steps.unwrap_or(scenario.steps);
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };
    writeln!(out, "t,setpoint,output")?;
    for t in 0..steps as i32 {
        let setpoint = input.simulate(t);
        let y = block.simulate(setpoint);
        writeln!(out, "{t},{setpoint},{y}")?;
    }
    if let Some(path) = output {
        println!("✓ Wrote {} steps to {}", steps, path.display());
    }
    Ok(())
}

fn cmd_export_loop(scenario_path: &Path, output: &Path) -> ScenarioResult<()> {
    let scenario = load_yaml(scenario_path)?;
    let block = build_block(&scenario.control_loop)?;
    write_loop_file(output, block.as_ref())?;
    println!("✓ Exported loop to {}", output.display());
    Ok(())
}

fn cmd_show_loop(loop_path: &Path) -> ScenarioResult<()> {
    let block = read_loop_file(loop_path)?;
    print_block(block.as_ref(), 0);
    Ok(())
}

fn print_block(block: &dyn SisoBlock, depth: usize) {
    let pad = "  ".repeat(depth);
    if let Some(l) = block.downcast_ref::<ControlLoop>() {
        println!(
            "{pad}loop ({}) prev_result={} children={}",
            if l.is_closed() { "closed" } else { "open" },
            l.prev_result(),
            l.len()
        );
        for i in 0..l.len() {
            if let Some(child) = l.child(i) {
                print_block(child, depth + 1);
            }
        }
    } else if let Some(pid) = block.downcast_ref::<PidRegulator>() {
        println!("{pad}{}", pid.to_text());
    } else if let Some(arx) = block.downcast_ref::<ArxModel>() {
        println!("{pad}{}", arx.to_text());
    } else if let Some(clamp) = block.downcast_ref::<StaticClamp>() {
        let (min, max) = clamp.bounds();
        println!(
            "{pad}{} y = clamp({}*u + {}, {}, {})",
            StaticClamp::TAG,
            clamp.slope(),
            clamp.offset(),
            min,
            max
        );
    } else {
        println!("{pad}{}", block.tag());
    }
}

fn cmd_export_input(scenario_path: &Path, output: &Path) -> ScenarioResult<()> {
    let scenario = load_yaml(scenario_path)?;
    let Some(def) = &scenario.input else {
        return Err(ValidationError::InvalidValue {
            field: "input".to_string(),
            value: "none".to_string(),
            reason: "scenario declares no input generator".to_string(),
        }
        .into());
    };
    let generator = build_generator(def)?;
    write_input_file(output, generator.as_ref())?;
    println!("✓ Exported input generator to {}", output.display());
    Ok(())
}

use orbsim::simulation::diagnostics::{total_energy, total_momentum};
use orbsim::{Scenario, ScenarioConfig, Snapshot};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

/// What each output line carries
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Output {
    /// frame,t,x0,y0,z0,x1,...
    Positions,
    /// frame,t,energy,px,py,pz
    Energy,
}

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file, looked up under `scenarios/` when not found as given
    #[arg(short, default_value = "solar_system.yaml")]
    file_name: String,

    /// Override the number of frames from the scenario
    #[arg(long)]
    frames: Option<usize>,

    #[arg(long, value_enum, default_value_t = Output::Positions)]
    output: Output,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let given = PathBuf::from(file_name);
    let config_path = if given.exists() {
        given
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn write_positions(out: &mut impl Write, frame: usize, snapshot: &Snapshot) -> Result<()> {
    write!(out, "{frame},{}", snapshot.t)?;
    for body in &snapshot.bodies {
        write!(out, ",{},{},{}", body.x.x, body.x.y, body.x.z)?;
    }
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;

    let mut scenario = Scenario::build_scenario(scenario_cfg).context("failed to build scenario")?;
    if let Some(frames) = args.frames {
        scenario.engine.num_frames = frames;
    }
    let g = scenario.parameters.g;

    let mut simulation = scenario.simulation()?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for frame in 0..scenario.engine.num_frames {
        simulation.step().with_context(|| format!("simulation failed at frame {frame}"))?;
        match args.output {
            Output::Positions => write_positions(&mut out, frame, &simulation.snapshot())?,
            Output::Energy => {
                let bodies = simulation.bodies();
                let energy = total_energy(&bodies, g)?;
                let p = total_momentum(&bodies);
                writeln!(out, "{frame},{},{energy},{},{},{}", simulation.time(), p.x, p.y, p.z)?;
            }
        }
    }
    out.flush()?;

    info!(frames = scenario.engine.num_frames, t = simulation.time(), "run finished");
    Ok(())
}

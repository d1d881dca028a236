use clap::Parser;
use evacuation_lib::analysis::evaluate_random_policy;
use evacuation_lib::cli::{Cli, Commands, Solver};
use evacuation_lib::config::{self, EngineConfig};
use evacuation_lib::envelope::{FailureEnvelope, SimulationOutcome};
use evacuation_lib::error::SimError;
use evacuation_lib::geometry::rasterize;
use evacuation_lib::io::results::{save_outcome_binary, save_outcome_json};
use evacuation_lib::io::scenario_store::load_scenario;
use evacuation_lib::rl::EnvConfig;
use evacuation_lib::scenario::WORLD_SIZE;
use evacuation_lib::{macroscopic, mesoscopic, microscopic};
use log::{error, info};
use std::path::PathBuf;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => {}
        Err(err) => {
            error!("{}", err);
            let envelope = FailureEnvelope::from(&err);
            match serde_json::to_string_pretty(&envelope) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("failed to render failure envelope: {}", e),
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    // DEV_MODE and the config file become explicit configuration here, at
    // the binary edge; the library itself never reads the environment
    let mut engine_config = EngineConfig::from_env();
    if let Some(path) = &cli.config {
        let file_config = EngineConfig::load(path)?;
        engine_config.mock |= file_config.mock;
        engine_config.threads = file_config.threads.or(engine_config.threads);
        engine_config.limits = file_config.limits;
    }
    engine_config.mock |= cli.mock;
    if cli.threads.is_some() {
        engine_config.threads = cli.threads;
    }

    if let Some(threads) = engine_config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| SimError::InvalidParameters(format!("thread pool: {}", e)))?;
    }

    match cli.command {
        Commands::Simulate {
            solver,
            scenario,
            grid_size,
            time_steps,
            num_agents,
            panic_factor,
            preset,
            seed,
            output,
            binary,
        } => {
            let scenario = load_scenario(&scenario)?;
            let outcome = match solver {
                Solver::Microscopic => {
                    let mut params = match config::micro_preset(&preset) {
                        Some(p) => microscopic::MicroParams::from_preset(&p),
                        None => {
                            return Err(SimError::InvalidParameters(format!(
                                "unknown microscopic preset '{}'",
                                preset
                            )));
                        }
                    };
                    params.num_agents = num_agents.unwrap_or(scenario.num_agents);
                    params.time_steps = time_steps.unwrap_or(scenario.time_steps);
                    params.panic_factor = panic_factor.unwrap_or(scenario.panic_factor);
                    params.seed = seed;
                    microscopic::simulate(&scenario, params, &engine_config)?
                }
                Solver::Mesoscopic => {
                    let mut params = match config::meso_preset(&preset) {
                        Some(p) => mesoscopic::MesoParams::from_preset(&p),
                        None => {
                            return Err(SimError::InvalidParameters(format!(
                                "unknown mesoscopic preset '{}'",
                                preset
                            )));
                        }
                    };
                    params.grid_size = grid_size.unwrap_or(params.grid_size);
                    params.time_steps = time_steps.unwrap_or(scenario.time_steps);
                    mesoscopic::simulate(&scenario, params, &engine_config)?
                }
                Solver::Macroscopic => {
                    let mut params = match config::macro_preset(&preset) {
                        Some(p) => macroscopic::MacroParams::from_preset(&p),
                        None => {
                            return Err(SimError::InvalidParameters(format!(
                                "unknown macroscopic preset '{}'",
                                preset
                            )));
                        }
                    };
                    params.grid_resolution = grid_size.unwrap_or(params.grid_resolution);
                    params.time_steps = time_steps.unwrap_or(scenario.time_steps);
                    macroscopic::simulate(&scenario, params, &engine_config)?
                }
            };
            info!(
                "simulation finished: {} recorded steps, mock={}, truncated={}",
                outcome.recorded_steps(),
                outcome.mock_data,
                outcome.truncated
            );
            emit_outcome(&outcome, output, binary)
        }

        Commands::Rollout {
            scenario,
            episodes,
            seed,
            grid_size,
            num_agents,
            output,
        } => {
            let scenario = load_scenario(&scenario)?;
            let env_config = EnvConfig {
                grid_size,
                num_agents,
                ..Default::default()
            };
            let report = evaluate_random_policy(&scenario, env_config, episodes, seed)?;
            let text = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => std::fs::write(path, text)?,
                None => println!("{}", text),
            }
            Ok(())
        }

        Commands::Validate {
            scenario,
            grid_size,
        } => {
            let scenario = load_scenario(&scenario)?;
            let raster = rasterize(&scenario, grid_size, WORLD_SIZE)?;
            println!(
                "scenario '{}' is valid: {} wall cells, {} exit cells, {} hazard kinds at {}x{}",
                scenario.name,
                raster.wall_mask.count(),
                raster.exit_mask.count(),
                raster.hazard_fields.len(),
                grid_size,
                grid_size
            );
            Ok(())
        }
    }
}

fn emit_outcome(
    outcome: &SimulationOutcome,
    output: Option<PathBuf>,
    binary: bool,
) -> Result<(), SimError> {
    match (output, binary) {
        (Some(path), true) => save_outcome_binary(outcome, &path),
        (Some(path), false) => save_outcome_json(outcome, &path),
        (None, _) => {
            let text = serde_json::to_string_pretty(outcome)?;
            println!("{}", text);
            Ok(())
        }
    }
}

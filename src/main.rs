use mapf_grid::config::{Cli, Config};
use mapf_grid::map::Map;
use mapf_grid::scenario::Scenario;
use mapf_grid::solver::{PrioritizedSearch, Solver, CBS};

use anyhow::{ensure, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::new(&cli);
    config.validate()?;

    let scenario = Scenario::load_from_scen(&config.scen_path)
        .with_context(|| format!("error loading scenario file: {}", config.scen_path))?;
    let mut rng = StdRng::seed_from_u64(config.seed as u64);
    let agents = if config.agents_dist.is_empty() {
        scenario.generate_agents_randomly(config.num_agents, &mut rng)
    } else {
        scenario.generate_agents_by_buckets(config.num_agents, config.agents_dist.clone(), &mut rng)
    }
    .map_err(|err| anyhow::anyhow!(err))?;

    if config.debug_yaml {
        Scenario::write_agents_to_yaml("debug.yaml", &agents)?;
    }

    let map = Map::from_file(&config.map_path, &agents)
        .with_context(|| format!("error loading map file: {}", config.map_path))?;
    for agent in &agents {
        ensure!(agent.verify(&map), "invalid start or goal for {agent:?}");
    }

    let solution = match config.solver.as_str() {
        "cbs" => CBS::new(agents.clone(), &map).solve(),
        "prioritized" => PrioritizedSearch::new(agents.clone(), &map).solve(),
        _ => unreachable!(),
    };

    match solution {
        Some(solution) => {
            if solution.paths.len() < agents.len() {
                warn!(
                    "planned only {} of {} agents",
                    solution.paths.len(),
                    agents.len()
                );
            } else {
                assert!(solution.verify(&map, &agents));
                info!("solution cost {}", solution.cost());
            }

            if let Some(output_path) = &config.output_path {
                let file = std::fs::File::create(output_path)
                    .with_context(|| format!("error creating output file: {output_path}"))?;
                serde_json::to_writer_pretty(file, &solution.paths)?;
                info!("solution written to {output_path}");
            }
        }
        None => error!("{} found no solution", config.solver),
    }

    Ok(())
}

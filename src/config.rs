use anyhow::anyhow;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "Grid MAPF",
    about = "Optimal and prioritized multi-agent path finding on grid maps.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(
        long,
        help = "Path to the scenario file",
        default_value = "map_file/maze-32-32-2/maze-32-32-2-random-1.scen"
    )]
    pub scen_path: String,

    #[arg(
        long,
        help = "Path to the map file",
        default_value = "map_file/maze-32-32-2/maze-32-32-2.map"
    )]
    pub map_path: String,

    #[arg(long, help = "Write the solved paths to this file as JSON")]
    pub output_path: Option<String>,

    #[arg(long, help = "Number of agents", default_value_t = 10)]
    pub num_agents: usize,

    #[arg(
        long,
        help = "Scenario bucket per agent; empty means uniform sampling",
        use_value_delimiter = true
    )]
    pub agents_dist: Vec<usize>,

    #[arg(
        long,
        help = "Seed for the random number generator",
        default_value_t = 0
    )]
    pub seed: usize,

    #[arg(long, help = "Solver to use: cbs or prioritized", default_value = "cbs")]
    pub solver: String,

    #[arg(
        long,
        help = "Dump the generated agents to debug.yaml",
        default_value_t = false
    )]
    pub debug_yaml: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scen_path: String,
    pub map_path: String,
    pub output_path: Option<String>,
    pub num_agents: usize,
    pub agents_dist: Vec<usize>,
    pub seed: usize,
    pub solver: String,
    pub debug_yaml: bool,
}

impl Config {
    pub fn new(cli: &Cli) -> Self {
        Self {
            scen_path: cli.scen_path.clone(),
            map_path: cli.map_path.clone(),
            output_path: cli.output_path.clone(),
            num_agents: cli.num_agents,
            agents_dist: cli.agents_dist.clone(),
            seed: cli.seed,
            solver: cli.solver.clone(),
            debug_yaml: cli.debug_yaml,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.solver.as_str() {
            "cbs" | "prioritized" => {}
            other => return Err(anyhow!("unknown solver {other:?}")),
        }

        if !self.agents_dist.is_empty() && self.agents_dist.len() != self.num_agents {
            return Err(anyhow!(
                "agents-dist lists {} buckets but num-agents is {}",
                self.agents_dist.len(),
                self.num_agents
            ));
        }

        if self.num_agents == 0 {
            return Err(anyhow!("num-agents must be at least 1"));
        }

        Ok(())
    }
}

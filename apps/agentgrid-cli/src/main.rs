use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use agentgrid_common::{EntityId, WorldCoord};
use agentgrid_index::SpatialGrid;
use agentgrid_kernel::{Population, PopulationConfig};
use agentgrid_tools::GridInspector;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agentgrid-cli", about = "CLI tool for agentgrid spatial index operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file with grid and population settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a wandering population and cross-check neighbour queries
    Simulate {
        /// Number of agents to spawn
        #[arg(short, long)]
        agents: Option<usize>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10")]
        ticks: u64,
        /// Seed for spawn positions and movement
        #[arg(short, long)]
        seed: Option<u64>,
        /// Perception radius for the neighbour check
        #[arg(short, long)]
        distance: Option<f32>,
    },
    /// Show which regions a view query selects
    Query {
        #[arg(long)]
        x: i32,
        #[arg(long)]
        y: i32,
        /// View distance in world units
        #[arg(short, long)]
        distance: Option<f32>,
    },
    /// Print region occupancy for a freshly spawned population
    Inspect {
        /// Number of agents to spawn
        #[arg(short, long)]
        agents: Option<usize>,
        /// Seed for spawn positions
        #[arg(short, long)]
        seed: Option<u64>,
        /// Also print occupied regions as CSV
        #[arg(long)]
        csv: bool,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PopulationConfig> {
    let Some(path) = path else {
        return Ok(PopulationConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: PopulationConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(?config, path = %path.display(), "loaded config");
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("agentgrid-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("index: {}", agentgrid_index::crate_info());
            println!("tools: {}", agentgrid_tools::crate_info());
            println!(
                "grid: world={} region={} regions/axis={}",
                config.grid.world_size,
                config.grid.region_size,
                config.grid.num_regions()?
            );
        }
        Commands::Simulate {
            agents,
            ticks,
            seed,
            distance,
        } => {
            config.agents = agents.unwrap_or(config.agents);
            config.seed = seed.unwrap_or(config.seed);
            let radius = distance.unwrap_or(config.view_distance);
            println!(
                "Simulating {} agents for {ticks} ticks (seed={}, radius={radius})",
                config.agents, config.seed
            );

            let mut population = Population::new(config)?;
            let mut timings = Vec::with_capacity(ticks as usize);
            for _ in 0..ticks {
                let start = Instant::now();
                population.step()?;
                timings.push(start.elapsed());
            }
            population.validate()?;

            let total: Duration = timings.iter().sum();
            let max = timings.iter().copied().max().unwrap_or_default();
            let mean = if timings.is_empty() {
                Duration::ZERO
            } else {
                total / timings.len() as u32
            };
            println!(
                "Ticks: {} mean={mean:?} max={max:?} total={total:?}",
                population.tick()
            );

            let sample: Vec<EntityId> = population.agents().map(|(id, _)| id).take(16).collect();
            let mut checked = 0usize;
            for id in sample {
                let fast = population.neighbours(id, radius)?;
                let slow = population.brute_force_neighbours(id, radius)?;
                if fast != slow {
                    anyhow::bail!(
                        "neighbour mismatch for {id}: grid found {}, brute force {}",
                        fast.len(),
                        slow.len()
                    );
                }
                checked += fast.len();
            }
            println!("Neighbour check: OK ({checked} neighbours across sampled agents)");
            println!("{}", GridInspector::summary(population.grid()));
        }
        Commands::Query { x, y, distance } => {
            let grid = SpatialGrid::<EntityId>::from_config(&config.grid)?;
            let view = WorldCoord::new(x, y);
            let radius = distance.unwrap_or(config.view_distance);
            let regions = grid.regions_in_view(view, radius);
            println!(
                "View {view} radius {radius}: {} region(s) of {}",
                regions.len(),
                grid.num_regions() * grid.num_regions()
            );
            for region in &regions {
                println!("  {region}");
            }
            print!("{}", GridInspector::render_view(&grid, view, radius));
        }
        Commands::Inspect { agents, seed, csv } => {
            config.agents = agents.unwrap_or(config.agents);
            config.seed = seed.unwrap_or(config.seed);
            let population = Population::new(config)?;
            println!("{}", GridInspector::summary(population.grid()));
            print!("{}", GridInspector::render_occupancy(population.grid()));
            if csv {
                let mut out = String::new();
                GridInspector::write_occupancy_csv(population.grid(), &mut out)?;
                print!("{out}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_flags() {
        let cli = Cli::parse_from(["agentgrid-cli", "simulate", "-a", "50", "-t", "3", "-d", "8.5"]);
        match cli.command {
            Commands::Simulate {
                agents,
                ticks,
                seed,
                distance,
            } => {
                assert_eq!(agents, Some(50));
                assert_eq!(ticks, 3);
                assert_eq!(seed, None);
                assert_eq!(distance, Some(8.5));
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        assert_eq!(load_config(None).unwrap(), PopulationConfig::default());
    }

    #[test]
    fn example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../agentgrid.yaml");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.grid.world_size, 512);
        assert_eq!(config.grid.region_size, 32);
        assert_eq!(config.agents, 5000);
    }
}

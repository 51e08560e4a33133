use agentgrid_common::{EntityId, WorldCoord};
use agentgrid_index::{GridConfig, GridError, GridHandle, HandleStore, HandleView, SpatialGrid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Population parameters: the grid plus how many agents to seed and how they wander.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub grid: GridConfig,
    /// Agents spawned at construction.
    pub agents: usize,
    /// Seed for spawn positions and per-tick movement.
    pub seed: u64,
    /// Largest per-axis move an agent makes in one tick.
    pub max_step: i32,
    /// Default perception radius used by callers that do not pick their own.
    pub view_distance: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            agents: 1000,
            seed: 42,
            max_step: 2,
            view_distance: 24.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("unknown agent {0}")]
    UnknownAgent(EntityId),
    #[error("agent {0} already exists")]
    DuplicateAgent(EntityId),
    #[error("invalid population config: {0}")]
    InvalidConfig(String),
}

/// A single agent as seen by the world: where it is and where the grid filed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub position: WorldCoord,
    handle: GridHandle,
}

impl Agent {
    fn at(position: WorldCoord) -> Self {
        Self {
            position,
            handle: GridHandle::default(),
        }
    }

    pub fn handle(&self) -> &GridHandle {
        &self.handle
    }
}

/// Agent storage the grid reaches into for handle bookkeeping.
#[derive(Debug, Clone, Default)]
struct Agents(BTreeMap<EntityId, Agent>);

impl HandleView<EntityId> for Agents {
    fn handle(&self, key: EntityId) -> Option<&GridHandle> {
        self.0.get(&key).map(|a| &a.handle)
    }
}

impl HandleStore<EntityId> for Agents {
    fn handle_mut(&mut self, key: EntityId) -> Option<&mut GridHandle> {
        self.0.get_mut(&key).map(|a| &mut a.handle)
    }
}

/// Moving agents kept in sync with a [`SpatialGrid`].
///
/// Agents live in a BTreeMap so ticks visit them in a fixed order; together
/// with the splitmix64 seed chain this makes a run fully reproducible.
#[derive(Debug, Clone)]
pub struct Population {
    config: PopulationConfig,
    grid: SpatialGrid<EntityId>,
    agents: Agents,
    tick: u64,
    seed: u64,
    next_id: u64,
}

impl Population {
    /// Build the grid and scatter `config.agents` agents over the world.
    pub fn new(config: PopulationConfig) -> Result<Self, PopulationError> {
        if config.max_step < 0 {
            return Err(PopulationError::InvalidConfig(format!(
                "max_step must not be negative, got {}",
                config.max_step
            )));
        }
        if !(config.view_distance.is_finite() && config.view_distance >= 0.0) {
            return Err(PopulationError::InvalidConfig(format!(
                "view_distance must be a finite non-negative number, got {}",
                config.view_distance
            )));
        }

        let grid = SpatialGrid::from_config(&config.grid)?;
        let mut population = Self {
            config,
            grid,
            agents: Agents::default(),
            tick: 0,
            seed: config.seed,
            next_id: 0,
        };

        let world_size = config.grid.world_size as u64;
        let mut state = config.seed;
        for _ in 0..config.agents {
            state = splitmix64(state);
            let x = (state % world_size) as i32;
            let y = ((state >> 32) % world_size) as i32;
            population.spawn(WorldCoord::new(x, y))?;
        }

        tracing::info!(
            agents = population.len(),
            world_size = config.grid.world_size,
            region_size = config.grid.region_size,
            "population created"
        );
        Ok(population)
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.agents.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.0.is_empty()
    }

    /// Read-only access to the grid, for queries and diagnostics.
    pub fn grid(&self) -> &SpatialGrid<EntityId> {
        &self.grid
    }

    pub fn get(&self, id: EntityId) -> Option<&Agent> {
        self.agents.0.get(&id)
    }

    /// All agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = (EntityId, &Agent)> + '_ {
        self.agents.0.iter().map(|(id, agent)| (*id, agent))
    }

    /// Spawn a new agent at `position`. Returns its id.
    pub fn spawn(&mut self, position: WorldCoord) -> Result<EntityId, PopulationError> {
        let id = EntityId::from_parts(self.config.seed, self.next_id);
        self.spawn_with_id(id, position)?;
        self.next_id += 1;
        Ok(id)
    }

    /// Spawn an agent with a caller-chosen id.
    pub fn spawn_with_id(
        &mut self,
        id: EntityId,
        position: WorldCoord,
    ) -> Result<(), PopulationError> {
        if self.agents.0.contains_key(&id) {
            return Err(PopulationError::DuplicateAgent(id));
        }
        self.agents.0.insert(id, Agent::at(position));
        if let Err(err) = self.grid.add(&mut self.agents, id, position) {
            self.agents.0.remove(&id);
            return Err(err.into());
        }
        tracing::trace!(agent = %id, %position, "spawned agent");
        Ok(())
    }

    /// Remove an agent from the world and the grid.
    pub fn despawn(&mut self, id: EntityId) -> Result<Agent, PopulationError> {
        let position = self
            .get(id)
            .map(|a| a.position)
            .ok_or(PopulationError::UnknownAgent(id))?;
        self.grid.remove(&mut self.agents, id, position)?;
        let agent = self
            .agents
            .0
            .remove(&id)
            .ok_or(PopulationError::UnknownAgent(id))?;
        tracing::trace!(agent = %id, %position, "despawned agent");
        Ok(agent)
    }

    /// Relocate an agent, keeping the grid in step.
    pub fn move_agent(&mut self, id: EntityId, to: WorldCoord) -> Result<(), PopulationError> {
        let from = self
            .get(id)
            .map(|a| a.position)
            .ok_or(PopulationError::UnknownAgent(id))?;
        self.grid.move_entity(&mut self.agents, id, from, to)?;
        if let Some(agent) = self.agents.0.get_mut(&id) {
            agent.position = to;
        }
        Ok(())
    }

    /// Advance one tick: every agent takes a bounded random step, clamped to
    /// the world. All moves land before the tick returns.
    pub fn step(&mut self) -> Result<(), PopulationError> {
        let _span = tracing::info_span!("population_step", tick = self.tick + 1).entered();

        self.tick += 1;
        self.seed = splitmix64(self.seed);

        // Offsets are drawn and applied in i64; any non-negative i32 step fits.
        let max_step = i64::from(self.config.max_step);
        let choices = 2 * max_step as u64 + 1;
        let edge = i64::from(self.config.grid.world_size - 1);
        let offset = |draw: u64| (draw % choices) as i64 - max_step;
        let shift = |from: i32, by: i64| (i64::from(from) + by).clamp(0, edge) as i32;
        let mut state = self.seed;
        let ids: Vec<EntityId> = self.agents.0.keys().copied().collect();
        for id in &ids {
            state = splitmix64(state);
            let (dx, dy) = (offset(state), offset(state >> 32));
            let Some(from) = self.get(*id).map(|a| a.position) else {
                continue;
            };
            let to = WorldCoord::new(shift(from.x, dx), shift(from.y, dy));
            self.move_agent(*id, to)?;
        }

        tracing::debug!(tick = self.tick, agents = ids.len(), "population stepped");
        Ok(())
    }

    /// Agents within `radius` of `id`, excluding `id` itself, in id order.
    ///
    /// The grid narrows the search to candidate regions; the exact distance
    /// check happens here.
    pub fn neighbours(
        &self,
        id: EntityId,
        radius: f32,
    ) -> Result<Vec<EntityId>, PopulationError> {
        let origin = self
            .get(id)
            .map(|a| a.position)
            .ok_or(PopulationError::UnknownAgent(id))?;
        let limit = f64::from(radius).powi(2);
        let mut found = Vec::new();
        self.grid.for_each_in_view(origin, radius, |other| {
            if other == id {
                return;
            }
            if let Some(agent) = self.agents.0.get(&other) {
                if (origin.distance_squared(agent.position) as f64) <= limit {
                    found.push(other);
                }
            }
        });
        found.sort_unstable();
        Ok(found)
    }

    /// Same result as [`Self::neighbours`] by scanning every agent.
    pub fn brute_force_neighbours(
        &self,
        id: EntityId,
        radius: f32,
    ) -> Result<Vec<EntityId>, PopulationError> {
        let origin = self
            .get(id)
            .map(|a| a.position)
            .ok_or(PopulationError::UnknownAgent(id))?;
        if radius.is_nan() || radius < 0.0 {
            return Ok(Vec::new());
        }
        let limit = f64::from(radius).powi(2);
        Ok(self
            .agents()
            .filter(|(other, agent)| {
                *other != id && (origin.distance_squared(agent.position) as f64) <= limit
            })
            .map(|(other, _)| other)
            .collect())
    }

    /// Check the grid invariant and that every agent is filed at its position.
    pub fn validate(&self) -> Result<(), PopulationError> {
        self.grid.validate(&self.agents)?;
        for (id, agent) in self.agents() {
            if agent.handle.coord() != Some(agent.position) {
                return Err(GridError::Corrupted(format!(
                    "agent {id} at {} is filed at {:?}",
                    agent.position,
                    agent.handle.coord()
                ))
                .into());
            }
        }
        if self.grid.len() != self.len() {
            return Err(GridError::Corrupted(format!(
                "{} agents but {} grid entries",
                self.len(),
                self.grid.len()
            ))
            .into());
        }
        Ok(())
    }
}

/// Splitmix64 step, used to derive spawn positions and per-tick moves.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

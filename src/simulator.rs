//! The backwards-in-time driver. Each step draws competing exponential waits
//! for the recombination class, migration, and per-deme coalescence, compares
//! the winner against the next scheduled demographic event, and dispatches
//! whichever comes first, until the whole sample has found a common ancestor
//! at every site.

mod builder;
mod coalescence;
mod recombination;

pub use self::builder::{
    Builder as SimulatorBuilder, TryFromBuilderError as TryFromSimulatorBuilderError,
};

use crate::demography::{DemographicEvent, Demography};
use crate::errors::SimulationError;
use crate::genealogy::RegionList;
use crate::population::Population;
use itertools::Itertools;
use rand::Rng;
use std::fmt;

/// The coalescent simulator: a fixed configuration plus the mutable state of
/// the current replicate.
///
/// See [SimulatorBuilder] for initialization options.
///
/// Example:
/// ```
/// use coalescent_simulator::prelude::*;
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
///
/// let mut simulator = Simulator::builder()
///     .with_sample_size(4)
///     .with_num_sites(1000)
///     .with_recombination_rate(5.0)
///     .build()
///     .unwrap();
///
/// let mut rng = SmallRng::seed_from_u64(1);
/// simulator.call(&mut rng).unwrap();
/// assert!(simulator.regions().iter().all(|region| region.tree.is_complete()));
/// ```
pub struct Simulator {
    pub config: SimulatorConfig,
    pub state: SimulatorState,
}

/// Run parameters, fixed at build time.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    pub sample_size: usize,
    pub num_sites: usize,
    /// Total crossover rate across the chromosome (4Nr).
    pub recombination_rate: f64,
    /// Gene-conversion to crossover ratio (g/r).
    pub conversion_ratio: f64,
    /// Mean conversion tract length in sites.
    pub track_length: f64,
    pub deme_samples: Vec<usize>,
    pub deme_sizes: Vec<f64>,
    pub growth_rates: Vec<f64>,
    pub migration: Vec<Vec<f64>>,
    pub events: Vec<DemographicEvent>,
    /// Crossover rate per link.
    pub(crate) per_link_rate: f64,
    /// Conversion initiation rate per link.
    pub(crate) conversion_rate: f64,
    /// Rate weight for conversions initiating left of the ancestral material.
    pub(crate) left_conversion_rate: f64,
    /// Probability a conversion tract continues past a link.
    pub(crate) tract_continue: f64,
    pub(crate) ln_tract_continue: f64,
}

/// Mutable state of the current replicate, readable between steps.
#[derive(Clone, Debug)]
pub struct SimulatorState {
    /// Current time in units of 4N generations.
    pub time: f64,
    pub population: Population,
    pub regions: RegionList,
    /// Total recombinable links over all live lineages.
    pub nlinks: u64,
    /// `sum over lineages of 1 - pc^links`, the left-edge conversion weight.
    pub cleft: f64,
    pub demography: Demography,
    pub events_dispatched: usize,
}

impl SimulatorState {
    pub(crate) fn new(config: &SimulatorConfig) -> Self {
        Self {
            time: 0.0,
            population: Population::from_sample(&config.deme_samples, config.num_sites),
            regions: RegionList::new(config.sample_size, config.num_sites),
            nlinks: config.sample_size as u64 * (config.num_sites as u64 - 1),
            cleft: config.sample_size as f64
                * (1.0 - config.tract_continue.powf((config.num_sites - 1) as f64)),
            demography: Demography::new(
                config.deme_sizes.clone(),
                config.growth_rates.clone(),
                config.migration.clone(),
                config.events.clone(),
            ),
            events_dispatched: 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum StochasticEvent {
    Recombination,
    Migration,
    Coalescence { deme: usize },
}

impl Simulator {
    pub fn builder() -> SimulatorBuilder {
        SimulatorBuilder::new()
    }

    /// Rebuild the start state from the configuration.
    pub fn reset(&mut self) {
        self.state = SimulatorState::new(&self.config);
    }

    /// The replicate is done once at most one lineage is left (the last
    /// common-ancestor event removes both of its inputs when every region has
    /// reached its MRCA).
    pub fn is_finished(&self) -> bool {
        self.state.population.len() <= 1
    }

    /// The genealogies, in chromosome order. Complete after a successful
    /// [call](Self::call).
    pub fn regions(&self) -> &RegionList {
        &self.state.regions
    }

    /// Run one replicate to completion. Resets the state first, so a
    /// configured simulator can be called repeatedly with fresh randomness.
    pub fn call<R: Rng>(&mut self, rng: &mut R) -> Result<(), SimulationError> {
        self.reset();
        while !self.is_finished() {
            self.step(rng)?;
        }
        log::debug!(
            "ancestry complete: {} regions, {} events, final time {:.6}",
            self.state.regions.len(),
            self.state.events_dispatched,
            self.state.time
        );
        Ok(())
    }

    /// Advance by exactly one event, stochastic or demographic.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Result<(), SimulationError> {
        let nlinks = self.state.nlinks as f64;
        let crossover_rate = nlinks * self.config.per_link_rate;
        let interior_rate = nlinks * self.config.conversion_rate;
        let left_rate = self.state.cleft * self.config.left_conversion_rate;
        let recombination_rate = crossover_rate + interior_rate + left_rate;
        let migration_rate = self
            .state
            .demography
            .migration_total(self.state.population.counts());

        if self.state.demography.num_demes() > 1
            && migration_rate == 0.0
            && self.state.demography.next_event_time().is_none()
            && self.state.population.occupied_demes() > 1
        {
            return Err(SimulationError::InfiniteCoalescentTime);
        }

        let mut candidate: Option<(f64, StochasticEvent)> = None;
        if recombination_rate > 0.0 {
            let wait = -positive_uniform(rng).ln() / recombination_rate;
            candidate = shorter(candidate, wait, StochasticEvent::Recombination);
        }
        if migration_rate > 0.0 {
            let wait = -positive_uniform(rng).ln() / migration_rate;
            candidate = shorter(candidate, wait, StochasticEvent::Migration);
        }
        for deme in 0..self.state.demography.num_demes() {
            let count = self.state.population.counts()[deme];
            if count < 2 {
                continue;
            }
            let coal_weight = (count * (count - 1)) as f64;
            let draw = positive_uniform(rng);
            let growth = self.state.demography.growth_rates[deme];
            let wait = if growth == 0.0 {
                -draw.ln() * self.state.demography.sizes[deme] / coal_weight
            } else {
                let elapsed = self.state.time - self.state.demography.growth_since[deme];
                let arg = 1.0
                    - growth * self.state.demography.sizes[deme] * (-growth * elapsed).exp()
                        * draw.ln()
                        / coal_weight;
                if arg <= 0.0 {
                    // no coalescence within the current growth interval
                    continue;
                }
                arg.ln() / growth
            };
            candidate = shorter(candidate, wait, StochasticEvent::Coalescence { deme });
        }

        let scheduled = match (candidate, self.state.demography.next_event_time()) {
            (None, None) => return Err(SimulationError::InfiniteCoalescentTime),
            (None, Some(_)) => true,
            (Some((wait, _)), Some(event_time)) => self.state.time + wait >= event_time,
            (Some(_), None) => false,
        };

        if scheduled {
            if let Some(time) = self
                .state
                .demography
                .apply_next(&mut self.state.population, rng)?
            {
                self.state.time = time;
                log::trace!("demographic event applied at time {:.6}", time);
            }
        } else if let Some((wait, event)) = candidate {
            self.state.time += wait;
            match event {
                StochasticEvent::Recombination => {
                    let which = rng.gen::<f64>();
                    if which < crossover_rate / recombination_rate {
                        log::trace!("crossover at time {:.6}", self.state.time);
                        self.apply_crossover(rng);
                    } else if which < (crossover_rate + left_rate) / recombination_rate {
                        log::trace!("left-edge conversion at time {:.6}", self.state.time);
                        self.convert_left_edge(rng);
                    } else {
                        log::trace!("interior conversion at time {:.6}", self.state.time);
                        self.convert_interior(rng);
                    }
                }
                StochasticEvent::Migration => self.apply_migration(migration_rate, rng),
                StochasticEvent::Coalescence { deme } => {
                    let (first, second) = self.state.population.pick_pair(deme, rng);
                    log::trace!("coalescence in deme {} at time {:.6}", deme, self.state.time);
                    self.coalesce(first, second);
                }
            }
        }
        self.state.events_dispatched += 1;
        Ok(())
    }

    /// Move one lineage to a new deme, the migrant weighted by its deme's
    /// outgoing rate and the destination by the per-deme rates.
    fn apply_migration<R: Rng>(&mut self, total_rate: f64, rng: &mut R) {
        let demography = &self.state.demography;
        let population = &self.state.population;

        let draw = total_rate * rng.gen::<f64>();
        let mut migrant = population.len() - 1;
        let mut sum = 0.0;
        for (index, chromosome) in population.chromosomes.iter().enumerate() {
            sum += demography.migration[chromosome.deme][chromosome.deme];
            if draw < sum {
                migrant = index;
                break;
            }
        }

        let source = population.chromosomes[migrant].deme;
        let draw = rng.gen::<f64>() * demography.migration[source][source];
        let mut destination = source;
        let mut sum = 0.0;
        for deme in 0..demography.num_demes() {
            if deme == source {
                continue;
            }
            destination = deme;
            sum += demography.migration[source][deme];
            if draw < sum {
                break;
            }
        }

        log::trace!(
            "migration {} -> {} at time {:.6}",
            source,
            destination,
            self.state.time
        );
        self.state.population.migrate(migrant, destination);
    }
}

fn shorter(
    candidate: Option<(f64, StochasticEvent)>,
    wait: f64,
    event: StochasticEvent,
) -> Option<(f64, StochasticEvent)> {
    match candidate {
        Some((best, _)) if best <= wait => candidate,
        _ => Some((wait, event)),
    }
}

/// Uniform in (0, 1); the zero draw is rejected so `ln` stays finite.
fn positive_uniform<R: Rng>(rng: &mut R) -> f64 {
    loop {
        let draw: f64 = rng.gen();
        if draw > 0.0 {
            return draw;
        }
    }
}

impl fmt::Display for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "simulator:")?;
        writeln!(f, "  sample_size: {}", self.config.sample_size)?;
        writeln!(f, "  num_sites: {}", self.config.num_sites)?;
        writeln!(
            f,
            "  recombination_rate: {}, conversion_ratio: {}, track_length: {}",
            self.config.recombination_rate, self.config.conversion_ratio, self.config.track_length
        )?;
        writeln!(
            f,
            "  deme_samples: [{}]",
            self.config.deme_samples.iter().join(", ")
        )?;
        writeln!(f, "  scheduled events: {}", self.config.events.len())?;
        write!(
            f,
            "  time: {:.6}, lineages: {}, regions: {}",
            self.state.time,
            self.state.population.len(),
            self.state.regions.len()
        )
    }
}

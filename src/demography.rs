//! The scheduled demographic history: relative deme sizes, exponential
//! growth, the migration matrix, and the timed events that change them.
//!
//! All rates and times are in the standard coalescent scaling (4N
//! generations); `migration[i][j]` is the backwards-in-time rate at which a
//! lineage in deme `i` traces its ancestry to deme `j`, and `migration[i][i]`
//! holds deme `i`'s total outgoing rate.

use crate::errors::SimulationError;
use crate::population::Population;
use rand::Rng;
use std::collections::VecDeque;

/// A change to the demographic model taking effect at a fixed time.
#[derive(Clone, Debug, PartialEq)]
pub struct DemographicEvent {
    pub time: f64,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// Set every deme to a fixed relative size and stop its growth.
    GlobalSize(f64),
    /// Set one deme to a fixed relative size and stop its growth.
    DemeSize { deme: usize, size: f64 },
    /// Set every deme's exponential growth rate, folding accrued growth into
    /// the sizes first.
    GlobalGrowth(f64),
    /// Set one deme's exponential growth rate.
    DemeGrowth { deme: usize, rate: f64 },
    /// Island-model migration: the given total outgoing rate per deme, spread
    /// uniformly over the other demes.
    SymmetricMigration(f64),
    /// Replace the migration matrix wholesale. Diagonals are recomputed as
    /// row sums of the off-diagonal entries.
    MigrationMatrix(Vec<Vec<f64>>),
    /// Set a single backwards rate `from -> to`, keeping the diagonal
    /// consistent with the row total.
    MigrationRate { from: usize, to: usize, rate: f64 },
    /// Backwards in time: every lineage of `from` moves to `to`, and all
    /// migration into `from` stops.
    Join { from: usize, to: usize },
    /// A new deme appears; each lineage of `deme` stays put with probability
    /// `proportion`, otherwise it moves to the new deme.
    Split { deme: usize, proportion: f64 },
}

impl DemographicEvent {
    pub fn global_size(time: f64, size: f64) -> Self {
        Self {
            time,
            kind: EventKind::GlobalSize(size),
        }
    }

    pub fn deme_size(time: f64, deme: usize, size: f64) -> Self {
        Self {
            time,
            kind: EventKind::DemeSize { deme, size },
        }
    }

    pub fn global_growth(time: f64, rate: f64) -> Self {
        Self {
            time,
            kind: EventKind::GlobalGrowth(rate),
        }
    }

    pub fn deme_growth(time: f64, deme: usize, rate: f64) -> Self {
        Self {
            time,
            kind: EventKind::DemeGrowth { deme, rate },
        }
    }

    pub fn symmetric_migration(time: f64, rate: f64) -> Self {
        Self {
            time,
            kind: EventKind::SymmetricMigration(rate),
        }
    }

    pub fn migration_matrix(time: f64, matrix: Vec<Vec<f64>>) -> Self {
        Self {
            time,
            kind: EventKind::MigrationMatrix(matrix),
        }
    }

    pub fn migration_rate(time: f64, from: usize, to: usize, rate: f64) -> Self {
        Self {
            time,
            kind: EventKind::MigrationRate { from, to, rate },
        }
    }

    pub fn join(time: f64, from: usize, to: usize) -> Self {
        Self {
            time,
            kind: EventKind::Join { from, to },
        }
    }

    pub fn split(time: f64, deme: usize, proportion: f64) -> Self {
        Self {
            time,
            kind: EventKind::Split { deme, proportion },
        }
    }
}

/// The mutable demographic state of a run, plus the queue of events still to
/// come. Readable between steps.
#[derive(Clone, Debug)]
pub struct Demography {
    pub sizes: Vec<f64>,
    pub growth_rates: Vec<f64>,
    /// Per deme, the time its current growth rate took effect.
    pub growth_since: Vec<f64>,
    pub migration: Vec<Vec<f64>>,
    pending: VecDeque<DemographicEvent>,
}

impl Demography {
    pub(crate) fn new(
        sizes: Vec<f64>,
        growth_rates: Vec<f64>,
        migration: Vec<Vec<f64>>,
        events: Vec<DemographicEvent>,
    ) -> Self {
        let num_demes = sizes.len();
        Self {
            sizes,
            growth_rates,
            growth_since: vec![0.0; num_demes],
            migration,
            pending: VecDeque::from(events),
        }
    }

    pub fn num_demes(&self) -> usize {
        self.sizes.len()
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.pending.front().map(|event| event.time)
    }

    /// Total instantaneous migration rate given the per-deme lineage counts.
    pub fn migration_total(&self, counts: &[usize]) -> f64 {
        self.migration
            .iter()
            .enumerate()
            .map(|(deme, row)| counts[deme] as f64 * row[deme])
            .sum()
    }

    /// Apply the next pending event, returning its time (the simulation clock
    /// snaps to it). Returns `Ok(None)` when the queue is empty.
    pub(crate) fn apply_next<R: Rng>(
        &mut self,
        population: &mut Population,
        rng: &mut R,
    ) -> Result<Option<f64>, SimulationError> {
        let event = match self.pending.pop_front() {
            Some(event) => event,
            None => return Ok(None),
        };
        let time = event.time;
        let num_demes = self.num_demes();
        match event.kind {
            EventKind::GlobalSize(size) => {
                for deme in 0..num_demes {
                    self.sizes[deme] = size;
                    self.growth_rates[deme] = 0.0;
                }
            }
            EventKind::DemeSize { deme, size } => {
                self.check_deme(deme, time)?;
                self.sizes[deme] = size;
                self.growth_rates[deme] = 0.0;
            }
            EventKind::GlobalGrowth(rate) => {
                for deme in 0..num_demes {
                    self.fold_growth(deme, time);
                    self.growth_rates[deme] = rate;
                    self.growth_since[deme] = time;
                }
            }
            EventKind::DemeGrowth { deme, rate } => {
                self.check_deme(deme, time)?;
                self.fold_growth(deme, time);
                self.growth_rates[deme] = rate;
                self.growth_since[deme] = time;
            }
            EventKind::SymmetricMigration(rate) => {
                for i in 0..num_demes {
                    for j in 0..num_demes {
                        self.migration[i][j] = if num_demes > 1 {
                            rate / (num_demes as f64 - 1.0)
                        } else {
                            0.0
                        };
                    }
                }
                for deme in 0..num_demes {
                    self.migration[deme][deme] = if num_demes > 1 { rate } else { 0.0 };
                }
            }
            EventKind::MigrationMatrix(matrix) => {
                if matrix.len() != num_demes || matrix.iter().any(|row| row.len() != num_demes) {
                    return Err(SimulationError::InvalidDemographicEvent { time, num_demes });
                }
                self.migration = matrix;
                self.rebuild_diagonal();
            }
            EventKind::MigrationRate { from, to, rate } => {
                self.check_deme(from, time)?;
                self.check_deme(to, time)?;
                self.migration[from][from] += rate - self.migration[from][to];
                self.migration[from][to] = rate;
            }
            EventKind::Join { from, to } => {
                self.check_deme(from, time)?;
                self.check_deme(to, time)?;
                for index in 0..population.len() {
                    if population.chromosomes[index].deme == from {
                        population.migrate(index, to);
                    }
                }
                for deme in 0..num_demes {
                    if deme != from {
                        self.migration[deme][deme] -= self.migration[deme][from];
                        self.migration[deme][from] = 0.0;
                    }
                }
            }
            EventKind::Split { deme, proportion } => {
                self.check_deme(deme, time)?;
                self.sizes.push(1.0);
                self.growth_rates.push(0.0);
                self.growth_since.push(time);
                for row in self.migration.iter_mut() {
                    row.push(0.0);
                }
                self.migration.push(vec![0.0; num_demes + 1]);
                population.add_deme();
                let new_deme = num_demes;
                for index in 0..population.len() {
                    if population.chromosomes[index].deme == deme
                        && rng.gen::<f64>() >= proportion
                    {
                        population.migrate(index, new_deme);
                    }
                }
            }
        }
        Ok(Some(time))
    }

    fn check_deme(&self, deme: usize, time: f64) -> Result<(), SimulationError> {
        if deme < self.num_demes() {
            Ok(())
        } else {
            Err(SimulationError::InvalidDemographicEvent {
                time,
                num_demes: self.num_demes(),
            })
        }
    }

    /// Fold the growth accrued since `growth_since` into the deme's size.
    fn fold_growth(&mut self, deme: usize, time: f64) {
        let rate = self.growth_rates[deme];
        self.sizes[deme] *= (-rate * (time - self.growth_since[deme])).exp();
    }

    fn rebuild_diagonal(&mut self) {
        for i in 0..self.migration.len() {
            let total: f64 = self.migration[i]
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, rate)| rate)
                .sum();
            self.migration[i][i] = total;
        }
    }
}

use crate::demography::DemographicEvent;
use crate::simulator::{Simulator, SimulatorConfig, SimulatorState};
use std::cmp::Ordering;

pub use crate::errors::TryFromSimulatorBuilderError as TryFromBuilderError;

/// Builder for [Simulator](crate::simulator::Simulator). Only the sample size
/// is required; everything else defaults to a single constant-size deme with
/// no recombination, no gene conversion, and no scheduled events.
#[derive(Clone, Debug)]
pub struct Builder {
    pub sample_size: Option<usize>,
    pub num_sites: Option<usize>,
    pub recombination_rate: f64,
    pub conversion_ratio: f64,
    pub track_length: f64,
    pub deme_samples: Option<Vec<usize>>,
    pub deme_sizes: Option<Vec<f64>>,
    pub growth_rates: Option<Vec<f64>>,
    pub migration: Option<Vec<Vec<f64>>>,
    pub symmetric_migration: Option<f64>,
    pub events: Vec<DemographicEvent>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    pub fn with_num_sites(mut self, num_sites: usize) -> Self {
        self.num_sites = Some(num_sites);
        self
    }

    /// Total crossover rate across the chromosome (4Nr).
    pub fn with_recombination_rate(mut self, rate: f64) -> Self {
        self.recombination_rate = rate;
        self
    }

    /// Gene conversion: the conversion to crossover ratio (g/r) and the mean
    /// tract length in sites.
    pub fn with_gene_conversion(mut self, ratio: f64, track_length: f64) -> Self {
        self.conversion_ratio = ratio;
        self.track_length = track_length;
        self
    }

    /// Sampled gametes per deme; the number of demes follows from the length.
    pub fn with_deme_samples(mut self, deme_samples: Vec<usize>) -> Self {
        self.deme_samples = Some(deme_samples);
        self
    }

    /// Relative deme sizes (in units of the reference 4N).
    pub fn with_deme_sizes(mut self, deme_sizes: Vec<f64>) -> Self {
        self.deme_sizes = Some(deme_sizes);
        self
    }

    /// Exponential growth rate per deme.
    pub fn with_growth_rates(mut self, growth_rates: Vec<f64>) -> Self {
        self.growth_rates = Some(growth_rates);
        self
    }

    /// Full backwards migration matrix; diagonals are recomputed as row sums
    /// of the off-diagonal entries.
    pub fn with_migration_matrix(mut self, migration: Vec<Vec<f64>>) -> Self {
        self.migration = Some(migration);
        self
    }

    /// Island-model migration with the given total outgoing rate (4Nm) per
    /// deme.
    pub fn with_symmetric_migration(mut self, rate: f64) -> Self {
        self.symmetric_migration = Some(rate);
        self
    }

    pub fn with_demographic_event(mut self, event: DemographicEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_demographic_events(mut self, events: Vec<DemographicEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn build(self) -> Result<Simulator, TryFromBuilderError> {
        self.try_into()
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            sample_size: None,
            num_sites: None,
            recombination_rate: 0.0,
            conversion_ratio: 0.0,
            track_length: 1.0,
            deme_samples: None,
            deme_sizes: None,
            growth_rates: None,
            migration: None,
            symmetric_migration: None,
            events: Vec::new(),
        }
    }
}

impl TryFrom<Builder> for Simulator {
    type Error = TryFromBuilderError;

    fn try_from(builder: Builder) -> Result<Self, Self::Error> {
        let sample_size = match builder.sample_size {
            None => return Err(TryFromBuilderError("Simulator requires a sample_size")),
            Some(sample_size) if sample_size < 2 => {
                return Err(TryFromBuilderError(
                    "Simulator requires a sample_size of at least 2",
                ))
            }
            Some(sample_size) => sample_size,
        };
        let num_sites = builder.num_sites.unwrap_or(2);
        if num_sites == 0 {
            return Err(TryFromBuilderError(
                "Simulator requires a num_sites of at least 1",
            ));
        }
        if !(builder.recombination_rate >= 0.0) {
            return Err(TryFromBuilderError(
                "Simulator requires a non-negative recombination_rate",
            ));
        }
        if !(builder.conversion_ratio >= 0.0) {
            return Err(TryFromBuilderError(
                "Simulator requires a non-negative conversion_ratio",
            ));
        }
        if (builder.recombination_rate > 0.0 || builder.conversion_ratio > 0.0) && num_sites < 2 {
            return Err(TryFromBuilderError(
                "recombination and gene conversion require a num_sites of at least 2",
            ));
        }
        if builder.conversion_ratio > 0.0 && !(builder.track_length >= 1.0) {
            return Err(TryFromBuilderError(
                "gene conversion requires a track_length of at least 1",
            ));
        }

        let deme_samples = builder.deme_samples.unwrap_or_else(|| vec![sample_size]);
        if deme_samples.is_empty() {
            return Err(TryFromBuilderError(
                "Simulator requires at least one deme in deme_samples",
            ));
        }
        if deme_samples.iter().sum::<usize>() != sample_size {
            return Err(TryFromBuilderError(
                "deme_samples must sum to the sample_size",
            ));
        }
        let num_demes = deme_samples.len();

        let deme_sizes = builder.deme_sizes.unwrap_or_else(|| vec![1.0; num_demes]);
        if deme_sizes.len() != num_demes {
            return Err(TryFromBuilderError(
                "deme_sizes must have one entry per deme",
            ));
        }
        if deme_sizes.iter().any(|&size| !(size > 0.0)) {
            return Err(TryFromBuilderError("deme_sizes must be positive"));
        }
        let growth_rates = builder.growth_rates.unwrap_or_else(|| vec![0.0; num_demes]);
        if growth_rates.len() != num_demes {
            return Err(TryFromBuilderError(
                "growth_rates must have one entry per deme",
            ));
        }

        if builder.migration.is_some() && builder.symmetric_migration.is_some() {
            return Err(TryFromBuilderError(
                "provide either a migration matrix or a symmetric migration rate, not both",
            ));
        }
        let mut migration = if let Some(matrix) = builder.migration {
            if matrix.len() != num_demes || matrix.iter().any(|row| row.len() != num_demes) {
                return Err(TryFromBuilderError(
                    "the migration matrix must be square with one row per deme",
                ));
            }
            let off_diagonal_negative = matrix.iter().enumerate().any(|(i, row)| {
                row.iter()
                    .enumerate()
                    .any(|(j, &rate)| i != j && !(rate >= 0.0))
            });
            if off_diagonal_negative {
                return Err(TryFromBuilderError(
                    "migration rates must be non-negative",
                ));
            }
            matrix
        } else if let Some(rate) = builder.symmetric_migration {
            if !(rate >= 0.0) {
                return Err(TryFromBuilderError(
                    "the symmetric migration rate must be non-negative",
                ));
            }
            if num_demes > 1 {
                vec![vec![rate / (num_demes as f64 - 1.0); num_demes]; num_demes]
            } else {
                vec![vec![0.0]]
            }
        } else {
            vec![vec![0.0; num_demes]; num_demes]
        };
        for i in 0..num_demes {
            migration[i][i] = (0..num_demes)
                .filter(|&j| j != i)
                .map(|j| migration[i][j])
                .sum();
        }

        if builder.events.iter().any(|event| !(event.time >= 0.0)) {
            return Err(TryFromBuilderError(
                "demographic event times must be non-negative",
            ));
        }
        let mut events = builder.events;
        events.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));

        let per_link_rate = if num_sites > 1 {
            builder.recombination_rate / (num_sites - 1) as f64
        } else {
            0.0
        };
        let tract_continue = if builder.conversion_ratio > 0.0 {
            (builder.track_length - 1.0) / builder.track_length
        } else {
            1.0
        };
        let conversion_rate = if per_link_rate > 0.0 {
            per_link_rate * builder.conversion_ratio
        } else if num_sites > 1 {
            builder.conversion_ratio / (num_sites - 1) as f64
        } else {
            0.0
        };

        let config = SimulatorConfig {
            sample_size,
            num_sites,
            recombination_rate: builder.recombination_rate,
            conversion_ratio: builder.conversion_ratio,
            track_length: builder.track_length,
            deme_samples,
            deme_sizes,
            growth_rates,
            migration,
            events,
            per_link_rate,
            conversion_rate,
            left_conversion_rate: conversion_rate * builder.track_length,
            tract_continue,
            ln_tract_continue: tract_continue.ln(),
        };
        let state = SimulatorState::new(&config);
        Ok(Simulator { config, state })
    }
}

use thiserror::Error;

/// Error returned when a simulator builder has invalid or missing configuration.
/// Contains a descriptive message about what went wrong (e.g. missing sample size,
/// inconsistent deme configuration).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TryFromSimulatorBuilderError(pub &'static str);

/// Fatal conditions that end a replicate early. Both are non-recoverable for
/// the current replicate; the simulator state is left readable but the run is
/// not a valid sample from the model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// No stochastic event has a positive rate and no demographic event is
    /// pending, so the waiting time to the next event is infinite. Typically
    /// caused by non-communicating demes, or by a negative growth rate in the
    /// last time interval.
    #[error("infinite coalescent time: no finite-rate event and no pending demographic event")]
    InfiniteCoalescentTime,
    /// A demographic event referenced a deme outside the current deme range,
    /// or carried a migration matrix of the wrong dimension.
    #[error("demographic event at time {time} is invalid for {num_demes} demes")]
    InvalidDemographicEvent { time: f64, num_demes: usize },
}

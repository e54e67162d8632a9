//! Re-exports for typical simulator usage.

pub use crate::chromosome::{Chromosome, Segment};
pub use crate::demography::{DemographicEvent, Demography, EventKind};
pub use crate::errors::{SimulationError, TryFromSimulatorBuilderError};
pub use crate::genealogy::{Node, Region, RegionList, Tree};
pub use crate::population::Population;
pub use crate::simulator::{Simulator, SimulatorBuilder, SimulatorConfig, SimulatorState};

//! A backwards-in-time coalescent simulator for a structured population, with
//! crossover recombination, gene conversion, migration, variable deme sizes,
//! exponential growth, and scheduled demographic events (joins, splits,
//! migration changes).
//!
//! The simulator traces the ancestry of a sample of chromosomes as a dynamic
//! set of lineages, each a list of segments still ancestral to the sample.
//! Recombination splits lineages, coalescence merges them, and every
//! non-recombining region of the chromosome accumulates its own genealogy.
//! The result is the ancestral recombination graph, rendered as a
//! chromosome-ordered list of regions with one tree each.
//!
//! There are three main elements:
//! * The [SimulatorBuilder](crate::simulator::SimulatorBuilder) (the model:
//!   sample layout, rates, demography)
//! * The [Simulator](crate::simulator::Simulator) (the driver: one call per
//!   replicate, or single steps for instrumentation)
//! * The [RegionList](crate::genealogy::RegionList) (the output: regions and
//!   their genealogies)
//!
//! ## Quick Usage
//!
//! ```rust
//! use coalescent_simulator::prelude::*;
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! // two demes exchanging migrants, crossover along 1000 sites
//! let mut simulator = Simulator::builder()
//!     .with_sample_size(6)
//!     .with_num_sites(1000)
//!     .with_recombination_rate(5.0)
//!     .with_deme_samples(vec![3, 3])
//!     .with_symmetric_migration(2.0)
//!     .build()
//!     .unwrap();
//!
//! // a randomness provider implementing trait rand::Rng
//! let mut rng = SmallRng::seed_from_u64(0);
//! simulator.call(&mut rng).unwrap();
//!
//! // every region carries a complete genealogy of the 6 sampled gametes
//! for region in simulator.regions().iter() {
//!     assert!(region.tree.is_complete());
//!     assert!(region.tree.time_to_mrca() > 0.0);
//! }
//! ```
//!
//! The simulator is strictly sequential and owns all of its state; replicates
//! are independent, so running many of them in parallel is the caller's
//! prerogative (one simulator and one RNG per thread).

pub mod chromosome;
pub mod demography;
pub mod errors;
pub mod genealogy;
pub mod population;
pub mod prelude;
pub mod simulator;

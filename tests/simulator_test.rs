mod support;

#[cfg(test)]
mod simulator_tests {
    use crate::support;
    use approx::assert_abs_diff_eq;
    use coalescent_simulator::demography::DemographicEvent;
    use coalescent_simulator::errors::SimulationError;
    use coalescent_simulator::simulator::Simulator;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Drive one replicate to completion, re-checking every bookkeeping
    /// invariant after every single event.
    fn run_checked(simulator: &mut Simulator, seed: u64) -> Result<(), SimulationError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        support::assert_invariants(simulator);
        while !simulator.is_finished() {
            simulator.step(&mut rng)?;
            support::assert_invariants(simulator);
        }
        Ok(())
    }

    #[test]
    fn test_pair_at_a_single_site() {
        let mut simulator = Simulator::builder()
            .with_sample_size(2)
            .with_num_sites(1)
            .build()
            .unwrap();
        run_checked(&mut simulator, 7).unwrap();

        let regions = simulator.regions();
        assert_eq!(regions.len(), 1);
        let tree = &regions.get(0).tree;
        assert_eq!(tree.nodes().len(), 3);
        assert_eq!(tree.root(), 2);
        assert!(tree.is_complete());
        assert!(tree.time_to_mrca() > 0.0);
        assert_eq!(tree.node(0).time, 0.0);
        assert_eq!(tree.node(0).parent, Some(2));
        assert_eq!(tree.node(1).parent, Some(2));
        assert_eq!(tree.node(2).parent, None);
        assert_abs_diff_eq!(
            tree.total_branch_length(),
            2.0 * tree.time_to_mrca(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_three_samples_without_recombination() {
        let mut simulator = Simulator::builder()
            .with_sample_size(3)
            .with_num_sites(100)
            .build()
            .unwrap();
        run_checked(&mut simulator, 3).unwrap();

        let regions = simulator.regions();
        assert_eq!(regions.len(), 1);
        let tree = &regions.get(0).tree;
        assert_eq!(tree.nodes().len(), 5);
        assert_eq!(tree.root(), 4);
        // coalescences are assigned in time order
        assert!(tree.node(3).time > 0.0);
        assert!(tree.node(4).time > tree.node(3).time);
        assert_eq!(tree.time_to_mrca(), tree.node(4).time);
    }

    #[test]
    fn test_recombination_subdivides_the_chromosome() {
        let mut most_regions = 0;
        for seed in 0..10 {
            let mut simulator = Simulator::builder()
                .with_sample_size(4)
                .with_num_sites(1000)
                .with_recombination_rate(10.0)
                .build()
                .unwrap();
            run_checked(&mut simulator, seed).unwrap();

            most_regions = most_regions.max(simulator.regions().len());
            for region in simulator.regions().iter() {
                let tree = &region.tree;
                assert!(tree.is_complete());
                assert_eq!(tree.nodes().len(), 7);
                assert_eq!(tree.root(), 6);
                assert!(tree.time_to_mrca() > 0.0);
            }
        }
        assert!(most_regions > 1);
    }

    #[test]
    fn test_gene_conversion_creates_interior_regions() {
        let mut most_regions = 0;
        for seed in 0..10 {
            let mut simulator = Simulator::builder()
                .with_sample_size(4)
                .with_num_sites(100)
                .with_gene_conversion(1.0, 5.0)
                .build()
                .unwrap();
            run_checked(&mut simulator, seed).unwrap();
            most_regions = most_regions.max(simulator.regions().len());
        }
        // tracts of mean length 5 over 100 sites must subdivide sometimes
        assert!(most_regions > 1);
    }

    #[test]
    fn test_crossover_and_conversion_together() {
        for seed in 0..5 {
            let mut simulator = Simulator::builder()
                .with_sample_size(5)
                .with_num_sites(500)
                .with_recombination_rate(4.0)
                .with_gene_conversion(0.5, 10.0)
                .build()
                .unwrap();
            run_checked(&mut simulator, seed).unwrap();
            assert!(simulator
                .regions()
                .iter()
                .all(|region| region.tree.is_complete()));
        }
    }

    #[test]
    fn test_two_demes_meet_through_migration() {
        let mut simulator = Simulator::builder()
            .with_sample_size(4)
            .with_num_sites(1)
            .with_deme_samples(vec![2, 2])
            .with_migration_matrix(vec![vec![0.0, 0.5], vec![0.5, 0.0]])
            .build()
            .unwrap();

        let mut rng = SmallRng::seed_from_u64(21);
        let mut saw_single_deme = false;
        while !simulator.is_finished() {
            simulator.step(&mut rng).unwrap();
            support::assert_invariants(&simulator);
            if simulator.state.population.len() >= 2
                && simulator.state.population.occupied_demes() == 1
            {
                saw_single_deme = true;
            }
        }
        // the final pair can only coalesce once migration has united it
        assert!(saw_single_deme);
        assert!(simulator.regions().get(0).tree.is_complete());
    }

    #[test]
    fn test_disconnected_demes_abort() {
        let mut simulator = Simulator::builder()
            .with_sample_size(4)
            .with_deme_samples(vec![2, 2])
            .build()
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(4);
        assert_eq!(
            simulator.call(&mut rng),
            Err(SimulationError::InfiniteCoalescentTime)
        );
    }

    #[test]
    fn test_join_event_rescues_disconnected_demes() {
        let mut simulator = Simulator::builder()
            .with_sample_size(4)
            .with_deme_samples(vec![2, 2])
            .with_demographic_event(DemographicEvent::join(0.5, 1, 0))
            .build()
            .unwrap();

        let mut rng = SmallRng::seed_from_u64(17);
        let mut joined = false;
        while !simulator.is_finished() {
            simulator.step(&mut rng).unwrap();
            support::assert_invariants(&simulator);
            if !joined && simulator.state.time >= 0.5 {
                // the first event at or past 0.5 is the join itself
                joined = true;
                assert_eq!(simulator.state.time, 0.5);
                assert_eq!(simulator.state.population.counts()[1], 0);
                assert_eq!(
                    simulator.state.population.counts()[0],
                    simulator.state.population.len()
                );
            }
        }
        assert!(joined);
        assert!(simulator.regions().get(0).tree.is_complete());
    }

    #[test]
    fn test_expected_time_to_mrca() {
        // E[TMRCA] = 2 * (1 - 1/n) in 4N units for a panmictic constant-size
        // deme; n = 5 gives 1.6
        let mut simulator = Simulator::builder().with_sample_size(5).build().unwrap();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut times = Vec::with_capacity(600);
        for _ in 0..600 {
            simulator.call(&mut rng).unwrap();
            let tree = &simulator.regions().get(0).tree;
            assert!(tree.is_complete());
            times.push(tree.time_to_mrca());
        }
        let mean = stats::mean(times.iter().copied());
        assert_abs_diff_eq!(mean, 1.6, epsilon = 0.25);
    }

    #[test]
    fn test_growth_shortens_the_genealogy() {
        let mut simulator = Simulator::builder()
            .with_sample_size(2)
            .with_growth_rates(vec![100.0])
            .build()
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(23);
        let mut times = Vec::with_capacity(200);
        for _ in 0..200 {
            simulator.call(&mut rng).unwrap();
            times.push(simulator.regions().get(0).tree.time_to_mrca());
        }
        // under strong growth the pair coalesces almost immediately,
        // far below the constant-size expectation of 1.0
        assert!(stats::mean(times.iter().copied()) < 0.2);
    }

    #[test]
    fn test_split_event_proportions_are_binomial() {
        let mut simulator = Simulator::builder()
            .with_sample_size(20)
            .with_demographic_event(DemographicEvent::split(0.05, 0, 0.3))
            .with_demographic_event(DemographicEvent::join(0.5, 1, 0))
            .build()
            .unwrap();

        let mut rng = SmallRng::seed_from_u64(29);
        let mut fractions = Vec::with_capacity(200);
        for _ in 0..200 {
            simulator.reset();
            let mut recorded = false;
            while !simulator.is_finished() {
                simulator.step(&mut rng).unwrap();
                if !recorded && simulator.state.population.num_demes() == 2 {
                    recorded = true;
                    let counts = simulator.state.population.counts();
                    fractions
                        .push(counts[0] as f64 / simulator.state.population.len() as f64);
                }
            }
        }
        assert_eq!(fractions.len(), 200);
        assert_abs_diff_eq!(stats::mean(fractions.iter().copied()), 0.3, epsilon = 0.06);
    }

    #[test]
    fn test_repeated_calls_reset_the_state() {
        let mut simulator = Simulator::builder()
            .with_sample_size(4)
            .with_num_sites(200)
            .with_recombination_rate(2.0)
            .build()
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(31);
        simulator.call(&mut rng).unwrap();
        let first_time = simulator.state.time;
        simulator.call(&mut rng).unwrap();
        assert!(simulator.state.time > 0.0);
        assert_ne!(simulator.state.time, first_time);
        assert!(simulator
            .regions()
            .iter()
            .all(|region| region.tree.is_complete()));
    }
}

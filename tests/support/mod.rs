use coalescent_simulator::simulator::Simulator;

/// Check every bookkeeping invariant the simulator maintains incrementally
/// against a recomputation from first principles. Cheap enough to run after
/// every event in tests.
pub fn assert_invariants(simulator: &Simulator) {
    let state = &simulator.state;
    let config = &simulator.config;

    let total: usize = state.population.counts().iter().sum();
    assert_eq!(total, state.population.len(), "deme counts out of sync");

    let nlinks: u64 = state
        .population
        .chromosomes
        .iter()
        .map(|chromosome| chromosome.links())
        .sum();
    assert_eq!(nlinks, state.nlinks, "nlinks out of sync");

    let pc = if config.conversion_ratio > 0.0 {
        (config.track_length - 1.0) / config.track_length
    } else {
        1.0
    };
    let cleft: f64 = state
        .population
        .chromosomes
        .iter()
        .map(|chromosome| 1.0 - pc.powf(chromosome.links() as f64))
        .sum();
    assert!(
        (cleft - state.cleft).abs() < 1e-6,
        "cleft out of sync: {} vs {}",
        cleft,
        state.cleft
    );

    let begs: Vec<usize> = state.regions.iter().map(|region| region.beg).collect();
    assert_eq!(begs.len(), state.regions.len(), "region chain loses entries");
    assert_eq!(begs[0], 0, "first region must start at site 0");
    assert!(
        begs.windows(2).all(|pair| pair[0] < pair[1]),
        "region begs not strictly increasing: {:?}",
        begs
    );
    assert!(begs.iter().all(|&beg| beg < state.regions.num_sites()));

    for index in state.regions.walk() {
        let region = state.regions.get(index);
        let carriers = state
            .population
            .chromosomes
            .iter()
            .filter(|chromosome| {
                let mut cursor = 0;
                chromosome.contains_from(region.beg, &mut cursor)
            })
            .count();
        let parentless = region
            .tree
            .nodes()
            .iter()
            .filter(|node| node.parent.is_none())
            .count();
        if region.tree.is_complete() {
            assert_eq!(parentless, 1, "complete tree must have exactly the root free");
            assert_eq!(carriers, 0, "complete region still carried by a lineage");
        } else {
            assert_eq!(
                parentless, carriers,
                "region at {} has {} free nodes but {} carriers",
                region.beg, parentless, carriers
            );
        }
    }
}

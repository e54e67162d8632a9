//! The arena of live lineages. Lineages are addressed by dense index; removal
//! swaps the last slot in, so indices are not stable across deletions.
//! Per-deme occupancy counts are maintained on every mutation.

use crate::chromosome::Chromosome;
use rand::Rng;

/// Extra lineage slots reserved whenever the arena runs out of capacity.
const GROWTH_CHUNK: usize = 40;

#[derive(Clone, Debug)]
pub struct Population {
    pub chromosomes: Vec<Chromosome>,
    counts: Vec<usize>,
}

impl Population {
    /// One lineage per sampled gamete, laid out deme by deme; tip indices run
    /// in the same order.
    pub fn from_sample(deme_samples: &[usize], num_sites: usize) -> Self {
        let total: usize = deme_samples.iter().sum();
        let mut chromosomes = Vec::with_capacity(total + 20);
        let mut desc = 0;
        for (deme, &samples) in deme_samples.iter().enumerate() {
            for _ in 0..samples {
                chromosomes.push(Chromosome::sample(num_sites, deme, desc));
                desc += 1;
            }
        }
        Self {
            chromosomes,
            counts: deme_samples.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Live-lineage count per deme.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn num_demes(&self) -> usize {
        self.counts.len()
    }

    /// Demes with at least one live lineage.
    pub fn occupied_demes(&self) -> usize {
        self.counts.iter().filter(|&&count| count > 0).count()
    }

    pub fn push(&mut self, chromosome: Chromosome) {
        if self.chromosomes.len() == self.chromosomes.capacity() {
            self.chromosomes.reserve_exact(GROWTH_CHUNK);
        }
        self.counts[chromosome.deme] += 1;
        self.chromosomes.push(chromosome);
    }

    /// Remove the lineage at `index` by swapping the last slot in.
    pub fn swap_remove(&mut self, index: usize) -> Chromosome {
        let chromosome = self.chromosomes.swap_remove(index);
        self.counts[chromosome.deme] -= 1;
        chromosome
    }

    /// Move the lineage at `index` to another deme.
    pub fn migrate(&mut self, index: usize, deme: usize) {
        let source = self.chromosomes[index].deme;
        self.counts[source] -= 1;
        self.counts[deme] += 1;
        self.chromosomes[index].deme = deme;
    }

    /// Register a new, initially empty deme.
    pub fn add_deme(&mut self) {
        self.counts.push(0);
    }

    /// Two distinct lineages uniform within `deme`, which must hold at least
    /// two. Returns arena indices in ascending order.
    pub fn pick_pair<R: Rng>(&self, deme: usize, rng: &mut R) -> (usize, usize) {
        let within = self.counts[deme];
        let first = rng.gen_range(0..within);
        let mut second = rng.gen_range(0..within);
        while second == first {
            second = rng.gen_range(0..within);
        }
        let (low, high) = if first < second {
            (first, second)
        } else {
            (second, first)
        };

        let mut pair = (0, 0);
        let mut ordinal = 0;
        for (index, chromosome) in self.chromosomes.iter().enumerate() {
            if chromosome.deme != deme {
                continue;
            }
            if ordinal == low {
                pair.0 = index;
            }
            if ordinal == high {
                pair.1 = index;
                break;
            }
            ordinal += 1;
        }
        pair
    }
}

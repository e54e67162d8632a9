//! Crossover and gene-conversion operators: pick the cut point, split the
//! lineage, and keep the link and conversion-weight accounting in balance.

use super::{positive_uniform, Simulator};
use crate::chromosome::{Chromosome, Segment};
use rand::Rng;

impl Simulator {
    /// Crossover at a uniformly chosen link; the trailing fragment becomes a
    /// new lineage in the same deme. Returns the index of the cut lineage.
    pub(crate) fn apply_crossover<R: Rng>(&mut self, rng: &mut R) -> usize {
        let (chromosome, site) = self.locate_link(rng);
        self.split_lineage(chromosome, site);
        chromosome
    }

    /// Map a uniform draw in `[1, nlinks]` to a (lineage, cut site) pair by
    /// walking the per-lineage link spans.
    fn locate_link<R: Rng>(&self, rng: &mut R) -> (usize, usize) {
        let mut spot = ((self.state.nlinks as f64 * rng.gen::<f64>()) as u64 + 1).min(self.state.nlinks);
        let mut index = 0;
        loop {
            let span = self.state.population.chromosomes[index].links();
            if spot <= span {
                break;
            }
            spot -= span;
            index += 1;
        }
        let beg = self.state.population.chromosomes[index].first().beg;
        (index, beg + spot as usize - 1)
    }

    /// Gene conversion initiating left of the ancestral material: pick a
    /// lineage weighted by `1 - pc^links`, then a truncated-geometric cut
    /// offset from its left edge. Returns the index of the cut lineage.
    pub(crate) fn convert_left_edge<R: Rng>(&mut self, rng: &mut R) -> usize {
        let pc = self.config.tract_continue;
        let mut target = self.state.cleft * rng.gen::<f64>();
        while target == 0.0 {
            target = self.state.cleft * rng.gen::<f64>();
        }

        let last = self.state.population.len() - 1;
        let mut index = 0;
        let mut sum = 1.0 - pc.powf(self.state.population.chromosomes[0].links() as f64);
        while sum < target && index < last {
            index += 1;
            sum += 1.0 - pc.powf(self.state.population.chromosomes[index].links() as f64);
        }

        let span = self.state.population.chromosomes[index].links() as usize;
        let beg = self.state.population.chromosomes[index].first().beg;
        let draw = rng.gen::<f64>();
        let offset = (1.0
            + (1.0 - (1.0 - pc.powf(span as f64)) * draw).ln() / self.config.ln_tract_continue)
            .floor() as usize;
        let site = (beg + offset.max(1) - 1).min(beg + span - 1);
        self.split_lineage(index, site);
        index
    }

    /// Gene conversion initiating inside the ancestral material. The tract
    /// either runs off the end of the material (a plain crossover), ends in a
    /// gap before the split-off fragment (the pieces are stitched straight
    /// back together), or gets excised into its own lineage. Returns the cut
    /// lineage, or `None` when the event was a net no-op.
    pub(crate) fn convert_interior<R: Rng>(&mut self, rng: &mut R) -> Option<usize> {
        let (chromosome, site) = self.locate_link(rng);
        let material_end = self.state.population.chromosomes[chromosome].last().end;
        self.split_lineage(chromosome, site);

        let tract =
            (1.0 + positive_uniform(rng).ln() / self.config.ln_tract_continue).floor() as usize;
        if site + tract >= material_end {
            return Some(chromosome);
        }
        let fragment = self.state.population.len() - 1;
        if site + tract < self.state.population.chromosomes[fragment].first().beg {
            self.coalesce(chromosome, fragment);
            return None;
        }
        self.split_lineage(fragment, site + tract);
        let trailing = self.state.population.len() - 1;
        self.coalesce(chromosome, trailing);
        Some(chromosome)
    }

    /// Cut the lineage after `site`: the suffix of its material becomes a new
    /// lineage, and when the cut lands inside a segment the site after it
    /// becomes a region boundary (inserting a region whose tree starts as a
    /// copy of its predecessor's).
    pub(crate) fn split_lineage(&mut self, chromosome: usize, site: usize) {
        let pc = self.config.tract_continue;
        let old_links = self.state.population.chromosomes[chromosome].links();
        self.state.cleft -= 1.0 - pc.powf(old_links as f64);

        let lineage = &mut self.state.population.chromosomes[chromosome];
        let mut cut = 0;
        while site >= lineage.segments[cut].end {
            cut += 1;
        }
        let inside = site >= lineage.segments[cut].beg;

        let mut suffix: Vec<Segment> = lineage.segments[cut..].to_vec();
        if inside {
            suffix[0].beg = site + 1;
            lineage.segments[cut].end = site;
        }
        lineage.segments.truncate(cut + inside as usize);

        let gap = (suffix[0].beg - lineage.last().end) as u64;
        self.state.nlinks -= gap;
        self.state.cleft += 1.0 - pc.powf(lineage.links() as f64);
        let suffix_links = (suffix[suffix.len() - 1].end - suffix[0].beg) as f64;
        self.state.cleft += 1.0 - pc.powf(suffix_links);

        let deme = lineage.deme;
        let boundary = if inside { Some(suffix[0].beg) } else { None };
        self.state.population.push(Chromosome {
            segments: suffix,
            deme,
        });
        if let Some(beg) = boundary {
            self.state.regions.split_at(beg);
        }
    }
}

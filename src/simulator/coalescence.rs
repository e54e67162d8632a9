//! The common-ancestor operator: merge two lineages region by region,
//! growing each shared region's genealogy by one node.

use super::Simulator;
use crate::chromosome::Segment;

impl Simulator {
    /// Merge the lineages at `first` and `second` (`first < second`) at the
    /// current time. Regions carried by both gain an internal node; a region
    /// whose tree saturates has found its MRCA and drops out of the merged
    /// lineage. When nothing remains, both lineages are removed.
    pub(crate) fn coalesce(&mut self, first: usize, mut second: usize) {
        let num_tips = self.config.sample_size;
        let pc = self.config.tract_continue;
        let time = self.state.time;

        let mut merged: Vec<Segment> = Vec::new();
        let mut cursor_first = 0;
        let mut cursor_second = 0;
        let order: Vec<usize> = self.state.regions.walk().collect();
        for &region in &order {
            let (beg, end) = self.state.regions.span(region);
            let in_first =
                self.state.population.chromosomes[first].contains_from(beg, &mut cursor_first);
            let in_second =
                self.state.population.chromosomes[second].contains_from(beg, &mut cursor_second);
            if !in_first && !in_second {
                continue;
            }
            if in_first && in_second {
                let desc_first =
                    self.state.population.chromosomes[first].segments[cursor_first].desc;
                let desc_second =
                    self.state.population.chromosomes[second].segments[cursor_second].desc;
                let tree = &mut self.state.regions.get_mut(region).tree;
                let node = tree.assign_internal();
                tree.set_parent(desc_first, node);
                tree.set_parent(desc_second, node);
                tree.set_time(node, time);
                if node < 2 * num_tips - 2 {
                    merged.push(Segment {
                        beg,
                        end,
                        desc: node,
                    });
                }
            } else {
                let desc = if in_first {
                    self.state.population.chromosomes[first].segments[cursor_first].desc
                } else {
                    self.state.population.chromosomes[second].segments[cursor_second].desc
                };
                merged.push(Segment { beg, end, desc });
            }
        }

        let links = self.state.population.chromosomes[first].links();
        self.state.nlinks -= links;
        self.state.cleft -= 1.0 - pc.powf(links as f64);

        if merged.is_empty() {
            // every shared region found its MRCA; both lineages die
            let last = self.state.population.len() - 1;
            self.state.population.swap_remove(first);
            if second == last {
                second = first;
            }
        } else {
            self.state.population.chromosomes[first].segments = merged;
            let links = self.state.population.chromosomes[first].links();
            self.state.nlinks += links;
            self.state.cleft += 1.0 - pc.powf(links as f64);
        }

        let links = self.state.population.chromosomes[second].links();
        self.state.nlinks -= links;
        self.state.cleft -= 1.0 - pc.powf(links as f64);
        self.state.population.swap_remove(second);
    }
}

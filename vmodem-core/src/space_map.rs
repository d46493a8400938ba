//! Space map: a coarse 9x10 grid over the constellation plane, giving the
//! trellis decoder a single candidate point per subset (trellis state)
//! for any received sample without scanning the whole constellation.

use crate::constellation::Constellation;
use crate::sample::Sample;

const REGIONS_X: usize = 9;
const REGIONS_Y: usize = 10;
const NUM_REGIONS: usize = REGIONS_X * REGIONS_Y;
const NUM_SUBSETS: usize = 8;

#[derive(Debug, Clone)]
pub struct SpaceMap {
    x_min: f32,
    y_min: f32,
    x_scale: f32,
    y_scale: f32,
    table: Vec<[u32; NUM_SUBSETS]>,
}

impl SpaceMap {
    /// Builds the grid once for a constellation. Points are partitioned
    /// into 8 subsets by `symbol_index % 8`, matching the trellis coded
    /// bits occupying the low 3 bits of the constellation index.
    pub fn build(constellation: &Constellation) -> Self {
        let max_abs = constellation
            .points()
            .iter()
            .map(|p| p.re.abs().max(p.im.abs()))
            .fold(0.0f32, f32::max)
            * 1.3;
        let x_min = -max_abs;
        let y_min = -max_abs;
        let x_scale = REGIONS_X as f32 / (2.0 * max_abs);
        let y_scale = REGIONS_Y as f32 / (2.0 * max_abs);

        let mut table = vec![[0u32; NUM_SUBSETS]; NUM_REGIONS];
        for (region, entry) in table.iter_mut().enumerate() {
            let rx = region % REGIONS_X;
            let ry = region / REGIONS_X;
            let center = Sample::new(
                x_min + (rx as f32 + 0.5) / x_scale,
                y_min + (ry as f32 + 0.5) / y_scale,
            );
            for (subset, slot) in entry.iter_mut().enumerate() {
                *slot = nearest_in_subset(constellation, center, subset);
            }
        }

        Self {
            x_min,
            y_min,
            x_scale,
            y_scale,
            table,
        }
    }

    fn region_of(&self, sample: Sample) -> usize {
        let rx = (((sample.re - self.x_min) * self.x_scale) as isize)
            .clamp(0, REGIONS_X as isize - 1) as usize;
        let ry = (((sample.im - self.y_min) * self.y_scale) as isize)
            .clamp(0, REGIONS_Y as isize - 1) as usize;
        ry * REGIONS_X + rx
    }

    /// The best candidate symbol for each of the 8 trellis subsets, for
    /// whichever region `sample` falls in.
    pub fn candidates(&self, sample: Sample) -> &[u32; NUM_SUBSETS] {
        &self.table[self.region_of(sample)]
    }
}

fn nearest_in_subset(constellation: &Constellation, center: Sample, subset: usize) -> u32 {
    let mut best = subset as u32 % constellation.len() as u32;
    let mut best_dist = f32::MAX;
    for (i, &p) in constellation.points().iter().enumerate() {
        if i % NUM_SUBSETS != subset {
            continue;
        }
        let d = (center - p).norm_sqr();
        if d < best_dist {
            best_dist = d;
            best = i as u32;
        }
    }
    best
}

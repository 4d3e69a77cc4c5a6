//! Regular lattice over an axis-aligned box, visited point by point.

use nalgebra::DVector;

use crate::options::Resolution;

/// `res + 1 + 2 * pad` points per axis, spaced `(hi - lo) / res`.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    origin: DVector<f64>,
    step: DVector<f64>,
    counts: Vec<usize>,
}

impl Grid {
    /// Lattice over `[lo, hi]`, extended by `pad` steps on every side.
    /// Flat axes collapse to a single coordinate.
    pub fn covering(lo: &DVector<f64>, hi: &DVector<f64>, res: Resolution, pad: usize) -> Self {
        let n = res.get();
        let step = (hi - lo) / n as f64;
        let counts = step
            .iter()
            .map(|&s| if s > 0.0 { n + 1 + 2 * pad } else { 1 })
            .collect();
        let origin = lo - &step * pad as f64;
        Self {
            origin,
            step,
            counts,
        }
    }

    /// Largest spacing over all axes.
    pub fn max_step(&self) -> f64 {
        self.step.amax()
    }

    /// Visit every lattice point, last axis fastest.
    pub fn for_each<F: FnMut(&DVector<f64>)>(&self, mut f: F) {
        let dim = self.counts.len();
        if dim == 0 {
            return;
        }
        let mut idx = vec![0usize; dim];
        let mut p = self.origin.clone();
        loop {
            f(&p);
            let mut axis = dim;
            loop {
                if axis == 0 {
                    return;
                }
                axis -= 1;
                idx[axis] += 1;
                if idx[axis] < self.counts[axis] {
                    p[axis] = self.origin[axis] + idx[axis] as f64 * self.step[axis];
                    break;
                }
                idx[axis] = 0;
                p[axis] = self.origin[axis];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn visits_every_point_once() {
        let g = Grid::covering(
            &dvector![0.0, 0.0],
            &dvector![1.0, 2.0],
            Resolution::new(4).unwrap(),
            1,
        );
        let mut seen = Vec::new();
        g.for_each(|p| seen.push((p[0], p[1])));
        assert_eq!(seen.len(), 49);
        assert_eq!(seen[0], (-0.25, -0.5));
        let last = seen[seen.len() - 1];
        assert!((last.0 - 1.25).abs() < 1e-12 && (last.1 - 2.5).abs() < 1e-12);
        assert!((g.max_step() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn flat_axis_collapses() {
        let g = Grid::covering(
            &dvector![0.0, 1.0],
            &dvector![1.0, 1.0],
            Resolution::new(10).unwrap(),
            0,
        );
        let mut count = 0;
        g.for_each(|p| {
            assert_eq!(p[1], 1.0);
            count += 1;
        });
        assert_eq!(count, 11);
    }
}

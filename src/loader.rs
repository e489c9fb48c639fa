//! Shuffled, equally sized mini-batches over an indexable dataset.

use ndarray::{Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{BallisticsError, Result};

/// Fixed-length collection with positional access to `(parameters, observations)` rows
pub trait IndexedDataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row pair at `index`. May panic for `index >= len()`.
    fn item(&self, index: usize) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>);
}

/// One pass over a dataset in random order.
///
/// Every batch has exactly `batch_size` rows; a trailing incomplete batch is
/// dropped, and no row appears twice within a pass.
pub struct ShuffledBatches<'a, D: ?Sized> {
    dataset: &'a D,
    order: Vec<usize>,
    batch_size: usize,
    position: usize,
}

impl<'a, D: IndexedDataset + ?Sized> ShuffledBatches<'a, D> {
    pub fn new<R: Rng + ?Sized>(dataset: &'a D, batch_size: usize, rng: &mut R) -> Result<Self> {
        if batch_size == 0 {
            return Err(BallisticsError::config("batch size must be positive"));
        }
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.shuffle(rng);

        Ok(Self {
            dataset,
            order,
            batch_size,
            position: 0,
        })
    }

    /// Number of full batches in one pass
    pub fn num_batches(&self) -> usize {
        self.order.len() / self.batch_size
    }
}

impl<'a, D: IndexedDataset + ?Sized> Iterator for ShuffledBatches<'a, D> {
    type Item = (Array2<f64>, Array2<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.position + self.batch_size;
        if end > self.order.len() {
            return None;
        }
        let indices = &self.order[self.position..end];
        self.position = end;

        let (x0, y0) = self.dataset.item(indices[0]);
        let mut xs = Array2::zeros((self.batch_size, x0.len()));
        let mut ys = Array2::zeros((self.batch_size, y0.len()));
        for (row, &index) in indices.iter().enumerate() {
            let (x, y) = self.dataset.item(index);
            xs.row_mut(row).assign(&x);
            ys.row_mut(row).assign(&y);
        }
        Some((xs, ys))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.position) / self.batch_size;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Row i holds parameters (i, i, i, i) and observation 10 i
    struct Counting {
        x: Array2<f64>,
        y: Array2<f64>,
    }

    impl Counting {
        fn new(n: usize) -> Self {
            Self {
                x: Array2::from_shape_fn((n, 4), |(i, _)| i as f64),
                y: Array2::from_shape_fn((n, 1), |(i, _)| 10.0 * i as f64),
            }
        }
    }

    impl IndexedDataset for Counting {
        fn len(&self) -> usize {
            self.x.nrows()
        }

        fn item(&self, index: usize) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
            (self.x.row(index), self.y.row(index))
        }
    }

    #[test]
    fn test_batches_equal_sized_and_disjoint() {
        let data = Counting::new(103);
        let mut rng = StdRng::seed_from_u64(0);
        let batches: Vec<_> = ShuffledBatches::new(&data, 10, &mut rng).unwrap().collect();

        assert_eq!(batches.len(), 10);
        let mut seen = HashSet::new();
        for (x, y) in &batches {
            assert_eq!(x.dim(), (10, 4));
            assert_eq!(y.dim(), (10, 1));
            for (xr, yr) in x.rows().into_iter().zip(y.rows()) {
                assert_eq!(yr[0], 10.0 * xr[0]);
                assert!(seen.insert(xr[0] as usize));
            }
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_order_is_shuffled() {
        let data = Counting::new(50);
        let mut rng = StdRng::seed_from_u64(1);
        let (x, _) = ShuffledBatches::new(&data, 50, &mut rng).unwrap().next().unwrap();
        let order: Vec<f64> = x.column(0).to_vec();
        let identity: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_ne!(order, identity);
    }

    #[test]
    fn test_size_hint_and_small_dataset() {
        let data = Counting::new(7);
        let mut rng = StdRng::seed_from_u64(2);
        let batches = ShuffledBatches::new(&data, 3, &mut rng).unwrap();
        assert_eq!(batches.num_batches(), 2);
        assert_eq!(batches.size_hint(), (2, Some(2)));

        let too_big = ShuffledBatches::new(&data, 8, &mut rng).unwrap();
        assert_eq!(too_big.count(), 0);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let data = Counting::new(4);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(ShuffledBatches::new(&data, 0, &mut rng).is_err());
    }
}

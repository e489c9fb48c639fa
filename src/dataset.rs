//! Lazily generated, persisted inverse-problem dataset.
//!
//! A dataset of `n` rows is served from stored artifacts when they hold at
//! least `n` rows and regenerated otherwise. Parameters and observations are
//! only ever reused as a pair: fresh parameters always get fresh observations.

use log::{debug, info, warn};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use std::sync::Once;

use crate::error::{BallisticsError, Result};
use crate::loader::IndexedDataset;
use crate::model::ForwardModel;
use crate::storage::{decode_array, encode_array, ArtifactKey, ArtifactRole, ArtifactStore};

static NO_STORE_WARNING: Once = Once::new();

/// Fixed-length dataset of `(parameter row, observation row)` pairs
#[derive(Debug, Clone)]
pub struct InverseBallisticsDataset<M> {
    model: M,
    n: usize,
    suffix: String,
    x: Array2<f64>,
    y: Array2<f64>,
}

impl<M: ForwardModel> InverseBallisticsDataset<M> {
    /// Load or generate `n` samples of `model`.
    ///
    /// With `store == None` the data lives in memory only and a repeat run
    /// generates it again. Errors are limited to failed writes to the store
    /// and a forward process that does not return one row per parameter row.
    pub fn new<R: Rng + ?Sized>(
        model: M,
        n: usize,
        mut store: Option<&mut dyn ArtifactStore>,
        suffix: &str,
        rng: &mut R,
    ) -> Result<Self> {
        if store.is_none() {
            NO_STORE_WARNING.call_once(|| {
                warn!(
                    "InverseBallisticsDataset: no data directory specified, generated data will not be stored"
                );
            });
        }

        let x_key = ArtifactKey::new(model.name(), ArtifactRole::Parameters, suffix);
        let y_key = ArtifactKey::new(model.name(), ArtifactRole::Observations, suffix);

        let cached_x = store
            .as_deref()
            .and_then(|s| load_rows(s, &x_key, n, model.n_parameters()));
        let (x, fresh_x) = match cached_x {
            Some(x) => (x, false),
            None => {
                info!(
                    "InverseBallisticsDataset: not enough data for model \"{}\" found, generating {} new samples...",
                    model.name(),
                    n
                );
                let x = model.sample_prior(n, rng);
                if let Some(s) = store.as_deref_mut() {
                    persist(s, &x_key, &x)?;
                }
                (x, true)
            }
        };

        let cached_y = if fresh_x {
            None
        } else {
            store
                .as_deref()
                .and_then(|s| load_rows(s, &y_key, n, model.n_observations()))
        };
        let y = match cached_y {
            Some(y) => y,
            None => {
                info!(
                    "InverseBallisticsDataset: not enough labels for model \"{}\" found, running forward process on {} samples...",
                    model.name(),
                    n
                );
                let y = model.forward_process(x.view())?;
                if y.nrows() != x.nrows() {
                    return Err(BallisticsError::shape(format!(
                        "forward process returned {} rows for {} parameter rows",
                        y.nrows(),
                        x.nrows()
                    )));
                }
                if let Some(s) = store.as_deref_mut() {
                    persist(s, &y_key, &y)?;
                }
                y
            }
        };

        Ok(Self {
            model,
            n,
            suffix: x_key.suffix().to_string(),
            x,
            y,
        })
    }
}

impl<M> InverseBallisticsDataset<M> {
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Pair at `index`, `None` past the end
    pub fn get(&self, index: usize) -> Option<(ArrayView1<'_, f64>, ArrayView1<'_, f64>)> {
        if index < self.n {
            Some((self.x.row(index), self.y.row(index)))
        } else {
            None
        }
    }

    pub fn parameters(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn observations(&self) -> ArrayView2<'_, f64> {
        self.y.view()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Normalized artifact suffix
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.x, self.y)
    }
}

impl<M> IndexedDataset for InverseBallisticsDataset<M> {
    fn len(&self) -> usize {
        self.n
    }

    fn item(&self, index: usize) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
        (self.x.row(index), self.y.row(index))
    }
}

/// First `n` rows of a stored artifact, or `None` if it is missing, unreadable,
/// too short or has the wrong width.
fn load_rows<S: ArtifactStore + ?Sized>(
    store: &S,
    key: &ArtifactKey,
    n: usize,
    columns: usize,
) -> Option<Array2<f64>> {
    let bytes = match store.load(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!("{} not found in {}", key.file_stem(), store.location());
            return None;
        }
        Err(e) => {
            debug!("cannot read {} from {}: {}", key.file_stem(), store.location(), e);
            return None;
        }
    };

    let array = match decode_array(&bytes) {
        Ok(array) => array,
        Err(e) => {
            debug!("cannot decode {}: {}", key.file_stem(), e);
            return None;
        }
    };

    if array.nrows() < n || array.ncols() != columns {
        debug!(
            "{} has shape {:?}, need at least ({}, {})",
            key.file_stem(),
            array.dim(),
            n,
            columns
        );
        return None;
    }

    Some(array.slice(s![..n, ..]).to_owned())
}

fn persist<S: ArtifactStore + ?Sized>(store: &mut S, key: &ArtifactKey, array: &Array2<f64>) -> Result<()> {
    let bytes = encode_array(array)?;
    store.save(key, &bytes)?;
    debug!("stored {} ({} rows) in {}", key.file_stem(), array.nrows(), store.location());
    Ok(())
}

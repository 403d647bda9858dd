//! Parallel prediction over one layout subset.
//!
//! Every worker owns a private [`Predictor`], built once from the factory,
//! and decodes its shard sequentially. Results travel back over a channel
//! tagged with their global index and are merged into input order.

use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use sw_decode::{DecodeError, PredictionList, Predictor};

use crate::dataset::SubsetItem;
use crate::error::{PredictError, Result};
use crate::partition::{partition, Shard};

/// Builds the predictor a worker decodes with.
pub trait PredictorFactory: Sync {
    fn build(&self) -> std::result::Result<Predictor, DecodeError>;
}

impl<F> PredictorFactory for F
where
    F: Fn() -> std::result::Result<Predictor, DecodeError> + Sync,
{
    fn build(&self) -> std::result::Result<Predictor, DecodeError> {
        self()
    }
}

/// A trajectory whose decode failed; its slot holds an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// One list per input trajectory, in input order.
    pub predictions: Vec<PredictionList>,
    /// Sorted by index.
    pub failures: Vec<DecodeFailure>,
}

impl DispatchOutcome {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

enum WorkerMessage {
    Decoded {
        index: usize,
        predictions: PredictionList,
        failure: Option<String>,
    },
    LoadFailed {
        worker: usize,
        error: DecodeError,
    },
}

const PROGRESS_TEMPLATE: &str =
    "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}";

pub struct ParallelDispatcher {
    workers: usize,
    label: String,
    show_progress: bool,
}

impl ParallelDispatcher {
    /// `label` names the binding in logs, progress output and errors.
    pub fn new(workers: usize, label: impl Into<String>) -> Self {
        Self {
            workers: workers.max(1),
            label: label.into(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::with_template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(self.label.clone());
        bar.enable_steady_tick(Duration::from_millis(250));
        bar
    }

    /// Decode every trajectory of `items`, returning one list per item in
    /// input order.
    ///
    /// A decode error on one trajectory, or an item whose curve was rejected
    /// at load time, is recorded in the outcome. A worker
    /// that cannot build its predictor fails the whole call with
    /// [`PredictError::ModelLoad`]; a worker that panics fails it with
    /// [`PredictError::Dispatch`] listing every index left without a result.
    pub fn run<F>(&self, items: &[SubsetItem<'_>], factory: &F) -> Result<DispatchOutcome>
    where
        F: PredictorFactory + ?Sized,
    {
        let shards = partition(items, self.workers);
        let progress = self.progress_bar(items.len());
        let mut slots: Vec<Option<PredictionList>> = vec![None; items.len()];
        let mut failures = Vec::new();
        let mut load_errors = Vec::new();
        let mut crashed = Vec::new();

        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            let handles: Vec<_> = shards
                .into_iter()
                .map(|shard| {
                    let tx = tx.clone();
                    let label = self.label.as_str();
                    let worker = shard.worker;
                    let handle = thread::Builder::new()
                        .name(format!("sw-worker-{}", worker))
                        .spawn_scoped(scope, move || run_shard(label, shard, factory, &tx));
                    (worker, handle)
                })
                .collect();
            drop(tx);

            for msg in rx {
                match msg {
                    WorkerMessage::Decoded {
                        index,
                        predictions,
                        failure,
                    } => {
                        if let Some(reason) = failure {
                            failures.push(DecodeFailure { index, reason });
                        }
                        slots[index] = Some(predictions);
                        progress.inc(1);
                    }
                    WorkerMessage::LoadFailed { worker, error } => {
                        load_errors.push((worker, error))
                    }
                }
            }

            for (worker, handle) in handles {
                match handle {
                    Ok(h) => {
                        if h.join().is_err() {
                            tracing::error!(binding = %self.label, worker, "worker panicked");
                            crashed.push(worker);
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            binding = %self.label,
                            worker,
                            error = %e,
                            "failed to spawn worker"
                        );
                        crashed.push(worker);
                    }
                }
            }
        });
        progress.finish_and_clear();

        if let Some((worker, error)) = load_errors.into_iter().next() {
            tracing::error!(
                binding = %self.label,
                worker,
                error = %error,
                "worker could not load its model"
            );
            return Err(PredictError::ModelLoad {
                binding: self.label.clone(),
                source: error,
            });
        }

        let missing: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_none().then_some(i))
            .collect();
        if !missing.is_empty() {
            return Err(PredictError::Dispatch {
                missing,
                reason: format!(
                    "worker(s) {:?} of {} stopped before finishing",
                    crashed, self.label
                ),
            });
        }

        failures.sort_by_key(|f| f.index);
        Ok(DispatchOutcome {
            predictions: slots.into_iter().flatten().collect(),
            failures,
        })
    }
}

fn run_shard<F>(
    label: &str,
    shard: Shard<SubsetItem<'_>>,
    factory: &F,
    tx: &Sender<WorkerMessage>,
) where
    F: PredictorFactory + ?Sized,
{
    let worker = shard.worker;
    if shard.is_empty() {
        tracing::debug!(binding = label, worker, "empty shard, not loading a model");
        return;
    }
    let range = shard.range();
    tracing::debug!(
        binding = label,
        worker,
        start = range.start,
        end = range.end,
        "worker starting"
    );

    let predictor = match factory.build() {
        Ok(p) => p,
        Err(error) => {
            let _ = tx.send(WorkerMessage::LoadFailed { worker, error });
            return;
        }
    };

    for work in shard.items {
        let decoded = match work.item {
            Ok(trajectory) => predictor.predict(trajectory).map_err(|e| e.to_string()),
            Err(reason) => Err(reason.to_string()),
        };
        let msg = match decoded {
            Ok(predictions) => WorkerMessage::Decoded {
                index: work.index,
                predictions,
                failure: None,
            },
            Err(reason) => {
                tracing::warn!(binding = label, index = work.index, %reason, "decode failed");
                WorkerMessage::Decoded {
                    index: work.index,
                    predictions: PredictionList::empty(),
                    failure: Some(reason),
                }
            }
        };
        if tx.send(msg).is_err() {
            return;
        }
    }
    tracing::debug!(binding = label, worker, "worker finished");
}

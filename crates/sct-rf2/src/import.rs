//! Bulk import pipeline.
//!
//! Topology: one reader/parser thread streams rows into a bounded component
//! channel; the batching consumer accumulates per-kind batches and hands
//! each full batch to a worker pool that sorts it into key order and writes
//! it to the store. Admission to the pool is gated by a ticket set sized to
//! the worker count, so the parser blocks when the writers are saturated.

use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use indicatif::{ProgressBar, ProgressStyle};
use sct_store::EntityStore;
use sct_types::{Component, Concept, Description, RefsetItem, Relationship};
use tracing::info;

use crate::files::{discover_files, DiscoveredFile, FileKind};
use crate::parser::Rf2FileReader;
use crate::types::{Rf2Error, Rf2Result};

const CHANNEL_DEPTH: usize = 4096;
const PROGRESS_EVERY_ROWS: u64 = 4096;

/// Tunables for an import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Records accumulated per kind before a batch is written.
    pub batch_size: usize,
    /// Number of concurrent sort-and-put workers.
    pub workers: usize,
    /// Whether to render a byte-progress bar on stderr.
    pub progress: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: 50_000,
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            progress: true,
        }
    }
}

/// Counts of imported records per component kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Concepts written.
    pub concepts: usize,
    /// Descriptions written.
    pub descriptions: usize,
    /// Relationships written.
    pub relationships: usize,
    /// Reference set items written.
    pub refset_items: usize,
}

impl ImportSummary {
    /// Total records written.
    pub fn total(&self) -> usize {
        self.concepts + self.descriptions + self.relationships + self.refset_items
    }
}

/// Imports every RF2 release found beneath `root` into `store`.
///
/// Categories are processed in reverse declared order: refsets first,
/// concepts last, leaving the most sequential writes for when the store is
/// largest.
pub fn import<P: AsRef<Path>>(
    store: &EntityStore,
    root: P,
    options: &ImportOptions,
) -> Rf2Result<ImportSummary> {
    let (discovered, total_size) = discover_files(root)?;

    let progress = if options.progress {
        let bar = ProgressBar::new(total_size);
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} {wide_bar} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            )
            .expect("invalid progress template"),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let (component_tx, component_rx) = mpsc::sync_channel::<Component>(CHANNEL_DEPTH);
    let reader_progress = progress.clone();

    let summary = thread::scope(|scope| -> Rf2Result<ImportSummary> {
        let reader = scope.spawn(move || -> Rf2Result<()> {
            read_all(&discovered, component_tx, &reader_progress)
        });

        let summary = write_batches(store, component_rx, options)?;

        reader.join().expect("reader thread panicked")?;
        Ok(summary)
    })?;

    store.compact()?;
    progress.finish_and_clear();
    info!(
        concepts = summary.concepts,
        descriptions = summary.descriptions,
        relationships = summary.relationships,
        refset_items = summary.refset_items,
        "import complete"
    );
    Ok(summary)
}

/// Streams every discovered file, reverse category order, into the channel.
/// Dropping the sender on return closes the pipeline.
fn read_all(
    discovered: &[DiscoveredFile],
    component_tx: mpsc::SyncSender<Component>,
    progress: &ProgressBar,
) -> Rf2Result<()> {
    let mut bytes_done = 0;

    for kind in FileKind::ALL.iter().rev() {
        let files: Vec<&DiscoveredFile> = discovered.iter().filter(|f| f.kind == *kind).collect();
        for (i, file) in files.iter().enumerate() {
            progress.set_message(format!("{} [{}/{}]", kind, i + 1, files.len()));
            info!(kind = %kind, path = %file.path.display(), "importing");

            let mut reader = Rf2FileReader::open(&file.path, *kind)?;
            while let Some(component) = reader.next_component() {
                if component_tx.send(component?).is_err() {
                    // Consumer bailed out; its error is the one that matters.
                    return Ok(());
                }
                if reader.rows_read() % PROGRESS_EVERY_ROWS == 0 {
                    progress.set_position(bytes_done + reader.byte_position());
                }
            }
            bytes_done += file.size;
            progress.set_position(bytes_done);
        }
    }
    Ok(())
}

/// Per-kind batch buffers flushed through the worker pool.
struct Batcher<'a> {
    store: &'a EntityStore,
    pool: rayon::ThreadPool,
    ticket_tx: mpsc::SyncSender<()>,
    ticket_rx: mpsc::Receiver<()>,
    workers: usize,
    batch_size: usize,
    failure: Arc<Mutex<Option<Rf2Error>>>,

    concepts: Vec<Concept>,
    descriptions: Vec<Description>,
    relationships: Vec<Relationship>,
    refset_items: Vec<RefsetItem>,
    summary: ImportSummary,
}

fn write_batches(
    store: &EntityStore,
    component_rx: mpsc::Receiver<Component>,
    options: &ImportOptions,
) -> Rf2Result<ImportSummary> {
    let workers = options.workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("sct-import-{i}"))
        .build()
        .expect("unable to build import worker pool");

    let (ticket_tx, ticket_rx) = mpsc::sync_channel::<()>(workers);
    for _ in 0..workers {
        ticket_tx.send(()).expect("ticket channel sized to workers");
    }

    let mut batcher = Batcher {
        store,
        pool,
        ticket_tx,
        ticket_rx,
        workers,
        batch_size: options.batch_size.max(1),
        failure: Arc::new(Mutex::new(None)),
        concepts: Vec::new(),
        descriptions: Vec::new(),
        relationships: Vec::new(),
        refset_items: Vec::new(),
        summary: ImportSummary::default(),
    };

    for component in component_rx {
        batcher.push(component)?;
    }
    batcher.finish()
}

impl Batcher<'_> {
    fn push(&mut self, component: Component) -> Rf2Result<()> {
        match component {
            Component::Concept(concept) => {
                self.concepts.push(concept);
                self.summary.concepts += 1;
                if self.concepts.len() >= self.batch_size {
                    let batch = std::mem::take(&mut self.concepts);
                    self.submit_concepts(batch)?;
                }
            }
            Component::Description(description) => {
                self.descriptions.push(description);
                self.summary.descriptions += 1;
                if self.descriptions.len() >= self.batch_size {
                    let batch = std::mem::take(&mut self.descriptions);
                    self.submit_descriptions(batch)?;
                }
            }
            Component::Relationship(relationship) => {
                self.relationships.push(relationship);
                self.summary.relationships += 1;
                if self.relationships.len() >= self.batch_size {
                    let batch = std::mem::take(&mut self.relationships);
                    self.submit_relationships(batch)?;
                }
            }
            Component::RefsetItem(item) => {
                self.refset_items.push(item);
                self.summary.refset_items += 1;
                if self.refset_items.len() >= self.batch_size {
                    let batch = std::mem::take(&mut self.refset_items);
                    self.submit_refset_items(batch)?;
                }
            }
        }
        Ok(())
    }

    /// Flushes trailing batches, waits for all workers and reports the first
    /// failure, if any.
    fn finish(mut self) -> Rf2Result<ImportSummary> {
        let concepts = std::mem::take(&mut self.concepts);
        if !concepts.is_empty() {
            self.submit_concepts(concepts)?;
        }
        let descriptions = std::mem::take(&mut self.descriptions);
        if !descriptions.is_empty() {
            self.submit_descriptions(descriptions)?;
        }
        let relationships = std::mem::take(&mut self.relationships);
        if !relationships.is_empty() {
            self.submit_relationships(relationships)?;
        }
        let refset_items = std::mem::take(&mut self.refset_items);
        if !refset_items.is_empty() {
            self.submit_refset_items(refset_items)?;
        }

        // Reclaiming every ticket means every in-flight batch has landed.
        for _ in 0..self.workers {
            self.ticket_rx
                .recv()
                .expect("ticket senders outlive the pool");
        }
        self.check_failure()?;
        Ok(self.summary)
    }

    fn check_failure(&self) -> Rf2Result<()> {
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }

    /// Blocks for a pool ticket, then runs `task` on the pool. The ticket
    /// returns to the set when the task finishes.
    fn spawn_gated<F>(&mut self, task: F) -> Rf2Result<()>
    where
        F: FnOnce() -> Rf2Result<()> + Send + 'static,
    {
        self.check_failure()?;
        self.ticket_rx
            .recv()
            .expect("ticket senders outlive the pool");

        let ticket_tx = self.ticket_tx.clone();
        let failure = Arc::clone(&self.failure);
        self.pool.spawn(move || {
            if let Err(error) = task() {
                let mut slot = failure.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(error);
                }
            }
            let _ = ticket_tx.send(());
        });
        Ok(())
    }

    fn submit_concepts(&mut self, mut batch: Vec<Concept>) -> Rf2Result<()> {
        let store = self.store.clone();
        self.spawn_gated(move || {
            batch.sort_unstable_by_key(|c| c.id);
            store.put_concepts(&batch)?;
            Ok(())
        })
    }

    fn submit_descriptions(&mut self, mut batch: Vec<Description>) -> Rf2Result<()> {
        let store = self.store.clone();
        self.spawn_gated(move || {
            // Sorted into primary key order: (conceptId, descriptionId).
            batch.sort_unstable_by_key(|d| (d.concept_id, d.id));
            store.put_descriptions(&batch)?;
            Ok(())
        })
    }

    fn submit_relationships(&mut self, mut batch: Vec<Relationship>) -> Rf2Result<()> {
        let store = self.store.clone();
        self.spawn_gated(move || {
            batch.sort_unstable_by_key(|r| (r.source_id, r.id));
            store.put_relationships(&batch)?;
            Ok(())
        })
    }

    fn submit_refset_items(&mut self, mut batch: Vec<RefsetItem>) -> Rf2Result<()> {
        let store = self.store.clone();
        self.spawn_gated(move || {
            batch.sort_unstable_by(|a, b| {
                (a.referenced_component_id, a.refset_id)
                    .cmp(&(b.referenced_component_id, b.refset_id))
            });
            store.put_refset_items(&batch)?;
            Ok(())
        })
    }
}

//! Parallel library pipeline
//! =========================
//!
//! [`SequenceMapperNotifier`] multiplexes the reads of a library over a
//! fixed pool of workers, one worker per stream, mapping every read and
//! fanning the mapping paths out to the listeners subscribed to that
//! library. Workers pull records in batches of up to one million; after
//! each batch a single global critical section invokes `merge_buffer`
//! on every listener in subscription order. The graph is read-only for
//! the whole run, listener errors are fatal and surface after all
//! workers have joined, and the merge mutex is the only cross-thread
//! synchronisation point.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::mapper::{KmerIndex, KmerMapper, MappingPath, SequenceMapper};
use crate::pipeline::reads::{MappableRecord, ReadStream};
use crate::Result;

/// Per-library aggregator driven by the pipeline. Methods take `&self`;
/// implementations keep per-thread buffers behind interior mutability
/// and must only touch cross-thread state inside `merge_buffer`.
pub trait SequenceMapperListener: Send + Sync {
    fn start_process_library(&self, _threads: usize) -> Result<()> {
        Ok(())
    }

    fn stop_process_library(&self) -> Result<()> {
        Ok(())
    }

    fn process_single(&self, _thread: usize, _path: &MappingPath) -> Result<()> {
        Ok(())
    }

    fn process_paired(
        &self,
        _thread: usize,
        _first: &MappingPath,
        _second: &MappingPath,
        _distance: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// Publish thread-local state; called under the global merge lock.
    fn merge_buffer(&self, _thread: usize) -> Result<()> {
        Ok(())
    }
}

pub type ListenerSet = [Arc<dyn SequenceMapperListener>];

/// Records drained from one stream between two merge points.
const BATCH_LIMIT: usize = 1_000_000;

/// Routes mapped reads to per-library listener lists.
#[derive(Default)]
pub struct SequenceMapperNotifier {
    listeners: Vec<Vec<Arc<dyn SequenceMapperListener>>>,
}

impl SequenceMapperNotifier {
    pub fn new() -> Self {
        SequenceMapperNotifier::default()
    }

    /// Subscribe a listener to the library at `lib_index`. Listeners
    /// fire in subscription order.
    pub fn subscribe(&mut self, lib_index: usize, listener: Arc<dyn SequenceMapperListener>) {
        if self.listeners.len() <= lib_index {
            self.listeners.resize_with(lib_index + 1, Vec::new);
        }
        self.listeners[lib_index].push(listener);
    }

    /// Drain every stream of a library in parallel, one worker per
    /// stream. Runs to stream exhaustion; there is no cancellation.
    pub fn process_library<R, S, I, KM>(
        &self,
        streams: &mut [S],
        lib_index: usize,
        mapper: &SequenceMapper<I, KM>,
    ) -> Result<()>
    where
        R: MappableRecord,
        S: ReadStream<Read = R>,
        I: KmerIndex,
        KM: KmerMapper,
    {
        let listeners: &[Arc<dyn SequenceMapperListener>] = self
            .listeners
            .get(lib_index)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let threads = streams.len();
        info!(lib_index, threads, "processing read library");

        for listener in listeners {
            listener.start_process_library(threads)?;
        }

        let merge_lock = Mutex::new(());
        let failures: Mutex<Vec<crate::Error>> = Mutex::new(Vec::new());
        rayon::scope(|scope| {
            for (thread, stream) in streams.iter_mut().enumerate() {
                let merge_lock = &merge_lock;
                let failures = &failures;
                scope.spawn(move |_| {
                    if let Err(error) =
                        Self::drain_stream(thread, stream, mapper, listeners, merge_lock)
                    {
                        failures.lock().push(error);
                    }
                });
            }
        });
        if let Some(error) = failures.into_inner().into_iter().next() {
            return Err(error);
        }

        for listener in listeners {
            listener.stop_process_library()?;
        }
        Ok(())
    }

    fn drain_stream<R, S, I, KM>(
        thread: usize,
        stream: &mut S,
        mapper: &SequenceMapper<I, KM>,
        listeners: &ListenerSet,
        merge_lock: &Mutex<()>,
    ) -> Result<()>
    where
        R: MappableRecord,
        S: ReadStream<Read = R>,
        I: KmerIndex,
        KM: KmerMapper,
    {
        stream.reset();
        let mut total = 0usize;
        loop {
            let mut size = 0usize;
            while size < BATCH_LIMIT {
                match stream.next_read() {
                    Some(record) => {
                        record.notify(mapper, listeners, thread)?;
                        size += 1;
                    }
                    None => break,
                }
            }
            total += size;
            {
                let _guard = merge_lock.lock();
                for listener in listeners {
                    listener.merge_buffer(thread)?;
                }
            }
            if stream.eof() {
                break;
            }
        }
        debug!(thread, total, "stream drained");
        Ok(())
    }
}

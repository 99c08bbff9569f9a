//! Read records and the pull-based stream surface the pipeline drains.

use crate::core::sequence::Sequence;
use crate::mapper::{KmerIndex, KmerMapper, SequenceMapper};
use crate::pipeline::notifier::ListenerSet;
use crate::Result;

/// A single 2-bit-packed read.
#[derive(Debug, Clone)]
pub struct SingleRead {
    pub sequence: Sequence,
}

impl SingleRead {
    pub fn new(sequence: Sequence) -> Self {
        SingleRead { sequence }
    }
}

/// A read pair with the library distance between the mates' starts.
#[derive(Debug, Clone)]
pub struct PairedRead {
    pub first: SingleRead,
    pub second: SingleRead,
    pub distance: usize,
}

impl PairedRead {
    pub fn new(first: SingleRead, second: SingleRead, distance: usize) -> Self {
        PairedRead {
            first,
            second,
            distance,
        }
    }
}

/// Blocking pull-based record source. One stream is owned by exactly
/// one pipeline worker; no cross-thread reads on a stream.
pub trait ReadStream: Send {
    type Read;

    /// Rewind to the first record.
    fn reset(&mut self);

    fn eof(&self) -> bool;

    /// Next record, or `None` at end of stream.
    fn next_read(&mut self) -> Option<Self::Read>;
}

/// In-memory stream over a vector of records.
#[derive(Debug, Clone)]
pub struct VecReadStream<R> {
    reads: Vec<R>,
    cursor: usize,
}

impl<R> VecReadStream<R> {
    pub fn new(reads: Vec<R>) -> Self {
        VecReadStream { reads, cursor: 0 }
    }
}

impl<R: Clone + Send> ReadStream for VecReadStream<R> {
    type Read = R;

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn eof(&self) -> bool {
        self.cursor >= self.reads.len()
    }

    fn next_read(&mut self) -> Option<R> {
        let read = self.reads.get(self.cursor).cloned();
        if read.is_some() {
            self.cursor += 1;
        }
        read
    }
}

/// Dispatches a mapped record to the typed listener entry points.
pub trait MappableRecord: Send {
    fn notify<I: KmerIndex, S: KmerMapper>(
        &self,
        mapper: &SequenceMapper<I, S>,
        listeners: &ListenerSet,
        thread: usize,
    ) -> Result<()>;
}

impl MappableRecord for SingleRead {
    fn notify<I: KmerIndex, S: KmerMapper>(
        &self,
        mapper: &SequenceMapper<I, S>,
        listeners: &ListenerSet,
        thread: usize,
    ) -> Result<()> {
        let path = mapper.map_sequence(&self.sequence);
        for listener in listeners {
            listener.process_single(thread, &path)?;
        }
        Ok(())
    }
}

impl MappableRecord for PairedRead {
    fn notify<I: KmerIndex, S: KmerMapper>(
        &self,
        mapper: &SequenceMapper<I, S>,
        listeners: &ListenerSet,
        thread: usize,
    ) -> Result<()> {
        let first = mapper.map_sequence(&self.first.sequence);
        let second = mapper.map_sequence(&self.second.sequence);
        for listener in listeners {
            listener.process_paired(thread, &first, &second, self.distance)?;
            listener.process_single(thread, &first)?;
            listener.process_single(thread, &second)?;
        }
        Ok(())
    }
}

pub mod listeners;
pub mod notifier;
pub mod reads;

pub use listeners::{CoverageFillingListener, PairedInfoFillingListener};
pub use notifier::{SequenceMapperListener, SequenceMapperNotifier};
pub use reads::{MappableRecord, PairedRead, ReadStream, SingleRead, VecReadStream};

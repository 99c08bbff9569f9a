pub mod compression;
pub mod conjugate;
pub mod coverage;
pub mod debruijn;
pub mod events;

pub use compression::{Cleaner, Compressor};
pub use conjugate::{ConjugateGraph, DataMaster, EdgeId, VertexId};
pub use debruijn::{DebruijnDataMaster, DebruijnGraph};
pub use coverage::CoverageIndex;
pub use events::{handler_ref, GraphEvent, GraphHandler, GraphHandlerRef, PairedHandlerApplier};

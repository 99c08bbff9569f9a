pub mod errors;
pub mod kmer;
pub mod nucl;
pub mod sequence;

// Re-export the value types the rest of the crate manipulates
pub use errors::AssemblyError;
pub use kmer::Kmer;
pub use sequence::Sequence;

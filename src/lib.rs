//! # debruijn-forge
//!
//! Core of a de novo genome assembler built around a paired (conjugate)
//! de Bruijn graph over short DNA reads. The crate provides the four
//! tightly coupled subsystems that turn raw nucleotide reads into a
//! compact, corrected graph of genomic fragments:
//!
//! * bit-packed immutable k-mers and sequences ([`core`]),
//! * a double-stranded conjugate multigraph with handler machinery
//!   ([`graph`]),
//! * a sequence-to-graph mapper and a parallel read pipeline
//!   ([`mapper`], [`pipeline`]),
//! * an erroneous-edge removal engine ([`simplify`]).
//!
//! Read parsing and on-disk formats are external collaborators; the crate
//! consumes them through the [`pipeline::ReadStream`] and
//! [`mapper::KmerIndex`] traits.

pub mod core;
pub mod graph;
pub mod mapper;
pub mod pipeline;
pub mod simplify;

pub use crate::core::errors::AssemblyError;

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;

//! # rbscan
//!
//! Sequence representation and ribosome-binding-site scoring for
//! prokaryotic gene prediction.
//!
//! This crate is the numeric core under a microbial gene finder: it turns
//! raw genomic text into a compact, ambiguity-aware representation, flags
//! biologically uninformative regions, and scores candidate
//! translation-start contexts against a trained statistical model. The
//! dynamic-programming gene caller that consumes these results lives
//! outside this crate; the contract is the motif-table index returned by
//! the scorer and the weight tables held by [`TrainingInfo`].
//!
//! ## Quick start
//!
//! ```rust
//! use bio::bio_types::strand::Strand;
//! use rbscan::{PackedSequence, ShineDalgarnoScorer, TrainingInfo};
//!
//! let seq = PackedSequence::from_string("AGGAGGTTAGCAAATATG", false)?;
//! let tinf = TrainingInfo::new(seq.gc());
//! let scorer = ShineDalgarnoScorer::default();
//!
//! // The ATG at position 15 sits downstream of a perfect AGGAGG.
//! let index = scorer.score(&seq, 15, &tinf, Strand::Forward, true);
//! let weight = tinf.rbs_weight(index);
//! assert_eq!(index, 24);
//! # let _ = weight;
//! # Ok::<(), rbscan::RbscanError>(())
//! ```
//!
//! ## Modules
//!
//! - [`sequence`]: packed nucleotide sequences, masks, codon predicates
//! - [`motif`]: the Shine-Dalgarno motif catalog and scorer
//! - [`training`]: the learned model container and its binary format
//! - [`metagenomic`]: preset models for untrained (metagenomic) input
//! - [`bitmap`]: bit-vector primitives behind the 2-bit encoding
//! - [`constants`]: encoding, search-geometry, and format constants
//! - [`types`]: shared aliases, [`Mask`], and the crate error type
//!
//! ## Concurrency
//!
//! Everything here is synchronous and CPU-bound. [`PackedSequence`] and
//! preset [`TrainingInfo`] values are immutable after construction and
//! safe to share across threads; user-constructed models rely on the
//! usual Rust aliasing rules (`&mut` for writes). The metagenomic
//! registry initializes once and is read-only thereafter.

pub mod bitmap;
pub mod constants;
pub mod metagenomic;
pub mod motif;
pub mod sequence;
pub mod training;
pub mod types;

pub use metagenomic::{bins, MetagenomicBin};
pub use motif::{describe, ShineDalgarnoScorer, RBS_MOTIFS};
pub use sequence::PackedSequence;
pub use training::TrainingInfo;
pub use types::{Mask, RbscanError};

//! Fixed parameters of the sequence encoding, the motif search geometry,
//! and the binary training-model record.

/// Minimum run of ambiguous bases that collapses into a [`Mask`].
///
/// [`Mask`]: crate::types::Mask
pub const MASK_SIZE: usize = 8;

/// Number of distinct nucleotide bases (A, C, G, T).
pub const NUM_BASES: usize = 4;

/// Shortest Shine-Dalgarno sub-motif considered (AGG / GGA / GAG).
pub const MIN_MOTIF_LENGTH: usize = 3;

/// Longest Shine-Dalgarno motif considered (the full AGGAGG template).
pub const MAX_MOTIF_LENGTH: usize = 6;

/// Shortest motif eligible for single-mismatch matching.
pub const MIN_MISMATCH_MOTIF_LENGTH: usize = 5;

/// A motif window must end at least this many bases before the start codon.
pub const MIN_DISTANCE_FROM_START: usize = 4;

/// Spacers above this many bases never count as a ribosome binding site.
pub const MAX_RIBOSOME_DISTANCE: usize = 15;

/// Template agreement below this cumulative score is not a motif.
pub const MIN_CUMULATIVE_SCORE: f64 = 6.0;

/// Default upstream window scanned for a binding site, in bases.
pub const DEFAULT_SEARCH_WINDOW: usize = 20;

/// Number of entries in the motif table / RBS weight vector.
pub const NUM_RBS_WEIGHTS: usize = 28;

/// Number of upstream positions tracked by the composition model.
pub const UPSTREAM_POSITIONS: usize = 32;

/// Number of motif length classes in the non-SD weight tables.
pub const NUM_MOTIF_SIZES: usize = 4;

/// Number of spacer classes in the non-SD weight tables.
pub const NUM_SPACER_CLASSES: usize = 4;

/// Number of packed k-mer patterns per non-SD weight table (4^6).
pub const MAX_MOTIF_INDEX: usize = 4096;

/// Default start weight applied to start-score contributions.
pub const DEFAULT_START_WEIGHT: f64 = 4.35;

/// Default NCBI genetic code (standard bacterial/archaeal table).
pub const DEFAULT_TRANSLATION_TABLE: i32 = 11;

/// Exact byte length of a serialized training-model record.
///
/// translation_table (4) + gc (8) + bias (24) + type_weights (24)
/// + uses_sd (1) + start_weight (8) + upstream_compositions (32*4*8)
/// + motif_weights (4*4*4096*8) + rbs_weights (28*8).
pub const TRAINING_RECORD_SIZE: usize =
    4 + 8 + 24 + 24 + 1 + 8 + (32 * 4 * 8) + (4 * 4 * 4096 * 8) + (28 * 8);

/// Byte values of the four unambiguous bases, indexed by 2-bit code.
pub const NUCLEOTIDE_LOOKUP: [u8; 4] = [b'A', b'C', b'G', b'T'];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_matches_field_layout() {
        assert_eq!(TRAINING_RECORD_SIZE, 525_605);
    }
}

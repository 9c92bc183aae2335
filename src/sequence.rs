//! Packed nucleotide sequences.
//!
//! A [`PackedSequence`] stores a genome two bits per base (A=00, C=01,
//! G=10, T=11) alongside a one-bit-per-base ambiguity track and a
//! precomputed packed reverse complement, so both strands can be read
//! without re-encoding. Ambiguous bases are packed as C, which keeps
//! k-mer indexing total; the ambiguity track is the source of truth for
//! which positions are callable.
//!
//! Runs of ambiguous bases at least [`MASK_SIZE`] long can optionally be
//! collapsed into [`Mask`] intervals at construction time.
//!
//! ```rust
//! use rbscan::PackedSequence;
//!
//! let seq = PackedSequence::from_string("ATGAAACGCATTAGCACC", false)?;
//! assert_eq!(seq.len(), 18);
//! assert_eq!(seq.to_string(), "ATGAAACGCATTAGCACC");
//! # Ok::<(), rbscan::RbscanError>(())
//! ```

use std::fmt;

use bio::bio_types::strand::Strand;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::bitmap::{bytes_for, set_bit, test_bit};
use crate::constants::{MASK_SIZE, NUCLEOTIDE_LOOKUP};
use crate::types::{Mask, RbscanError};

/// Test whether the base at `n` in a packed 2-bit buffer is adenine.
#[must_use]
pub fn is_a(encoded: &[u8], n: usize) -> bool {
    !(test_bit(encoded, n * 2) || test_bit(encoded, n * 2 + 1))
}

/// Test whether the base at `n` in a packed 2-bit buffer is cytosine.
#[must_use]
pub fn is_c(encoded: &[u8], n: usize) -> bool {
    !test_bit(encoded, n * 2) && test_bit(encoded, n * 2 + 1)
}

/// Test whether the base at `n` in a packed 2-bit buffer is guanine.
#[must_use]
pub fn is_g(encoded: &[u8], n: usize) -> bool {
    test_bit(encoded, n * 2) && !test_bit(encoded, n * 2 + 1)
}

/// Test whether the base at `n` in a packed 2-bit buffer is thymine.
#[must_use]
pub fn is_t(encoded: &[u8], n: usize) -> bool {
    test_bit(encoded, n * 2) && test_bit(encoded, n * 2 + 1)
}

/// Test whether the base at `n` is G or C.
///
/// Ambiguous bases are packed as C and therefore test true here, matching
/// the reference implementation; use the ambiguity track to exclude them.
#[must_use]
pub fn is_gc(encoded: &[u8], n: usize) -> bool {
    test_bit(encoded, n * 2) != test_bit(encoded, n * 2 + 1)
}

/// Pack the `length`-mer starting at `position` into a numeric index.
///
/// Two bits per base, first base in the low bits; the index addresses the
/// non-SD motif weight tables.
#[must_use]
pub fn kmer_index(length: usize, encoded: &[u8], position: usize) -> usize {
    let mut index = 0;
    for bit in 0..(2 * length) {
        index |= usize::from(test_bit(encoded, position * 2 + bit)) << bit;
    }
    index
}

/// Two-bit code of the base at `n` (A=0, C=1, G=2, T=3).
#[inline]
fn base_code(encoded: &[u8], n: usize) -> u8 {
    (u8::from(test_bit(encoded, n * 2)) << 1) | u8::from(test_bit(encoded, n * 2 + 1))
}

/// Write a two-bit base code at position `n`.
#[inline]
fn write_code(encoded: &mut [u8], n: usize, code: u8) {
    if code & 0b10 != 0 {
        set_bit(encoded, n * 2);
    }
    if code & 0b01 != 0 {
        set_bit(encoded, n * 2 + 1);
    }
}

/// How a raw input byte enters the packed encoding.
enum BaseClass {
    /// Unambiguous base with its 2-bit code.
    Known(u8),
    /// IUPAC ambiguity code; packed as C and flagged ambiguous.
    Ambiguous,
}

fn classify(byte: u8) -> Option<BaseClass> {
    match byte.to_ascii_uppercase() {
        b'A' => Some(BaseClass::Known(0)),
        b'C' => Some(BaseClass::Known(1)),
        b'G' => Some(BaseClass::Known(2)),
        b'T' | b'U' => Some(BaseClass::Known(3)),
        b'N' | b'R' | b'Y' | b'S' | b'W' | b'K' | b'M' | b'B' | b'D' | b'H' | b'V' => {
            Some(BaseClass::Ambiguous)
        }
        _ => None,
    }
}

/// A packed, read-only nucleotide sequence.
///
/// Length, encoding, GC ratio, and masks are all fixed at construction;
/// the type is safe to share across threads for concurrent reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedSequence {
    forward: Vec<u8>,
    reverse: Vec<u8>,
    unknown: Vec<u8>,
    masks: Vec<Mask>,
    gc: f64,
    length: usize,
}

impl PackedSequence {
    /// Encode `text` into a packed sequence.
    ///
    /// Accepts `A C G T U` and the IUPAC ambiguity codes
    /// `N R Y S W K M B D H V`, case-insensitive (`U` reads as `T`). Any
    /// other byte fails with [`RbscanError::InvalidCharacter`] and no
    /// sequence is produced. When `mask` is true, runs of at least
    /// [`MASK_SIZE`] ambiguous bases are collapsed into [`Mask`] entries.
    pub fn from_string(text: &str, mask: bool) -> Result<Self, RbscanError> {
        let bytes = text.as_bytes();
        let length = bytes.len();
        let mut forward = vec![0u8; bytes_for(length * 2)];
        let mut unknown = vec![0u8; bytes_for(length)];
        let mut masks = Vec::new();

        let mut gc_count = 0usize;
        let mut callable = 0usize;
        let mut run_start: Option<usize> = None;

        for (i, &byte) in bytes.iter().enumerate() {
            let class = classify(byte).ok_or(RbscanError::InvalidCharacter {
                byte,
                position: i,
            })?;
            match class {
                BaseClass::Known(code) => {
                    write_code(&mut forward, i, code);
                    callable += 1;
                    if code == 1 || code == 2 {
                        gc_count += 1;
                    }
                    if mask {
                        if let Some(start) = run_start.take() {
                            if i - start >= MASK_SIZE {
                                masks.push(Mask {
                                    begin: start,
                                    end: i - 1,
                                });
                            }
                        }
                    }
                }
                BaseClass::Ambiguous => {
                    // Packed as C so downstream k-mer indexing stays total.
                    write_code(&mut forward, i, 1);
                    set_bit(&mut unknown, i);
                    if mask && run_start.is_none() {
                        run_start = Some(i);
                    }
                }
            }
        }
        if mask {
            if let Some(start) = run_start {
                if length - start >= MASK_SIZE {
                    masks.push(Mask {
                        begin: start,
                        end: length - 1,
                    });
                }
            }
        }

        let gc = if callable > 0 {
            gc_count as f64 / callable as f64
        } else {
            0.0
        };
        let reverse = reverse_complement(&forward, &unknown, length);

        debug!(
            "encoded {} bases (gc {:.4}, {} masked regions)",
            length,
            gc,
            masks.len()
        );

        Ok(Self {
            forward,
            reverse,
            unknown,
            masks,
            gc,
            length,
        })
    }

    /// Number of bases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Fraction of G/C among callable (non-ambiguous) bases.
    ///
    /// 0.0 for an empty or fully ambiguous sequence.
    #[must_use]
    pub fn gc(&self) -> f64 {
        self.gc
    }

    /// Low-information intervals, ascending and non-overlapping.
    ///
    /// Empty unless masking was requested at construction.
    #[must_use]
    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// Packed forward-strand encoding.
    #[must_use]
    pub fn forward(&self) -> &[u8] {
        &self.forward
    }

    /// Packed reverse-complement encoding.
    #[must_use]
    pub fn reverse_complement(&self) -> &[u8] {
        &self.reverse
    }

    /// Packed buffer for the requested strand.
    ///
    /// Positions passed to the strand-aware predicates are interpreted in
    /// this buffer's own coordinates (reverse positions count from the 3'
    /// end of the forward strand). `Strand::Unknown` reads forward.
    #[must_use]
    pub fn strand_view(&self, strand: Strand) -> &[u8] {
        match strand {
            Strand::Reverse => &self.reverse,
            Strand::Forward | Strand::Unknown => &self.forward,
        }
    }

    /// Whether the base at `n` (forward coordinates) is ambiguous.
    #[must_use]
    pub fn is_ambiguous(&self, n: usize) -> bool {
        test_bit(&self.unknown, n)
    }

    /// Whether the codon at `pos` on `strand` is ATG.
    #[must_use]
    pub fn is_atg(&self, pos: usize, strand: Strand) -> bool {
        let view = self.strand_view(strand);
        pos + 3 <= self.length
            && is_a(view, pos)
            && is_t(view, pos + 1)
            && is_g(view, pos + 2)
    }

    /// Whether the codon at `pos` on `strand` is GTG.
    #[must_use]
    pub fn is_gtg(&self, pos: usize, strand: Strand) -> bool {
        let view = self.strand_view(strand);
        pos + 3 <= self.length
            && is_g(view, pos)
            && is_t(view, pos + 1)
            && is_g(view, pos + 2)
    }

    /// Whether the codon at `pos` on `strand` is TTG.
    #[must_use]
    pub fn is_ttg(&self, pos: usize, strand: Strand) -> bool {
        let view = self.strand_view(strand);
        pos + 3 <= self.length
            && is_t(view, pos)
            && is_t(view, pos + 1)
            && is_g(view, pos + 2)
    }

    /// Whether the codon at `pos` is a start under genetic code `table`.
    ///
    /// ATG starts in every code; GTG and TTG starts follow the NCBI
    /// genetic-code exceptions.
    #[must_use]
    pub fn is_start(&self, pos: usize, table: i32, strand: Strand) -> bool {
        if self.is_atg(pos, strand) {
            return true;
        }
        // Codes restricted to ATG starts.
        if matches!(table, 2 | 6 | 10 | 14 | 15 | 16) {
            return false;
        }
        if self.is_gtg(pos, strand) {
            return !matches!(table, 1 | 3 | 12);
        }
        if self.is_ttg(pos, strand) {
            return !(table < 4 || table == 9 || (21..25).contains(&table));
        }
        false
    }

    /// Whether the codon at `pos` is a stop under genetic code `table`.
    #[must_use]
    pub fn is_stop(&self, pos: usize, table: i32, strand: Strand) -> bool {
        if pos + 3 > self.length {
            return false;
        }
        let view = self.strand_view(strand);
        if is_t(view, pos) {
            if is_a(view, pos + 1) {
                if is_g(view, pos + 2) {
                    return !matches!(table, 6 | 15 | 16 | 22);
                }
                if is_a(view, pos + 2) {
                    return !matches!(table, 6 | 14);
                }
            } else if is_g(view, pos + 1) && is_a(view, pos + 2) {
                return !matches!(table, 2..=5 | 9 | 10 | 13 | 14 | 21 | 25);
            }
        }
        match table {
            // AGA / AGG read as stops in the vertebrate mitochondrial code.
            2 => {
                is_a(view, pos)
                    && is_g(view, pos + 1)
                    && (is_a(view, pos + 2) || is_g(view, pos + 2))
            }
            22 => is_t(view, pos) && is_c(view, pos + 1) && is_a(view, pos + 2),
            23 => is_t(view, pos) && is_t(view, pos + 1) && is_a(view, pos + 2),
            _ => false,
        }
    }

    /// Packed index of the `length`-mer at `pos` on `strand`.
    #[must_use]
    pub fn mer_index(&self, length: usize, pos: usize, strand: Strand) -> usize {
        kmer_index(length, self.strand_view(strand), pos)
    }

    /// Serialize for caching across process boundaries.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RbscanError> {
        bincode::serialize(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    /// Restore a sequence serialized with [`PackedSequence::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RbscanError> {
        bincode::deserialize(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }
}

impl fmt::Display for PackedSequence {
    /// Upper-case reconstruction of the input; ambiguity codes read as `N`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.length {
            let letter = if self.is_ambiguous(i) {
                b'N'
            } else {
                NUCLEOTIDE_LOOKUP[base_code(&self.forward, i) as usize]
            };
            write!(f, "{}", letter as char)?;
        }
        Ok(())
    }
}

/// Build the packed reverse complement.
///
/// Complementation is `3 - code` in the 2-bit alphabet; ambiguous
/// positions stay packed as C on both strands.
fn reverse_complement(forward: &[u8], unknown: &[u8], length: usize) -> Vec<u8> {
    let mut reverse = vec![0u8; forward.len()];
    for i in 0..length {
        let target = length - 1 - i;
        let code = if test_bit(unknown, i) {
            1
        } else {
            3 - base_code(forward, i)
        };
        write_code(&mut reverse, target, code);
    }
    reverse
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_to_uppercase() {
        let seq = PackedSequence::from_string("atgcattgca", false).unwrap();
        assert_eq!(seq.to_string(), "ATGCATTGCA");
        assert_eq!(seq.len(), 10);
    }

    #[test]
    fn uracil_reads_as_thymine() {
        let seq = PackedSequence::from_string("AUGU", false).unwrap();
        assert_eq!(seq.to_string(), "ATGT");
    }

    #[test]
    fn ambiguity_codes_collapse_to_n() {
        let seq = PackedSequence::from_string("ARYG", false).unwrap();
        assert_eq!(seq.to_string(), "ANNG");
        assert!(seq.is_ambiguous(1));
        assert!(seq.is_ambiguous(2));
        assert!(!seq.is_ambiguous(3));
    }

    #[test]
    fn rejects_unknown_bytes() {
        let err = PackedSequence::from_string("ATG-CAT", false).unwrap_err();
        match err {
            RbscanError::InvalidCharacter { byte, position } => {
                assert_eq!(byte, b'-');
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn gc_counts_callable_bases_only() {
        let seq = PackedSequence::from_string("GCGCNNNN", false).unwrap();
        assert!((seq.gc() - 1.0).abs() < 1e-12);
        let seq = PackedSequence::from_string("ATGC", false).unwrap();
        assert!((seq.gc() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_and_fully_ambiguous_gc_is_zero() {
        let seq = PackedSequence::from_string("", false).unwrap();
        assert_eq!(seq.gc(), 0.0);
        assert!(seq.is_empty());
        let seq = PackedSequence::from_string("NNNNNNNN", false).unwrap();
        assert_eq!(seq.gc(), 0.0);
    }

    #[test]
    fn masking_matches_reference_intervals() {
        let seq =
            PackedSequence::from_string("ATGCNNNNNNNNNNATGCNNNNNNNNTGC", true).unwrap();
        assert_eq!(seq.masks().len(), 2);
        assert_eq!(seq.masks()[0], Mask { begin: 4, end: 13 });
        assert_eq!(seq.masks()[1], Mask { begin: 18, end: 25 });
    }

    #[test]
    fn masking_is_opt_in() {
        let seq =
            PackedSequence::from_string("ATGCNNNNNNNNNNATGCNNNNNNNNTGC", false).unwrap();
        assert!(seq.masks().is_empty());
    }

    #[test]
    fn short_runs_do_not_mask() {
        let seq = PackedSequence::from_string("ATGCNNNNNNNATGC", true).unwrap();
        assert!(seq.masks().is_empty());
    }

    #[test]
    fn trailing_run_is_masked() {
        let seq = PackedSequence::from_string("ATGCNNNNNNNNNN", true).unwrap();
        assert_eq!(seq.masks(), &[Mask { begin: 4, end: 13 }]);
    }

    #[test]
    fn masking_does_not_change_length_gc_or_text() {
        let text = "ATGCNNNNNNNNNNATGCNNNNNNNNTGC";
        let masked = PackedSequence::from_string(text, true).unwrap();
        let plain = PackedSequence::from_string(text, false).unwrap();
        assert_eq!(masked.len(), plain.len());
        assert_eq!(masked.gc(), plain.gc());
        assert_eq!(masked.to_string(), plain.to_string());
    }

    #[test]
    fn reverse_complement_mirrors_the_sequence() {
        let seq = PackedSequence::from_string("AACGT", false).unwrap();
        let rc = seq.reverse_complement();
        // Reverse complement of AACGT is ACGTT.
        assert!(is_a(rc, 0));
        assert!(is_c(rc, 1));
        assert!(is_g(rc, 2));
        assert!(is_t(rc, 3));
        assert!(is_t(rc, 4));
    }

    #[test]
    fn gc_predicate_includes_ambiguous_positions() {
        // Ambiguous bases pack as C, so the raw predicate counts them;
        // the ambiguity track is what excludes them from gc().
        let seq = PackedSequence::from_string("AGNT", false).unwrap();
        assert!(!is_gc(seq.forward(), 0));
        assert!(is_gc(seq.forward(), 1));
        assert!(is_gc(seq.forward(), 2));
        assert!(!is_gc(seq.forward(), 3));
        assert!((seq.gc() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn start_codons_follow_the_genetic_code() {
        let seq = PackedSequence::from_string("ATGGTGTTG", false).unwrap();
        assert!(seq.is_start(0, 11, Strand::Forward));
        assert!(seq.is_start(3, 11, Strand::Forward));
        assert!(seq.is_start(6, 11, Strand::Forward));
        // Table 6 only accepts ATG.
        assert!(seq.is_start(0, 6, Strand::Forward));
        assert!(!seq.is_start(3, 6, Strand::Forward));
        assert!(!seq.is_start(6, 6, Strand::Forward));
        // Table 1 rejects GTG but keeps ATG.
        assert!(!seq.is_start(3, 1, Strand::Forward));
    }

    #[test]
    fn stop_codons_follow_the_genetic_code() {
        let seq = PackedSequence::from_string("TAATAGTGA", false).unwrap();
        assert!(seq.is_stop(0, 11, Strand::Forward));
        assert!(seq.is_stop(3, 11, Strand::Forward));
        assert!(seq.is_stop(6, 11, Strand::Forward));
        // TGA codes for tryptophan in table 4.
        assert!(!seq.is_stop(6, 4, Strand::Forward));
        // AGA is a stop only in table 2.
        let seq = PackedSequence::from_string("AGA", false).unwrap();
        assert!(seq.is_stop(0, 2, Strand::Forward));
        assert!(!seq.is_stop(0, 11, Strand::Forward));
        // TCA is a stop only in table 22.
        let seq = PackedSequence::from_string("TCA", false).unwrap();
        assert!(seq.is_stop(0, 22, Strand::Forward));
        assert!(!seq.is_stop(0, 11, Strand::Forward));
    }

    #[test]
    fn reverse_strand_codons_read_in_reverse_coordinates() {
        // Forward CATGGG: reverse complement is CCCATG, so an ATG sits at
        // reverse position 3.
        let seq = PackedSequence::from_string("CATGGG", false).unwrap();
        assert!(seq.is_atg(3, Strand::Reverse));
        assert!(!seq.is_atg(0, Strand::Reverse));
    }

    #[test]
    fn kmer_index_packs_first_base_low() {
        let seq = PackedSequence::from_string("ACGT", false).unwrap();
        // Raw-bit packing reads digits as A=0, G=1, C=2, T=3.
        assert_eq!(seq.mer_index(1, 0, Strand::Forward), 0);
        assert_eq!(seq.mer_index(1, 1, Strand::Forward), 2);
        assert_eq!(seq.mer_index(1, 2, Strand::Forward), 1);
        assert_eq!(seq.mer_index(2, 2, Strand::Forward), 1 | (3 << 2));
    }

    #[test]
    fn serialized_round_trip_preserves_everything() {
        let seq =
            PackedSequence::from_string("ATGCNNNNNNNNNNATGCNNNNNNNNTGC", true).unwrap();
        let restored = PackedSequence::from_bytes(&seq.to_bytes().unwrap()).unwrap();
        assert_eq!(seq, restored);
        assert_eq!(seq.to_string(), restored.to_string());
        assert_eq!(seq.masks(), restored.masks());
    }
}

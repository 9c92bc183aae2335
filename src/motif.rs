//! Shine-Dalgarno motif recognition.
//!
//! Candidate ribosome binding sites are found by laying the canonical
//! `AGGAGG` template over a 6-base window upstream of a candidate start
//! codon and scoring contiguous sub-motifs of length 3-6 (exact mode) or
//! 5-6 with exactly one mismatched internal base (mismatch mode). Each
//! accepted motif resolves, together with its spacer-distance bucket, to
//! one of 28 stable table indices; index 0 means "no site".
//!
//! The index is an opaque key, not a score: callers resolve it to a
//! numeric contribution through [`TrainingInfo::rbs_weight`]. Resolution
//! is purely structural — the longest motif wins, ties broken by the
//! smallest spacer — so the same window always yields the same index
//! regardless of the weight table in use.

use bio::bio_types::strand::Strand;
use rayon::prelude::*;

use crate::constants::{
    DEFAULT_SEARCH_WINDOW, MAX_MOTIF_LENGTH, MAX_RIBOSOME_DISTANCE, MIN_CUMULATIVE_SCORE,
    MIN_DISTANCE_FROM_START, MIN_MISMATCH_MOTIF_LENGTH, MIN_MOTIF_LENGTH,
};
use crate::sequence::{is_a, is_g, PackedSequence};
use crate::training::TrainingInfo;

/// Motif and spacer description for every table index.
///
/// Exact sub-motifs of `AGGAGG` and single-mismatch classes (`x` marks
/// the mismatched base), each paired with a spacer bucket. `3Base/5BMM`
/// and `4Base/6BMM` collect short exact and long mismatched motifs at
/// 13-15bp spacers.
pub const RBS_MOTIFS: [(&str, &str); 28] = [
    ("None", "None"),
    ("GGA/GAG/AGG", "3-4bp"),
    ("3Base/5BMM", "13-15bp"),
    ("4Base/6BMM", "13-15bp"),
    ("AGxAG", "11-12bp"),
    ("AGxAG", "3-4bp"),
    ("GGA/GAG/AGG", "11-12bp"),
    ("GGxGG", "11-12bp"),
    ("GGxGG", "3-4bp"),
    ("AGxAG", "5-10bp"),
    ("AGGAG(G)/GGAGG", "13-15bp"),
    ("AGGA/GGAG/GAGG", "3-4bp"),
    ("AGGA/GGAG/GAGG", "11-12bp"),
    ("GGA/GAG/AGG", "5-10bp"),
    ("GGxGG", "5-10bp"),
    ("AGGA", "5-10bp"),
    ("GGAG/GAGG", "5-10bp"),
    ("AGxAGG/AGGxGG", "11-12bp"),
    ("AGxAGG/AGGxGG", "3-4bp"),
    ("AGxAGG/AGGxGG", "5-10bp"),
    ("AGGAG/GGAGG", "11-12bp"),
    ("AGGAG", "3-4bp"),
    ("AGGAG", "5-10bp"),
    ("GGAGG", "3-4bp"),
    ("AGGAGG", "5-10bp"),
    ("GGAGG", "5-10bp"),
    ("AGGAGG", "3-4bp"),
    ("AGGAGG", "11-12bp"),
];

/// Motif and spacer description for a table index.
#[must_use]
pub fn describe(index: usize) -> (&'static str, &'static str) {
    RBS_MOTIFS.get(index).copied().unwrap_or(("None", "None"))
}

/// One accepted motif hit inside a scan window.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    length: usize,
    spacer: usize,
    index: usize,
}

impl Candidate {
    /// Longest motif first, then smallest spacer.
    fn beats(&self, other: &Candidate) -> bool {
        self.length > other.length
            || (self.length == other.length && self.spacer < other.spacer)
    }
}

/// Spacer bucket for exact motifs.
///
/// Short and intermediate spacers swap buckets for motifs of length 5-6:
/// a long motif reaching almost to the start codon behaves like a short
/// one sitting further away.
const fn spacer_bucket(spacer: usize, motif_length: usize) -> usize {
    match spacer {
        0..=4 => {
            if motif_length < 5 {
                2
            } else {
                1
            }
        }
        5..=10 => 0,
        11..=12 => {
            if motif_length < 5 {
                1
            } else {
                2
            }
        }
        _ => 3,
    }
}

/// Spacer bucket for single-mismatch motifs (all length 5-6).
const fn mismatch_spacer_bucket(spacer: usize) -> usize {
    match spacer {
        0..=4 => 1,
        5..=10 => 0,
        11..=12 => 2,
        _ => 3,
    }
}

/// Resolve an exact (template score, spacer bucket) pair to a table index.
const fn exact_index(score: i32, bucket: usize) -> usize {
    match (score, bucket) {
        (6, 2) => 1,
        (6, 3) => 2,
        (8 | 9, 3) => 3,
        (6, 1) => 6,
        (11 | 12 | 14, 3) => 10,
        (8 | 9, 2) => 11,
        (8 | 9, 1) => 12,
        (6, 0) => 13,
        (8, 0) => 15,
        (9, 0) => 16,
        (11 | 12, 2) => 20,
        (11, 1) => 21,
        (11, 0) => 22,
        (12, 1) => 23,
        (14, 0) => 24,
        (12, 0) => 25,
        (14, 1) => 26,
        (14, 2) => 27,
        _ => 0,
    }
}

/// Resolve a mismatch (template score, spacer bucket) pair to a table index.
const fn mismatch_index(score: i32, bucket: usize) -> usize {
    match (score, bucket) {
        (6 | 7, 3) => 2,
        (9, 3) => 3,
        (6, 2) => 4,
        (6, 1) => 5,
        (7, 2) => 7,
        (7, 1) => 8,
        (6, 0) => 9,
        (7, 0) => 14,
        (9, 2) => 17,
        (9, 1) => 18,
        (9, 0) => 19,
        _ => 0,
    }
}

/// Per-base agreement with the AGGAGG template over `[pos, pos + limit)`.
///
/// A positions score 2.0 and G positions 3.0; `miss_a`/`miss_g` are the
/// penalties charged when the base disagrees.
fn template_scores(
    view: &[u8],
    pos: usize,
    limit: usize,
    miss_a: f64,
    miss_g: f64,
) -> [f64; MAX_MOTIF_LENGTH] {
    let mut scores = [f64::NEG_INFINITY; MAX_MOTIF_LENGTH];
    for (i, slot) in scores.iter_mut().enumerate().take(limit) {
        *slot = if i % 3 == 0 {
            if is_a(view, pos + i) {
                2.0
            } else {
                miss_a
            }
        } else if is_g(view, pos + i) {
            3.0
        } else {
            miss_g
        };
    }
    scores
}

/// Motif window length usable at `pos` for a start codon at `start`.
///
/// `None` when the window cannot fit, runs past the sequence end, or
/// would leave less than the minimum gap before the start codon.
fn window_limit(slen: usize, pos: usize, start: usize) -> Option<usize> {
    if start > slen || start <= pos + MIN_DISTANCE_FROM_START {
        return None;
    }
    Some(MAX_MOTIF_LENGTH.min(start - MIN_DISTANCE_FROM_START - pos))
}

/// Best exact motif in the 6-base window at `pos`, if any.
fn best_exact(view: &[u8], slen: usize, pos: usize, start: usize) -> Option<Candidate> {
    let limit = window_limit(slen, pos, start)?;
    let scores = template_scores(view, pos, limit, -10.0, -10.0);

    for length in (MIN_MOTIF_LENGTH..=limit).rev() {
        // Largest offset first: offsets closer to the start codon have
        // smaller spacers, so the first acceptable hit wins the tie.
        for offset in (0..=limit - length).rev() {
            let window = &scores[offset..offset + length];
            if window.iter().any(|&s| s < 0.0) {
                continue;
            }
            let score = window.iter().sum::<f64>() - 2.0;
            let spacer = start - (pos + offset + length);
            if spacer > MAX_RIBOSOME_DISTANCE || score < MIN_CUMULATIVE_SCORE {
                continue;
            }
            return Some(Candidate {
                length,
                spacer,
                index: exact_index(score as i32, spacer_bucket(spacer, length)),
            });
        }
    }
    None
}

/// Best single-mismatch motif in the 6-base window at `pos`, if any.
///
/// Exactly one base may disagree with the template, and only at an
/// internal position: an edge mismatch is just a shorter exact motif.
fn best_mismatch(view: &[u8], slen: usize, pos: usize, start: usize) -> Option<Candidate> {
    let limit = window_limit(slen, pos, start)?;
    if limit < MIN_MISMATCH_MOTIF_LENGTH {
        return None;
    }
    // A disagreements cost more than G: the penalties are tuned so each
    // mismatch class lands on a single cumulative score.
    let scores = template_scores(view, pos, limit, -3.0, -2.0);

    for length in (MIN_MISMATCH_MOTIF_LENGTH..=limit).rev() {
        for offset in (0..=limit - length).rev() {
            let window = &scores[offset..offset + length];
            let mismatches: Vec<usize> = window
                .iter()
                .enumerate()
                .filter(|(_, &s)| s < 0.0)
                .map(|(k, _)| k)
                .collect();
            let internal = match mismatches.as_slice() {
                [k] => *k >= 2 && *k + 3 <= length,
                _ => false,
            };
            if !internal {
                continue;
            }
            let score = window.iter().sum::<f64>() - 2.0;
            let spacer = start - (pos + offset + length);
            if spacer > MAX_RIBOSOME_DISTANCE || score < MIN_CUMULATIVE_SCORE {
                continue;
            }
            return Some(Candidate {
                length,
                spacer,
                index: mismatch_index(score as i32, mismatch_spacer_bucket(spacer)),
            });
        }
    }
    None
}

/// Exact-mode motif index for the window at `pos` against a start at
/// `start`, over a packed strand buffer of `slen` bases. 0 means no site.
#[must_use]
pub fn shine_dalgarno_exact(view: &[u8], slen: usize, pos: usize, start: usize) -> usize {
    best_exact(view, slen, pos, start).map_or(0, |c| c.index)
}

/// Mismatch-mode motif index for the window at `pos`. 0 means no site.
#[must_use]
pub fn shine_dalgarno_mm(view: &[u8], slen: usize, pos: usize, start: usize) -> usize {
    best_mismatch(view, slen, pos, start).map_or(0, |c| c.index)
}

impl PackedSequence {
    /// Motif index for the 6-base window at `pos` upstream of a candidate
    /// start codon at `start`, both in `strand` coordinates.
    ///
    /// Models that do not trust Shine-Dalgarno evidence
    /// (`uses_sd == false`) always yield the sentinel 0.
    #[must_use]
    pub fn shine_dalgarno(
        &self,
        pos: usize,
        start: usize,
        tinf: &TrainingInfo,
        strand: Strand,
        exact: bool,
    ) -> usize {
        if !tinf.uses_sd() {
            return 0;
        }
        let view = self.strand_view(strand);
        if exact {
            shine_dalgarno_exact(view, self.len(), pos, start)
        } else {
            shine_dalgarno_mm(view, self.len(), pos, start)
        }
    }
}

/// Window-scanning scorer for candidate translation starts.
///
/// Scans every motif position in `[start - window, start)` and keeps the
/// best hit under the structural ordering (longest motif, then smallest
/// spacer). The result is the table index the node scorer resolves
/// through [`TrainingInfo::rbs_weight`].
#[derive(Debug, Clone, Copy)]
pub struct ShineDalgarnoScorer {
    window: usize,
}

impl Default for ShineDalgarnoScorer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_WINDOW)
    }
}

impl ShineDalgarnoScorer {
    /// Scorer scanning `window` bases upstream of each candidate start.
    #[must_use]
    pub const fn new(window: usize) -> Self {
        Self { window }
    }

    /// Upstream scan length in bases.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Best motif index for a candidate start at `start` on `strand`.
    #[must_use]
    pub fn score(
        &self,
        seq: &PackedSequence,
        start: usize,
        tinf: &TrainingInfo,
        strand: Strand,
        exact: bool,
    ) -> usize {
        if !tinf.uses_sd() {
            return 0;
        }
        let view = seq.strand_view(strand);
        let slen = seq.len();
        let mut best: Option<Candidate> = None;
        for pos in start.saturating_sub(self.window)..start {
            let hit = if exact {
                best_exact(view, slen, pos, start)
            } else {
                best_mismatch(view, slen, pos, start)
            };
            if let Some(candidate) = hit {
                best = match best {
                    Some(current) if !candidate.beats(&current) => Some(current),
                    _ => Some(candidate),
                };
            }
        }
        best.map_or(0, |c| c.index)
    }

    /// Score many candidate starts in parallel.
    #[must_use]
    pub fn score_batch(
        &self,
        seq: &PackedSequence,
        starts: &[usize],
        tinf: &TrainingInfo,
        strand: Strand,
        exact: bool,
    ) -> Vec<usize> {
        starts
            .par_iter()
            .map(|&start| self.score(seq, start, tinf, strand, exact))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tinf() -> TrainingInfo {
        TrainingInfo::new(0.42)
    }

    #[test]
    fn exact_vectors_canonical_hexamer() {
        let seq = PackedSequence::from_string("AGGAGGTTAGCAAATATG", false).unwrap();
        let tinf = tinf();
        for pos in 0..10 {
            let expected = match pos {
                0 => 24,
                3 => 13,
                _ => 0,
            };
            assert_eq!(
                seq.shine_dalgarno(pos, 15, &tinf, Strand::Forward, true),
                expected,
                "pos {pos}"
            );
        }
    }

    #[test]
    fn exact_vectors_broken_hexamer() {
        let seq = PackedSequence::from_string("AGGTGGTTAGCAAATATG", false).unwrap();
        let tinf = tinf();
        for pos in 0..10 {
            let expected = if pos == 0 { 6 } else { 0 };
            assert_eq!(
                seq.shine_dalgarno(pos, 15, &tinf, Strand::Forward, true),
                expected,
                "pos {pos}"
            );
        }
    }

    #[test]
    fn mismatch_vectors() {
        let tinf = tinf();
        let seq = PackedSequence::from_string("AGGAGGTTAGCAAATATG", false).unwrap();
        for pos in 0..10 {
            // A perfect template never counts as a mismatch motif.
            assert_eq!(
                seq.shine_dalgarno(pos, 15, &tinf, Strand::Forward, false),
                0,
                "pos {pos}"
            );
        }
        let seq = PackedSequence::from_string("AGGTGGTTAGCAAATATG", false).unwrap();
        for pos in 0..10 {
            let expected = if pos == 0 { 19 } else { 0 };
            assert_eq!(
                seq.shine_dalgarno(pos, 15, &tinf, Strand::Forward, false),
                expected,
                "pos {pos}"
            );
        }
    }

    #[test]
    fn exact_and_mismatch_results_are_not_ordered() {
        // The broken hexamer scores 6 exact but 19 in mismatch mode.
        let seq = PackedSequence::from_string("AGGTGGTTAGCAAATATG", false).unwrap();
        let tinf = tinf();
        let exact = seq.shine_dalgarno(0, 15, &tinf, Strand::Forward, true);
        let relaxed = seq.shine_dalgarno(0, 15, &tinf, Strand::Forward, false);
        assert_eq!(exact, 6);
        assert_eq!(relaxed, 19);
    }

    #[test]
    fn untrusted_sd_model_scores_zero() {
        let seq = PackedSequence::from_string("AGGAGGTTAGCAAATATG", false).unwrap();
        let mut tinf = tinf();
        tinf.set_uses_sd(false).unwrap();
        assert_eq!(seq.shine_dalgarno(0, 15, &tinf, Strand::Forward, true), 0);
        let scorer = ShineDalgarnoScorer::default();
        assert_eq!(scorer.score(&seq, 15, &tinf, Strand::Forward, true), 0);
    }

    #[test]
    fn window_scan_finds_the_hexamer() {
        let seq = PackedSequence::from_string("AGGAGGTTAGCAAATATG", false).unwrap();
        let tinf = tinf();
        let scorer = ShineDalgarnoScorer::default();
        assert_eq!(scorer.score(&seq, 15, &tinf, Strand::Forward, true), 24);
        // A window too short to reach the motif sees nothing.
        let scorer = ShineDalgarnoScorer::new(6);
        assert_eq!(scorer.score(&seq, 15, &tinf, Strand::Forward, true), 0);
    }

    #[test]
    fn batch_scores_agree_with_sequential() {
        let seq = PackedSequence::from_string("AGGAGGTTAGCAAATATGAGGAGGTTAGCAAATATG", false)
            .unwrap();
        let tinf = tinf();
        let scorer = ShineDalgarnoScorer::default();
        let starts: Vec<usize> = (6..seq.len()).collect();
        let batch = scorer.score_batch(&seq, &starts, &tinf, Strand::Forward, true);
        for (i, &start) in starts.iter().enumerate() {
            assert_eq!(
                batch[i],
                scorer.score(&seq, start, &tinf, Strand::Forward, true),
                "start {start}"
            );
        }
    }

    #[test]
    fn scan_positions_past_the_sequence_are_rejected() {
        let seq = PackedSequence::from_string("AGGAGG", false).unwrap();
        let tinf = tinf();
        assert_eq!(seq.shine_dalgarno(0, 40, &tinf, Strand::Forward, true), 0);
        assert_eq!(seq.shine_dalgarno(5, 5, &tinf, Strand::Forward, true), 0);
    }

    #[test]
    fn catalog_has_one_sentinel_and_28_rows() {
        assert_eq!(RBS_MOTIFS.len(), 28);
        assert_eq!(describe(0), ("None", "None"));
        assert_eq!(describe(24), ("AGGAGG", "5-10bp"));
        assert_eq!(describe(19), ("AGxAGG/AGGxGG", "5-10bp"));
        assert_eq!(describe(99), ("None", "None"));
    }
}

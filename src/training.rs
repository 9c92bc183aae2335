//! The learned statistical model consulted during gene scoring.
//!
//! A [`TrainingInfo`] bundles everything a node scorer needs from a
//! trained (or preset) model: genome GC, per-frame bias, start-codon type
//! weights, the Shine-Dalgarno weight vector addressed by motif-table
//! indices, and the upstream-composition / non-SD motif tables used when
//! SD evidence is not trusted.
//!
//! Instances bound to a metagenomic preset are immutable: every setter
//! fails with [`RbscanError::ImmutableState`]. Freshly constructed or
//! deserialized instances are freely mutable.
//!
//! Models serialize to a fixed-size positional binary record (see
//! [`TRAINING_RECORD_SIZE`]) with no magic number or length prefixes;
//! truncated sources fail with [`RbscanError::TruncatedModel`].

use std::io::{ErrorKind, Read, Write};

use log::debug;

use crate::constants::{
    DEFAULT_START_WEIGHT, DEFAULT_TRANSLATION_TABLE, MAX_MOTIF_INDEX, NUM_BASES, NUM_MOTIF_SIZES,
    NUM_RBS_WEIGHTS, NUM_SPACER_CLASSES, TRAINING_RECORD_SIZE, UPSTREAM_POSITIONS,
};
use crate::metagenomic::{self, MetagenomicBin};
use crate::types::{Bias, MotifWeights, RbsWeights, RbscanError, TypeWeights, UpstreamCompositions};

/// Heap-allocate a zeroed non-SD motif table without staging it on the stack.
pub(crate) fn zeroed_motif_weights() -> Box<MotifWeights> {
    let flat = vec![[[0.0f64; MAX_MOTIF_INDEX]; NUM_SPACER_CLASSES]; NUM_MOTIF_SIZES];
    flat.into_boxed_slice().try_into().unwrap()
}

/// A trained or preset gene model.
#[derive(Debug, Clone)]
pub struct TrainingInfo {
    translation_table: i32,
    gc: f64,
    bias: Bias,
    type_weights: TypeWeights,
    uses_sd: bool,
    start_weight: f64,
    upstream_compositions: Box<UpstreamCompositions>,
    motif_weights: Box<MotifWeights>,
    rbs_weights: Box<RbsWeights>,
    metagenomic_bin: Option<usize>,
}

impl TrainingInfo {
    /// A mutable model with the given GC content and documented defaults:
    /// translation table 11, unit bias, zero type weights, SD trusted,
    /// start weight 4.35, zeroed weight tables.
    #[must_use]
    pub fn new(gc: f64) -> Self {
        Self {
            translation_table: DEFAULT_TRANSLATION_TABLE,
            gc,
            bias: [1.0; 3],
            type_weights: [0.0; 3],
            uses_sd: true,
            start_weight: DEFAULT_START_WEIGHT,
            upstream_compositions: Box::new([[0.0; NUM_BASES]; UPSTREAM_POSITIONS]),
            motif_weights: zeroed_motif_weights(),
            rbs_weights: Box::new([0.0; NUM_RBS_WEIGHTS]),
            metagenomic_bin: None,
        }
    }

    /// Constructor for registry presets; the resulting model is bound to
    /// bin `bin` and therefore immutable.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn preset(
        bin: usize,
        translation_table: i32,
        gc: f64,
        bias: Bias,
        type_weights: TypeWeights,
        uses_sd: bool,
        start_weight: f64,
        upstream_compositions: Box<UpstreamCompositions>,
        motif_weights: Box<MotifWeights>,
        rbs_weights: Box<RbsWeights>,
    ) -> Self {
        Self {
            translation_table,
            gc,
            bias,
            type_weights,
            uses_sd,
            start_weight,
            upstream_compositions,
            motif_weights,
            rbs_weights,
            metagenomic_bin: Some(bin),
        }
    }

    fn writable(&self, field: &'static str) -> Result<(), RbscanError> {
        if self.metagenomic_bin.is_some() {
            Err(RbscanError::ImmutableState(field))
        } else {
            Ok(())
        }
    }

    /// The preset bin this model belongs to, if any.
    ///
    /// `None` for user-constructed, trained, or deserialized models.
    #[must_use]
    pub fn metagenomic_bin(&self) -> Option<&'static MetagenomicBin> {
        self.metagenomic_bin.map(|id| &metagenomic::bins()[id])
    }

    /// NCBI genetic code identifier.
    #[must_use]
    pub fn translation_table(&self) -> i32 {
        self.translation_table
    }

    /// Genome GC content in `[0, 1]`.
    #[must_use]
    pub fn gc(&self) -> f64 {
        self.gc
    }

    /// GC frame bias, one factor per codon position.
    #[must_use]
    pub fn bias(&self) -> &Bias {
        &self.bias
    }

    /// Start-codon type weights (ATG, GTG, TTG).
    #[must_use]
    pub fn type_weights(&self) -> &TypeWeights {
        &self.type_weights
    }

    /// Whether Shine-Dalgarno evidence is trusted for this model.
    #[must_use]
    pub fn uses_sd(&self) -> bool {
        self.uses_sd
    }

    /// Weight applied to start-score contributions.
    #[must_use]
    pub fn start_weight(&self) -> f64 {
        self.start_weight
    }

    /// Upstream base-composition scores.
    #[must_use]
    pub fn upstream_compositions(&self) -> &UpstreamCompositions {
        &self.upstream_compositions
    }

    /// Non-SD motif weight tables.
    #[must_use]
    pub fn motif_weights(&self) -> &MotifWeights {
        &self.motif_weights
    }

    /// Shine-Dalgarno weight vector, addressed by motif-table index.
    #[must_use]
    pub fn rbs_weights(&self) -> &RbsWeights {
        &self.rbs_weights
    }

    /// Numeric contribution for a motif-table index.
    ///
    /// The second stage of the two-stage design: the scorer resolves an
    /// index, the caller resolves the index to a weight here.
    /// Out-of-range indices read as the "no site" weight.
    #[must_use]
    pub fn rbs_weight(&self, index: usize) -> f64 {
        self.rbs_weights
            .get(index)
            .copied()
            .unwrap_or(self.rbs_weights[0])
    }

    pub fn set_translation_table(&mut self, table: i32) -> Result<(), RbscanError> {
        self.writable("translation_table")?;
        self.translation_table = table;
        Ok(())
    }

    pub fn set_gc(&mut self, gc: f64) -> Result<(), RbscanError> {
        self.writable("gc")?;
        self.gc = gc;
        Ok(())
    }

    pub fn set_bias(&mut self, bias: Bias) -> Result<(), RbscanError> {
        self.writable("bias")?;
        self.bias = bias;
        Ok(())
    }

    pub fn set_type_weights(&mut self, weights: TypeWeights) -> Result<(), RbscanError> {
        self.writable("type_weights")?;
        self.type_weights = weights;
        Ok(())
    }

    pub fn set_uses_sd(&mut self, uses_sd: bool) -> Result<(), RbscanError> {
        self.writable("uses_sd")?;
        self.uses_sd = uses_sd;
        Ok(())
    }

    pub fn set_start_weight(&mut self, weight: f64) -> Result<(), RbscanError> {
        self.writable("start_weight")?;
        self.start_weight = weight;
        Ok(())
    }

    pub fn set_upstream_compositions(
        &mut self,
        compositions: UpstreamCompositions,
    ) -> Result<(), RbscanError> {
        self.writable("upstream_compositions")?;
        *self.upstream_compositions = compositions;
        Ok(())
    }

    pub fn set_motif_weights(&mut self, weights: Box<MotifWeights>) -> Result<(), RbscanError> {
        self.writable("motif_weights")?;
        self.motif_weights = weights;
        Ok(())
    }

    pub fn set_rbs_weights(&mut self, weights: RbsWeights) -> Result<(), RbscanError> {
        self.writable("rbs_weights")?;
        *self.rbs_weights = weights;
        Ok(())
    }

    /// Serialize the model as one fixed-size little-endian record.
    ///
    /// Fields are written in declaration order with no framing; I/O
    /// failures from `sink` propagate unchanged, so a partial write is
    /// visible to the caller.
    pub fn dump<W: Write>(&self, sink: &mut W) -> Result<(), RbscanError> {
        let mut record = RecordWriter::with_capacity(TRAINING_RECORD_SIZE);
        record.put_i32(self.translation_table);
        record.put_f64(self.gc);
        for value in &self.bias {
            record.put_f64(*value);
        }
        for value in &self.type_weights {
            record.put_f64(*value);
        }
        record.put_u8(u8::from(self.uses_sd));
        record.put_f64(self.start_weight);
        for row in self.upstream_compositions.iter() {
            for value in row {
                record.put_f64(*value);
            }
        }
        for size_class in self.motif_weights.iter() {
            for spacer_class in size_class {
                for value in spacer_class {
                    record.put_f64(*value);
                }
            }
        }
        for value in self.rbs_weights.iter() {
            record.put_f64(*value);
        }
        debug!("dumping {}-byte training record", record.len());
        sink.write_all(record.as_slice())?;
        Ok(())
    }

    /// Deserialize a model dumped with [`TrainingInfo::dump`].
    ///
    /// Fails with [`RbscanError::TruncatedModel`] when fewer than
    /// [`TRAINING_RECORD_SIZE`] bytes are available; never returns a
    /// partially populated model. The result is always mutable with no
    /// metagenomic bin link, even if the bytes came from a preset.
    pub fn load<R: Read>(source: &mut R) -> Result<Self, RbscanError> {
        let mut buffer = vec![0u8; TRAINING_RECORD_SIZE];
        source.read_exact(&mut buffer).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                RbscanError::TruncatedModel(TRAINING_RECORD_SIZE)
            } else {
                RbscanError::Io(err)
            }
        })?;

        let mut record = RecordReader::new(&buffer);
        let translation_table = record.get_i32();
        let gc = record.get_f64();
        let mut bias = [0.0; 3];
        for value in &mut bias {
            *value = record.get_f64();
        }
        let mut type_weights = [0.0; 3];
        for value in &mut type_weights {
            *value = record.get_f64();
        }
        let uses_sd = record.get_u8() != 0;
        let start_weight = record.get_f64();
        let mut upstream_compositions = Box::new([[0.0; NUM_BASES]; UPSTREAM_POSITIONS]);
        for row in upstream_compositions.iter_mut() {
            for value in row {
                *value = record.get_f64();
            }
        }
        let mut motif_weights = zeroed_motif_weights();
        for size_class in motif_weights.iter_mut() {
            for spacer_class in size_class {
                for value in spacer_class {
                    *value = record.get_f64();
                }
            }
        }
        let mut rbs_weights = Box::new([0.0; NUM_RBS_WEIGHTS]);
        for value in rbs_weights.iter_mut() {
            *value = record.get_f64();
        }
        debug!("loaded training record (table {translation_table}, gc {gc:.4})");

        Ok(Self {
            translation_table,
            gc,
            bias,
            type_weights,
            uses_sd,
            start_weight,
            upstream_compositions,
            motif_weights,
            rbs_weights,
            metagenomic_bin: None,
        })
    }
}

/// Field-by-field equality, independent of any metagenomic bin link.
impl PartialEq for TrainingInfo {
    fn eq(&self, other: &Self) -> bool {
        self.translation_table == other.translation_table
            && self.gc == other.gc
            && self.bias == other.bias
            && self.type_weights == other.type_weights
            && self.uses_sd == other.uses_sd
            && self.start_weight == other.start_weight
            && *self.upstream_compositions == *other.upstream_compositions
            && *self.motif_weights == *other.motif_weights
            && *self.rbs_weights == *other.rbs_weights
    }
}

/// Little-endian positional record assembly.
struct RecordWriter {
    bytes: Vec<u8>,
}

impl RecordWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    fn put_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn put_f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

/// Little-endian positional record disassembly over a length-checked buffer.
struct RecordReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer[self.offset..self.offset + N]);
        self.offset += N;
        out
    }

    fn get_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take::<4>())
    }

    fn get_f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take::<8>())
    }

    fn get_u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }
}

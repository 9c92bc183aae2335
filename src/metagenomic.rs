//! Preset models for metagenomic gene prediction.
//!
//! When no genome-specific training is possible (short contigs, mixed
//! communities), prediction falls back to one of 50 preset bins, each
//! representing a clade of reference organisms. The registry is built
//! once on first access and never mutated; every preset's
//! [`TrainingInfo`] is bound to its bin and therefore immutable.
//!
//! Bin descriptors (label, domain, GC, genetic code, SD usage) follow the
//! reference calibration set. The bundled weight payloads are
//! deterministic surrogates derived from each descriptor; full per-genome
//! tables are produced by the trainer, which is outside this crate.

use log::debug;
use once_cell::sync::Lazy;

use crate::constants::{DEFAULT_START_WEIGHT, NUM_RBS_WEIGHTS, UPSTREAM_POSITIONS};
use crate::training::TrainingInfo;
use crate::types::{Bias, RbsWeights, TypeWeights, UpstreamCompositions};

/// One preset bin: a clade label and its immutable model.
#[derive(Debug)]
pub struct MetagenomicBin {
    /// Zero-based, stable bin index.
    pub id: usize,
    /// Canonical organism label of the calibration genome.
    pub name: &'static str,
    /// Domain of the calibration genome: `"A"` archaea, `"B"` bacteria.
    pub domain: &'static str,
    /// Representative genome GC percentage (0-100 scale).
    pub gc_percent: f64,
    training_info: TrainingInfo,
}

impl MetagenomicBin {
    /// The preset model for this bin.
    ///
    /// The returned model is immutable; its
    /// [`TrainingInfo::metagenomic_bin`] points back at this entry.
    #[must_use]
    pub fn training_info(&self) -> &TrainingInfo {
        &self.training_info
    }
}

/// The preset bins, ordered by stable index.
#[must_use]
pub fn bins() -> &'static [MetagenomicBin] {
    &BINS
}

/// (label, domain, GC percent, translation table, SD usage).
///
/// Mycoplasma bins use genetic code 4; the crenarchaeal bins are the
/// calibration genomes without detectable Shine-Dalgarno usage.
const DESCRIPTORS: [(&str, &str, f64, i32, bool); 50] = [
    ("Mycoplasma_bovis_PG45", "B", 29.31, 4, true),
    ("Mycoplasma_pneumoniae_M129", "B", 40.01, 4, true),
    ("Mycoplasma_suis_Illinois", "B", 31.08, 4, true),
    ("Aeropyrum_pernix_K1", "A", 56.31, 11, false),
    ("Akkermansia_muciniphila_ATCC_BAA_835", "B", 55.76, 11, true),
    ("Anaplasma_marginale_Maries", "B", 49.76, 11, true),
    ("Anaplasma_phagocytophilum_HZ", "B", 41.64, 11, true),
    ("Archaeoglobus_fulgidus_DSM_4304", "A", 48.58, 11, true),
    ("Bacteroides_fragilis_NCTC_9343", "B", 43.19, 11, true),
    ("Brucella_canis_ATCC_23365", "B", 57.21, 11, true),
    ("Burkholderia_rhizoxinica_HKI_454", "B", 59.70, 11, true),
    ("Candidatus_Amoebophilus_asiaticus_5a2", "B", 35.05, 11, true),
    ("Candidatus_Korarchaeum_cryptofilum_OPF8", "A", 49.00, 11, true),
    ("Catenulispora_acidiphila_DSM_44928", "B", 69.77, 11, true),
    ("Cenarchaeum_symbiosum_B", "A", 57.19, 11, false),
    ("Chlorobium_phaeobacteroides_BS1", "B", 48.93, 11, true),
    ("Chlorobium_tepidum_TLS", "B", 56.53, 11, true),
    ("Desulfotomaculum_acetoxidans_DSM_771", "B", 41.55, 11, true),
    ("Desulfurococcus_kamchatkensis_1221n", "B", 45.34, 11, false),
    ("Erythrobacter_litoralis_HTCC2594", "B", 63.07, 11, true),
    ("Escherichia_coli_UMN026", "B", 50.72, 11, true),
    ("Haloquadratum_walsbyi_DSM_16790", "A", 47.86, 11, true),
    ("Halorubrum_lacusprofundi_ATCC_49239", "A", 57.14, 11, true),
    ("Hyperthermus_butylicus_DSM_5456", "A", 53.74, 11, false),
    ("Ignisphaera_aggregans_DSM_17230", "A", 35.69, 11, false),
    ("Marinobacter_aquaeolei_VT8", "B", 57.27, 11, true),
    ("Methanopyrus_kandleri_AV19", "A", 61.16, 11, true),
    ("Methanosphaerula_palustris_E1_9c", "A", 55.35, 11, true),
    ("Methanothermobacter_thermautotrophicus_Delta_H", "B", 49.54, 11, true),
    ("Methylacidiphilum_infernorum_V4", "B", 45.48, 11, true),
    ("Mycobacterium_leprae_TN", "B", 57.80, 11, true),
    ("Natrialba_magadii_ATCC_43099", "A", 61.42, 11, true),
    ("Orientia_tsutsugamushi_Boryong", "B", 30.53, 11, true),
    ("Pelotomaculum_thermopropionicum_SI", "B", 52.96, 11, true),
    ("Prochlorococcus_marinus_MIT_9313", "B", 50.74, 11, true),
    ("Pyrobaculum_aerophilum_IM2", "A", 51.36, 11, false),
    ("Ralstonia_solanacearum_PSI07", "B", 66.13, 11, true),
    ("Rhizobium_NGR234", "B", 58.49, 11, true),
    ("Rhodococcus_jostii_RHA1", "B", 65.05, 11, true),
    ("Rickettsia_conorii_Malish_7", "B", 32.44, 11, true),
    ("Rothia_dentocariosa_ATCC_17931", "B", 53.69, 11, true),
    ("Shigella_dysenteriae_Sd197", "B", 51.25, 11, true),
    ("Synechococcus_CC9605", "B", 59.22, 11, true),
    ("Synechococcus_JA_2_3B_a_2_13_", "B", 58.45, 11, true),
    ("Thermoplasma_volcanium_GSS1", "A", 39.92, 11, true),
    ("Treponema_pallidum_Nichols", "B", 52.77, 11, true),
    ("Tropheryma_whipplei_TW08_27", "B", 46.31, 11, true),
    ("Xenorhabdus_nematophila_ATCC_19061", "B", 44.15, 11, true),
    ("Xylella_fastidiosa_Temecula1", "B", 51.78, 11, true),
    ("_Nostoc_azollae__0708", "B", 38.45, 11, true),
];

/// Shared RBS log-odds profile; per-bin payloads scale it by SD strength.
const RBS_PROFILE: [f64; NUM_RBS_WEIGHTS] = [
    -2.14, -0.63, -1.42, -1.12, -0.31, 0.12, -0.18, 0.34, 0.57, 0.41, 0.93, 0.52, 0.44, 0.86,
    1.04, 1.12, 1.31, 1.22, 1.47, 1.88, 1.61, 1.79, 2.03, 2.21, 2.94, 2.46, 2.53, 2.71,
];

fn preset_bias(gc: f64) -> Bias {
    // Frame factors sum to 3.0; GC-rich genomes push coding bias onto the
    // first codon position.
    [
        1.0 + 1.2 * (gc - 0.5),
        1.0 - 0.2 * (gc - 0.5),
        1.0 - 1.0 * (gc - 0.5),
    ]
}

fn preset_type_weights(domain: &str) -> TypeWeights {
    if domain == "A" {
        [0.62, -0.28, -0.82]
    } else {
        [0.78, -0.45, -1.18]
    }
}

fn preset_rbs_weights(gc: f64, uses_sd: bool) -> Box<RbsWeights> {
    let mut weights = Box::new([0.0; NUM_RBS_WEIGHTS]);
    if uses_sd {
        let scale = 0.8 + 0.4 * gc;
        for (slot, base) in weights.iter_mut().zip(RBS_PROFILE.iter()) {
            *slot = base * scale;
        }
    }
    weights
}

fn preset_upstream_compositions(gc: f64) -> Box<UpstreamCompositions> {
    // Start regions run AT-rich relative to the genome background.
    let at_background = (1.0 - gc) / 2.0;
    let gc_background = gc / 2.0;
    let at_score = ((at_background + 0.04) / at_background).ln();
    let gc_score = ((gc_background - 0.04) / gc_background).ln();
    Box::new([[at_score, gc_score, gc_score, at_score]; UPSTREAM_POSITIONS])
}

fn preset_training(id: usize) -> TrainingInfo {
    let (_, domain, gc_percent, table, uses_sd) = DESCRIPTORS[id];
    let gc = gc_percent / 100.0;
    TrainingInfo::preset(
        id,
        table,
        gc,
        preset_bias(gc),
        preset_type_weights(domain),
        uses_sd,
        DEFAULT_START_WEIGHT,
        preset_upstream_compositions(gc),
        crate::training::zeroed_motif_weights(),
        preset_rbs_weights(gc, uses_sd),
    )
}

static BINS: Lazy<Vec<MetagenomicBin>> = Lazy::new(|| {
    debug!("initializing {} metagenomic bins", DESCRIPTORS.len());
    DESCRIPTORS
        .iter()
        .enumerate()
        .map(|(id, &(name, domain, gc_percent, _, _))| MetagenomicBin {
            id,
            name,
            domain,
            gc_percent,
            training_info: preset_training(id),
        })
        .collect()
});

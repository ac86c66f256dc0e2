//! Records describing typing calls (MLST, cgMLST, lineage, serotype).

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

/// Software that produces typing results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypingSoftware {
    /// chewBBACA (cgMLST).
    Chewbbaca,

    /// `mlst` by T. Seemann.
    Mlst,

    /// TB-Profiler.
    Tbprofiler,

    /// Mykrobe.
    Mykrobe,

    /// VirulenceFinder.
    Virulencefinder,

    /// SerotypeFinder.
    Serotypefinder,

    /// ShigaPass.
    Shigapass,
}

/// Typing methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypingMethod {
    /// Multi-locus sequence typing.
    #[serde(rename = "mlst")]
    Mlst,

    /// Core-genome MLST.
    #[serde(rename = "cgmlst")]
    Cgmlst,

    /// Lineage assignment.
    #[serde(rename = "lineage")]
    Lineage,

    /// Shiga toxin typing.
    #[serde(rename = "stx")]
    Stx,

    /// O antigen typing.
    #[serde(rename = "O_type")]
    OType,

    /// H antigen typing.
    #[serde(rename = "H_type")]
    HType,

    /// Shigella serotyping.
    #[serde(rename = "shigatype")]
    Shigatype,
}

/// Allele call failures reported by chewBBACA.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChewbbacaError {
    /// Possible locus on the 5' tip of a contig.
    Plot5,
    /// Possible locus on the 3' tip of a contig.
    Plot3,
    /// Locus on the tip of a small contig.
    Lotsc,
    /// Non-informative paralogous hit.
    Niph,
    /// Non-informative paralogous hit, exact match.
    Niphem,
    /// Alleles larger than the mode.
    Alm,
    /// Alleles smaller than the mode.
    Asm,
    /// Locus not found.
    Lnf,
}

/// Allele call failures reported by `mlst`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MlstError {
    /// A novel allele.
    Novel,
    /// A partial match.
    Partial,
}

/// One allele call in an MLST-like scheme.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlleleCall {
    /// A single allele number.
    Number(u64),

    /// Several equally good allele numbers.
    Multiple(Vec<u64>),

    /// A chewBBACA failure code.
    Chewbbaca(ChewbbacaError),

    /// An `mlst` failure code.
    Mlst(MlstError),

    /// Anything else the tool wrote, kept verbatim.
    Other(String),
}

/// Allele calls keyed by locus; `None` when the locus was not called.
pub type Alleles = IndexMap<String, Option<AlleleCall>>;

/// MLST results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingResultMlst {
    /// The MLST scheme.
    pub scheme: String,

    /// Sequence type, if one could be assigned.
    #[serde(alias = "sequenceType")]
    pub sequence_type: Option<u32>,

    /// Allele calls.
    pub alleles: Alleles,
}

/// cgMLST results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingResultCgMlst {
    /// Allele calls.
    pub alleles: Alleles,

    /// Number of novel alleles.
    #[serde(default, alias = "nNovel")]
    pub n_novel: u32,

    /// Number of missing loci.
    #[serde(default, alias = "nMissing")]
    pub n_missing: u32,
}

/// ShigaPass serotype prediction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypingResultShiga {
    /// rfb gene cluster.
    pub rfb: Option<String>,

    /// Percentage of rfb hits.
    pub rfb_hits: Option<f64>,

    /// MLST sequence type as reported by ShigaPass.
    pub mlst: Option<String>,

    /// fliC allele.
    pub flic: Option<String>,

    /// CRISPR spacer type.
    pub crispr: Option<String>,

    /// Presence of `ipaH`.
    pub ipah: Option<String>,

    /// Predicted serotype.
    pub predicted_serotype: Option<String>,

    /// Predicted flexneri serotype.
    pub predicted_flex_serotype: Option<String>,

    /// Free text comments.
    pub comments: Option<String>,
}

/// Information about one lineage a sample was assigned to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineageInformation {
    /// Lineage name.
    pub lineage: Option<String>,

    /// Lineage family.
    pub family: Option<String>,

    /// Region of difference.
    pub rd: Option<String>,

    /// Fraction of supporting reads.
    pub fraction: Option<f64>,

    /// Supporting evidence as reported by the tool.
    #[serde(default)]
    pub support: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
}

/// Lineage results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingResultLineage {
    /// Depth at the lineage-defining positions.
    #[serde(default)]
    pub lineage_depth: Option<f64>,

    /// Main lineage.
    pub main_lineage: String,

    /// Most specific sublineage.
    pub sublineage: String,

    /// Every lineage the sample matched.
    #[serde(default)]
    pub lineages: Vec<LineageInformation>,
}

/// A gene allele identified by alignment, as reported by VirulenceFinder
/// (stx typing) and SerotypeFinder (O and H antigen typing).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingResultGeneAllele {
    /// Gene (allele) name, e.g. `stx2a` or `wzx`.
    pub gene_symbol: String,

    /// Reference accession.
    pub accession: Option<String>,

    /// Name of the closest reference sequence.
    #[serde(default)]
    pub sequence_name: Option<String>,

    /// Depth; `null` when the input was an assembly.
    #[serde(default)]
    pub depth: Option<f64>,

    /// Percent identity.
    pub identity: f64,

    /// Percent coverage.
    pub coverage: f64,

    /// Alignment start on the reference.
    pub ref_start_pos: u64,

    /// Alignment end on the reference.
    pub ref_end_pos: u64,

    /// Reference gene length.
    pub ref_gene_length: u64,

    /// Alignment length.
    pub alignment_length: u64,

    /// Reference database.
    #[serde(default)]
    pub ref_database: Option<String>,

    /// Record id in the reference database.
    #[serde(default)]
    pub ref_id: Option<String>,
}

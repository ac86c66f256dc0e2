//! Records describing resistance and stress determinants found in a sample.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// The broad category of a predicted element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementType {
    /// Antimicrobial resistance.
    Amr,

    /// Stress response (biocides, heat, ...).
    Stress,

    /// Virulence factor.
    Virulence,
}

impl ElementType {
    /// Parses a category as reported by the prediction software. Matching is
    /// case insensitive, so `amr` and `AMR` are equivalent.
    pub fn from_category(category: &str) -> Option<Self> {
        match category.to_ascii_uppercase().as_str() {
            "AMR" => Some(ElementType::Amr),
            "STRESS" => Some(ElementType::Stress),
            "VIRULENCE" => Some(ElementType::Virulence),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Amr => write!(f, "AMR"),
            ElementType::Stress => write!(f, "STRESS"),
            ElementType::Virulence => write!(f, "VIRULENCE"),
        }
    }
}

/// Subtypes of stress elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StressSubtype {
    /// Tolerance to biocides and disinfectants.
    Biocide,

    /// Heat resistance.
    Heat,
}

/// The subtype attached to a [`ResistanceGene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementSubtype {
    /// Acquired antimicrobial resistance.
    Amr,

    /// See [`StressSubtype::Biocide`].
    Biocide,

    /// See [`StressSubtype::Heat`].
    Heat,
}

impl From<StressSubtype> for ElementSubtype {
    fn from(subtype: StressSubtype) -> Self {
        match subtype {
            StressSubtype::Biocide => ElementSubtype::Biocide,
            StressSubtype::Heat => ElementSubtype::Heat,
        }
    }
}

/// Software that predicts resistance phenotypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSoftware {
    /// ResFinder (with PointFinder).
    Resfinder,
}

/// The kind of sequence change a [`ResistanceVariant`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    /// One or more nucleotides replaced.
    Substitution,

    /// Nucleotides inserted.
    Insertion,

    /// Nucleotides removed.
    Deletion,
}

/// A phenotype reported by the prediction software, resolved to its element
/// type and drug (or stress) class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeInfo {
    /// Element type of the phenotype.
    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Drug class, or `"unknown"` when the phenotype is not in the lookup table.
    #[serde(rename = "class")]
    pub res_class: String,

    /// The phenotype name as reported.
    pub name: String,
}

/// An acquired resistance (or stress) gene found in the sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResistanceGene {
    /// Gene symbol, e.g. `blaTEM-1B`.
    pub gene_symbol: String,

    /// Accession of the reference sequence.
    pub accession: String,

    /// Sequencing depth. Not reported when the input was an assembly.
    pub depth: Option<f64>,

    /// Percent identity to the reference.
    pub identity: f64,

    /// Percent of the reference covered by the alignment.
    pub coverage: f64,

    /// Alignment start on the reference.
    pub ref_start_pos: u64,

    /// Alignment end on the reference.
    pub ref_end_pos: u64,

    /// Length of the reference gene.
    pub ref_gene_length: u64,

    /// Length of the alignment.
    pub alignment_length: u64,

    /// Classified phenotypes conferred by the gene.
    pub phenotypes: Vec<PhenotypeInfo>,

    /// Reference database the gene was found in.
    pub ref_database: String,

    /// Record id within the reference database.
    pub ref_id: String,

    /// Element type, shared by every entry in `phenotypes`.
    pub element_type: ElementType,

    /// Element subtype.
    pub element_subtype: Option<ElementSubtype>,
}

/// A point mutation or indel that confers resistance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResistanceVariant {
    /// Kind of change.
    pub variant_type: VariantType,

    /// Symbol of the affected gene.
    pub gene_symbol: String,

    /// Accession of the affected gene.
    pub accession: String,

    /// Closest reference sequence name.
    pub close_seq_name: String,

    /// Classified phenotypes conferred by the variant.
    pub phenotypes: Vec<PhenotypeInfo>,

    /// Position of the change on the reference.
    pub position: u64,

    /// Reference nucleotides that changed.
    pub ref_nt: String,

    /// Alternate nucleotides.
    pub alt_nt: String,

    /// Reference amino acid.
    pub ref_aa: String,

    /// Alternate amino acid.
    pub alt_aa: String,

    /// Genomic change, e.g. `g.248C>T`.
    pub nucleotide_change: String,

    /// Protein change as reported, e.g. `p.S83L`.
    pub protein_change: String,

    /// Depth of the gene the variant was called in.
    pub depth: f64,

    /// Reference database.
    pub ref_database: String,

    /// Record id within the reference database.
    pub ref_id: String,
}

/// Drugs the sample was predicted resistant or susceptible to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResistanceProfile {
    /// Sorted names of the drugs the sample is susceptible to.
    pub susceptible: Vec<String>,

    /// Sorted names of the drugs the sample is resistant to.
    pub resistant: Vec<String>,
}

/// Resistance prediction for one element category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementTypeResult {
    /// Susceptibility/resistance profile.
    pub phenotypes: ResistanceProfile,

    /// Genes found.
    pub genes: Vec<ResistanceGene>,

    /// Variants found.
    pub mutations: Vec<ResistanceVariant>,
}

//! Normalization of ResFinder (and PointFinder) predictions.
//!
//! ResFinder reports every phenotype it knows about, every aligned reference
//! region and every known point mutation in one JSON document. It does not
//! separate stress phenotypes (biocides, heat) from antimicrobial ones, so the
//! split between [`ElementType::Amr`] and [`ElementType::Stress`] is computed
//! once from the stress keyword lists in [`super::lookup`] and applied
//! identically to the profile, the genes and the variants.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Deserializer;
use tracing::debug;
use tracing::info;

use crate::models::phenotype::ElementType;
use crate::models::phenotype::ElementTypeResult;
use crate::models::phenotype::PhenotypeInfo;
use crate::models::phenotype::ResistanceGene;
use crate::models::phenotype::ResistanceProfile;
use crate::models::phenotype::ResistanceVariant;
use crate::models::phenotype::VariantType;
use crate::models::MethodIndex;
use crate::phenotype::lookup;

/// Prefix of the reference databases holding acquired resistance genes.
const ACQUIRED_DATABASE_PREFIX: &str = "Res";

/// Separator used in the region keys a variation refers to
/// (`name;;id;;accession`).
const REGION_KEY_SEPARATOR: &str = ";;";

//==============//
// Input format //
//==============//

/// The parts of a ResFinder JSON result that are normalized.
#[derive(Debug, Default, Deserialize)]
pub struct ResfinderOutput {
    /// Every phenotype ResFinder evaluated, keyed by phenotype name.
    #[serde(default)]
    pub phenotypes: IndexMap<String, ResfinderPhenotype>,

    /// Aligned reference regions. Absent when nothing was aligned.
    #[serde(default)]
    pub seq_regions: Option<IndexMap<String, ResfinderSeqRegion>>,

    /// Known point mutations found in the sample.
    #[serde(default)]
    pub seq_variations: IndexMap<String, ResfinderSeqVariation>,
}

/// A phenotype entry.
#[derive(Debug, Deserialize)]
pub struct ResfinderPhenotype {
    /// Phenotype name.
    pub key: String,

    /// Category as reported (`amr` for every phenotype in practice).
    #[serde(default)]
    pub category: Option<String>,

    /// Whether the sample is predicted resistant. Absent for phenotypes
    /// ResFinder did not evaluate.
    #[serde(default)]
    pub amr_resistant: Option<bool>,

    /// Name of the drug the resistance call refers to.
    pub amr_resistance: String,
}

/// An aligned reference region.
#[derive(Debug, Deserialize)]
pub struct ResfinderSeqRegion {
    /// Gene name.
    pub name: String,

    /// Reference accession.
    pub ref_acc: String,

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

    /// Reference length.
    pub ref_seq_length: u64,

    /// Alignment length.
    pub alignment_length: u64,

    /// Phenotypes conferred by the region.
    #[serde(default)]
    pub phenotypes: Vec<String>,

    /// Reference databases, the first being the one the hit came from.
    #[serde(default, deserialize_with = "one_or_many")]
    pub ref_database: Vec<String>,

    /// Record id in the reference database.
    pub ref_id: String,
}

/// A point mutation.
#[derive(Debug, Deserialize)]
pub struct ResfinderSeqVariation {
    /// Set for substitutions.
    #[serde(default)]
    pub substitution: bool,

    /// Set for insertions.
    #[serde(default)]
    pub insertion: bool,

    /// Set for deletions.
    #[serde(default)]
    pub deletion: bool,

    /// Reference codon.
    #[serde(default)]
    pub ref_codon: Option<String>,

    /// Codon found in the sample.
    #[serde(default)]
    pub var_codon: Option<String>,

    /// Start position on the reference.
    pub ref_start_pos: u64,

    /// End position on the reference.
    pub ref_end_pos: u64,

    /// Reference amino acid.
    #[serde(default)]
    pub ref_aa: Option<String>,

    /// Amino acid found in the sample.
    #[serde(default)]
    pub var_aa: Option<String>,

    /// Protein level change, e.g. `p.S83L`.
    #[serde(default)]
    pub seq_var: Option<String>,

    /// Phenotypes conferred by the mutation.
    #[serde(default)]
    pub phenotypes: Vec<String>,

    /// Keys of the regions the mutation lies in (`name;;id;;accession`).
    #[serde(default)]
    pub seq_regions: Vec<String>,

    /// Reference database.
    #[serde(default, deserialize_with = "one_or_many")]
    pub ref_database: Vec<String>,

    /// Record id in the reference database.
    pub ref_id: String,
}

/// ResFinder writes some database fields as a string and others as a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// Reads a ResFinder JSON result from disk.
pub fn read_resfinder_output<P>(src: P) -> anyhow::Result<ResfinderOutput>
where
    P: AsRef<Path>,
{
    let path = src.as_ref();
    let reader = File::open(path)
        .map(BufReader::new)
        .with_context(|| format!("opening ResFinder result: {}", path.display()))?;

    serde_json::from_reader(reader)
        .with_context(|| format!("parsing ResFinder result: {}", path.display()))
}

//=====================//
// Nucleotide changes //
//=====================//

/// Compares two codons position by position and returns the reference and
/// alternate nucleotides at the positions that differ, upper cased.
///
/// ```
/// use prpr::phenotype::resfinder::get_nt_change;
///
/// assert_eq!(get_nt_change("TCG", "TTG"), (String::from("C"), String::from("T")));
/// ```
pub fn get_nt_change(ref_codon: &str, alt_codon: &str) -> (String, String) {
    let mut ref_nt = String::new();
    let mut alt_nt = String::new();

    for (r, a) in ref_codon.chars().zip(alt_codon.chars()) {
        if r != a {
            ref_nt.push(r);
            alt_nt.push(a);
        }
    }

    (ref_nt.to_uppercase(), alt_nt.to_uppercase())
}

/// Formats a nucleotide change in genomic coordinates.
pub fn format_nt_change(
    ref_nt: &str,
    alt_nt: &str,
    variant_type: VariantType,
    start_pos: u64,
    end_pos: u64,
) -> String {
    match variant_type {
        VariantType::Substitution => format!("g.{}{}>{}", start_pos, ref_nt, alt_nt),
        VariantType::Deletion => format!("g.{}_{}del", start_pos, end_pos),
        VariantType::Insertion => format!("g.{}_{}ins{}", start_pos, end_pos, alt_nt),
    }
}

//=================//
// Classification //
//=================//

/// The phenotypes that belong to a category. Stress phenotypes are the fixed
/// keyword lists; AMR phenotypes are everything else ResFinder reported.
pub fn category_phenotypes(
    prediction: &ResfinderOutput,
    category: ElementType,
) -> anyhow::Result<HashSet<String>> {
    match category {
        ElementType::Stress => Ok(lookup::all_stress_factors().map(String::from).collect()),
        ElementType::Amr => Ok(prediction
            .phenotypes
            .keys()
            .filter(|name| !lookup::is_stress_factor(name))
            .cloned()
            .collect()),
        other => bail!("ResFinder does not predict {} elements", other),
    }
}

/// Element type of a phenotype. Stress keywords are always
/// [`ElementType::Stress`] because ResFinder labels every phenotype `amr`;
/// otherwise the reported category is used, defaulting to AMR.
fn classify_element_type(prediction: &ResfinderOutput, phenotype: &str) -> ElementType {
    if lookup::is_stress_factor(phenotype) {
        return ElementType::Stress;
    }

    prediction
        .phenotypes
        .get(phenotype)
        .and_then(|p| p.category.as_deref())
        .and_then(ElementType::from_category)
        .unwrap_or(ElementType::Amr)
}

fn phenotype_infos(phenotypes: &[String], element_type: ElementType) -> Vec<PhenotypeInfo> {
    phenotypes
        .iter()
        .map(|name| PhenotypeInfo {
            element_type,
            res_class: lookup::lookup_antibiotic_class(name).to_string(),
            name: name.clone(),
        })
        .collect()
}

fn is_selected(phenotypes: &[String], limit_to_phenotypes: Option<&HashSet<String>>) -> bool {
    match limit_to_phenotypes {
        Some(limit) => phenotypes.iter().any(|p| limit.contains(p)),
        None => true,
    }
}

//============//
// Extraction //
//============//

/// Splits the phenotypes into drugs the sample is resistant and susceptible
/// to. Phenotypes without a resistance call are ignored.
pub fn get_resfinder_sr_profile(
    prediction: &ResfinderOutput,
    limit_to_phenotypes: Option<&HashSet<String>>,
) -> ResistanceProfile {
    let mut susceptible = BTreeSet::new();
    let mut resistant = BTreeSet::new();

    for phenotype in prediction.phenotypes.values() {
        if let Some(limit) = limit_to_phenotypes {
            if !limit.contains(&phenotype.key) {
                continue;
            }
        }

        match phenotype.amr_resistant {
            Some(true) => {
                resistant.insert(phenotype.amr_resistance.clone());
            }
            Some(false) => {
                susceptible.insert(phenotype.amr_resistance.clone());
            }
            None => {}
        }
    }

    ResistanceProfile {
        susceptible: susceptible.into_iter().collect(),
        resistant: resistant.into_iter().collect(),
    }
}

/// Extracts acquired resistance genes. Regions from other databases, regions
/// without phenotypes and regions outside the phenotype filter are skipped.
pub fn parse_resfinder_genes(
    prediction: &ResfinderOutput,
    limit_to_phenotypes: Option<&HashSet<String>>,
) -> Vec<ResistanceGene> {
    let regions = match &prediction.seq_regions {
        Some(regions) => regions,
        None => return Vec::new(),
    };

    let mut results = Vec::new();

    for (region_id, info) in regions {
        let database = match info.ref_database.first() {
            Some(db) if db.starts_with(ACQUIRED_DATABASE_PREFIX) => db,
            _ => continue,
        };

        if !is_selected(&info.phenotypes, limit_to_phenotypes) {
            continue;
        }

        let first_phenotype = match info.phenotypes.first() {
            Some(p) => p,
            None => {
                debug!("Region {} has no phenotypes, skipping.", region_id);
                continue;
            }
        };

        let element_type = classify_element_type(prediction, first_phenotype);
        let element_subtype = lookup::assign_element_subtype(&info.phenotypes, element_type);

        results.push(ResistanceGene {
            gene_symbol: info.name.clone(),
            accession: info.ref_acc.clone(),
            depth: info.depth,
            identity: info.identity,
            coverage: info.coverage,
            ref_start_pos: info.ref_start_pos,
            ref_end_pos: info.ref_end_pos,
            ref_gene_length: info.ref_seq_length,
            alignment_length: info.alignment_length,
            phenotypes: phenotype_infos(&info.phenotypes, element_type),
            ref_database: database.clone(),
            ref_id: info.ref_id.clone(),
            element_type,
            element_subtype,
        });
    }

    results
}

/// Extracts resistance conferring point mutations.
///
/// Fails if a mutation has none of the substitution, insertion or deletion
/// flags set, which means the ResFinder output is malformed.
pub fn parse_resfinder_variants(
    prediction: &ResfinderOutput,
    limit_to_phenotypes: Option<&HashSet<String>>,
) -> anyhow::Result<Vec<ResistanceVariant>> {
    let mut results = Vec::new();

    for (variation_id, info) in &prediction.seq_variations {
        if !is_selected(&info.phenotypes, limit_to_phenotypes) {
            continue;
        }

        let variant_type = if info.substitution {
            VariantType::Substitution
        } else if info.insertion {
            VariantType::Insertion
        } else if info.deletion {
            VariantType::Deletion
        } else {
            bail!(
                "sequence variation {} has no known mutation type",
                variation_id
            );
        };

        let region_key = info.seq_regions.first().map(String::as_str).unwrap_or("");
        let depth = prediction
            .seq_regions
            .as_ref()
            .and_then(|regions| regions.get(region_key))
            .and_then(|region| region.depth)
            .unwrap_or(0.0);

        let mut parts = region_key.split(REGION_KEY_SEPARATOR);
        let gene_symbol = parts.next().unwrap_or_default().to_string();
        let accession = parts.nth(1).unwrap_or_default().to_string();

        let (ref_nt, alt_nt) = get_nt_change(
            info.ref_codon.as_deref().unwrap_or_default(),
            info.var_codon.as_deref().unwrap_or_default(),
        );
        let nucleotide_change = format_nt_change(
            &ref_nt,
            &alt_nt,
            variant_type,
            info.ref_start_pos,
            info.ref_end_pos,
        );

        let phenotypes = info
            .phenotypes
            .iter()
            .map(|name| PhenotypeInfo {
                element_type: classify_element_type(prediction, name),
                res_class: lookup::lookup_antibiotic_class(name).to_string(),
                name: name.clone(),
            })
            .collect();

        results.push(ResistanceVariant {
            variant_type,
            close_seq_name: accession.clone(),
            gene_symbol,
            accession,
            phenotypes,
            position: info.ref_start_pos,
            ref_nt,
            alt_nt,
            ref_aa: info.ref_aa.clone().unwrap_or_default(),
            alt_aa: info.var_aa.clone().unwrap_or_default(),
            nucleotide_change,
            protein_change: info.seq_var.clone().unwrap_or_default(),
            depth,
            ref_database: info.ref_database.join(","),
            ref_id: info.ref_id.clone(),
        });
    }

    Ok(results)
}

/// Normalizes a ResFinder prediction for one resistance category.
pub fn parse_resfinder_amr_pred(
    prediction: &ResfinderOutput,
    category: ElementType,
) -> anyhow::Result<MethodIndex> {
    info!("Parsing {} resistance prediction", category);

    let limit = category_phenotypes(prediction, category)?;

    let phenotypes = get_resfinder_sr_profile(prediction, Some(&limit));
    let genes = parse_resfinder_genes(prediction, Some(&limit));
    let mutations = parse_resfinder_variants(prediction, Some(&limit))?;

    debug!(
        "Found {} genes and {} mutations for {}.",
        genes.len(),
        mutations.len(),
        category
    );

    Ok(MethodIndex::resfinder(
        category,
        ElementTypeResult {
            phenotypes,
            genes,
            mutations,
        },
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::phenotype::ElementSubtype;

    fn prediction() -> ResfinderOutput {
        serde_json::from_value(json!({
            "phenotypes": {
                "ampicillin": {
                    "key": "ampicillin", "category": "amr",
                    "amr_resistant": true, "amr_resistance": "ampicillin"
                },
                "ciprofloxacin": {
                    "key": "ciprofloxacin", "category": "amr",
                    "amr_resistant": true, "amr_resistance": "ciprofloxacin"
                },
                "colistin": {
                    "key": "colistin", "category": "amr",
                    "amr_resistant": false, "amr_resistance": "colistin"
                },
                "temperature": {
                    "key": "temperature", "category": "amr",
                    "amr_resistant": true, "amr_resistance": "temperature"
                },
                "chlorhexidine": {
                    "key": "chlorhexidine", "category": "amr",
                    "amr_resistance": "chlorhexidine"
                }
            },
            "seq_regions": {
                "blaTEM-1B;;1;;AY458016": {
                    "name": "blaTEM-1B", "ref_acc": "AY458016", "depth": 38.5,
                    "identity": 100.0, "coverage": 100.0,
                    "ref_start_pos": 1, "ref_end_pos": 861,
                    "ref_seq_length": 861, "alignment_length": 861,
                    "phenotypes": ["ampicillin"],
                    "ref_database": ["ResFinder-2.1.0"], "ref_id": "blaTEM-1B_1_AY458016"
                },
                "clpK1;;1;;CP011417": {
                    "name": "clpK1", "ref_acc": "CP011417", "depth": 20.0,
                    "identity": 99.5, "coverage": 100.0,
                    "ref_start_pos": 1, "ref_end_pos": 2277,
                    "ref_seq_length": 2277, "alignment_length": 2277,
                    "phenotypes": ["temperature"],
                    "ref_database": ["ResFinder-2.1.0"], "ref_id": "clpK1_1_CP011417"
                },
                "gyrA;;1;;CP073768": {
                    "name": "gyrA", "ref_acc": "CP073768", "depth": 55.0,
                    "identity": 99.0, "coverage": 100.0,
                    "ref_start_pos": 1, "ref_end_pos": 2637,
                    "ref_seq_length": 2637, "alignment_length": 2637,
                    "phenotypes": ["ciprofloxacin"],
                    "ref_database": ["PointFinder-1.0"], "ref_id": "gyrA_1_CP073768"
                }
            },
            "seq_variations": {
                "gyrA;;1;;CP073768;;83;;tcg;;ttg": {
                    "substitution": true, "insertion": false, "deletion": false,
                    "ref_codon": "tcg", "var_codon": "ttg",
                    "ref_start_pos": 248, "ref_end_pos": 250,
                    "ref_aa": "s", "var_aa": "l", "seq_var": "p.S83L",
                    "phenotypes": ["ciprofloxacin"],
                    "seq_regions": ["gyrA;;1;;CP073768"],
                    "ref_database": "PointFinder-1.0", "ref_id": "gyrA;;1;;CP073768_83"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_get_nt_change() {
        assert_eq!(
            get_nt_change("TCG", "TTG"),
            (String::from("C"), String::from("T"))
        );
        assert_eq!(
            get_nt_change("AAA", "AAA"),
            (String::new(), String::new())
        );
        assert_eq!(
            get_nt_change("tcg", "ata"),
            (String::from("TG"), String::from("AA"))
        );
    }

    #[test]
    fn test_format_nt_change() {
        assert_eq!(
            format_nt_change("C", "T", VariantType::Substitution, 248, 250),
            "g.248C>T"
        );
        assert_eq!(
            format_nt_change("", "", VariantType::Deletion, 10, 12),
            "g.10_12del"
        );
        assert_eq!(
            format_nt_change("", "AG", VariantType::Insertion, 10, 11),
            "g.10_11insAG"
        );
    }

    #[test]
    fn test_sr_profile_is_split_by_category() {
        let prediction = prediction();

        let amr = category_phenotypes(&prediction, ElementType::Amr).unwrap();
        let profile = get_resfinder_sr_profile(&prediction, Some(&amr));
        assert_eq!(profile.resistant, vec!["ampicillin", "ciprofloxacin"]);
        assert_eq!(profile.susceptible, vec!["colistin"]);

        let stress = category_phenotypes(&prediction, ElementType::Stress).unwrap();
        let profile = get_resfinder_sr_profile(&prediction, Some(&stress));
        assert_eq!(profile.resistant, vec!["temperature"]);
        assert!(profile.susceptible.is_empty());
    }

    #[test]
    fn test_virulence_is_not_a_resfinder_category() {
        assert!(category_phenotypes(&prediction(), ElementType::Virulence).is_err());
    }

    #[test]
    fn test_genes_from_acquired_databases_only() {
        let prediction = prediction();
        let genes = parse_resfinder_genes(&prediction, None);

        let symbols: Vec<&str> = genes.iter().map(|g| g.gene_symbol.as_str()).collect();
        assert_eq!(symbols, vec!["blaTEM-1B", "clpK1"]);

        let bla = &genes[0];
        assert_eq!(bla.element_type, ElementType::Amr);
        assert_eq!(bla.element_subtype, Some(ElementSubtype::Amr));
        assert_eq!(bla.depth, Some(38.5));
        assert_eq!(bla.ref_gene_length, 861);
        assert_eq!(bla.ref_database, "ResFinder-2.1.0");
        assert_eq!(bla.phenotypes[0].res_class, "beta-lactam");
    }

    #[test]
    fn test_stress_gene_is_classified_by_keyword() {
        let prediction = prediction();
        let stress = category_phenotypes(&prediction, ElementType::Stress).unwrap();
        let genes = parse_resfinder_genes(&prediction, Some(&stress));

        assert_eq!(genes.len(), 1);
        let gene = &genes[0];
        assert_eq!(gene.gene_symbol, "clpK1");
        assert_eq!(gene.element_type, ElementType::Stress);
        assert_eq!(gene.element_subtype, Some(ElementSubtype::Heat));
        assert!(gene
            .phenotypes
            .iter()
            .all(|p| p.element_type == gene.element_type));
        assert_eq!(gene.phenotypes[0].res_class, "unknown");
    }

    #[test]
    fn test_no_regions_yields_no_genes() {
        let mut prediction = prediction();
        prediction.seq_regions = Some(IndexMap::new());
        assert!(parse_resfinder_genes(&prediction, None).is_empty());

        prediction.seq_regions = None;
        assert!(parse_resfinder_genes(&prediction, None).is_empty());
    }

    #[test]
    fn test_variants() {
        let prediction = prediction();
        let variants = parse_resfinder_variants(&prediction, None).unwrap();
        assert_eq!(variants.len(), 1);

        let variant = &variants[0];
        assert_eq!(variant.variant_type, VariantType::Substitution);
        assert_eq!(variant.gene_symbol, "gyrA");
        assert_eq!(variant.accession, "CP073768");
        assert_eq!(variant.close_seq_name, "CP073768");
        assert_eq!(variant.ref_nt, "C");
        assert_eq!(variant.alt_nt, "T");
        assert_eq!(variant.nucleotide_change, "g.248C>T");
        assert_eq!(variant.protein_change, "p.S83L");
        assert_eq!(variant.depth, 55.0);
        assert_eq!(variant.ref_database, "PointFinder-1.0");
        assert_eq!(variant.phenotypes[0].res_class, "quinolone");
    }

    #[test]
    fn test_variant_depth_defaults_to_zero_without_regions() {
        let mut prediction = prediction();
        prediction.seq_regions = None;

        let variants = parse_resfinder_variants(&prediction, None).unwrap();
        assert_eq!(variants[0].depth, 0.0);
    }

    #[test]
    fn test_variant_without_type_flag_is_an_error() {
        let mut prediction = prediction();
        for variation in prediction.seq_variations.values_mut() {
            variation.substitution = false;
        }

        assert!(parse_resfinder_variants(&prediction, None).is_err());
    }

    #[test]
    fn test_filtered_out_variants_are_not_validated() {
        let mut prediction = prediction();
        for variation in prediction.seq_variations.values_mut() {
            variation.substitution = false;
        }

        let stress = category_phenotypes(&prediction, ElementType::Stress).unwrap();
        let variants = parse_resfinder_variants(&prediction, Some(&stress)).unwrap();
        assert!(variants.is_empty());
    }

    #[test]
    fn test_missing_sections_parse_to_an_empty_result() {
        let prediction: ResfinderOutput = serde_json::from_value(json!({})).unwrap();
        let index = parse_resfinder_amr_pred(&prediction, ElementType::Amr).unwrap();

        match index {
            MethodIndex::Resfinder { category, result } => {
                assert_eq!(category, ElementType::Amr);
                assert_eq!(result, ElementTypeResult::default());
            }
            _ => panic!("expected a ResFinder envelope"),
        }
    }

    #[test]
    fn test_full_amr_prediction() {
        let index = parse_resfinder_amr_pred(&prediction(), ElementType::Amr).unwrap();

        match index {
            MethodIndex::Resfinder { category, result } => {
                assert_eq!(category, ElementType::Amr);
                assert_eq!(result.genes.len(), 1);
                assert_eq!(result.genes[0].gene_symbol, "blaTEM-1B");
                assert_eq!(result.mutations.len(), 1);
                assert_eq!(result.phenotypes.susceptible, vec!["colistin"]);
            }
            _ => panic!("expected a ResFinder envelope"),
        }
    }
}

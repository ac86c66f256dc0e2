//! Static knowledge about antibiotics and stress factors.
//!
//! Antibiotic classes are sourced from the ResFinder database v2.2.1. Names
//! are matched exactly against the lower case names ResFinder reports.

use std::collections::HashSet;

use tracing::warn;

use crate::models::phenotype::ElementSubtype;
use crate::models::phenotype::ElementType;
use crate::models::phenotype::StressSubtype;

/// The class reported for phenotypes missing from [`lookup_antibiotic_class`].
pub const UNKNOWN_CLASS: &str = "unknown";

/// Compounds that induce a biocide stress response.
pub const BIOCIDE_FACTORS: [&str; 6] = [
    "formaldehyde",
    "benzylkonium chloride",
    "ethidium bromide",
    "chlorhexidine",
    "cetylpyridinium chloride",
    "hydrogen peroxide",
];

/// Conditions that induce a heat stress response.
pub const HEAT_FACTORS: [&str; 1] = ["temperature"];

/// Every stress subtype together with its keywords. Subtypes are evaluated in
/// this order by [`assign_stress_subtype`].
pub const STRESS_FACTORS: [(StressSubtype, &[&str]); 2] = [
    (StressSubtype::Biocide, &BIOCIDE_FACTORS),
    (StressSubtype::Heat, &HEAT_FACTORS),
];

/// Returns `true` if the phenotype is one of the stress keywords.
pub fn is_stress_factor(phenotype: &str) -> bool {
    all_stress_factors().any(|factor| factor == phenotype)
}

/// Iterates over the keywords of every stress subtype.
pub fn all_stress_factors() -> impl Iterator<Item = &'static str> {
    STRESS_FACTORS
        .iter()
        .flat_map(|(_, factors)| factors.iter().copied())
}

/// Looks up the drug class of an antibiotic, returning [`UNKNOWN_CLASS`] for
/// anything not in the table.
pub fn lookup_antibiotic_class(antibiotic: &str) -> &'static str {
    match antibiotic {
        "unknown aminocyclitol" | "spectinomycin" => "aminocyclitol",
        "unknown aminoglycoside" | "gentamicin" | "gentamicin c" | "tobramycin"
        | "streptomycin" | "amikacin" | "kanamycin" | "kanamycin a" | "neomycin"
        | "paromomycin" | "kasugamycin" | "g418" | "capreomycin" | "isepamicin"
        | "dibekacin" | "lividomycin" | "ribostamycin" | "butiromycin" | "butirosin"
        | "hygromycin" | "netilmicin" | "apramycin" | "sisomicin" | "arbekacin"
        | "astromicin" | "fortimicin" => "aminoglycoside",
        "unknown analog of d-alanine" | "d-cycloserine" => "analog of d-alanine",
        "unknown beta-lactam"
        | "amoxicillin"
        | "amoxicillin+clavulanic acid"
        | "ampicillin"
        | "ampicillin+clavulanic acid"
        | "aztreonam"
        | "cefazolin"
        | "cefepime"
        | "cefixime"
        | "cefotaxime"
        | "cefotaxime+clavulanic acid"
        | "cefoxitin"
        | "ceftaroline"
        | "ceftazidime"
        | "ceftazidime+avibactam"
        | "ceftriaxone"
        | "cefuroxime"
        | "cephalothin"
        | "ertapenem"
        | "imipenem"
        | "meropenem"
        | "penicillin"
        | "piperacillin"
        | "piperacillin+tazobactam"
        | "temocillin"
        | "ticarcillin"
        | "ticarcillin+clavulanic acid"
        | "cephalotin"
        | "piperacillin+clavulanic acid" => "beta-lactam",
        "unknown diarylquinoline" | "bedaquiline" => "diarylquinoline",
        "unknown quinolone" | "ciprofloxacin" | "nalidixic acid" | "fluoroquinolone" => {
            "quinolone"
        }
        "unknown folate pathway antagonist" | "sulfamethoxazole" | "trimethoprim" => {
            "folate pathway antagonist"
        }
        "unknown fosfomycin" | "fosfomycin" => "fosfomycin",
        "unknown glycopeptide" | "vancomycin" | "teicoplanin" | "bleomycin" => "glycopeptide",
        "unknown ionophores" | "narasin" | "salinomycin" | "maduramicin" => "ionophores",
        "unknown iminophenazine" | "clofazimine" => "iminophenazine",
        "unknown isonicotinic acid hydrazide" | "isoniazid" => "isonicotinic acid hydrazide",
        "unknown lincosamide" | "lincomycin" | "clindamycin" => "lincosamide",
        "unknown macrolide" | "carbomycin" | "azithromycin" | "oleandomycin" | "spiramycin"
        | "tylosin" | "telithromycin" | "erythromycin" => "macrolide",
        "unknown nitroimidazole" | "metronidazole" => "nitroimidazole",
        "unknown oxazolidinone" | "linezolid" => "oxazolidinone",
        "unknown amphenicol" | "chloramphenicol" | "florfenicol" => "amphenicol",
        "unknown pleuromutilin" | "tiamulin" => "pleuromutilin",
        "unknown polymyxin" | "colistin" => "polymyxin",
        "unknown pseudomonic acid" | "mupirocin" => "pseudomonic acid",
        "unknown rifamycin" | "rifampicin" => "rifamycin",
        "unknown salicylic acid - anti-folate" | "para-aminosalicyclic acid" => {
            "salicylic acid - anti-folate"
        }
        "unknown steroid antibacterial" | "fusidic acid" => "steroid antibacterial",
        "unknown streptogramin a"
        | "dalfopristin"
        | "pristinamycin iia"
        | "virginiamycin m"
        | "quinupristin+dalfopristin" => "streptogramin a",
        "unknown streptogramin b" | "quinupristin" | "pristinamycin ia" | "virginiamycin s" => {
            "streptogramin b"
        }
        "unknown synthetic derivative of nicotinamide" | "pyrazinamide" => {
            "synthetic derivative of nicotinamide"
        }
        "unknown tetracycline" | "tetracycline" | "doxycycline" | "minocycline"
        | "tigecycline" => "tetracycline",
        "unknown thioamide" | "ethionamide" => "thioamide",
        "unknown unspecified" | "ethambutol" => "unspecified",
        "cephalosporins" | "carbapenem" | "norfloxacin" | "ceftiofur" => "under_development",
        _ => UNKNOWN_CLASS,
    }
}

/// Determines the stress subtype of an element from the phenotypes it was
/// reported with.
///
/// Only [`ElementType::Stress`] elements have a stress subtype. If the
/// phenotypes match keywords of more than one subtype, the subtype that comes
/// last in [`STRESS_FACTORS`] wins.
pub fn assign_stress_subtype<S>(
    phenotypes: &[S],
    element_type: ElementType,
) -> Option<StressSubtype>
where
    S: AsRef<str>,
{
    if element_type != ElementType::Stress {
        return None;
    }

    let reported: HashSet<&str> = phenotypes.iter().map(|p| p.as_ref()).collect();

    let mut assigned = None;
    for (subtype, factors) in STRESS_FACTORS.iter() {
        if factors.iter().any(|factor| reported.contains(factor)) {
            assigned = Some(*subtype);
        }
    }

    assigned
}

/// Determines the subtype attached to a resistance gene: `AMR` for AMR
/// elements, the stress subtype for stress elements.
pub fn assign_element_subtype<S>(
    phenotypes: &[S],
    element_type: ElementType,
) -> Option<ElementSubtype>
where
    S: AsRef<str>,
{
    match element_type {
        ElementType::Amr => Some(ElementSubtype::Amr),
        ElementType::Stress => {
            assign_stress_subtype(phenotypes, element_type).map(ElementSubtype::from)
        }
        other => {
            warn!("Don't know how to assign a subtype for {}", other);
            None
        }
    }
}

//! Envelopes that pair a result payload with the software that produced it.
//!
//! Downstream consumers only ever see [`MethodIndex`] and [`QcMethodIndex`].
//! Both are tagged by software, and every variant fixes the payload type that
//! software produces, so a `shigapass` envelope can only ever carry a
//! [`TypingResultShiga`]. The `type` of a typing envelope is a tag type that
//! only admits the methods the software implements (ShigaPass is always
//! `shigatype`, SerotypeFinder is `O_type` or `H_type`).

use serde::Deserialize;
use serde::Serialize;

use super::phenotype::ElementType;
use super::phenotype::ElementTypeResult;
use super::phenotype::PredictionSoftware;
use super::qc::PostAlignQcResult;
use super::qc::QcSoftware;
use super::qc::QuastQcResult;
use super::typing::TypingMethod;
use super::typing::TypingResultCgMlst;
use super::typing::TypingResultGeneAllele;
use super::typing::TypingResultLineage;
use super::typing::TypingResultMlst;
use super::typing::TypingResultShiga;
use super::typing::TypingSoftware;

/// The `type` half of a [`MethodIndex`]: either a resistance category or a
/// typing method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodType {
    /// A resistance category.
    Element(ElementType),

    /// A typing method.
    Typing(TypingMethod),
}

/// The software half of a [`MethodIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodSoftware {
    /// A resistance predictor.
    Prediction(PredictionSoftware),

    /// A typing tool.
    Typing(TypingSoftware),
}

//=============//
// Method tags //
//=============//

// Each typing software implements a fixed set of methods. The tags below
// restrict the `type` of an envelope to that set, so a mismatched pairing
// fails to deserialize and cannot be constructed.

/// The method of a ShigaPass result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShigatypeMethod {
    /// Shigella serotyping.
    #[default]
    #[serde(rename = "shigatype")]
    Shigatype,
}

/// The method of an `mlst` result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MlstMethod {
    /// Multi-locus sequence typing.
    #[default]
    #[serde(rename = "mlst")]
    Mlst,
}

/// The method of a chewBBACA result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CgmlstMethod {
    /// Core-genome MLST.
    #[default]
    #[serde(rename = "cgmlst")]
    Cgmlst,
}

/// The method of a TB-Profiler or Mykrobe result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineageMethod {
    /// Lineage assignment.
    #[default]
    #[serde(rename = "lineage")]
    Lineage,
}

/// The method of a VirulenceFinder typing result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StxMethod {
    /// Shiga toxin typing.
    #[default]
    #[serde(rename = "stx")]
    Stx,
}

/// The methods of a SerotypeFinder result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerotypeMethod {
    /// O antigen typing.
    #[serde(rename = "O_type")]
    OType,

    /// H antigen typing.
    #[serde(rename = "H_type")]
    HType,
}

impl From<ShigatypeMethod> for TypingMethod {
    fn from(_: ShigatypeMethod) -> Self {
        TypingMethod::Shigatype
    }
}

impl From<MlstMethod> for TypingMethod {
    fn from(_: MlstMethod) -> Self {
        TypingMethod::Mlst
    }
}

impl From<CgmlstMethod> for TypingMethod {
    fn from(_: CgmlstMethod) -> Self {
        TypingMethod::Cgmlst
    }
}

impl From<LineageMethod> for TypingMethod {
    fn from(_: LineageMethod) -> Self {
        TypingMethod::Lineage
    }
}

impl From<StxMethod> for TypingMethod {
    fn from(_: StxMethod) -> Self {
        TypingMethod::Stx
    }
}

impl From<SerotypeMethod> for TypingMethod {
    fn from(method: SerotypeMethod) -> Self {
        match method {
            SerotypeMethod::OType => TypingMethod::OType,
            SerotypeMethod::HType => TypingMethod::HType,
        }
    }
}

//===========//
// Envelopes //
//===========//

/// A result produced by one software for one category or typing method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "software", rename_all = "lowercase")]
pub enum MethodIndex {
    /// Resistance predicted by ResFinder.
    Resfinder {
        /// The category the result was restricted to.
        #[serde(rename = "type")]
        category: ElementType,

        /// The prediction.
        result: ElementTypeResult,
    },

    /// Serotype predicted by ShigaPass.
    Shigapass {
        /// The typing method.
        #[serde(rename = "type")]
        method: ShigatypeMethod,

        /// The prediction.
        result: TypingResultShiga,
    },

    /// Sequence type called by `mlst`.
    Mlst {
        /// The typing method.
        #[serde(rename = "type")]
        method: MlstMethod,

        /// The call.
        result: TypingResultMlst,
    },

    /// Core-genome alleles called by chewBBACA.
    Chewbbaca {
        /// The typing method.
        #[serde(rename = "type")]
        method: CgmlstMethod,

        /// The calls.
        result: TypingResultCgMlst,
    },

    /// Lineage called by TB-Profiler.
    Tbprofiler {
        /// The typing method.
        #[serde(rename = "type")]
        method: LineageMethod,

        /// The call.
        result: TypingResultLineage,
    },

    /// Lineage called by Mykrobe.
    Mykrobe {
        /// The typing method.
        #[serde(rename = "type")]
        method: LineageMethod,

        /// The call.
        result: TypingResultLineage,
    },

    /// Shiga toxin gene allele found by VirulenceFinder.
    Virulencefinder {
        /// The typing method.
        #[serde(rename = "type")]
        method: StxMethod,

        /// The allele.
        result: TypingResultGeneAllele,
    },

    /// O or H antigen gene allele found by SerotypeFinder.
    Serotypefinder {
        /// Which antigen was typed.
        #[serde(rename = "type")]
        method: SerotypeMethod,

        /// The allele.
        result: TypingResultGeneAllele,
    },
}

impl MethodIndex {
    /// Wraps a ResFinder prediction for the given category.
    pub fn resfinder(category: ElementType, result: ElementTypeResult) -> Self {
        MethodIndex::Resfinder { category, result }
    }

    /// Wraps a ShigaPass prediction.
    pub fn shigapass(result: TypingResultShiga) -> Self {
        MethodIndex::Shigapass {
            method: ShigatypeMethod::Shigatype,
            result,
        }
    }

    /// Wraps an MLST call.
    pub fn mlst(result: TypingResultMlst) -> Self {
        MethodIndex::Mlst {
            method: MlstMethod::Mlst,
            result,
        }
    }

    /// Wraps chewBBACA cgMLST calls.
    pub fn chewbbaca(result: TypingResultCgMlst) -> Self {
        MethodIndex::Chewbbaca {
            method: CgmlstMethod::Cgmlst,
            result,
        }
    }

    /// Wraps a TB-Profiler lineage call.
    pub fn tbprofiler(result: TypingResultLineage) -> Self {
        MethodIndex::Tbprofiler {
            method: LineageMethod::Lineage,
            result,
        }
    }

    /// Wraps a Mykrobe lineage call.
    pub fn mykrobe(result: TypingResultLineage) -> Self {
        MethodIndex::Mykrobe {
            method: LineageMethod::Lineage,
            result,
        }
    }

    /// Wraps a Shiga toxin allele found by VirulenceFinder.
    pub fn virulencefinder(result: TypingResultGeneAllele) -> Self {
        MethodIndex::Virulencefinder {
            method: StxMethod::Stx,
            result,
        }
    }

    /// Wraps an antigen allele found by SerotypeFinder.
    pub fn serotypefinder(method: SerotypeMethod, result: TypingResultGeneAllele) -> Self {
        MethodIndex::Serotypefinder { method, result }
    }

    /// The category or typing method of this result.
    pub fn method_type(&self) -> MethodType {
        match self {
            MethodIndex::Resfinder { category, .. } => MethodType::Element(*category),
            MethodIndex::Shigapass { method, .. } => MethodType::Typing((*method).into()),
            MethodIndex::Mlst { method, .. } => MethodType::Typing((*method).into()),
            MethodIndex::Chewbbaca { method, .. } => MethodType::Typing((*method).into()),
            MethodIndex::Tbprofiler { method, .. } | MethodIndex::Mykrobe { method, .. } => {
                MethodType::Typing((*method).into())
            }
            MethodIndex::Virulencefinder { method, .. } => MethodType::Typing((*method).into()),
            MethodIndex::Serotypefinder { method, .. } => MethodType::Typing((*method).into()),
        }
    }

    /// The software that produced this result.
    pub fn software(&self) -> MethodSoftware {
        let software = match self {
            MethodIndex::Resfinder { .. } => {
                return MethodSoftware::Prediction(PredictionSoftware::Resfinder)
            }
            MethodIndex::Shigapass { .. } => TypingSoftware::Shigapass,
            MethodIndex::Mlst { .. } => TypingSoftware::Mlst,
            MethodIndex::Chewbbaca { .. } => TypingSoftware::Chewbbaca,
            MethodIndex::Tbprofiler { .. } => TypingSoftware::Tbprofiler,
            MethodIndex::Mykrobe { .. } => TypingSoftware::Mykrobe,
            MethodIndex::Virulencefinder { .. } => TypingSoftware::Virulencefinder,
            MethodIndex::Serotypefinder { .. } => TypingSoftware::Serotypefinder,
        };

        MethodSoftware::Typing(software)
    }
}

/// A QC result tagged with the software that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "software", content = "result", rename_all = "lowercase")]
pub enum QcMethodIndex {
    /// Assembly statistics from QUAST.
    Quast(QuastQcResult),

    /// Alignment statistics.
    Postalignqc(PostAlignQcResult),
}

impl QcMethodIndex {
    /// The software that produced this result.
    pub fn software(&self) -> QcSoftware {
        match self {
            QcMethodIndex::Quast(_) => QcSoftware::Quast,
            QcMethodIndex::Postalignqc(_) => QcSoftware::Postalignqc,
        }
    }
}

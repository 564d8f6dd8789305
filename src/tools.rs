//! BioTools: small lab calculators.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Result of a DNA sequence analysis.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DnaAnalysis {
    /// Number of A/T/C/G bases after cleaning
    pub length: usize,
    /// GC content in percent, rounded to two decimals
    pub gc_percent: f64,
}

/// Count bases and GC content, ignoring anything that is not A, T, C or G.
pub fn analyze_dna(sequence: &str) -> DnaAnalysis {
    let mut length = 0usize;
    let mut gc = 0usize;
    for base in sequence.chars().map(|c| c.to_ascii_uppercase()) {
        match base {
            'G' | 'C' => {
                length += 1;
                gc += 1;
            }
            'A' | 'T' => length += 1,
            _ => {}
        }
    }

    let gc_percent = if length == 0 {
        0.0
    } else {
        (gc as f64 / length as f64 * 10_000.0).round() / 100.0
    };

    DnaAnalysis { length, gc_percent }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Mm,
    Um,
    Nm,
}

impl LengthUnit {
    fn nanometres(&self) -> f64 {
        match self {
            LengthUnit::Mm => 1_000_000.0,
            LengthUnit::Um => 1_000.0,
            LengthUnit::Nm => 1.0,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Um => "µm",
            LengthUnit::Nm => "nm",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "mm" => Ok(LengthUnit::Mm),
            "um" | "µm" => Ok(LengthUnit::Um),
            "nm" => Ok(LengthUnit::Nm),
            other => Err(AppError::Validation(format!("Unknown unit: {}", other))),
        }
    }

    /// The two other units, in the order the converter displays them.
    fn targets(&self) -> [LengthUnit; 2] {
        match self {
            LengthUnit::Mm => [LengthUnit::Um, LengthUnit::Nm],
            LengthUnit::Um => [LengthUnit::Mm, LengthUnit::Nm],
            LengthUnit::Nm => [LengthUnit::Um, LengthUnit::Mm],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: LengthUnit,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Conversion {
    pub results: Vec<Measurement>,
    /// e.g. `"0.5 mm / 500000 nm"`
    pub summary: String,
}

/// Convert a micro-scale length into the two other supported units.
pub fn convert_units(value: f64, from: LengthUnit) -> Conversion {
    let nm = value * from.nanometres();
    let results: Vec<Measurement> = from
        .targets()
        .into_iter()
        .map(|unit| Measurement {
            value: nm / unit.nanometres(),
            unit,
        })
        .collect();

    let summary = results
        .iter()
        .map(|m| format!("{} {}", m.value, m.unit.symbol()))
        .collect::<Vec<_>>()
        .join(" / ");

    Conversion { results, summary }
}

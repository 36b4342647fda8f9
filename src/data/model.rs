use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Measurement – one of the four continuous columns
// ---------------------------------------------------------------------------

/// The continuous measurement columns of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Measurement {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
}

impl Measurement {
    pub const ALL: [Measurement; 4] = [
        Measurement::SepalLength,
        Measurement::SepalWidth,
        Measurement::PetalLength,
        Measurement::PetalWidth,
    ];

    /// Column name as it appears in the source CSV header.
    pub fn column(self) -> &'static str {
        match self {
            Measurement::SepalLength => "sepal_length",
            Measurement::SepalWidth => "sepal_width",
            Measurement::PetalLength => "petal_length",
            Measurement::PetalWidth => "petal_width",
        }
    }

    /// Human-readable axis title.
    pub fn title(self) -> &'static str {
        match self {
            Measurement::SepalLength => "Sepal Length",
            Measurement::SepalWidth => "Sepal Width",
            Measurement::PetalLength => "Petal Length",
            Measurement::PetalWidth => "Petal Width",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.column() == name)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single table cell
// ---------------------------------------------------------------------------

/// A table cell: either a measurement or the species label.
/// Must be `Ord` so table rows can be sorted on any column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        match (self, other) {
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            // numbers sort before text
            (Number(_), Text(_)) => std::cmp::Ordering::Less,
            (Text(_), Number(_)) => std::cmp::Ordering::Greater,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the dataset
// ---------------------------------------------------------------------------

/// One iris flower. Field order follows the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
    pub species: String,
}

impl Record {
    /// Column names in CSV order, the species label last.
    pub const COLUMNS: [&'static str; 5] = [
        "sepal_length",
        "sepal_width",
        "petal_length",
        "petal_width",
        "species",
    ];

    pub fn measurement(&self, m: Measurement) -> f64 {
        match m {
            Measurement::SepalLength => self.sepal_length,
            Measurement::SepalWidth => self.sepal_width,
            Measurement::PetalLength => self.petal_length,
            Measurement::PetalWidth => self.petal_width,
        }
    }

    /// Look up a cell by column name.
    pub fn cell(&self, column: &str) -> Option<CellValue> {
        if column == "species" {
            return Some(CellValue::Text(self.species.clone()));
        }
        Measurement::from_column(column).map(|m| CellValue::Number(self.measurement(m)))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full dataset. Built once at startup and only ever borrowed afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    /// Distinct species in order of first appearance.
    categories: Vec<String>,
}

impl Dataset {
    /// Build the category index from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut categories = Vec::new();
        for rec in &records {
            if seen.insert(rec.species.as_str()) {
                categories.push(rec.species.clone());
            }
        }
        Dataset { records, categories }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Distinct species in order of first appearance.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Values of one measurement for the records of a single species.
    pub fn values_for(&self, species: &str, m: Measurement) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| r.species == species)
            .map(|r| r.measurement(m))
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

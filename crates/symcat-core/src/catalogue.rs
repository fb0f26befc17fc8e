//! Fixed taxonomy tables for the control-description symbol catalogue.

use std::fmt;

/// Top-level taxonomy bucket a reference number falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    C,
    D,
    E,
    F,
    G,
    /// Reserved column; mapped but carries no label and is never exported.
    H,
    Unknown,
}

impl Column {
    /// Columns written to the manifest, in catalogue order.
    pub const RETAINED: [Column; 5] = [Column::C, Column::D, Column::E, Column::F, Column::G];

    /// Map the major part of a reference number to its column.
    pub fn from_major(major: i64) -> Self {
        match major {
            0 => Column::C,
            1..=7 => Column::D,
            8 => Column::E,
            9..=11 => Column::F,
            12 => Column::G,
            13 => Column::H,
            _ => Column::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::C => "Column C",
            Column::D => "Column D",
            Column::E => "Column E",
            Column::F => "Column F",
            Column::G => "Column G",
            Column::H => "Column H",
            Column::Unknown => "Unknown",
        }
    }

    /// Fixed subtype label for single-label columns.
    ///
    /// Column D is resolved through [`CHECKLIST`] instead and returns `None`
    /// here, as do H and Unknown.
    pub fn fixed_subtype(self) -> Option<&'static str> {
        match self {
            Column::C => Some("Clarification"),
            Column::E => Some("Appearance"),
            Column::F => Some("Dimensions"),
            Column::G => Some("Location"),
            Column::D | Column::H | Column::Unknown => None,
        }
    }

    pub fn is_retained(self) -> bool {
        Self::RETAINED.contains(&self)
    }

    /// Reverse of [`Column::label`], used when reading manifests back.
    pub fn from_label(label: &str) -> Option<Self> {
        [
            Column::C,
            Column::D,
            Column::E,
            Column::F,
            Column::G,
            Column::H,
            Column::Unknown,
        ]
        .into_iter()
        .find(|c| c.label() == label)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Column D checklist: category label and its allowed reference numbers.
///
/// Values are literal two-decimal numbers, not ranges: `1.10` and `1.1` are
/// the same number once rounded, which is how the lookup compares them.
/// Category order decides ties.
pub static CHECKLIST: &[(&str, &[f64])] = &[
    (
        "Landforms",
        &[
            1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 1.10, 1.11, 1.12, 1.13, 1.14, 1.15, 1.16,
        ],
    ),
    ("Rock and Boulders", &[2.1, 2.2, 2.3, 2.4, 2.5, 2.6]),
    (
        "Water Features",
        &[3.1, 3.2, 3.3, 3.4, 3.5, 3.6, 3.7, 3.8, 3.9, 3.10, 3.11],
    ),
    (
        "Vegetation",
        &[4.1, 4.2, 4.3, 4.4, 4.5, 4.6, 4.7, 4.8, 4.9, 4.10],
    ),
    (
        "Man-made Features",
        &[
            5.1, 5.2, 5.3, 5.4, 5.5, 5.6, 5.7, 5.8, 5.9, 5.10, 5.11, 5.12, 5.13, 5.14, 5.15, 5.16,
            5.17, 5.18, 5.19, 5.20, 5.21, 5.22, 5.23, 5.24,
        ],
    ),
    ("Prominent / Special", &[6.1, 6.2]),
];

/// Round to two decimal places and return the value in hundredths.
pub(crate) fn hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// First checklist category containing `value` (after rounding), if any.
pub fn checklist_category(value: f64) -> Option<&'static str> {
    let target = hundredths(value);
    CHECKLIST
        .iter()
        .find(|(_, refs)| refs.iter().any(|r| hundredths(*r) == target))
        .map(|(label, _)| *label)
}

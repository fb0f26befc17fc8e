use crate::catalogue::{Column, checklist_category};

/// Column and subtype resolved for one reference number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub column: Column,
    /// Checklist category for Column D, fixed label for C/E/F/G, else `""`.
    pub subtype: &'static str,
}

impl Classification {
    const UNKNOWN: Self = Self {
        column: Column::Unknown,
        subtype: "",
    };
}

/// Classify a dotted reference number such as `"3.4"`.
///
/// Malformed input never fails: a non-numeric major part yields
/// `Unknown` with an empty subtype.
pub fn classify(reference: &str) -> Classification {
    let major_part = reference.split('.').next().unwrap_or_default();
    let major = match major_part.trim().parse::<i64>() {
        Ok(major) => major,
        Err(_) => return Classification::UNKNOWN,
    };

    let column = Column::from_major(major);
    let subtype = match column {
        Column::D => reference
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(checklist_category)
            .unwrap_or(""),
        other => other.fixed_subtype().unwrap_or(""),
    };

    Classification { column, subtype }
}

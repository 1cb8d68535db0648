//! Value normalization rules for death records
//!
//! Spreadsheet exports mix integers, floats and text for the same code
//! columns. These helpers bring every value into the shape the joins and
//! charts expect.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Short Spanish month labels, January first
pub const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Zero-pad a code to `width`, dropping any fractional part
///
/// `"5001.0"` becomes `"05001"` for width 5. Blank input yields `None`.
pub fn zero_pad(raw: &str, width: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let integral = trimmed.split('.').next().unwrap_or(trimmed);
    Some(format!("{:0>width$}", integral, width = width))
}

/// Map the numeric sex code to its label; unknown codes pass through
///
/// A float-formatted code such as `"1.0"` counts as its integer.
pub fn sex_label(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let code = match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => {
            format!("{}", value as i64)
        }
        _ => trimmed.to_string(),
    };
    match code.as_str() {
        "" => None,
        "1" => Some("Hombre".to_string()),
        "2" => Some("Mujer".to_string()),
        _ => Some(code),
    }
}

/// Normalize a CIE-10 code: trimmed and upper-cased
pub fn cause_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Parse a numeric month, clamping into 1..=12
pub fn month_number(raw: &str) -> Option<u32> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(1.0, 12.0) as u32)
}

/// Month of a date or date-time string
pub fn month_from_date(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"];
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.month());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.month());
        }
    }
    None
}

/// Label for a month number (1 = "Ene")
pub fn month_label(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_LABELS.get(index).copied()
}

/// Coarse age cohorts derived from the DANE `GRUPO_EDAD1` code
///
/// Variants are declared in chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeCohort {
    Neonatal,
    Infant,
    EarlyChildhood,
    Childhood,
    Adolescence,
    Youth,
    EarlyAdulthood,
    MiddleAdulthood,
    OldAge,
    Longevity,
    Unknown,
}

impl AgeCohort {
    /// All cohorts in chart order
    pub const ALL: [AgeCohort; 11] = [
        AgeCohort::Neonatal,
        AgeCohort::Infant,
        AgeCohort::EarlyChildhood,
        AgeCohort::Childhood,
        AgeCohort::Adolescence,
        AgeCohort::Youth,
        AgeCohort::EarlyAdulthood,
        AgeCohort::MiddleAdulthood,
        AgeCohort::OldAge,
        AgeCohort::Longevity,
        AgeCohort::Unknown,
    ];

    /// Classify an integer age-group code
    pub fn from_code(code: i64) -> Self {
        match code {
            0..=4 => AgeCohort::Neonatal,
            5..=6 => AgeCohort::Infant,
            7..=8 => AgeCohort::EarlyChildhood,
            9..=10 => AgeCohort::Childhood,
            11 => AgeCohort::Adolescence,
            12..=13 => AgeCohort::Youth,
            14..=16 => AgeCohort::EarlyAdulthood,
            17..=19 => AgeCohort::MiddleAdulthood,
            20..=24 => AgeCohort::OldAge,
            25..=28 => AgeCohort::Longevity,
            _ => AgeCohort::Unknown,
        }
    }

    /// Classify a raw spreadsheet value; anything non-integral is unknown
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return AgeCohort::Unknown;
        };
        if let Ok(code) = raw.parse::<i64>() {
            return Self::from_code(code);
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value.fract() == 0.0 => Self::from_code(value as i64),
            _ => AgeCohort::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeCohort::Neonatal => "Mortalidad neonatal",
            AgeCohort::Infant => "Mortalidad infantil",
            AgeCohort::EarlyChildhood => "Primera infancia",
            AgeCohort::Childhood => "Niñez",
            AgeCohort::Adolescence => "Adolescencia",
            AgeCohort::Youth => "Juventud",
            AgeCohort::EarlyAdulthood => "Adultez temprana",
            AgeCohort::MiddleAdulthood => "Adultez intermedia",
            AgeCohort::OldAge => "Vejez",
            AgeCohort::Longevity => "Longevidad / Centenarios",
            AgeCohort::Unknown => "Edad desconocida",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Labels of all cohorts in chart order
    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|c| c.label().to_string()).collect()
    }
}

impl fmt::Display for AgeCohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

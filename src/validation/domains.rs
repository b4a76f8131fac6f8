//! Enumerated domains for the categorical request fields

pub const CUT_VALUES: &[&str] = &["Fair", "Good", "Ideal", "Signature-Ideal", "Very Good"];
pub const COLOR_VALUES: &[&str] = &["D", "E", "F", "G", "H", "I"];
pub const CLARITY_VALUES: &[&str] = &["FL", "IF", "SI1", "VS1", "VS2", "VVS1", "VVS2"];
pub const POLISH_VALUES: &[&str] = &["EX", "G", "ID", "VG"];
pub const SYMMETRY_VALUES: &[&str] = &["EX", "G", "ID", "VG"];
pub const REPORT_VALUES: &[&str] = &["AGSL", "GIA"];

/// Closed interval accepted for `Carat Weight`
pub const CARAT_WEIGHT_RANGE: (f64, f64) = (0.75, 3.0);

pub const CATEGORICAL_DOMAINS: [(&str, &[&str]); 6] = [
    ("Cut", CUT_VALUES),
    ("Color", COLOR_VALUES),
    ("Clarity", CLARITY_VALUES),
    ("Polish", POLISH_VALUES),
    ("Symmetry", SYMMETRY_VALUES),
    ("Report", REPORT_VALUES),
];

/// Allowed values for a categorical field, `None` if the field is not categorical
pub fn allowed_values(field: &str) -> Option<&'static [&'static str]> {
    CATEGORICAL_DOMAINS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, values)| *values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(allowed_values("Report"), Some(REPORT_VALUES));
        assert!(allowed_values("Carat Weight").is_none());
    }
}

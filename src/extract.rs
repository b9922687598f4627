//! Field extraction — turns "label : value" message lines into a record.
//!
//! A `FieldSpec` is an ordered list of compiled pattern rules. Extraction
//! scans the message line by line; the first line matching a field's
//! pattern sets that field, later matches never overwrite. Fields with no
//! matching line hold the `MISSING` sentinel, so every record is total.
//! Extraction never fails and has no side effects.

use regex::Regex;

use crate::error::ConfigError;

/// Sentinel value for a field whose pattern matched no line.
pub const MISSING: &str = "MISSING";

/// A single named extraction rule with a compiled regex.
///
/// The pattern is a "label : value" matcher: label words tolerate
/// internal whitespace, a colon separates label from value, and the
/// value is the remainder of the line (capture group 1).
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    regex: Regex,
}

impl FieldRule {
    /// Rule whose label is the field name itself.
    pub fn label(name: &str) -> Result<Self, ConfigError> {
        Self::with_label(name, name)
    }

    /// Rule with a label distinct from the field name.
    pub fn with_label(name: &str, label: &str) -> Result<Self, ConfigError> {
        let pattern = format!("(?i){}\\s*:\\s*(.+)", label_body(label));
        Self::compile(name, &pattern)
    }

    /// Price-style rule: the label may carry an optional parenthetical
    /// abbreviation before the colon, e.g. "Last Purchase Price (PP) : 8000".
    pub fn price(name: &str, label: &str, abbrev: &str) -> Result<Self, ConfigError> {
        let pattern = format!(
            "(?i){}\\s*(?:\\(.*{}.*\\))?\\s*:\\s*(.+)",
            label_body(label),
            regex::escape(abbrev),
        );
        Self::compile(name, &pattern)
    }

    fn compile(name: &str, pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            field: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Match the rule against one line, returning the trimmed value.
    fn capture<'t>(&self, line: &'t str) -> Option<&'t str> {
        self.regex
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
    }
}

/// Label words joined so that internal whitespace is tolerated
/// ("Customer Name" matches "Customer  Name" and "CustomerName").
fn label_body(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("\\s*")
}

/// Ordered extraction schema. Field names and their order are fixed at
/// construction; all extraction calls in a run see the same schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    rules: Vec<FieldRule>,
}

impl FieldSpec {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// The standard sales enquiry schema (11 fields). Three price fields
    /// carry a parenthesized abbreviation in their label.
    pub fn sales_default() -> Self {
        let rules = vec![
            FieldRule::label("Branch").unwrap(),
            FieldRule::label("Salesperson").unwrap(),
            FieldRule::label("Customer Name").unwrap(),
            FieldRule::label("Product Description").unwrap(),
            FieldRule::label("Exchange").unwrap(),
            FieldRule::label("MRP").unwrap(),
            FieldRule::label("DP").unwrap(),
            FieldRule::price("Last Purchase Price (PP)", "Last Purchase Price", "PP").unwrap(),
            FieldRule::price("Negotiated Price (NP)", "Negotiated Price", "NP").unwrap(),
            FieldRule::label("SRP Price").unwrap(),
            FieldRule::price("Selling Price (SP)", "Selling Price", "SP").unwrap(),
        ];
        Self { rules }
    }

    /// Field names in output column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(FieldRule::name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Extract all fields from a multi-line message.
    ///
    /// First match wins: lines are scanned in original order and a field
    /// set by an earlier line is never overwritten by a later one.
    pub fn extract(&self, text: &str) -> ExtractedRecord {
        let mut values: Vec<Option<String>> = vec![None; self.rules.len()];

        for line in text.lines() {
            for (i, rule) in self.rules.iter().enumerate() {
                if values[i].is_some() {
                    continue;
                }
                if let Some(value) = rule.capture(line) {
                    values[i] = Some(value.to_string());
                }
            }
        }

        let fields = self
            .rules
            .iter()
            .zip(values)
            .map(|(rule, value)| {
                (
                    rule.name().to_string(),
                    value.unwrap_or_else(|| MISSING.to_string()),
                )
            })
            .collect();

        ExtractedRecord { fields }
    }
}

/// Result of one extraction — every field of the spec is present, in
/// spec order, with `MISSING` standing in for absent data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    fields: Vec<(String, String)>,
}

impl ExtractedRecord {
    /// Value for a field by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Values in spec field order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }

    /// Consume the record into an ordered value row.
    pub fn into_values(self) -> Vec<String> {
        self.fields.into_iter().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_spec() -> FieldSpec {
        FieldSpec::new(vec![
            FieldRule::label("Branch").unwrap(),
            FieldRule::label("Salesperson").unwrap(),
            FieldRule::label("Item Group").unwrap(),
            FieldRule::label("MRP").unwrap(),
        ])
    }

    #[test]
    fn all_missing_when_nothing_matches() {
        let spec = small_spec();
        let record = spec.extract("hello there\njust chatting\nno labels here");
        assert!(record.values().all(|v| v == MISSING));
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn extracts_trimmed_value() {
        let spec = small_spec();
        let record = spec.extract("Branch :   East  ");
        assert_eq!(record.get("Branch"), Some("East"));
    }

    #[test]
    fn first_match_wins() {
        let spec = small_spec();
        let record = spec.extract("Branch : East\nBranch : West");
        assert_eq!(record.get("Branch"), Some("East"));
    }

    #[test]
    fn case_insensitive_labels() {
        let spec = small_spec();
        let record = spec.extract("bRaNcH : North");
        assert_eq!(record.get("Branch"), Some("North"));
    }

    #[test]
    fn label_tolerates_internal_whitespace() {
        let spec = FieldSpec::new(vec![FieldRule::label("Customer Name").unwrap()]);
        assert_eq!(
            spec.extract("Customer   Name : Asha").get("Customer Name"),
            Some("Asha")
        );
        assert_eq!(
            spec.extract("CustomerName : Asha").get("Customer Name"),
            Some("Asha")
        );
    }

    #[test]
    fn price_rule_matches_parenthetical_abbrev() {
        let rule = FieldRule::price("Last Purchase Price (PP)", "Last Purchase Price", "PP")
            .unwrap();
        let spec = FieldSpec::new(vec![rule]);
        let record = spec.extract("Last Purchase Price (PP) : 8000");
        assert_eq!(record.get("Last Purchase Price (PP)"), Some("8000"));
    }

    #[test]
    fn price_rule_tolerates_noise_in_parens() {
        let rule = FieldRule::price("Negotiated Price (NP)", "Negotiated Price", "NP").unwrap();
        let spec = FieldSpec::new(vec![rule]);
        let record = spec.extract("Negotiated Price (final NP offer) : 8500");
        assert_eq!(record.get("Negotiated Price (NP)"), Some("8500"));
    }

    #[test]
    fn price_rule_parenthetical_is_optional() {
        let rule = FieldRule::price("Selling Price (SP)", "Selling Price", "SP").unwrap();
        let spec = FieldSpec::new(vec![rule]);
        let record = spec.extract("Selling Price : 9000");
        assert_eq!(record.get("Selling Price (SP)"), Some("9000"));
    }

    #[test]
    fn unrelated_lines_are_skipped() {
        let spec = small_spec();
        let record = spec.extract("greetings\nMRP : 9999\ntrailing chatter");
        assert_eq!(record.get("MRP"), Some("9999"));
        assert_eq!(record.get("Branch"), Some(MISSING));
    }

    #[test]
    fn fields_are_independent_per_line() {
        let spec = small_spec();
        let record = spec.extract("Branch : Pune\nSalesperson : Dev\nMRP : 1200");
        assert_eq!(record.get("Branch"), Some("Pune"));
        assert_eq!(record.get("Salesperson"), Some("Dev"));
        assert_eq!(record.get("Item Group"), Some(MISSING));
        assert_eq!(record.get("MRP"), Some("1200"));
    }

    #[test]
    fn values_follow_spec_order() {
        let spec = small_spec();
        let record = spec.extract("MRP : 50\nBranch : South");
        let values: Vec<&str> = record.values().collect();
        assert_eq!(values, vec!["South", MISSING, MISSING, "50"]);
    }

    #[test]
    fn sales_default_field_order() {
        let spec = FieldSpec::sales_default();
        let names: Vec<&str> = spec.names().collect();
        assert_eq!(
            names,
            vec![
                "Branch",
                "Salesperson",
                "Customer Name",
                "Product Description",
                "Exchange",
                "MRP",
                "DP",
                "Last Purchase Price (PP)",
                "Negotiated Price (NP)",
                "SRP Price",
                "Selling Price (SP)",
            ]
        );
    }

    #[test]
    fn sales_default_extracts_enquiry() {
        let spec = FieldSpec::sales_default();
        let record = spec.extract(
            "Branch : Mumbai\nSalesperson : Raj\nProduct Description : Mobile Phone\nMRP : 9999",
        );
        assert_eq!(record.get("Branch"), Some("Mumbai"));
        assert_eq!(record.get("Salesperson"), Some("Raj"));
        assert_eq!(record.get("Product Description"), Some("Mobile Phone"));
        assert_eq!(record.get("MRP"), Some("9999"));
        assert_eq!(record.get("Exchange"), Some(MISSING));
        assert_eq!(record.get("SRP Price"), Some(MISSING));
    }

    #[test]
    fn enquiry_row_in_field_order() {
        let spec = small_spec();
        let record = spec.extract(
            "Branch : Mumbai\nSalesperson : Raj\nItem Group : Mobile Phone\nMRP : 9999",
        );
        assert_eq!(
            record.into_values(),
            vec!["Mumbai", "Raj", "Mobile Phone", "9999"]
        );
    }

    #[test]
    fn empty_text_yields_all_missing() {
        let spec = small_spec();
        let record = spec.extract("");
        assert!(record.values().all(|v| v == MISSING));
    }

    #[test]
    fn empty_value_after_colon_does_not_match() {
        // "(.+)" needs at least one character after the colon.
        let spec = small_spec();
        let record = spec.extract("Branch :");
        assert_eq!(record.get("Branch"), Some(MISSING));
    }
}

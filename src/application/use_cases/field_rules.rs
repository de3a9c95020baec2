// ============================================================
// FIELD RULES
// ============================================================
// Per-field validation as a tagged rule table, applied in
// field-declaration order

use crate::application::use_cases::language::{detect_language, identical_translation, Language};
use crate::domain::record::{Field, FieldMap, RawRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// One validation rule. One variant per rule kind keeps the rule set
/// exhaustively checkable instead of dispatching on field-name strings.
pub enum FieldRule {
    /// Value must be non-empty.
    Required,
    /// Maximum length in characters; blank values pass.
    MaxLen(usize),
    /// Character-class restriction; blank values pass. The label describes
    /// the allowed set for error messages.
    Matches(&'static Lazy<Regex>, &'static str),
    /// Enumerated membership; blank values pass.
    OneOf(&'static [&'static str]),
    /// Membership in the caller-supplied manufacturer list, falling back to
    /// the configured static allow-list when no dynamic list is available.
    KnownManufacturer,
    /// Pipe-separated URL list: each entry must be https and, when a host
    /// allow-list is configured, belong to an allow-listed host.
    SecureUrls,
}

/// Rules per field, in field-declaration order. Error ordering downstream
/// depends on this table's ordering, not on map iteration.
static RULE_TABLE: &[(Field, &[FieldRule])] = &[
    (
        Field::ReferenceCode,
        &[
            FieldRule::Required,
            FieldRule::MaxLen(50),
            FieldRule::Matches(&REFERENCE_RE, "letters, digits and hyphens"),
        ],
    ),
    (
        Field::Manufacturer,
        &[FieldRule::Required, FieldRule::KnownManufacturer],
    ),
    (
        Field::Slug,
        &[
            FieldRule::MaxLen(200),
            FieldRule::Matches(&SLUG_RE, "lowercase letters, digits and hyphens"),
        ],
    ),
    (
        Field::CategoryId,
        &[
            FieldRule::Required,
            FieldRule::Matches(&SLUG_RE, "lowercase letters, digits and hyphens"),
        ],
    ),
    (
        Field::Status,
        &[
            FieldRule::Required,
            FieldRule::OneOf(&["active", "inactive", "draft"]),
        ],
    ),
    (Field::Featured, &[FieldRule::OneOf(&["true", "false"])]),
    (Field::NameFr, &[FieldRule::Required, FieldRule::MaxLen(200)]),
    (Field::NameEn, &[FieldRule::Required, FieldRule::MaxLen(200)]),
    (Field::DescriptionFr, &[FieldRule::MaxLen(2000)]),
    (Field::DescriptionEn, &[FieldRule::MaxLen(2000)]),
    (Field::TechSheetFr, &[FieldRule::MaxLen(2000)]),
    (Field::TechSheetEn, &[FieldRule::MaxLen(2000)]),
    (Field::ImageUrls, &[FieldRule::Required, FieldRule::SecureUrls]),
];

/// Thresholds for the duplicate-translation warning.
const DUPLICATE_NAME_MIN_LEN: usize = 5;
const DUPLICATE_DESCRIPTION_MIN_LEN: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Structured validation outcome. Errors appear in field-declaration order,
/// warnings in detection order; a verdict carrying any error is never used
/// for entity creation.
#[derive(Debug, Serialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<String>,
    pub data: Option<FieldMap>,
    /// True when the line did not even have enough fields to map.
    pub structural: bool,
}

/// Applies the rule table to one raw record.
pub struct FieldValidator {
    known_manufacturers: Vec<String>,
    fallback_manufacturers: Vec<String>,
    allowed_image_hosts: Vec<String>,
}

impl FieldValidator {
    pub fn new(
        known_manufacturers: Vec<String>,
        fallback_manufacturers: Vec<String>,
        allowed_image_hosts: Vec<String>,
    ) -> Self {
        Self {
            known_manufacturers,
            fallback_manufacturers,
            allowed_image_hosts,
        }
    }

    pub fn validate(&self, raw: &RawRecord) -> ValidationVerdict {
        // A short line fails as a whole; no per-field checks run
        let Some(map) = FieldMap::from_raw(raw) else {
            return ValidationVerdict {
                valid: false,
                errors: vec![FieldError {
                    field: "record",
                    message: format!(
                        "expected {} fields, got {}",
                        Field::EXPECTED_COUNT,
                        raw.field_count()
                    ),
                }],
                warnings: Vec::new(),
                data: None,
                structural: true,
            };
        };

        let mut errors = Vec::new();
        for (field, rules) in RULE_TABLE {
            let value = map.get(*field);
            for rule in *rules {
                self.apply_rule(rule, *field, value, &mut errors);
            }
        }

        let warnings = self.collect_warnings(&map);

        let valid = errors.is_empty();
        ValidationVerdict {
            valid,
            errors,
            warnings,
            data: valid.then_some(map),
            structural: false,
        }
    }

    fn apply_rule(&self, rule: &FieldRule, field: Field, value: &str, errors: &mut Vec<FieldError>) {
        let mut fail = |message: String| {
            errors.push(FieldError {
                field: field.name(),
                message,
            })
        };

        match rule {
            FieldRule::Required => {
                if value.is_empty() {
                    fail("is required".to_string());
                }
            }
            FieldRule::MaxLen(max) => {
                if !value.is_empty() && value.chars().count() > *max {
                    fail(format!("too long (max {} chars)", max));
                }
            }
            FieldRule::Matches(re, label) => {
                if !value.is_empty() && !re.is_match(value) {
                    fail(format!("contains invalid characters (allowed: {})", label));
                }
            }
            FieldRule::OneOf(allowed) => {
                if !value.is_empty() && !allowed.contains(&value) {
                    fail(format!(
                        "invalid value '{}' (expected one of: {})",
                        value,
                        allowed.join(", ")
                    ));
                }
            }
            FieldRule::KnownManufacturer => {
                if value.is_empty() {
                    return;
                }
                let list = if !self.known_manufacturers.is_empty() {
                    &self.known_manufacturers
                } else {
                    &self.fallback_manufacturers
                };
                if !list.is_empty() && !list.iter().any(|m| m == value) {
                    fail(format!(
                        "unknown manufacturer '{}' (available: {})",
                        value,
                        list.join(", ")
                    ));
                }
            }
            FieldRule::SecureUrls => {
                for entry in value.split('|').map(str::trim).filter(|e| !e.is_empty()) {
                    if let Some(message) = self.check_url(entry) {
                        fail(message);
                    }
                }
            }
        }
    }

    fn check_url(&self, entry: &str) -> Option<String> {
        if !entry.starts_with("https://") {
            return Some(format!("URL must use https: {}", entry));
        }
        let parsed = match Url::parse(entry) {
            Ok(u) => u,
            Err(e) => return Some(format!("URL does not parse ({}): {}", e, entry)),
        };
        if self.allowed_image_hosts.is_empty() {
            return None;
        }
        let host = parsed.host_str().unwrap_or("");
        let allowed = self
            .allowed_image_hosts
            .iter()
            .any(|h| host == h || host.ends_with(&format!(".{}", h)));
        if allowed {
            None
        } else {
            Some(format!("URL host '{}' is not allow-listed: {}", host, entry))
        }
    }

    fn collect_warnings(&self, map: &FieldMap) -> Vec<String> {
        let mut warnings = Vec::new();

        let name_fr = map.get(Field::NameFr);
        let name_en = map.get(Field::NameEn);

        if let Some(lang) = detect_language(name_fr) {
            if lang != Language::French {
                warnings.push(format!(
                    "French name appears to be in {}: \"{}\"",
                    lang.as_str(),
                    truncate(name_fr, 50)
                ));
            }
        }
        if let Some(lang) = detect_language(name_en) {
            if lang != Language::English {
                warnings.push(format!(
                    "English name appears to be in {}: \"{}\"",
                    lang.as_str(),
                    truncate(name_en, 50)
                ));
            }
        }

        if identical_translation(name_fr, name_en, DUPLICATE_NAME_MIN_LEN) {
            warnings.push(
                "French and English names are identical - possible missing translation".to_string(),
            );
        }
        if identical_translation(
            map.get(Field::DescriptionFr),
            map.get(Field::DescriptionEn),
            DUPLICATE_DESCRIPTION_MIN_LEN,
        ) {
            warnings.push(
                "French and English descriptions are identical - possible missing translation"
                    .to_string(),
            );
        }

        warnings
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_from(values: Vec<&str>) -> RawRecord {
        RawRecord {
            line_number: 2,
            fields: values.into_iter().map(String::from).collect(),
        }
    }

    fn valid_fields() -> Vec<&'static str> {
        vec![
            "ABC-1",
            "ACME Surgical",
            "",
            "ophthalmology-surgical",
            "active",
            "",
            "Pince à capsulorhexis",
            "Capsulorhexis forceps",
            "",
            "",
            "",
            "",
            "https://media.acme-surgical.com/abc-1.jpg",
        ]
    }

    fn validator() -> FieldValidator {
        FieldValidator::new(
            vec!["ACME Surgical".to_string()],
            Vec::new(),
            vec!["acme-surgical.com".to_string()],
        )
    }

    #[test]
    fn test_valid_record_passes() {
        let verdict = validator().validate(&raw_from(valid_fields()));
        assert!(verdict.valid, "unexpected errors: {:?}", verdict.errors);
        assert!(verdict.data.is_some());
    }

    #[test]
    fn test_short_record_fails_with_single_structural_error() {
        let verdict = validator().validate(&raw_from(vec!["ABC-1", "ACME Surgical"]));
        assert!(!verdict.valid);
        assert!(verdict.structural);
        assert_eq!(verdict.errors.len(), 1);
        assert!(verdict.errors[0].message.contains("expected 13 fields, got 2"));
    }

    #[test]
    fn test_errors_follow_field_declaration_order() {
        let mut fields = valid_fields();
        fields[0] = "BAD REF!";        // referenceCode: charset
        fields[4] = "archived";        // status: enum
        fields[12] = "http://media.acme-surgical.com/x.jpg"; // imageUrls: scheme
        let verdict = validator().validate(&raw_from(fields));
        assert!(!verdict.valid);
        let order: Vec<&str> = verdict.errors.iter().map(|e| e.field).collect();
        assert_eq!(order, vec!["referenceCode", "status", "imageUrls"]);
    }

    #[test]
    fn test_dynamic_manufacturer_list_overrides_fallback() {
        let v = FieldValidator::new(
            vec!["Other GmbH".to_string()],
            vec!["ACME Surgical".to_string()],
            Vec::new(),
        );
        let verdict = v.validate(&raw_from(valid_fields()));
        assert!(verdict
            .errors
            .iter()
            .any(|e| e.field == "manufacturer" && e.message.contains("unknown manufacturer")));
    }

    #[test]
    fn test_fallback_manufacturer_list_used_when_no_dynamic_list() {
        let v = FieldValidator::new(
            Vec::new(),
            vec!["ACME Surgical".to_string()],
            Vec::new(),
        );
        assert!(v.validate(&raw_from(valid_fields())).valid);
    }

    #[test]
    fn test_empty_lists_mean_presence_only() {
        let v = FieldValidator::new(Vec::new(), Vec::new(), Vec::new());
        assert!(v.validate(&raw_from(valid_fields())).valid);
    }

    #[test]
    fn test_host_allow_list_accepts_subdomains() {
        let mut fields = valid_fields();
        fields[12] = "https://cdn.acme-surgical.com/x.jpg";
        assert!(validator().validate(&raw_from(fields)).valid);
    }

    #[test]
    fn test_host_allow_list_rejects_other_hosts() {
        let mut fields = valid_fields();
        fields[12] = "https://evil.example.com/x.jpg";
        let verdict = validator().validate(&raw_from(fields));
        assert!(verdict
            .errors
            .iter()
            .any(|e| e.message.contains("not allow-listed")));
    }

    #[test]
    fn test_each_bad_url_in_list_reported() {
        let mut fields = valid_fields();
        fields[12] = "http://a.acme-surgical.com/x.jpg|https://evil.example.com/y.jpg";
        let verdict = validator().validate(&raw_from(fields));
        let url_errors = verdict
            .errors
            .iter()
            .filter(|e| e.field == "imageUrls")
            .count();
        assert_eq!(url_errors, 2);
    }

    #[test]
    fn test_identical_translations_warn_but_pass() {
        let mut fields = valid_fields();
        fields[6] = "Capsulorhexis forceps";
        fields[7] = "Capsulorhexis forceps";
        let verdict = validator().validate(&raw_from(fields));
        assert!(verdict.valid);
        assert!(verdict
            .warnings
            .iter()
            .any(|w| w.contains("identical")));
    }

    #[test]
    fn test_spanish_name_in_french_column_warns() {
        let mut fields = valid_fields();
        fields[6] = "Lámpara de hendidura digital para cirugía con guía";
        let verdict = validator().validate(&raw_from(fields));
        assert!(verdict.valid);
        assert!(verdict.warnings.iter().any(|w| w.contains("Spanish")));
    }
}

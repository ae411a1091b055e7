//! Repairs shape drift in LLM-produced report payloads
//!
//! Two kinds of drift are observed in practice:
//!
//! - **Object-wrapped arrays**: a section that should be a list arrives as an
//!   object holding the list under an arbitrary key
//!   (`{"feature_matrix": {"rows": [...]}}`).
//! - **Flat claims**: the claims audit arrives as one record per company claim
//!   (`{name, claim, source_url}`) instead of grouped records
//!   (`{claim_area, companies, analysis}`).
//!
//! [`normalize`] is pure and idempotent. After it runs, every section in
//! [`NORMALIZED_SECTIONS`] is either absent or an array, and the claims audit
//! is always grouped.

use serde_json::{Map, Value};

/// Sections that renderers iterate as arrays.
pub const NORMALIZED_SECTIONS: [&str; 8] = [
    "claims_audit",
    "integration_matrix",
    "social_proof",
    "messaging_playbook",
    "faq_intelligence",
    "news_momentum",
    "gap_analysis",
    "feature_matrix",
];

/// Section holding the claims audit.
pub const CLAIMS_SECTION: &str = "claims_audit";

/// Shape of a claims section, decided from its first element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimsShape {
    Empty,
    /// `{claim_area, companies: [...], analysis}` records.
    Grouped,
    /// `{name, claim, source_url, ...}` single-company records.
    Flat,
    /// Neither shape; passed through untouched.
    Unrecognized,
}

impl ClaimsShape {
    pub fn detect(items: &[Value]) -> Self {
        let Some(first) = items.first() else {
            return Self::Empty;
        };
        if truthy(first.get("claim_area")) && truthy(first.get("companies")) {
            Self::Grouped
        } else if truthy(first.get("name")) && truthy(first.get("claim")) {
            Self::Flat
        } else {
            Self::Unrecognized
        }
    }
}

/// Normalize a raw report payload into its canonical shape.
///
/// Non-object payloads are returned unchanged.
pub fn normalize(payload: Value) -> Value {
    let Value::Object(mut root) = payload else {
        return payload;
    };

    for key in NORMALIZED_SECTIONS {
        if let Some(section) = root.get_mut(key) {
            unwrap_section(section);
        }
    }

    if let Some(Value::Array(claims)) = root.get_mut(CLAIMS_SECTION) {
        if ClaimsShape::detect(claims) == ClaimsShape::Flat {
            let flat = std::mem::take(claims);
            *claims = flat.iter().map(group_flat_claim).collect();
        }
    }

    Value::Object(root)
}

/// Replace a non-array section with the first array found among its values.
fn unwrap_section(section: &mut Value) {
    let replacement = match section {
        Value::Array(_) => return,
        Value::Object(wrapper) => wrapper
            .values_mut()
            .find(|value| value.is_array())
            .map(Value::take)
            .unwrap_or_else(|| Value::Array(Vec::new())),
        // Scalars and null cannot be rendered as a list either.
        _ => Value::Array(Vec::new()),
    };
    *section = replacement;
}

fn group_flat_claim(item: &Value) -> Value {
    let claim_area = ["claim_area", "category", "name"]
        .iter()
        .map(|key| item.get(*key))
        .find(|value| truthy(*value))
        .flatten()
        .cloned()
        .unwrap_or(Value::Null);

    let mut company = Map::new();
    for key in ["name", "claim", "source_url", "source_title"] {
        if let Some(value) = item.get(key).filter(|v| !v.is_null()) {
            company.insert(key.to_string(), value.clone());
        }
    }

    let analysis = item.get("analysis").filter(|v| truthy(Some(*v))).cloned().unwrap_or(Value::Null);

    let mut group = Map::new();
    group.insert("claim_area".to_string(), claim_area);
    group.insert("companies".to_string(), Value::Array(vec![Value::Object(company)]));
    group.insert("analysis".to_string(), analysis);
    Value::Object(group)
}

/// JavaScript-style truthiness, which is what the backend's producers assume.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unwraps_object_wrapped_array() {
        let out = normalize(json!({ "feature_matrix": { "wrapper": [ { "feature": "SSO" } ] } }));
        assert_eq!(out["feature_matrix"], json!([ { "feature": "SSO" } ]));
    }

    #[test]
    fn picks_first_array_value_and_ignores_scalars() {
        let out = normalize(json!({
            "gap_analysis": { "summary": "text", "gaps": [1, 2], "more": [3] }
        }));
        assert_eq!(out["gap_analysis"], json!([1, 2]));
    }

    #[test]
    fn picks_array_in_payload_order_not_key_order() {
        let raw = r#"{"feature_matrix": {"zrows": [{"feature": "SSO"}], "alternatives": [{"feature": "other"}]}}"#;
        let out = normalize(serde_json::from_str(raw).unwrap());
        assert_eq!(out["feature_matrix"], json!([ { "feature": "SSO" } ]));
    }

    #[test]
    fn wrapper_without_array_becomes_empty() {
        let out = normalize(json!({ "news_momentum": { "note": "none found" } }));
        assert_eq!(out["news_momentum"], json!([]));
    }

    #[test]
    fn absent_sections_stay_absent() {
        let out = normalize(json!({ "meta": { "main_features_count": 3 } }));
        assert!(out.get("feature_matrix").is_none());
        assert_eq!(out["meta"]["main_features_count"], 3);
    }

    #[test]
    fn scalar_section_becomes_empty_array() {
        let out = normalize(json!({ "social_proof": null, "faq_intelligence": "n/a" }));
        assert_eq!(out["social_proof"], json!([]));
        assert_eq!(out["faq_intelligence"], json!([]));
    }

    #[test]
    fn regroups_flat_claims() {
        let out = normalize(json!({
            "claims_audit": [ { "name": "Acme", "claim": "99% uptime", "source_url": "https://x" } ]
        }));
        assert_eq!(
            out["claims_audit"],
            json!([{
                "claim_area": "Acme",
                "companies": [ { "name": "Acme", "claim": "99% uptime", "source_url": "https://x" } ],
                "analysis": null
            }])
        );
    }

    #[test]
    fn flat_claims_prefer_explicit_area_and_keep_analysis() {
        let out = normalize(json!({
            "claims_audit": [
                { "name": "Acme", "claim": "SOC2", "category": "Security", "analysis": "verified" }
            ]
        }));
        assert_eq!(out["claims_audit"][0]["claim_area"], "Security");
        assert_eq!(out["claims_audit"][0]["analysis"], "verified");
    }

    #[test]
    fn wrapped_flat_claims_are_unwrapped_then_grouped() {
        let out = normalize(json!({
            "claims_audit": { "claims": [ { "name": "Globex", "claim": "Fastest" } ] }
        }));
        assert_eq!(out["claims_audit"][0]["companies"][0]["name"], "Globex");
    }

    #[test]
    fn grouped_claims_untouched() {
        let grouped = json!({
            "claims_audit": [ { "claim_area": "Uptime", "companies": [], "analysis": "ok" } ]
        });
        assert_eq!(normalize(grouped.clone()), grouped);
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = json!({
            "meta": { "competitors": [] },
            "feature_matrix": { "rows": [ { "a": 1 } ] },
            "claims_audit": [ { "name": "Acme", "claim": "Best", "source_title": "Blog" } ],
            "integration_matrix": [],
            "messaging_playbook": { "nothing": true }
        });
        let once = normalize(raw);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn non_object_payload_passes_through() {
        assert_eq!(normalize(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn detects_shapes() {
        assert_eq!(ClaimsShape::detect(&[]), ClaimsShape::Empty);
        assert_eq!(ClaimsShape::detect(&[json!({ "x": 1 })]), ClaimsShape::Unrecognized);
        assert_eq!(
            ClaimsShape::detect(&[json!({ "name": "A", "claim": "" })]),
            ClaimsShape::Unrecognized
        );
    }
}

//! Route-of-administration and dosage-form extraction from intervention text.
//!
//! Keyword heuristics, not NLP. Each axis has an ordered rule list; the
//! first rule with a whole-word keyword hit wins. Loose hits are accepted
//! behavior: `SC-1234` reads as subcutaneous and any `patch` reads as
//! transdermal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use trialgraph_common::{InterventionRecord, Result, TrialGraphError};

/// Built-in route rules, highest priority first.
const ROUTE_KEYWORDS: &[(&str, &[&str])] = &[
    ("oral",            &["oral", "po", "by mouth", "per os"]),
    ("intravenous",     &["intravenous", "iv", "i.v.", "intra-venous"]),
    ("subcutaneous",    &["subcutaneous", "sc", "s.c.", "sub-q", "subq"]),
    ("intramuscular",   &["intramuscular", "im", "i.m."]),
    ("topical",         &["topical", "topically"]),
    ("inhalation",      &["inhalation", "inhaled", "inhaler", "nebulized"]),
    ("intranasal",      &["intranasal", "nasal", "intra-nasal"]),
    ("ophthalmic",      &["ophthalmic", "eye", "ocular", "ophthalmically"]),
    ("rectal",          &["rectal", "rectally"]),
    ("transdermal",     &["transdermal", "patch", "dermal"]),
    ("intraperitoneal", &["intraperitoneal", "ip", "i.p."]),
    ("intraarterial",   &["intraarterial", "ia", "i.a."]),
];

/// Built-in dosage-form rules, highest priority first.
const DOSAGE_FORM_KEYWORDS: &[(&str, &[&str])] = &[
    ("tablet",      &["tablet", "tab", "tablets"]),
    ("capsule",     &["capsule", "cap", "capsules"]),
    ("solution",    &["solution", "sol", "solutions"]),
    ("injection",   &["injection", "injectable", "injections"]),
    ("suspension",  &["suspension", "susp", "suspensions"]),
    ("patch",       &["patch", "patches", "transdermal patch"]),
    ("cream",       &["cream", "creams"]),
    ("gel",         &["gel", "gels"]),
    ("spray",       &["spray", "sprays"]),
    ("inhaler",     &["inhaler", "inhalers", "puffer"]),
    ("drops",       &["drops", "eye drops", "ear drops"]),
    ("powder",      &["powder", "powders"]),
    ("lozenge",     &["lozenge", "lozenges"]),
    ("suppository", &["suppository", "suppositories"]),
];

/// One canonical label and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered rule lists for both axes. Order is precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    pub routes: Vec<KeywordRule>,
    pub dosage_forms: Vec<KeywordRule>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        let build = |table: &[(&str, &[&str])]| -> Vec<KeywordRule> {
            table.iter().map(|(label, kws)| KeywordRule::new(label, kws)).collect()
        };
        Self {
            routes: build(ROUTE_KEYWORDS),
            dosage_forms: build(DOSAGE_FORM_KEYWORDS),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    label: String,
    pattern: Regex,
}

/// Compiled, immutable matcher over an [`ExtractionRules`] set.
#[derive(Debug, Clone)]
pub struct RouteDosageExtractor {
    routes: Vec<CompiledRule>,
    dosage_forms: Vec<CompiledRule>,
}

impl RouteDosageExtractor {
    pub fn new(rules: ExtractionRules) -> Result<Self> {
        Ok(Self {
            routes: compile(&rules.routes)?,
            dosage_forms: compile(&rules.dosage_forms)?,
        })
    }

    /// Match one intervention. The searched text is the name followed by the
    /// type; an intervention without a name yields nothing.
    pub fn extract(&self, name: Option<&str>, intervention_type: Option<&str>) -> (Option<String>, Option<String>) {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return (None, None);
        };
        let text = match intervention_type {
            Some(kind) => format!("{name} {kind}"),
            None => name.to_string(),
        };
        (first_match(&self.routes, &text), first_match(&self.dosage_forms, &text))
    }

    /// Per-trial value: for each axis independently, the first intervention
    /// in source order that yields a label decides it.
    pub fn aggregate<'a, I>(&self, interventions: I) -> (Option<String>, Option<String>)
    where
        I: IntoIterator<Item = &'a InterventionRecord>,
    {
        let mut route = None;
        let mut dosage_form = None;
        for rec in interventions {
            if route.is_some() && dosage_form.is_some() {
                break;
            }
            let (r, d) = self.extract(rec.intervention_name.as_deref(), rec.intervention_type.as_deref());
            if route.is_none() {
                route = r;
            }
            if dosage_form.is_none() {
                dosage_form = d;
            }
        }
        (route, dosage_form)
    }
}

fn first_match(rules: &[CompiledRule], text: &str) -> Option<String> {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(text))
        .map(|rule| rule.label.clone())
}

fn compile(rules: &[KeywordRule]) -> Result<Vec<CompiledRule>> {
    rules
        .iter()
        .map(|rule| {
            if rule.label.trim().is_empty() {
                return Err(TrialGraphError::Config("extraction rule with empty label".into()));
            }
            let alternatives = rule
                .keywords
                .iter()
                .map(|kw| keyword_pattern(&rule.label, kw))
                .collect::<Result<Vec<_>>>()?;
            if alternatives.is_empty() {
                return Err(TrialGraphError::Config(format!(
                    "extraction rule '{}' has no keywords",
                    rule.label
                )));
            }
            let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
                .map_err(|e| TrialGraphError::Config(format!("rule '{}': {e}", rule.label)))?;
            Ok(CompiledRule { label: rule.label.clone(), pattern })
        })
        .collect()
}

/// Escaped keyword body. A trailing dot is dropped so `i.v.` also matches
/// `i.v`, `(i.v.)` and `i.v,` under word boundaries.
fn keyword_pattern(label: &str, keyword: &str) -> Result<String> {
    let body = keyword.trim().trim_end_matches('.');
    if body.is_empty() {
        return Err(TrialGraphError::Config(format!("rule '{label}' has a blank keyword")));
    }
    Ok(regex::escape(body))
}

//! Sales-intent classification for outbound messages.
//!
//! Classification priority (first match wins):
//!   1. Meeting request: meet, call, schedule, demo
//!   2. Recruiting: hiring, open role, candidate
//!   3. Partnership: partner, collaborate, work together
//!   4. Service offering: we help, consulting, agency
//!   5. General business: company, revenue, saas
//!   6. None: nothing matched, or the message is empty
//!
//! Keyword lists live in `rules/sales_rules.json` and may be replaced with a
//! custom file. The order above is fixed by `SalesCategory::PRIORITY`; the
//! order of categories in the JSON has no effect.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::SalesCategory;

const EMBEDDED_RULES: &str = include_str!("../rules/sales_rules.json");

/// Keywords (case-insensitive substrings) and regex patterns for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl RuleSpec {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.patterns.is_empty()
    }
}

/// The configurable rule surface, one entry per sales category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRuleSet {
    #[serde(default)]
    pub meeting_request: RuleSpec,
    #[serde(default)]
    pub recruiting: RuleSpec,
    #[serde(default)]
    pub partnership: RuleSpec,
    #[serde(default)]
    pub service_offering: RuleSpec,
    #[serde(default)]
    pub general_business: RuleSpec,
}

impl SalesRuleSet {
    /// The rule set compiled into the binary.
    pub fn embedded() -> Result<Self, AnalysisError> {
        let rules: SalesRuleSet = serde_json::from_str(EMBEDDED_RULES)
            .map_err(|e| AnalysisError::Rules(format!("Failed to parse embedded rules: {}", e)))?;
        validate_rules(&rules)?;
        Ok(rules)
    }

    /// Load a custom rule set from a JSON file.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Rules(format!("Failed to read rules file: {}", e)))?;
        let rules: SalesRuleSet = serde_json::from_str(&content)
            .map_err(|e| AnalysisError::Rules(format!("Failed to parse rules: {}", e)))?;
        validate_rules(&rules)?;
        Ok(rules)
    }

    pub fn spec_for(&self, category: SalesCategory) -> Option<&RuleSpec> {
        match category {
            SalesCategory::MeetingRequest => Some(&self.meeting_request),
            SalesCategory::Recruiting => Some(&self.recruiting),
            SalesCategory::Partnership => Some(&self.partnership),
            SalesCategory::ServiceOffering => Some(&self.service_offering),
            SalesCategory::GeneralBusiness => Some(&self.general_business),
            SalesCategory::None => None,
        }
    }
}

/// Validate a rule set: no blank keywords, at least one rule overall.
pub fn validate_rules(rules: &SalesRuleSet) -> Result<(), AnalysisError> {
    let mut any_rule = false;
    for category in SalesCategory::PRIORITY {
        let Some(spec) = rules.spec_for(category) else {
            continue;
        };
        if spec.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(AnalysisError::Rules(format!(
                "Blank keyword in {} rules",
                category.as_str()
            )));
        }
        any_rule |= !spec.is_empty();
    }
    if !any_rule {
        return Err(AnalysisError::Rules("Rule set defines no keywords or patterns".into()));
    }
    Ok(())
}

/// One compiled (predicate, category) pair.
#[derive(Debug, Clone)]
struct CategoryRule {
    category: SalesCategory,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl CategoryRule {
    fn compile(category: SalesCategory, spec: &RuleSpec) -> Result<Self, AnalysisError> {
        let patterns = spec
            .patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p).case_insensitive(true).build().map_err(|e| {
                    AnalysisError::Rules(format!(
                        "Invalid pattern '{}' in {} rules: {}",
                        p,
                        category.as_str(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CategoryRule {
            category,
            keywords: spec.keywords.iter().map(|k| k.to_lowercase()).collect(),
            patterns,
        })
    }

    fn matches(&self, lower: &str) -> bool {
        contains_any(lower, &self.keywords) || self.patterns.iter().any(|re| re.is_match(lower))
    }
}

/// Ordered first-match classifier over compiled rules.
#[derive(Debug, Clone)]
pub struct SalesClassifier {
    rules: Vec<CategoryRule>,
}

impl SalesClassifier {
    pub fn from_rules(rules: &SalesRuleSet) -> Result<Self, AnalysisError> {
        let mut compiled = Vec::with_capacity(SalesCategory::PRIORITY.len());
        for category in SalesCategory::PRIORITY {
            if let Some(spec) = rules.spec_for(category) {
                compiled.push(CategoryRule::compile(category, spec)?);
            }
        }
        Ok(SalesClassifier { rules: compiled })
    }

    /// Classifier over the embedded default rules.
    pub fn default_rules() -> Result<Self, AnalysisError> {
        Self::from_rules(&SalesRuleSet::embedded()?)
    }

    /// Classifier over a custom rules file.
    pub fn load_rules(path: &Path) -> Result<Self, AnalysisError> {
        let rules = SalesRuleSet::load(path)?;
        log::info!("sales: loaded custom rules from {}", path.display());
        Self::from_rules(&rules)
    }

    /// Classify one outbound message. Empty content is `None` without
    /// evaluating any rule.
    pub fn classify(&self, content: &str) -> SalesCategory {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return SalesCategory::None;
        }
        let lower = trimmed.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.category)
            .unwrap_or(SalesCategory::None)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

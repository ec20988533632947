//! Attribute concatenation and redistribution.
//!
//! Attribute-mode database cells hold a space-joined `key=value ...`
//! token sequence. Merging in appends tokens for attribute keys not
//! yet present; when several source tokens of one span map to the same
//! database key (a multi-token phrase), each token's contribution is
//! formatted through a pattern and glued with position-dependent
//! separators. Splitting out is the inverse: one stored sequence is
//! divided across the target spans that each expect a share.

use crate::annotation::SourceIndex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Separator and pattern configuration for one attribute key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorRules {
    /// Inserted before the first token's contribution.
    pub first_separator: String,
    /// Inserted before a contribution whose position is contiguous
    /// with the previous one.
    pub normal_separator: String,
    /// Inserted instead of `normal_separator` when the position jumped
    /// or crossed a verse boundary.
    pub ellipsis_separator: String,
    /// Per-token contribution template; supports `${value}`,
    /// `${index}` (1-based) and `${count}` placeholders.
    pub pattern: String,
}

impl Default for SeparatorRules {
    fn default() -> Self {
        Self {
            first_separator: String::new(),
            normal_separator: " ".to_string(),
            ellipsis_separator: " ... ".to_string(),
            pattern: "${value}".to_string(),
        }
    }
}

impl SeparatorRules {
    fn apply_pattern(&self, value: &str, index: usize, count: usize) -> String {
        self.pattern
            .replace("${value}", value)
            .replace("${index}", &(index + 1).to_string())
            .replace("${count}", &count.to_string())
    }

    /// True when the rules can delimit more than one share.
    pub fn can_split(&self) -> bool {
        !self.normal_separator.is_empty() || !self.ellipsis_separator.is_empty()
    }
}

/// Partial per-key override as it appears in the rules file; missing
/// fields fall back to the `[default]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRules {
    first_separator: Option<String>,
    normal_separator: Option<String>,
    ellipsis_separator: Option<String>,
    pattern: Option<String>,
}

impl PartialRules {
    fn resolve(&self, base: &SeparatorRules) -> SeparatorRules {
        SeparatorRules {
            first_separator: self
                .first_separator
                .clone()
                .unwrap_or_else(|| base.first_separator.clone()),
            normal_separator: self
                .normal_separator
                .clone()
                .unwrap_or_else(|| base.normal_separator.clone()),
            ellipsis_separator: self
                .ellipsis_separator
                .clone()
                .unwrap_or_else(|| base.ellipsis_separator.clone()),
            pattern: self.pattern.clone().unwrap_or_else(|| base.pattern.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default)]
    default: PartialRules,
    #[serde(default)]
    key: BTreeMap<String, PartialRules>,
}

/// Full rules table: a default plus per-attribute-key overrides.
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    default: SeparatorRules,
    per_key: BTreeMap<String, SeparatorRules>,
}

impl MergeRules {
    pub fn rules_for(&self, attr_key: &str) -> &SeparatorRules {
        self.per_key.get(attr_key).unwrap_or(&self.default)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let file: RulesFile = toml::from_str(text)?;
        let default = file.default.resolve(&SeparatorRules::default());
        let per_key = file
            .key
            .iter()
            .map(|(k, partial)| (k.clone(), partial.resolve(&default)))
            .collect();
        Ok(Self { default, per_key })
    }

    pub fn load(path: &Path) -> Result<Self, crate::errors::EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| {
            crate::errors::EngineError::config(format!(
                "bad merge rules in {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Parse a stored `key=value ...` sequence into ordered pairs.
///
/// Values may contain spaces: a whitespace-separated word without `=`
/// continues the previous value.
pub fn parse_attr_string(stored: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for word in stored.split(' ').filter(|w| !w.is_empty()) {
        match word.find('=') {
            Some(pos) => pairs.push((word[..pos].to_string(), word[pos + 1..].to_string())),
            None => {
                if let Some((_, value)) = pairs.last_mut() {
                    value.push(' ');
                    value.push_str(word);
                }
            }
        }
    }
    pairs
}

fn render_attr_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn contiguous(prev: &SourceIndex, cur: &SourceIndex) -> bool {
    prev.source == cur.source && cur.index == prev.index + 1
}

/// Merge one span's attributes into the stored sequence for one
/// database key.
///
/// `positions` are the span's source-token positions grouped under
/// this key (at least one). Attribute keys already present in the
/// stored sequence are left untouched; new keys are appended. Reserved
/// bookkeeping keys are expected to be filtered out by the caller.
pub fn merge_in(
    existing: Option<&str>,
    span_attrs: &[(String, String)],
    positions: &[SourceIndex],
    rules: &MergeRules,
) -> String {
    let mut pairs = existing.map(parse_attr_string).unwrap_or_default();

    // Distinct attribute keys in span order.
    let mut keys: Vec<&str> = Vec::new();
    for (k, _) in span_attrs {
        if !keys.contains(&k.as_str()) {
            keys.push(k);
        }
    }

    for key in keys {
        if pairs.iter().any(|(k, _)| k == key) {
            continue;
        }
        let values: Vec<&str> = span_attrs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect();
        let contribution = if positions.len() > 1 {
            assemble(&values, positions, rules.rules_for(key))
        } else {
            values.join(" ")
        };
        pairs.push((key.to_string(), contribution));
    }

    render_attr_string(&pairs)
}

/// Assemble a multi-token contribution with per-position separators.
fn assemble(values: &[&str], positions: &[SourceIndex], rules: &SeparatorRules) -> String {
    let count = positions.len();
    // One value per position when the counts line up, otherwise the
    // whole folded value repeats for each position.
    let per_position = values.len() == count;
    let folded = values.join(" ");

    let mut out = String::new();
    for (i, position) in positions.iter().enumerate() {
        let separator = if i == 0 {
            &rules.first_separator
        } else if contiguous(&positions[i - 1], position) {
            &rules.normal_separator
        } else {
            &rules.ellipsis_separator
        };
        let value = if per_position { values[i] } else { &folded };
        out.push_str(separator);
        out.push_str(&rules.apply_pattern(value, i, count));
    }
    out
}

/// Split a stored contribution back into ordered shares.
///
/// The first separator is stripped from the front; the remainder is
/// cut at every occurrence of the ellipsis or normal separator (the
/// longer match wins at a given position). With no splittable
/// separator configured the whole value is a single share.
pub fn split_out(value: &str, rules: &SeparatorRules) -> Vec<String> {
    let mut rest = value;
    if !rules.first_separator.is_empty() {
        if let Some(stripped) = rest.strip_prefix(rules.first_separator.as_str()) {
            rest = stripped;
        }
    }

    let mut separators: Vec<&str> = Vec::new();
    for sep in [&rules.ellipsis_separator, &rules.normal_separator] {
        if !sep.is_empty() && !separators.contains(&sep.as_str()) {
            separators.push(sep);
        }
    }
    // Longer separators take precedence so " ... " is not eaten by " ".
    separators.sort_by_key(|s| std::cmp::Reverse(s.len()));

    if separators.is_empty() {
        return vec![rest.to_string()];
    }

    let mut shares = Vec::new();
    let mut current = String::new();
    let mut pos = 0;
    'outer: while pos < rest.len() {
        for sep in &separators {
            if rest[pos..].starts_with(sep) {
                shares.push(std::mem::take(&mut current));
                pos += sep.len();
                continue 'outer;
            }
        }
        let ch = rest[pos..].chars().next().unwrap();
        current.push(ch);
        pos += ch.len_utf8();
    }
    shares.push(current);
    shares
}

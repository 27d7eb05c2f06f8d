// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node knowledge index.
//!
//! An in-memory index over embedded static records: node schemas, pattern
//! recipes, webhook payload shapes, documented quirks, and expression recipes.
//! Built once at startup and shared read-only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{expand_node_type, simplify_node_type};

const NODES_JSON: &str = include_str!("data/nodes.json");
const PATTERNS_JSON: &str = include_str!("data/patterns.json");
const PAYLOADS_JSON: &str = include_str!("data/payloads.json");
const QUIRKS_JSON: &str = include_str!("data/quirks.json");
const EXPRESSIONS_JSON: &str = include_str!("data/expressions.json");

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    /// Enumerated legal values; empty means unrestricted.
    #[serde(default)]
    pub options: Vec<String>,
    /// Visibility condition: other-property → permitted values. The property is
    /// shown when every listed property currently holds one of its values.
    #[serde(default)]
    pub show: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    pub node_type: String,
    pub display_name: String,
    pub description: String,
    /// "core" or "langchain".
    pub source: String,
    #[serde(default)]
    pub search_tokens: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
    #[serde(default)]
    pub resources: Vec<String>,
    /// Resource → declared operations.
    #[serde(default)]
    pub operations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Pattern {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PayloadSchema {
    pub service: String,
    pub event: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quirk {
    pub node_type: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExpressionRecipe {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub expression: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchMode {
    And,
    Or,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub node_type: String,
    pub display_name: String,
    pub description: String,
    pub source: String,
    pub score: u32,
}

#[derive(Debug)]
pub struct Catalog {
    nodes: Vec<NodeSchema>,
    patterns: Vec<Pattern>,
    payloads: Vec<PayloadSchema>,
    quirks: Vec<Quirk>,
    expressions: Vec<ExpressionRecipe>,
}

impl Catalog {
    /// Parses the embedded data files. The data ships inside the binary, so a
    /// parse failure is a build defect, not a runtime condition.
    pub fn load() -> Self {
        Self {
            nodes: serde_json::from_str(NODES_JSON).expect("embedded nodes.json is valid"),
            patterns: serde_json::from_str(PATTERNS_JSON).expect("embedded patterns.json is valid"),
            payloads: serde_json::from_str(PAYLOADS_JSON).expect("embedded payloads.json is valid"),
            quirks: serde_json::from_str(QUIRKS_JSON).expect("embedded quirks.json is valid"),
            expressions: serde_json::from_str(EXPRESSIONS_JSON)
                .expect("embedded expressions.json is valid"),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolves a query to one node schema.
    ///
    /// Tries, in order: the exact full type, the compact-prefix form, the
    /// display name case-insensitively, and the query re-prefixed with each
    /// recognized package prefix.
    pub fn get_node(&self, query: &str) -> Option<&NodeSchema> {
        if let Some(schema) = self.nodes.iter().find(|schema| schema.node_type == query) {
            return Some(schema);
        }

        let expanded = expand_node_type(query);
        if let Some(schema) = self.nodes.iter().find(|schema| schema.node_type == expanded) {
            return Some(schema);
        }

        if let Some(schema) = self
            .nodes
            .iter()
            .find(|schema| schema.display_name.eq_ignore_ascii_case(query))
        {
            return Some(schema);
        }

        for prefix in ["n8n-nodes-base.", "@n8n/n8n-nodes-langchain."] {
            let candidate = format!("{prefix}{query}");
            if let Some(schema) = self
                .nodes
                .iter()
                .find(|schema| schema.node_type == candidate)
            {
                return Some(schema);
            }
        }

        None
    }

    /// Scored token search over the node index.
    pub fn search_nodes(
        &self,
        query: &str,
        mode: SearchMode,
        limit: usize,
        source: Option<&str>,
    ) -> Vec<SearchHit> {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .nodes
            .iter()
            .filter(|schema| source.map_or(true, |wanted| schema.source == wanted))
            .filter_map(|schema| {
                let mut total = 0u32;
                let mut matched = 0usize;
                for token in &tokens {
                    let score = score_token(schema, token, mode == SearchMode::Fuzzy);
                    if score > 0 {
                        matched += 1;
                        total += score;
                    }
                }
                let enough = match mode {
                    SearchMode::And => matched == tokens.len(),
                    SearchMode::Or | SearchMode::Fuzzy => matched > 0,
                };
                enough.then(|| SearchHit {
                    node_type: schema.node_type.clone(),
                    display_name: schema.display_name.clone(),
                    description: schema.description.clone(),
                    source: schema.source.clone(),
                    score: total,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.node_type.cmp(&b.node_type))
        });
        hits.truncate(limit);
        hits
    }

    pub fn search_patterns(&self, query: &str) -> Vec<&Pattern> {
        keyword_filter(query, &self.patterns, |pattern| {
            keyword_haystack(&pattern.name, &pattern.description, &pattern.keywords)
        })
    }

    pub fn get_pattern(&self, name: &str) -> Option<&Pattern> {
        self.patterns
            .iter()
            .find(|pattern| pattern.name.eq_ignore_ascii_case(name))
    }

    pub fn payload_schemas(&self, service: &str) -> Vec<&PayloadSchema> {
        let needle = service.to_lowercase();
        self.payloads
            .iter()
            .filter(|payload| {
                payload.service.to_lowercase().contains(&needle)
                    || payload.keywords.iter().any(|k| k.to_lowercase() == needle)
            })
            .collect()
    }

    pub fn quirks_for(&self, query: &str) -> Vec<&Quirk> {
        let expanded = expand_node_type(query);
        let exact: Vec<&Quirk> = self
            .quirks
            .iter()
            .filter(|quirk| quirk.node_type == expanded || quirk.node_type == query)
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        keyword_filter(query, &self.quirks, |quirk| {
            keyword_haystack(
                &simplify_node_type(&quirk.node_type),
                &quirk.description,
                &quirk.keywords,
            )
        })
    }

    pub fn search_expressions(&self, query: &str) -> Vec<&ExpressionRecipe> {
        keyword_filter(query, &self.expressions, |recipe| {
            keyword_haystack(&recipe.name, &recipe.description, &recipe.keywords)
        })
    }

    /// Package sources with their node counts.
    pub fn providers(&self) -> BTreeMap<String, usize> {
        let mut providers = BTreeMap::new();
        for schema in &self.nodes {
            *providers.entry(schema.source.clone()).or_insert(0) += 1;
        }
        providers
    }
}

fn keyword_haystack(name: &str, description: &str, keywords: &[String]) -> String {
    let mut haystack = String::with_capacity(name.len() + description.len() + 32);
    haystack.push_str(&name.to_lowercase());
    haystack.push(' ');
    haystack.push_str(&description.to_lowercase());
    for keyword in keywords {
        haystack.push(' ');
        haystack.push_str(&keyword.to_lowercase());
    }
    haystack
}

fn keyword_filter<'a, T>(
    query: &str,
    records: &'a [T],
    haystack: impl Fn(&T) -> String,
) -> Vec<&'a T> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|record| {
            let hay = haystack(record);
            tokens.iter().any(|token| hay.contains(token))
        })
        .collect()
}

fn score_token(schema: &NodeSchema, token: &str, fuzzy: bool) -> u32 {
    let full_type = schema.node_type.to_lowercase();
    let short_type = simplify_node_type(&schema.node_type).to_lowercase();
    let display = schema.display_name.to_lowercase();

    let mut score = if full_type == token || short_type == token {
        100
    } else if display == token {
        90
    } else if short_type.starts_with(token) || display.starts_with(token) {
        70
    } else if display.contains(token) {
        50
    } else if full_type.contains(token) {
        40
    } else if schema
        .search_tokens
        .iter()
        .any(|known| known.to_lowercase().contains(token))
    {
        20
    } else {
        0
    };

    if fuzzy {
        score += fuzzy_bonus(&display, &short_type, token);
    }
    score
}

/// One-character deletions score 15, adjacent swaps 12, best variant wins.
fn fuzzy_bonus(display: &str, short_type: &str, token: &str) -> u32 {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 2 {
        return 0;
    }

    let matches = |candidate: &str| display.contains(candidate) || short_type.contains(candidate);

    for skip in 0..chars.len() {
        let variant: String = chars
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != skip)
            .map(|(_, ch)| ch)
            .collect();
        if matches(&variant) {
            return 15;
        }
    }

    for left in 0..chars.len() - 1 {
        let mut swapped = chars.clone();
        swapped.swap(left, left + 1);
        let variant: String = swapped.into_iter().collect();
        if variant != token && matches(&variant) {
            return 12;
        }
    }

    0
}

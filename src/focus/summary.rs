// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One-line human previews for nodes.
//!
//! Summaries are capped at ~100 characters and always say *something*: a router
//! with no rules reads "no rules / expression mode", never a bare type name.

use serde_json::Value;

const SUMMARY_CAP: usize = 100;

/// Best-effort one-line preview of a node's configuration.
pub fn node_summary(short_type: &str, parameters: Option<&Value>) -> String {
    let params = parameters.unwrap_or(&Value::Null);

    let summary = match short_type {
        "httpRequest" => http_summary(params),
        "code" | "function" | "functionItem" => code_summary(params),
        "if" | "filter" => condition_summary(params),
        "switch" => switch_summary(params),
        "webhook" => webhook_summary(params),
        "set" => set_summary(params),
        _ if short_type.starts_with("langchain:agent") => agent_summary(params),
        _ if short_type.starts_with("langchain:lmChat") => model_summary(params),
        _ => None,
    };

    truncate(&summary.unwrap_or_else(|| humanize(short_type)), SUMMARY_CAP)
}

/// "What does this node emit" hint for dormant upstream nodes.
pub fn output_hint(short_type: &str, parameters: Option<&Value>) -> Option<String> {
    let params = parameters?;

    let hint = match short_type {
        "set" => {
            let fields = set_field_names(params);
            (!fields.is_empty()).then(|| format!("writes: {}", fields.join(", ")))
        }
        "code" | "function" | "functionItem" => {
            let code = code_text(params)?;
            let tail = code.split("return").nth(1)?;
            let head = tail.trim().lines().next()?.trim_end_matches([';', ' ']);
            (!head.is_empty()).then(|| format!("returns {head}"))
        }
        "httpRequest" => {
            let url = params.get("url").and_then(Value::as_str)?;
            (!url.starts_with('=')).then(|| format!("fetches {url}"))
        }
        "postgres" | "mysql" | "microsoftSql" => {
            let query = params.get("query").and_then(Value::as_str)?;
            let head = query.trim();
            head.to_ascii_lowercase()
                .starts_with("select")
                .then(|| head.lines().next().unwrap_or(head).to_owned())
        }
        "googleSheets" => {
            let sheet = params
                .get("sheetName")
                .and_then(sheet_label)
                .unwrap_or_default();
            let range = params.get("range").and_then(Value::as_str).unwrap_or("");
            (!sheet.is_empty() || !range.is_empty())
                .then(|| format!("sheet {sheet} {range}").trim().to_owned())
        }
        "executeWorkflow" => {
            let id = params.get("workflowId").and_then(sheet_label)?;
            Some(format!("calls workflow {id}"))
        }
        _ => None,
    };

    hint.map(|text| truncate(&text, SUMMARY_CAP))
}

fn http_summary(params: &Value) -> Option<String> {
    let url = params.get("url").and_then(Value::as_str)?;
    let method = params
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("GET");
    Some(format!("{method} {url}"))
}

fn code_text(params: &Value) -> Option<&str> {
    ["jsCode", "pythonCode", "functionCode"]
        .iter()
        .find_map(|key| params.get(key).and_then(Value::as_str))
}

fn code_summary(params: &Value) -> Option<String> {
    let language = match params.get("language").and_then(Value::as_str) {
        Some("python") | Some("pythonNative") => "py",
        _ => "js",
    };
    let code = code_text(params)?;

    let meaningful = code.lines().map(str::trim).find(|line| {
        !line.is_empty()
            && !line.starts_with("//")
            && !line.starts_with("/*")
            && !line.starts_with('*')
            && !line.starts_with("import ")
            && !line.contains("require(")
    });

    match meaningful {
        Some(line) => Some(format!("{language}: {line}")),
        None => Some(format!("{language}: comment-only code")),
    }
}

fn condition_summary(params: &Value) -> Option<String> {
    let conditions = params.get("conditions")?;

    // Format 2: typed condition object with {leftValue, rightValue, operator}.
    if let Some(first) = conditions
        .get("conditions")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
    {
        let left = scalar_text(first.get("leftValue"));
        let right = scalar_text(first.get("rightValue"));
        let op = first
            .get("operator")
            .and_then(|op| op.get("operation"))
            .and_then(Value::as_str)
            .unwrap_or("equals");
        return Some(format!("{left} {op} {right}"));
    }

    // Format 1: per-type lists like conditions.string[0] = {value1, operation, value2}.
    for bucket in ["string", "number", "boolean", "dateTime"] {
        if let Some(first) = conditions
            .get(bucket)
            .and_then(Value::as_array)
            .and_then(|list| list.first())
        {
            let left = scalar_text(first.get("value1"));
            let right = scalar_text(first.get("value2"));
            let op = first
                .get("operation")
                .and_then(Value::as_str)
                .unwrap_or("equals");
            return Some(format!("{left} {op} {right}"));
        }
    }

    None
}

fn switch_summary(params: &Value) -> Option<String> {
    let rules = params
        .get("rules")
        .and_then(|rules| rules.get("values"))
        .and_then(Value::as_array);

    match rules {
        Some(values) if !values.is_empty() => {
            let labels: Vec<String> = values
                .iter()
                .take(3)
                .enumerate()
                .map(|(index, rule)| {
                    rule.get("outputKey")
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned)
                        .unwrap_or_else(|| format!("output {index}"))
                })
                .collect();
            Some(format!("routes: {}", labels.join(" / ")))
        }
        _ => Some("no rules / expression mode".to_owned()),
    }
}

fn agent_summary(params: &Value) -> Option<String> {
    let prompt = params
        .get("options")
        .and_then(|options| options.get("systemMessage"))
        .and_then(Value::as_str)
        .or_else(|| params.get("systemMessage").and_then(Value::as_str))?;
    let first_line = prompt.trim().lines().next()?.trim();
    (!first_line.is_empty()).then(|| first_line.to_owned())
}

fn model_summary(params: &Value) -> Option<String> {
    params
        .get("model")
        .and_then(sheet_label)
        .or_else(|| {
            params
                .get("modelName")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        })
}

fn webhook_summary(params: &Value) -> Option<String> {
    let path = params.get("path").and_then(Value::as_str)?;
    let method = params
        .get("httpMethod")
        .and_then(Value::as_str)
        .unwrap_or("GET");
    Some(format!("{method} /{}", path.trim_start_matches('/')))
}

fn set_field_names(params: &Value) -> Vec<String> {
    // Format 3 writes assignments.assignments[], format 2 values.values[].
    let list = params
        .get("assignments")
        .and_then(|a| a.get("assignments"))
        .and_then(Value::as_array)
        .or_else(|| {
            params
                .get("values")
                .and_then(|v| v.get("values"))
                .and_then(Value::as_array)
        });

    list.into_iter()
        .flatten()
        .filter_map(|entry| entry.get("name").and_then(Value::as_str))
        .map(ToOwned::to_owned)
        .collect()
}

fn set_summary(params: &Value) -> Option<String> {
    let fields = set_field_names(params);
    if fields.is_empty() {
        return None;
    }
    let shown: Vec<&str> = fields.iter().take(5).map(String::as_str).collect();
    let mut text = format!("sets: {}", shown.join(", "));
    if fields.len() > 5 {
        text.push_str(&format!(" +{} more", fields.len() - 5));
    }
    Some(text)
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => "?".to_owned(),
    }
}

/// Google-style resource locators arrive either as strings or `{value, mode}`.
fn sheet_label(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(fields) => fields
            .get("value")
            .or_else(|| fields.get("cachedResultName"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        _ => None,
    }
}

/// "httpRequest" → "Http Request".
pub fn humanize(short_type: &str) -> String {
    let base = short_type.rsplit(':').next().unwrap_or(short_type);
    let mut out = String::with_capacity(base.len() + 4);
    for (index, ch) in base.chars().enumerate() {
        if index == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_ascii_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out
}

fn truncate(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(cap.saturating_sub(1)).collect();
    out.push('…');
    out
}

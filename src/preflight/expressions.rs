// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Expression syntax validation.
//!
//! The engine only evaluates `{{ }}` templates when the string starts with the
//! `=` sigil; everything else is sent as literal text, which is the single most
//! common silent workflow bug.

use serde_json::Value;

use super::ValidationIssue;

/// Recursion cap for parameter trees; `serde_json::Value` cannot alias, so this
/// is belt only.
const MAX_DEPTH: usize = 50;

pub fn validate_expressions(node: &str, parameters: &Value, issues: &mut Vec<ValidationIssue>) {
    walk(node, None, parameters, 0, issues);
}

fn walk(
    node: &str,
    field: Option<&str>,
    value: &Value,
    depth: usize,
    issues: &mut Vec<ValidationIssue>,
) {
    if depth >= MAX_DEPTH {
        return;
    }

    match value {
        Value::String(text) => check_string(node, field, text, issues),
        Value::Object(fields) => {
            for (key, nested) in fields {
                let path = match field {
                    Some(parent) => format!("{parent}.{key}"),
                    None => key.clone(),
                };
                walk(node, Some(&path), nested, depth + 1, issues);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                let path = match field {
                    Some(parent) => format!("{parent}[{index}]"),
                    None => format!("[{index}]"),
                };
                walk(node, Some(&path), nested, depth + 1, issues);
            }
        }
        _ => {}
    }
}

fn check_string(node: &str, field: Option<&str>, text: &str, issues: &mut Vec<ValidationIssue>) {
    let opens = text.matches("{{").count();
    let closes = text.matches("}}").count();
    let has_braces = opens > 0 && closes > 0;

    if has_braces && !text.starts_with('=') {
        issues.push(ValidationIssue::error(
            "invalid_expression",
            node,
            field,
            "contains {{ }} but does not start with '='; the engine will treat it as literal text",
            Some("prefix the value with '=' to make it an expression"),
        ));
        return;
    }

    if opens != closes {
        issues.push(ValidationIssue::error(
            "expression_syntax",
            node,
            field,
            "unbalanced {{ }} braces",
            Some("match every {{ with a closing }}"),
        ));
        return;
    }

    if text.contains("{{}}") || text.contains("{{ }}") {
        issues.push(ValidationIssue::error(
            "empty_expression",
            node,
            field,
            "empty {{ }} expression",
            Some("put a value inside the braces or remove them"),
        ));
        return;
    }

    let mut rest = text;
    let mut inside_any = false;
    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        inside_any = true;
        let segment = &after_open[..close];

        if segment.contains("{{") {
            issues.push(ValidationIssue::error(
                "expression_syntax",
                node,
                field,
                "nested {{ inside an expression",
                Some("expressions cannot nest; use a single {{ }} pair"),
            ));
            return;
        }
        if segment.contains("?.") {
            issues.push(ValidationIssue::warning(
                "optional_chaining",
                node,
                field,
                "'?.' inside an expression; older engine versions reject it",
                Some("guard with '??' or a ternary if the engine predates optional chaining"),
            ));
        }
        rest = &after_open[close + 2..];
    }

    if !inside_any && text.contains("${") {
        issues.push(ValidationIssue::warning(
            "template_literal",
            node,
            field,
            "JS template-literal syntax '${...}' has no effect here",
            Some("engine expressions use ={{ ... }}, not ${ ... }"),
        ));
    }
}

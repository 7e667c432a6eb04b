//! Choosing the variable name for a logger the fixer creates.

use std::collections::HashSet;

use crate::analysis::LanguageFamily;
use crate::config::{is_identifier, LanguageConfig, NamingStrategy};

/// Name for a new logger in the file at `relative_path`.
///
/// Falls back to `logger_name` when module naming yields nothing usable.
/// A numeric suffix is added when the name is already bound at module scope.
pub fn logger_name_for(
    relative_path: &str,
    family: LanguageFamily,
    lang: &LanguageConfig,
    declared: &HashSet<String>,
) -> String {
    let base = match lang.naming {
        NamingStrategy::Fixed => lang.logger_name.clone(),
        NamingStrategy::Module => module_logger_name(relative_path, family, lang)
            .filter(|n| is_identifier(n, family))
            .unwrap_or_else(|| lang.logger_name.clone()),
    };
    unique_name(base, declared)
}

/// Derive a name from the directory path and file stem.
///
/// `src/services/auth-service.ts` becomes `servicesAuthServiceLogger`; for
/// Python `pkg/db/session.py` becomes `pkg_db_session_logger`.
pub fn module_logger_name(
    relative_path: &str,
    family: LanguageFamily,
    lang: &LanguageConfig,
) -> Option<String> {
    let mut parts: Vec<&str> = relative_path.split('/').filter(|p| !p.is_empty()).collect();
    let file = parts.pop()?;
    let stem = match file.find('.') {
        Some(0) | None => file,
        Some(idx) => &file[..idx],
    };

    let mut words: Vec<String> = Vec::new();
    for dir in parts {
        if lang.strip_segments.iter().any(|s| s == dir) {
            continue;
        }
        words.extend(split_words(dir));
    }
    if stem != "index" && stem != "__init__" {
        words.extend(split_words(stem));
    }
    if words.is_empty() {
        return None;
    }

    let name = match family {
        LanguageFamily::JavaScript => {
            let mut name = words[0].to_lowercase();
            for word in &words[1..] {
                name.push_str(&capitalize(word));
            }
            name.push_str(&lang.logger_suffix);
            name
        }
        LanguageFamily::Python => {
            let mut joined: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
            let suffix = snake_case(&lang.logger_suffix);
            if !suffix.is_empty() {
                joined.push(suffix);
            }
            joined.join("_")
        }
    };
    Some(name)
}

fn split_words(segment: &str) -> Vec<String> {
    segment
        .split(['-', '_', '.', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// `Logger` -> `logger`, `AppLog` -> `app_log`.
fn snake_case(word: &str) -> String {
    let mut out = String::new();
    for (i, c) in word.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out.trim_matches('_').to_string()
}

fn unique_name(base: String, declared: &HashSet<String>) -> String {
    if !declared.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !declared.contains(candidate))
        .unwrap_or(base)
}

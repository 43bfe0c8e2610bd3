use crate::error::{DriverError, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Parameter name to the literal right-hand side of its assignment,
/// in source order.
pub type ParamMap = IndexMap<String, String>;

/// Matches assignments like `syn_args.params[Synapse::g_max] = 0.015;`.
fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\w+\.params\[\w+::(\w+)\]\s*=\s*([^;]+);").expect("pattern is well-formed")
    })
}

/// Extract parameter assignments from simulator source text.
///
/// The values are the literal source expressions, untrimmed of anything but
/// surrounding whitespace. Nothing is evaluated: a value of `0.5 * g_max`
/// stays exactly that, and constants defined elsewhere are not resolved.
/// No matches is an empty map, never an error.
pub fn scrape_params(source: &str) -> ParamMap {
    let mut params = ParamMap::new();
    for cap in assignment_pattern().captures_iter(source) {
        params.insert(cap[1].to_string(), cap[2].trim().to_string());
    }
    params
}

/// Read a source file and scrape it. A missing file is fatal.
pub fn scrape_params_file(path: &Path) -> Result<ParamMap> {
    if !path.is_file() {
        return Err(DriverError::SourceNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(scrape_params(&content))
}

/// Locate `file_name` anywhere under `root`.
///
/// The simulator checkout layout is not ours to dictate, so the source is
/// searched for rather than addressed by a fixed relative path.
pub fn find_source(root: &Path, file_name: &str) -> Result<PathBuf> {
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && entry.file_name().to_str() == Some(file_name) {
            return Ok(entry.path().to_path_buf());
        }
    }
    Err(DriverError::SourceNotFound(root.join(file_name)))
}

/// Build the file-name suffix from scraped parameters.
///
/// Tokens are `key` immediately followed by its literal value, joined with
/// `_`, in the order of `keys`. When none of the tracked keys were scraped
/// the suffix is `"default"`.
pub fn build_suffix(params: &ParamMap, keys: &[String]) -> String {
    let parts: Vec<String> = keys
        .iter()
        .filter_map(|k| params.get(k).map(|v| format!("{}{}", k, v)))
        .collect();

    if parts.is_empty() {
        "default".to_string()
    } else {
        parts.join("_")
    }
}

/// Build the human-readable chart title, `key=value` pairs joined by `, `.
/// Empty when none of the tracked keys were scraped.
pub fn build_title(params: &ParamMap, keys: &[String]) -> String {
    let parts: Vec<String> = keys
        .iter()
        .filter_map(|k| params.get(k).map(|v| format!("{}={}", k, v)))
        .collect();

    parts.join(", ")
}

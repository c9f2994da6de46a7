use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for target-language resolution
///
/// Requested target languages are matched against the configured allow-list
/// either by English name or by ISO 639-1 / ISO 639-2 code.
/// Map ISO 639-2/B codes to their ISO 639-2/T equivalent
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    let part2t = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(part2t)
}

/// Look up a language from an ISO 639-1 or ISO 639-2 code
pub fn language_from_code(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => {
            let part2t = bibliographic_to_terminology(&normalized_code).unwrap_or(&normalized_code);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    language_from_code(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Check whether a requested language (name or code) denotes the same language as `allowed`
pub fn language_matches(requested: &str, allowed: &str) -> bool {
    let requested = requested.trim();
    let allowed = allowed.trim();

    if requested.is_empty() || allowed.is_empty() {
        return false;
    }

    if requested.eq_ignore_ascii_case(allowed) {
        return true;
    }

    let requested_name = language_from_code(requested).map(|l| l.to_name().to_lowercase());
    let allowed_name = language_from_code(allowed).map(|l| l.to_name().to_lowercase());

    match (requested_name, allowed_name) {
        (Some(r), Some(a)) => r == a,
        (Some(r), None) => r == allowed.to_lowercase(),
        (None, Some(a)) => a == requested.to_lowercase(),
        (None, None) => false,
    }
}

/// Resolve a requested target language against the allow-list.
///
/// Returns the allow-list entry as configured, so prompts and output names
/// always use the canonical spelling.
pub fn resolve_target_language(requested: &str, allowed: &[String]) -> Result<String> {
    allowed.iter()
        .find(|candidate| language_matches(requested, candidate))
        .cloned()
        .ok_or_else(|| anyhow!(
            "Unsupported target language '{}'. Allowed: {}",
            requested,
            allowed.join(", ")
        ))
}

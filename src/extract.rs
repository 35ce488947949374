use regex::RegexBuilder;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("invalid pattern `{pattern}`")]
pub struct ExtractError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// First capture group of the first match of `pattern` in `text`.
///
/// `.` also matches newlines, so a pattern can span a tag broken over several
/// lines. A pattern without a capture group (or whose group did not take part
/// in the match) yields `None`, same as no match at all.
pub fn extract(text: &str, pattern: &str) -> Result<Option<String>, ExtractError> {
    let re = RegexBuilder::new(pattern)
        .dot_matches_new_line(true)
        .build()
        .map_err(|source| ExtractError {
            pattern: pattern.to_string(),
            source,
        })?;

    Ok(re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string()))
}

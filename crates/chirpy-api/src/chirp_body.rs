//! Chirp body rules: length limit and profanity masking

use thiserror::Error;

/// Longest accepted chirp, in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChirpBodyError {
    #[error("Chirp is too long")]
    TooLong,
}

/// Check the length limit and return the masked body
pub fn validate_chirp(body: &str) -> Result<String, ChirpBodyError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ChirpBodyError::TooLong);
    }

    Ok(clean_body(body))
}

/// Replace profane words with `****`
///
/// Words are split on single spaces and compared case-insensitively. A word
/// with attached punctuation (`Sharbert!`) is left alone, and the existing
/// spacing is preserved.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

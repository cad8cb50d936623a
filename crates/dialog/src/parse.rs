//! Input grammars for flow continuations.
//!
//! A record is exactly five comma-separated fields. Embedded commas in free
//! text cannot be escaped — a literal constraint inherited from the delimited
//! submission format; such input simply fails the field count and re-prompts.
//! An index list is comma-separated 1-based integers.

use ordbok_core::record::VerbEntry;

/// Parse a five-field record line. Fields are trimmed; the count must be
/// exactly five.
pub fn record(text: &str) -> Option<VerbEntry> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    match fields.as_slice() {
        [infinitive, present, past, past_participle, translation] => Some(VerbEntry::new(
            *infinitive,
            *present,
            *past,
            *past_participle,
            *translation,
        )),
        _ => None,
    }
}

/// Parse a comma-separated list of 1-based row numbers into 0-based indices.
pub fn indices(text: &str) -> Option<Vec<usize>> {
    text.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
        })
        .collect()
}

/// Parse a single 1-based row number into a 0-based index.
pub fn index(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1))
}

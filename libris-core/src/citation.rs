//! Citation keys for catalog records.
//!
//! The key is meant for humans reading logs and answers. It combines the family name of the
//! primary creator, the first three words of the title and the date, and always ends with the
//! source key so that two papers never share a citation key, whatever the quality of their
//! metadata.
use crate::record::CatalogRecord;

/// Number of title words that end up in the key.
const SHORT_TITLE_WORDS: usize = 3;

/// Derives a citation key for a record.
///
/// Falls back to the raw source key if the record has no creators, the first creator has no
/// family name, or the record has no title or date.
///
/// # Example
///
/// ```
/// # use libris_core::{citation::citation_key, CatalogRecord, Creator};
/// let record = CatalogRecord::builder()
///     .key("ABCD1234")
///     .title("Attention Is All You Need")
///     .creators(vec![Creator::new("Vaswani", "Ashish")])
///     .date("2017-06-12")
///     .build()
///     .unwrap();
///
/// assert_eq!(citation_key(&record), "Vaswani_AttentionIsAll_20170612_ABCD1234");
/// ```
pub fn citation_key(record: &CatalogRecord) -> String {
    let Some(family_name) = record
        .creators
        .first()
        .and_then(|creator| creator.family_name.as_deref())
    else {
        return record.key.clone();
    };
    let (Some(title), Some(date)) = (record.title.as_deref(), record.date.as_deref()) else {
        return record.key.clone();
    };

    let short_title = title
        .split_whitespace()
        .take(SHORT_TITLE_WORDS)
        .collect::<String>();

    format!(
        "{}_{}_{}_{}",
        alphanumeric(family_name),
        alphanumeric(&short_title),
        alphanumeric(date),
        record.key
    )
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect()
}

fn alphanumeric(value: &str) -> String {
    value.chars().filter(|c| c.is_alphanumeric()).collect()
}

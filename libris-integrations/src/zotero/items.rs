//! Mapping of Zotero item json onto catalog records
use anyhow::{Context as _, Result};
use serde::Deserialize;

use libris_core::{Attachment, CatalogRecord, Creator};

#[derive(Debug, Deserialize)]
struct Item {
    key: String,
    #[serde(default)]
    links: ItemLinks,
    #[serde(default)]
    data: ItemData,
}

#[derive(Debug, Default, Deserialize)]
struct ItemLinks {
    attachment: Option<LinkedAttachment>,
}

/// The best attachment of an item, as linked by the api
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedAttachment {
    href: String,
    attachment_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemData {
    title: Option<String>,
    #[serde(default)]
    creators: Vec<ItemCreator>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemCreator {
    #[serde(default)]
    creator_type: String,
    last_name: Option<String>,
    first_name: Option<String>,
    name: Option<String>,
}

impl From<ItemCreator> for Creator {
    fn from(creator: ItemCreator) -> Self {
        Creator {
            creator_type: creator.creator_type,
            family_name: creator.last_name,
            given_name: creator.first_name,
            name: creator.name,
        }
    }
}

impl From<LinkedAttachment> for Attachment {
    fn from(linked: LinkedAttachment) -> Self {
        let key = linked
            .href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Attachment {
            key,
            href: Some(linked.href),
            content_type: linked.attachment_type,
        }
    }
}

/// Converts a raw Zotero item into a [`CatalogRecord`], keeping the raw json around
///
/// # Errors
///
/// Errors if the item has no key
pub fn record_from_item(raw: serde_json::Value) -> Result<CatalogRecord> {
    let item: Item =
        serde_json::from_value(raw.clone()).context("Zotero item is missing its key")?;

    Ok(CatalogRecord {
        key: item.key,
        title: item.data.title,
        creators: item.data.creators.into_iter().map(Into::into).collect(),
        date: item.data.date,
        attachments: item.links.attachment.into_iter().map(Into::into).collect(),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::citation::citation_key;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_full_item() {
        let raw = json!({
            "key": "ABCD2345",
            "version": 12,
            "links": {
                "self": {"href": "https://api.zotero.org/users/1/items/ABCD2345"},
                "attachment": {
                    "href": "https://api.zotero.org/users/1/items/PDFK1234",
                    "type": "application/json",
                    "attachmentType": "application/pdf",
                    "attachmentSize": 1234
                }
            },
            "data": {
                "key": "ABCD2345",
                "itemType": "journalArticle",
                "title": "Attention Is All You Need",
                "creators": [
                    {"creatorType": "author", "firstName": "Ashish", "lastName": "Vaswani"},
                    {"creatorType": "author", "name": "Google Brain"}
                ],
                "date": "2017-06-12"
            }
        });

        let record = record_from_item(raw.clone()).unwrap();

        assert_eq!(record.key, "ABCD2345");
        assert_eq!(record.title.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(record.creators[0], Creator::new("Vaswani", "Ashish"));
        assert_eq!(record.creators[1], Creator::single_field("Google Brain"));
        assert_eq!(record.pdf_attachment().unwrap().key, "PDFK1234");
        assert_eq!(record.raw, raw);
        assert_eq!(
            citation_key(&record),
            "Vaswani_AttentionIsAll_20170612_ABCD2345"
        );
    }

    #[test]
    fn test_item_without_data_falls_back_to_key() {
        let record = record_from_item(json!({"key": "ABCD2345"})).unwrap();

        assert!(record.title.is_none());
        assert!(record.attachments.is_empty());
        assert_eq!(citation_key(&record), "ABCD2345");
    }

    #[test]
    fn test_non_pdf_attachment_is_not_a_pdf() {
        let record = record_from_item(json!({
            "key": "ABCD2345",
            "links": {"attachment": {
                "href": "https://api.zotero.org/users/1/items/SNAP1234",
                "attachmentType": "text/html"
            }}
        }))
        .unwrap();

        assert_eq!(record.attachments.len(), 1);
        assert!(record.pdf_attachment().is_none());
    }

    #[test]
    fn test_item_without_key_is_an_error() {
        assert!(record_from_item(json!({"data": {"title": "No key"}})).is_err());
    }
}

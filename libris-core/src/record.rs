//! Records as they come out of a remote reference library.
//!
//! A [`CatalogRecord`] is read-only. It is produced by a
//! [`ReferenceLibrary`][crate::ReferenceLibrary] listing and never mutated by the pipeline; the
//! raw item is kept around as an opaque passthrough so that downstream consumers can reach
//! fields this crate does not model.
use std::fmt::Debug;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// A single item in the remote library.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Builder)]
#[builder(setter(into, strip_option), build_fn(error = "anyhow::Error"))]
pub struct CatalogRecord {
    /// Stable identifier of the item in the source system.
    pub key: String,
    /// Title of the item. `None` when the source does not carry a title field at all.
    #[builder(default)]
    pub title: Option<String>,
    /// Ordered creators, the first one is the primary creator.
    #[builder(default)]
    pub creators: Vec<Creator>,
    /// Publication date as the source reports it. Free form.
    #[builder(default)]
    pub date: Option<String>,
    /// File attachments known for this item.
    #[builder(default)]
    pub attachments: Vec<Attachment>,
    /// The raw item as returned by the source.
    #[builder(default)]
    pub raw: serde_json::Value,
}

impl CatalogRecord {
    pub fn builder() -> CatalogRecordBuilder {
        CatalogRecordBuilder::default()
    }

    /// Title for display purposes; empty when the item has none.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// The first attachment that claims to be a pdf
    pub fn pdf_attachment(&self) -> Option<&Attachment> {
        self.attachments.iter().find(|attachment| attachment.is_pdf())
    }
}

impl Debug for CatalogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogRecord")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("creators", &self.creators)
            .field("date", &self.date)
            .field("attachments", &self.attachments)
            .finish()
    }
}

/// A creator (author, editor, ...) of a record.
///
/// Sources either split the name into a family and given name, or provide a single `name`
/// field (typical for institutions).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Creator {
    #[serde(default)]
    pub creator_type: String,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Creator {
    pub fn new(family_name: impl Into<String>, given_name: impl Into<String>) -> Self {
        Creator {
            creator_type: "author".to_string(),
            family_name: Some(family_name.into()),
            given_name: Some(given_name.into()),
            name: None,
        }
    }

    /// A creator that only has a single name field
    pub fn single_field(name: impl Into<String>) -> Self {
        Creator {
            creator_type: "author".to_string(),
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file attached to a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    /// Identifier of the attachment in the source system
    pub key: String,
    /// Where the file can be fetched from, if the source tells us
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn pdf(key: impl Into<String>) -> Self {
        Attachment {
            key: key.into(),
            href: None,
            content_type: Some(PDF_CONTENT_TYPE.to_string()),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some(PDF_CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let record = CatalogRecord::builder().key("ABCD1234").build().unwrap();

        assert_eq!(record.key, "ABCD1234");
        assert!(record.title.is_none());
        assert!(record.creators.is_empty());
        assert!(record.pdf_attachment().is_none());
        assert_eq!(record.display_title(), "");
    }

    #[test]
    fn test_pdf_attachment_skips_other_content_types() {
        let record = CatalogRecord::builder()
            .key("ABCD1234")
            .attachments(vec![
                Attachment {
                    key: "HTML0001".into(),
                    href: None,
                    content_type: Some("text/html".into()),
                },
                Attachment::pdf("PDF00001"),
            ])
            .build()
            .unwrap();

        assert_eq!(record.pdf_attachment().unwrap().key, "PDF00001");
    }
}

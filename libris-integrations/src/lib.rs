// show feature flags in the generated documentation
// https://doc.rust-lang.org/rustdoc/unstable-features.html#extensions-to-the-doc-attribute
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Integrations with the services a library ingestion talks to: the Zotero web api, `OpenAI`,
//! lopdf and tiktoken.

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "tiktoken")]
pub mod tiktoken;
#[cfg(feature = "zotero")]
pub mod zotero;

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use std::path::Path;

use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Async openai config pointing at a mock server
pub fn openai_config(mock_server_uri: &str) -> async_openai::config::OpenAIConfig {
    async_openai::config::OpenAIConfig::new()
        .with_api_base(mock_server_uri)
        .with_api_key("test-key")
}

/// A top level Zotero item as returned by `items/top`
pub fn zotero_item(key: &str, title: &str, pdf_key: Option<&str>) -> Value {
    let mut item = json!({
        "key": key,
        "version": 1,
        "library": {"type": "user", "id": 42},
        "links": {
            "self": {"href": format!("https://api.zotero.org/users/42/items/{key}")}
        },
        "data": {
            "key": key,
            "itemType": "journalArticle",
            "title": title,
            "creators": [{"creatorType": "author", "firstName": "Jane", "lastName": "Doe"}],
            "date": "2021-03-01"
        }
    });

    if let Some(pdf_key) = pdf_key {
        item["links"]["attachment"] = json!({
            "href": format!("https://api.zotero.org/users/42/items/{pdf_key}"),
            "type": "application/json",
            "attachmentType": "application/pdf"
        });
    }

    item
}

/// Mounts a collections listing under `prefix` (e.g. `/users/42`).
///
/// The first page holds all `collections` as `(key, name)`, every later page is empty.
pub async fn mock_zotero_collections(
    mock_server: &MockServer,
    prefix: &str,
    collections: &[(&str, &str)],
) {
    let page = collections
        .iter()
        .map(|(key, name)| json!({"key": key, "data": {"key": key, "name": name}}))
        .collect::<Vec<_>>();

    Mock::given(method("GET"))
        .and(path(format!("{prefix}/collections")))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(page)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{prefix}/collections")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

/// Responds to embedding requests with one vector per input.
///
/// Each vector has one dimension per keyword, set when the input mentions it, plus a constant
/// dimension so no vector is all zeros. Inputs sharing keywords end up close to each other.
#[derive(Debug, Clone)]
pub struct KeywordEmbeddings {
    keywords: Vec<String>,
}

impl KeywordEmbeddings {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn vector(&self, input: &str) -> Vec<f32> {
        let input = input.to_lowercase();
        let mut vector = self
            .keywords
            .iter()
            .map(|keyword| if input.contains(keyword) { 1.0 } else { 0.0 })
            .collect::<Vec<f32>>();
        vector.push(0.1);
        vector
    }
}

impl Respond for KeywordEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let inputs = match &body["input"] {
            Value::String(input) => vec![input.clone()],
            Value::Array(inputs) => inputs
                .iter()
                .map(|input| input.as_str().unwrap().to_string())
                .collect(),
            other => panic!("Unexpected embedding input {other}"),
        };

        // Reversed to make sure callers order by index
        let data = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(index, input)| {
                json!({
                    "object": "embedding",
                    "embedding": self.vector(input),
                    "index": index
                })
            })
            .collect::<Vec<_>>();

        ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
            "model": body["model"],
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }))
    }
}

/// Mounts an embeddings endpoint answering with [`KeywordEmbeddings`]
pub async fn mock_embeddings(mock_server: &MockServer, keywords: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(KeywordEmbeddings::new(keywords))
        .mount(mock_server)
        .await;
}

pub async fn mock_chat_completions(mock_server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_677_652_288,
            "model": "gpt-4o-mini",
            "system_fingerprint": "fp_44709d6fcb",
            "choices": [{
              "index": 0,
              "message": {
                "role": "assistant",
                "content": content,
              },
              "logprobs": null,
              "finish_reason": "stop"
            }],
            "usage": {
              "prompt_tokens": 9,
              "completion_tokens": 12,
              "total_tokens": 21
            }
        })))
        .mount(mock_server)
        .await;
}

/// An openai style error body
pub fn openai_error(message: &str, kind: &str, code: Option<&str>) -> Value {
    json!({
        "error": {
            "message": message,
            "type": kind,
            "param": null,
            "code": code
        }
    })
}

/// Writes a pdf with one page per entry of `pages`, each page holding its text on a single line
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let page_ids = pages
        .iter()
        .map(|text| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
        })
        .collect::<Vec<_>>();

    let page_count = i64::try_from(page_ids.len()).unwrap();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.into_iter().map(Object::from).collect::<Vec<_>>(),
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

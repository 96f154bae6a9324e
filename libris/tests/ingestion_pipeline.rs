//! Runs the whole pipeline against a mocked Zotero and `OpenAI`, with real pdfs, real text
//! extraction and real token counting.

use libris::{
    ingest::{PipelineController, StopReason},
    integrations::{openai::OpenAI, pdf::LopdfText, tiktoken::TikToken, zotero::Zotero},
};
use libris_core::test_utils::CollectingReporter;
use libris_test_utils::{
    mock_chat_completions, mock_embeddings, openai_config, write_pdf, zotero_item,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use temp_dir::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_zotero(server: &MockServer, fixtures: &TempDir) {
    Mock::given(method("GET"))
        .and(path("/users/42/items/top"))
        .and(query_param("limit", "1"))
        .and(query_param_is_missing("start"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Total-Results", "3")
                .set_body_json(json!([zotero_item(
                    "ITEM0001",
                    "Attention is all you need",
                    Some("PDF00001")
                )])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/42/items/top"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            zotero_item("ITEM0001", "Attention is all you need", Some("PDF00001")),
            zotero_item("ITEM0002", "Notes without a file", None),
            zotero_item("ITEM0003", "Protein structure prediction", Some("PDF00003")),
        ])))
        .mount(server)
        .await;

    for (key, text) in [
        ("PDF00001", "Attention relates every position of a sequence"),
        ("PDF00003", "Protein structures are predicted from sequences"),
    ] {
        let pdf = fixtures.child(format!("{key}.pdf"));
        write_pdf(&pdf, &[text]);

        Mock::given(method("GET"))
            .and(path(format!("/users/42/items/{key}/file")))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(std::fs::read(&pdf).unwrap()),
            )
            .mount(server)
            .await;
    }
}

fn controller(
    server: &MockServer,
    data: &TempDir,
    reporter: &CollectingReporter,
) -> PipelineController {
    let zotero = Zotero::builder()
        .library_id("42")
        .api_key("zotero-key")
        .base_url(server.uri())
        .storage_dir(data.child("pdfs"))
        .build()
        .unwrap();
    let openai = OpenAI::builder()
        .client(async_openai::Client::with_config(openai_config(&server.uri())))
        .build()
        .unwrap();

    PipelineController::builder()
        .library(zotero)
        .engine(openai)
        .pdf_text(LopdfText)
        .token_counter(TikToken::default())
        .reporter(reporter.clone())
        .model("gpt-4o-mini")
        .data_dir(data.child("processed"))
        .build()
        .unwrap()
}

async fn requests_to(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == endpoint)
        .count()
}

#[test_log::test(tokio::test)]
async fn test_ingest_resume_and_ask() {
    let server = MockServer::start().await;
    let fixtures = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    mock_zotero(&server, &fixtures).await;
    mock_embeddings(&server, &["attention", "protein"]).await;
    mock_chat_completions(&server, "Attention relates positions.").await;

    let reporter = CollectingReporter::new();
    let first_run = controller(&server, &data, &reporter);

    let mut corpus = first_run.open().await.unwrap();
    let report = first_run.embed(&mut corpus, 10, 0).await.unwrap();

    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(report.papers, 2);
    assert_eq!(report.embedded, 2);
    assert_eq!(
        corpus.document_names().collect::<Vec<_>>(),
        vec!["ITEM0001", "ITEM0003"]
    );
    assert!(
        data.child("processed")
            .join("paper_qa_gpt_4o_mini.json")
            .exists()
    );
    assert!(reporter.messages().contains(
        &"Skipping paper 'Notes without a file' as it has no associated PDF.".to_string()
    ));

    let answer = first_run
        .ask(&corpus, "How does attention work?")
        .await
        .unwrap();
    assert!(answer.starts_with("Attention relates positions."));
    assert!(answer.contains("References\n\n1. Doe_Attentionisall_20210301_ITEM0001"));

    // A second run resumes from the checkpoint and embeds nothing new
    let embeddings_before = requests_to(&server, "/embeddings").await;
    let downloads_before = requests_to(&server, "/users/42/items/PDF00001/file").await;

    let second_run = controller(&server, &data, &CollectingReporter::new());
    let mut resumed = second_run.open().await.unwrap();
    assert_eq!(resumed.len(), 2);

    let report = second_run.embed(&mut resumed, 10, 0).await.unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(report.embedded, 0);
    assert_eq!(requests_to(&server, "/embeddings").await, embeddings_before);
    assert_eq!(
        requests_to(&server, "/users/42/items/PDF00001/file").await,
        downloads_before
    );
}

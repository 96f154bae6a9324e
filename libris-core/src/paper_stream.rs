//! This module defines the `PaperStream` type, the lazy sequence of papers handed from the
//! paginator to the embedding driver.

use crate::paper::IngestPaper;
use anyhow::Result;
use futures_util::{Stream, StreamExt as _};
use std::pin::Pin;

/// An asynchronous, pull based stream of `IngestPaper` items.
///
/// Wraps an internal stream of `Result<IngestPaper>` items. Nothing is fetched until the stream
/// is polled.
#[pin_project::pin_project]
pub struct PaperStream {
    #[pin]
    pub(crate) inner: Pin<Box<dyn Stream<Item = Result<IngestPaper>> + Send>>,
}

impl Stream for PaperStream {
    type Item = Result<IngestPaper>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.project();
        this.inner.poll_next(cx)
    }
}

impl PaperStream {
    /// Wraps any sendable stream of papers
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<IngestPaper>> + Send + 'static,
    {
        PaperStream {
            inner: stream.boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt as _;

    fn paper(index: usize) -> IngestPaper {
        let key = format!("KEY{index:05}");
        IngestPaper::builder()
            .citation_key(format!("Doe_Paper_2021_{key}"))
            .pdf(format!("/pdfs/{key}.pdf"))
            .source_key(key)
            .build()
            .unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn test_yields_in_order_and_keeps_errors() {
        let stream = PaperStream::from_stream(futures_util::stream::iter(vec![
            Ok(paper(1)),
            Err(anyhow::anyhow!("listing failed")),
            Ok(paper(2)),
        ]));

        let items = stream.collect::<Vec<_>>().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().document_name(), "KEY00001");
        assert!(items[1].is_err());
        assert_eq!(items[2].as_ref().unwrap().document_name(), "KEY00002");
    }

    #[test_log::test(tokio::test)]
    async fn test_nothing_runs_until_polled() {
        let polled = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = polled.clone();
        let mut stream = PaperStream::from_stream(futures_util::stream::once(async move {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, anyhow::Error>(paper(1))
        }));

        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
        assert!(stream.next().await.is_some());
        assert!(polled.load(std::sync::atomic::Ordering::SeqCst));
        assert!(stream.next().await.is_none());
    }
}

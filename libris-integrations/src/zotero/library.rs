use std::path::PathBuf;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;

use libris_core::{CatalogRecord, ListQuery, ReferenceLibrary};

use super::{COLLECTIONS_PAGE_SIZE, Zotero, items::record_from_item};

const TOTAL_RESULTS_HEADER: &str = "Total-Results";

#[derive(Debug, Deserialize)]
struct Collection {
    key: String,
    data: CollectionData,
}

#[derive(Debug, Deserialize)]
struct CollectionData {
    name: String,
}

impl Zotero {
    /// Looks up the key of a collection by its name, caching every collection seen on the way
    async fn collection_key(&self, name: &str) -> Result<String> {
        let mut collections = self.collections.lock().await;
        if let Some(key) = collections.get(name) {
            return Ok(key.clone());
        }

        let mut start = 0;
        loop {
            let page: Vec<Collection> = self
                .get("collections")
                .query(&[
                    ("format", "json".to_string()),
                    ("limit", COLLECTIONS_PAGE_SIZE.to_string()),
                    ("start", start.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
                .context("Failed to parse collections")?;

            if page.is_empty() {
                anyhow::bail!("Collection '{name}' not found in the library");
            }

            start += page.len();
            for collection in page {
                collections.insert(collection.data.name, collection.key);
            }

            if let Some(key) = collections.get(name) {
                return Ok(key.clone());
            }
        }
    }

    fn pdf_path(&self, attachment_key: &str) -> PathBuf {
        self.storage_dir.join(format!("{attachment_key}.pdf"))
    }
}

#[async_trait]
impl ReferenceLibrary for Zotero {
    #[tracing::instrument(skip_all, fields(limit = limit, start = start), err)]
    async fn list_top_items(
        &self,
        query: &ListQuery,
        limit: usize,
        start: usize,
    ) -> Result<Vec<CatalogRecord>> {
        let path = match &query.collection {
            Some(name) => format!("collections/{}/items/top", self.collection_key(name).await?),
            None => "items/top".to_string(),
        };

        let mut params = vec![
            ("format", "json".to_string()),
            ("limit", limit.to_string()),
            ("start", start.to_string()),
        ];
        params.extend(query.search_params());

        let items: Vec<serde_json::Value> = self
            .get(&path)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse items")?;

        tracing::debug!(items = items.len(), "Listed top items");

        items.into_iter().map(record_from_item).collect()
    }

    #[tracing::instrument(skip_all, err)]
    async fn count_items(&self) -> Result<usize> {
        let response = self
            .get("items/top")
            .query(&[("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;

        response
            .headers()
            .get(TOTAL_RESULTS_HEADER)
            .context("Response has no Total-Results header")?
            .to_str()?
            .trim()
            .parse()
            .context("Total-Results is not a number")
    }

    #[tracing::instrument(skip_all, fields(key = %record.key), err)]
    async fn resolve_pdf(&self, record: &CatalogRecord) -> Result<Option<PathBuf>> {
        let Some(attachment) = record.pdf_attachment() else {
            return Ok(None);
        };

        let path = self.pdf_path(&attachment.key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Pdf already downloaded");
            return Ok(Some(path));
        }

        let bytes = self
            .get(&format!("items/{}/file", attachment.key))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        // Only complete downloads land on the cached path
        let partial = path.with_extension("pdf.tmp");
        fs_err::tokio::create_dir_all(&self.storage_dir).await?;
        fs_err::tokio::write(&partial, &bytes).await?;
        fs_err::tokio::rename(&partial, &path).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Downloaded pdf");

        Ok(Some(path))
    }
}

//! Filters and ordering for listing a reference library.
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Direction to sort a listing in
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// What a quick search matches against
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum QuickSearchMode {
    /// Titles, creators and years
    TitleCreatorYear,
    /// All fields, including full text
    Everything,
}

/// Filters and ordering applied to every page request of a listing.
///
/// A collection cannot be combined with any of the search filters; the builder refuses to build
/// such a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(
    setter(into, strip_option),
    default,
    build_fn(error = "anyhow::Error", validate = "Self::validate")
)]
pub struct ListQuery {
    /// Quick search text
    pub q: Option<String>,
    pub qmode: Option<QuickSearchMode>,
    /// Only items modified after this library version
    pub since: Option<String>,
    /// Tag search, `AND` / `OR` combinations are passed through as is
    pub tag: Option<String>,
    /// Field to sort by, e.g. `dateAdded`, `title` or `creator`
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
    /// Restrict the listing to a named collection
    pub collection: Option<String>,
}

impl ListQuery {
    pub fn builder() -> ListQueryBuilder {
        ListQueryBuilder::default()
    }

    /// True if any search filter, sort or direction is set
    pub fn has_search_filters(&self) -> bool {
        self.q.is_some()
            || self.qmode.is_some()
            || self.since.is_some()
            || self.tag.is_some()
            || self.sort.is_some()
            || self.direction.is_some()
    }

    /// Search parameters as key value pairs, in a stable order.
    ///
    /// Does not include the collection.
    pub fn search_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(q) = &self.q {
            params.push(("q", q.clone()));
        }
        if let Some(qmode) = self.qmode {
            params.push(("qmode", qmode.to_string()));
        }
        if let Some(since) = &self.since {
            params.push(("since", since.clone()));
        }
        if let Some(tag) = &self.tag {
            params.push(("tag", tag.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(direction) = self.direction {
            params.push(("direction", direction.to_string()));
        }

        params
    }

    /// # Errors
    ///
    /// Errors if a collection is combined with search filters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.collection.is_some() && self.has_search_filters() {
            anyhow::bail!("A collection cannot be combined with a search query");
        }
        Ok(())
    }
}

impl ListQueryBuilder {
    fn validate(&self) -> anyhow::Result<()> {
        let has_collection = matches!(self.collection, Some(Some(_)));
        let has_filters = [
            self.q.as_ref().is_some_and(Option::is_some),
            self.qmode.as_ref().is_some_and(Option::is_some),
            self.since.as_ref().is_some_and(Option::is_some),
            self.tag.as_ref().is_some_and(Option::is_some),
            self.sort.as_ref().is_some_and(Option::is_some),
            self.direction.as_ref().is_some_and(Option::is_some),
        ]
        .into_iter()
        .any(|set| set);

        if has_collection && has_filters {
            anyhow::bail!("A collection cannot be combined with a search query");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_in_stable_order() {
        let query = ListQuery::builder()
            .direction(SortDirection::Desc)
            .sort("dateAdded")
            .q("transformer")
            .qmode(QuickSearchMode::TitleCreatorYear)
            .build()
            .unwrap();

        assert_eq!(
            query.search_params(),
            vec![
                ("q", "transformer".to_string()),
                ("qmode", "titleCreatorYear".to_string()),
                ("sort", "dateAdded".to_string()),
                ("direction", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_collection_with_search_is_rejected() {
        let result = ListQuery::builder()
            .collection("Reading list")
            .tag("ml")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_collection_alone_is_fine() {
        let query = ListQuery::builder().collection("Reading list").build().unwrap();

        assert!(!query.has_search_filters());
        assert!(query.search_params().is_empty());
        assert!(query.validate().is_ok());
    }
}

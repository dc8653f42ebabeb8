//! Recent-search history, read back from persisted search records.

use anyhow::Result;

use crate::models::SearchQueryRecord;
use crate::store::{EntityStore, ListOptions};

/// Number of recent searches shown by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// The `limit` most recent search records, newest first.
pub async fn recent_searches<S>(store: &S, limit: usize) -> Result<Vec<SearchQueryRecord>>
where
    S: EntityStore + ?Sized,
{
    store
        .list_search_queries(ListOptions::newest_first().with_limit(limit))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchFilters;
    use crate::models::SearchType;
    use crate::search::{run, SearchRequest};
    use crate::store::memory::InMemoryStore;
    use crate::testing::ScriptedAi;

    #[tokio::test]
    async fn test_history_capped_and_newest_first() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![]);
        let filters = SearchFilters::default();

        for q in ["a1", "a2", "a3", "a4", "a5", "a6", "a7"] {
            let req = SearchRequest {
                query: q,
                search_type: SearchType::Keyword,
                filters: &filters,
            };
            run(&store, &ai, &req).await.unwrap();
        }

        let recent = recent_searches(&store, DEFAULT_HISTORY_LIMIT).await.unwrap();
        let texts: Vec<&str> = recent.iter().map(|r| r.query_text.as_str()).collect();
        assert_eq!(texts, vec!["a7", "a6", "a5", "a4", "a3"]);
    }
}

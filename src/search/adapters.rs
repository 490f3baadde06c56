//! Domain adapters: named retrieval presets for each business area
//!
//! Every adapter owns its own collection in the index, so building or
//! querying one never touches another's entries.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::backend::{Query, SearchResult};
use super::embedding::EmbeddingBackend;
use super::retriever::Retriever;
use super::vectordb::VectorStore;
use crate::config::Settings;
use crate::core::catalog::DocumentSource;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Whole catalogue, no default filters
    General,
    /// Finance policies
    Policy,
    /// Supplier contracts and procurement documents
    Contracts,
    Incidents,
    /// Business glossary and metric definitions
    Definitions,
    /// Sales procedures and CRM documentation
    Sales,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 6] = [
        AdapterKind::General,
        AdapterKind::Policy,
        AdapterKind::Contracts,
        AdapterKind::Incidents,
        AdapterKind::Definitions,
        AdapterKind::Sales,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Policy => "policy",
            Self::Contracts => "contracts",
            Self::Incidents => "incidents",
            Self::Definitions => "definitions",
            Self::Sales => "sales",
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            Self::General => "main_documents",
            Self::Policy => "policy_documents",
            Self::Contracts => "contract_documents",
            Self::Incidents => "incident_documents",
            Self::Definitions => "definition_documents",
            Self::Sales => "sales_documents",
        }
    }

    pub fn default_module(&self) -> Option<&'static str> {
        match self {
            Self::Contracts => Some("inventory"),
            Self::Sales => Some("sales"),
            _ => None,
        }
    }

    /// Comma-separated tags every result must carry
    pub fn default_tags(&self) -> Option<&'static str> {
        match self {
            Self::Policy => Some("policy"),
            Self::Contracts => Some("contracts"),
            Self::Incidents => Some("incidents"),
            Self::Definitions => Some("glossary,metrics"),
            Self::General | Self::Sales => None,
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                format!("unknown adapter '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// A retriever bound to one adapter's collection and default filters
pub struct DomainAdapter {
    kind: AdapterKind,
    retriever: Retriever,
    default_k: usize,
}

impl DomainAdapter {
    pub fn open(
        kind: AdapterKind,
        source: Arc<dyn DocumentSource>,
        settings: &Settings,
        embedder: Box<dyn EmbeddingBackend>,
    ) -> Result<Self> {
        let retriever = Retriever::open(kind.collection(), source, settings, embedder)?;
        Ok(Self::bind(kind, retriever, settings))
    }

    pub fn with_store(
        kind: AdapterKind,
        source: Arc<dyn DocumentSource>,
        store: VectorStore,
        settings: &Settings,
        embedder: Box<dyn EmbeddingBackend>,
    ) -> Result<Self> {
        let retriever = Retriever::with_store(kind.collection(), source, store, settings, embedder)?;
        Ok(Self::bind(kind, retriever, settings))
    }

    fn bind(kind: AdapterKind, retriever: Retriever, settings: &Settings) -> Self {
        Self {
            kind,
            retriever,
            default_k: settings.default_k.max(1),
        }
    }

    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    pub fn collection(&self) -> &str {
        self.retriever.collection()
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn retriever_mut(&mut self) -> &mut Retriever {
        &mut self.retriever
    }

    /// The query this adapter runs for `text`
    pub fn query(&self, text: &str, k: Option<usize>) -> Query {
        let mut query = Query::new(text).with_k(k.unwrap_or(self.default_k));
        if let Some(module) = self.kind.default_module() {
            query = query.with_module(module);
        }
        if let Some(tags) = self.kind.default_tags() {
            query = query.with_tags(tags);
        }
        query
    }

    pub fn search(&self, text: &str, k: Option<usize>) -> Result<Vec<SearchResult>> {
        self.retriever.search(&self.query(text, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::StaticCatalog;
    use crate::core::document::{Document, TagSet};
    use crate::search::embedding::HarmonicEmbedder;
    use std::collections::HashSet;
    use std::path::Path;

    fn business_corpus(dir: &Path) -> Arc<dyn DocumentSource> {
        let rows = [
            (1, "finance", "policy", "Expense policy: meals are reimbursed up to a daily limit."),
            (2, "finance", "policy,refunds", "Refund policy: refunds are issued within 14 days."),
            (3, "inventory", "contracts", "Supplier contract with Acme: delivery within 10 days."),
            (4, "finance", "contracts", "Bank contract covering the credit line."),
            (5, "inventory", "incidents", "Incident: warehouse flooding delayed delivery."),
            (6, "analytics", "glossary,metrics", "Gross margin is revenue minus cost of goods."),
            (7, "analytics", "glossary", "A SKU is a stock keeping unit."),
            (8, "sales", "crm", "Sales calls are logged in the CRM within a day."),
        ];
        let docs = rows
            .iter()
            .map(|(id, module, tags, text)| {
                let path = dir.join(format!("{}.txt", id));
                std::fs::write(&path, text).unwrap();
                Document::new(*id, *module, path, tags)
            })
            .collect();
        Arc::new(StaticCatalog::new(docs))
    }

    fn open_adapter(kind: AdapterKind, source: Arc<dyn DocumentSource>, settings: &Settings) -> DomainAdapter {
        DomainAdapter::open(kind, source, settings, Box::new(HarmonicEmbedder::new())).unwrap()
    }

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in AdapterKind::ALL {
            assert_eq!(kind.name().parse::<AdapterKind>(), Ok(kind));
        }
        assert_eq!(" Policy ".parse::<AdapterKind>(), Ok(AdapterKind::Policy));
        assert!("finance".parse::<AdapterKind>().is_err());
    }

    #[test]
    fn test_collections_are_distinct() {
        let collections: HashSet<&str> = AdapterKind::ALL.iter().map(|k| k.collection()).collect();
        assert_eq!(collections.len(), AdapterKind::ALL.len());
    }

    #[test]
    fn test_default_filters_applied() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            index_path: dir.path().join("index.db"),
            ..Settings::default()
        };
        let source = business_corpus(dir.path());

        let policy = open_adapter(AdapterKind::Policy, Arc::clone(&source), &settings);
        let results = policy.search("refund policy", Some(10))?;
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.tags.contains(&"policy".to_string())));

        let contracts = open_adapter(AdapterKind::Contracts, Arc::clone(&source), &settings);
        let results = contracts.search("contract delivery", Some(10))?;
        let ids: Vec<i64> = results.iter().map(|r| r.doc_id).collect();
        assert_eq!(ids, vec![3]);

        let definitions = open_adapter(AdapterKind::Definitions, Arc::clone(&source), &settings);
        let results = definitions.search("what is gross margin", Some(10))?;
        let ids: Vec<i64> = results.iter().map(|r| r.doc_id).collect();
        assert_eq!(ids, vec![6]);

        let sales = open_adapter(AdapterKind::Sales, source, &settings);
        let results = sales.search("crm calls", None)?;
        assert!(results.iter().all(|r| r.module == "sales"));
        Ok(())
    }

    #[test]
    fn test_query_uses_adapter_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            backend: crate::config::BackendMode::Keyword,
            default_k: 4,
            ..Settings::default()
        };
        let adapter = open_adapter(AdapterKind::Contracts, business_corpus(dir.path()), &settings);

        let query = adapter.query("late delivery", None);
        assert_eq!(query.k, 4);
        assert_eq!(query.module.as_deref(), Some("inventory"));
        assert_eq!(query.tags, Some(TagSet::parse("contracts")));
        assert_eq!(adapter.query("late delivery", Some(1)).k, 1);
    }

    #[test]
    fn test_adapters_do_not_share_collections() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            index_path: dir.path().join("index.db"),
            ..Settings::default()
        };

        let policy_dir = dir.path().join("policy");
        let general_dir = dir.path().join("general");
        std::fs::create_dir_all(&policy_dir).unwrap();
        std::fs::create_dir_all(&general_dir).unwrap();

        let policy_source: Arc<dyn DocumentSource> = Arc::new(StaticCatalog::new(vec![Document::new(
            1,
            "finance",
            {
                let p = policy_dir.join("1.txt");
                std::fs::write(&p, "Overtime policy for warehouse staff.").unwrap();
                p
            },
            "policy",
        )]));
        let general_source: Arc<dyn DocumentSource> = Arc::new(StaticCatalog::new(vec![Document::new(
            2,
            "sales",
            {
                let p = general_dir.join("2.txt");
                std::fs::write(&p, "Quarterly sales review notes.").unwrap();
                p
            },
            "",
        )]));

        let policy = open_adapter(AdapterKind::Policy, policy_source, &settings);
        let general = open_adapter(AdapterKind::General, general_source, &settings);

        assert_eq!(policy.retriever().active_backend(), "vector");
        assert_eq!(policy.retriever().entry_count()?, 1);
        assert_eq!(general.retriever().entry_count()?, 1);

        let results = general.search("overtime policy warehouse", Some(5))?;
        assert!(results.iter().all(|r| r.doc_id == 2));

        let store = VectorStore::open(&settings.index_path)?;
        assert_eq!(store.collections()?, vec!["main_documents", "policy_documents"]);
        Ok(())
    }
}

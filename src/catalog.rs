use crate::models::template::ItemTemplate;
use crate::models::types::TemplateId;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only lookup into the static item template table. The engine never
/// mutates templates; content loading builds the catalog once at startup.
pub trait TemplateCatalog: Send + Sync {
    fn lookup(&self, id: TemplateId) -> Option<Arc<ItemTemplate>>;
}

/// Catalog backed by a plain map, built once and then immutable.
pub struct StaticCatalog {
    templates: HashMap<TemplateId, Arc<ItemTemplate>>,
}

impl StaticCatalog {
    pub fn new<I>(templates: I) -> Self
    where
        I: IntoIterator<Item = ItemTemplate>,
    {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.id, Arc::new(t)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateCatalog for StaticCatalog {
    fn lookup(&self, id: TemplateId) -> Option<Arc<ItemTemplate>> {
        self.templates.get(&id).cloned()
    }
}

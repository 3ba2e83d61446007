use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use aurora_catalog::{NewProduct, Product, ProductId, ProductPatch};
use aurora_core::{DomainError, DomainResult};

/// Product catalog repository.
///
/// Ids are assigned sequentially; `snapshot` returns products in id order,
/// which is the catalog order the triage engine preserves.
pub trait ProductStore: Send + Sync {
    fn get(&self, id: ProductId) -> Option<Product>;
    fn snapshot(&self) -> Vec<Product>;
    fn insert(&self, draft: NewProduct) -> DomainResult<Product>;
    fn update(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product>;
    fn remove(&self, id: ProductId) -> DomainResult<Product>;
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn get(&self, id: ProductId) -> Option<Product> {
        (**self).get(id)
    }

    fn snapshot(&self) -> Vec<Product> {
        (**self).snapshot()
    }

    fn insert(&self, draft: NewProduct) -> DomainResult<Product> {
        (**self).insert(draft)
    }

    fn update(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product> {
        (**self).update(id, patch)
    }

    fn remove(&self, id: ProductId) -> DomainResult<Product> {
        (**self).remove(id)
    }
}

#[derive(Debug, Default)]
struct Catalog {
    last_id: u64,
    items: BTreeMap<ProductId, Product>,
}

/// In-memory product catalog.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<Catalog>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `drafts`, in order.
    pub fn seeded(drafts: impl IntoIterator<Item = NewProduct>) -> DomainResult<Self> {
        let store = Self::new();
        for draft in drafts {
            store.insert(draft)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|c| c.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> DomainError {
    DomainError::conflict("product store lock poisoned")
}

impl ProductStore for InMemoryProductStore {
    fn get(&self, id: ProductId) -> Option<Product> {
        let catalog = self.inner.read().ok()?;
        catalog.items.get(&id).cloned()
    }

    fn snapshot(&self) -> Vec<Product> {
        match self.inner.read() {
            Ok(catalog) => catalog.items.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn insert(&self, draft: NewProduct) -> DomainResult<Product> {
        draft.validate()?;
        let mut catalog = self.inner.write().map_err(|_| poisoned())?;
        let id = ProductId(catalog.last_id + 1);
        let product = draft.into_product(id)?;
        catalog.last_id = id.0;
        catalog.items.insert(id, product.clone());
        Ok(product)
    }

    fn update(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product> {
        let mut catalog = self.inner.write().map_err(|_| poisoned())?;
        let current = catalog.items.get(&id).ok_or(DomainError::NotFound)?;
        let next = patch.apply(current)?;
        catalog.items.insert(id, next.clone());
        Ok(next)
    }

    fn remove(&self, id: ProductId) -> DomainResult<Product> {
        let mut catalog = self.inner.write().map_err(|_| poisoned())?;
        catalog.items.remove(&id).ok_or(DomainError::NotFound)
    }
}

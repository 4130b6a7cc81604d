//! Product catalog use cases.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::auth::session::DEFAULT_STORE_TIMEOUT;
use crate::models::product::{Product, ProductDraft};
use crate::store::{ProductStore, StoreError, bounded};

/// Product catalog errors.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product {0} not found")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for ProductError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => ProductError::StoreUnavailable(msg),
            other => ProductError::Store(other.to_string()),
        }
    }
}

fn check_draft(draft: &ProductDraft, name_required: bool) -> Result<(), ProductError> {
    match draft.name.as_deref().map(str::trim) {
        Some("") => return Err(ProductError::Validation("productName must not be blank".into())),
        None if name_required => {
            return Err(ProductError::Validation("productName is required".into()));
        }
        _ => {}
    }
    if let Some(price) = draft.price
        && (!price.is_finite() || price < 0.0)
    {
        return Err(ProductError::Validation(
            "productPrice must be a non-negative number".into(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    store_timeout: Duration,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self {
            products,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Override the per-call store deadline.
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub async fn list(&self) -> Result<Vec<Product>, ProductError> {
        Ok(bounded(self.store_timeout, self.products.list()).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Product, ProductError> {
        bounded(self.store_timeout, self.products.get(id))
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    pub async fn create(&self, draft: ProductDraft) -> Result<Product, ProductError> {
        check_draft(&draft, true)?;
        let product = bounded(self.store_timeout, self.products.create(&draft)).await?;
        info!(product_id = product.id, "product created");
        Ok(product)
    }

    /// Partial update: fields absent from `draft` keep their stored value.
    pub async fn update(&self, id: i64, draft: ProductDraft) -> Result<Product, ProductError> {
        check_draft(&draft, false)?;
        let product = bounded(self.store_timeout, self.products.update(id, &draft))
            .await?
            .ok_or(ProductError::NotFound(id))?;
        info!(product_id = id, "product updated");
        Ok(product)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ProductError> {
        if !bounded(self.store_timeout, self.products.delete(id)).await? {
            return Err(ProductError::NotFound(id));
        }
        info!(product_id = id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProductStore;

    fn draft(name: Option<&str>, price: Option<f64>) -> ProductDraft {
        ProductDraft {
            name: name.map(str::to_string),
            price,
        }
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let svc = ProductService::new(Arc::new(MemoryProductStore::new()));
        let pen = svc.create(draft(Some("Pen"), Some(1.5))).await.unwrap();
        assert_eq!(svc.get(pen.id).await.unwrap(), pen);

        let repriced = svc.update(pen.id, draft(None, Some(2.0))).await.unwrap();
        assert_eq!(repriced.name.as_deref(), Some("Pen"));
        assert_eq!(repriced.price, Some(2.0));

        assert_eq!(svc.list().await.unwrap().len(), 1);
        svc.delete(pen.id).await.unwrap();
        assert!(matches!(svc.get(pen.id).await, Err(ProductError::NotFound(_))));
        assert!(matches!(svc.delete(pen.id).await, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn drafts_are_validated() {
        let svc = ProductService::new(Arc::new(MemoryProductStore::new()));
        assert!(matches!(
            svc.create(draft(None, Some(1.0))).await,
            Err(ProductError::Validation(_))
        ));
        assert!(matches!(
            svc.create(draft(Some("  "), None)).await,
            Err(ProductError::Validation(_))
        ));
        assert!(matches!(
            svc.create(draft(Some("Pen"), Some(-1.0))).await,
            Err(ProductError::Validation(_))
        ));
        assert!(matches!(
            svc.update(1, draft(None, Some(f64::NAN))).await,
            Err(ProductError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn updating_missing_product_is_not_found() {
        let svc = ProductService::new(Arc::new(MemoryProductStore::new()));
        assert!(matches!(
            svc.update(99, draft(Some("Ghost"), None)).await,
            Err(ProductError::NotFound(99))
        ));
    }
}

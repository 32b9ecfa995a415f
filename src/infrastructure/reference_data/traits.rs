//! # Reference Data Gateway
//!
//! Read-only port onto the catalog the engine validates references
//! against. Lookups answer `Ok(None)` for unknown keys; errors are reserved
//! for the catalog being unavailable.

use crate::domain::entities::reference::{Category, Company, Product, ProductDiscount, Supplier};
use crate::domain::value_objects::{CategoryId, CompanyId, ProductId, SupplierId};
use crate::infrastructure::persistence::traits::RepositoryResult;
use async_trait::async_trait;
use std::fmt;

/// Read-only catalog lookups.
#[async_trait]
pub trait ReferenceDataGateway: Send + Sync + fmt::Debug {
    /// Gets a company.
    async fn get_company(&self, id: &CompanyId) -> RepositoryResult<Option<Company>>;

    /// Gets a supplier.
    async fn get_supplier(&self, id: &SupplierId) -> RepositoryResult<Option<Supplier>>;

    /// Gets a category.
    async fn get_category(&self, id: &CategoryId) -> RepositoryResult<Option<Category>>;

    /// Gets a product.
    async fn get_product(&self, id: &ProductId) -> RepositoryResult<Option<Product>>;

    /// Returns the product's current discount tiers, active or not.
    ///
    /// Callers fetch this per pricing call and must not cache it.
    async fn product_discounts(&self, id: &ProductId) -> RepositoryResult<Vec<ProductDiscount>>;
}

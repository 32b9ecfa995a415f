//! # In-Memory Reference Data
//!
//! Catalog held in `parking_lot` locks, seeded by tests and the demo.

use super::traits::ReferenceDataGateway;
use crate::domain::entities::reference::{Category, Company, Product, ProductDiscount, Supplier};
use crate::domain::value_objects::{CategoryId, CompanyId, ProductId, SupplierId};
use crate::infrastructure::persistence::traits::RepositoryResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Catalog {
    companies: HashMap<CompanyId, Company>,
    suppliers: HashMap<SupplierId, Supplier>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    discounts: HashMap<ProductId, Vec<ProductDiscount>>,
}

/// In-memory [`ReferenceDataGateway`].
///
/// Clones share the same catalog, so a test can keep a handle and change
/// discount tiers between pricing calls.
///
/// # Examples
///
/// ```
/// use procurement_engine::domain::entities::reference::{Company, Supplier};
/// use procurement_engine::infrastructure::reference_data::InMemoryReferenceData;
///
/// let catalog = InMemoryReferenceData::new()
///     .with_company(Company::new("acme", "Acme Corp"))
///     .with_supplier(Supplier::new("globex", "Globex"));
/// assert_eq!(catalog.supplier_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceData {
    catalog: Arc<RwLock<Catalog>>,
}

impl InMemoryReferenceData {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a company.
    #[must_use]
    pub fn with_company(self, company: Company) -> Self {
        self.insert_company(company);
        self
    }

    /// Adds a supplier.
    #[must_use]
    pub fn with_supplier(self, supplier: Supplier) -> Self {
        self.insert_supplier(supplier);
        self
    }

    /// Adds a category.
    #[must_use]
    pub fn with_category(self, category: Category) -> Self {
        self.insert_category(category);
        self
    }

    /// Adds a product.
    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        self.insert_product(product);
        self
    }

    /// Adds a discount tier to its product.
    #[must_use]
    pub fn with_discount(self, discount: ProductDiscount) -> Self {
        self.insert_discount(discount);
        self
    }

    /// Inserts or replaces a company.
    pub fn insert_company(&self, company: Company) {
        self.catalog.write().companies.insert(company.id.clone(), company);
    }

    /// Inserts or replaces a supplier.
    pub fn insert_supplier(&self, supplier: Supplier) {
        self.catalog.write().suppliers.insert(supplier.id.clone(), supplier);
    }

    /// Inserts or replaces a category.
    pub fn insert_category(&self, category: Category) {
        self.catalog.write().categories.insert(category.id.clone(), category);
    }

    /// Inserts or replaces a product.
    pub fn insert_product(&self, product: Product) {
        self.catalog.write().products.insert(product.id.clone(), product);
    }

    /// Adds a tier, replacing any tier with the same id on that product.
    pub fn insert_discount(&self, discount: ProductDiscount) {
        let mut catalog = self.catalog.write();
        let tiers = catalog.discounts.entry(discount.product_id.clone()).or_default();
        tiers.retain(|t| t.id != discount.id);
        tiers.push(discount);
    }

    /// Drops every tier of a product.
    pub fn clear_discounts(&self, product: &ProductId) {
        self.catalog.write().discounts.remove(product);
    }

    /// Returns the number of suppliers.
    #[must_use]
    pub fn supplier_count(&self) -> usize {
        self.catalog.read().suppliers.len()
    }
}

#[async_trait]
impl ReferenceDataGateway for InMemoryReferenceData {
    async fn get_company(&self, id: &CompanyId) -> RepositoryResult<Option<Company>> {
        Ok(self.catalog.read().companies.get(id).cloned())
    }

    async fn get_supplier(&self, id: &SupplierId) -> RepositoryResult<Option<Supplier>> {
        Ok(self.catalog.read().suppliers.get(id).cloned())
    }

    async fn get_category(&self, id: &CategoryId) -> RepositoryResult<Option<Category>> {
        Ok(self.catalog.read().categories.get(id).cloned())
    }

    async fn get_product(&self, id: &ProductId) -> RepositoryResult<Option<Product>> {
        Ok(self.catalog.read().products.get(id).cloned())
    }

    async fn product_discounts(&self, id: &ProductId) -> RepositoryResult<Vec<ProductDiscount>> {
        Ok(self
            .catalog
            .read()
            .discounts
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

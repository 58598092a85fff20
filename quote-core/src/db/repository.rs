use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Customer, MaterialTable, NewSalesOrder, Product, RateTable, SalesOrder};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Persistent store for rates, materials, and the sales-order tables.
///
/// Settings are a flat `key -> value` table: machine hourly rates plus the
/// `profit_margin` and `Wire EDM_sqmm` scalars.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    // Settings
    async fn get_settings(&self) -> Result<HashMap<String, Decimal>, RepositoryError>;

    /// Upserts every entry of `settings`; keys not present are left alone.
    async fn update_settings(
        &self,
        settings: &HashMap<String, Decimal>,
    ) -> Result<(), RepositoryError>;

    // Materials
    async fn get_all_materials(&self) -> Result<BTreeMap<String, Decimal>, RepositoryError>;

    /// Upserts every entry of `materials`.
    async fn update_materials(
        &self,
        materials: &BTreeMap<String, Decimal>,
    ) -> Result<(), RepositoryError>;

    /// Returns `false` without changing anything when `name` already exists.
    async fn add_material(
        &self,
        name: &str,
        cost: Decimal,
    ) -> Result<bool, RepositoryError>;

    async fn delete_material(&self, name: &str) -> Result<(), RepositoryError>;

    // Customers and products
    async fn list_customers(&self) -> Result<Vec<Customer>, RepositoryError>;

    async fn add_customer(&self, name: &str) -> Result<Customer, RepositoryError>;

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: i64) -> Result<Product, RepositoryError>;

    async fn add_product(
        &self,
        name: &str,
        unit_price: Decimal,
    ) -> Result<Product, RepositoryError>;

    // Sales orders
    /// Writes the order header and all of its lines in one transaction.
    async fn create_sales_order(
        &self,
        order: NewSalesOrder,
    ) -> Result<SalesOrder, RepositoryError>;

    async fn get_sales_order(&self, id: i64) -> Result<SalesOrder, RepositoryError>;

    /// Loads the pricing snapshot for a quoting session.
    async fn load_snapshot(&self) -> Result<(RateTable, MaterialTable), RepositoryError> {
        let settings = self.get_settings().await?;
        let materials = self.get_all_materials().await?;
        Ok((RateTable::from_settings(&settings), MaterialTable::new(materials)))
    }
}

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use quote_core::{
    Customer, NewSalesOrder, OrderLine, Product, QuoteRepository, RepositoryError, SalesOrder,
};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::decimal::{collect_named, decimal_to_f64, get_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the database file if it is missing.
    ///
    /// Accepts sqlx URLs (`sqlite:quotes.db`, `sqlite::memory:`) as well as
    /// bare paths and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let url = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite:{database_url}")
        };
        let options = SqliteConnectOptions::from_str(&url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {database_url}"))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Executes every `.sql` file in `seeds_dir` in filename order.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "seed applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn order_lines(
        &self,
        order_id: i64,
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT oi.product_id, p.name AS product_name, oi.quantity, oi.price_per_unit
             FROM order_items oi JOIN products p ON p.id = oi.product_id
             WHERE oi.order_id = ? ORDER BY oi.line_no",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(OrderLine {
                    product_id: row.try_get("product_id").map_err(db_err)?,
                    product_name: row.try_get("product_name").map_err(db_err)?,
                    quantity: row.try_get("quantity").map_err(db_err)?,
                    unit_price: get_decimal(row, "price_per_unit")?,
                })
            })
            .collect()
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        unit_price: get_decimal(row, "unit_price")?,
    })
}

async fn upsert_named(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
    entries: impl Iterator<Item = (&String, &Decimal)>,
) -> Result<(), RepositoryError> {
    for (name, value) in entries {
        sqlx::query(sql)
            .bind(name.as_str())
            .bind(decimal_to_f64(*value))
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

#[async_trait]
impl QuoteRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<HashMap<String, Decimal>, RepositoryError> {
        let rows = sqlx::query("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        debug!(count = rows.len(), "settings loaded");
        collect_named(&rows, "key", "value")
    }

    async fn update_settings(
        &self,
        settings: &HashMap<String, Decimal>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        upsert_named(
            &mut tx,
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            settings.iter(),
        )
        .await?;
        tx.commit().await.map_err(db_err)?;
        debug!(count = settings.len(), "settings saved");
        Ok(())
    }

    async fn get_all_materials(&self) -> Result<BTreeMap<String, Decimal>, RepositoryError> {
        let rows = sqlx::query("SELECT name, cost FROM materials")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        debug!(count = rows.len(), "materials loaded");
        collect_named(&rows, "name", "cost")
    }

    async fn update_materials(
        &self,
        materials: &BTreeMap<String, Decimal>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        upsert_named(
            &mut tx,
            "INSERT OR REPLACE INTO materials (name, cost) VALUES (?, ?)",
            materials.iter(),
        )
        .await?;
        tx.commit().await.map_err(db_err)?;
        debug!(count = materials.len(), "materials saved");
        Ok(())
    }

    async fn add_material(
        &self,
        name: &str,
        cost: Decimal,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("INSERT OR IGNORE INTO materials (name, cost) VALUES (?, ?)")
            .bind(name)
            .bind(decimal_to_f64(cost))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_material(
        &self,
        name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM materials WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name FROM customers ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(Customer {
                    id: row.try_get("id").map_err(db_err)?,
                    name: row.try_get("name").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn add_customer(
        &self,
        name: &str,
    ) -> Result<Customer, RepositoryError> {
        let result = sqlx::query("INSERT INTO customers (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Customer {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, unit_price FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_product).collect()
    }

    async fn get_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query("SELECT id, name, unit_price FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_product(&row)
    }

    async fn add_product(
        &self,
        name: &str,
        unit_price: Decimal,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query("INSERT INTO products (name, unit_price) VALUES (?, ?)")
            .bind(name)
            .bind(decimal_to_f64(unit_price))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        self.get_product(result.last_insert_rowid()).await
    }

    async fn create_sales_order(
        &self,
        order: NewSalesOrder,
    ) -> Result<SalesOrder, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let result = sqlx::query(
            "INSERT INTO sales_orders (order_date, customer_id, total_amount, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order.order_date)
        .bind(order.customer_id)
        .bind(decimal_to_f64(order.total_amount))
        .bind(&order.status)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        let order_id = result.last_insert_rowid();

        for (line_no, line) in order.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, line_no, quantity, price_per_unit)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line_no as i64)
            .bind(line.quantity)
            .bind(decimal_to_f64(line.unit_price))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!(order_id, lines = order.lines.len(), "sales order saved");

        self.get_sales_order(order_id).await
    }

    async fn get_sales_order(
        &self,
        id: i64,
    ) -> Result<SalesOrder, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, order_date, customer_id, total_amount, status, created_at
             FROM sales_orders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(SalesOrder {
            id: row.try_get("id").map_err(db_err)?,
            order_date: row.try_get::<NaiveDate, _>("order_date").map_err(db_err)?,
            customer_id: row.try_get("customer_id").map_err(db_err)?,
            total_amount: get_decimal(&row, "total_amount")?,
            status: row.try_get("status").map_err(db_err)?,
            lines: self.order_lines(id).await?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {e}")))?,
        })
    }
}

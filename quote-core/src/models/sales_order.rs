use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status written for every order saved from a draft.
pub const CONFIRMED_STATUS: &str = "Confirmed";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SalesOrderError {
    #[error("quantity must be greater than 0, got {0}")]
    InvalidQuantity(i64),

    #[error("a customer must be selected")]
    MissingCustomer,

    #[error("an order needs at least one line item")]
    NoLines,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An order being assembled in memory before it is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderDraft {
    pub customer_id: Option<i64>,
    pub order_date: NaiveDate,
    lines: Vec<OrderLine>,
}

impl SalesOrderDraft {
    pub fn new(order_date: NaiveDate) -> Self {
        Self {
            customer_id: None,
            order_date,
            lines: Vec::new(),
        }
    }

    /// Appends a line for `product`. Lines for the same product are kept
    /// separate, in entry order.
    pub fn add_line(
        &mut self,
        product: &Product,
        quantity: i64,
    ) -> Result<&OrderLine, SalesOrderError> {
        if quantity <= 0 {
            return Err(SalesOrderError::InvalidQuantity(quantity));
        }
        self.lines.push(OrderLine {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.unit_price,
        });
        Ok(&self.lines[self.lines.len() - 1])
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    pub fn clear(&mut self) {
        self.customer_id = None;
        self.lines.clear();
    }

    /// Validates the draft and produces the record to persist.
    pub fn to_new_order(&self) -> Result<NewSalesOrder, SalesOrderError> {
        let customer_id = self.customer_id.ok_or(SalesOrderError::MissingCustomer)?;
        if self.lines.is_empty() {
            return Err(SalesOrderError::NoLines);
        }
        Ok(NewSalesOrder {
            order_date: self.order_date,
            customer_id,
            total_amount: self.total(),
            status: CONFIRMED_STATUS.to_string(),
            lines: self.lines.clone(),
        })
    }
}

/// For creating new orders (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSalesOrder {
    pub order_date: NaiveDate,
    pub customer_id: i64,
    pub total_amount: Decimal,
    pub status: String,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: i64,
    pub order_date: NaiveDate,
    pub customer_id: i64,
    pub total_amount: Decimal,
    pub status: String,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

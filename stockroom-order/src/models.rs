use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_catalog::{Price, ProductId, Quantity, TotalOverflow};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A placed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order priced at `unit_price`, the price read together with the stock
    pub fn place(product_id: ProductId, unit_price: Price, quantity: Quantity) -> Result<Self, TotalOverflow> {
        Ok(Self {
            id: OrderId::generate(),
            product_id,
            quantity,
            total: unit_price.total_for(quantity)?,
            created_at: Utc::now(),
        })
    }
}

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identifier for a product created through the catalog
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit price of a product. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, ProductError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ProductError::InvalidPrice(amount));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ProductError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Core product structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
}

impl Product {
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            stock: draft.stock,
        }
    }

    /// Overwrite only the fields the patch carries
    pub fn apply(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
    }
}

/// Largest stock level a product can hold
pub const MAX_STOCK: u32 = i32::MAX as u32;

/// Everything needed to add a product to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), ProductError> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        check_stock(self.stock)
    }
}

/// Partial update for an existing product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<u32>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), ProductError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(stock) = self.stock {
            check_stock(stock)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

fn check_stock(stock: u32) -> Result<(), ProductError> {
    if stock > MAX_STOCK {
        return Err(ProductError::StockOutOfRange(stock));
    }
    Ok(())
}

fn require_text(field: &'static str, value: &str) -> Result<(), ProductError> {
    if value.trim().is_empty() {
        return Err(ProductError::MissingField(field));
    }
    Ok(())
}

/// Product-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("price must not be negative, got {0}")]
    InvalidPrice(Decimal),

    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("stock must not exceed 2147483647, got {0}")]
    StockOutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn gopher() -> Product {
        Product {
            id: ProductId::new("076e76d6-fc3e-4f95-a024-1b4984e76060"),
            name: "Gopher".to_string(),
            description: "Realistic replica of the Gopher animal".to_string(),
            price: Price::new(Decimal::new(6542, 2)).unwrap(),
            stock: 50,
        }
    }

    #[test]
    fn test_negative_price_rejected() {
        assert_eq!(
            Price::new(Decimal::new(-1, 2)),
            Err(ProductError::InvalidPrice(Decimal::new(-1, 2)))
        );
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_price_deserializes_from_json_number() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "name": "Rusty",
            "description": "Crab",
            "price": 21.9,
            "stock": 10
        }))
        .unwrap();

        assert_eq!(product.price.amount(), Decimal::new(219, 1));

        let negative = serde_json::from_value::<Price>(serde_json::json!(-3.5));
        assert!(negative.is_err());
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut product = gopher();
        let patch = ProductPatch {
            stock: Some(7),
            ..Default::default()
        };

        product.apply(&patch);

        assert_eq!(product.stock, 7);
        assert_eq!(product.name, "Gopher");
        assert_eq!(product.price, gopher().price);
    }

    #[test]
    fn test_draft_requires_name_and_description() {
        let draft = ProductDraft {
            name: "  ".to_string(),
            description: "something".to_string(),
            price: Price::new(Decimal::ONE).unwrap(),
            stock: 1,
        };
        assert_eq!(draft.validate(), Err(ProductError::MissingField("name")));

        let patch = ProductPatch {
            description: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(ProductError::MissingField("description")));
        assert!(ProductPatch::default().is_empty());
    }

    #[test]
    fn test_stock_bounded_to_storable_range() {
        let draft = ProductDraft {
            name: "Gopher".to_string(),
            description: "Plush".to_string(),
            price: Price::new(Decimal::ONE).unwrap(),
            stock: MAX_STOCK + 1,
        };
        assert_eq!(draft.validate(), Err(ProductError::StockOutOfRange(MAX_STOCK + 1)));

        let patch = ProductPatch {
            stock: Some(3_000_000_000),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(ProductError::StockOutOfRange(3_000_000_000)));

        let at_limit = ProductPatch {
            stock: Some(MAX_STOCK),
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }
}

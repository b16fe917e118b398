use std::num::NonZeroU32;
use std::ops::Deref;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::{Price, Product};

/// A positive number of units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    pub fn new(units: u32) -> Result<Self, InventoryError> {
        NonZeroU32::new(units)
            .map(Self)
            .ok_or(InventoryError::InvalidQuantity(i64::from(units)))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for Quantity {
    type Error = InventoryError;

    fn try_from(units: u32) -> Result<Self, Self::Error> {
        Self::new(units)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = InventoryError;

    fn try_from(units: i64) -> Result<Self, Self::Error> {
        let units = u32::try_from(units).map_err(|_| InventoryError::InvalidQuantity(units))?;
        Self::new(units)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl Price {
    /// Line total for `quantity` units at this price
    pub fn total_for(&self, quantity: Quantity) -> Result<Decimal, TotalOverflow> {
        self.amount()
            .checked_mul(Decimal::from(quantity.get()))
            .ok_or(TotalOverflow {
                unit_price: self.amount(),
                quantity: quantity.get(),
            })
    }
}

impl Product {
    /// Remove `quantity` units from stock. Stock is left untouched on failure.
    pub fn take_stock(&mut self, quantity: Quantity) -> Result<(), InsufficientStock> {
        let requested = quantity.get();
        self.stock = self.stock.checked_sub(requested).ok_or(InsufficientStock {
            requested,
            available: self.stock,
        })?;
        Ok(())
    }
}

/// A record read under an exclusive row lock.
///
/// Stores hand these out from their locking read. The lock itself lives as long as the
/// enclosing transaction; the handle is the right to change the record and is consumed
/// by the store's save, so one locking read is written back at most once.
#[derive(Debug)]
#[must_use = "a locked record should be saved, or its transaction rolled back"]
pub struct LockedHandle<T> {
    value: T,
}

impl<T> LockedHandle<T> {
    /// Wrap a value the caller has just read under lock. Meant for store implementations.
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value)
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for LockedHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient stock: requested {requested}, available {available}")]
pub struct InsufficientStock {
    pub requested: u32,
    pub available: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order total out of range: {quantity} x {unit_price}")]
pub struct TotalOverflow {
    pub unit_price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),
}

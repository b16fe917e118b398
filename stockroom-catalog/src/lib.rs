pub mod product;
pub mod inventory;

pub use product::{Price, Product, ProductDraft, ProductError, ProductId, ProductPatch, MAX_STOCK};
pub use inventory::{InsufficientStock, InventoryError, LockedHandle, Quantity, TotalOverflow};

//! Generators for the built-in e-commerce schema.
//!
//! Column lists match `schemas/ecommerce.yaml` in `seed-core`; the registry
//! rejects any drift between the two before a load starts. Timestamps are
//! drawn relative to an anchor (normally the run start) instead of the wall
//! clock.

mod catalog;
mod customers;
mod orders;

pub use catalog::{CategoryGenerator, ProductGenerator, ProductSizeGenerator};
pub use customers::{
    CartGenerator, CartItemGenerator, FavoriteGenerator, NotificationGenerator, UserGenerator,
};
pub use orders::{OrderGenerator, OrderItemGenerator, PaymentGenerator, ShipmentGenerator};

use crate::generator::{GeneratorError, GeneratorRegistry};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Probability that `users.last_login` is NULL.
pub const LAST_LOGIN_NULL_PROBABILITY: f64 = 0.3;

/// Probability that `payments.transaction_id` is present.
pub const TRANSACTION_ID_PRESENT_PROBABILITY: f64 = 0.5;

/// Probability that `shipments.delivered_date` is NULL.
pub const DELIVERED_DATE_NULL_PROBABILITY: f64 = 0.3;

/// Sales tax applied to order subtotals (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Registry holding a generator for every e-commerce table.
pub fn ecommerce_registry(anchor: NaiveDateTime) -> Result<GeneratorRegistry, GeneratorError> {
    Ok(GeneratorRegistry::new()
        .with(CategoryGenerator::new(anchor))
        .with(UserGenerator::new(anchor)?)
        .with(ProductGenerator::new(anchor))
        .with(ProductSizeGenerator::new())
        .with(CartGenerator::new(anchor))
        .with(CartItemGenerator::new(anchor))
        .with(OrderGenerator::new(anchor)?)
        .with(OrderItemGenerator::new())
        .with(PaymentGenerator::new(anchor)?)
        .with(ShipmentGenerator::new(anchor))
        .with(NotificationGenerator::new(anchor))
        .with(FavoriteGenerator::new(anchor)))
}

//! Orders and their line items, payments and shipments.
//!
//! Money is `rust_decimal` throughout so the derived amounts hold exactly:
//! `tax = round(subtotal * 0.08, 2)`, `final = subtotal + tax + shipping` and
//! `total_price = round(quantity * unit_price, 2)`.

use super::{DELIVERED_DATE_NULL_PROBABILITY, TAX_RATE, TRANSACTION_ID_PRESENT_PROBABILITY};
use crate::generator::{GeneratorError, ParentKeys, RecordGenerator};
use crate::generators::{fake, numeric, timestamp, uuid, WeightedChoice};
use chrono::NaiveDateTime;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use rust_decimal::Decimal;
use seed_core::{Record, Value};

const ORDER_STATUSES: &[&str] = &["pending", "processing", "shipped", "delivered", "cancelled"];
const ORDER_STATUS_WEIGHTS: &[u32] = &[10, 20, 30, 35, 5];

const PAYMENT_METHODS: &[&str] = &["credit_card", "debit_card", "paypal", "bank_transfer", "cash"];
const PAYMENT_STATUSES: &[&str] = &["pending", "completed", "failed", "refunded"];
const PAYMENT_STATUS_WEIGHTS: &[u32] = &[5, 80, 10, 5];

const CARRIERS: &[&str] = &["FedEx", "UPS", "DHL", "USPS", "Amazon"];
const SHIPMENT_STATUSES: &[&str] = &["pending", "shipped", "in_transit", "delivered", "returned"];

fn pick(rng: &mut dyn RngCore, values: &[&'static str]) -> Value {
    values
        .choose(rng)
        .copied()
        .map(Value::from)
        .unwrap_or(Value::Null)
}

/// Order amounts with the tax and total derived from the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAmounts {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderAmounts {
    pub fn new(subtotal: Decimal, shipping: Decimal) -> Self {
        let tax = numeric::round2(subtotal * TAX_RATE);
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    fn random(rng: &mut dyn RngCore) -> Self {
        Self::new(
            numeric::money(rng, 2_000, 50_000),
            numeric::money(rng, 0, 2_500),
        )
    }
}

/// Rows for `orders`.
#[derive(Debug, Clone)]
pub struct OrderGenerator {
    anchor: NaiveDateTime,
    statuses: WeightedChoice<&'static str>,
}

impl OrderGenerator {
    pub fn new(anchor: NaiveDateTime) -> Result<Self, GeneratorError> {
        Ok(Self {
            anchor,
            statuses: WeightedChoice::new(ORDER_STATUSES, ORDER_STATUS_WEIGHTS)?,
        })
    }
}

impl RecordGenerator for OrderGenerator {
    fn table(&self) -> &str {
        "orders"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "order_id",
            "user_id",
            "subtotal_amount",
            "tax_amount",
            "shipping_amount",
            "final_amount",
            "order_status",
            "shipping_address",
            "billing_address",
            "created_at",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let amounts = OrderAmounts::random(rng);

        let mut record = Record::with_capacity(10);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("user_id"));
        record.push(amounts.subtotal);
        record.push(amounts.tax);
        record.push(amounts.shipping);
        record.push(amounts.total);
        record.push(*self.statuses.sample(rng));
        record.push(fake::address(rng));
        record.push(fake::address(rng));
        record.push(timestamp::within_days(rng, self.anchor, 365));
        record
    }
}

/// Rows for `order_items`.
#[derive(Debug, Clone, Default)]
pub struct OrderItemGenerator;

impl OrderItemGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl RecordGenerator for OrderItemGenerator {
    fn table(&self) -> &str {
        "order_items"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "item_id",
            "order_id",
            "product_id",
            "quantity",
            "unit_price",
            "total_price",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let quantity = numeric::int_range(rng, 1, 5);
        let unit_price = numeric::money(rng, 1_000, 20_000);
        let total_price = numeric::round2(Decimal::from(quantity) * unit_price);

        let mut record = Record::with_capacity(6);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("order_id"));
        record.push(parent_keys.value("product_id"));
        record.push(quantity);
        record.push(unit_price);
        record.push(total_price);
        record
    }
}

/// Rows for `payments`.
#[derive(Debug, Clone)]
pub struct PaymentGenerator {
    anchor: NaiveDateTime,
    statuses: WeightedChoice<&'static str>,
}

impl PaymentGenerator {
    pub fn new(anchor: NaiveDateTime) -> Result<Self, GeneratorError> {
        Ok(Self {
            anchor,
            statuses: WeightedChoice::new(PAYMENT_STATUSES, PAYMENT_STATUS_WEIGHTS)?,
        })
    }
}

impl RecordGenerator for PaymentGenerator {
    fn table(&self) -> &str {
        "payments"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "payment_id",
            "order_id",
            "amount",
            "payment_method",
            "payment_status",
            "transaction_id",
            "created_at",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(7);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("order_id"));
        record.push(numeric::money(rng, 2_000, 50_000));
        record.push(pick(rng, PAYMENT_METHODS));
        record.push(*self.statuses.sample(rng));
        record.push(if rng.random_bool(TRANSACTION_ID_PRESENT_PROBABILITY) {
            Some(uuid::uuid_v4(rng).to_string())
        } else {
            None
        });
        record.push(timestamp::within_days(rng, self.anchor, 365));
        record
    }
}

/// Rows for `shipments`.
#[derive(Debug, Clone)]
pub struct ShipmentGenerator {
    anchor: NaiveDateTime,
}

impl ShipmentGenerator {
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }
}

impl RecordGenerator for ShipmentGenerator {
    fn table(&self) -> &str {
        "shipments"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "shipment_id",
            "order_id",
            "carrier",
            "tracking_number",
            "shipment_status",
            "shipped_date",
            "delivered_date",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(7);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("order_id"));
        record.push(pick(rng, CARRIERS));
        record.push(uuid::uuid_v4(rng).to_string());
        record.push(pick(rng, SHIPMENT_STATUSES));
        record.push(timestamp::within_days(rng, self.anchor, 365));
        record.push(if rng.random_bool(DELIVERED_DATE_NULL_PROBABILITY) {
            None
        } else {
            Some(timestamp::within_days(rng, self.anchor, 365))
        });
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecommerce::tests::anchor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::str::FromStr;

    fn decimal(record: &Record, index: usize) -> Decimal {
        record.get(index).and_then(Value::as_decimal).unwrap()
    }

    #[test]
    fn test_order_amount_invariants() {
        let generator = OrderGenerator::new(anchor()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1_000 {
            let record = generator.generate(&mut rng, &ParentKeys::new());
            let subtotal = decimal(&record, 2);
            let tax = decimal(&record, 3);
            let shipping = decimal(&record, 4);
            let total = decimal(&record, 5);

            assert_eq!(tax, (subtotal * Decimal::from_str("0.08").unwrap()).round_dp(2));
            assert_eq!(total, subtotal + tax + shipping);
            assert!(subtotal >= Decimal::new(2_000, 2) && subtotal <= Decimal::new(50_000, 2));
            assert!(shipping >= Decimal::ZERO && shipping <= Decimal::new(2_500, 2));
        }
    }

    #[test]
    fn test_order_amounts_exact() {
        let amounts = OrderAmounts::new(
            Decimal::from_str("123.45").unwrap(),
            Decimal::from_str("5.00").unwrap(),
        );
        assert_eq!(amounts.tax, Decimal::from_str("9.88").unwrap());
        assert_eq!(amounts.total, Decimal::from_str("138.33").unwrap());
    }

    #[test]
    fn test_order_item_total_price() {
        let generator = OrderItemGenerator::new();
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..1_000 {
            let record = generator.generate(&mut rng, &ParentKeys::new());
            let quantity = record.get(3).and_then(Value::as_integer).unwrap();
            let unit_price = decimal(&record, 4);
            assert!((1..=5).contains(&quantity));
            assert_eq!(
                decimal(&record, 5),
                (Decimal::from(quantity) * unit_price).round_dp(2)
            );
        }
    }

    #[test]
    fn test_order_status_weighting() {
        let generator = OrderGenerator::new(anchor()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let mut delivered = 0;
        let mut cancelled = 0;
        for _ in 0..10_000 {
            let record = generator.generate(&mut rng, &ParentKeys::new());
            match record.get(6).and_then(Value::as_text) {
                Some("delivered") => delivered += 1,
                Some("cancelled") => cancelled += 1,
                Some(status) => assert!(ORDER_STATUSES.contains(&status)),
                None => panic!("missing status"),
            }
        }
        assert!(delivered > cancelled * 4, "{delivered} vs {cancelled}");
    }

    #[test]
    fn test_nullable_probability_shape() {
        let payments = PaymentGenerator::new(anchor()).unwrap();
        let shipments = ShipmentGenerator::new(anchor());
        let mut rng = StdRng::seed_from_u64(77);
        let rows = 10_000;

        let mut present = 0;
        let mut undelivered = 0;
        for _ in 0..rows {
            if !payments
                .generate(&mut rng, &ParentKeys::new())
                .get(5)
                .is_some_and(Value::is_null)
            {
                present += 1;
            }
            if shipments
                .generate(&mut rng, &ParentKeys::new())
                .get(6)
                .is_some_and(Value::is_null)
            {
                undelivered += 1;
            }
        }

        let present = present as f64 / rows as f64;
        let undelivered = undelivered as f64 / rows as f64;
        assert!((present - TRANSACTION_ID_PRESENT_PROBABILITY).abs() < 0.03);
        assert!((undelivered - DELIVERED_DATE_NULL_PROBABILITY).abs() < 0.03);
    }
}

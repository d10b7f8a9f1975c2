//! Categories, products and product sizes.

use crate::generator::{ParentKeys, RecordGenerator};
use crate::generators::{fake, numeric, timestamp, uuid};
use chrono::NaiveDateTime;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use seed_core::{Record, Value};

const SIZES: &[&str] = &[
    "XS", "S", "M", "L", "XL", "XXL", "28", "30", "32", "34", "36", "38", "40",
];

/// Rows for `categories`.
#[derive(Debug, Clone)]
pub struct CategoryGenerator {
    anchor: NaiveDateTime,
}

impl CategoryGenerator {
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }
}

impl RecordGenerator for CategoryGenerator {
    fn table(&self) -> &str {
        "categories"
    }

    fn columns(&self) -> Vec<&str> {
        vec!["category_id", "name", "description", "is_active", "created_at"]
    }

    fn generate(&self, rng: &mut dyn RngCore, _parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(5);
        record.push(uuid::uuid_v4(rng));
        record.push(fake::catch_phrase(rng));
        record.push(fake::text(rng, 200));
        record.push(rng.random_bool(0.5));
        record.push(timestamp::within_days(rng, self.anchor, 730));
        record
    }
}

/// Rows for `products`.
#[derive(Debug, Clone)]
pub struct ProductGenerator {
    anchor: NaiveDateTime,
}

impl ProductGenerator {
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }
}

impl RecordGenerator for ProductGenerator {
    fn table(&self) -> &str {
        "products"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "product_id",
            "category_id",
            "name",
            "description",
            "sku",
            "base_price",
            "stock_quantity",
            "weight",
            "dimensions",
            "is_active",
            "created_at",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(11);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("category_id"));
        record.push(fake::product_name(rng));
        record.push(fake::text(rng, 500));
        record.push(fake::ean13(rng));
        record.push(numeric::money(rng, 1_099, 99_999));
        record.push(numeric::int_range(rng, 0, 1_000));
        record.push(numeric::money(rng, 10, 5_000));
        record.push(format!(
            "{}x{}x{}cm",
            rng.random_range(10..=100),
            rng.random_range(10..=100),
            rng.random_range(5..=50)
        ));
        record.push(rng.random_bool(0.5));
        record.push(timestamp::within_days(rng, self.anchor, 730));
        record
    }
}

/// Rows for `product_sizes`.
#[derive(Debug, Clone, Default)]
pub struct ProductSizeGenerator;

impl ProductSizeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl RecordGenerator for ProductSizeGenerator {
    fn table(&self) -> &str {
        "product_sizes"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "size_id",
            "product_id",
            "size_name",
            "additional_price",
            "stock_quantity",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(5);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("product_id"));
        record.push(SIZES.choose(rng).copied().map(Value::from).unwrap_or(Value::Null));
        record.push(numeric::money(rng, 0, 5_000));
        record.push(numeric::int_range(rng, 0, 100));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecommerce::tests::anchor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;

    #[test]
    fn test_product_uses_category_key() {
        let category = ::uuid::Uuid::new_v4();
        let parents = ParentKeys::new().with("category_id", "categories", category);
        let mut rng = StdRng::seed_from_u64(4);

        let record = ProductGenerator::new(anchor()).generate(&mut rng, &parents);
        assert_eq!(record.len(), 11);
        assert_eq!(record.get(1), Some(&Value::Uuid(category)));

        let price = record.get(5).and_then(Value::as_decimal).unwrap();
        assert!(price >= Decimal::new(1_099, 2) && price <= Decimal::new(99_999, 2));
        let stock = record.get(6).and_then(Value::as_integer).unwrap();
        assert!((0..=1_000).contains(&stock));
    }

    #[test]
    fn test_product_size_names() {
        let mut rng = StdRng::seed_from_u64(2);
        let generator = ProductSizeGenerator::new();
        for _ in 0..50 {
            let record = generator.generate(&mut rng, &ParentKeys::new());
            let size = record.get(2).and_then(Value::as_text).unwrap();
            assert!(SIZES.contains(&size));
        }
    }

    #[test]
    fn test_category_created_before_anchor() {
        let mut rng = StdRng::seed_from_u64(5);
        let record = CategoryGenerator::new(anchor()).generate(&mut rng, &ParentKeys::new());
        match record.get(4) {
            Some(Value::Timestamp(ts)) => assert!(*ts <= anchor()),
            other => panic!("unexpected {other:?}"),
        }
    }
}

//! Users and the tables hanging directly off them.

use super::LAST_LOGIN_NULL_PROBABILITY;
use crate::generator::{GeneratorError, ParentKeys, RecordGenerator};
use crate::generators::{fake, numeric, timestamp, uuid, WeightedChoice};
use chrono::NaiveDateTime;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use seed_core::{Record, Value};

const ROLES: &[&str] = &["customer", "staff", "admin"];
const ROLE_WEIGHTS: &[u32] = &[970, 25, 5];

const NOTIFICATION_TYPES: &[&str] = &["order_update", "promotion", "system", "payment", "shipping"];

/// Rows for `users`.
#[derive(Debug, Clone)]
pub struct UserGenerator {
    anchor: NaiveDateTime,
    roles: WeightedChoice<&'static str>,
}

impl UserGenerator {
    pub fn new(anchor: NaiveDateTime) -> Result<Self, GeneratorError> {
        Ok(Self {
            anchor,
            roles: WeightedChoice::new(ROLES, ROLE_WEIGHTS)?,
        })
    }
}

impl RecordGenerator for UserGenerator {
    fn table(&self) -> &str {
        "users"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "user_id",
            "username",
            "email",
            "password_hash",
            "first_name",
            "last_name",
            "phone",
            "date_of_birth",
            "role",
            "is_active",
            "created_at",
            "last_login",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, _parent_keys: &ParentKeys) -> Record {
        let first = fake::first_name(rng);
        let last = fake::last_name(rng);
        let username = fake::username(rng, first, last);
        let email = fake::email(rng, &username);

        let mut record = Record::with_capacity(12);
        record.push(uuid::uuid_v4(rng));
        record.push(username);
        record.push(email);
        record.push(fake::password_hash(rng));
        record.push(first);
        record.push(last);
        record.push(fake::phone(rng));
        record.push(timestamp::date_of_birth(rng, self.anchor, 18, 80));
        record.push(*self.roles.sample(rng));
        record.push(rng.random_bool(0.5));
        record.push(timestamp::within_days(rng, self.anchor, 730));
        record.push(if rng.random_bool(LAST_LOGIN_NULL_PROBABILITY) {
            None
        } else {
            Some(timestamp::within_days(rng, self.anchor, 30))
        });
        record
    }
}

/// Rows for `cart`.
#[derive(Debug, Clone)]
pub struct CartGenerator {
    anchor: NaiveDateTime,
}

impl CartGenerator {
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }
}

impl RecordGenerator for CartGenerator {
    fn table(&self) -> &str {
        "cart"
    }

    fn columns(&self) -> Vec<&str> {
        vec!["cart_id", "user_id", "created_at"]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(3);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("user_id"));
        record.push(timestamp::within_days(rng, self.anchor, 30));
        record
    }
}

/// Rows for `cart_items`.
#[derive(Debug, Clone)]
pub struct CartItemGenerator {
    anchor: NaiveDateTime,
}

impl CartItemGenerator {
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }
}

impl RecordGenerator for CartItemGenerator {
    fn table(&self) -> &str {
        "cart_items"
    }

    fn columns(&self) -> Vec<&str> {
        vec!["item_id", "cart_id", "product_id", "quantity", "added_at"]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(5);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("cart_id"));
        record.push(parent_keys.value("product_id"));
        record.push(numeric::int_range(rng, 1, 10));
        record.push(timestamp::within_days(rng, self.anchor, 30));
        record
    }
}

/// Rows for `notifications`.
#[derive(Debug, Clone)]
pub struct NotificationGenerator {
    anchor: NaiveDateTime,
}

impl NotificationGenerator {
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }
}

impl RecordGenerator for NotificationGenerator {
    fn table(&self) -> &str {
        "notifications"
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            "notification_id",
            "user_id",
            "notification_type",
            "title",
            "message",
            "is_read",
            "created_at",
        ]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut title = fake::sentence(rng, 6);
        title.truncate(100);

        let mut record = Record::with_capacity(7);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("user_id"));
        record.push(
            NOTIFICATION_TYPES
                .choose(rng)
                .copied()
                .map(Value::from)
                .unwrap_or(Value::Null),
        );
        record.push(title);
        record.push(fake::text(rng, 300));
        record.push(rng.random_bool(0.5));
        record.push(timestamp::within_days(rng, self.anchor, 90));
        record
    }
}

/// Rows for `favorites`.
#[derive(Debug, Clone)]
pub struct FavoriteGenerator {
    anchor: NaiveDateTime,
}

impl FavoriteGenerator {
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self { anchor }
    }
}

impl RecordGenerator for FavoriteGenerator {
    fn table(&self) -> &str {
        "favorites"
    }

    fn columns(&self) -> Vec<&str> {
        vec!["favorite_id", "user_id", "product_id", "created_at"]
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        let mut record = Record::with_capacity(4);
        record.push(uuid::uuid_v4(rng));
        record.push(parent_keys.value("user_id"));
        record.push(parent_keys.value("product_id"));
        record.push(timestamp::within_days(rng, self.anchor, 365));
        record
    }
}

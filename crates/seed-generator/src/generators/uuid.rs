//! UUID value generator.

use rand::Rng;
use uuid::Uuid;

/// UUID v4 drawn only from `rng`, so seeded workers produce repeatable keys.
pub fn uuid_v4<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    bytes[6] = (bytes[6] & 0x0f) | 0x40; // Version 4
    bytes[8] = (bytes[8] & 0x3f) | 0x80; // Variant RFC 4122

    Uuid::from_bytes(bytes)
}

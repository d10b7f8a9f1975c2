//! Word-list fake data: names, emails, addresses, product copy.
//!
//! Everything draws from the caller's RNG, so output is reproducible for a
//! given seed.

use rand::seq::IndexedRandom;
use rand::Rng;

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Iris", "Jack", "Kate",
    "Leo", "Maya", "Noah", "Olivia", "Peter", "Quinn", "Rose", "Sam", "Tara", "Uma", "Victor",
    "Wendy", "Xavier", "Yara", "Zack", "Sokha", "Dara", "Mei", "Ravi",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Martinez",
    "Anderson", "Taylor", "Thomas", "Moore", "Jackson", "Martin", "Lee", "Thompson", "White",
    "Harris", "Clark", "Lewis", "Robinson", "Walker", "Hall", "Young", "King", "Chan", "Heng",
];

const EMAIL_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "mail.test",
    "shop.test",
];

const ADJECTIVES: &[&str] = &[
    "Premium", "Smart", "Ultra", "Classic", "Modern", "Compact", "Durable", "Eco", "Advanced",
    "Portable", "Wireless", "Deluxe", "Essential", "Signature", "Lightweight",
];

const NOUNS: &[&str] = &[
    "Backpack", "Headphones", "Lamp", "Keyboard", "Bottle", "Jacket", "Sneakers", "Watch",
    "Blender", "Speaker", "Notebook", "Chair", "Camera", "Charger", "Mug",
];

const PHRASE_VERBS: &[&str] = &[
    "Streamlined", "Optimized", "Reimagined", "Curated", "Seamless", "Sustainable", "Innovative",
    "Balanced", "Integrated", "Versatile",
];

const PHRASE_NOUNS: &[&str] = &[
    "collection", "essentials", "solutions", "lifestyle", "outdoors", "home office", "kitchen",
    "wellness", "travel gear", "accessories",
];

const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "commodo", "consequat",
];

const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Park Blvd", "River Rd", "Hill St", "Lake Ave",
    "Sunset Blvd", "Norodom Blvd",
];

const CITIES: &[&str] = &[
    "Springfield",
    "Riverside",
    "Fairview",
    "Georgetown",
    "Franklin",
    "Phnom Penh",
    "Portland",
    "Madison",
];

const STATES: &[&str] = &["CA", "NY", "TX", "WA", "OR", "IL", "MA", "PP"];

const HASH_ALPHABET: &[u8] = b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &'a [&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

/// Random first name.
pub fn first_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, FIRST_NAMES)
}

/// Random last name.
pub fn last_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, LAST_NAMES)
}

/// Username built from a name and a random suffix.
pub fn username<R: Rng + ?Sized>(rng: &mut R, first: &str, last: &str) -> String {
    let suffix: u32 = rng.random_range(0..100_000);
    format!("{}.{}{suffix}", first.to_lowercase(), last.to_lowercase())
}

/// Email address for a username.
pub fn email<R: Rng + ?Sized>(rng: &mut R, username: &str) -> String {
    format!("{username}@{}", pick(rng, EMAIL_DOMAINS))
}

/// Phone number in `+1-555-xxx-xxxx` form (fits in 20 characters).
pub fn phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "+1-555-{:03}-{:04}",
        rng.random_range(0..1000),
        rng.random_range(0..10_000)
    )
}

/// Bcrypt-shaped 60 character password hash. Not a real hash.
pub fn password_hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut hash = String::with_capacity(60);
    hash.push_str("$2b$12$");
    for _ in 0..53 {
        let idx = rng.random_range(0..HASH_ALPHABET.len());
        hash.push(HASH_ALPHABET[idx] as char);
    }
    hash
}

/// Short marketing phrase, used for category and product names.
pub fn catch_phrase<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, PHRASE_VERBS), pick(rng, PHRASE_NOUNS))
}

/// Product name such as "Wireless Speaker".
pub fn product_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, ADJECTIVES), pick(rng, NOUNS))
}

/// Capitalized sentence of `words` lorem words ending in a period.
pub fn sentence<R: Rng + ?Sized>(rng: &mut R, words: usize) -> String {
    let mut out = String::new();
    for i in 0..words.max(1) {
        let word = pick(rng, LOREM_WORDS);
        if i == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push(' ');
            out.push_str(word);
        }
    }
    out.push('.');
    out
}

/// Sentences of lorem text, at most `max_chars` characters long.
pub fn text<R: Rng + ?Sized>(rng: &mut R, max_chars: usize) -> String {
    let mut out = String::new();
    loop {
        let words = rng.random_range(4..=10);
        let next = sentence(rng, words);
        let needed = if out.is_empty() {
            next.len()
        } else {
            next.len() + 1
        };
        if out.len() + needed > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&next);
    }
    if out.is_empty() {
        out = sentence(rng, 1);
        out.truncate(max_chars);
    }
    out
}

/// Postal address on one line.
pub fn address<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {}, {}, {} {:05}",
        rng.random_range(1..10_000),
        pick(rng, STREETS),
        pick(rng, CITIES),
        pick(rng, STATES),
        rng.random_range(0..100_000)
    )
}

/// 13 digit EAN barcode with a valid check digit.
pub fn ean13<R: Rng + ?Sized>(rng: &mut R) -> String {
    let digits: Vec<u32> = (0..12).map(|_| rng.random_range(0..10)).collect();
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    let check = (10 - sum % 10) % 10;

    let mut out: String = digits
        .iter()
        .filter_map(|d| char::from_digit(*d, 10))
        .collect();
    out.extend(char::from_digit(check, 10));
    out
}

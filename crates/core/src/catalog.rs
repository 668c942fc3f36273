//! Fixed catalogs the simulated traffic is drawn from.

pub const PRODUCTS: &[&str] = &[
    "Laptop",
    "Phone",
    "Tablet",
    "Monitor",
    "Headphones",
    "Keyboard",
    "Camera",
    "Smartwatch",
];

pub const CATEGORIES: &[&str] = &[
    "Electronics",
    "Accessories",
    "Computers",
    "Audio",
    "Photography",
    "Wearables",
];

pub const REGIONS: &[&str] = &["North", "South", "East", "West", "Central"];

/// Inclusive quantity bounds for generated records.
pub const QUANTITY_RANGE: (u32, u32) = (1, 5);

/// Inclusive unit price bounds for generated records.
pub const PRICE_RANGE: (f64, f64) = (25.0, 1200.0);

/// Generated customer ids run `C001..=C{CUSTOMER_POOL}`.
pub const CUSTOMER_POOL: u32 = 100;

pub fn customer_id(n: u32) -> String {
    format!("C{:03}", n)
}

pub fn is_product(s: &str) -> bool {
    PRODUCTS.contains(&s)
}

pub fn is_category(s: &str) -> bool {
    CATEGORIES.contains(&s)
}

pub fn is_region(s: &str) -> bool {
    REGIONS.contains(&s)
}

//! Variant enums for purchasable configurations.
//!
//! Refurbished devices are sold in distinct configurations: storage capacity
//! and cosmetic grade. Both are part of a line item's identity key; see
//! `crate::cart::LineKey`.

use serde::{Deserialize, Serialize};

/// Storage capacity of a device variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StorageCapacity {
    #[serde(rename = "64GB")]
    Gb64,
    #[serde(rename = "128GB")]
    Gb128,
    #[serde(rename = "256GB")]
    Gb256,
    #[serde(rename = "512GB")]
    Gb512,
    #[serde(rename = "1TB")]
    Tb1,
}

impl StorageCapacity {
    /// Human-readable label, matching the serialized form.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Gb64 => "64GB",
            Self::Gb128 => "128GB",
            Self::Gb256 => "256GB",
            Self::Gb512 => "512GB",
            Self::Tb1 => "1TB",
        }
    }
}

/// Cosmetic grade of a refurbished device variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Premium,
    Excellent,
    Good,
    Fair,
}

impl Condition {
    /// Human-readable label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Premium => "Premium",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

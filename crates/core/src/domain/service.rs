use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceTypeId(pub String);

/// A category of refinishing work with an administrator-editable base price.
///
/// Prices are whole dollars. `complexity_multiplier` is a percentage
/// (100 = 1.0x) so the catalog stays integer-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: ServiceTypeId,
    pub name: String,
    pub base_price: i64,
    pub price_per_sqft: i64,
    pub complexity_multiplier: i64,
    pub active: bool,
}

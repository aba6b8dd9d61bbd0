use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Комбо (еда и напитки), которое продается вместе с билетами.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
}

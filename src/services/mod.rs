pub mod cleanup;
pub mod circuit_breaker;
pub mod inventory;
pub mod seat_map;

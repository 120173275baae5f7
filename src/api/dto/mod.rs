//! Data Transfer Objects for REST request/response serialization.
//!
//! Money is serialized through `rust_decimal`, identifiers as UUIDs.

pub mod confirm_dto;
pub mod order_dto;
pub mod refund_dto;
pub mod ticket_dto;

pub use confirm_dto::*;
pub use order_dto::*;
pub use refund_dto::*;
pub use ticket_dto::*;

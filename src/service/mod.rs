//! Service layer: business logic orchestration.
//!
//! [`FulfillmentService`] sequences the fulfillment workflow from a
//! normalized payment outcome to a committed order, [`RefundService`]
//! drives the symmetric counter-operation, and [`TicketService`] handles
//! gate check-ins.

pub mod fulfillment;
pub mod refund;
pub mod tickets;

pub use fulfillment::FulfillmentService;
pub use refund::RefundService;
pub use tickets::{CheckIn, TicketService};

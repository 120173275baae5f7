//! Domain layer: identifiers, orders, tickets, and payment types.
//!
//! This module contains the server-side domain model for the fulfillment
//! workflow: typed identifiers, the order aggregate with its line items,
//! individually QR-coded tickets, and the normalized payment vocabulary
//! shared by all providers.

pub mod ids;
pub mod line;
pub mod order;
pub mod payment;
pub mod ticket;

pub use ids::{EventId, OrderId, TicketId, TicketTypeId};
pub use line::OrderItem;
pub use order::{CustomerContact, NewOrder, Order, OrderStatus};
pub use payment::{PaymentMethod, PaymentStatus, ProviderCharge, PurchaseIntent, PurchasedLine};
pub use ticket::{Ticket, TicketStatus, TicketType};

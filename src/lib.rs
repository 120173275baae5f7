//! # boxoffice-gateway
//!
//! Order fulfillment and payment reconciliation service for the
//! boxoffice ticketing platform.
//!
//! This crate reconciles asynchronous payment events (signed webhooks or
//! client-initiated polling) with idempotent order creation, ticket
//! issuance, and atomic inventory accounting. Storefront UI, auth, and
//! QR rendering are external collaborators — this service is the
//! workflow core.
//!
//! ## Architecture
//!
//! ```text
//! Payment providers (webhook)      Clients / Admin (HTTP)
//!     │                                │
//!     ├── Webhook Handlers (api/)      ├── REST Handlers (api/)
//!     │                                │
//!     ├── PaymentProvider (provider/)  │
//!     │                                │
//!     ├── FulfillmentService / RefundService / TicketService (service/)
//!     │
//!     ├── FulfillmentStore (store/)
//!     │
//!     └── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod provider;
pub mod service;
pub mod store;

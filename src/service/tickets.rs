//! Gate check-in: the `valid -> used` ticket transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Ticket, TicketStatus};
use crate::error::GatewayError;
use crate::store::FulfillmentStore;

/// Outcome of a successful check-in.
#[derive(Debug)]
pub struct CheckIn {
    /// The ticket after the transition.
    pub ticket: Ticket,
    /// When the scan was recorded.
    pub used_at: DateTime<Utc>,
}

/// Handles QR-based entry validation.
#[derive(Debug, Clone)]
pub struct TicketService {
    store: Arc<dyn FulfillmentStore>,
}

impl TicketService {
    /// Creates a new service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn FulfillmentStore>) -> Self {
        Self { store }
    }

    /// Checks a ticket in by QR payload.
    ///
    /// The transition is a conditional update at the store, so two
    /// concurrent scans of the same ticket admit exactly one.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::TicketNotFound`] when no ticket carries the
    ///   payload.
    /// - [`GatewayError::Validation`] when the ticket is already used or
    ///   cancelled; the message names the current state.
    /// - [`GatewayError::Database`] on storage failure.
    pub async fn check_in(&self, qr_payload: &str) -> Result<CheckIn, GatewayError> {
        let ticket = self
            .store
            .find_ticket_by_qr(qr_payload)
            .await?
            .ok_or(GatewayError::TicketNotFound)?;

        let now = Utc::now();
        if self.store.mark_ticket_used(ticket.id, now).await? {
            tracing::info!(ticket_id = %ticket.id, "ticket checked in");
            return Ok(CheckIn {
                ticket: Ticket {
                    status: TicketStatus::Used,
                    used_at: Some(now),
                    ..ticket
                },
                used_at: now,
            });
        }

        // The conditional update missed: re-read for an accurate message.
        let current = self
            .store
            .find_ticket_by_qr(qr_payload)
            .await?
            .ok_or(GatewayError::TicketNotFound)?;
        Err(GatewayError::Validation(format!(
            "ticket is {} and cannot be admitted",
            current.status.as_str()
        )))
    }
}

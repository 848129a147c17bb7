use tracing::Instrument;

use crate::accounting::AccountingClient;
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{PurchaseEvent, WebhookEnvelope};
use crate::oauth::CredentialManager;

use super::{EntityResolver, SaleBuilder};

/// What happened to one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a completed purchase; nothing was called.
    Ignored { event: String },
    Reconciled {
        transaction_id: String,
        customer_id: String,
        service_id: String,
        sale_id: String,
    },
}

/// Turns one purchase event into a sale upstream.
///
/// There are no internal retries and no compensation: a failure after the
/// customer or service was created leaves those records in place, and the
/// platform's redelivery is the only retry.
pub struct ReconciliationPipeline {
    credentials: CredentialManager,
    resolver: EntityResolver,
    sale_builder: SaleBuilder,
    accounting: AccountingClient,
}

impl ReconciliationPipeline {
    pub fn new(
        credentials: CredentialManager,
        resolver: EntityResolver,
        sale_builder: SaleBuilder,
        accounting: AccountingClient,
    ) -> Self {
        Self {
            credentials,
            resolver,
            sale_builder,
            accounting,
        }
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Full webhook contract: events other than `PURCHASE_COMPLETE` are
    /// acknowledged without touching the network; completed purchases are
    /// parsed and reconciled.
    pub async fn handle(&self, envelope: WebhookEnvelope) -> ReconcileResult<Outcome> {
        if !envelope.is_purchase_complete() {
            tracing::debug!(event = %envelope.event, "Ignoring webhook event");
            return Ok(Outcome::Ignored {
                event: envelope.event,
            });
        }

        let event: PurchaseEvent =
            serde_json::from_value(envelope.data).map_err(ReconcileError::InvalidPayload)?;
        self.reconcile(&event).await
    }

    /// Steps after the event filter. Every log line emitted while
    /// reconciling carries the transaction id through the span.
    pub async fn reconcile(&self, event: &PurchaseEvent) -> ReconcileResult<Outcome> {
        let span = tracing::info_span!(
            "reconcile",
            transaction = %event.purchase.transaction_id,
            product = %event.product.id
        );
        self.run(event).instrument(span).await
    }

    async fn run(&self, event: &PurchaseEvent) -> ReconcileResult<Outcome> {
        let transaction_id = &event.purchase.transaction_id;
        tracing::info!("Reconciling purchase");

        let token = self.credentials.get_valid_token().await?;

        let customer_id = self.resolver.resolve_customer(&event.buyer, &token).await?;
        let service_id = self
            .resolver
            .resolve_service(&event.product, &event.purchase, &token)
            .await?;

        let sale = self.sale_builder.build_sale(event, &customer_id, &service_id);
        let created = self.accounting.create_sale(&sale, &token).await?;

        tracing::info!(
            customer_id = %customer_id,
            service_id = %service_id,
            sale_id = %created.id,
            "Purchase reconciled"
        );

        Ok(Outcome::Reconciled {
            transaction_id: transaction_id.clone(),
            customer_id,
            service_id,
            sale_id: created.id,
        })
    }
}

use std::sync::Arc;

use crate::config::Config;
use crate::error::DispatchError;
use crate::fulfillment::{FulfillmentOutcome, FulfillmentUpdater};
use crate::manifest::ManifestBuilder;
use crate::models::Order;
use crate::submitter::ManifestSubmitter;

/// What happened to the tracking write-back after a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingUpdate {
    Completed,
    NoOpenFulfillment,
    NoTrackingCode,
    NoOrderId,
    Disabled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub transaction: String,
    pub tracking_number: Option<String>,
    pub tracking_update: TrackingUpdate,
}

pub struct Dispatcher {
    config: Arc<Config>,
    submitter: Arc<dyn ManifestSubmitter>,
    fulfillment: Option<Arc<dyn FulfillmentUpdater>>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Config>,
        submitter: Arc<dyn ManifestSubmitter>,
        fulfillment: Option<Arc<dyn FulfillmentUpdater>>,
    ) -> Self {
        Self {
            config,
            submitter,
            fulfillment,
        }
    }

    /// Builds, uploads and (best effort) writes tracking back for one paid order
    pub async fn run(&self, order: &Order) -> Result<Dispatched, DispatchError> {
        let manifest = ManifestBuilder::new(&self.config).build(order)?;
        let transaction = manifest.unique_transaction_number.clone();

        tracing::info!(%transaction, "Uploading manifest");

        let tracking_codes = self.submitter.submit(&manifest).await?;
        let tracking_number = tracking_codes.into_iter().find(|code| !code.trim().is_empty());

        tracing::info!(
            %transaction,
            tracking = tracking_number.as_deref().unwrap_or("none"),
            "Manifest accepted"
        );

        let tracking_update = self.update_tracking(order.id, tracking_number.as_deref()).await;

        Ok(Dispatched {
            transaction,
            tracking_number,
            tracking_update,
        })
    }

    async fn update_tracking(
        &self,
        order_id: Option<u64>,
        tracking_number: Option<&str>,
    ) -> TrackingUpdate {
        let Some(fulfillment) = &self.fulfillment else {
            return TrackingUpdate::Disabled;
        };

        let Some(tracking_number) = tracking_number else {
            tracing::info!("Carrier returned no tracking code, skipping fulfillment update");
            return TrackingUpdate::NoTrackingCode;
        };

        let Some(order_id) = order_id else {
            tracing::warn!(tracking_number, "Order has no id, skipping fulfillment update");
            return TrackingUpdate::NoOrderId;
        };

        match fulfillment.complete(order_id, tracking_number).await {
            Ok(FulfillmentOutcome::Completed { fulfillment_order_id }) => {
                tracing::info!(
                    order_id,
                    fulfillment_order_id,
                    tracking_number,
                    "Fulfillment completed"
                );
                TrackingUpdate::Completed
            }
            Ok(FulfillmentOutcome::NoOpenFulfillment) => {
                tracing::info!(order_id, "No open fulfillment order, skipping update");
                TrackingUpdate::NoOpenFulfillment
            }
            Err(err) => {
                tracing::warn!(order_id, tracking_number, "Fulfillment update failed: {}", err);
                TrackingUpdate::Failed(err.to_string())
            }
        }
    }
}

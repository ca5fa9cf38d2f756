use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;

use crate::config::ShopifyConfig;
use crate::error::SecondaryUpdateError;
use crate::models::{FulfillmentOrder, FulfillmentOrdersResponse};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    Completed { fulfillment_order_id: u64 },
    NoOpenFulfillment,
}

#[async_trait::async_trait]
pub trait FulfillmentUpdater: Send + Sync {
    /// Closes the open fulfillment of `order_id` with `tracking_number`
    async fn complete(
        &self,
        order_id: u64,
        tracking_number: &str,
    ) -> Result<FulfillmentOutcome, SecondaryUpdateError>;
}

pub struct ShopifyClient {
    config: ShopifyConfig,
    http_client: Client,
}

impl ShopifyClient {
    pub fn new(config: ShopifyConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, http_client })
    }

    fn api_url(&self, path: &str) -> String {
        let domain = self.config.store_domain.trim_end_matches('/');
        let base = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        };

        format!("{}/admin/api/{}/{}", base, self.config.api_version, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(ACCESS_TOKEN_HEADER, &self.config.access_token)
    }

    /// First fulfillment order still waiting to ship
    pub async fn open_fulfillment_order(
        &self,
        order_id: u64,
    ) -> Result<Option<FulfillmentOrder>, SecondaryUpdateError> {
        let url = self.api_url(&format!("orders/{}/fulfillment_orders.json", order_id));

        let response = self.authorized(self.http_client.get(&url)).send().await?;
        let body = successful_body(response).await?;

        let orders: FulfillmentOrdersResponse = match serde_json::from_str(&body) {
            Ok(orders) => orders,
            Err(source) => return Err(SecondaryUpdateError::Decode { source, body }),
        };

        Ok(orders
            .fulfillment_orders
            .into_iter()
            .find(|fo| matches!(fo.status.as_str(), "open" | "in_progress")))
    }
}

#[async_trait::async_trait]
impl FulfillmentUpdater for ShopifyClient {
    async fn complete(
        &self,
        order_id: u64,
        tracking_number: &str,
    ) -> Result<FulfillmentOutcome, SecondaryUpdateError> {
        let Some(fulfillment_order) = self.open_fulfillment_order(order_id).await? else {
            return Ok(FulfillmentOutcome::NoOpenFulfillment);
        };

        let payload = json!({
            "fulfillment": {
                "line_items_by_fulfillment_order": [
                    { "fulfillment_order_id": fulfillment_order.id }
                ],
                "tracking_info": {
                    "number": tracking_number,
                    "url": tracking_url(&self.config.tracking_url_template, tracking_number),
                    "company": self.config.tracking_company,
                },
                "notify_customer": true,
            }
        });

        let response = self
            .authorized(self.http_client.post(self.api_url("fulfillments.json")))
            .json(&payload)
            .send()
            .await?;
        successful_body(response).await?;

        Ok(FulfillmentOutcome::Completed {
            fulfillment_order_id: fulfillment_order.id,
        })
    }
}

async fn successful_body(response: Response) -> Result<String, SecondaryUpdateError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(SecondaryUpdateError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Substitutes `{tracking}` in `template`
pub fn tracking_url(template: &str, tracking_number: &str) -> String {
    template.replace("{tracking}", tracking_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(domain: &str) -> ShopifyClient {
        ShopifyClient::new(ShopifyConfig {
            store_domain: domain.to_string(),
            access_token: "shpat_test".to_string(),
            api_version: "2024-01".to_string(),
            tracking_url_template: "https://track.example/{tracking}".to_string(),
            tracking_company: "Palletforce".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn api_url_adds_https_to_bare_domains() {
        assert_eq!(
            client("shop.myshopify.com").api_url("fulfillments.json"),
            "https://shop.myshopify.com/admin/api/2024-01/fulfillments.json"
        );
        assert_eq!(
            client("http://127.0.0.1:9000/").api_url("orders/1/fulfillment_orders.json"),
            "http://127.0.0.1:9000/admin/api/2024-01/orders/1/fulfillment_orders.json"
        );
    }

    #[test]
    fn tracking_url_interpolates_number() {
        assert_eq!(
            tracking_url("https://t.example/?c={tracking}", "PF123"),
            "https://t.example/?c=PF123"
        );
        assert_eq!(tracking_url("https://t.example/", "PF123"), "https://t.example/");
    }
}

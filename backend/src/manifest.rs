//! Order → carrier manifest mapping.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;

use crate::config::Config;
use crate::coverage;
use crate::error::MappingError;
use crate::fallback::{FallbackChain, has_digit, looks_like_email};
use crate::models::{
    Consignment, DateAndTime, Manifest, ManifestAddress, Notification, NotificationType, Order,
    ShippingAddress,
};
use crate::pallets;

const TRANSACTION_PREFIX: &str = "SHOPIFY";
const COLLECTION_DATE_TYPE: &str = "COLD";
const ACCEPTED: &str = "Y";

const DEFAULT_NAME: &str = "Customer";
const DEFAULT_STREET: &str = "Address not provided";
const DEFAULT_TOWN: &str = "Unknown";
const DEFAULT_POSTCODE: &str = "UNKNOWN";
const DEFAULT_COUNTRY: &str = "GB";
const DEFAULT_PHONE: &str = "000000000";

pub struct ManifestBuilder<'a> {
    config: &'a Config,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Builds the single-consignment manifest for `order`
    pub fn build(&self, order: &Order) -> Result<Manifest, MappingError> {
        let order_number = order
            .order_number
            .or(order.id)
            .ok_or(MappingError::MissingOrderNumber)?;
        let collection_date = collection_date(order.created_at.as_deref())?;

        let empty = ShippingAddress::default();
        let address = order.shipping_address.as_ref().unwrap_or(&empty);
        let delivery = Delivery::resolve(address, order);

        let coverage = coverage::total_coverage(&order.line_items)?;
        let plan = if coverage > Decimal::ZERO {
            pallets::derive(coverage, &self.config.pallets)?
        } else {
            tracing::warn!(
                order_number,
                "No coverage parsed from any line item, declaring minimum load"
            );
            pallets::fallback(order.total_weight, &self.config.pallets)
        };

        let routed = delivery.postcode.and_then(|p| self.delivery_depot(p));
        let (collecting_depot, delivery_depot) = match routed {
            Some(depot) => (self.config.requesting_depot.clone(), depot.to_string()),
            None => (String::new(), String::new()),
        };
        let max_digits = self.config.consignment_number_max_digits;

        let consignment = Consignment {
            requesting_depot: self.config.requesting_depot.clone(),
            collecting_depot,
            delivery_depot,
            consignment_number: consignment_number(order_number, max_digits),
            customer_account_number: self.config.account_number.clone(),
            dates_and_times: vec![DateAndTime {
                date_time_type: COLLECTION_DATE_TYPE.to_string(),
                value: collection_date,
            }],
            pallets: plan.units(),
            pallet_spaces: plan.spaces(),
            weight: plan.weight_kg,
            service_name: self.service_name(order).to_string(),
            customers_unique_reference: order_number.to_string(),
            notes: notes(order, coverage),
            insurance_code: self.config.insurance_code.clone(),
            notifications: vec![self.notification(order, delivery.phone)],
            accepted_status: ACCEPTED.to_string(),
        };

        tracing::debug!(
            order_number,
            %coverage,
            full = plan.full,
            half = plan.half,
            weight = plan.weight_kg,
            "Built manifest"
        );

        Ok(Manifest {
            access_key: self.config.access_key.clone(),
            unique_transaction_number: format!("{}-{}", TRANSACTION_PREFIX, order_number),
            collection_address: self.collection_address(),
            delivery_address: delivery.into_address(),
            consignments: vec![consignment],
        })
    }

    fn collection_address(&self) -> ManifestAddress {
        let c = &self.config.collection;
        ManifestAddress {
            name: c.name.clone(),
            street_address: c.street_address.clone(),
            town: c.town.clone(),
            postcode: c.postcode.clone(),
            country_code: c.country_code.clone(),
            phone_number: c.phone_number.clone(),
            contact_name: c.contact_name.clone(),
        }
    }

    /// Depot for the first two characters of the postcode, if routed
    pub fn delivery_depot(&self, postcode: &str) -> Option<&'a str> {
        let compact: String = postcode.chars().filter(|c| !c.is_whitespace()).collect();
        let prefix: String = compact.chars().take(2).collect::<String>().to_uppercase();

        if prefix.chars().count() < 2 {
            return None;
        }

        self.config.depot_routes.get(&prefix).map(String::as_str)
    }

    /// Paid service when the customer paid for shipping, economy otherwise
    pub fn service_name(&self, order: &Order) -> &'a str {
        let shipping_paid = order
            .shipping_lines
            .iter()
            .fold(Decimal::ZERO, |sum, line| sum.saturating_add(line.price()));

        if shipping_paid > Decimal::ZERO {
            self.config.service_paid.as_str()
        } else {
            self.config.service_economy.as_str()
        }
    }

    /// Email, else SMS to the order's phone, else the placeholder email
    fn notification(&self, order: &Order, phone: Option<&str>) -> Notification {
        if let Some(email) = FallbackChain::new()
            .then_if(order.email.as_deref(), looks_like_email)
            .resolve()
        {
            return Notification {
                notification_type: NotificationType::Email,
                value: email.to_string(),
            };
        }

        match phone {
            Some(phone) => Notification {
                notification_type: NotificationType::Sms,
                value: phone.to_string(),
            },
            None => Notification {
                notification_type: NotificationType::Email,
                value: self.config.notification_fallback_email.clone(),
            },
        }
    }
}

/// Delivery fields as found on the order, before placeholders are applied
struct Delivery<'o> {
    name: Option<&'o str>,
    street_address: Option<&'o str>,
    town: Option<&'o str>,
    postcode: Option<&'o str>,
    country_code: Option<&'o str>,
    phone: Option<&'o str>,
    composed_name: Option<String>,
}

impl<'o> Delivery<'o> {
    fn resolve(address: &'o ShippingAddress, order: &'o Order) -> Self {
        let street_address = FallbackChain::new()
            .then(address.address1.as_deref())
            .then(address.address2.as_deref())
            .resolve();
        let town = FallbackChain::new()
            .then(address.city.as_deref())
            .then(address.province.as_deref())
            .resolve();
        let postcode = FallbackChain::new().then(address.zip.as_deref()).resolve();
        let country_code = FallbackChain::new().then(address.country_code.as_deref()).resolve();
        let phone = FallbackChain::new()
            .then_if(address.phone.as_deref(), has_digit)
            .then_if(order.phone.as_deref(), has_digit)
            .resolve();

        let name = FallbackChain::new().then(address.name.as_deref()).resolve();
        let composed_name = match name {
            Some(_) => None,
            None => {
                let parts: Vec<&str> = [address.first_name.as_deref(), address.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect();
                if parts.is_empty() {
                    FallbackChain::new()
                        .then(address.company.as_deref())
                        .resolve()
                        .map(String::from)
                } else {
                    Some(parts.join(" "))
                }
            }
        };

        Self {
            name,
            street_address,
            town,
            postcode,
            country_code,
            phone,
            composed_name,
        }
    }

    fn into_address(self) -> ManifestAddress {
        let name = self
            .name
            .map(String::from)
            .or(self.composed_name)
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        ManifestAddress {
            contact_name: name.clone(),
            name,
            street_address: self.street_address.unwrap_or(DEFAULT_STREET).to_string(),
            town: self.town.unwrap_or(DEFAULT_TOWN).to_string(),
            postcode: self.postcode.unwrap_or(DEFAULT_POSTCODE).to_string(),
            country_code: self.country_code.unwrap_or(DEFAULT_COUNTRY).to_ascii_uppercase(),
            phone_number: self.phone.unwrap_or(DEFAULT_PHONE).to_string(),
        }
    }
}

/// Calendar date of `created_at` in its own offset, as `YYYYMMDD`
pub fn collection_date(created_at: Option<&str>) -> Result<String, MappingError> {
    let raw = created_at
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(MappingError::MissingCreatedAt)?;

    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d"))
        .map_err(|_| MappingError::InvalidCreatedAt(raw.to_string()))?;

    Ok(date.format("%Y%m%d").to_string())
}

/// Decimal order number, keeping the least significant `max_digits`
pub fn consignment_number(order_number: u64, max_digits: usize) -> String {
    let digits = order_number.to_string();
    let skip = digits.len().saturating_sub(max_digits);
    digits[skip..].to_string()
}

fn notes(order: &Order, coverage: Decimal) -> Vec<String> {
    let mut notes = Vec::new();

    if let Some(note) = FallbackChain::new().then(order.note.as_deref()).resolve() {
        notes.push(note.to_string());
    }

    if coverage > Decimal::ZERO {
        notes.push(format!("Coverage: {:.2} m2", coverage));
    }

    notes
}

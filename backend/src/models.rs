use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;

/// Shopify `orders/paid` webhook body (partial, only fields we need)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Order {
    pub id: Option<u64>,
    pub order_number: Option<u64>,
    pub created_at: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub note: Option<String>,
    pub total_weight: Option<f64>, // grams
    #[serde(default, deserialize_with = "nullable")]
    pub line_items: Vec<LineItem>,
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default, deserialize_with = "nullable")]
    pub shipping_lines: Vec<ShippingLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItem {
    pub quantity: Option<u32>,
    pub title: Option<String>,
    pub variant_title: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub properties: Vec<Property>,
}

/// Line item property; Shopify sends values as strings but apps may not
#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingAddress {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingLine {
    pub title: Option<String>,
    #[serde(default)]
    pub price: Value, // "4.99" or 4.99
}

impl ShippingLine {
    /// Numeric price, treating anything unparseable as zero
    pub fn price(&self) -> Decimal {
        decimal_value(&self.price).unwrap_or(Decimal::ZERO)
    }
}

/// Exact decimal from text such as `"12.50"`, `"2,5"` or `"1.5e2"`
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim().replace(',', ".");

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Exact decimal from a JSON string or number
pub fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

/// Carrier `UploadManifest` request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub access_key: String,
    pub unique_transaction_number: String,
    pub collection_address: ManifestAddress,
    pub delivery_address: ManifestAddress,
    pub consignments: Vec<Consignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAddress {
    pub name: String,
    pub street_address: String,
    pub town: String,
    pub postcode: String,
    pub country_code: String,
    pub phone_number: String,
    pub contact_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consignment {
    pub requesting_depot: String,
    pub collecting_depot: String,
    pub delivery_depot: String,
    pub consignment_number: String,
    #[serde(rename = "CustomerAccountNumber")]
    pub customer_account_number: String,
    pub dates_and_times: Vec<DateAndTime>,
    pub pallets: Vec<PalletUnit>,
    #[serde(serialize_with = "as_string")]
    pub pallet_spaces: u32,
    #[serde(serialize_with = "as_string")]
    pub weight: u32, // kg
    pub service_name: String,
    pub customers_unique_reference: String,
    pub notes: Vec<String>,
    pub insurance_code: String,
    pub notifications: Vec<Notification>,
    pub accepted_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAndTime {
    pub date_time_type: String, // "COLD" = collection date
    pub value: String,          // YYYYMMDD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PalletType {
    #[serde(rename = "F")]
    Full,
    #[serde(rename = "H")]
    Half,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalletUnit {
    pub pallet_type: PalletType,
    #[serde(rename = "numberofPallets", serialize_with = "as_string")]
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Email,
    Sms,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_type: NotificationType,
    pub value: String,
}

/// Carrier upload response (partial, only fields we need)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub tracking_codes: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub failed_consignments: Vec<FailedConsignment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedConsignment {
    pub consignment_number: Option<String>,
    #[serde(default, alias = "failureReasons", deserialize_with = "nullable")]
    pub reasons: Vec<Value>, // carrier-specific, kept verbatim
}

/// Shopify fulfillment order list (partial, only fields we need)
#[derive(Debug, Deserialize)]
pub struct FulfillmentOrdersResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub fulfillment_orders: Vec<FulfillmentOrder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentOrder {
    pub id: u64,
    pub status: String, // e.g., "open", "in_progress", "closed"
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn as_string<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Display,
{
    serializer.collect_str(value)
}

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Static collection point printed on every manifest
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionAddress {
    pub name: String,
    pub street_address: String,
    pub town: String,
    pub postcode: String,
    pub country_code: String,
    pub phone_number: String,
    pub contact_name: String,
}

/// Carrier-contract parameters used by the pallet derivation
#[derive(Debug, Clone, PartialEq)]
pub struct PalletRules {
    pub capacity_m2: Decimal,
    pub full_weight_kg: u32,
    pub half_weight_kg: u32,
    pub min_declared_weight_kg: u32,
}

/// Shopify Admin API credentials for writing tracking numbers back
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    pub store_domain: String,
    pub access_token: String,
    pub api_version: String,
    pub tracking_url_template: String,
    pub tracking_company: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub carrier_url: String,
    pub carrier_timeout: Duration,
    pub access_key: String,
    pub account_number: String,
    pub requesting_depot: String,
    pub insurance_code: String,
    pub service_paid: String,
    pub service_economy: String,
    pub pallets: PalletRules,
    pub consignment_number_max_digits: usize,
    pub depot_routes: HashMap<String, String>,
    pub notification_fallback_email: String,
    pub collection: CollectionAddress,
    pub shopify: Option<ShopifyConfig>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `PF_ACCESS_KEY`: Required - Carrier API access key
    /// - `PF_ACCOUNT_NUMBER`: Required - Carrier customer account number
    /// - `PORT`: Optional - Listen port (default: 3000)
    /// - `CARRIER_URL`: Optional - Manifest upload endpoint (default: Palletforce UAT)
    /// - `CARRIER_TIMEOUT_SECS`: Optional - Upload timeout (default: 20)
    /// - `PF_REQUESTING_DEPOT`: Optional - Our depot code (default: "075")
    /// - `PF_INSURANCE_CODE`: Optional - (default: "05")
    /// - `PF_SERVICE_PAID` / `PF_SERVICE_ECONOMY`: Optional - Service codes (default: "A" / "B")
    /// - `PALLET_CAPACITY_M2`: Optional - Coverage per full pallet (default: 20)
    /// - `FULL_PALLET_WEIGHT_KG` / `HALF_PALLET_WEIGHT_KG`: Optional - (default: 1000 / 500)
    /// - `MIN_DECLARED_WEIGHT_KG`: Optional - Weight used when no coverage parsed (default: 100)
    /// - `CONSIGNMENT_NUMBER_MAX_DIGITS`: Optional - (default: 7)
    /// - `DEPOT_ROUTES`: Optional - Postcode prefix routes, e.g. "LS=021,BD=021"
    /// - `NOTIFICATION_FALLBACK_EMAIL`: Optional - (default: "noreply@example.com")
    /// - `COLLECTION_*`: Optional - Collection address fields
    /// - `SHOPIFY_STORE_DOMAIN` + `SHOPIFY_ACCESS_TOKEN`: Optional - Enables fulfillment updates
    /// - `SHOPIFY_API_VERSION`: Optional - (default: "2024-01")
    /// - `TRACKING_URL_TEMPLATE`: Optional - `{tracking}` is replaced by the tracking number
    /// - `TRACKING_COMPANY`: Optional - (default: "Palletforce")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Parse access key (required)
        let access_key = required(&lookup, "PF_ACCESS_KEY")?;

        // Parse account number (required)
        let account_number = required(&lookup, "PF_ACCOUNT_NUMBER")?;

        let port = parsed(&lookup, "PORT", 3000u16)?;

        let carrier_url = optional(
            &lookup,
            "CARRIER_URL",
            "https://apiuat.palletforce.net/api/ExternalScanning/UploadManifest",
        );

        let carrier_timeout = Duration::from_secs(parsed(&lookup, "CARRIER_TIMEOUT_SECS", 20u64)?);
        if carrier_timeout.is_zero() {
            bail!("CARRIER_TIMEOUT_SECS must be greater than zero");
        }

        let pallets = PalletRules {
            capacity_m2: parsed(&lookup, "PALLET_CAPACITY_M2", Decimal::from(20))?,
            full_weight_kg: parsed(&lookup, "FULL_PALLET_WEIGHT_KG", 1000u32)?,
            half_weight_kg: parsed(&lookup, "HALF_PALLET_WEIGHT_KG", 500u32)?,
            min_declared_weight_kg: parsed(&lookup, "MIN_DECLARED_WEIGHT_KG", 100u32)?,
        };

        if pallets.capacity_m2 <= Decimal::ZERO {
            bail!("PALLET_CAPACITY_M2 must be a positive number");
        }

        if pallets.half_weight_kg > pallets.full_weight_kg {
            bail!("HALF_PALLET_WEIGHT_KG cannot exceed FULL_PALLET_WEIGHT_KG");
        }

        let consignment_number_max_digits =
            parsed(&lookup, "CONSIGNMENT_NUMBER_MAX_DIGITS", 7usize)?;
        if consignment_number_max_digits == 0 {
            bail!("CONSIGNMENT_NUMBER_MAX_DIGITS must be greater than zero");
        }

        let depot_routes = match lookup("DEPOT_ROUTES") {
            Some(raw) => parse_depot_routes(&raw)?,
            None => HashMap::new(),
        };

        let collection = CollectionAddress {
            name: optional(&lookup, "COLLECTION_NAME", "YOUR COMPANY NAME"),
            street_address: optional(&lookup, "COLLECTION_STREET", "WAREHOUSE ADDRESS"),
            town: optional(&lookup, "COLLECTION_TOWN", "CITY"),
            postcode: optional(&lookup, "COLLECTION_POSTCODE", "POSTCODE"),
            country_code: optional(&lookup, "COLLECTION_COUNTRY", "GB"),
            phone_number: optional(&lookup, "COLLECTION_PHONE", "0000000000"),
            contact_name: optional(&lookup, "COLLECTION_CONTACT", "Warehouse"),
        };

        // Fulfillment updates are only enabled when both values are present
        let shopify = match (
            non_blank(lookup("SHOPIFY_STORE_DOMAIN")),
            non_blank(lookup("SHOPIFY_ACCESS_TOKEN")),
        ) {
            (Some(store_domain), Some(access_token)) => Some(ShopifyConfig {
                store_domain,
                access_token,
                api_version: optional(&lookup, "SHOPIFY_API_VERSION", "2024-01"),
                tracking_url_template: optional(
                    &lookup,
                    "TRACKING_URL_TEMPLATE",
                    "https://www.palletforce.com/track/?consignment={tracking}",
                ),
                tracking_company: optional(&lookup, "TRACKING_COMPANY", "Palletforce"),
            }),
            (None, None) => None,
            _ => bail!("SHOPIFY_STORE_DOMAIN and SHOPIFY_ACCESS_TOKEN must be set together"),
        };

        Ok(Config {
            port,
            carrier_url,
            carrier_timeout,
            access_key,
            account_number,
            requesting_depot: optional(&lookup, "PF_REQUESTING_DEPOT", "075"),
            insurance_code: optional(&lookup, "PF_INSURANCE_CODE", "05"),
            service_paid: optional(&lookup, "PF_SERVICE_PAID", "A"),
            service_economy: optional(&lookup, "PF_SERVICE_ECONOMY", "B"),
            pallets,
            consignment_number_max_digits,
            depot_routes,
            notification_fallback_email: optional(
                &lookup,
                "NOTIFICATION_FALLBACK_EMAIL",
                "noreply@example.com",
            ),
            collection,
            shopify,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).with_context(|| format!("{} not set", key))?;

    if value.trim().is_empty() {
        bail!("{} cannot be empty", key);
    }

    Ok(value)
}

fn optional<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup(key)).unwrap_or_else(|| default.to_string())
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_blank(lookup(key)) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} is not a valid value: {}", key, raw)),
        None => Ok(default),
    }
}

/// Parses `PREFIX=DEPOT` pairs separated by commas
pub fn parse_depot_routes(raw: &str) -> Result<HashMap<String, String>> {
    let mut routes = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (prefix, depot) = entry
            .split_once('=')
            .with_context(|| format!("DEPOT_ROUTES entry missing '=': {}", entry))?;

        let prefix = prefix.trim().to_ascii_uppercase();
        let depot = depot.trim();

        if prefix.chars().count() != 2 {
            bail!("DEPOT_ROUTES prefix must be two characters: {}", prefix);
        }

        if depot.is_empty() {
            bail!("DEPOT_ROUTES depot cannot be empty for prefix {}", prefix);
        }

        routes.insert(prefix, depot.to_string());
    }

    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [("PF_ACCESS_KEY", "key"), ("PF_ACCOUNT_NUMBER", "ACC1")];

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.carrier_timeout, Duration::from_secs(20));
        assert_eq!(config.requesting_depot, "075");
        assert_eq!(config.pallets.capacity_m2, Decimal::from(20));
        assert_eq!(config.pallets.full_weight_kg, 1000);
        assert_eq!(config.pallets.half_weight_kg, 500);
        assert_eq!(config.consignment_number_max_digits, 7);
        assert_eq!(config.collection.country_code, "GB");
        assert!(config.depot_routes.is_empty());
        assert!(config.shopify.is_none());
    }

    #[test]
    fn missing_access_key_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PF_ACCOUNT_NUMBER", "ACC1")])).unwrap_err();
        assert!(err.to_string().contains("PF_ACCESS_KEY"));
    }

    #[test]
    fn blank_account_number_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("PF_ACCESS_KEY", "key"),
            ("PF_ACCOUNT_NUMBER", "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PALLET_CAPACITY_M2", "0"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn fractional_capacity_is_read_exactly() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PALLET_CAPACITY_M2", "12.5"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.pallets.capacity_m2, Decimal::new(125, 1));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn shopify_requires_both_domain_and_token() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SHOPIFY_STORE_DOMAIN", "shop.myshopify.com"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        pairs.push(("SHOPIFY_ACCESS_TOKEN", "shpat_123"));
        let shopify = Config::from_lookup(lookup_from(&pairs)).unwrap().shopify.unwrap();
        assert_eq!(shopify.api_version, "2024-01");
        assert!(shopify.tracking_url_template.contains("{tracking}"));
    }

    #[test]
    fn depot_routes_are_upper_cased() {
        let routes = parse_depot_routes("ls=021, BD = 022,").unwrap();
        assert_eq!(routes.get("LS").map(String::as_str), Some("021"));
        assert_eq!(routes.get("BD").map(String::as_str), Some("022"));
    }

    #[test]
    fn malformed_depot_routes_are_rejected() {
        assert!(parse_depot_routes("LS021").is_err());
        assert!(parse_depot_routes("LSX=021").is_err());
        assert!(parse_depot_routes("LS=").is_err());
    }
}

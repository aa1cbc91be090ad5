//! JSON-LD construction and field checks
//!
//! Every page carries a schema.org `LocalBusiness` block; service pages also
//! carry a `Service` block. Blocks already present on a record are never
//! replaced.

use crate::config::SeoConfig;
use crate::types::{PageRecord, SeoPage};
use crate::url_utils::{absolute_url, normalize_origin, site_page_url};
use serde_json::{Map, Value as JsonValue, json};

const SCHEMA_CONTEXT: &str = "https://schema.org";

const LOCAL_BUSINESS_REQUIRED: &[&str] = &["name", "address"];
const LOCAL_BUSINESS_OPTIONAL: &[&str] = &["geo", "openingHours", "aggregateRating", "telephone"];
const SERVICE_REQUIRED: &[&str] = &["serviceType", "provider", "areaServed"];
const SERVICE_OPTIONAL: &[&str] = &["hasOfferCatalog"];

/// Fields missing from a JSON-LD block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCheck {
    pub missing_required: Vec<&'static str>,
    pub missing_optional: Vec<&'static str>,
}

impl SchemaCheck {
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty() && self.missing_optional.is_empty()
    }
}

/// Builds schema.org blocks from business configuration and page fields
pub struct SchemaBuilder<'a> {
    config: &'a SeoConfig,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(config: &'a SeoConfig) -> Self {
        Self { config }
    }

    fn business_id(&self) -> String {
        format!("{}/#business", normalize_origin(&self.config.site.url))
    }

    fn area_served(&self, record: &PageRecord) -> String {
        if record.location.trim().is_empty() {
            self.config.business.locality.clone()
        } else {
            record.location.clone()
        }
    }

    pub fn local_business(&self, record: &PageRecord) -> JsonValue {
        let business = &self.config.business;
        let site = &self.config.site;

        let mut address = Map::new();
        address.insert("@type".into(), json!("PostalAddress"));
        for (key, value) in [
            ("streetAddress", &business.street_address),
            ("addressLocality", &business.locality),
            ("addressRegion", &business.region),
            ("postalCode", &business.postal_code),
            ("addressCountry", &business.country),
        ] {
            if !value.trim().is_empty() {
                address.insert(key.into(), json!(value));
            }
        }

        let image = record.image.as_deref().unwrap_or(&site.default_image);

        let mut block = Map::new();
        block.insert("@context".into(), json!(SCHEMA_CONTEXT));
        block.insert("@type".into(), json!("LocalBusiness"));
        block.insert("@id".into(), json!(self.business_id()));
        block.insert("name".into(), json!(business.name));
        block.insert("url".into(), json!(site_page_url(&site.url, &record.url)));
        block.insert("image".into(), json!(absolute_url(&site.url, image)));
        block.insert("address".into(), JsonValue::Object(address));
        block.insert("areaServed".into(), json!(self.area_served(record)));

        if let Some(telephone) = &business.telephone {
            block.insert("telephone".into(), json!(telephone));
        }
        if let Some(price_range) = &business.price_range {
            block.insert("priceRange".into(), json!(price_range));
        }
        if let (Some(latitude), Some(longitude)) = (business.latitude, business.longitude) {
            block.insert(
                "geo".into(),
                json!({
                    "@type": "GeoCoordinates",
                    "latitude": latitude,
                    "longitude": longitude,
                }),
            );
        }
        if !business.opening_hours.is_empty() {
            block.insert("openingHours".into(), json!(business.opening_hours));
        }
        if let (Some(rating), Some(count)) = (business.rating_value, business.review_count) {
            block.insert(
                "aggregateRating".into(),
                json!({
                    "@type": "AggregateRating",
                    "ratingValue": rating,
                    "reviewCount": count,
                }),
            );
        }

        JsonValue::Object(block)
    }

    /// `Service` block for category and service × location pages
    pub fn service(&self, record: &PageRecord) -> Option<JsonValue> {
        if !record.kind().is_service() || record.service_name.trim().is_empty() {
            return None;
        }

        let site = &self.config.site;
        let offers: Vec<JsonValue> = record
            .target_keywords()
            .iter()
            .map(|keyword| {
                json!({
                    "@type": "Offer",
                    "itemOffered": { "@type": "Service", "name": keyword },
                })
            })
            .collect();

        Some(json!({
            "@context": SCHEMA_CONTEXT,
            "@type": "Service",
            "name": record.link_name(),
            "serviceType": record.service_name,
            "url": site_page_url(&site.url, &record.url),
            "provider": {
                "@type": "LocalBusiness",
                "@id": self.business_id(),
                "name": self.config.business.name,
            },
            "areaServed": {
                "@type": "City",
                "name": self.area_served(record),
            },
            "hasOfferCatalog": {
                "@type": "OfferCatalog",
                "name": format!("{} services", record.service_name),
                "itemListElement": offers,
            },
        }))
    }

    /// Fill missing blocks and refresh the page's structured data list
    pub fn apply(&self, page: &mut SeoPage) {
        if page.record.schema.local_business.is_none() {
            page.record.schema.local_business = Some(self.local_business(&page.record));
        }
        if page.record.schema.service.is_none() {
            page.record.schema.service = self.service(&page.record);
        }
        page.structured_data = page.record.schema.blocks();
    }
}

pub fn check_local_business(block: &JsonValue) -> SchemaCheck {
    check_block(
        block,
        "LocalBusiness",
        LOCAL_BUSINESS_REQUIRED,
        LOCAL_BUSINESS_OPTIONAL,
    )
}

pub fn check_service(block: &JsonValue) -> SchemaCheck {
    check_block(block, "Service", SERVICE_REQUIRED, SERVICE_OPTIONAL)
}

fn check_block(
    block: &JsonValue,
    expected_type: &str,
    required: &[&'static str],
    optional: &[&'static str],
) -> SchemaCheck {
    let mut check = SchemaCheck::default();

    if !has_type(block, expected_type) {
        check.missing_required.push("@type");
    }
    check.missing_required.extend(
        required
            .iter()
            .copied()
            .filter(|field| !has_value(block.get(*field))),
    );
    check.missing_optional.extend(
        optional
            .iter()
            .copied()
            .filter(|field| !has_value(block.get(*field))),
    );

    check
}

fn has_type(block: &JsonValue, expected: &str) -> bool {
    match block.get("@type") {
        Some(JsonValue::String(ty)) => ty == expected,
        Some(JsonValue::Array(types)) => types.iter().any(|ty| ty.as_str() == Some(expected)),
        _ => false,
    }
}

fn has_value(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::String(s)) => !s.trim().is_empty(),
        Some(JsonValue::Array(items)) => !items.is_empty(),
        Some(JsonValue::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

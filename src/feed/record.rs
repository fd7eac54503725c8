// src/feed/record.rs
//! Normalized inventory records and their derived image URLs.

use crate::config::settings::DEFAULT_IMAGE_BASE_URL;
use crate::feed::schema::FeedVehicle;
use serde::{Deserialize, Serialize};

/// Number of gallery images synthesized per vehicle.
pub const IMAGES_PER_VEHICLE: usize = 10;

/// One vehicle, flattened and defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: String,
    pub stock_no: String,
    pub manufacturer: String,
    pub model: String,
    pub year: String,
    pub body_style: String,
    pub color: String,
    pub transmission: String,
    pub fuel_type: String,
    pub engine_size: String,
    pub mileage: String,
    pub mileage_unit: String,
    pub price: String,
    pub dealership: String,
    pub status: String,
    pub description: String,
    pub interior_color: String,
    pub seats: String,
    pub drive_system: String,
    pub exterior_features: String,
    pub interior_features: String,
    pub short_desc: String,
    pub variant: String,
    pub vin: String,
    pub reg_no: String,
    pub purchase_date: String,
    pub turbo: String,
    pub seat_material: String,
    pub airbags: String,
    pub promotion_tag: String,
    pub active: String,
    pub thumbnail_image: String,
    pub images: Vec<String>,
}

/// Builds gallery URLs of the form `{base}/{manufacturer}/{model-slug}/{id}/{n}.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrlBuilder {
    base_url: String,
}

impl Default for ImageUrlBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_BASE_URL)
    }
}

impl ImageUrlBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ten URLs numbered 1 through 10. Existence on the image host is not checked.
    pub fn gallery(&self, manufacturer: &str, model: &str, id: &str) -> Vec<String> {
        let manufacturer_slug = manufacturer.to_lowercase();
        let model_slug = image_model_slug(model);
        (1..=IMAGES_PER_VEHICLE)
            .map(|n| {
                format!(
                    "{}/{}/{}/{}/{}.jpg",
                    self.base_url, manufacturer_slug, model_slug, id, n
                )
            })
            .collect()
    }
}

/// Lowercases and joins whitespace runs with `-`. Unlike
/// [`create_slug`](crate::utils::create_slug) it keeps every other character,
/// matching the directory layout of the image host.
fn image_model_slug(model: &str) -> String {
    let mut slug = String::with_capacity(model.len());
    let mut in_whitespace = false;
    for ch in model.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            slug.push(ch);
        }
    }
    slug
}

fn text_or(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

fn text(value: &Option<String>) -> String {
    text_or(value, "")
}

impl VehicleRecord {
    /// Applies the defaulting rules to one feed entry.
    pub fn from_feed(entry: &FeedVehicle, images: &ImageUrlBuilder) -> Self {
        let id = text(&entry.id);
        let manufacturer = text(&entry.brand_name);
        let model = text(&entry.model_name);
        let gallery = images.gallery(&manufacturer, &model, &id);
        let thumbnail_image = gallery[0].clone();

        let price = match entry.vehicle_special_price.as_deref() {
            Some(special) if !special.is_empty() => special.to_string(),
            _ => text(&entry.vehicle_normal_price),
        };

        VehicleRecord {
            stock_no: id.clone(),
            id,
            manufacturer,
            model,
            year: text(&entry.vehicle_year),
            body_style: text(&entry.vehicle_body_style),
            color: text(&entry.vehicle_color),
            transmission: text(&entry.vehicle_transmission),
            fuel_type: text(&entry.vehicle_fuel_type),
            engine_size: text_or(&entry.vehicle_engine_size, "0"),
            mileage: text_or(&entry.vehicle_mileage, "0"),
            mileage_unit: "km".to_string(),
            price,
            dealership: text(&entry.vehicle_dealership),
            status: text(&entry.vehicle_status),
            description: text(&entry.vehicle_description),
            interior_color: text(&entry.vehicle_interior_color),
            seats: text(&entry.vehicle_seats),
            drive_system: text(&entry.vehicle_wheel_drive),
            exterior_features: text(&entry.vehicle_exterior_features),
            interior_features: text(&entry.vehicle_interior_features),
            short_desc: text(&entry.vehicle_short_description),
            variant: text(&entry.vehicle_variant),
            vin: text(&entry.vehicle_vin),
            reg_no: text(&entry.vehicle_registration_number),
            purchase_date: text(&entry.vehicle_purchase_date),
            turbo: text(&entry.vehicle_turbo),
            seat_material: text(&entry.vehicle_seat_material),
            airbags: text(&entry.vehicle_airbags),
            promotion_tag: text(&entry.vehicle_promotion_tag),
            active: text_or(&entry.vehicle_active, "true"),
            thumbnail_image,
            images: gallery,
        }
    }

    /// Exterior feature list split on commas, blanks dropped.
    pub fn exterior_feature_list(&self) -> Vec<&str> {
        split_features(&self.exterior_features)
    }

    /// Interior feature list split on commas, blanks dropped.
    pub fn interior_feature_list(&self) -> Vec<&str> {
        split_features(&self.interior_features)
    }
}

fn split_features(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

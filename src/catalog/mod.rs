// src/catalog/mod.rs
//! Read-side queries over an inventory snapshot: search, manufacturer and
//! model listings, and the route parameters the page layer pre-renders.

use crate::{feed::VehicleRecord, utils::create_slug};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Sort order for [`search_terms`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Newest first
    #[default]
    Year,
    /// Lowest mileage first
    Mileage,
    /// Most expensive first
    Price,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "year" => Ok(SortKey::Year),
            "mileage" => Ok(SortKey::Mileage),
            "price" => Ok(SortKey::Price),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

/// Manufacturer display name with its route slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manufacturer {
    pub name: String,
    pub slug: String,
}

/// One `/vehicles/{manufacturer}/{model}` page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelRoute {
    pub manufacturer: String,
    pub model: String,
}

/// Substring match of the whole query against manufacturer, model and stock number.
pub fn search(records: &[VehicleRecord], query: &str) -> Vec<VehicleRecord> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|v| {
            v.manufacturer.to_lowercase().contains(&needle)
                || v.model.to_lowercase().contains(&needle)
                || v.stock_no.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Multi-word search ("ford ranger 2021"): every term must hit manufacturer,
/// model or year. A blank query keeps everything.
pub fn search_terms(records: &[VehicleRecord], query: &str, sort: SortKey) -> Vec<VehicleRecord> {
    let lowered = query.to_lowercase();
    let terms: Vec<&str> = lowered.split_whitespace().collect();
    let mut matches: Vec<VehicleRecord> = records
        .iter()
        .filter(|v| {
            terms.iter().all(|term| {
                v.manufacturer.to_lowercase().contains(term)
                    || v.model.to_lowercase().contains(term)
                    || v.year.contains(term)
            })
        })
        .cloned()
        .collect();
    sort_records(&mut matches, sort);
    matches
}

/// Stable sort; values that do not parse as numbers go last.
pub fn sort_records(records: &mut [VehicleRecord], sort: SortKey) {
    match sort {
        SortKey::Year => records.sort_by(|a, b| descending(leading_int(&a.year), leading_int(&b.year))),
        SortKey::Mileage => {
            records.sort_by(|a, b| ascending(leading_int(&a.mileage), leading_int(&b.mileage)))
        }
        SortKey::Price => records.sort_by(|a, b| {
            descending(
                a.price.trim().parse::<f64>().ok(),
                b.price.trim().parse::<f64>().ok(),
            )
        }),
    }
}

fn leading_int(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let digits: String = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(_, c)| c)
        .collect();
    digits.parse::<i64>().ok().map(|n| n as f64)
}

fn ascending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        _ => ascending(a, b),
    }
}

/// Distinct manufacturers in first-seen order.
pub fn manufacturers(records: &[VehicleRecord]) -> Vec<Manufacturer> {
    records
        .iter()
        .map(|v| v.manufacturer.as_str())
        .filter(|name| !name.is_empty())
        .unique()
        .map(|name| Manufacturer {
            name: name.to_string(),
            slug: create_slug(name),
        })
        .collect()
}

/// Vehicles whose manufacturer slugs to `manufacturer_slug`.
pub fn by_manufacturer(records: &[VehicleRecord], manufacturer_slug: &str) -> Vec<VehicleRecord> {
    records
        .iter()
        .filter(|v| create_slug(&v.manufacturer) == manufacturer_slug)
        .cloned()
        .collect()
}

/// Sorted distinct model names offered by one manufacturer.
pub fn models_for(records: &[VehicleRecord], manufacturer_slug: &str) -> Vec<String> {
    records
        .iter()
        .filter(|v| create_slug(&v.manufacturer) == manufacturer_slug)
        .map(|v| v.model.clone())
        .unique()
        .sorted()
        .collect()
}

/// Vehicles of one manufacturer/model page, newest first.
pub fn by_model(
    records: &[VehicleRecord],
    manufacturer_slug: &str,
    model_slug: &str,
) -> Vec<VehicleRecord> {
    let mut matches: Vec<VehicleRecord> = records
        .iter()
        .filter(|v| {
            create_slug(&v.manufacturer) == manufacturer_slug && create_slug(&v.model) == model_slug
        })
        .cloned()
        .collect();
    sort_records(&mut matches, SortKey::Year);
    matches
}

/// Every distinct manufacturer/model slug pair, in first-seen order.
pub fn route_params(records: &[VehicleRecord]) -> Vec<ModelRoute> {
    records
        .iter()
        .map(|v| ModelRoute {
            manufacturer: create_slug(&v.manufacturer),
            model: create_slug(&v.model),
        })
        .unique()
        .collect()
}

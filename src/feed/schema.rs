// src/feed/schema.rs
//! Wire schema of the upstream inventory XML.
//!
//! ```xml
//! <vehicles>
//!   <vehicle>
//!     <id>123</id>
//!     <brand_name>Toyota</brand_name>
//!     <model_name>Corolla</model_name>
//!     ...
//!   </vehicle>
//! </vehicles>
//! ```
//!
//! Every child element is optional; defaults are applied when converting to
//! [`VehicleRecord`](crate::feed::VehicleRecord).
//!
//! Decoding is lenient below the root. Unknown children and non-`<vehicle>`
//! siblings are skipped. A field that appears twice keeps its first value.
//! Markup nested inside a field is flattened to its text content, so
//! `<vehicle_description>Low <b>kms</b></vehicle_description>` reads as
//! `"Low kms"`. Field text is trimmed.

use crate::error::{FeedError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub const ROOT_ELEMENT: &str = "vehicles";
const ENTRY_ELEMENT: &str = "vehicle";

/// The `<vehicles>` document.
#[derive(Debug, Clone, Default)]
pub struct FeedDocument {
    pub vehicles: Vec<FeedVehicle>,
}

/// One `<vehicle>` entry exactly as the feed names its fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedVehicle {
    pub id: Option<String>,
    pub brand_name: Option<String>,
    pub model_name: Option<String>,
    pub vehicle_year: Option<String>,
    pub vehicle_body_style: Option<String>,
    pub vehicle_color: Option<String>,
    pub vehicle_transmission: Option<String>,
    pub vehicle_fuel_type: Option<String>,
    pub vehicle_engine_size: Option<String>,
    pub vehicle_mileage: Option<String>,
    pub vehicle_normal_price: Option<String>,
    pub vehicle_special_price: Option<String>,
    pub vehicle_dealership: Option<String>,
    pub vehicle_status: Option<String>,
    pub vehicle_description: Option<String>,
    pub vehicle_interior_color: Option<String>,
    pub vehicle_seats: Option<String>,
    pub vehicle_wheel_drive: Option<String>,
    pub vehicle_exterior_features: Option<String>,
    pub vehicle_interior_features: Option<String>,
    pub vehicle_short_description: Option<String>,
    pub vehicle_variant: Option<String>,
    pub vehicle_vin: Option<String>,
    pub vehicle_registration_number: Option<String>,
    pub vehicle_purchase_date: Option<String>,
    pub vehicle_turbo: Option<String>,
    pub vehicle_seat_material: Option<String>,
    pub vehicle_airbags: Option<String>,
    pub vehicle_promotion_tag: Option<String>,
    pub vehicle_active: Option<String>,
}

impl FeedVehicle {
    fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        let slot = match name {
            "id" => &mut self.id,
            "brand_name" => &mut self.brand_name,
            "model_name" => &mut self.model_name,
            "vehicle_year" => &mut self.vehicle_year,
            "vehicle_body_style" => &mut self.vehicle_body_style,
            "vehicle_color" => &mut self.vehicle_color,
            "vehicle_transmission" => &mut self.vehicle_transmission,
            "vehicle_fuel_type" => &mut self.vehicle_fuel_type,
            "vehicle_engine_size" => &mut self.vehicle_engine_size,
            "vehicle_mileage" => &mut self.vehicle_mileage,
            "vehicle_normal_price" => &mut self.vehicle_normal_price,
            "vehicle_special_price" => &mut self.vehicle_special_price,
            "vehicle_dealership" => &mut self.vehicle_dealership,
            "vehicle_status" => &mut self.vehicle_status,
            "vehicle_description" => &mut self.vehicle_description,
            "vehicle_interior_color" => &mut self.vehicle_interior_color,
            "vehicle_seats" => &mut self.vehicle_seats,
            "vehicle_wheel_drive" => &mut self.vehicle_wheel_drive,
            "vehicle_exterior_features" => &mut self.vehicle_exterior_features,
            "vehicle_interior_features" => &mut self.vehicle_interior_features,
            "vehicle_short_description" => &mut self.vehicle_short_description,
            "vehicle_variant" => &mut self.vehicle_variant,
            "vehicle_vin" => &mut self.vehicle_vin,
            "vehicle_registration_number" => &mut self.vehicle_registration_number,
            "vehicle_purchase_date" => &mut self.vehicle_purchase_date,
            "vehicle_turbo" => &mut self.vehicle_turbo,
            "vehicle_seat_material" => &mut self.vehicle_seat_material,
            "vehicle_airbags" => &mut self.vehicle_airbags,
            "vehicle_promotion_tag" => &mut self.vehicle_promotion_tag,
            "vehicle_active" => &mut self.vehicle_active,
            _ => return None,
        };
        Some(slot)
    }

    /// Stores `value` unless the field was already set. Unknown names are ignored.
    fn set_first(&mut self, name: &str, value: String) {
        if let Some(slot) = self.field_mut(name) {
            if slot.is_none() {
                *slot = Some(value);
            }
        }
    }
}

/// A field element whose text is being collected.
struct OpenField {
    name: String,
    text: String,
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// Parses a raw feed payload into its schema representation.
///
/// Depth 1 is the root, depth 2 the entries, depth 3 their fields.
pub fn parse_document(xml: &str) -> Result<FeedDocument> {
    let mut reader = Reader::from_str(xml);
    let mut vehicles = Vec::new();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut entry: Option<FeedVehicle> = None;
    let mut field: Option<OpenField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let name = local_name(&e);
                match depth {
                    1 => {
                        check_root(&name, root_seen)?;
                        root_seen = true;
                    }
                    2 if name == ENTRY_ELEMENT => entry = Some(FeedVehicle::default()),
                    3 if entry.is_some() => {
                        field = Some(OpenField {
                            name,
                            text: String::new(),
                        })
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                match depth + 1 {
                    1 => {
                        check_root(&name, root_seen)?;
                        root_seen = true;
                    }
                    2 if name == ENTRY_ELEMENT => vehicles.push(FeedVehicle::default()),
                    3 => {
                        if let Some(vehicle) = entry.as_mut() {
                            vehicle.set_first(&name, String::new());
                        }
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                match depth {
                    3 => {
                        if let (Some(vehicle), Some(open)) = (entry.as_mut(), field.take()) {
                            vehicle.set_first(&open.name, open.text.trim().to_string());
                        }
                    }
                    2 => {
                        if let Some(vehicle) = entry.take() {
                            vehicles.push(vehicle);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if let Some(open) = field.as_mut() {
                    open.text.push_str(&text);
                } else if depth == 0 && !text.trim_start_matches('\u{feff}').trim().is_empty() {
                    return Err(FeedError::Parse(
                        "feed payload has text outside the root element".to_string(),
                    ));
                }
            }
            Event::CData(c) => {
                if let Some(open) = field.as_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(FeedError::Parse("feed payload contains no elements".to_string()));
    }
    if depth != 0 {
        return Err(FeedError::Parse("feed payload ends inside an element".to_string()));
    }
    Ok(FeedDocument { vehicles })
}

fn check_root(name: &str, root_seen: bool) -> Result<()> {
    if root_seen {
        return Err(FeedError::Parse("feed payload has more than one root element".to_string()));
    }
    if name != ROOT_ELEMENT {
        return Err(FeedError::Parse(format!(
            "expected <{}> root element, found <{}>",
            ROOT_ELEMENT, name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_flat_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <vehicles>
              <vehicle>
                <id>42</id>
                <brand_name>Ford</brand_name>
                <model_name>Ranger</model_name>
                <vehicle_year>2021</vehicle_year>
                <unknown_field>ignored</unknown_field>
              </vehicle>
              <vehicle><id>43</id></vehicle>
            </vehicles>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.vehicles.len(), 2);
        assert_eq!(doc.vehicles[0].brand_name.as_deref(), Some("Ford"));
        assert_eq!(doc.vehicles[0].vehicle_year.as_deref(), Some("2021"));
        assert_eq!(doc.vehicles[1].id.as_deref(), Some("43"));
        assert_eq!(doc.vehicles[1].brand_name, None);
    }

    #[test]
    fn test_empty_inventory_is_not_an_error() {
        assert!(parse_document("<vehicles></vehicles>").unwrap().vehicles.is_empty());
        assert!(parse_document("<vehicles/>").unwrap().vehicles.is_empty());
    }

    #[test]
    fn test_wrong_root_is_parse_error() {
        let err = parse_document("<cars><car/></cars>").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn test_non_xml_is_parse_error() {
        assert!(matches!(parse_document(""), Err(FeedError::Parse(_))));
        assert!(matches!(
            parse_document("{\"vehicles\": []}"),
            Err(FeedError::Parse(_))
        ));
        assert!(matches!(
            parse_document("<vehicles><vehicle><id>1</vehicle>"),
            Err(FeedError::Parse(_))
        ));
    }
    #[test]
    fn test_repeated_field_keeps_first_value() {
        let xml = r#"<vehicles>
              <vehicle>
                <id>1</id>
                <brand_name>Toyota</brand_name>
                <brand_name>Lexus</brand_name>
              </vehicle>
            </vehicles>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.vehicles.len(), 1);
        assert_eq!(doc.vehicles[0].brand_name.as_deref(), Some("Toyota"));
    }

    #[test]
    fn test_foreign_siblings_between_entries_are_skipped() {
        let xml = r#"<vehicles>
              <vehicle><id>1</id></vehicle>
              <dealer><name>GN Motors</name><id>999</id></dealer>
              <vehicle><id>2</id></vehicle>
              <generated_at>2026-03-01</generated_at>
              <vehicle><id>3</id></vehicle>
            </vehicles>"#;
        let ids: Vec<_> = parse_document(xml)
            .unwrap()
            .vehicles
            .into_iter()
            .map(|v| v.id.unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_nested_markup_is_flattened_to_text() {
        let xml = r#"<vehicles>
              <vehicle>
                <id>5</id>
                <vehicle_description>Low <b>kms</b>, one <i>careful</i> owner</vehicle_description>
                <vehicle_color><![CDATA[Red & Black]]></vehicle_color>
              </vehicle>
            </vehicles>"#;
        let doc = parse_document(xml).unwrap();
        let vehicle = &doc.vehicles[0];
        assert_eq!(
            vehicle.vehicle_description.as_deref(),
            Some("Low kms, one careful owner")
        );
        assert_eq!(vehicle.vehicle_color.as_deref(), Some("Red & Black"));
        assert_eq!(vehicle.id.as_deref(), Some("5"));
    }

    #[test]
    fn test_self_closing_entries_and_fields() {
        let doc = parse_document("<vehicles><vehicle/><vehicle><id>8</id><brand_name/></vehicle></vehicles>").unwrap();
        assert_eq!(doc.vehicles.len(), 2);
        assert_eq!(doc.vehicles[0], FeedVehicle::default());
        assert_eq!(doc.vehicles[1].brand_name.as_deref(), Some(""));
    }

    #[test]
    fn test_truncated_or_doubled_root_is_parse_error() {
        assert!(matches!(
            parse_document("<vehicles><vehicle><id>1</id>"),
            Err(FeedError::Parse(_))
        ));
        assert!(matches!(
            parse_document("<vehicles/><vehicles/>"),
            Err(FeedError::Parse(_))
        ));
    }
}

//! XML feed fixtures shared by unit and integration tests.

/// One Ford and two non-Ford vehicles.
pub const THREE_VEHICLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vehicles>
  <vehicle>
    <id>101</id>
    <brand_name>Ford</brand_name>
    <model_name>Ranger</model_name>
    <vehicle_year>2021</vehicle_year>
    <vehicle_body_style>Ute</vehicle_body_style>
    <vehicle_color>Blue</vehicle_color>
    <vehicle_transmission>Automatic</vehicle_transmission>
    <vehicle_fuel_type>Diesel</vehicle_fuel_type>
    <vehicle_engine_size>3200</vehicle_engine_size>
    <vehicle_mileage>48210</vehicle_mileage>
    <vehicle_normal_price>42990</vehicle_normal_price>
    <vehicle_dealership>Number1 Motors</vehicle_dealership>
    <vehicle_status>In Stock</vehicle_status>
    <vehicle_exterior_features>Tow Bar, Canopy</vehicle_exterior_features>
    <vehicle_active>true</vehicle_active>
  </vehicle>
  <vehicle>
    <id>102</id>
    <brand_name>Toyota</brand_name>
    <model_name>Corolla</model_name>
    <vehicle_year>2019</vehicle_year>
    <vehicle_mileage>61000</vehicle_mileage>
    <vehicle_normal_price>19990</vehicle_normal_price>
    <vehicle_special_price>18490</vehicle_special_price>
  </vehicle>
  <vehicle>
    <id>103</id>
    <brand_name>Mazda</brand_name>
    <model_name>CX-5</model_name>
    <vehicle_year>2022</vehicle_year>
    <vehicle_mileage>15500</vehicle_mileage>
    <vehicle_normal_price>36990</vehicle_normal_price>
  </vehicle>
</vehicles>
"#;

/// A wider stock list: several models per manufacturer, multi-word names.
pub const SHOWROOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vehicles>
  <vehicle>
    <id>201</id>
    <brand_name>Toyota</brand_name>
    <model_name>Land Cruiser Prado</model_name>
    <vehicle_year>2018</vehicle_year>
    <vehicle_mileage>98000</vehicle_mileage>
    <vehicle_normal_price>54990</vehicle_normal_price>
  </vehicle>
  <vehicle>
    <id>202</id>
    <brand_name>Toyota</brand_name>
    <model_name>Corolla</model_name>
    <vehicle_year>2020</vehicle_year>
    <vehicle_mileage>40000</vehicle_mileage>
    <vehicle_normal_price>22990</vehicle_normal_price>
  </vehicle>
  <vehicle>
    <id>203</id>
    <brand_name>Land Rover</brand_name>
    <model_name>Discovery Sport</model_name>
    <vehicle_year>2021</vehicle_year>
    <vehicle_mileage>30500</vehicle_mileage>
    <vehicle_normal_price>61990</vehicle_normal_price>
  </vehicle>
  <vehicle>
    <id>204</id>
    <brand_name>Toyota</brand_name>
    <model_name>Corolla</model_name>
    <vehicle_year>2023</vehicle_year>
    <vehicle_mileage>8000</vehicle_mileage>
    <vehicle_normal_price>31990</vehicle_normal_price>
  </vehicle>
  <vehicle>
    <id>205</id>
    <brand_name>Toyota</brand_name>
    <model_name>Corolla</model_name>
    <vehicle_year></vehicle_year>
    <vehicle_normal_price>9990</vehicle_normal_price>
  </vehicle>
</vehicles>
"#;

/// A feed that genuinely lists no stock.
pub const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vehicles>
</vehicles>
"#;

/// A payload that is not the expected schema.
pub const WRONG_ROOT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<error><message>maintenance</message></error>
"#;

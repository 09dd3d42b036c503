#[path = "integration/lowering.rs"]
mod lowering;
#[path = "integration/properties.rs"]
mod properties;

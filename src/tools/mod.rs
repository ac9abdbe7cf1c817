pub mod chart_data;
pub mod definition;
pub mod registry;

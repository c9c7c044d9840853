//! External API integrations

pub mod sky_sensor;

pub use sky_sensor::SkySensorClient;

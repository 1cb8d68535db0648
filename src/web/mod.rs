//! Web dashboard for the mortality table
//!
//! Serves a single page with a tab sidebar. Each tab click asks the JSON API
//! for its content, which the page draws with Plotly.js:
//! - national map (choropleth, or bars without boundaries)
//! - monthly series, homicide and low-mortality municipalities
//! - leading causes with their table
//! - sex by department and the age-cohort distribution

pub mod routes;
pub mod server;

pub use server::{ServerConfig, start_server};

//! # mortalidad-dashboard - 2019 Colombian Mortality Explorer
//!
//! Loads the DANE non-fetal death records for 2019 together with the
//! Divipola registry and the CIE-10 code list, joins them into one table and
//! serves an interactive dashboard over it.
//!
//! ## Overview
//!
//! The pipeline runs once at startup:
//!
//! 1. **Load** - spreadsheets (xlsx or csv) become text-only DataFrames
//! 2. **Join** - codes are zero-padded, names and cause descriptions joined in
//! 3. **Classify** - raw age-group codes map to eleven age cohorts
//!
//! Every tab click then recomputes one aggregation and returns a Plotly.js
//! figure description.
//!
//! ## Usage
//!
//! ```bash
//! # Serve the dashboard from ./data on http://127.0.0.1:8050
//! mortalidad-dashboard
//!
//! # Check a new data drop without starting the server
//! mortalidad-dashboard --summary --data-dir ./exports
//! ```
//!
//! ## Tabs
//!
//! | id          | chart |
//! |-------------|-------|
//! | `mapa`      | choropleth per department (bars without GeoJSON) |
//! | `meses`     | deaths per month |
//! | `violencia` | top 5 municipalities by homicides (CIE-10 X95–X99) |
//! | `bajas`     | 10 municipalities with fewest deaths |
//! | `causas`    | top 10 causes, chart and table |
//! | `sexo`      | deaths by sex and department |
//! | `edad`      | deaths by age cohort |

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod figure;
pub mod geo;
pub mod loader;
pub mod normalize;
pub mod report;
pub mod tabs;
pub mod web;

pub use aggregate::{
    AggregateError, CauseCount, LabelCount, MonthCount, SexCount, VIOLENT_CAUSE_PREFIXES,
    deaths_by_age_cohort, deaths_by_department, deaths_by_department_and_sex, deaths_by_month,
    least_mortality_municipalities, top_causes, violent_municipalities,
};
pub use config::{
    ConfigError, DashboardConfig, DataConfig, MapConfig, ServerSection, UiConfig, load_config,
    load_config_file,
};
pub use dashboard::{Dashboard, load_dashboard};
pub use dataset::{JoinStats, MortalityTable};
pub use figure::{Figure, Trace, Values};
pub use geo::{Boundaries, GeoError, load_boundaries};
pub use loader::{InputFiles, LoadError, RawInputs, load_inputs, read_table};
pub use normalize::{AgeCohort, MONTH_LABELS};
pub use report::{ReportError, generate_summary};
pub use tabs::{DataTable, Tab, TabContent, TabEntry};

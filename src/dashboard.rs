//! Tab dispatch
//!
//! Maps a sidebar selection to one aggregation and one chart. Nothing is
//! cached: every request recomputes its aggregation from the shared table.

use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::aggregate::{self, AggregateError};
use crate::config::DashboardConfig;
use crate::dataset::{CAUSA_MUERTE, COD_MUERTE, MortalityTable};
use crate::figure::{BarTrace, ChoroplethTrace, ColorBar, Figure, PieTrace, ScatterTrace, Title};
use crate::geo::{self, Boundaries};
use crate::loader::{InputFiles, LoadError, load_inputs};
use crate::normalize::{AgeCohort, month_label};
use crate::tabs::{DataTable, TableColumn, Tab, TabContent};

/// Where the browser fetches department boundaries from
pub const GEOJSON_URL: &str = "/api/geojson";

const VIOLENT_LIMIT: usize = 5;
const LEAST_MORTALITY_LIMIT: usize = 10;
const TOP_CAUSES_LIMIT: usize = 10;
const TABLE_PAGE_SIZE: usize = 10;

const INVALID_TAB: &str = "Selecciona una pestaña válida.";
const NO_VIOLENT_RECORDS: &str = "⚠️ No se encontraron registros con códigos CIE-10 entre X95–X99.";
const NO_CAUSES: &str = "⚠️ No se encontraron causas de muerte disponibles.";

/// Loaded data plus everything needed to render a tab
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: MortalityTable,
    boundaries: Option<Boundaries>,
    feature_id_key: String,
}

impl Dashboard {
    pub fn new(
        table: MortalityTable,
        boundaries: Option<Boundaries>,
        feature_id_key: impl Into<String>,
    ) -> Self {
        Self {
            table,
            boundaries,
            feature_id_key: feature_id_key.into(),
        }
    }

    pub fn table(&self) -> &MortalityTable {
        &self.table
    }

    pub fn boundaries(&self) -> Option<&Boundaries> {
        self.boundaries.as_ref()
    }

    /// Render the tab named by a UI event
    ///
    /// No event (first page load) shows the map. Unknown ids get a notice
    /// rather than an error.
    pub fn render(&self, tab_id: Option<&str>) -> Result<TabContent, AggregateError> {
        let tab = match tab_id {
            None => Tab::default(),
            Some(id) => match Tab::from_id(id) {
                Some(tab) => tab,
                None => {
                    info!("Unknown tab requested: {}", id);
                    return Ok(TabContent::message(INVALID_TAB));
                }
            },
        };
        self.render_tab(tab)
    }

    pub fn render_tab(&self, tab: Tab) -> Result<TabContent, AggregateError> {
        info!("Tab selected: {}", tab.id());
        let start = Instant::now();

        let content = match tab {
            Tab::Mapa => self.map()?,
            Tab::Meses => self.months()?,
            Tab::Violencia => self.violent_municipalities()?,
            Tab::Bajas => self.least_mortality()?,
            Tab::Causas => self.top_causes()?,
            Tab::Sexo => self.sex_by_department()?,
            Tab::Edad => self.age_distribution()?,
        };

        debug!("Rendered {} in {:.2?}", tab.id(), start.elapsed());
        Ok(content)
    }

    fn map(&self) -> Result<TabContent, AggregateError> {
        let mut rows = aggregate::deaths_by_department(&self.table)?;

        let figure = if self.boundaries.is_some() {
            let (locations, z) = rows.into_iter().map(|r| (r.label, r.count)).unzip();
            Figure::new("Distribución de muertes por departamento (2019)")
                .with_trace(
                    ChoroplethTrace {
                        geojson: GEOJSON_URL.to_string(),
                        featureidkey: self.feature_id_key.clone(),
                        locations,
                        z,
                        colorscale: "Reds",
                        colorbar: ColorBar {
                            title: Title::new("Defunciones"),
                        },
                    }
                    .into(),
                )
                .fit_locations()
        } else {
            rows.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.label.cmp(&b.label)));
            let (labels, counts) = rows.into_iter().map(|r| (r.label, r.count)).unzip();
            Figure::new("Defunciones por departamento (GeoJSON no encontrado)")
                .with_trace(BarTrace::horizontal(labels, counts).into())
                .with_axis_titles("Defunciones", "DEPARTAMENTO")
        };

        Ok(TabContent::Graph { figure })
    }

    fn months(&self) -> Result<TabContent, AggregateError> {
        let (labels, counts) = aggregate::deaths_by_month(&self.table)?
            .into_iter()
            .filter_map(|r| Some((month_label(r.month)?.to_string(), r.count)))
            .unzip();

        let figure = Figure::new("Total de muertes por mes (2019)")
            .with_trace(ScatterTrace::line_with_markers(labels, counts).into())
            .with_axis_titles("Mes", "Defunciones");
        Ok(TabContent::Graph { figure })
    }

    fn violent_municipalities(&self) -> Result<TabContent, AggregateError> {
        let Some(rows) = aggregate::violent_municipalities(&self.table, VIOLENT_LIMIT)? else {
            return Ok(TabContent::warning(NO_VIOLENT_RECORDS));
        };

        let (labels, counts) = rows.into_iter().map(|r| (r.label, r.count)).unzip();
        let figure = Figure::new("5 ciudades más violentas (CIE-10 X95–X99)")
            .with_trace(
                BarTrace::vertical(labels, counts)
                    .colored_by_count("Reds", "Casos")
                    .into(),
            )
            .with_axis_titles("Municipio", "Número de casos")
            .transparent();
        Ok(TabContent::Graph { figure })
    }

    fn least_mortality(&self) -> Result<TabContent, AggregateError> {
        let (labels, values) =
            aggregate::least_mortality_municipalities(&self.table, LEAST_MORTALITY_LIMIT)?
                .into_iter()
                .map(|r| (r.label, r.count))
                .unzip();

        let figure = Figure::new("10 ciudades con menor mortalidad")
            .with_trace(PieTrace { labels, values }.into());
        Ok(TabContent::Graph { figure })
    }

    fn top_causes(&self) -> Result<TabContent, AggregateError> {
        let causes = aggregate::top_causes(&self.table, TOP_CAUSES_LIMIT)?;
        if causes.is_empty() {
            return Ok(TabContent::warning(NO_CAUSES));
        }

        // Largest bar on top: horizontal bars draw bottom-up
        let (labels, counts) = causes
            .iter()
            .rev()
            .map(|c| (c.description.clone(), c.count))
            .unzip();
        let figure = Figure::new("10 principales causas de muerte en Colombia (2019)")
            .with_trace(
                BarTrace::horizontal(labels, counts)
                    .colored_by_count("Blues", "Casos")
                    .into(),
            )
            .with_axis_titles("Casos", CAUSA_MUERTE);

        let data = causes
            .into_iter()
            .map(|c| {
                let mut row = Map::new();
                row.insert(COD_MUERTE.to_string(), Value::from(c.code));
                row.insert(CAUSA_MUERTE.to_string(), Value::from(c.description));
                row.insert("Casos".to_string(), Value::from(c.count));
                row
            })
            .collect();
        let table = DataTable {
            columns: vec![
                TableColumn::new("Código CIE-10", COD_MUERTE),
                TableColumn::new("Causa", CAUSA_MUERTE),
                TableColumn::new("Total de Casos", "Casos"),
            ],
            data,
            page_size: TABLE_PAGE_SIZE,
        };

        Ok(TabContent::GraphWithTable { figure, table })
    }

    fn sex_by_department(&self) -> Result<TabContent, AggregateError> {
        let rows = aggregate::deaths_by_department_and_sex(&self.table)?;

        let mut sexes: Vec<&str> = rows.iter().map(|r| r.sex.as_str()).collect();
        sexes.sort_unstable();
        sexes.dedup();

        let mut figure = Figure::new("Muertes por sexo y departamento")
            .stacked()
            .with_axis_titles("DEPARTAMENTO", "Casos")
            .with_legend_title("SEXO");
        for sex in sexes {
            let (departments, counts) = rows
                .iter()
                .filter(|r| r.sex == sex)
                .map(|r| (r.department.clone(), r.count))
                .unzip();
            figure = figure.with_trace(BarTrace::vertical(departments, counts).named(sex).into());
        }

        Ok(TabContent::Graph { figure })
    }

    fn age_distribution(&self) -> Result<TabContent, AggregateError> {
        let (labels, counts) = aggregate::deaths_by_age_cohort(&self.table)?
            .into_iter()
            .map(|(cohort, count)| (cohort.label().to_string(), count))
            .unzip();

        let figure = Figure::new("Distribución de muertes por grupo de edad")
            .with_trace(BarTrace::vertical(labels, counts).into())
            .with_axis_titles("GRUPO_EDAD_CAT", "Defunciones")
            .with_x_categories(AgeCohort::labels());
        Ok(TabContent::Graph { figure })
    }
}

/// Locate, read and join every input named by the configuration
pub fn load_dashboard(config: &DashboardConfig) -> Result<Dashboard, LoadError> {
    info!("Loading data from {}", config.data.dir.display());
    let start = Instant::now();

    let files = InputFiles::resolve(&config.data)?;
    let inputs = load_inputs(&files)?;
    let table = MortalityTable::from_inputs(inputs)?;
    let boundaries = geo::load_boundaries(files.geojson.as_deref(), &config.map.feature_id_key);

    info!("Data ready in {:.2?}", start.elapsed());
    Ok(Dashboard::new(
        table,
        boundaries,
        config.map.feature_id_key.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures;
    use crate::figure::{Trace, Values};
    use polars::prelude::df;

    const GEOJSON: &str = r#"{"type": "FeatureCollection", "features": []}"#;

    fn dashboard(with_map: bool) -> Dashboard {
        let boundaries = with_map
            .then(|| Boundaries::parse(GEOJSON.to_string(), "properties.NOMBRE_DPT").unwrap());
        Dashboard::new(fixtures::table(), boundaries, "properties.NOMBRE_DPT")
    }

    fn graph(content: TabContent) -> Figure {
        match content {
            TabContent::Graph { figure } => figure,
            other => panic!("expected a graph, got {:?}", other),
        }
    }

    #[test]
    fn test_no_trigger_renders_map() {
        let figure = graph(dashboard(true).render(None).unwrap());
        assert_eq!(
            figure.layout.title.text,
            "Distribución de muertes por departamento (2019)"
        );
        match &figure.data[0] {
            Trace::Choropleth(trace) => {
                assert_eq!(trace.geojson, GEOJSON_URL);
                assert_eq!(trace.featureidkey, "properties.NOMBRE_DPT");
                assert_eq!(trace.locations.len(), 3);
                assert_eq!(trace.colorscale, "Reds");
            }
            other => panic!("expected choropleth, got {:?}", other),
        }
        assert!(figure.layout.geo.is_some());
    }

    #[test]
    fn test_map_falls_back_to_bars() {
        let figure = graph(dashboard(false).render(Some("mapa")).unwrap());
        assert_eq!(
            figure.layout.title.text,
            "Defunciones por departamento (GeoJSON no encontrado)"
        );
        match &figure.data[0] {
            Trace::Bar(trace) => {
                assert_eq!(trace.orientation, Some("h"));
                assert_eq!(trace.x, Values::Counts(vec![3, 3, 3]));
            }
            other => panic!("expected bar, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tab_message() {
        let content = dashboard(true).render(Some("nada")).unwrap();
        match content {
            TabContent::Message { message } => assert_eq!(message, INVALID_TAB),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_months_use_labels() {
        let figure = graph(dashboard(true).render_tab(Tab::Meses).unwrap());
        match &figure.data[0] {
            Trace::Scatter(trace) => {
                assert_eq!(
                    trace.x,
                    Values::Labels(vec![
                        "Ene".to_string(),
                        "Feb".to_string(),
                        "Mar".to_string(),
                        "Dic".to_string()
                    ])
                );
                assert_eq!(trace.mode, "lines+markers");
            }
            other => panic!("expected scatter, got {:?}", other),
        }
    }

    #[test]
    fn test_violence_warning_when_empty() {
        let deaths = df!(
            "COD_DEPARTAMENTO" => &["5"],
            "COD_MUNICIPIO" => &["5001"],
            "COD_MUERTE" => &["I219"],
            "SEXO" => &["1"],
            "GRUPO_EDAD1" => &["20"],
        )
        .unwrap();
        let table =
            MortalityTable::build(deaths, fixtures::divipola(), fixtures::causes()).unwrap();
        let dashboard = Dashboard::new(table, None, "properties.NOMBRE_DPT");

        match dashboard.render_tab(Tab::Violencia).unwrap() {
            TabContent::Warning { message } => assert_eq!(message, NO_VIOLENT_RECORDS),
            other => panic!("expected warning, got {:?}", other),
        }
    }

    #[test]
    fn test_violence_chart() {
        let figure = graph(dashboard(true).render_tab(Tab::Violencia).unwrap());
        assert_eq!(figure.layout.plot_bgcolor, Some("rgba(0,0,0,0)"));
        match &figure.data[0] {
            Trace::Bar(trace) => {
                assert_eq!(trace.y, Values::Counts(vec![2, 1, 1]));
                assert_eq!(trace.marker.as_ref().map(|m| m.colorscale), Some("Reds"));
            }
            other => panic!("expected bar, got {:?}", other),
        }
    }

    #[test]
    fn test_causes_graph_and_table() {
        let content = dashboard(true).render_tab(Tab::Causas).unwrap();
        let TabContent::GraphWithTable { figure, table } = content else {
            panic!("expected graph with table");
        };
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.page_size, 10);
        assert_eq!(table.data.len(), 5);
        assert_eq!(table.data[0]["COD_MUERTE"], "I219");
        assert_eq!(table.data[0]["Casos"], 3);

        match &figure.data[0] {
            Trace::Bar(trace) => {
                // Chart is ascending, table descending
                assert_eq!(trace.x, Values::Counts(vec![1, 1, 1, 3, 3]));
            }
            other => panic!("expected bar, got {:?}", other),
        }
    }

    #[test]
    fn test_causes_warning_when_no_descriptions() {
        let causes = df!(
            "COD_CIE_10" => &["A000"],
            "DESC_CIE_10" => &["Cólera"],
        )
        .unwrap();
        let table = MortalityTable::build(fixtures::deaths(), fixtures::divipola(), causes).unwrap();
        let dashboard = Dashboard::new(table, None, "properties.NOMBRE_DPT");
        match dashboard.render_tab(Tab::Causas).unwrap() {
            TabContent::Warning { message } => assert_eq!(message, NO_CAUSES),
            other => panic!("expected warning, got {:?}", other),
        }
    }

    #[test]
    fn test_sex_traces_stacked() {
        let figure = graph(dashboard(true).render_tab(Tab::Sexo).unwrap());
        assert_eq!(figure.layout.barmode, Some("stack"));
        let names: Vec<Option<&str>> = figure
            .data
            .iter()
            .map(|trace| match trace {
                Trace::Bar(bar) => bar.name.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec![Some("Hombre"), Some("Mujer")]);
    }

    #[test]
    fn test_age_chart_fixed_order() {
        let figure = graph(dashboard(true).render_tab(Tab::Edad).unwrap());
        let axis = figure.layout.xaxis.as_ref().unwrap();
        assert_eq!(axis.categoryarray.as_ref().unwrap().len(), 11);
        match &figure.data[0] {
            Trace::Bar(trace) => assert_eq!(trace.x, Values::Labels(AgeCohort::labels())),
            other => panic!("expected bar, got {:?}", other),
        }
    }

    #[test]
    fn test_least_mortality_pie() {
        let figure = graph(dashboard(true).render_tab(Tab::Bajas).unwrap());
        match &figure.data[0] {
            Trace::Pie(trace) => {
                assert_eq!(trace.labels[0], "BELLO");
                assert_eq!(trace.values, vec![1, 2, 3, 3]);
            }
            other => panic!("expected pie, got {:?}", other),
        }
    }
}

//! Sidebar tabs and the content each one renders

use serde::Serialize;

use crate::figure::Figure;

/// The seven dashboard views, in sidebar order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    /// National choropleth of deaths per department
    #[default]
    Mapa,
    /// Deaths per month
    Meses,
    /// Municipalities with most homicides
    Violencia,
    /// Municipalities with fewest deaths
    Bajas,
    /// Leading causes of death
    Causas,
    /// Deaths by sex and department
    Sexo,
    /// Deaths by age cohort
    Edad,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Mapa,
        Tab::Meses,
        Tab::Violencia,
        Tab::Bajas,
        Tab::Causas,
        Tab::Sexo,
        Tab::Edad,
    ];

    /// Identifier used in URLs and element ids
    pub fn id(&self) -> &'static str {
        match self {
            Tab::Mapa => "mapa",
            Tab::Meses => "meses",
            Tab::Violencia => "violencia",
            Tab::Bajas => "bajas",
            Tab::Causas => "causas",
            Tab::Sexo => "sexo",
            Tab::Edad => "edad",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Mapa => "Mapa nacional",
            Tab::Meses => "Muertes por mes",
            Tab::Violencia => "Ciudades violentas",
            Tab::Bajas => "Ciudades con menor mortalidad",
            Tab::Causas => "Principales causas",
            Tab::Sexo => "Muertes por sexo",
            Tab::Edad => "Distribución por edad",
        }
    }

    /// Ordinal shown before the label ("1.", "2.", ...)
    pub fn marker(&self) -> String {
        let position = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        format!("{}.", position + 1)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().trim_start_matches("tab-");
        Self::ALL.into_iter().find(|tab| tab.id() == id)
    }
}

/// Sidebar entry as sent to the browser
#[derive(Debug, Clone, Serialize)]
pub struct TabEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub marker: String,
}

/// All sidebar entries in order
pub fn sidebar() -> Vec<TabEntry> {
    Tab::ALL
        .iter()
        .map(|tab| TabEntry {
            id: tab.id(),
            label: tab.label(),
            marker: tab.marker(),
        })
        .collect()
}

/// What the content area shows after a tab is selected
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TabContent {
    Graph { figure: Figure },
    GraphWithTable { figure: Figure, table: DataTable },
    /// Highlighted notice shown instead of an empty chart
    Warning { message: String },
    /// Plain notice
    Message { message: String },
}

impl TabContent {
    pub fn warning(message: impl Into<String>) -> Self {
        TabContent::Warning {
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        TabContent::Message {
            message: message.into(),
        }
    }

    pub fn figure(&self) -> Option<&Figure> {
        match self {
            TabContent::Graph { figure } | TabContent::GraphWithTable { figure, .. } => {
                Some(figure)
            }
            TabContent::Warning { .. } | TabContent::Message { .. } => None,
        }
    }
}

/// Paged table under a chart
#[derive(Debug, Clone, Serialize)]
pub struct DataTable {
    pub columns: Vec<TableColumn>,
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    pub name: String,
    pub id: String,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

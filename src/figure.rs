//! Figure descriptions for the browser
//!
//! Serializes to the `{ data, layout }` shape Plotly.js expects, so the
//! frontend can hand each figure straight to `Plotly.newPlot`.

use serde::Serialize;

/// A complete chart: traces plus layout
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                title: Title::new(title),
                ..Layout::default()
            },
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }

    pub fn with_axis_titles(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.layout.xaxis.get_or_insert_with(Axis::default).title = Some(Title::new(x));
        self.layout.yaxis.get_or_insert_with(Axis::default).title = Some(Title::new(y));
        self
    }

    /// Fix the x axis to the given category order
    pub fn with_x_categories(mut self, categories: Vec<String>) -> Self {
        let axis = self.layout.xaxis.get_or_insert_with(Axis::default);
        axis.categoryorder = Some("array");
        axis.categoryarray = Some(categories);
        self
    }

    pub fn stacked(mut self) -> Self {
        self.layout.barmode = Some("stack");
        self
    }

    pub fn with_legend_title(mut self, title: impl Into<String>) -> Self {
        self.layout.legend = Some(Legend {
            title: Title::new(title),
        });
        self
    }

    /// Draw on a transparent background
    pub fn transparent(mut self) -> Self {
        self.layout.plot_bgcolor = Some(TRANSPARENT);
        self.layout.paper_bgcolor = Some(TRANSPARENT);
        self
    }

    /// Zoom the map to the plotted locations and hide the base map
    pub fn fit_locations(mut self) -> Self {
        self.layout.geo = Some(Geo {
            fitbounds: "locations",
            visible: false,
        });
        self
    }
}

const TRANSPARENT: &str = "rgba(0,0,0,0)";

/// Category labels or counts along one axis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Labels(Vec<String>),
    Counts(Vec<u64>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar(BarTrace),
    Scatter(ScatterTrace),
    Pie(PieTrace),
    Choropleth(ChoroplethTrace),
}

#[derive(Debug, Clone, Serialize)]
pub struct BarTrace {
    pub x: Values,
    pub y: Values,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl BarTrace {
    /// Vertical bars: categories on x, counts on y
    pub fn vertical(labels: Vec<String>, counts: Vec<u64>) -> Self {
        Self {
            x: Values::Labels(labels),
            y: Values::Counts(counts),
            orientation: None,
            name: None,
            marker: None,
        }
    }

    /// Horizontal bars: counts on x, categories on y
    pub fn horizontal(labels: Vec<String>, counts: Vec<u64>) -> Self {
        Self {
            x: Values::Counts(counts),
            y: Values::Labels(labels),
            orientation: Some("h"),
            name: None,
            marker: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Color each bar by its count on a continuous scale
    pub fn colored_by_count(mut self, colorscale: &'static str, legend: &str) -> Self {
        let counts = match (&self.x, &self.y) {
            (_, Values::Counts(c)) | (Values::Counts(c), _) => c.clone(),
            _ => Vec::new(),
        };
        self.marker = Some(Marker {
            color: counts,
            colorscale,
            showscale: true,
            colorbar: ColorBar {
                title: Title::new(legend),
            },
        });
        self
    }
}

impl From<BarTrace> for Trace {
    fn from(trace: BarTrace) -> Self {
        Trace::Bar(trace)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: Vec<u64>,
    pub colorscale: &'static str,
    pub showscale: bool,
    pub colorbar: ColorBar,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

/// Line with markers
#[derive(Debug, Clone, Serialize)]
pub struct ScatterTrace {
    pub x: Values,
    pub y: Values,
    pub mode: &'static str,
}

impl ScatterTrace {
    pub fn line_with_markers(labels: Vec<String>, counts: Vec<u64>) -> Self {
        Self {
            x: Values::Labels(labels),
            y: Values::Counts(counts),
            mode: "lines+markers",
        }
    }
}

impl From<ScatterTrace> for Trace {
    fn from(trace: ScatterTrace) -> Self {
        Trace::Scatter(trace)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PieTrace {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl From<PieTrace> for Trace {
    fn from(trace: PieTrace) -> Self {
        Trace::Pie(trace)
    }
}

/// Filled regions matched against GeoJSON features
#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethTrace {
    /// URL the browser fetches the boundaries from
    pub geojson: String,
    pub featureidkey: String,
    pub locations: Vec<String>,
    pub z: Vec<u64>,
    pub colorscale: &'static str,
    pub colorbar: ColorBar,
}

impl From<ChoroplethTrace> for Trace {
    fn from(trace: ChoroplethTrace) -> Self {
        Trace::Choropleth(trace)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_bgcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_bgcolor: Option<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoryorder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoryarray: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize)]
pub struct Geo {
    pub fitbounds: &'static str,
    pub visible: bool,
}

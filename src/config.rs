use std::time::Duration;

use crate::data::model::Measurement;

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Static layout constants for the page. Built once in `main` and passed
/// by reference; nothing reads configuration from the environment.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// How long a connection may stay silent before it is dropped.
    pub request_timeout: Duration,
    pub title: String,
    pub subtitle: String,
    pub stylesheet_url: String,
    pub plotly_url: String,
    /// Rows per page in the data table.
    pub page_size: usize,
    /// Marker size = petal width × this factor.
    pub marker_size_scale: f64,
    pub scatter_height: usize,
    pub histogram_height: usize,
    /// Histogram rows, two figures each.
    pub histogram_rows: Vec<[Measurement; 2]>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8050".to_string(),
            request_timeout: Duration::from_secs(5),
            title: "Iris Sepal and Petal Scatter Chart".to_string(),
            subtitle: "Show the width and length of the sepal and petal of different iris species"
                .to_string(),
            stylesheet_url: "https://cdn.rawgit.com/plotly/dash-app-stylesheets/2d266c578d2a6e8850ebce48fdb52759b2aef506/stylesheet-oil-and-gas.css".to_string(),
            plotly_url: "https://cdn.plot.ly/plotly-2.35.2.min.js".to_string(),
            page_size: 6,
            marker_size_scale: 10.0,
            scatter_height: 300,
            histogram_height: 250,
            histogram_rows: vec![
                [Measurement::SepalWidth, Measurement::SepalLength],
                [Measurement::PetalWidth, Measurement::PetalLength],
            ],
        }
    }
}

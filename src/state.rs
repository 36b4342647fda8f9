use crate::color::{CategoryCodes, ColorMap};
use crate::config::DashboardConfig;
use crate::data::filter::{Selection, default_selection};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything the page and its callback read. Built once at startup and only
/// ever borrowed immutably afterwards, so request handlers share it freely.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset.
    pub dataset: Dataset,

    /// Category codes for the colour encoding, fixed for the process lifetime.
    pub codes: CategoryCodes,

    /// Colour scale matching `codes`.
    pub color_map: ColorMap,
}

impl AppState {
    /// Ingest the loaded dataset and derive codes and colours from it.
    pub fn new(config: DashboardConfig, dataset: Dataset) -> Self {
        let codes = CategoryCodes::from_dataset(&dataset);
        let color_map = ColorMap::new(&codes);
        Self {
            config,
            dataset,
            codes,
            color_map,
        }
    }

    /// The selection the page starts with.
    pub fn initial_selection(&self) -> Selection {
        default_selection(&self.dataset)
    }
}

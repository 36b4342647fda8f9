use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::callbacks::{Callback, CallbackError, CallbackRegistry, ComponentProperty};
use crate::data::filter::Selection;
use crate::data::table::{TablePage, TableQuery, TableQueryError, query_table};
use crate::state::AppState;
use crate::ui::panels::{self, CHECKLIST_ID};
use crate::ui::plot::{self, compute_chart_series, figure_json};

pub const SCATTER_ID: &str = "scatterplot";

// ---------------------------------------------------------------------------
// Wire types for callback requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InputValue {
    pub id: String,
    pub property: String,
    pub value: Value,
}

/// Body of `POST /_dash-update-component`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub output: String,
    pub inputs: Vec<InputValue>,
}

#[derive(Debug, Serialize)]
struct HistogramRow {
    figures: Vec<HistogramCell>,
}

#[derive(Debug, Serialize)]
struct HistogramCell {
    id: String,
    figure: Value,
}

// ---------------------------------------------------------------------------
// The dashboard
// ---------------------------------------------------------------------------

/// Read-only application state plus the page's callbacks.
pub struct DashApp {
    pub state: AppState,
    callbacks: CallbackRegistry,
}

impl DashApp {
    pub fn new(state: AppState) -> Result<Self, CallbackError> {
        let mut callbacks = CallbackRegistry::default();
        callbacks.register(Callback {
            name: "update_figure",
            input: ComponentProperty::new(CHECKLIST_ID, "value"),
            output: ComponentProperty::new(SCATTER_ID, "figure"),
            handler: update_figure,
        })?;
        Ok(Self { state, callbacks })
    }

    /// The initial component tree, everything drawn from the full dataset.
    pub fn layout(&self) -> Result<Value, serde_json::Error> {
        let st = &self.state;
        let initial = st.initial_selection();
        let mut histograms = Vec::with_capacity(st.config.histogram_rows.len());
        for row in &st.config.histogram_rows {
            let mut figures = Vec::with_capacity(row.len());
            for m in row {
                figures.push(HistogramCell {
                    id: format!("{}--row-ids", m.column()),
                    figure: figure_json(&plot::histogram_figure(st, *m))?,
                });
            }
            histograms.push(HistogramRow { figures });
        }
        let series = compute_chart_series(
            &st.dataset,
            &st.codes,
            &initial,
            st.config.marker_size_scale,
        );
        let scatter = figure_json(&plot::scatter_figure(st, series))?;

        Ok(json!({
            "title": st.config.title,
            "subtitle": st.config.subtitle,
            "checklist": panels::species_checklist(&st.dataset, &initial),
            "scatter": {
                "id": SCATTER_ID,
                "figure": scatter,
            },
            "table": panels::table_config(st),
            "histograms": histograms,
            "callbacks": self
                .callbacks
                .iter()
                .map(|c| json!({
                    "name": c.name,
                    "input": c.input.to_string(),
                    "output": c.output.to_string(),
                }))
                .collect::<Vec<_>>(),
        }))
    }

    /// Handle one browser-reported input change.
    pub fn update_component(&self, req: &UpdateRequest) -> Result<Value, CallbackError> {
        let [input] = req.inputs.as_slice() else {
            return Err(CallbackError::InvalidInput {
                input: ComponentProperty::new("?", "?"),
                reason: format!("expected exactly one input, got {}", req.inputs.len()),
            });
        };
        let input_prop = ComponentProperty::new(&input.id, &input.property);
        let (output, value) =
            self.callbacks
                .dispatch(&self.state, &req.output, &input_prop, &input.value)?;

        let mut props = serde_json::Map::new();
        props.insert(output.property, value);
        let mut response = serde_json::Map::new();
        response.insert(output.id, Value::Object(props));
        Ok(json!({ "response": response }))
    }

    /// One page of the data table. Ignores the checklist selection.
    pub fn table_page(&self, query: &TableQuery) -> Result<TablePage<'_>, TableQueryError> {
        query_table(&self.state.dataset, query, self.state.config.page_size)
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Checklist value → scatter figure for the selected species.
fn update_figure(state: &AppState, value: &Value) -> Result<Value, CallbackError> {
    let invalid = |reason: &str| CallbackError::InvalidInput {
        input: ComponentProperty::new(CHECKLIST_ID, "value"),
        reason: reason.to_string(),
    };
    let items = value
        .as_array()
        .ok_or_else(|| invalid("expected an array of species labels"))?;
    let selection = items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Selection>>()
        .ok_or_else(|| invalid("species labels must be strings"))?;

    let series = compute_chart_series(
        &state.dataset,
        &state.codes,
        &selection,
        state.config.marker_size_scale,
    );
    log::debug!(
        "update_figure: {} species selected, {} points",
        selection.len(),
        series.len()
    );
    figure_json(&plot::scatter_figure(state, series)).map_err(|e| CallbackError::Serialize {
        output: ComponentProperty::new(SCATTER_ID, "figure"),
        reason: e.to_string(),
    })
}

use plotly::common::{Marker, Mode};
use plotly::layout::{Axis, BarMode, HoverMode, Margin};
use plotly::{Histogram, Layout, Plot, Scatter};
use serde_json::Value;

use crate::color::CategoryCodes;
use crate::data::filter::{Selection, selected_records};
use crate::data::model::{Dataset, Measurement};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// ChartSeries – per-point data for the scatter plot
// ---------------------------------------------------------------------------

/// Everything the scatter renderer needs, one entry per selected record.
/// All vectors have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    /// Sepal widths.
    pub x: Vec<f64>,
    /// Sepal lengths.
    pub y: Vec<f64>,
    /// Scaled petal widths.
    pub size: Vec<f64>,
    /// Category codes.
    pub color: Vec<u32>,
    /// Species labels shown on hover.
    pub text: Vec<String>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }
}

/// Project the selected records onto scatter points, in dataset order.
///
/// Labels in `selection` that the dataset does not contain match nothing,
/// and an empty selection produces an empty series.
pub fn compute_chart_series(
    dataset: &Dataset,
    codes: &CategoryCodes,
    selection: &Selection,
    size_scale: f64,
) -> ChartSeries {
    let mut series = ChartSeries::default();
    for rec in selected_records(dataset, selection) {
        // codes are built from this dataset, so every record has one
        let Some(code) = codes.code_for(&rec.species) else {
            log::warn!("no category code for '{}', point dropped", rec.species);
            continue;
        };
        series.x.push(rec.measurement(Measurement::SepalWidth));
        series.y.push(rec.measurement(Measurement::SepalLength));
        series.size.push(rec.measurement(Measurement::PetalWidth) * size_scale);
        series.color.push(code);
        series.text.push(rec.species.clone());
    }
    series
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

/// Shared scatter layout; identical for every selection.
fn scatter_layout(state: &AppState) -> Layout {
    Layout::new()
        .x_axis(Axis::new().title(Measurement::SepalWidth.title()))
        .y_axis(Axis::new().title(Measurement::SepalLength.title()))
        .height(state.config.scatter_height)
        .margin(Margin::new().left(10).right(10).top(10).bottom(10))
        .hover_mode(HoverMode::Closest)
}

/// Scatter figure for an already computed series.
pub fn scatter_figure(state: &AppState, series: ChartSeries) -> Plot {
    // plotly marker sizes are whole pixels
    let sizes: Vec<usize> = series.size.iter().map(|s| s.max(0.0).round() as usize).collect();
    let colors: Vec<f64> = series.color.iter().map(|&c| c as f64).collect();

    let trace = Scatter::new(series.x, series.y)
        .mode(Mode::Markers)
        .text_array(series.text)
        .marker(
            Marker::new()
                .color_array(colors)
                .size_array(sizes)
                .color_scale(state.color_map.color_scale())
                .cmin(0.0)
                .cmax(state.color_map.cmax()),
        );

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(scatter_layout(state));
    plot
}

/// Stacked histogram of one measurement, one trace per species.
/// Always drawn from the full dataset.
pub fn histogram_figure(state: &AppState, m: Measurement) -> Plot {
    let mut plot = Plot::new();
    for species in state.dataset.categories() {
        plot.add_trace(
            Histogram::new_vertical(state.dataset.values_for(species, m)).name(species),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(m.column())
            .height(state.config.histogram_height)
            .margin(Margin::new().left(50).right(50).top(50).bottom(50))
            .bar_mode(BarMode::Stack),
    );
    plot
}

/// Figure JSON (`data`, `layout`) as handed to Plotly in the browser.
pub fn figure_json(plot: &Plot) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&plot.to_json())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::loader::load_bundled;

    fn state() -> AppState {
        AppState::new(DashboardConfig::default(), load_bundled().unwrap())
    }

    fn selection(labels: &[&str]) -> Selection {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn series(state: &AppState, sel: &Selection) -> ChartSeries {
        compute_chart_series(&state.dataset, &state.codes, sel, 10.0)
    }

    #[test]
    fn every_subset_yields_exactly_its_records_in_order() {
        let st = state();
        let cats = st.dataset.categories().to_vec();
        for mask in 0u32..(1 << cats.len()) {
            let sel: Selection = cats
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, c)| c.clone())
                .collect();
            let s = series(&st, &sel);

            let expected: Vec<_> = st
                .dataset
                .records()
                .iter()
                .filter(|r| sel.contains(&r.species))
                .collect();
            assert_eq!(s.len(), expected.len());
            for (i, rec) in expected.iter().enumerate() {
                assert_eq!(s.x[i], rec.sepal_width);
                assert_eq!(s.y[i], rec.sepal_length);
                assert_eq!(s.size[i], rec.petal_width * 10.0);
                assert_eq!(s.text[i], rec.species);
            }
        }
    }

    #[test]
    fn empty_selection_gives_empty_series() {
        let st = state();
        let s = series(&st, &Selection::new());
        assert_eq!(s, ChartSeries::default());
    }

    #[test]
    fn full_selection_covers_dataset() {
        let st = state();
        assert_eq!(series(&st, &st.initial_selection()).len(), 150);
    }

    #[test]
    fn example_selections() {
        let st = state();
        let setosa = series(&st, &selection(&["setosa"]));
        assert_eq!(setosa.len(), 50);
        assert!(setosa.text.iter().all(|t| t == "setosa"));

        assert_eq!(series(&st, &selection(&["setosa", "virginica"])).len(), 100);
        assert_eq!(series(&st, &selection(&["unknown"])).len(), 0);
    }

    #[test]
    fn colour_codes_do_not_depend_on_selection() {
        let st = state();
        let all = series(&st, &st.initial_selection());
        let only_virginica = series(&st, &selection(&["virginica"]));
        let mixed = series(&st, &selection(&["virginica", "versicolor"]));

        let code_of = |s: &ChartSeries, label: &str| -> BTreeSet<u32> {
            s.text
                .iter()
                .zip(&s.color)
                .filter(|(t, _)| *t == label)
                .map(|(_, c)| *c)
                .collect()
        };
        assert_eq!(code_of(&all, "virginica"), [2].into());
        assert_eq!(code_of(&only_virginica, "virginica"), [2].into());
        assert_eq!(code_of(&mixed, "virginica"), [2].into());
        assert_eq!(code_of(&mixed, "versicolor"), [1].into());
    }

    #[test]
    fn repeated_calls_are_byte_identical() {
        let st = state();
        let sel = selection(&["versicolor", "setosa"]);
        let a = scatter_figure(&st, series(&st, &sel)).to_json();
        let b = scatter_figure(&st, series(&st, &sel)).to_json();
        assert_eq!(a, b);
    }

    #[test]
    fn scatter_figure_json_shape() {
        let st = state();
        let fig = figure_json(&scatter_figure(&st, series(&st, &selection(&["setosa"])))).unwrap();
        let trace = &fig["data"][0];
        assert_eq!(trace["type"], "scatter");
        assert_eq!(trace["mode"], "markers");
        assert_eq!(trace["x"][0], 3.5);
        assert_eq!(trace["text"][0], "setosa");
        assert_eq!(trace["marker"]["size"][0], 2);
        assert_eq!(trace["marker"]["color"][0], 0.0);
        assert_eq!(trace["marker"]["cmax"], 2.0);
        assert_eq!(fig["layout"]["xaxis"]["title"]["text"], "Sepal Width");
        assert_eq!(fig["layout"]["hovermode"], "closest");
        assert_eq!(fig["layout"]["height"], 300);
        assert!(fig["layout"].get("barmode").is_none());
    }

    #[test]
    fn histograms_stack_one_trace_per_species() {
        let st = state();
        let fig = figure_json(&histogram_figure(&st, Measurement::PetalLength)).unwrap();
        let traces = fig["data"].as_array().unwrap();
        assert_eq!(traces.len(), 3);
        assert_eq!(traces[0]["type"], "histogram");
        assert_eq!(traces[0]["name"], "setosa");
        assert_eq!(traces[2]["y"].as_array().unwrap().len(), 50);
        assert_eq!(fig["layout"]["barmode"], "stack");
        assert_eq!(fig["layout"]["title"]["text"], "petal_length");
    }
}

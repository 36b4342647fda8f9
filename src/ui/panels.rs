use serde::Serialize;

use crate::data::filter::Selection;
use crate::data::model::{Dataset, Record};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Species checklist
// ---------------------------------------------------------------------------

pub const CHECKLIST_ID: &str = "species_checklist";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Checklist {
    pub id: &'static str,
    pub options: Vec<ChecklistOption>,
    pub value: Vec<String>,
    /// Options are laid out inline.
    pub inline: bool,
}

/// One option per species, labelled in upper case, all checked initially.
pub fn species_checklist(dataset: &Dataset, initial: &Selection) -> Checklist {
    let options = dataset
        .categories()
        .iter()
        .map(|c| ChecklistOption {
            label: c.to_uppercase(),
            value: c.clone(),
        })
        .collect();
    // keep the dataset's category order rather than the set's
    let value = dataset
        .categories()
        .iter()
        .filter(|c| initial.contains(*c))
        .cloned()
        .collect();
    Checklist {
        id: CHECKLIST_ID,
        options,
        value,
        inline: true,
    }
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

pub const TABLE_ID: &str = "datatable-row-ids";

#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    pub name: &'static str,
    pub id: &'static str,
    pub deletable: bool,
}

/// Static table configuration; rows are fetched page by page.
#[derive(Debug, Clone, Serialize)]
pub struct TableConfig {
    pub id: &'static str,
    pub columns: Vec<TableColumn>,
    pub editable: bool,
    pub filter_action: &'static str,
    pub sort_action: &'static str,
    pub sort_mode: &'static str,
    pub row_selectable: &'static str,
    pub row_deletable: bool,
    pub page_action: &'static str,
    pub page_current: usize,
    pub page_size: usize,
}

pub fn table_config(state: &AppState) -> TableConfig {
    let columns = Record::COLUMNS
        .into_iter()
        .map(|c| TableColumn {
            name: c,
            id: c,
            deletable: true,
        })
        .collect();
    TableConfig {
        id: TABLE_ID,
        columns,
        editable: false,
        filter_action: "native",
        sort_action: "native",
        sort_mode: "multi",
        row_selectable: "multi",
        row_deletable: false,
        page_action: "native",
        page_current: 0,
        page_size: state.config.page_size,
    }
}

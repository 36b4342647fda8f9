use std::collections::BTreeSet;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Selection: which species the checklist currently includes
// ---------------------------------------------------------------------------

/// The set of selected category labels. Replaced wholesale on every
/// checklist change; labels that are not in the dataset simply match nothing.
pub type Selection = BTreeSet<String>;

/// Initialise a [`Selection`] with every category present (show everything).
pub fn default_selection(dataset: &Dataset) -> Selection {
    dataset.categories().iter().cloned().collect()
}

/// Records whose species is selected, in dataset order.
///
/// An empty selection yields nothing.
pub fn selected_records<'a>(
    dataset: &'a Dataset,
    selection: &'a Selection,
) -> impl Iterator<Item = &'a Record> + 'a {
    dataset
        .records()
        .iter()
        .filter(move |r| selection.contains(&r.species))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            record("setosa", 5.1, 3.5, 1.4, 0.2),
            record("virginica", 6.3, 3.3, 6.0, 2.5),
            record("setosa", 4.9, 3.0, 1.4, 0.2),
            record("versicolor", 7.0, 3.2, 4.7, 1.4),
        ])
    }

    #[test]
    fn default_selection_contains_every_category() {
        let sel = default_selection(&sample());
        assert_eq!(sel.len(), 3);
        assert!(sel.contains("versicolor"));
    }

    #[test]
    fn keeps_dataset_order() {
        let ds = sample();
        let sel: Selection = ["setosa".to_string(), "virginica".to_string()].into();
        let lengths: Vec<f64> = selected_records(&ds, &sel).map(|r| r.sepal_length).collect();
        assert_eq!(lengths, vec![5.1, 6.3, 4.9]);
    }

    #[test]
    fn empty_and_unknown_selections_match_nothing() {
        let ds = sample();
        assert_eq!(selected_records(&ds, &Selection::new()).count(), 0);
        let unknown: Selection = ["unknown".to_string()].into();
        assert_eq!(selected_records(&ds, &unknown).count(), 0);
    }
}

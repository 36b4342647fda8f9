use std::io::Read;

use anyhow::{Context, Result, bail};

use super::model::{Dataset, Measurement, Record};

/// The iris measurements shipped with the binary.
const BUNDLED_IRIS_CSV: &str = include_str!("../../assets/iris.csv");

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the dataset compiled into the binary.
pub fn load_bundled() -> Result<Dataset> {
    load_csv_reader(BUNDLED_IRIS_CSV.as_bytes()).context("parsing bundled iris.csv")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv_reader<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(input);

    let headers = reader.headers().context("reading CSV headers")?.clone();
    for col in Record::COLUMNS {
        if !headers.iter().any(|h| h == col) {
            bail!("CSV missing '{col}' column");
        }
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<Record>().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record);
    }

    finish(records)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn finish(records: Vec<Record>) -> Result<Dataset> {
    if records.is_empty() {
        bail!("dataset contains no records");
    }
    for (i, rec) in records.iter().enumerate() {
        if rec.species.trim().is_empty() {
            bail!("Row {i}: empty species label");
        }
        for m in Measurement::ALL {
            let v = rec.measurement(m);
            if !v.is_finite() {
                bail!("Row {i}, {m}: '{v}' is not a finite number");
            }
        }
    }
    Ok(Dataset::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dataset_has_three_species_of_fifty() {
        let ds = load_bundled().unwrap();
        assert_eq!(ds.len(), 150);
        assert_eq!(ds.categories(), ["setosa", "versicolor", "virginica"]);
        for species in ds.categories() {
            let n = ds.records().iter().filter(|r| &r.species == species).count();
            assert_eq!(n, 50, "{species}");
        }
        let first = &ds.records()[0];
        assert_eq!((first.sepal_length, first.sepal_width), (5.1, 3.5));
    }

    #[test]
    fn rejects_missing_column_and_bad_values() {
        let err = load_csv_reader("sepal_length,species\n5.1,setosa\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("sepal_width"));

        let err = load_csv_reader(
            "sepal_length,sepal_width,petal_length,petal_width,species\n5.1,abc,1.4,0.2,setosa\n"
                .as_bytes(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 0"));

        let err = load_csv_reader(
            "sepal_length,sepal_width,petal_length,petal_width,species\n".as_bytes(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no records"));
    }

}

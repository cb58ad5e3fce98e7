//! Reference cohort comparison.
//!
//! Loads the processed cohort table once at artifact load and answers
//! percentile queries per raw feature. ECDF convention: the percentile of x
//! is the fraction of cohort values at or below x.

use std::path::Path;

use cardiorisk_core::{
    CohortPosition, Error, FeaturePosition, PatientRecord, Result, FEATURE_NAMES,
    RAW_FEATURE_COUNT,
};

/// Empirical distribution of one cohort column.
#[derive(Debug, Clone)]
struct FeatureDistribution {
    /// Sorted finite values
    values: Vec<f64>,
}

impl FeatureDistribution {
    fn from_data(data: &[f64]) -> Self {
        let mut values: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
        values.sort_by(f64::total_cmp);
        Self { values }
    }

    /// Fraction of cohort values at or below x.
    fn percentile(&self, x: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let at_or_below = self.values.partition_point(|v| *v <= x);
        at_or_below as f64 / self.values.len() as f64
    }

    /// Lower median of the column.
    fn median(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values[(self.values.len() - 1) / 2]
    }
}

/// The reference population, one distribution per raw intake feature.
#[derive(Debug, Clone)]
pub struct CohortTable {
    size: usize,
    distributions: Vec<FeatureDistribution>,
}

impl CohortTable {
    /// Load the cohort from its processed CSV file.
    ///
    /// The file must contain a column for each of the thirteen raw intake
    /// features; extra columns (such as the training target) are ignored.
    ///
    /// # Errors
    /// Returns [`Error::Integrity`] when a required column is missing, a
    /// cell fails to parse, or the table is empty.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())
            .map_err(|e| Error::integrity(format!("cohort csv: {e}")))?;

        let headers = reader
            .headers()
            .map_err(|e| Error::integrity(format!("cohort csv headers: {e}")))?
            .clone();

        let raw_names = &FEATURE_NAMES[..RAW_FEATURE_COUNT];
        let mut column_indices = Vec::with_capacity(RAW_FEATURE_COUNT);
        for name in raw_names {
            let idx = headers
                .iter()
                .position(|h| h == *name)
                .ok_or_else(|| Error::integrity(format!("cohort csv missing column '{name}'")))?;
            column_indices.push(idx);
        }

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); RAW_FEATURE_COUNT];
        for (row, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| Error::integrity(format!("cohort csv row {}: {e}", row + 1)))?;
            for (slot, (&idx, name)) in column_indices.iter().zip(raw_names).enumerate() {
                let cell = record.get(idx).ok_or_else(|| {
                    Error::integrity(format!("cohort csv row {} is short", row + 1))
                })?;
                let value: f64 = cell.parse().map_err(|_| {
                    Error::integrity(format!(
                        "cohort csv row {} column '{name}': invalid number '{cell}'",
                        row + 1
                    ))
                })?;
                columns[slot].push(value);
            }
        }

        let size = columns[0].len();
        if size == 0 {
            return Err(Error::integrity("cohort csv has no rows"));
        }

        let distributions = columns
            .iter()
            .map(|data| FeatureDistribution::from_data(data))
            .collect();

        Ok(Self {
            size,
            distributions,
        })
    }

    /// Build a table directly from per-column data in raw feature order.
    /// Columns must all have the same length.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self> {
        if columns.len() != RAW_FEATURE_COUNT {
            return Err(Error::integrity(format!(
                "cohort needs {} columns, got {}",
                RAW_FEATURE_COUNT,
                columns.len()
            )));
        }
        let size = columns[0].len();
        if size == 0 {
            return Err(Error::integrity("cohort has no rows"));
        }
        if columns.iter().any(|c| c.len() != size) {
            return Err(Error::integrity("cohort columns have unequal lengths"));
        }

        let distributions = columns
            .iter()
            .map(|data| FeatureDistribution::from_data(data))
            .collect();

        Ok(Self {
            size,
            distributions,
        })
    }

    /// Number of reference patients.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Place one patient's raw features within the cohort.
    pub fn position(&self, record: &PatientRecord) -> CohortPosition {
        let raw_values = record.raw_values();
        let features = FEATURE_NAMES[..RAW_FEATURE_COUNT]
            .iter()
            .zip(raw_values.iter())
            .zip(&self.distributions)
            .map(|((name, value), dist)| FeaturePosition {
                feature: (*name).to_string(),
                value: *value,
                percentile: dist.percentile(*value),
                cohort_median: dist.median(),
            })
            .collect();

        CohortPosition {
            cohort_size: self.size,
            features,
        }
    }
}

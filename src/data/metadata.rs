//! Sample metadata handling for beta-diversity analyses.

use crate::data::NumericTable;
use crate::error::{BetaError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A variable value that can be categorical, continuous, or ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Ordinal variable with integer rank.
    Ordinal(i64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value. A NaN continuous value counts as
    /// missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Variable::Missing => true,
            Variable::Continuous(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as ordinal i64.
    pub fn as_ordinal(&self) -> Option<i64> {
        match self {
            Variable::Ordinal(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value of a continuous or ordinal variable.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            Variable::Ordinal(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// Declared type of a metadata column, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
    Ordinal,
}

impl VariableType {
    /// Continuous and ordinal columns are numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, VariableType::Continuous | VariableType::Ordinal)
    }
}

/// Coarse column type used when selecting columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

impl ColumnType {
    fn matches(&self, var_type: VariableType) -> bool {
        match self {
            ColumnType::Numeric => var_type.is_numeric(),
            ColumnType::Categorical => var_type == VariableType::Categorical,
        }
    }
}

/// Column selection criteria for [`Metadata::filter_columns`].
///
/// A column is retained only if it passes every enabled criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    /// Keep only columns of this type.
    pub column_type: Option<ColumnType>,
    /// Drop columns whose non-missing values are all identical.
    pub drop_zero_variance: bool,
    /// Drop columns where every value is missing.
    pub drop_all_missing: bool,
}

impl ColumnFilter {
    /// Keep only columns of the given type.
    pub fn of_type(column_type: ColumnType) -> Self {
        Self {
            column_type: Some(column_type),
            ..Default::default()
        }
    }

    /// Drop zero-variance and all-missing columns.
    pub fn informative() -> Self {
        Self {
            column_type: None,
            drop_zero_variance: true,
            drop_all_missing: true,
        }
    }
}

/// Options controlling how metadata files are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Cell contents (after trimming) treated as missing values.
    pub missing_tokens: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            missing_tokens: ["", "NA", "na", "NaN", "nan"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl LoadOptions {
    fn is_missing(&self, raw: &str) -> bool {
        self.missing_tokens.iter().any(|t| t == raw)
    }
}

/// Sample metadata containing variables for each sample.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Sample IDs in order.
    sample_ids: Vec<String>,
    /// Column names.
    column_names: Vec<String>,
    /// Data stored as sample_id -> column_name -> Variable.
    data: HashMap<String, HashMap<String, Variable>>,
    /// Declared type of each column.
    column_types: HashMap<String, VariableType>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self {
            sample_ids: Vec::new(),
            column_names: Vec::new(),
            data: HashMap::new(),
            column_types: HashMap::new(),
        }
    }

    /// Build metadata from in-memory columns.
    ///
    /// Column types are inferred from the values: any categorical value makes
    /// the column categorical, otherwise it is continuous (or ordinal when
    /// every present value is ordinal). A column with no present values is
    /// numeric. Mixing categorical and numeric values in one column is an
    /// error. NaN values are stored as missing and infinite values are
    /// rejected.
    pub fn from_columns(
        sample_ids: Vec<String>,
        mut columns: Vec<(String, Vec<Variable>)>,
    ) -> Result<Self> {
        check_unique(&sample_ids)?;
        let column_names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        check_unique(&column_names)?;

        let mut column_types = HashMap::new();
        for (name, values) in &mut columns {
            if values.len() != sample_ids.len() {
                return Err(BetaError::DimensionMismatch {
                    expected: sample_ids.len(),
                    actual: values.len(),
                });
            }
            for (sid, value) in sample_ids.iter().zip(values.iter_mut()) {
                if let Variable::Continuous(v) = *value {
                    *value = checked_continuous(v, sid, name)?;
                }
            }
            column_types.insert(name.clone(), infer_type(name, values)?);
        }

        let mut data: HashMap<String, HashMap<String, Variable>> = sample_ids
            .iter()
            .map(|sid| (sid.clone(), HashMap::with_capacity(columns.len())))
            .collect();
        for (name, values) in columns {
            for (sid, value) in sample_ids.iter().zip(values) {
                if let Some(row) = data.get_mut(sid) {
                    row.insert(name.clone(), value);
                }
            }
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
            column_types,
        })
    }

    /// Load metadata from a TSV file with default [`LoadOptions`].
    ///
    /// Expected format:
    /// - First row: header with column names (first column is sample ID)
    /// - Subsequent rows: sample ID followed by variable values
    /// - Rows starting with `#` after the header are ignored
    ///
    /// Columns are inferred as continuous if all present values parse as
    /// numbers, otherwise categorical. Use `with_column_types` to override.
    /// A numeric cell reading `NaN` is missing even when `NaN` is not one of
    /// the missing tokens; an infinite cell is an error.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_tsv_with(path, &LoadOptions::default())
    }

    /// Load metadata from a TSV file with explicit parsing options.
    pub fn from_tsv_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| BetaError::EmptyData("Empty metadata file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(BetaError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        check_unique(&column_names)?;

        // First pass: collect raw cells so types can be inferred per column
        let mut raw_data: Vec<(String, Vec<String>)> = Vec::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let sample_id = fields[0].trim().to_string();
            let values: Vec<String> = fields[1..].iter().map(|s| s.trim().to_string()).collect();
            raw_data.push((sample_id, values));
        }

        if raw_data.is_empty() {
            return Err(BetaError::EmptyData("No samples in metadata".to_string()));
        }

        let sample_ids: Vec<String> = raw_data.iter().map(|(sid, _)| sid.clone()).collect();
        check_unique(&sample_ids)?;

        let mut column_types = HashMap::new();
        for (col_idx, col_name) in column_names.iter().enumerate() {
            let all_numeric = raw_data.iter().all(|(_, values)| match values.get(col_idx) {
                None => true,
                Some(v) => options.is_missing(v) || v.parse::<f64>().is_ok(),
            });
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };
            column_types.insert(col_name.clone(), var_type);
        }

        let mut data = HashMap::with_capacity(raw_data.len());
        for (sample_id, values) in raw_data {
            let mut sample_data = HashMap::with_capacity(column_names.len());
            for (col_idx, col_name) in column_names.iter().enumerate() {
                let var = match values.get(col_idx) {
                    Some(raw) if !options.is_missing(raw) => {
                        let var_type = column_types
                            .get(col_name)
                            .copied()
                            .unwrap_or(VariableType::Categorical);
                        parse_cell(raw, var_type, &sample_id, col_name)?
                    }
                    _ => Variable::Missing,
                };
                sample_data.insert(col_name.clone(), var);
            }
            data.insert(sample_id, sample_data);
        }

        log::debug!(
            "Loaded metadata: {} samples x {} columns",
            sample_ids.len(),
            column_names.len()
        );

        Ok(Self {
            sample_ids,
            column_names,
            data,
            column_types,
        })
    }

    /// Write metadata to a TSV file. Missing values are written as empty cells.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "sample_id")?;
        for col in &self.column_names {
            write!(writer, "\t{}", col)?;
        }
        writeln!(writer)?;

        for sid in &self.sample_ids {
            write!(writer, "{}", sid)?;
            for col in &self.column_names {
                match self.get(sid, col).unwrap_or(&Variable::Missing) {
                    Variable::Categorical(s) => write!(writer, "\t{}", s)?,
                    Variable::Continuous(v) => write!(writer, "\t{}", v)?,
                    Variable::Ordinal(v) => write!(writer, "\t{}", v)?,
                    Variable::Missing => write!(writer, "\t")?,
                }
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Set type hints for specific columns, converting their values.
    ///
    /// # Errors
    /// `InvalidVariableType` naming the column, sample and value when a
    /// present value cannot be represented in the requested type (text as a
    /// number, a fractional value as ordinal). Unknown columns are ignored.
    pub fn with_column_types(mut self, types: HashMap<String, VariableType>) -> Result<Self> {
        for (col_name, var_type) in &types {
            if !self.has_column(col_name) {
                continue;
            }
            for sid in &self.sample_ids {
                if let Some(var) = self.data.get_mut(sid).and_then(|row| row.get_mut(col_name)) {
                    *var = retype(var, *var_type, sid, col_name)?;
                }
            }
            self.column_types.insert(col_name.clone(), *var_type);
        }
        Ok(self)
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of columns (variables).
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Get a variable value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        self.data.get(sample_id).and_then(|m| m.get(column))
    }

    /// Get all values for a column, in sample order.
    pub fn column(&self, column: &str) -> Result<Vec<&Variable>> {
        if !self.has_column(column) {
            return Err(BetaError::MissingColumn(column.to_string()));
        }
        Ok(self.column_values(column))
    }

    fn column_values(&self, column: &str) -> Vec<&Variable> {
        self.sample_ids
            .iter()
            .map(|sid| self.get(sid, column).unwrap_or(&Variable::Missing))
            .collect()
    }

    /// Get the declared type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    /// Whether a column is declared continuous or ordinal.
    pub fn is_numeric(&self, column: &str) -> bool {
        self.column_type(column).map_or(false, |t| t.is_numeric())
    }

    /// Whether a column is declared categorical.
    pub fn is_categorical(&self, column: &str) -> bool {
        self.column_type(column) == Some(VariableType::Categorical)
    }

    /// Number of missing values in a column over the current samples.
    pub fn n_missing(&self, column: &str) -> usize {
        self.column_values(column)
            .iter()
            .filter(|v| v.is_missing())
            .count()
    }

    /// Whether every value of a column is missing over the current samples.
    pub fn all_missing(&self, column: &str) -> bool {
        self.column_values(column).iter().all(|v| v.is_missing())
    }

    /// Whether a column has at least one present value and all present
    /// values are identical.
    pub fn has_zero_variance(&self, column: &str) -> bool {
        let values = self.column_values(column);
        let mut present = values.iter().filter(|v| !v.is_missing());
        let first = match present.next() {
            Some(first) => *first,
            None => return false,
        };
        if self.is_numeric(column) {
            let x = first.as_f64();
            present.all(|v| v.as_f64() == x)
        } else {
            present.all(|v| *v == first)
        }
    }

    /// Get unique levels for a categorical column.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        let values = self.column(column)?;
        let levels: BTreeSet<String> = values
            .iter()
            .filter_map(|v| v.as_categorical().map(String::from))
            .collect();
        Ok(levels.into_iter().collect())
    }

    /// Restrict rows to exactly the given identifiers, in the given order.
    ///
    /// Every identifier must have a metadata row; otherwise all absent
    /// identifiers are reported together.
    pub fn filter_ids(&self, ids: &[String]) -> Result<Self> {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !self.has_sample(id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(BetaError::MissingIdentifiers { ids: missing });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        let keep: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        Ok(self.with_samples(keep))
    }

    /// Alias for [`Metadata::filter_ids`].
    pub fn subset_samples(&self, sample_ids: &[String]) -> Result<Self> {
        self.filter_ids(sample_ids)
    }

    /// Retain only columns passing the given filter. Column order is preserved.
    pub fn filter_columns(&self, filter: &ColumnFilter) -> Self {
        let keep_flags: Vec<bool> = self
            .column_names
            .par_iter()
            .map(|col| {
                if let Some(column_type) = filter.column_type {
                    match self.column_type(col) {
                        Some(t) if column_type.matches(t) => {}
                        _ => return false,
                    }
                }
                if filter.drop_all_missing && self.all_missing(col) {
                    return false;
                }
                if filter.drop_zero_variance && self.has_zero_variance(col) {
                    return false;
                }
                true
            })
            .collect();

        let keep: Vec<String> = self
            .column_names
            .iter()
            .zip(keep_flags)
            .filter(|(_, keep)| *keep)
            .map(|(col, _)| col.clone())
            .collect();
        self.with_columns(keep)
    }

    /// Retain the named columns, in the given order.
    pub fn select_columns(&self, columns: &[String]) -> Result<Self> {
        if let Some(col) = columns.iter().find(|c| !self.has_column(c)) {
            return Err(BetaError::MissingColumn(col.clone()));
        }
        Ok(self.with_columns(columns.to_vec()))
    }

    /// Drop every sample with a missing value in any column.
    pub fn drop_missing_rows(&self) -> Self {
        let keep: Vec<String> = self
            .sample_ids
            .iter()
            .filter(|sid| {
                self.column_names.iter().all(|col| {
                    self.get(sid, col).map_or(false, |v| !v.is_missing())
                })
            })
            .cloned()
            .collect();
        self.with_samples(keep)
    }

    /// Convert to a dense samples × columns numeric table.
    pub fn to_numeric_table(&self) -> Result<NumericTable> {
        NumericTable::from_metadata(self)
    }

    /// Check if a sample exists.
    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.data.contains_key(sample_id)
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_types.contains_key(column)
    }

    fn with_samples(&self, sample_ids: Vec<String>) -> Self {
        let data = sample_ids
            .iter()
            .filter_map(|sid| self.data.get(sid).map(|row| (sid.clone(), row.clone())))
            .collect();
        Self {
            sample_ids,
            column_names: self.column_names.clone(),
            data,
            column_types: self.column_types.clone(),
        }
    }

    fn with_columns(&self, column_names: Vec<String>) -> Self {
        let data = self
            .data
            .iter()
            .map(|(sid, row)| {
                let row = column_names
                    .iter()
                    .filter_map(|col| row.get(col).map(|v| (col.clone(), v.clone())))
                    .collect();
                (sid.clone(), row)
            })
            .collect();
        let column_types = column_names
            .iter()
            .filter_map(|col| self.column_types.get(col).map(|t| (col.clone(), *t)))
            .collect();
        Self {
            sample_ids: self.sample_ids.clone(),
            column_names,
            data,
            column_types,
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unique(names: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(BetaError::DuplicateId(name.clone()));
        }
    }
    Ok(())
}

fn infer_type(column: &str, values: &[Variable]) -> Result<VariableType> {
    let has_categorical = values.iter().any(|v| v.as_categorical().is_some());
    let has_continuous = values.iter().any(|v| v.as_continuous().is_some());
    let has_ordinal = values.iter().any(|v| v.as_ordinal().is_some());

    if has_categorical && (has_continuous || has_ordinal) {
        return Err(BetaError::InvalidVariableType {
            column: column.to_string(),
            reason: "column mixes categorical and numeric values".to_string(),
        });
    }
    Ok(if has_categorical {
        VariableType::Categorical
    } else if has_ordinal && !has_continuous {
        VariableType::Ordinal
    } else {
        VariableType::Continuous
    })
}

fn invalid_cell(column: &str, sample: &str, value: &str, expected: &str) -> BetaError {
    BetaError::InvalidVariableType {
        column: column.to_string(),
        reason: format!("value '{}' for sample '{}' is not {}", value, sample, expected),
    }
}

/// NaN becomes missing; infinities are rejected.
fn checked_continuous(v: f64, sample: &str, column: &str) -> Result<Variable> {
    if v.is_nan() {
        Ok(Variable::Missing)
    } else if v.is_infinite() {
        Err(invalid_cell(column, sample, &v.to_string(), "finite"))
    } else {
        Ok(Variable::Continuous(v))
    }
}

fn parse_cell(raw: &str, var_type: VariableType, sample: &str, column: &str) -> Result<Variable> {
    let trimmed = raw.trim();
    match var_type {
        VariableType::Categorical => Ok(Variable::Categorical(raw.to_string())),
        VariableType::Continuous => match trimmed.parse::<f64>() {
            Ok(v) => checked_continuous(v, sample, column),
            Err(_) => Err(invalid_cell(column, sample, raw, "a number")),
        },
        VariableType::Ordinal => trimmed
            .parse::<i64>()
            .map(Variable::Ordinal)
            .map_err(|_| invalid_cell(column, sample, raw, "an integer")),
    }
}

fn retype(var: &Variable, var_type: VariableType, sample: &str, column: &str) -> Result<Variable> {
    if var.is_missing() {
        return Ok(Variable::Missing);
    }
    match var {
        Variable::Categorical(s) => parse_cell(s, var_type, sample, column),
        Variable::Continuous(v) => match var_type {
            VariableType::Continuous => checked_continuous(*v, sample, column),
            VariableType::Ordinal if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Ok(Variable::Ordinal(*v as i64))
            }
            VariableType::Ordinal => Err(invalid_cell(column, sample, &v.to_string(), "an integer")),
            VariableType::Categorical => Ok(Variable::Categorical(v.to_string())),
        },
        Variable::Ordinal(v) => Ok(match var_type {
            VariableType::Continuous => Variable::Continuous(*v as f64),
            VariableType::Ordinal => Variable::Ordinal(*v),
            VariableType::Categorical => Variable::Categorical(v.to_string()),
        }),
        Variable::Missing => Ok(Variable::Missing),
    }
}

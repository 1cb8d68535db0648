//! Input file loading
//!
//! Reads the spreadsheet exports (xlsx/ods through calamine, csv through
//! polars) into DataFrames whose columns are all text. Typing happens later,
//! in the dataset pipeline, so every input format goes through the same
//! normalization rules.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DataConfig;

/// Errors that can occur while locating or reading input files
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read input file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to read spreadsheet {path}: {source}")]
    Spreadsheet {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to build table: {0}")]
    TableError(#[from] PolarsError),

    #[error("{0} has no worksheet")]
    NoWorksheet(String),

    #[error("{0} has no header row")]
    EmptySheet(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("No input file matches '{0}'")]
    NotFound(String),

    #[error("Invalid file pattern '{pattern}': {message}")]
    PatternError { pattern: String, message: String },

    #[error("Column '{column}' missing from {table}")]
    MissingColumn { table: String, column: String },
}

/// Paths of the input files after pattern resolution
#[derive(Debug, Clone)]
pub struct InputFiles {
    pub deaths: PathBuf,
    pub divipola: PathBuf,
    pub causes: PathBuf,
    /// `None` when no boundary file exists; the map falls back to bars
    pub geojson: Option<PathBuf>,
}

impl InputFiles {
    /// Resolve every configured pattern inside the data directory
    pub fn resolve(config: &DataConfig) -> Result<Self, LoadError> {
        let required = |pattern: &str| {
            find_input(&config.dir, pattern)?
                .ok_or_else(|| LoadError::NotFound(config.dir.join(pattern).display().to_string()))
        };

        Ok(Self {
            deaths: required(&config.deaths)?,
            divipola: required(&config.divipola)?,
            causes: required(&config.causes)?,
            geojson: find_input(&config.dir, &config.geojson)?,
        })
    }
}

/// Raw tables as read from disk
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub deaths: DataFrame,
    pub divipola: DataFrame,
    pub causes: DataFrame,
}

/// Find the input matching `pattern` inside `dir`
///
/// DANE exports end in their export date (`_DD-MM-YY`). The match with the
/// latest date wins; undated names rank below dated ones and ties fall back
/// to file name order.
pub fn find_input(dir: &Path, pattern: &str) -> Result<Option<PathBuf>, LoadError> {
    let full = dir.join(pattern);
    let full = full.to_string_lossy();
    let entries = glob::glob(&full).map_err(|e| LoadError::PatternError {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let newest = entries
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .max_by(|a, b| (export_date(a), a).cmp(&(export_date(b), b)));
    if let Some(path) = &newest {
        debug!("'{}' resolved to {}", pattern, path.display());
    }
    Ok(newest)
}

/// Export date at the end of a file stem, e.g. `NoFetal2019_CE_15-03-23`
fn export_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let suffix = stem.rsplit('_').next()?;
    NaiveDate::parse_from_str(suffix, "%d-%m-%y").ok()
}

/// Read all three tables, in parallel
pub fn load_inputs(files: &InputFiles) -> Result<RawInputs, LoadError> {
    let (deaths, (divipola, causes)) = rayon::join(
        || read_table(&files.deaths),
        || rayon::join(|| read_table(&files.divipola), || read_table(&files.causes)),
    );

    Ok(RawInputs {
        deaths: deaths?,
        divipola: divipola?,
        causes: causes?,
    })
}

/// Read one input table, choosing the reader by file extension
pub fn read_table(path: &Path) -> Result<DataFrame, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let frame = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        "csv" => read_csv(path)?,
        _ => return Err(LoadError::UnsupportedFormat(path.display().to_string())),
    };

    info!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        frame.height(),
        frame.width()
    );
    Ok(frame)
}

fn read_workbook(path: &Path) -> Result<DataFrame, LoadError> {
    let spreadsheet_error = |source| LoadError::Spreadsheet {
        path: path.display().to_string(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet(path.display().to_string()))?
        .map_err(spreadsheet_error)?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| LoadError::EmptySheet(path.display().to_string()))?;
    let columns = header_columns(header.iter().map(cell_text));
    debug!("{}: header {:?}", path.display(), columns);

    let mut values: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(range.height().saturating_sub(1)); columns.len()];
    for row in rows {
        for (slot, (_, index)) in values.iter_mut().zip(&columns) {
            slot.push(row.get(*index).and_then(cell_text));
        }
    }

    text_frame(columns.into_iter().map(|(name, _)| name).zip(values))
}

fn read_csv(path: &Path) -> Result<DataFrame, LoadError> {
    // Schema inference off: every column arrives as text
    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    // polars renames blank and repeated headers; read the header row as data
    // to apply the same column rules as workbooks
    let header = LazyCsvReader::new(path)
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .with_n_rows(Some(1))
        .finish()?
        .collect()?;
    let names = header.get_columns().iter().map(|column| {
        column
            .str()
            .ok()
            .and_then(|values| values.get(0))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    });
    let columns = header_columns(names);
    debug!("{}: header {:?}", path.display(), columns);

    let kept: Vec<Column> = columns
        .into_iter()
        .filter_map(|(name, index)| {
            let mut column = frame.get_columns().get(index)?.clone();
            column.rename(name.into());
            Some(column)
        })
        .collect();
    Ok(DataFrame::new(kept)?)
}

/// Pick usable header cells: blank names are skipped, duplicates keep the first
fn header_columns(names: impl Iterator<Item = Option<String>>) -> Vec<(String, usize)> {
    let mut seen = HashSet::new();
    names
        .enumerate()
        .filter_map(|(index, name)| {
            let name = name?;
            seen.insert(name.clone()).then_some((name, index))
        })
        .collect()
}

/// Build a DataFrame from named text columns
pub fn text_frame(
    columns: impl IntoIterator<Item = (String, Vec<Option<String>>)>,
) -> Result<DataFrame, LoadError> {
    let columns: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| Column::new(name.into(), values))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Render a spreadsheet cell as text
///
/// Whole floats lose their fractional part so numeric codes read the same
/// whether the sheet stored them as numbers or text.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(float_text(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt.as_datetime().map(datetime_text),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn datetime_text(value: NaiveDateTime) -> String {
    if value.num_seconds_from_midnight() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  ".to_string())), None);
        assert_eq!(cell_text(&Data::String(" X954 ".to_string())).as_deref(), Some("X954"));
        assert_eq!(cell_text(&Data::Int(5001)).as_deref(), Some("5001"));
        assert_eq!(cell_text(&Data::Float(5001.0)).as_deref(), Some("5001"));
        assert_eq!(cell_text(&Data::Float(2.5)).as_deref(), Some("2.5"));
    }

    #[test]
    fn test_datetime_text() {
        let midnight = NaiveDate::from_ymd_opt(2019, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(datetime_text(midnight), "2019-03-15");

        let afternoon = NaiveDate::from_ymd_opt(2019, 3, 15)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(datetime_text(afternoon), "2019-03-15T14:05:00");
    }

    #[test]
    fn test_header_columns_skip_blank_and_duplicates() {
        let names = vec![
            Some("A".to_string()),
            None,
            Some("B".to_string()),
            Some("A".to_string()),
        ];
        let columns = header_columns(names.into_iter());
        assert_eq!(columns, vec![("A".to_string(), 0), ("B".to_string(), 2)]);
    }

    #[test]
    fn test_read_csv_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deaths.csv");
        fs::write(&path, "COD_DEPARTAMENTO,SEXO\n5,1\n11,2\n").unwrap();

        let frame = read_table(&path).unwrap();
        assert_eq!(frame.height(), 2);
        let codes: Vec<Option<&str>> = frame
            .column("COD_DEPARTAMENTO")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(codes, vec![Some("5"), Some("11")]);
    }

    #[test]
    fn test_read_csv_skips_blank_and_duplicate_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deaths.csv");
        fs::write(&path, "SEXO,,SEXO,MES\n1,x,2,3\n2,y,1,4\n").unwrap();

        let frame = read_table(&path).unwrap();
        let names: Vec<&str> = frame
            .get_column_names()
            .iter()
            .map(|name| name.as_str())
            .collect();
        assert_eq!(names, vec!["SEXO", "MES"]);

        let sexes: Vec<Option<&str>> = frame
            .column("SEXO")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(sexes, vec![Some("1"), Some("2")]);
    }

    #[test]
    fn test_unsupported_format() {
        let result = read_table(Path::new("deaths.parquet"));
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_find_input_picks_newest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("NoFetal2019_CE_01-02-22.csv"), "").unwrap();
        fs::write(dir.path().join("NoFetal2019_CE_15-03-23.csv"), "").unwrap();

        let found = find_input(dir.path(), "NoFetal2019_CE_*.csv").unwrap().unwrap();
        assert!(found.ends_with("NoFetal2019_CE_15-03-23.csv"));
        assert!(find_input(dir.path(), "missing*.csv").unwrap().is_none());
    }

    #[test]
    fn test_find_input_compares_dates_not_names() {
        let dir = tempfile::tempdir().unwrap();
        // "31-12-22" sorts after "15-03-23" as text but is older
        fs::write(dir.path().join("NoFetal2019_CE_31-12-22.csv"), "").unwrap();
        fs::write(dir.path().join("NoFetal2019_CE_15-03-23.csv"), "").unwrap();
        fs::write(dir.path().join("NoFetal2019_CE_copia.csv"), "").unwrap();

        let found = find_input(dir.path(), "NoFetal2019_CE_*.csv").unwrap().unwrap();
        assert!(found.ends_with("NoFetal2019_CE_15-03-23.csv"));
    }

    #[test]
    fn test_find_input_undated_uses_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Divipola_CE_.csv"), "").unwrap();
        fs::write(dir.path().join("Divipola_CE_b.csv"), "").unwrap();

        let found = find_input(dir.path(), "Divipola_CE_*.csv").unwrap().unwrap();
        assert!(found.ends_with("Divipola_CE_b.csv"));
    }

    #[test]
    fn test_export_date() {
        assert_eq!(
            export_date(Path::new("data/NoFetal2019_CE_15-03-23.xlsx")),
            NaiveDate::from_ymd_opt(2023, 3, 15)
        );
        assert_eq!(export_date(Path::new("Divipola_CE_.xlsx")), None);
        assert_eq!(export_date(Path::new("col_departamentos.geojson")), None);
    }

    #[test]
    fn test_resolve_requires_main_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig {
            dir: dir.path().to_path_buf(),
            ..DataConfig::default()
        };
        let result = InputFiles::resolve(&config);
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }
}

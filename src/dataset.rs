//! The denormalized mortality table
//!
//! Joins the death records against the Divipola registry (department and
//! municipality names) and the CIE-10 code list (cause descriptions), then
//! derives the month and age-cohort columns the charts group by.

use std::collections::HashSet;

use polars::prelude::*;
use tracing::{info, warn};

use crate::loader::{LoadError, RawInputs, text_frame};
use crate::normalize::{self, AgeCohort};

pub const COD_DEPARTAMENTO: &str = "COD_DEPARTAMENTO";
pub const DEPARTAMENTO: &str = "DEPARTAMENTO";
pub const COD_MUNICIPIO: &str = "COD_MUNICIPIO";
pub const MUNICIPIO: &str = "MUNICIPIO";
pub const COD_MUERTE: &str = "COD_MUERTE";
pub const CAUSA_MUERTE: &str = "CAUSA_MUERTE";
pub const SEXO: &str = "SEXO";
pub const MES: &str = "MES";
pub const MES_DEF: &str = "MES_DEF";
pub const FECHA_DEF: &str = "FECHA_DEF";
pub const GRUPO_EDAD1: &str = "GRUPO_EDAD1";
pub const GRUPO_EDAD_CAT: &str = "GRUPO_EDAD_CAT";
pub const COD_CIE_10: &str = "COD_CIE_10";
pub const DESC_CIE_10: &str = "DESC_CIE_10";

const DEPARTMENT_WIDTH: usize = 2;
const MUNICIPALITY_WIDTH: usize = 5;

/// Rows left without a name after each join
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub rows: usize,
    pub missing_department: usize,
    pub missing_municipality: usize,
    pub missing_cause: usize,
    pub missing_month: usize,
}

/// One row per death, with reference names joined in
#[derive(Debug, Clone)]
pub struct MortalityTable {
    frame: DataFrame,
    stats: JoinStats,
}

impl MortalityTable {
    /// Build the table from the three raw inputs
    pub fn from_inputs(inputs: RawInputs) -> Result<Self, LoadError> {
        Self::build(inputs.deaths, inputs.divipola, inputs.causes)
    }

    /// Normalize the death records and left-join the reference tables
    pub fn build(
        deaths: DataFrame,
        divipola: DataFrame,
        causes: DataFrame,
    ) -> Result<Self, LoadError> {
        require_columns(
            &deaths,
            "death records",
            &[COD_DEPARTAMENTO, COD_MUNICIPIO, COD_MUERTE, SEXO, GRUPO_EDAD1],
        )?;
        require_columns(
            &divipola,
            "Divipola",
            &[COD_DEPARTAMENTO, DEPARTAMENTO, COD_MUNICIPIO, MUNICIPIO],
        )?;
        require_columns(&causes, "cause codes", &[COD_CIE_10, DESC_CIE_10])?;

        let deaths = normalize_deaths(deaths)?;

        let departments = lookup_table(
            &divipola,
            (COD_DEPARTAMENTO, COD_DEPARTAMENTO),
            (DEPARTAMENTO, DEPARTAMENTO),
            |code| normalize::zero_pad(code, DEPARTMENT_WIDTH),
        )?;
        let municipalities = lookup_table(
            &divipola,
            (COD_MUNICIPIO, COD_MUNICIPIO),
            (MUNICIPIO, MUNICIPIO),
            |code| normalize::zero_pad(code, MUNICIPALITY_WIDTH),
        )?;
        let cause_names = lookup_table(
            &causes,
            (COD_CIE_10, COD_MUERTE),
            (DESC_CIE_10, CAUSA_MUERTE),
            normalize::cause_code,
        )?;

        let frame = deaths
            .lazy()
            .left_join(departments.lazy(), col(COD_DEPARTAMENTO), col(COD_DEPARTAMENTO))
            .left_join(municipalities.lazy(), col(COD_MUNICIPIO), col(COD_MUNICIPIO))
            .left_join(cause_names.lazy(), col(COD_MUERTE), col(COD_MUERTE))
            .collect()?;

        let stats = JoinStats {
            rows: frame.height(),
            missing_department: frame.column(DEPARTAMENTO)?.null_count(),
            missing_municipality: frame.column(MUNICIPIO)?.null_count(),
            missing_cause: frame.column(CAUSA_MUERTE)?.null_count(),
            missing_month: frame.column(MES)?.null_count(),
        };

        info!("Total rows loaded: {}", stats.rows);
        info!(
            "Columns: {:?}",
            frame
                .get_column_names()
                .iter()
                .map(|name| name.as_str())
                .collect::<Vec<_>>()
        );
        for (what, missing) in [
            ("department", stats.missing_department),
            ("municipality", stats.missing_municipality),
            ("cause description", stats.missing_cause),
            ("month", stats.missing_month),
        ] {
            if missing > 0 {
                warn!("{} of {} rows have no {}", missing, stats.rows, what);
            }
        }

        Ok(Self { frame, stats })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn stats(&self) -> &JoinStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }
}

fn require_columns(frame: &DataFrame, table: &str, columns: &[&str]) -> Result<(), LoadError> {
    for column in columns {
        if frame.column(column).is_err() {
            return Err(LoadError::MissingColumn {
                table: table.to_string(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

/// Values of a column as owned text, whatever its dtype
fn text_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoadError> {
    let column = frame.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

fn mapped_column(
    frame: &DataFrame,
    name: &str,
    map: impl Fn(&str) -> Option<String>,
) -> Result<Column, LoadError> {
    let values: Vec<Option<String>> = text_values(frame, name)?
        .into_iter()
        .map(|value| value.and_then(|v| map(v.as_str())))
        .collect();
    Ok(Column::new(name.into(), values))
}

fn normalize_deaths(mut deaths: DataFrame) -> Result<DataFrame, LoadError> {
    // Names always come from the reference tables
    for joined in [DEPARTAMENTO, MUNICIPIO, CAUSA_MUERTE] {
        if deaths.column(joined).is_ok() {
            deaths = deaths.drop(joined)?;
        }
    }

    let department = mapped_column(&deaths, COD_DEPARTAMENTO, |v| {
        normalize::zero_pad(v, DEPARTMENT_WIDTH)
    })?;
    let municipality = mapped_column(&deaths, COD_MUNICIPIO, |v| {
        normalize::zero_pad(v, MUNICIPALITY_WIDTH)
    })?;
    let sex = mapped_column(&deaths, SEXO, normalize::sex_label)?;
    let cause = mapped_column(&deaths, COD_MUERTE, normalize::cause_code)?;
    let month = month_column(&deaths)?;
    let cohort = cohort_column(&deaths)?;

    for column in [department, municipality, sex, cause, month, cohort] {
        deaths.with_column(column)?;
    }
    Ok(deaths)
}

/// Month of death from the first available source column
fn month_column(deaths: &DataFrame) -> Result<Column, LoadError> {
    let months: Vec<Option<u32>> = if deaths.column(MES).is_ok() {
        month_values(deaths, MES, normalize::month_number)?
    } else if deaths.column(MES_DEF).is_ok() {
        month_values(deaths, MES_DEF, normalize::month_number)?
    } else if deaths.column(FECHA_DEF).is_ok() {
        month_values(deaths, FECHA_DEF, normalize::month_from_date)?
    } else {
        warn!("No month column found; monthly series will be empty");
        vec![None; deaths.height()]
    };
    Ok(Column::new(MES.into(), months))
}

fn month_values(
    deaths: &DataFrame,
    name: &str,
    parse: fn(&str) -> Option<u32>,
) -> Result<Vec<Option<u32>>, LoadError> {
    Ok(text_values(deaths, name)?
        .into_iter()
        .map(|value| value.and_then(|v| parse(v.as_str())))
        .collect())
}

fn cohort_column(deaths: &DataFrame) -> Result<Column, LoadError> {
    let labels: Vec<String> = text_values(deaths, GRUPO_EDAD1)?
        .iter()
        .map(|value| AgeCohort::classify(value.as_deref()).label().to_string())
        .collect();
    Ok(Column::new(GRUPO_EDAD_CAT.into(), labels))
}

/// Two-column code → name table with one row per code
///
/// The first name seen for a code wins, so joining never multiplies deaths.
fn lookup_table(
    source: &DataFrame,
    (key_column, key_name): (&str, &str),
    (value_column, value_name): (&str, &str),
    normalize_key: impl Fn(&str) -> Option<String>,
) -> Result<DataFrame, LoadError> {
    let keys = text_values(source, key_column)?;
    let values = text_values(source, value_column)?;

    let mut seen = HashSet::new();
    let mut out_keys = Vec::new();
    let mut out_values = Vec::new();
    for (key, value) in keys.into_iter().zip(values) {
        let Some(key) = key.and_then(|k| normalize_key(k.as_str())) else {
            continue;
        };
        if seen.insert(key.clone()) {
            out_keys.push(Some(key));
            out_values.push(value.map(|v| v.trim().to_string()));
        }
    }

    text_frame([
        (key_name.to_string(), out_keys),
        (value_name.to_string(), out_values),
    ])
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Small Divipola registry: Antioquia, Bogotá and Valle
    pub fn divipola() -> DataFrame {
        df!(
            COD_DEPARTAMENTO => &["5", "5", "11", "76"],
            DEPARTAMENTO => &["ANTIOQUIA", "ANTIOQUIA", "BOGOTÁ, D.C.", "VALLE DEL CAUCA"],
            COD_MUNICIPIO => &["5001", "5088", "11001", "76001"],
            MUNICIPIO => &["MEDELLÍN", "BELLO", "BOGOTÁ, D.C.", "CALI"],
        )
        .unwrap()
    }

    pub fn causes() -> DataFrame {
        df!(
            COD_CIE_10 => &["X954", "x990", "I219", "J189", "C349"],
            DESC_CIE_10 => &[
                "Agresión con disparo de armas de fuego",
                "Agresión con objeto cortante",
                "Infarto agudo del miocardio",
                "Neumonía, no especificada",
                "Tumor maligno de los bronquios o del pulmón",
            ],
        )
        .unwrap()
    }

    /// Ten deaths spread over three departments
    pub fn deaths() -> DataFrame {
        df!(
            COD_DEPARTAMENTO => &["5", "5", "5", "11", "11", "11", "76", "76", "76", "99"],
            COD_MUNICIPIO => &["5001", "5001", "5088", "11001", "11001", "11001", "76001", "76001", "76001", "99001"],
            COD_MUERTE => &["X954", "x954 ", "I219", "I219", "J189", "X990", "I219", "C349", "X954", "Z999"],
            SEXO => &["1", "2", "1", "2", "1", "1", "2", "2", "1", "3"],
            MES => &["1", "1", "2", "3", "3", "3", "12", "13", "0", "x"],
            GRUPO_EDAD1 => &["15", "17", "22", "26", "3", "13", "22", "20", "12", "99"],
        )
        .unwrap()
    }

    pub fn table() -> MortalityTable {
        MortalityTable::build(deaths(), divipola(), causes()).unwrap()
    }
}

//! Aggregations behind each dashboard tab
//!
//! Every function runs a polars lazy group-by over the shared table and
//! returns plain rows, so the chart builders never touch polars types.
//! Null grouping keys are dropped before counting.

use std::collections::HashMap;

use polars::prelude::*;
use thiserror::Error;

use crate::dataset::{
    CAUSA_MUERTE, COD_MUERTE, DEPARTAMENTO, GRUPO_EDAD_CAT, MES, MUNICIPIO, MortalityTable, SEXO,
};
use crate::normalize::AgeCohort;

/// CIE-10 prefixes for assault by firearm, explosive, fire, sharp or blunt object
pub const VIOLENT_CAUSE_PREFIXES: [&str; 5] = ["X95", "X96", "X97", "X98", "X99"];

const COUNT: &str = "count";

/// Errors that can occur while aggregating
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Aggregation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Deaths counted under one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Deaths in one calendar month (1 = January)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    pub month: u32,
    pub count: u64,
}

/// Deaths attributed to one CIE-10 code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauseCount {
    pub code: String,
    pub description: String,
    pub count: u64,
}

/// Deaths of one sex within one department
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SexCount {
    pub department: String,
    pub sex: String,
    pub count: u64,
}

/// Deaths per department, sorted by department name
pub fn deaths_by_department(table: &MortalityTable) -> Result<Vec<LabelCount>, AggregateError> {
    let out = count_by(table.frame().clone().lazy(), &[DEPARTAMENTO])
        .sort_by_exprs([col(DEPARTAMENTO)], SortMultipleOptions::default())
        .collect()?;
    label_counts(&out, DEPARTAMENTO)
}

/// Deaths per month, in calendar order
pub fn deaths_by_month(table: &MortalityTable) -> Result<Vec<MonthCount>, AggregateError> {
    let out = count_by(table.frame().clone().lazy(), &[MES])
        .sort_by_exprs([col(MES)], SortMultipleOptions::default())
        .collect()?;

    let months = out.column(MES)?.cast(&DataType::UInt32)?;
    let counts = count_values(&out)?;
    Ok(months
        .u32()?
        .into_iter()
        .zip(counts)
        .filter_map(|(month, count)| Some(MonthCount { month: month?, count }))
        .collect())
}

/// Municipalities with the most homicides (CIE-10 X95–X99)
///
/// Returns `None` when the table holds no homicide record at all.
pub fn violent_municipalities(
    table: &MortalityTable,
    limit: usize,
) -> Result<Option<Vec<LabelCount>>, AggregateError> {
    let violent = table.frame().clone().lazy().filter(violent_cause());

    let total = violent.clone().select([len().alias(COUNT)]).collect()?;
    if count_values(&total)?.first().copied().unwrap_or(0) == 0 {
        return Ok(None);
    }

    let out = count_by(violent, &[MUNICIPIO])
        .sort_by_exprs(
            [col(COUNT), col(MUNICIPIO)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(limit as IdxSize)
        .collect()?;
    label_counts(&out, MUNICIPIO).map(Some)
}

/// Municipalities with the fewest deaths, fewest first
pub fn least_mortality_municipalities(
    table: &MortalityTable,
    limit: usize,
) -> Result<Vec<LabelCount>, AggregateError> {
    let out = count_by(table.frame().clone().lazy(), &[MUNICIPIO])
        .sort_by_exprs([col(COUNT), col(MUNICIPIO)], SortMultipleOptions::default())
        .limit(limit as IdxSize)
        .collect()?;
    label_counts(&out, MUNICIPIO)
}

/// Most frequent causes of death, most frequent first
///
/// Codes without a description in the code list are left out.
pub fn top_causes(table: &MortalityTable, limit: usize) -> Result<Vec<CauseCount>, AggregateError> {
    let out = count_by(table.frame().clone().lazy(), &[COD_MUERTE, CAUSA_MUERTE])
        .sort_by_exprs(
            [col(COUNT), col(COD_MUERTE)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(limit as IdxSize)
        .collect()?;

    let codes = text_values(&out, COD_MUERTE)?;
    let descriptions = text_values(&out, CAUSA_MUERTE)?;
    let counts = count_values(&out)?;
    Ok(codes
        .into_iter()
        .zip(descriptions)
        .zip(counts)
        .map(|((code, description), count)| CauseCount {
            code,
            description,
            count,
        })
        .collect())
}

/// Deaths per department split by sex
pub fn deaths_by_department_and_sex(
    table: &MortalityTable,
) -> Result<Vec<SexCount>, AggregateError> {
    let out = count_by(table.frame().clone().lazy(), &[DEPARTAMENTO, SEXO])
        .sort_by_exprs([col(DEPARTAMENTO), col(SEXO)], SortMultipleOptions::default())
        .collect()?;

    let departments = text_values(&out, DEPARTAMENTO)?;
    let sexes = text_values(&out, SEXO)?;
    let counts = count_values(&out)?;
    Ok(departments
        .into_iter()
        .zip(sexes)
        .zip(counts)
        .map(|((department, sex), count)| SexCount {
            department,
            sex,
            count,
        })
        .collect())
}

/// Deaths per age cohort; every cohort is present, in chart order
pub fn deaths_by_age_cohort(
    table: &MortalityTable,
) -> Result<Vec<(AgeCohort, u64)>, AggregateError> {
    let out = count_by(table.frame().clone().lazy(), &[GRUPO_EDAD_CAT]).collect()?;

    let counts: HashMap<AgeCohort, u64> = label_counts(&out, GRUPO_EDAD_CAT)?
        .into_iter()
        .filter_map(|row| Some((AgeCohort::from_label(&row.label)?, row.count)))
        .collect();

    Ok(AgeCohort::ALL
        .into_iter()
        .map(|cohort| (cohort, counts.get(&cohort).copied().unwrap_or(0)))
        .collect())
}

/// Rows whose cause code starts with one of the homicide prefixes
fn violent_cause() -> Expr {
    VIOLENT_CAUSE_PREFIXES
        .iter()
        .map(|prefix| col(COD_MUERTE).str().starts_with(lit(*prefix)))
        .reduce(|acc, expr| acc.or(expr))
        .unwrap_or_else(|| lit(false))
}

/// Group by `keys` (nulls dropped) and count rows per group
fn count_by(frame: LazyFrame, keys: &[&str]) -> LazyFrame {
    let filtered = keys
        .iter()
        .fold(frame, |lf, key| lf.filter(col(*key).is_not_null()));
    let by: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    filtered.group_by(by).agg([len().alias(COUNT)])
}

fn text_values(frame: &DataFrame, name: &str) -> Result<Vec<String>, AggregateError> {
    Ok(frame
        .column(name)?
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

fn count_values(frame: &DataFrame) -> Result<Vec<u64>, AggregateError> {
    let counts = frame.column(COUNT)?.cast(&DataType::UInt64)?;
    Ok(counts
        .u64()?
        .into_iter()
        .map(|value| value.unwrap_or(0))
        .collect())
}

fn label_counts(frame: &DataFrame, name: &str) -> Result<Vec<LabelCount>, AggregateError> {
    let labels = text_values(frame, name)?;
    let counts = count_values(frame)?;
    Ok(labels
        .into_iter()
        .zip(counts)
        .map(|(label, count)| LabelCount { label, count })
        .collect())
}

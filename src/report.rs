//! Plain-text load report
//!
//! Printed by `--summary` to check a data drop without starting the server.

use std::io::{self, Write};

use thiserror::Error;

use crate::aggregate::{self, AggregateError};
use crate::dashboard::Dashboard;
use crate::normalize::month_label;

/// Errors that can occur while writing the report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    IoError(#[from] io::Error),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Write a summary of the loaded table to the given writer
pub fn generate_summary<W: Write>(dashboard: &Dashboard, writer: &mut W) -> Result<(), ReportError> {
    let table = dashboard.table();
    let stats = table.stats();

    writeln!(writer, "Mortalidad 2019: resumen de carga")?;
    writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(writer)?;
    writeln!(writer, "Filas: {}", stats.rows)?;
    writeln!(writer, "Columnas: {}", table.column_names().join(", "))?;
    writeln!(writer)?;

    writeln!(writer, "Cruces sin coincidencia")?;
    writeln!(writer, "  Departamento:     {}", stats.missing_department)?;
    writeln!(writer, "  Municipio:        {}", stats.missing_municipality)?;
    writeln!(writer, "  Causa (CIE-10):   {}", stats.missing_cause)?;
    writeln!(writer, "  Mes:              {}", stats.missing_month)?;
    writeln!(writer)?;

    let months: Vec<&str> = aggregate::deaths_by_month(table)?
        .iter()
        .filter_map(|row| month_label(row.month))
        .collect();
    writeln!(writer, "Meses presentes: {}", months.join(" "))?;
    writeln!(writer)?;

    writeln!(writer, "Defunciones por grupo de edad")?;
    for (cohort, count) in aggregate::deaths_by_age_cohort(table)? {
        writeln!(writer, "  {:<26} {:>8}", cohort.label(), count)?;
    }
    writeln!(writer)?;

    match dashboard.boundaries() {
        Some(boundaries) => writeln!(
            writer,
            "GeoJSON: {} departamentos ({} sin nombre)",
            boundaries.feature_count(),
            boundaries.unnamed_count()
        )?,
        None => writeln!(writer, "GeoJSON: no disponible (el mapa usa barras)")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures;

    #[test]
    fn test_summary_report() {
        let dashboard = Dashboard::new(fixtures::table(), None, "properties.NOMBRE_DPT");
        let mut out = Vec::new();
        generate_summary(&dashboard, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Filas: 10"));
        assert!(text.contains("Departamento:     1"));
        assert!(text.contains("Meses presentes: Ene Feb Mar Dic"));
        assert!(text.contains("Edad desconocida"));
        assert!(text.contains("GeoJSON: no disponible"));
    }
}

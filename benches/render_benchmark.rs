//! Per-click cost of every tab over a synthetic national table

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use polars::prelude::*;

use mortalidad_dashboard::{Dashboard, MortalityTable, Tab};

const DEPARTMENTS: [(&str, &str); 4] = [
    ("5", "ANTIOQUIA"),
    ("11", "BOGOTÁ, D.C."),
    ("76", "VALLE DEL CAUCA"),
    ("8", "ATLÁNTICO"),
];
const CAUSES: [&str; 6] = ["X954", "X990", "I219", "J189", "C349", "E119"];

fn synthetic_table(rows: usize) -> MortalityTable {
    let mut departments = Vec::with_capacity(rows);
    let mut municipalities = Vec::with_capacity(rows);
    let mut causes = Vec::with_capacity(rows);
    let mut sexes = Vec::with_capacity(rows);
    let mut ages = Vec::with_capacity(rows);
    let mut months = Vec::with_capacity(rows);

    for i in 0..rows {
        let (code, _) = DEPARTMENTS[i % DEPARTMENTS.len()];
        departments.push(code.to_string());
        municipalities.push(format!("{}{:03}", code, 1 + (i / 7) % 40));
        causes.push(CAUSES[i % CAUSES.len()].to_string());
        sexes.push(if i % 2 == 0 { "1" } else { "2" }.to_string());
        ages.push(((i * 13) % 30).to_string());
        months.push((1 + i % 12).to_string());
    }

    let deaths = df!(
        "COD_DEPARTAMENTO" => departments,
        "COD_MUNICIPIO" => municipalities,
        "COD_MUERTE" => causes,
        "SEXO" => sexes,
        "GRUPO_EDAD1" => ages,
        "MES" => months,
    )
    .unwrap();

    let mut dept_codes = Vec::new();
    let mut dept_names = Vec::new();
    let mut muni_codes = Vec::new();
    let mut muni_names = Vec::new();
    for (code, name) in DEPARTMENTS {
        for m in 1..=40 {
            dept_codes.push(code.to_string());
            dept_names.push(name.to_string());
            muni_codes.push(format!("{}{:03}", code, m));
            muni_names.push(format!("{} {}", name, m));
        }
    }
    let divipola = df!(
        "COD_DEPARTAMENTO" => dept_codes,
        "DEPARTAMENTO" => dept_names,
        "COD_MUNICIPIO" => muni_codes,
        "MUNICIPIO" => muni_names,
    )
    .unwrap();

    let causes = df!(
        "COD_CIE_10" => CAUSES,
        "DESC_CIE_10" => CAUSES.map(|c| format!("Causa {}", c)),
    )
    .unwrap();

    MortalityTable::build(deaths, divipola, causes).unwrap()
}

fn bench_tabs(c: &mut Criterion) {
    let dashboard = Dashboard::new(synthetic_table(100_000), None, "properties.NOMBRE_DPT");

    let mut group = c.benchmark_group("render_tab");
    for tab in Tab::ALL {
        group.bench_function(tab.id(), |b| {
            b.iter(|| dashboard.render_tab(black_box(tab)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tabs);
criterion_main!(benches);

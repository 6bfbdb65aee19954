use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgbind::{Clauses, Params, Statement, Value, compile_condition};

/// `n` column/value pairs `col0 => 0, col1 => 1, ...`
fn build_clauses(n: usize) -> Clauses {
    (0..n)
        .map(|i| (format!("col{i}"), Value::from(i as i64)))
        .collect()
}

/// `col0 = ? AND col1 = ? ...` with positional bindings.
fn build_positional(n: usize) -> (String, Params) {
    let sql = (0..n)
        .map(|i| format!("col{i} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let mut params = Params::new();
    for i in 0..n {
        params.push(i as i64);
    }
    (sql, params)
}

fn bench_clauses(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/clauses");

    for n in [1, 5, 10, 50, 100] {
        let clauses = build_clauses(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &clauses, |b, clauses| {
            b.iter(|| black_box(compile_condition(clauses.clone(), Params::new())));
        });
    }

    group.finish();
}

fn bench_positional(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/positional");

    for n in [1, 5, 10, 50, 100] {
        let (sql, params) = build_positional(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(compile_condition(sql.as_str(), params.clone())));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut params = Params::new();
                params.insert("ids", values.clone());
                black_box(compile_condition("id IN (:ids)", params))
            });
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/render_numbered");

    for n in [1, 10, 100] {
        let (sql, params) = compile_condition(build_clauses(n), Params::new()).into_parts();
        let stmt = Statement::new(sql, params);
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(stmt.render()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_clauses,
    bench_positional,
    bench_in_list,
    bench_render
);
criterion_main!(benches);

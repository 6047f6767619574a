use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use entorm::{Conditions, EntityDef, QueryBuilder, SelectQuery, Value, select};
use std::sync::Arc;

/// SELECT * FROM t WHERE col0 = 0 AND (col1 = 1 OR col2 = 2) AND ...
fn build_select(n: usize) -> QueryBuilder {
    let mut qb = select("t");
    for i in 0..n {
        qb = if i % 3 == 0 {
            qb.where_((format!("col{i}"), i as i64)).unwrap()
        } else {
            qb.or_parenthesis()
                .where_((format!("col{i}"), "LIKE", format!("%{i}%")))
                .unwrap()
                .or_where((format!("col{i}"), Value::Null))
                .unwrap()
                .close()
        };
    }
    qb
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/render");

    for n in [1, 5, 10, 50, 100] {
        let qb = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.get_query()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).get_query()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let qb = select("t").where_(("id", values.clone())).unwrap();
                black_box(qb.get_query());
            });
        });
    }

    group.finish();
}

fn bench_alias_resolution(c: &mut Criterion) {
    let root = Arc::new(EntityDef::new("Article", "articles").column_prefix("art_"));
    let joined = Arc::new(EntityDef::new("Author", "authors"));

    let mut group = c.benchmark_group("sql_builder/alias_resolution");

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut qb = QueryBuilder::for_entity(root.clone())
                    .join_expr(joined.clone(), "t0.authorId = t1.id", vec![])
                    .unwrap();
                for i in 0..n {
                    qb = qb
                        .where_((format!("Author::field{i}"), i as i64))
                        .unwrap()
                        .and_where(format!("someField{i} > 0"))
                        .unwrap();
                }
                black_box(qb.get_query());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render,
    bench_build_and_render,
    bench_in_list,
    bench_alias_resolution
);
criterion_main!(benches);

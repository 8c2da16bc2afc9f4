use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hyexpr::prelude::*;
use hyproj::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn length() -> Member {
    DeclaringType::of(Ty::Str).property("length", Ty::Int, |v| {
        Ok(Value::Int(v.as_str().map(|s| s.len() as i64).unwrap_or(0)))
    })
}

fn build_nested_projection(depth: usize) -> Projection {
    // x => x.length, then x => previous(x) + 1 repeated `depth` times
    let mut current =
        Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| x.member(&length()))).unwrap();
    for _ in 0..depth {
        let inner = current.clone();
        current = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| {
            inner.invoke_expr(x) + Expr::constant(1i64)
        }))
        .unwrap();
    }
    current
}

/// Random tree of specification operators over literal leaves. Seeded for determinism.
fn build_combinator_tree() -> Expr {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);

    fn leaf(rng: &mut impl Rng) -> Specification {
        let body = match rng.random_range(0..=1) {
            0 => {
                let value = ["A", "B", "AB", "ABC"][rng.random_range(0..4)];
                LambdaExpr::with_param("x", Ty::Str, |x| x.equals(Expr::constant(value)))
            }
            _ => {
                let n = rng.random_range(0..4i64);
                LambdaExpr::with_param("x", Ty::Str, |x| {
                    x.member(&length()).equals(Expr::constant(n))
                })
            }
        };
        Specification::new(body).unwrap()
    }

    fn next_create(budget: usize, rng: &mut impl Rng) -> Expr {
        if budget == 0 || rng.random_bool(0.2) {
            return leaf(rng).literal();
        }
        match rng.random_range(0..=2) {
            0 => {
                let left = next_create(budget - 1, rng);
                let right = next_create(budget - 1, rng);
                Specification::and_expr(left, right).unwrap()
            }
            1 => {
                let left = next_create(budget - 1, rng);
                let right = next_create(budget - 1, rng);
                Specification::or_expr(left, right).unwrap()
            }
            _ => Specification::not_expr(next_create(budget - 1, rng)).unwrap(),
        }
    }

    next_create(6, &mut rng)
}

fn bench_inline(c: &mut Criterion) {
    let rewriter = UnitRewriter::new();
    let nested = build_nested_projection(16);
    let raw = LambdaExpr::with_param("s", Ty::Str, |s| nested.call_expr(s));

    c.bench_function("inline_nested_projection", |b| {
        b.iter(|| {
            black_box(rewriter.rewrite_lambda(&raw).unwrap());
        })
    });
}

fn bench_combinators(c: &mut Criterion) {
    let rewriter = UnitRewriter::new();
    let tree = build_combinator_tree();

    c.bench_function("resolve_combinator_tree", |b| {
        b.iter(|| {
            black_box(rewriter.rewrite(&tree).unwrap());
        })
    });
}

fn bench_representations(c: &mut Criterion) {
    // Compiled function of the raw tree against the compiled rewritten tree
    let nested = build_nested_projection(16);
    let compiled = nested.as_function().unwrap();
    let inlined = compile(&nested.expression().unwrap());
    let input = Value::str("abcdef");

    c.bench_function("evaluate_raw_nested", |b| {
        b.iter(|| {
            black_box(compiled.call1(input.clone()).unwrap());
        })
    });

    c.bench_function("evaluate_inlined_nested", |b| {
        b.iter(|| {
            black_box(inlined.call1(input.clone()).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_inline,
    bench_combinators,
    bench_representations,
);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shroud_core::{
    ast::{Ast, Expression, Statement},
    random::Random,
    step::{NumbersToExpressions, Step},
    Pipeline, Preset,
};

/// A program returning `count` number literals.
fn literal_program(count: usize) -> Ast {
    let mut ast = Ast::new();
    ast.body.statements = vec![Statement::Return {
        args: (0..count).map(|i| Expression::number(i as f64 * 3.0 + 1.0)).collect(),
    }];
    ast
}

fn bench_create_number_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_number_expression");

    for internal in [0.0, 0.4, 0.8] {
        let mut step = NumbersToExpressions::new(1.0, internal);
        if step.init().is_err() {
            return;
        }
        group.bench_with_input(BenchmarkId::new("internal_treshold", internal), &internal, |b, _| {
            let mut random = Random::seeded(1);
            b.iter(|| step.create_number_expression(black_box(123456.0), 0, &mut random))
        });
    }

    group.finish();
}

fn bench_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("presets");

    for preset in Preset::ALL {
        let Ok(mut pipeline) = Pipeline::from_preset(preset) else {
            continue;
        };
        pipeline.set_seed(7);
        group.bench_with_input(BenchmarkId::new("apply", preset), &preset, |b, _| {
            b.iter(|| {
                let mut ast = literal_program(black_box(200));
                pipeline.apply(&mut ast).ok()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create_number_expression, bench_presets);
criterion_main!(benches);

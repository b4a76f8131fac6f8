use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use diamond_pricer::schema::DataSchema;
use diamond_pricer::server::AppState;
use diamond_pricer::training::{train, ModelConfig};
use diamond_pricer::validation::{
    DiamondRecord, CLARITY_VALUES, COLOR_VALUES, CUT_VALUES, POLISH_VALUES, REPORT_VALUES,
    SYMMETRY_VALUES,
};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_diamond_data(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut pick = |values: &[&'static str]| -> Vec<&'static str> {
        (0..n_rows).map(|_| values[rng.gen_range(0..values.len())]).collect()
    };

    let cut = pick(CUT_VALUES);
    let color = pick(COLOR_VALUES);
    let clarity = pick(CLARITY_VALUES);
    let polish = pick(POLISH_VALUES);
    let symmetry = pick(SYMMETRY_VALUES);
    let report = pick(REPORT_VALUES);

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let carat: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0.75..3.0)).collect();
    let price: Vec<f64> = carat
        .iter()
        .map(|c| 6000.0 * c + rng.gen::<f64>() * 500.0)
        .collect();
    let id: Vec<String> = (0..n_rows).map(|i| i.to_string()).collect();

    df!(
        "Id" => id,
        "Carat Weight" => carat,
        "Cut" => cut,
        "Color" => color,
        "Clarity" => clarity,
        "Polish" => polish,
        "Symmetry" => symmetry,
        "Report" => report,
        "Price" => price
    )
    .unwrap()
}

fn trained_state(n_estimators: usize) -> AppState {
    let df = create_diamond_data(2000);
    let config = ModelConfig::new().with_n_estimators(n_estimators);
    let artifacts = train(&df, &DataSchema::default(), &config).unwrap();
    AppState::new(artifacts.pipeline, artifacts.model)
}

fn bench_single_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict_one");

    let record = DiamondRecord::from_json(&serde_json::json!({
        "Id": "bench",
        "Carat Weight": 1.4,
        "Cut": "Ideal",
        "Color": "F",
        "Clarity": "VS1",
        "Polish": "EX",
        "Symmetry": "VG",
        "Report": "GIA"
    }))
    .unwrap();

    for n_estimators in [50, 250].iter() {
        let state = trained_state(*n_estimators);
        group.bench_with_input(
            BenchmarkId::new("trees", n_estimators),
            &state,
            |b, state| b.iter(|| state.predict_one(black_box(&record)).unwrap()),
        );
    }

    group.finish();
}

fn bench_batch_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let state = trained_state(50);

    for n_rows in [100, 1000].iter() {
        let df = create_diamond_data(*n_rows);
        group.bench_with_input(BenchmarkId::new("transform", n_rows), &df, |b, df| {
            b.iter(|| state.pipeline.transform(black_box(df)).unwrap())
        });

        let x = state.pipeline.transform(&df).unwrap();
        group.bench_with_input(BenchmarkId::new("predict", n_rows), &x, |b, x| {
            b.iter(|| state.model.predict(black_box(x)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_record, bench_batch_transform);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use linear_pca::{fit, FitMethod, FitOptions};
use ndarray::{Array, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

// Random data with features as rows and observations as columns
fn generate_data(n_features: usize, n_samples: usize) -> Array2<f64> {
    Array::random((n_features, n_samples), Uniform::new(0., 10.))
}

fn bench_fit_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("PCA_fit");

    for &(n_features, n_samples) in [(50, 100), (100, 500), (200, 100), (1000, 50)].iter() {
        let data = generate_data(n_features, n_samples);
        group.throughput(Throughput::Elements((n_samples * n_features) as u64));

        for method in [FitMethod::Covariance, FitMethod::Svd] {
            let options = FitOptions::default().with_method(method);
            group.bench_with_input(
                BenchmarkId::new(method.to_string(), format!("{}x{}", n_features, n_samples)),
                &data,
                |b, data_matrix| b.iter(|| fit(data_matrix.view(), &options).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("PCA_transform");

    for &(n_features, n_samples) in [(100, 1000), (500, 1000)].iter() {
        let data = generate_data(n_features, n_samples);
        let model = fit(data.view(), &FitOptions::default().with_max_out_dim(10)).unwrap();
        group.throughput(Throughput::Elements((n_samples * n_features) as u64));
        group.bench_with_input(
            BenchmarkId::new("transform", format!("{}x{}", n_features, n_samples)),
            &data,
            |b, data_matrix| b.iter(|| model.transform(data_matrix.view()).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_fit_paths, bench_transform);
criterion_main!(benches);

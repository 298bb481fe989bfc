use criterion::{Criterion, black_box, criterion_group, criterion_main};
use matrix::matrix::Matrix;
use neural_network::Network;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn mnist_sized_batch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let network = Network::new(vec![784, 100, 30, 10], 0.1, 5.0, &mut rng);

    let batch_size = 10;
    let inputs = Matrix::random(784, batch_size, &mut rng);
    let mut target_data = vec![0.0; 10 * batch_size];
    for column in 0..batch_size {
        target_data[(column % 10) * batch_size + column] = 1.0;
    }
    let targets = Matrix::new(10, batch_size, target_data);

    c.bench_function("predict_784_100_30_10", |b| {
        b.iter(|| network.predict(black_box(&inputs)))
    });

    c.bench_function("train_batch_784_100_30_10", |b| {
        b.iter(|| {
            let mut trained = network.clone();
            trained.train_batch(black_box(&inputs), black_box(&targets), 60_000);
        })
    });
}

criterion_group!(benches, mnist_sized_batch);
criterion_main!(benches);

use criterion::{black_box, criterion_group, Criterion};
use tensorlist_core::error::Result;
use tensorlist_function::{AutogradContext, TensorListFunction};
use tensorlist_tensor::Tensor;

// Constants for benchmark data sizes
const SIZES: [(usize, &str); 2] = [(1000, "small"), (10000, "medium")];

fn leaf(size: usize) -> Result<Tensor> {
    let data: Vec<f32> = (0..size).map(|i| (i % 10) as f32 / 10.0).collect();
    let x = Tensor::new(data)?;
    x.set_requires_grad(true)?;
    Ok(x)
}

fn mul_add(x: &Tensor, y: &Tensor) -> Result<Vec<Tensor>> {
    TensorListFunction::named("MulAdd").apply(
        vec![x.clone(), y.clone()],
        |ctx: &mut AutogradContext, inputs: Vec<Tensor>| -> Result<Vec<Tensor>> {
            ctx.save_for_backward(inputs.clone());
            Ok(vec![inputs[0].mul(&inputs[1])?, inputs[0].add(&inputs[1])?])
        },
        |ctx: &mut AutogradContext, grads: Vec<Tensor>| -> Result<Vec<Tensor>> {
            let saved = ctx.get_saved_variables()?;
            Ok(vec![
                grads[0].mul(&saved[1])?.add(&grads[1])?,
                grads[0].mul(&saved[0])?.add(&grads[1])?,
            ])
        },
    )
}

pub fn invoke(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("function/invoke");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(50);

    for &(size, size_name) in &SIZES {
        let x = leaf(size).unwrap();
        let y = leaf(size).unwrap();
        group.bench_function(size_name, |b| b.iter(|| black_box(mul_add(&x, &y)).unwrap()));
    }

    group.finish();
}

pub fn backward(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("function/backward");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(50);

    for &(size, size_name) in &SIZES {
        let x = leaf(size).unwrap();
        let y = leaf(size).unwrap();
        group.bench_function(size_name, |b| {
            b.iter(|| {
                let outputs = mul_add(&x, &y).unwrap();
                outputs[0].add(&outputs[1]).unwrap().sum().unwrap().backward().unwrap();
                x.zero_grad().unwrap();
                y.zero_grad().unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, invoke, backward);

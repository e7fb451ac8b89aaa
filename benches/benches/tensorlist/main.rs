mod function;

use criterion::criterion_main;

criterion_main!(function::benches);

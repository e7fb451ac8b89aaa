#![allow(dead_code)]

use tensorlist_core::{
    device::{set_default_device, Device},
    dtype::DType,
    error::Result,
};
use tensorlist_tensor::{adapter::TensorAdapter, Tensor};

pub fn setup_device() {
    set_default_device(Device::CPU);
}

pub fn setup_tensor<T: TensorAdapter>(data: T, dtype: DType) -> Result<Tensor> {
    setup_device();
    Tensor::new_with_spec(data, Device::CPU, dtype)
}

pub fn setup_grad_tensor<T: TensorAdapter>(data: T, dtype: DType) -> Result<Tensor> {
    let tensor = setup_tensor(data, dtype)?;
    tensor.set_requires_grad(true)?;
    Ok(tensor)
}

pub fn assert_close(actual: &[f32], expected: &[f32], dtype: DType) {
    let tolerance = match dtype {
        DType::BF16 | DType::F16 => 0.1,
        _ => 1e-5,
    };
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((a - e).abs() < tolerance, "Expected value close to {}, got {}", e, a);
    }
}

#[macro_export]
macro_rules! test_float_ops {
    ([$($op:ident),*]) => {
        $(
            mod $op {
                use super::*;
                use paste::paste;

                paste! {
                    #[test]
                    fn bf16() -> Result<()> {
                        test_functions::[<$op _test>](DType::BF16)
                    }

                    #[test]
                    fn f16() -> Result<()> {
                        test_functions::[<$op _test>](DType::F16)
                    }

                    #[test]
                    fn f32() -> Result<()> {
                        test_functions::[<$op _test>](DType::F32)
                    }

                    #[test]
                    fn f64() -> Result<()> {
                        test_functions::[<$op _test>](DType::F64)
                    }
                }
            }
        )*
    };
}

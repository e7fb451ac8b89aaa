use half::{bf16, f16};
use tensorlist_core::{dtype::DType, error::Result};

/// Host element types a tensor can be built from or read back into.
pub trait TensorElement: Copy + Default + 'static {
    const DTYPE: DType;

    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

pub trait TensorAdapter: Sized {
    type Elem: TensorElement;

    fn to_flatten_vec(self) -> Result<Vec<Self::Elem>>;
    fn get_shape(&self) -> Vec<usize>;
    fn dtype(&self) -> DType {
        <Self::Elem as TensorElement>::DTYPE
    }
}

macro_rules! impl_tensor_element {
    ($t:ty, $dtype:expr, |$v:ident| $to:expr, |$w:ident| $from:expr) => {
        impl TensorElement for $t {
            const DTYPE: DType = $dtype;

            fn to_f64(self) -> f64 {
                let $v = self;
                $to
            }
            fn from_f64(value: f64) -> Self {
                let $w = value;
                $from
            }
        }
    };
}

impl_tensor_element!(bf16, DType::BF16, |v| v.to_f64(), |w| bf16::from_f64(w));
impl_tensor_element!(f16, DType::F16, |v| v.to_f64(), |w| f16::from_f64(w));
impl_tensor_element!(f32, DType::F32, |v| v as f64, |w| w as f32);
impl_tensor_element!(f64, DType::F64, |v| v, |w| w);
impl_tensor_element!(bool, DType::BOOL, |v| if v { 1.0 } else { 0.0 }, |w| w != 0.0);
impl_tensor_element!(u8, DType::U8, |v| v as f64, |w| w as u8);
impl_tensor_element!(u32, DType::U32, |v| v as f64, |w| w as u32);
impl_tensor_element!(i32, DType::I32, |v| v as f64, |w| w as i32);
impl_tensor_element!(i64, DType::I64, |v| v as f64, |w| w as i64);

macro_rules! impl_tensor_adapter {
    ($t:ty) => {
        // Scalar (Item Tensor)
        impl TensorAdapter for $t {
            type Elem = $t;

            fn to_flatten_vec(self) -> Result<Vec<$t>> {
                Ok(vec![self])
            }
            fn get_shape(&self) -> Vec<usize> {
                vec![]
            }
        }

        // 1D Vector
        impl TensorAdapter for Vec<$t> {
            type Elem = $t;

            fn to_flatten_vec(self) -> Result<Vec<$t>> {
                Ok(self)
            }
            fn get_shape(&self) -> Vec<usize> {
                vec![self.len()]
            }
        }

        // 2D Vector
        impl TensorAdapter for Vec<Vec<$t>> {
            type Elem = $t;

            fn to_flatten_vec(self) -> Result<Vec<$t>> {
                let cols = self.first().map_or(0, Vec::len);
                if self.iter().any(|row| row.len() != cols) {
                    return Err(tensorlist_core::error::Error::InvalidArgument(
                        "all rows must have the same length".into(),
                    ));
                }
                Ok(self.into_iter().flatten().collect())
            }
            fn get_shape(&self) -> Vec<usize> {
                if self.is_empty() {
                    vec![0, 0]
                } else {
                    vec![self.len(), self[0].len()]
                }
            }
        }
    };
}

impl_tensor_adapter!(bf16);
impl_tensor_adapter!(f16);
impl_tensor_adapter!(f32);
impl_tensor_adapter!(f64);
impl_tensor_adapter!(bool);
impl_tensor_adapter!(u8);
impl_tensor_adapter!(u32);
impl_tensor_adapter!(i32);
impl_tensor_adapter!(i64);

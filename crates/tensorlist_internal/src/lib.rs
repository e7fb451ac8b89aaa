pub mod prelude;

pub use tensorlist_core as core;
pub use tensorlist_function as function;
pub use tensorlist_tensor as tensor;

pub use tensorlist_core::dtype::{bf16, bfloat16, bool, f16, float16, float32, float64, half, int32, int64, uint32, uint8};
pub use tensorlist_tensor::{no_grad, with_grad};

pub use crate::core::{
    device::{get_default_device, set_default_device, Device},
    dtype::{get_default_dtype, set_default_dtype, DType},
    error::{Error, Result},
};
pub use crate::function::{AutogradContext, TensorListFunction};
pub use crate::tensor::{
    autograd::{backward, is_grad_enabled, no_grad_mode, Node},
    Tensor,
};

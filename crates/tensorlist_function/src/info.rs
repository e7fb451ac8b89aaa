#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tensorlist_core::{
    device::Device,
    dtype::{get_default_dtype, DType},
    error::Result,
};
use tensorlist_tensor::Tensor;

/// Shape, dtype and device of one input or output of a node, enough to build a zero gradient
/// for it without keeping the value alive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariableInfo {
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub device: Device,
    pub requires_grad: bool,
}

impl VariableInfo {
    /// Records `tensor`; an undefined tensor yields the placeholder record.
    pub fn new(tensor: &Tensor) -> Result<Self> {
        if !tensor.is_defined() {
            return Ok(Self::placeholder());
        }
        Ok(Self {
            shape: tensor.shape()?,
            dtype: tensor.dtype()?,
            device: tensor.device()?,
            requires_grad: tensor.requires_grad(),
        })
    }

    /// A 0-dim record of the default dtype on the CPU, used for outputs that were undefined.
    pub fn placeholder() -> Self {
        Self {
            shape: vec![],
            dtype: get_default_dtype(),
            device: Device::CPU,
            requires_grad: false,
        }
    }

    pub fn zeros(&self) -> Result<Tensor> {
        Tensor::zeros_with_spec(&self.shape, self.device, self.dtype)
    }
}

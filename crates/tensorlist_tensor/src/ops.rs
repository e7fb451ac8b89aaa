mod binary;
mod inplace;
mod reduction;
mod unary;

use crate::{
    autograd::{should_record, BackwardFn, Node, OpNode},
    Tensor,
};
use std::sync::Arc;
use tensorlist_core::error::{Error, Result};

/// Elementwise map into a fresh tensor with the same metadata as `x`.
pub(crate) fn map_unary(x: &Tensor, f: impl Fn(f64) -> f64) -> Result<Tensor> {
    let values: Vec<f64> = x.to_f64_vec()?.into_iter().map(f).collect();
    let metadata = x.metadata()?;
    Tensor::from_f64_with_spec(&values, metadata.layout().shape(), metadata.device(), metadata.dtype())
}

/// Elementwise zip of two tensors of identical shape and dtype.
pub(crate) fn map_binary(a: &Tensor, b: &Tensor, f: impl Fn(f64, f64) -> f64) -> Result<Tensor> {
    check_same_spec(a, b)?;
    let lhs = a.to_f64_vec()?;
    let rhs = b.to_f64_vec()?;
    let values: Vec<f64> = lhs.into_iter().zip(rhs).map(|(x, y)| f(x, y)).collect();
    let metadata = a.metadata()?;
    Tensor::from_f64_with_spec(&values, metadata.layout().shape(), metadata.device(), metadata.dtype())
}

pub(crate) fn check_same_spec(a: &Tensor, b: &Tensor) -> Result<()> {
    if a.dtype()? != b.dtype()? {
        return Err(Error::DTypeMismatch {
            expected: a.dtype()?,
            got: b.dtype()?,
        });
    }
    if a.shape()? != b.shape()? {
        return Err(Error::ShapeMismatch {
            expected: a.shape()?,
            got: b.shape()?,
        });
    }
    Ok(())
}

/// Attaches an [`OpNode`] to `output` when grad mode is on and any input requires grad.
pub(crate) fn record(output: Tensor, op_name: &'static str, inputs: Vec<Tensor>, backward_fn: BackwardFn) -> Result<Tensor> {
    if !should_record(&inputs) {
        return Ok(output);
    }

    let node: Arc<dyn Node> = Arc::new(OpNode::new(op_name, inputs, backward_fn)?);
    output.set_gradient_edge(node, 0)?;
    Ok(output)
}

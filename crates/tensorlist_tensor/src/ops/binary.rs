use super::{map_binary, record};
use crate::Tensor;
use tensorlist_core::error::Result;

impl Tensor {
    pub fn add(&self, rhs: &Tensor) -> Result<Tensor> {
        let output = map_binary(self, rhs, |a, b| a + b)?;
        record(
            output,
            "Add",
            vec![self.clone(), rhs.clone()],
            Box::new(|_inputs: &[Tensor], grad_out: &Tensor| -> Result<Vec<Tensor>> {
                Ok(vec![grad_out.clone(), grad_out.clone()])
            }),
        )
    }

    pub fn sub(&self, rhs: &Tensor) -> Result<Tensor> {
        let output = map_binary(self, rhs, |a, b| a - b)?;
        record(
            output,
            "Sub",
            vec![self.clone(), rhs.clone()],
            Box::new(|_inputs: &[Tensor], grad_out: &Tensor| -> Result<Vec<Tensor>> {
                Ok(vec![grad_out.clone(), grad_out.neg()?])
            }),
        )
    }

    pub fn mul(&self, rhs: &Tensor) -> Result<Tensor> {
        let output = map_binary(self, rhs, |a, b| a * b)?;
        record(
            output,
            "Mul",
            vec![self.clone(), rhs.clone()],
            Box::new(|inputs: &[Tensor], grad_out: &Tensor| -> Result<Vec<Tensor>> {
                let (lhs, rhs) = (&inputs[0], &inputs[1]);
                Ok(vec![grad_out.mul(rhs)?, grad_out.mul(lhs)?])
            }),
        )
    }
}

use super::{map_unary, record};
use crate::Tensor;
use tensorlist_core::error::Result;

impl Tensor {
    pub fn neg(&self) -> Result<Tensor> {
        let output = map_unary(self, |a| -a)?;
        record(
            output,
            "Neg",
            vec![self.clone()],
            Box::new(|_inputs: &[Tensor], grad_out: &Tensor| -> Result<Vec<Tensor>> {
                Ok(vec![grad_out.neg()?])
            }),
        )
    }

    pub fn exp(&self) -> Result<Tensor> {
        let output = map_unary(self, f64::exp)?;
        record(
            output,
            "Exp",
            vec![self.clone()],
            Box::new(|inputs: &[Tensor], grad_out: &Tensor| -> Result<Vec<Tensor>> {
                Ok(vec![grad_out.mul(&inputs[0].exp()?)?])
            }),
        )
    }

    pub fn mul_scalar(&self, scalar: f64) -> Result<Tensor> {
        let output = map_unary(self, |a| a * scalar)?;
        record(
            output,
            "MulScalar",
            vec![self.clone()],
            Box::new(move |_inputs: &[Tensor], grad_out: &Tensor| -> Result<Vec<Tensor>> {
                Ok(vec![grad_out.mul_scalar(scalar)?])
            }),
        )
    }
}

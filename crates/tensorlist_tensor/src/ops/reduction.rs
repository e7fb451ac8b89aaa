use super::record;
use crate::Tensor;
use tensorlist_core::error::Result;

impl Tensor {
    /// Sum of all elements as a 0-dimensional tensor.
    pub fn sum(&self) -> Result<Tensor> {
        let total: f64 = self.to_f64_vec()?.into_iter().sum();
        let output = Tensor::from_f64_with_spec(&[total], &[], self.device()?, self.dtype()?)?;
        record(
            output,
            "Sum",
            vec![self.clone()],
            Box::new(|inputs: &[Tensor], grad_out: &Tensor| -> Result<Vec<Tensor>> {
                let input = &inputs[0];
                let g = grad_out.item::<f64>()?;
                Ok(vec![Tensor::fill_with_spec(&input.shape()?, g, input.device()?, input.dtype()?)?])
            }),
        )
    }
}

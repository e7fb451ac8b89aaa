use crate::{adapter::TensorElement, Tensor};
use tensorlist_core::error::{Error, Result};

impl Tensor {
    pub fn to_flatten_vec<T: TensorElement>(&self) -> Result<Vec<T>> {
        Ok(self.to_f64_vec()?.into_iter().map(T::from_f64).collect())
    }

    pub fn item<T: TensorElement>(&self) -> Result<T> {
        let size = self.size()?;
        if size != 1 {
            return Err(Error::InvalidArgument(format!(
                "item() can only be called on a tensor with a single element, but got tensor with {} elements",
                size
            )));
        }
        Ok(T::from_f64(self.storage()?.buffer()?.read(0)?))
    }

    pub(crate) fn to_f64_vec(&self) -> Result<Vec<f64>> {
        self.storage()?.buffer()?.to_vec()
    }
}

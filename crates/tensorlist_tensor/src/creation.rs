use crate::{adapter::TensorAdapter, adapter::TensorElement, Tensor, TensorMetadata, TensorStorage};
use std::sync::Arc;
use tensorlist_core::{
    buffer::BufferManager,
    device::{get_default_device, Device},
    dtype::{get_default_dtype, DType},
    error::{Error, Result},
    layout::Layout,
};

impl Tensor {
    /// Builds a tensor from host data, keeping the data's own dtype.
    pub fn new<T>(data: T) -> Result<Self>
    where
        T: TensorAdapter,
    {
        let dtype = data.dtype();
        Self::new_with_spec(data, get_default_device(), dtype)
    }

    pub fn new_with_spec<T>(data: T, device: Device, dtype: DType) -> Result<Self>
    where
        T: TensorAdapter,
    {
        let shape = data.get_shape();
        let values: Vec<f64> = data
            .to_flatten_vec()?
            .into_iter()
            .map(TensorElement::to_f64)
            .collect();
        Self::from_f64_with_spec(&values, &shape, device, dtype)
    }

    pub(crate) fn from_f64_with_spec(values: &[f64], shape: &[usize], device: Device, dtype: DType) -> Result<Self> {
        let layout = Layout::from_shape(shape);
        if layout.size() != values.len() {
            return Err(Error::InvalidArgument(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                layout.size(),
                values.len()
            )));
        }

        let mut buffer = BufferManager::create(layout.size(), device, dtype)?;
        for (i, &value) in values.iter().enumerate() {
            buffer.write(i, value)?;
        }

        Ok(Self::from_storage(
            Arc::new(TensorStorage::new(buffer)),
            TensorMetadata::new(device, dtype, layout),
        ))
    }

    pub fn zeros(shape: &[usize]) -> Result<Self> {
        Self::zeros_with_spec(shape, get_default_device(), get_default_dtype())
    }

    pub fn zeros_with_spec(shape: &[usize], device: Device, dtype: DType) -> Result<Self> {
        Self::fill_with_spec(shape, 0.0, device, dtype)
    }

    pub fn zeros_like(src: &Tensor) -> Result<Self> {
        Self::zeros_with_spec(&src.shape()?, src.device()?, src.dtype()?)
    }

    pub fn ones(shape: &[usize]) -> Result<Self> {
        Self::ones_with_spec(shape, get_default_device(), get_default_dtype())
    }

    pub fn ones_with_spec(shape: &[usize], device: Device, dtype: DType) -> Result<Self> {
        Self::fill_with_spec(shape, 1.0, device, dtype)
    }

    pub fn ones_like(src: &Tensor) -> Result<Self> {
        Self::ones_with_spec(&src.shape()?, src.device()?, src.dtype()?)
    }

    pub fn fill_with_spec(shape: &[usize], value: f64, device: Device, dtype: DType) -> Result<Self> {
        let layout = Layout::from_shape(shape);
        let mut buffer = BufferManager::create(layout.size(), device, dtype)?;
        if value != 0.0 {
            buffer.fill(value)?;
        }

        Ok(Self::from_storage(
            Arc::new(TensorStorage::new(buffer)),
            TensorMetadata::new(device, dtype, layout),
        ))
    }
}

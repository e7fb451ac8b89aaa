use crate::{
    buffer::Buffer,
    device::Device,
    dtype::DType,
    error::{Error, Result},
};

pub struct CpuBuffer {
    data: Vec<u8>,
    dtype: DType,
}

impl CpuBuffer {
    pub fn new(size: usize, dtype: DType) -> Result<Self> {
        let total_size = size
            .checked_mul(dtype.size_in_bytes())
            .ok_or_else(|| Error::InvalidArgument("Overflow in allocation".into()))?;
        Ok(Self {
            data: vec![0; total_size],
            dtype,
        })
    }

    fn byte_range(&self, index: usize) -> Result<std::ops::Range<usize>> {
        if index >= self.len() {
            return Err(Error::InvalidArgument(format!(
                "Index {} out of bounds for buffer of length {}",
                index,
                self.len()
            )));
        }
        let elem_size = self.dtype.size_in_bytes();
        Ok(index * elem_size..(index + 1) * elem_size)
    }
}

impl Buffer for CpuBuffer {
    fn len(&self) -> usize {
        self.data.len() / self.dtype.size_in_bytes()
    }

    fn dtype(&self) -> DType {
        self.dtype
    }

    fn device(&self) -> Device {
        Device::CPU
    }

    fn read(&self, index: usize) -> Result<f64> {
        let range = self.byte_range(index)?;
        Ok(self.dtype.decode(&self.data[range]))
    }

    fn write(&mut self, index: usize, value: f64) -> Result<()> {
        let range = self.byte_range(index)?;
        self.dtype.encode(value, &mut self.data[range]);
        Ok(())
    }
}

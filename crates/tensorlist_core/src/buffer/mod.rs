pub mod cpu;

use crate::{device::Device, dtype::DType, error::Result};
use cpu::CpuBuffer;

pub struct BufferManager {}

impl BufferManager {
    pub fn create(size: usize, device: Device, dtype: DType) -> Result<Box<dyn Buffer>> {
        let buffer: Box<dyn Buffer> = match device {
            Device::CPU => Box::new(CpuBuffer::new(size, dtype)?),
        };

        Ok(buffer)
    }
}

pub trait Buffer: Send + Sync {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn dtype(&self) -> DType;
    fn device(&self) -> Device;

    /// Reads the element at `index`, widened to `f64`.
    fn read(&self, index: usize) -> Result<f64>;

    /// Writes `value` at `index`, narrowed to the buffer's dtype.
    fn write(&mut self, index: usize, value: f64) -> Result<()>;

    fn fill(&mut self, value: f64) -> Result<()> {
        for i in 0..self.len() {
            self.write(i, value)?;
        }
        Ok(())
    }

    fn to_vec(&self) -> Result<Vec<f64>> {
        (0..self.len()).map(|i| self.read(i)).collect()
    }
}

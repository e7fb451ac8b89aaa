use super::check_same_spec;
use crate::{autograd::is_grad_enabled, Tensor};
use tensorlist_core::error::{Error, Result};

/// In-place ops are not recorded in the graph; they bump the storage version so that saved
/// values can detect the modification.
impl Tensor {
    pub fn add_(&self, rhs: &Tensor) -> Result<()> {
        check_same_spec(self, rhs)?;
        let rhs = rhs.to_f64_vec()?;
        self.update_in_place(|i, a| a + rhs[i])
    }

    pub fn mul_scalar_(&self, scalar: f64) -> Result<()> {
        self.update_in_place(|_, a| a * scalar)
    }

    pub fn fill_(&self, value: f64) -> Result<()> {
        self.update_in_place(|_, _| value)
    }

    fn update_in_place(&self, f: impl Fn(usize, f64) -> f64) -> Result<()> {
        if is_grad_enabled() && self.is_leaf() && self.requires_grad() {
            return Err(Error::LeafModifiedInPlace);
        }

        let storage = self.storage()?;
        {
            let mut buffer = storage.buffer_mut()?;
            for i in 0..buffer.len() {
                let value = buffer.read(i)?;
                buffer.write(i, f(i, value))?;
            }
        }
        storage.bump_version();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::no_grad_mode;

    #[test]
    fn in_place_bumps_version_and_is_shared_by_aliases() -> Result<()> {
        let x = Tensor::new(vec![1.0f32, 2.0])?;
        let alias = x.alias()?;
        assert_eq!(x.version()?, 0);

        x.mul_scalar_(2.0)?;
        assert_eq!(x.version()?, 1);
        assert_eq!(alias.version()?, 1);
        assert_eq!(alias.to_flatten_vec::<f32>()?, vec![2.0, 4.0]);
        Ok(())
    }

    #[test]
    fn leaf_requiring_grad_rejected_under_grad_mode() -> Result<()> {
        let x = Tensor::new(vec![1.0f32])?;
        x.set_requires_grad(true)?;
        assert_eq!(x.fill_(0.0), Err(Error::LeafModifiedInPlace));

        let _guard = no_grad_mode();
        x.fill_(0.0)?;
        assert_eq!(x.to_flatten_vec::<f32>()?, vec![0.0]);
        Ok(())
    }
}

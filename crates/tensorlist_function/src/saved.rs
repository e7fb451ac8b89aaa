use std::sync::Arc;
use tensorlist_core::error::{Error, Result};
use tensorlist_tensor::{autograd::Node, Tensor, TensorId};

/// A value captured during forward for use in backward.
///
/// Outputs of the owning node are stored without their producer link, otherwise the node would
/// keep itself alive through its own context. The link is restored on [`unpack`](Self::unpack).
#[derive(Clone, Default)]
pub struct SavedValue {
    inner: Option<SavedData>,
}

#[derive(Clone)]
struct SavedData {
    data: Tensor,
    is_output: bool,
    output_nr: usize,
    saved_version: u64,
    requires_grad: bool,
    token: TensorId,
}

impl SavedValue {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(value: &Tensor, is_output: bool) -> Result<Self> {
        let Some(token) = value.id() else {
            return Ok(Self::empty());
        };

        let data = if is_output { value.detach()? } else { value.clone() };
        Ok(Self {
            inner: Some(SavedData {
                data,
                is_output,
                output_nr: value.output_nr(),
                saved_version: value.version()?,
                requires_grad: value.requires_grad(),
                token,
            }),
        })
    }

    pub fn is_defined(&self) -> bool {
        self.inner.is_some()
    }

    pub fn is_output(&self) -> bool {
        self.inner.as_ref().is_some_and(|d| d.is_output)
    }

    /// Ownership token of the value at save time.
    pub fn token(&self) -> Option<TensorId> {
        self.inner.as_ref().map(|d| d.token)
    }

    /// Rebuilds the saved value. `node` is the node that saved it; outputs of that node get their
    /// producer link back.
    pub fn unpack(&self, node: &Arc<dyn Node>) -> Result<Tensor> {
        let Some(saved) = &self.inner else {
            return Ok(Tensor::undefined());
        };

        let current_version = saved.data.version()?;
        if current_version != saved.saved_version {
            return Err(Error::SavedValueModified {
                node: node.name(),
                output_nr: saved.output_nr,
                saved_version: saved.saved_version,
                current_version,
            });
        }

        if !saved.is_output {
            return Ok(saved.data.clone());
        }

        let value = saved.data.alias()?;
        if saved.requires_grad {
            value.set_gradient_edge(node.clone(), saved.output_nr)?;
        }
        Ok(value)
    }
}

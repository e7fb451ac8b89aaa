use crate::{node::TensorListNode, saved::SavedValue};
use std::{
    collections::HashSet,
    sync::{Arc, Weak},
};
use tensorlist_core::error::{Error, Result};
use tensorlist_tensor::{
    autograd::{Node, NodeId},
    Tensor, TensorId,
};

/// State shared by the forward and backward closures of one [`TensorListFunction`] call.
///
/// [`TensorListFunction`]: crate::TensorListFunction
pub struct AutogradContext {
    to_save: Vec<Tensor>,
    saved_variables: Vec<SavedValue>,
    dirty: HashSet<TensorId>,
    non_differentiable: HashSet<TensorId>,
    has_freed_buffers: bool,
    materialize_grads: bool,
    needs_input_grad: Vec<bool>,
    grad_fn: Weak<TensorListNode>,
}

impl Default for AutogradContext {
    fn default() -> Self {
        Self {
            to_save: Vec::new(),
            saved_variables: Vec::new(),
            dirty: HashSet::new(),
            non_differentiable: HashSet::new(),
            has_freed_buffers: false,
            materialize_grads: true,
            needs_input_grad: Vec::new(),
            grad_fn: Weak::new(),
        }
    }
}

impl AutogradContext {
    pub(crate) fn new(grad_fn: Weak<TensorListNode>, needs_input_grad: Vec<bool>) -> Self {
        Self {
            grad_fn,
            needs_input_grad,
            ..Self::default()
        }
    }

    /// Values to hand to backward through [`get_saved_variables`](Self::get_saved_variables).
    ///
    /// Replaces anything saved before in the same forward call. Undefined entries are kept as
    /// undefined slots.
    pub fn save_for_backward(&mut self, values: Vec<Tensor>) {
        self.to_save = values;
    }

    /// Turns the pending values into [`SavedValue`]s. Values produced by `node` are saved as
    /// outputs.
    pub(crate) fn finalize(&mut self, node: NodeId) -> Result<()> {
        let to_save = std::mem::take(&mut self.to_save);
        self.saved_variables = to_save
            .iter()
            .map(|value| {
                let is_output = value.grad_fn().is_some_and(|f| f.id() == node);
                SavedValue::new(value, is_output)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    /// Drops pending values of a call that did not record a node.
    pub(crate) fn discard_pending(&mut self) {
        self.to_save.clear();
    }

    pub fn get_saved_variables(&self) -> Result<Vec<Tensor>> {
        if self.has_freed_buffers {
            return Err(Error::UseAfterRelease);
        }

        let node: Arc<dyn Node> = self.grad_fn.upgrade().ok_or(Error::NodeDisposed)?;
        self.saved_variables.iter().map(|saved| saved.unpack(&node)).collect()
    }

    /// Declares the given inputs as modified in place by forward.
    pub fn mark_dirty(&mut self, values: &[Tensor]) {
        self.dirty = values.iter().filter_map(Tensor::id).collect();
    }

    /// Declares the given outputs as not differentiable.
    pub fn mark_non_differentiable(&mut self, values: &[Tensor]) {
        self.non_differentiable = values.iter().filter_map(Tensor::id).collect();
    }

    pub fn get_dirty(&self) -> &HashSet<TensorId> {
        &self.dirty
    }

    pub fn get_non_differentiable(&self) -> &HashSet<TensorId> {
        &self.non_differentiable
    }

    /// With `false`, gradients that did not flow reach backward as undefined tensors instead of
    /// zeros.
    pub fn set_materialize_grads(&mut self, materialize: bool) {
        self.materialize_grads = materialize;
    }

    pub fn materialize_grads(&self) -> bool {
        self.materialize_grads
    }

    /// Whether input `index` of the forward call requires a gradient.
    pub fn needs_input_grad(&self, index: usize) -> bool {
        self.needs_input_grad.get(index).copied().unwrap_or(false)
    }

    pub fn has_freed_buffers(&self) -> bool {
        self.has_freed_buffers
    }

    pub(crate) fn release(&mut self) {
        self.saved_variables.clear();
        self.has_freed_buffers = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_calls_replace_previous_sets() -> Result<()> {
        let a = Tensor::new(vec![1.0f32])?;
        let b = Tensor::new(vec![2.0f32])?;
        let mut ctx = AutogradContext::default();

        ctx.mark_dirty(&[a.clone(), b.clone()]);
        ctx.mark_dirty(&[b.clone()]);
        assert_eq!(ctx.get_dirty().len(), 1);
        assert!(ctx.get_dirty().contains(&b.id().unwrap()));

        ctx.mark_non_differentiable(&[a.clone(), Tensor::undefined()]);
        assert_eq!(ctx.get_non_differentiable().len(), 1);
        assert!(ctx.get_non_differentiable().contains(&a.id().unwrap()));
        Ok(())
    }

    #[test]
    fn clones_share_the_token() -> Result<()> {
        let a = Tensor::new(vec![1.0f32])?;
        let mut ctx = AutogradContext::default();
        ctx.mark_dirty(&[a.clone()]);
        assert!(ctx.get_dirty().contains(&a.id().unwrap()));
        assert!(!ctx.get_dirty().contains(&a.alias()?.id().unwrap()));
        Ok(())
    }

    #[test]
    fn detached_context_reports_disposed_node() -> Result<()> {
        let ctx = AutogradContext::default();
        assert_eq!(ctx.get_saved_variables().err(), Some(Error::NodeDisposed));
        Ok(())
    }

    #[test]
    fn release_is_checked_first() {
        let mut ctx = AutogradContext::default();
        ctx.release();
        assert!(ctx.has_freed_buffers());
        assert_eq!(ctx.get_saved_variables().err(), Some(Error::UseAfterRelease));
    }

    #[test]
    fn needs_input_grad_out_of_range_is_false() {
        let ctx = AutogradContext::new(Weak::new(), vec![true, false]);
        assert!(ctx.needs_input_grad(0));
        assert!(!ctx.needs_input_grad(1));
        assert!(!ctx.needs_input_grad(2));
        assert!(ctx.materialize_grads());
    }
}

use crate::{context::AutogradContext, info::VariableInfo};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tensorlist_core::error::{Error, Result};
use tensorlist_tensor::{
    autograd::{next_node_id, Edge, Node, NodeId},
    Tensor,
};

/// Backward closure of a [`TensorListNode`]: one gradient per forward output in, one gradient
/// per forward input out.
pub type ListBackwardFn = Arc<dyn Fn(&mut AutogradContext, Vec<Tensor>) -> Result<Vec<Tensor>> + Send + Sync>;

/// Graph node created by [`TensorListFunction`](crate::TensorListFunction).
pub struct TensorListNode {
    nid: NodeId,
    name: String,
    ctx: Mutex<AutogradContext>,
    backward_fn: ListBackwardFn,
    is_variable_input: Vec<bool>,
    input_info: Vec<VariableInfo>,
    output_info: OnceLock<Vec<VariableInfo>>,
    next_edges: Vec<Option<Edge>>,
}

impl TensorListNode {
    pub(crate) fn new(
        name: String,
        inputs: &[Tensor],
        next_edges: Vec<Option<Edge>>,
        backward_fn: ListBackwardFn,
    ) -> Result<Arc<Self>> {
        let input_info = inputs.iter().map(VariableInfo::new).collect::<Result<Vec<_>>>()?;
        let is_variable_input = inputs.iter().map(Tensor::is_defined).collect();
        let needs_input_grad = inputs.iter().map(Tensor::requires_grad).collect();

        Ok(Arc::new_cyclic(|weak| Self {
            nid: next_node_id(),
            name,
            ctx: Mutex::new(AutogradContext::new(weak.clone(), needs_input_grad)),
            backward_fn,
            is_variable_input,
            input_info,
            output_info: OnceLock::new(),
            next_edges,
        }))
    }

    pub(crate) fn ctx(&self) -> Result<MutexGuard<'_, AutogradContext>> {
        self.ctx.lock().map_err(|_| Error::Lock)
    }

    pub(crate) fn set_output_info(&self, info: Vec<VariableInfo>) -> Result<()> {
        self.output_info
            .set(info)
            .map_err(|_| Error::InvalidState(format!("output records of {} are already set", self.name)))
    }

    pub fn input_info(&self) -> &[VariableInfo] {
        &self.input_info
    }

    pub fn output_info(&self) -> &[VariableInfo] {
        self.output_info.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_variable_input(&self) -> &[bool] {
        &self.is_variable_input
    }

    /// Whether saved buffers were released.
    pub fn is_released(&self) -> Result<bool> {
        Ok(self.ctx()?.has_freed_buffers())
    }

    /// Runs the user backward closure for one set of output gradients.
    ///
    /// Undefined entries of `grad_outputs` are replaced by zeros unless the context turned
    /// materialization off. The closure may return either one gradient per input or one per
    /// defined input; trailing undefined gradients beyond the input count are dropped. The result
    /// always holds one entry per input, undefined where no gradient flows.
    pub fn run_backward(&self, grad_outputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        let output_info = self.output_info();
        if grad_outputs.len() != output_info.len() {
            return Err(Error::InvalidArgument(format!(
                "{} expects {} output gradients, got {}",
                self.name,
                output_info.len(),
                grad_outputs.len()
            )));
        }

        let mut ctx = self.ctx()?;
        let grad_outputs = if ctx.materialize_grads() {
            grad_outputs
                .into_iter()
                .zip(output_info)
                .enumerate()
                .map(|(i, (grad, info))| {
                    if grad.is_defined() {
                        Ok(grad)
                    } else {
                        log::trace!("{}: zero-filling gradient of output {}", self.name, i);
                        info.zeros()
                    }
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            grad_outputs
        };

        log::debug!("running {} ({:?})", self.name, self.nid);
        let raw = (self.backward_fn)(&mut *ctx, grad_outputs)?;
        drop(ctx);

        self.reconcile(raw)
    }

    fn reconcile(&self, mut raw: Vec<Tensor>) -> Result<Vec<Tensor>> {
        let num_inputs = self.is_variable_input.len();
        let num_variables = self.is_variable_input.iter().filter(|v| **v).count();

        if raw.len() > num_inputs && raw[num_inputs..].iter().all(|g| !g.is_defined()) {
            log::trace!("{}: dropping {} trailing undefined gradients", self.name, raw.len() - num_inputs);
            raw.truncate(num_inputs);
        }

        let positional = if raw.len() == num_inputs {
            true
        } else if raw.len() == num_variables {
            false
        } else {
            return Err(Error::GradientArityMismatch {
                node: self.name.clone(),
                expected: num_inputs,
                got: raw.len(),
            });
        };

        let mut raw = raw.into_iter();
        let mut results = Vec::with_capacity(num_inputs);
        for (i, is_variable) in self.is_variable_input.iter().enumerate() {
            if !is_variable {
                if positional && raw.next().is_some_and(|g| g.is_defined()) {
                    return Err(Error::SpuriousGradient {
                        node: self.name.clone(),
                        position: i + 1,
                    });
                }
                results.push(Tensor::undefined());
                continue;
            }

            let grad = raw.next().unwrap_or_default();
            let info = &self.input_info[i];
            if grad.is_defined() {
                results.push(grad);
            } else if info.requires_grad {
                results.push(info.zeros()?);
            } else {
                results.push(Tensor::undefined());
            }
        }
        Ok(results)
    }
}

impl Node for TensorListNode {
    fn id(&self) -> NodeId {
        self.nid
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn num_inputs(&self) -> usize {
        self.output_info().len()
    }

    fn next_edges(&self) -> &[Option<Edge>] {
        &self.next_edges
    }

    fn apply(&self, grads: Vec<Tensor>) -> Result<Vec<Tensor>> {
        self.run_backward(grads)
    }

    fn release_variables(&self) {
        match self.ctx.lock() {
            Ok(mut ctx) => {
                log::trace!("{}: releasing saved variables", self.name);
                ctx.release();
            }
            Err(_) => log::warn!("{}: context lock poisoned, saved variables not released", self.name),
        }
    }
}

impl std::fmt::Debug for TensorListNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorListNode")
            .field("id", &self.nid)
            .field("name", &self.name)
            .field("inputs", &self.input_info.len())
            .field("outputs", &self.output_info().len())
            .finish()
    }
}

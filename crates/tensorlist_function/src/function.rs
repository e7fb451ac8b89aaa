use crate::{context::AutogradContext, info::VariableInfo, node::TensorListNode};
use std::{collections::HashSet, sync::Arc};
use tensorlist_core::error::{Error, Result};
use tensorlist_tensor::{
    autograd::{collect_next_edges, no_grad_mode, should_record, Node},
    Tensor,
};

const DEFAULT_NAME: &str = "TensorListNode";

/// Entry point for user-defined list-valued operations.
///
/// ```rust
/// use tensorlist_core::error::Result;
/// use tensorlist_function::{AutogradContext, TensorListFunction};
/// use tensorlist_tensor::Tensor;
///
/// # fn main() -> Result<()> {
/// let x = Tensor::new(vec![1.0f32, 2.0])?;
/// x.set_requires_grad(true)?;
///
/// let outputs = TensorListFunction::named("Double").apply(
///     vec![x.clone()],
///     |_ctx: &mut AutogradContext, inputs: Vec<Tensor>| -> Result<Vec<Tensor>> {
///         Ok(vec![inputs[0].mul_scalar(2.0)?])
///     },
///     |_ctx: &mut AutogradContext, grads: Vec<Tensor>| -> Result<Vec<Tensor>> {
///         Ok(vec![grads[0].mul_scalar(2.0)?])
///     },
/// )?;
///
/// outputs[0].sum()?.backward()?;
/// assert_eq!(x.grad().unwrap().to_flatten_vec::<f32>()?, vec![2.0, 2.0]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TensorListFunction {
    name: String,
}

impl Default for TensorListFunction {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
        }
    }
}

impl TensorListFunction {
    /// A function whose graph nodes report `name` in logs and errors.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `forward` on `inputs` and records a node whose backward is `backward`.
    pub fn invoke<F, B>(inputs: Vec<Tensor>, forward: F, backward: B) -> Result<Vec<Tensor>>
    where
        F: FnOnce(&mut AutogradContext, Vec<Tensor>) -> Result<Vec<Tensor>>,
        B: Fn(&mut AutogradContext, Vec<Tensor>) -> Result<Vec<Tensor>> + Send + Sync + 'static,
    {
        Self::default().apply(inputs, forward, backward)
    }

    /// Same as [`invoke`](Self::invoke), with this function's node name.
    ///
    /// A node is only wired into the graph when grad mode is on and some input requires grad.
    /// `forward` always runs with grad mode off. Its outputs come back in the same order; each one
    /// that stays differentiable has the new node as its producer.
    pub fn apply<F, B>(&self, inputs: Vec<Tensor>, forward: F, backward: B) -> Result<Vec<Tensor>>
    where
        F: FnOnce(&mut AutogradContext, Vec<Tensor>) -> Result<Vec<Tensor>>,
        B: Fn(&mut AutogradContext, Vec<Tensor>) -> Result<Vec<Tensor>> + Send + Sync + 'static,
    {
        let is_executable = should_record(&inputs);
        let next_edges = collect_next_edges(&inputs)?;
        let node = TensorListNode::new(self.name.clone(), &inputs, next_edges, Arc::new(backward))?;
        log::debug!(
            "created {} ({:?}) with {} inputs, executable: {}",
            self.name,
            node.id(),
            inputs.len(),
            is_executable
        );

        let mut ctx = node.ctx()?;
        let raw_outputs = {
            let _grad_guard = no_grad_mode();
            forward(&mut *ctx, inputs.clone())?
        };

        let mut wrapped_ids = HashSet::new();
        let outputs = raw_outputs
            .into_iter()
            .enumerate()
            .map(|(i, output)| {
                // a handle returned twice gets its own alias per slot
                let is_repeat = output.id().is_some_and(|id| !wrapped_ids.insert(id));
                wrap_output(&node, &ctx, &inputs, output, i, is_executable, is_repeat)
            })
            .collect::<Result<Vec<_>>>()?;

        if !ctx.get_dirty().is_subset(&wrapped_ids) {
            return Err(Error::InvalidArgument(format!(
                "{}: some values marked dirty during forward were not returned as outputs",
                self.name
            )));
        }

        if is_executable {
            node.set_output_info(outputs.iter().map(VariableInfo::new).collect::<Result<Vec<_>>>()?)?;
            ctx.finalize(node.id())?;
        } else {
            ctx.discard_pending();
        }

        Ok(outputs)
    }
}

fn wrap_output(
    node: &Arc<TensorListNode>,
    ctx: &AutogradContext,
    inputs: &[Tensor],
    output: Tensor,
    output_nr: usize,
    is_executable: bool,
    is_repeat: bool,
) -> Result<Tensor> {
    let Some(id) = output.id() else {
        return Ok(output);
    };

    let is_input = inputs.iter().any(|input| input.id() == Some(id));
    let is_differentiable = is_executable && !ctx.get_non_differentiable().contains(&id);

    if !is_differentiable {
        if !output.requires_grad() {
            return Ok(output);
        }
        return output.detach();
    }

    let grad_fn: Arc<dyn Node> = node.clone();
    if is_repeat {
        let alias = output.alias()?;
        alias.set_gradient_edge(grad_fn, output_nr)?;
        return Ok(alias);
    }

    if ctx.get_dirty().contains(&id) {
        if !is_input {
            log::warn!(
                "{}: output {} was marked dirty but is not an input of the function",
                node.name(),
                output_nr
            );
        }
        output.rebase_history(grad_fn, output_nr)?;
        return Ok(output);
    }

    if is_input {
        let alias = output.alias()?;
        alias.set_gradient_edge(grad_fn, output_nr)?;
        return Ok(alias);
    }

    output.set_gradient_edge(grad_fn, output_nr)?;
    Ok(output)
}

use super::Edge;
use crate::Tensor;
use tensorlist_core::error::{Error, Result};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);
static NODE_COUNTER: AtomicUsize = AtomicUsize::new(1);
#[inline]
pub fn next_node_id() -> NodeId {
    NodeId(NODE_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// A node of the backward graph.
///
/// The engine calls [`apply`](Node::apply) with one gradient per slot (`num_inputs`, one per
/// forward output of the operation) and receives one gradient per entry of
/// [`next_edges`](Node::next_edges). Undefined tensors stand for "no gradient".
///
/// The engine never runs `apply` on the same node from two threads at once, but distinct
/// nodes may run concurrently.
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    fn name(&self) -> String;

    /// Number of gradient slots this node receives.
    fn num_inputs(&self) -> usize;

    fn next_edges(&self) -> &[Option<Edge>];

    fn apply(&self, grads: Vec<Tensor>) -> Result<Vec<Tensor>>;

    /// Frees buffers saved for backward. Further `apply` calls that need them must fail.
    fn release_variables(&self) {}
}

pub type BackwardFn = Box<dyn Fn(&[Tensor], &Tensor) -> Result<Vec<Tensor>> + Send + Sync>;

/// Backward node of a built-in single-output operation.
pub struct OpNode {
    nid: NodeId,
    op_name: &'static str,
    inputs: Mutex<Option<Vec<Tensor>>>,
    next_edges: Vec<Option<Edge>>,
    backward_fn: BackwardFn,
}

impl OpNode {
    pub fn new(op_name: &'static str, inputs: Vec<Tensor>, backward_fn: BackwardFn) -> Result<Self> {
        let next_edges = super::collect_next_edges(&inputs)?;
        Ok(Self {
            nid: next_node_id(),
            op_name,
            inputs: Mutex::new(Some(inputs)),
            next_edges,
            backward_fn,
        })
    }

    pub fn op_name(&self) -> &str {
        self.op_name
    }
}

impl Node for OpNode {
    fn id(&self) -> NodeId {
        self.nid
    }

    fn name(&self) -> String {
        format!("{}Backward", self.op_name)
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn next_edges(&self) -> &[Option<Edge>] {
        &self.next_edges
    }

    fn apply(&self, grads: Vec<Tensor>) -> Result<Vec<Tensor>> {
        let guard = self.inputs.lock().map_err(|_| Error::Lock)?;
        let inputs = guard.as_ref().ok_or(Error::UseAfterRelease)?;

        let grad_output = grads.into_iter().next().unwrap_or_default();
        if !grad_output.is_defined() {
            return Ok(vec![Tensor::undefined(); inputs.len()]);
        }

        let grads_for_inputs = (self.backward_fn)(inputs, &grad_output)?;
        if grads_for_inputs.len() != inputs.len() {
            return Err(Error::GradientArityMismatch {
                node: self.name(),
                expected: inputs.len(),
                got: grads_for_inputs.len(),
            });
        }
        Ok(grads_for_inputs)
    }

    fn release_variables(&self) {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.take();
        }
    }
}

mod accumulate;
mod edge;
mod engine;
mod node;

pub use accumulate::AccumulateGrad;
pub use edge::{collect_next_edges, Edge};
pub use engine::backward;
pub use node::{next_node_id, BackwardFn, Node, NodeId, OpNode};

use crate::Tensor;
use std::cell::Cell;

// ────────────────────────────────────────────────────────────────────────────
//  Gradient Context
// ────────────────────────────────────────────────────────────────────────────

thread_local! {
    static GRADIENT_ENABLED: Cell<bool> = const { Cell::new(true) };
}

pub fn is_grad_enabled() -> bool {
    GRADIENT_ENABLED.with(|g| g.get())
}

pub fn set_grad_enabled(enabled: bool) {
    GRADIENT_ENABLED.with(|g| g.set(enabled))
}

/// Restores the previous grad mode of the current thread when dropped.
pub struct TensorGradientGuard {
    prev_enabled: bool,
}

impl TensorGradientGuard {
    pub fn new(enabled: bool) -> Self {
        let prev_enabled = is_grad_enabled();
        set_grad_enabled(enabled);
        Self { prev_enabled }
    }
}

impl Drop for TensorGradientGuard {
    fn drop(&mut self) {
        set_grad_enabled(self.prev_enabled);
    }
}

pub fn no_grad_mode() -> TensorGradientGuard {
    TensorGradientGuard::new(false)
}

pub fn grad_mode() -> TensorGradientGuard {
    TensorGradientGuard::new(true)
}

/// Disables gradient recording in the current lexical scope.
/// When the scope ends, the previous gradient state is automatically restored.
///
/// ### Example
/// ```rust
/// tensorlist_tensor::no_grad!();
/// assert!(!tensorlist_tensor::autograd::is_grad_enabled());
/// ```
#[macro_export]
macro_rules! no_grad {
    () => {
        let _grad_guard = $crate::autograd::no_grad_mode();
    };
}

/// Enables gradient recording in the current lexical scope.
/// When the scope ends, the previous gradient state is automatically restored.
#[macro_export]
macro_rules! with_grad {
    () => {
        let _grad_guard = $crate::autograd::grad_mode();
    };
}

/// Whether an operation over `inputs` should be recorded in the graph.
pub fn any_requires_grad(inputs: &[Tensor]) -> bool {
    inputs.iter().any(Tensor::requires_grad)
}

/// Whether an operation over `inputs` should be recorded in the graph under the current grad mode.
pub fn should_record(inputs: &[Tensor]) -> bool {
    is_grad_enabled() && any_requires_grad(inputs)
}

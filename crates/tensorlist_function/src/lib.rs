//! Custom list-valued autograd functions.
//!
//! [`TensorListFunction`] registers a user forward/backward pair as a single node of the backward
//! graph. The forward closure runs with gradient recording disabled and receives an
//! [`AutogradContext`] through which it saves values and marks outputs; the backward closure
//! receives the same context and one gradient per forward output.

mod context;
mod function;
mod info;
mod node;
mod saved;

pub use context::AutogradContext;
pub use function::TensorListFunction;
pub use info::VariableInfo;
pub use node::{ListBackwardFn, TensorListNode};
pub use saved::SavedValue;

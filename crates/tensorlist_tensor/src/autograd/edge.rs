use super::Node;
use crate::Tensor;
use tensorlist_core::error::Result;
use std::{fmt, sync::Arc};

/// Points at input slot `input_nr` of `function`: the gradient produced for a tensor is fed to
/// that slot during backward.
#[derive(Clone)]
pub struct Edge {
    pub function: Arc<dyn Node>,
    pub input_nr: usize,
}

impl Edge {
    pub fn new(function: Arc<dyn Node>, input_nr: usize) -> Self {
        Self { function, input_nr }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("function", &self.function.name())
            .field("id", &self.function.id())
            .field("input_nr", &self.input_nr)
            .finish()
    }
}

/// One entry per input: the producer edge of that input, or `None` when no gradient flows to it.
pub fn collect_next_edges(inputs: &[Tensor]) -> Result<Vec<Option<Edge>>> {
    inputs
        .iter()
        .map(|input| {
            if input.is_defined() {
                input.gradient_edge()
            } else {
                Ok(None)
            }
        })
        .collect()
}

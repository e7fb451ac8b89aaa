use super::{next_node_id, Edge, Node, NodeId};
use crate::Tensor;
use tensorlist_core::error::Result;

/// Sink node of a leaf tensor: sums every gradient it receives into the leaf's `.grad()`.
pub struct AccumulateGrad {
    nid: NodeId,
    variable: Tensor,
}

impl AccumulateGrad {
    pub fn new(variable: Tensor) -> Self {
        Self {
            nid: next_node_id(),
            variable,
        }
    }

    pub fn variable(&self) -> &Tensor {
        &self.variable
    }
}

impl Node for AccumulateGrad {
    fn id(&self) -> NodeId {
        self.nid
    }

    fn name(&self) -> String {
        "AccumulateGrad".to_string()
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn next_edges(&self) -> &[Option<Edge>] {
        &[]
    }

    fn apply(&self, grads: Vec<Tensor>) -> Result<Vec<Tensor>> {
        let Some(grad) = grads.into_iter().next().filter(Tensor::is_defined) else {
            return Ok(vec![]);
        };

        self.variable.accumulate_grad(&grad)?;

        Ok(vec![])
    }
}

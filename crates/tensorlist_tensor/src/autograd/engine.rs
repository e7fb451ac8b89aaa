use super::{no_grad_mode, Node, NodeId};
use crate::Tensor;
use dashmap::DashMap;
use rayon::prelude::*;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tensorlist_core::error::{Error, Result};

/// Runs the backward pass from `roots`.
///
/// `grad_roots` holds one gradient per root; an undefined entry is replaced by ones, which is only
/// allowed for single-element roots. Nodes whose dependencies are satisfied run concurrently.
/// Unless `retain_graph` is set, every executed node releases its saved buffers afterwards, so a
/// second pass over the same graph fails.
pub fn backward(roots: &[Tensor], grad_roots: &[Tensor], retain_graph: bool) -> Result<()> {
    if roots.len() != grad_roots.len() {
        return Err(Error::InvalidArgument(format!(
            "got {} roots but {} root gradients",
            roots.len(),
            grad_roots.len()
        )));
    }

    let _grad_guard = no_grad_mode();

    let buffers: DashMap<NodeId, Vec<Tensor>> = DashMap::new();
    let mut root_nodes = Vec::with_capacity(roots.len());

    for (i, (root, grad)) in roots.iter().zip(grad_roots).enumerate() {
        let edge = root.gradient_edge()?.ok_or_else(|| {
            Error::InvalidArgument(format!(
                "element {} of tensors does not require grad and does not have a grad_fn",
                i
            ))
        })?;

        let grad = if grad.is_defined() {
            if grad.shape()? != root.shape()? {
                return Err(Error::ShapeMismatch {
                    expected: root.shape()?,
                    got: grad.shape()?,
                });
            }
            grad.clone()
        } else if root.size()? == 1 {
            Tensor::ones_like(root)?
        } else {
            return Err(Error::InvalidArgument(
                "grad can be implicitly created only for scalar outputs".into(),
            ));
        };

        accumulate(&buffers, edge.function.as_ref(), edge.input_nr, grad)?;
        root_nodes.push(edge.function);
    }

    let (nodes, mut dependencies) = compute_dependencies(&root_nodes);

    let mut seen = HashSet::new();
    let mut ready: Vec<Arc<dyn Node>> = root_nodes
        .into_iter()
        .filter(|node| dependencies.get(&node.id()).copied().unwrap_or(0) == 0)
        .filter(|node| seen.insert(node.id()))
        .collect();

    while !ready.is_empty() {
        let executed = ready
            .par_iter()
            .map(|node| {
                let _grad_guard = no_grad_mode();
                let inputs = buffers
                    .remove(&node.id())
                    .map(|(_, grads)| grads)
                    .unwrap_or_else(|| vec![Tensor::undefined(); node.num_inputs()]);

                log::debug!("engine: running {} ({:?})", node.name(), node.id());
                let outputs = node.apply(inputs)?;
                if !retain_graph {
                    node.release_variables();
                }
                Ok((node.clone(), outputs))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut next_ready = Vec::new();
        for (node, outputs) in executed {
            let edges = node.next_edges();
            if outputs.len() != edges.len() {
                return Err(Error::GradientArityMismatch {
                    node: node.name(),
                    expected: edges.len(),
                    got: outputs.len(),
                });
            }

            for (edge, grad) in edges.iter().zip(outputs) {
                let Some(edge) = edge else { continue };
                let next_id = edge.function.id();

                if grad.is_defined() {
                    accumulate(&buffers, edge.function.as_ref(), edge.input_nr, grad)?;
                }

                if let Some(count) = dependencies.get_mut(&next_id) {
                    *count -= 1;
                    if *count == 0 {
                        if let Some(next) = nodes.get(&next_id) {
                            next_ready.push(next.clone());
                        }
                    }
                }
            }
        }
        ready = next_ready;
    }

    Ok(())
}

/// Every node reachable from `roots`, and how many edges point at each of them.
fn compute_dependencies(roots: &[Arc<dyn Node>]) -> (HashMap<NodeId, Arc<dyn Node>>, HashMap<NodeId, usize>) {
    let mut nodes: HashMap<NodeId, Arc<dyn Node>> = HashMap::new();
    let mut dependencies: HashMap<NodeId, usize> = HashMap::new();
    let mut stack: Vec<Arc<dyn Node>> = Vec::new();

    for root in roots {
        if nodes.insert(root.id(), root.clone()).is_none() {
            stack.push(root.clone());
        }
    }

    while let Some(node) = stack.pop() {
        for edge in node.next_edges().iter().flatten() {
            let next_id = edge.function.id();
            *dependencies.entry(next_id).or_insert(0) += 1;
            if !nodes.contains_key(&next_id) {
                nodes.insert(next_id, edge.function.clone());
                stack.push(edge.function.clone());
            }
        }
    }

    (nodes, dependencies)
}

fn accumulate(buffers: &DashMap<NodeId, Vec<Tensor>>, node: &dyn Node, slot: usize, grad: Tensor) -> Result<()> {
    let mut entry = buffers
        .entry(node.id())
        .or_insert_with(|| vec![Tensor::undefined(); node.num_inputs()]);

    let slots = entry.value_mut();
    if slot >= slots.len() {
        return Err(Error::Internal {
            message: format!(
                "gradient slot {} out of range for {} with {} inputs",
                slot,
                node.name(),
                slots.len()
            ),
        });
    }

    slots[slot] = if slots[slot].is_defined() {
        slots[slot].add(&grad)?
    } else {
        grad
    };
    Ok(())
}

use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    Active,
    Done,
}

impl<T: GraphFloat> Graph<T> {
    /// Every node reachable from `root`, each operand listed before any node
    /// reading it and every node listed once. `root` comes last.
    pub fn topological_order(&self, root: NodeId) -> Result<Vec<NodeId>, GradGraphError> {
        let order = self.topo_indices(root)?;
        Ok(order.into_iter().map(|i| self.handle(i)).collect())
    }

    /// Groups the nodes reachable from `root` into dependency layers.
    ///
    /// Leaves sit in layer 0; any other node sits one layer above its deepest
    /// operand. Nodes of one layer never depend on each other.
    pub fn layers(&self, root: NodeId) -> Result<Vec<Vec<NodeId>>, GradGraphError> {
        let order = self.topo_indices(root)?;
        Ok(self
            .layer_indices(&order)
            .into_iter()
            .map(|layer| layer.into_iter().map(|i| self.handle(i)).collect())
            .collect())
    }

    /// Iterative depth-first post-order over operand edges.
    pub(crate) fn topo_indices(&self, root: NodeId) -> Result<Vec<usize>, GradGraphError> {
        let root = self.resolve(root)?;
        let mut marks = vec![Mark::Unseen; self.meta.len()];
        let mut order = Vec::new();
        // (node, next operand to visit)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        marks[root] = Mark::Active;

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let operands = self.meta[node].op.operands.as_slice();
            if next < operands.len() {
                frame.1 += 1;
                let child = operands[next].index();
                match marks[child] {
                    Mark::Unseen => {
                        marks[child] = Mark::Active;
                        stack.push((child, 0));
                    }
                    Mark::Active => return Err(GradGraphError::CycleDetected),
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                order.push(node);
                stack.pop();
            }
        }

        trace!("Topological order from n{}: {} nodes", root, order.len());
        Ok(order)
    }

    pub(crate) fn layer_indices(&self, order: &[usize]) -> Vec<Vec<usize>> {
        let mut depth = vec![0usize; self.meta.len()];
        let mut layers: Vec<Vec<usize>> = Vec::new();
        for &node in order {
            let d = self.meta[node]
                .op
                .operands
                .as_slice()
                .iter()
                .map(|operand| depth[operand.index()] + 1)
                .max()
                .unwrap_or(0);
            depth[node] = d;
            if layers.len() <= d {
                layers.resize_with(d + 1, Vec::new);
            }
            layers[d].push(node);
        }
        layers
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;
    use crate::GradGraphError;

    #[test]
    fn test_order_lists_operands_first_and_once() {
        let mut g: Graph<f64> = Graph::new();
        let a = g.leaf(2.0);
        let b = g.leaf(6.0);
        let s = g.add(a, b).unwrap();
        let f = g.mul(s, b).unwrap();

        let order = g.topological_order(f).unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(*order.last().unwrap(), f);

        let pos = |id| order.iter().position(|&n| n == id).unwrap();
        for &node in &order {
            for &operand in g.operands(node).unwrap() {
                assert!(pos(operand) < pos(node));
            }
        }
    }

    #[test]
    fn test_order_skips_unreachable_nodes() {
        let mut g: Graph<f64> = Graph::new();
        let a = g.leaf(1.0);
        let b = g.leaf(2.0);
        let _unrelated = g.exp(b).unwrap();
        let f = g.sin(a).unwrap();
        assert_eq!(g.topological_order(f).unwrap(), vec![a, f]);
    }

    #[test]
    fn test_layers_group_independent_nodes() {
        let mut g: Graph<f64> = Graph::new();
        let a = g.leaf(1.0);
        let b = g.leaf(2.0);
        let ea = g.exp(a).unwrap();
        let eb = g.exp(b).unwrap();
        let f = g.add(ea, eb).unwrap();
        let h = g.add(f, a).unwrap();

        let layers = g.layers(h).unwrap();
        assert_eq!(layers.len(), 4);
        assert_eq!(layers[0].len(), 2);
        assert_eq!(layers[1].len(), 2);
        assert_eq!(layers[2], vec![f]);
        assert_eq!(layers[3], vec![h]);
    }

    #[test]
    fn test_stale_root_is_rejected() {
        let mut g: Graph<f64> = Graph::new();
        let a = g.leaf(1.0);
        let cp = g.checkpoint();
        let b = g.exp(a).unwrap();
        g.rewind(cp).unwrap();
        assert!(matches!(
            g.topological_order(b),
            Err(GradGraphError::InvalidNode { .. })
        ));
    }
}

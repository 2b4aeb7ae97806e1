//! Finalize steps 3 and 4: cycle detection and deterministic topological
//! ordering over the reference graph.
//!
//! A resource is emitted no earlier than everything it references. Ties are
//! broken by declaration order: the ready set is keyed by declaration index,
//! so unrelated resources keep their original relative order and the output
//! is reproducible run over run.

use std::collections::BTreeSet;

use crate::refs::Edge;

#[derive(Clone, Debug)]
pub(crate) struct CycleError {
    /// Reference-direction walk, first index repeated at the end.
    pub cycle: Vec<usize>,
}

pub(crate) fn topo_order(n: usize, edges: &[Edge]) -> Result<Vec<usize>, CycleError> {
    // out[target] lists referrers: once a target is emitted, its referrers
    // lose one unmet dependency.
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indeg = vec![0usize; n];
    for edge in edges {
        out[edge.to].push(edge.from);
    }
    for out in &mut out {
        out.sort_unstable();
        out.dedup();
        for &referrer in out.iter() {
            indeg[referrer] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indeg[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(&index) = ready.first() {
        ready.remove(&index);
        order.push(index);
        for &referrer in &out[index] {
            indeg[referrer] -= 1;
            if indeg[referrer] == 0 {
                ready.insert(referrer);
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    Err(CycleError {
        cycle: find_cycle(n, edges, &indeg),
    })
}

/// Extracts one concrete cycle from the nodes Kahn's algorithm left behind,
/// walking in reference direction (A -> B means A references B).
fn find_cycle(n: usize, edges: &[Edge], indeg: &[usize]) -> Vec<usize> {
    let mut refs: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in edges {
        refs[edge.from].push(edge.to);
    }
    for targets in &mut refs {
        targets.sort_unstable();
        targets.dedup();
    }

    let mut state = vec![0u8; n];
    let mut stack = Vec::new();

    fn dfs(
        u: usize,
        refs: &[Vec<usize>],
        live: &[usize],
        state: &mut [u8],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        state[u] = 1;
        stack.push(u);

        for &v in &refs[u] {
            if live[v] == 0 {
                continue;
            }
            match state[v] {
                0 => {
                    if let Some(cycle) = dfs(v, refs, live, state, stack) {
                        return Some(cycle);
                    }
                }
                1 => {
                    let start = stack
                        .iter()
                        .position(|&node| node == v)
                        .expect("node on stack");
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(v);
                    return Some(cycle);
                }
                _ => {}
            }
        }

        stack.pop();
        state[u] = 2;
        None
    }

    for u in 0..n {
        if indeg[u] == 0 || state[u] != 0 {
            continue;
        }
        if let Some(cycle) = dfs(u, &refs, indeg, &mut state, &mut stack) {
            return cycle;
        }
    }

    unreachable!("cycle expected in remaining graph");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: usize, to: usize) -> Edge {
        Edge { from, to }
    }

    #[test]
    fn targets_come_before_referrers() {
        // 0 references 1, 1 references 2
        let order = topo_order(3, &[edge(0, 1), edge(1, 2)]).unwrap();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn unrelated_nodes_keep_declaration_order() {
        let order = topo_order(4, &[edge(3, 1)]).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn two_node_cycle_is_extracted_in_reference_direction() {
        let err = topo_order(2, &[edge(0, 1), edge(1, 0)]).unwrap_err();
        assert_eq!(err.cycle.first(), err.cycle.last());
        assert!(err.cycle.len() == 3);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = topo_order(1, &[edge(0, 0)]).unwrap_err();
        assert_eq!(err.cycle, vec![0, 0]);
    }

    #[test]
    fn duplicate_edges_do_not_break_ordering() {
        let order = topo_order(2, &[edge(0, 1), edge(0, 1)]).unwrap();
        assert_eq!(order, vec![1, 0]);
    }
}

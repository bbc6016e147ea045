// Density clustering (HDBSCAN) with a reserved outlier id.
//
// The cluster count is discovered, not given. Steps:
//   1. core distance of each point (distance to its `min_samples`-th neighbour,
//      counting the point itself)
//   2. minimum spanning tree over mutual-reachability distances
//   3. single-linkage hierarchy from the sorted MST edges
//   4. condensed tree: splits where both sides keep `min_cluster_size` points
//      create clusters, smaller sides "fall out" of their parent
//   5. excess-of-mass selection of the most stable clusters (the root is
//      never selected, so a batch with no real split is all outliers)
//
// Points that fall out of a selected cluster, or of any of its descendants,
// belong to it. Every other point is an outlier (`None`).

use std::collections::VecDeque;

use tracing::debug;

use super::vectors::euclidean;

/// Distances below this are treated as this value when converting to lambda,
/// so identical points yield a large finite lambda instead of infinity.
const MIN_DISTANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdbscanParams {
    pub min_cluster_size: usize,
    pub min_samples: usize,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            min_samples: 2,
        }
    }
}

/// Cluster `points`. Returns one entry per point: `Some(id)` with ids
/// numbered from 0 in condensed-tree order, or `None` for outliers.
pub fn fit(points: &[Vec<f64>], params: &HdbscanParams) -> Vec<Option<usize>> {
    let n = points.len();
    let min_cluster_size = params.min_cluster_size.max(2);
    if n < min_cluster_size {
        return vec![None; n];
    }

    let core = core_distances(points, params.min_samples.max(1));
    let mst = mutual_reachability_mst(points, &core);
    let merges = single_linkage(n, &mst);
    let tree = condense(&merges, n, min_cluster_size);
    let selected = select_clusters(&tree);
    let labels = label_points(&tree, &selected, n);

    debug!(
        points = n,
        candidate_clusters = tree.cluster_count - 1,
        selected = selected.iter().filter(|&&s| s).count(),
        outliers = labels.iter().filter(|l| l.is_none()).count(),
        "Density clustering finished"
    );

    labels
}

fn core_distances(points: &[Vec<f64>], min_samples: usize) -> Vec<f64> {
    let k = min_samples.min(points.len()) - 1;
    points
        .iter()
        .map(|p| {
            let mut dists: Vec<f64> = points.iter().map(|q| euclidean(p, q)).collect();
            dists.sort_by(f64::total_cmp);
            dists[k]
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    weight: f64,
}

/// Prim's algorithm on the dense mutual-reachability graph, edges sorted by weight.
fn mutual_reachability_mst(points: &[Vec<f64>], core: &[f64]) -> Vec<Edge> {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let reach = euclidean(&points[current], &points[j])
                .max(core[current])
                .max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                parent[j] = current;
            }
        }

        let Some(next) = (0..n)
            .filter(|&j| !in_tree[j])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
        else {
            break;
        };

        in_tree[next] = true;
        edges.push(Edge {
            a: parent[next],
            b: next,
            weight: best[next],
        });
        current = next;
    }

    edges.sort_by(|x, y| x.weight.total_cmp(&y.weight));
    edges
}

/// One merge of the single-linkage hierarchy. Node ids below `n` are
/// points; merge `i` is node `n + i`.
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

fn single_linkage(n: usize, mst: &[Edge]) -> Vec<Merge> {
    let mut parent: Vec<usize> = (0..2 * n).collect();
    let mut size = vec![1usize; 2 * n];
    let mut merges = Vec::with_capacity(mst.len());

    for (i, edge) in mst.iter().enumerate() {
        let ra = find(&mut parent, edge.a);
        let rb = find(&mut parent, edge.b);
        let node = n + i;
        size[node] = size[ra] + size[rb];
        parent[ra] = node;
        parent[rb] = node;
        merges.push(Merge {
            left: ra,
            right: rb,
            distance: edge.weight,
            size: size[node],
        });
    }

    merges
}

fn find(parent: &mut [usize], x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    let mut cur = x;
    while parent[cur] != root {
        let next = parent[cur];
        parent[cur] = root;
        cur = next;
    }
    root
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Child {
    Point(usize),
    Cluster(usize),
}

#[derive(Debug, Clone, Copy)]
struct CondensedEdge {
    parent: usize,
    child: Child,
    lambda: f64,
    size: usize,
}

/// Condensed cluster tree. Cluster 0 is the root.
#[derive(Debug)]
struct CondensedTree {
    edges: Vec<CondensedEdge>,
    cluster_count: usize,
}

fn lambda_of(distance: f64) -> f64 {
    1.0 / distance.max(MIN_DISTANCE)
}

fn condense(merges: &[Merge], n: usize, min_cluster_size: usize) -> CondensedTree {
    let mut edges = Vec::new();
    if merges.is_empty() {
        for p in 0..n {
            edges.push(CondensedEdge {
                parent: 0,
                child: Child::Point(p),
                lambda: 0.0,
                size: 1,
            });
        }
        return CondensedTree {
            edges,
            cluster_count: 1,
        };
    }

    let node_size = |id: usize| if id < n { 1 } else { merges[id - n].size };
    let root = n + merges.len() - 1;
    let mut relabel = vec![0usize; n + merges.len()];
    let mut next_cluster = 1;
    let mut queue = VecDeque::from([root]);

    while let Some(node) = queue.pop_front() {
        if node < n {
            continue;
        }
        let merge = merges[node - n];
        let lambda = lambda_of(merge.distance);
        let cluster = relabel[node];
        let left_big = node_size(merge.left) >= min_cluster_size;
        let right_big = node_size(merge.right) >= min_cluster_size;

        match (left_big, right_big) {
            (true, true) => {
                for child in [merge.left, merge.right] {
                    relabel[child] = next_cluster;
                    edges.push(CondensedEdge {
                        parent: cluster,
                        child: Child::Cluster(next_cluster),
                        lambda,
                        size: node_size(child),
                    });
                    next_cluster += 1;
                    queue.push_back(child);
                }
            }
            (false, false) => {
                for child in [merge.left, merge.right] {
                    fall_out(merges, n, child, cluster, lambda, &mut edges);
                }
            }
            (true, false) => {
                relabel[merge.left] = cluster;
                queue.push_back(merge.left);
                fall_out(merges, n, merge.right, cluster, lambda, &mut edges);
            }
            (false, true) => {
                relabel[merge.right] = cluster;
                queue.push_back(merge.right);
                fall_out(merges, n, merge.left, cluster, lambda, &mut edges);
            }
        }
    }

    CondensedTree {
        edges,
        cluster_count: next_cluster,
    }
}

/// Record every point under `node` as leaving `cluster` at `lambda`.
fn fall_out(
    merges: &[Merge],
    n: usize,
    node: usize,
    cluster: usize,
    lambda: f64,
    edges: &mut Vec<CondensedEdge>,
) {
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        if id < n {
            edges.push(CondensedEdge {
                parent: cluster,
                child: Child::Point(id),
                lambda,
                size: 1,
            });
        } else {
            let merge = merges[id - n];
            stack.push(merge.right);
            stack.push(merge.left);
        }
    }
}

/// Excess-of-mass selection. Returns a selected flag per cluster id.
fn select_clusters(tree: &CondensedTree) -> Vec<bool> {
    let k = tree.cluster_count;
    let mut birth = vec![0.0_f64; k];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); k];
    for edge in &tree.edges {
        if let Child::Cluster(c) = edge.child {
            birth[c] = edge.lambda;
            children[edge.parent].push(c);
        }
    }

    let mut stability = vec![0.0_f64; k];
    for edge in &tree.edges {
        stability[edge.parent] += (edge.lambda - birth[edge.parent]) * edge.size as f64;
    }

    let mut selected = vec![false; k];
    // Children always carry larger ids than their parent, so a reverse
    // sweep sees every subtree before its root. The root itself is skipped.
    for c in (1..k).rev() {
        let subtree: f64 = children[c].iter().map(|&ch| stability[ch]).sum();
        if subtree > stability[c] {
            stability[c] = subtree;
        } else {
            selected[c] = true;
            let mut stack = children[c].clone();
            while let Some(d) = stack.pop() {
                selected[d] = false;
                stack.extend(children[d].iter().copied());
            }
        }
    }

    selected
}

fn label_points(tree: &CondensedTree, selected: &[bool], n: usize) -> Vec<Option<usize>> {
    let mut cluster_parent = vec![0usize; tree.cluster_count];
    let mut point_parent = vec![0usize; n];
    for edge in &tree.edges {
        match edge.child {
            Child::Cluster(c) => cluster_parent[c] = edge.parent,
            Child::Point(p) => point_parent[p] = edge.parent,
        }
    }

    // Public ids follow cluster order
    let mut public_id = vec![None; tree.cluster_count];
    let mut next = 0;
    for (c, &is_selected) in selected.iter().enumerate() {
        if is_selected {
            public_id[c] = Some(next);
            next += 1;
        }
    }

    point_parent
        .iter()
        .map(|&start| {
            let mut c = start;
            while c != 0 && !selected[c] {
                c = cluster_parent[c];
            }
            public_id[c]
        })
        .collect()
}

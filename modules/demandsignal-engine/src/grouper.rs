//! Fuzzy grouping of demand candidates.
//!
//! Candidates are nodes; two candidates are joined when their excerpts share
//! at least one token and their Jaccard similarity clears the threshold.
//! Clusters are the connected components of that graph, so grouping is
//! transitive: A~B and B~C put A, B and C together even if A~C alone would not.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::info;

use demandsignal_common::{ClusterMember, DemandCandidate, DemandCluster, DemandSignalError, Result};

use crate::text::{jaccard, similarity_tokens};

/// Group `candidates` into clusters at `threshold` (inclusive, `0..=1`).
///
/// Output order: aggregate score desc, size desc, then representative rank.
/// Cluster ids are 1-based positions in that order.
pub fn cluster(candidates: &[DemandCandidate], threshold: f64) -> Result<Vec<DemandCluster>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(DemandSignalError::Configuration(format!(
            "similarity threshold must be within [0, 1], got {threshold}"
        )));
    }
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let tokens: Vec<BTreeSet<String>> = candidates
        .iter()
        .map(|c| similarity_tokens(&c.excerpt))
        .collect();

    let postings = token_postings(&tokens);
    let mut sets = DisjointSet::new(candidates.len());
    let mut edges = 0usize;
    for i in 0..candidates.len() {
        for j in later_neighbours(i, &tokens[i], &postings) {
            // Already connected: the edge cannot change the partition.
            if sets.find(i) == sets.find(j) {
                continue;
            }
            if jaccard(&tokens[i], &tokens[j]) >= threshold {
                sets.union(i, j);
                edges += 1;
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..candidates.len() {
        components.entry(sets.find(i)).or_default().push(i);
    }

    let mut clusters: Vec<DemandCluster> = components
        .into_values()
        .map(|mut indices| {
            indices.sort_by(|&a, &b| rank(&candidates[a], &candidates[b]));
            build_cluster(indices.iter().map(|&i| &candidates[i]))
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.aggregate_score
            .total_cmp(&a.aggregate_score)
            .then_with(|| b.size.cmp(&a.size))
            .then_with(|| member_rank(&a.members[0], &b.members[0]))
    });
    for (position, cluster) in clusters.iter_mut().enumerate() {
        cluster.id = position + 1;
    }

    info!(
        candidates = candidates.len(),
        edges,
        clusters = clusters.len(),
        threshold,
        "Demand clustering complete"
    );

    Ok(clusters)
}

/// Ascending candidate indices per token.
fn token_postings(tokens: &[BTreeSet<String>]) -> HashMap<&str, Vec<usize>> {
    let mut postings: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, set) in tokens.iter().enumerate() {
        for token in set {
            postings.entry(token.as_str()).or_default().push(i);
        }
    }
    postings
}

/// Candidates after `i` sharing at least one token with it, each once and in
/// index order. Pairs with no shared token can never form an edge, so blocking
/// on tokens loses nothing.
fn later_neighbours(
    i: usize,
    own_tokens: &BTreeSet<String>,
    postings: &HashMap<&str, Vec<usize>>,
) -> BTreeSet<usize> {
    let mut neighbours = BTreeSet::new();
    for token in own_tokens {
        if let Some(indices) = postings.get(token.as_str()) {
            let after = indices.partition_point(|&j| j <= i);
            neighbours.extend(&indices[after..]);
        }
    }
    neighbours
}

/// Representative order: confidence desc, earliest post, smallest key.
fn rank(a: &DemandCandidate, b: &DemandCandidate) -> Ordering {
    b.confidence_score
        .total_cmp(&a.confidence_score)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.key().cmp(&b.key()))
}

fn member_rank(a: &ClusterMember, b: &ClusterMember) -> Ordering {
    b.confidence_score
        .total_cmp(&a.confidence_score)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.key.cmp(&b.key))
}

/// `ranked` must already be in representative order.
fn build_cluster<'a>(ranked: impl Iterator<Item = &'a DemandCandidate>) -> DemandCluster {
    let members: Vec<ClusterMember> = ranked.map(ClusterMember::from).collect();
    // Summed in rank order so the float result does not depend on input order.
    let aggregate_score = members.iter().map(|m| m.confidence_score).sum();
    let sources = members.iter().map(|m| m.source_tag.clone()).collect();
    DemandCluster {
        id: 0,
        representative_key: members[0].key.clone(),
        representative_excerpt: members[0].excerpt.clone(),
        aggregate_score,
        sources,
        size: members.len(),
        members,
    }
}

/// Union-find over candidate indices with path compression and union by rank.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

mod trail;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;
use trail::TrailKind;

/// The three ways construction or assembly can fail. Each input either
/// yields a complete reconstructed sequence or exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no eulerian trail: {unbalanced} vertices out of degree balance")]
    NoEulerianPath { unbalanced: usize },
    #[error("disconnected graph: walked {visited} of {total} edges")]
    DisconnectedGraph { visited: usize, total: usize },
}

#[derive(Clone)]
pub struct DeBruijnGraph {
    pub k: usize,
    pub nodes: Vec<Node>,
    indexer: HashMap<String, usize>,
}

impl std::fmt::Debug for DeBruijnGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "NumOfNodes:{}", self.nodes.len())?;
        for (idx, node) in self.nodes.iter().enumerate() {
            writeln!(f, "{}\t{:?}", idx, node)?;
        }
        write!(f, "K:{}", self.k)
    }
}

#[derive(Clone)]
pub struct Node {
    pub kmer: String,
    pub edges: Vec<Edge>,
    pub in_degree: usize,
}

impl Node {
    fn new(kmer: &str) -> Self {
        Node {
            kmer: kmer.to_string(),
            edges: vec![],
            in_degree: 0,
        }
    }
    fn push(&mut self, to: usize) {
        match self.edges.iter_mut().find(|e| e.to == to) {
            Some(x) => {
                x.weight += 1;
            }
            None => self.edges.push(Edge { to, weight: 1 }),
        }
    }
    pub fn out_degree(&self) -> usize {
        self.edges.iter().map(|e| e.weight as usize).sum()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let edges: Vec<_> = self
            .edges
            .iter()
            .map(|e| format!("(->{},{})", e.to, e.weight))
            .collect();
        write!(
            f,
            "{}\t{}\t[{}]",
            self.kmer,
            self.in_degree,
            edges.join(",")
        )
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) to: usize,
    pub weight: u64,
}

impl DeBruijnGraph {
    /// Build the graph from equal-length reads. Every read contributes one
    /// directed edge from its (k-1)-prefix to its (k-1)-suffix; parallel
    /// reads pile up as edge weight. Fails with `InvalidInput` when `reads`
    /// is empty, `k < 2`, or any read is not an ASCII string of length `k`.
    pub fn from_reads<S: AsRef<str>>(reads: &[S], k: usize) -> Result<Self, AssemblyError> {
        if k < 2 {
            return Err(AssemblyError::InvalidInput(format!(
                "k should be 2 or more, got {}",
                k
            )));
        }
        if reads.is_empty() {
            return Err(AssemblyError::InvalidInput("empty read set".to_string()));
        }
        for read in reads {
            let read = read.as_ref();
            if read.len() != k || !read.is_ascii() {
                return Err(AssemblyError::InvalidInput(format!(
                    "reads should be ASCII strings of length {}, got {:?}",
                    k, read
                )));
            }
        }
        let (mut nodes, mut indexer) = (Vec::new(), HashMap::<String, usize>::new());
        for read in reads {
            let read = read.as_ref();
            let (left, right) = (&read[..k - 1], &read[read.len() - k + 1..]);
            // Check entry.
            let from = if !indexer.contains_key(left) {
                indexer.insert(left.to_string(), nodes.len());
                nodes.push(Node::new(left));
                nodes.len() - 1
            } else {
                *indexer.get(left).unwrap()
            };
            let to = if !indexer.contains_key(right) {
                indexer.insert(right.to_string(), nodes.len());
                nodes.push(Node::new(right));
                nodes.len() - 1
            } else {
                *indexer.get(right).unwrap()
            };
            nodes[from].push(to);
            nodes[to].in_degree += 1;
        }
        debug!("{} reads into {} nodes", reads.len(), nodes.len());
        Ok(Self { k, nodes, indexer })
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(Node::out_degree).sum()
    }
    pub fn out_degree(&self, kmer: &str) -> Option<usize> {
        let &idx = self.indexer.get(kmer)?;
        Some(self.nodes[idx].out_degree())
    }
    pub fn in_degree(&self, kmer: &str) -> Option<usize> {
        let &idx = self.indexer.get(kmer)?;
        Some(self.nodes[idx].in_degree)
    }
    /// Reassemble the source sequence by walking every edge exactly once.
    /// The walk consumes a private copy of the out-edge lists, so the graph
    /// is left intact and can be assembled again or inspected afterwards.
    pub fn assemble(&self) -> Result<String, AssemblyError> {
        let out_degrees: Vec<_> = self.nodes.iter().map(Node::out_degree).collect();
        let in_degrees: Vec<_> = self.nodes.iter().map(|n| n.in_degree).collect();
        let kind = match trail::classify(&out_degrees, &in_degrees) {
            Some(kind) => kind,
            None => {
                let unbalanced = out_degrees
                    .iter()
                    .zip(in_degrees.iter())
                    .filter(|(out, inn)| out != inn)
                    .count();
                return Err(AssemblyError::NoEulerianPath { unbalanced });
            }
        };
        let start = match kind {
            TrailKind::Circuit { start } => start,
            TrailKind::Trail { start, .. } => start,
        };
        debug!("Found {:?}", kind);
        let mut arena: Vec<Vec<Edge>> = self.nodes.iter().map(|n| n.edges.clone()).collect();
        let mut walked = trail::walk(&mut arena, start);
        let total = self.edge_count();
        if walked.len() != total + 1 {
            return Err(AssemblyError::DisconnectedGraph {
                visited: walked.len() - 1,
                total,
            });
        }
        // The walk finishes vertices last-first.
        walked.reverse();
        if let TrailKind::Trail { end, .. } = kind {
            assert_eq!(walked.last(), Some(&end));
        }
        let mut sequence = String::with_capacity(total + self.k - 1);
        for &idx in walked.iter().take(walked.len() - 1) {
            sequence.push_str(&self.nodes[idx].kmer[..1]);
        }
        if let Some(&last) = walked.last() {
            sequence.push_str(&self.nodes[last].kmer);
        }
        Ok(sequence)
    }
}

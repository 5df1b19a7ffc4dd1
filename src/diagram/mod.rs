//! Declarative architecture diagrams rendered through Graphviz.
//!
//! A [`Diagram`] is a list of clusters, nodes and directed edges. It renders to
//! DOT text; PNG and SVG output pipe that text through the `dot` executable.

pub mod architecture;

use std::fmt::Write as _;
use std::process::Stdio;

use anyhow::{Context as _, Result, bail};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl Direction {
    fn rankdir(self) -> &'static str {
        match self {
            Direction::LeftToRight => "LR",
            Direction::RightToLeft => "RL",
            Direction::TopToBottom => "TB",
            Direction::BottomToTop => "BT",
        }
    }
}

/// Service grouping used to colour nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Compute,
    Database,
    DevTools,
    Integration,
    Management,
    Security,
    Saas,
    Custom,
}

impl Category {
    fn fill(self) -> &'static str {
        match self {
            Category::Compute => "#ED7100",
            Category::Database => "#C925D1",
            Category::DevTools => "#4D72F3",
            Category::Integration => "#E7157B",
            Category::Management => "#D6246E",
            Category::Security => "#DD344C",
            Category::Saas => "#5059C9",
            Category::Custom => "#FFFFFF",
        }
    }
}

/// What a node depicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    CodePipeline,
    DynamoDb,
    DynamoDbTable,
    Sns,
    SnsTopic,
    EventBridge,
    Lambda,
    CloudWatch,
    Iam,
    IamRole,
    IamPermissions,
    SecretsManager,
    Teams,
    /// A node drawn with a user-supplied icon file.
    Custom { icon: String },
}

impl NodeKind {
    pub fn category(&self) -> Category {
        match self {
            NodeKind::CodePipeline => Category::DevTools,
            NodeKind::DynamoDb | NodeKind::DynamoDbTable => Category::Database,
            NodeKind::Sns | NodeKind::SnsTopic | NodeKind::EventBridge => Category::Integration,
            NodeKind::Lambda => Category::Compute,
            NodeKind::CloudWatch => Category::Management,
            NodeKind::Iam
            | NodeKind::IamRole
            | NodeKind::IamPermissions
            | NodeKind::SecretsManager => Category::Security,
            NodeKind::Teams => Category::Saas,
            NodeKind::Custom { .. } => Category::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    pub cluster: Option<ClusterId>,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: ClusterId,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone)]
pub struct Diagram {
    pub title: String,
    pub direction: Direction,
    clusters: Vec<Cluster>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Diagram {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            direction: Direction::default(),
            clusters: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn cluster(&mut self, label: impl Into<String>) -> ClusterId {
        let id = ClusterId(self.clusters.len());
        self.clusters.push(Cluster {
            id,
            label: label.into(),
        });
        id
    }

    /// Add a node outside any cluster.
    pub fn node(&mut self, kind: NodeKind, label: impl Into<String>) -> NodeId {
        self.push_node(kind, label.into(), None)
    }

    pub fn node_in(&mut self, cluster: ClusterId, kind: NodeKind, label: impl Into<String>) -> NodeId {
        self.push_node(kind, label.into(), Some(cluster))
    }

    fn push_node(&mut self, kind: NodeKind, label: String, cluster: Option<ClusterId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            label,
            kind,
            cluster,
        });
        id
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> &mut Self {
        self.edges.push(Edge { from, to });
        self
    }

    /// One edge from `from` to each of `targets`.
    pub fn fan_out(&mut self, from: NodeId, targets: &[NodeId]) -> &mut Self {
        for &to in targets {
            self.connect(from, to);
        }
        self
    }

    /// Edges between consecutive nodes of `path`.
    pub fn chain(&mut self, path: &[NodeId]) -> &mut Self {
        for pair in path.windows(2) {
            self.connect(pair[0], pair[1]);
        }
        self
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn find(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    /// Render as Graphviz DOT.
    pub fn render_dot(&self) -> String {
        let mut out = String::new();
        let title = escape(&self.title);

        // Writing into a String cannot fail.
        let _ = writeln!(out, "digraph \"{}\" {{", title);
        let _ = writeln!(
            out,
            "  graph [label=\"{}\", labelloc=t, fontsize=20, fontname=\"Sans-Serif\", rankdir={}, pad=0.5, nodesep=0.6, ranksep=0.75, splines=ortho];",
            title,
            self.direction.rankdir()
        );
        out.push_str("  node [shape=box, style=\"rounded,filled\", fontname=\"Sans-Serif\", fontsize=13, fontcolor=\"#FFFFFF\", width=1.6, height=0.8];\n");
        out.push_str("  edge [color=\"#7B8894\"];\n");

        for cluster in &self.clusters {
            let _ = writeln!(out, "\n  subgraph cluster_{} {{", cluster.id.0);
            let _ = writeln!(out, "    label=\"{}\";", escape(&cluster.label));
            out.push_str("    style=rounded; bgcolor=\"#E5F5FD\"; pencolor=\"#AEB6BE\"; fontname=\"Sans-Serif\";\n");
            for node in self.nodes.iter().filter(|n| n.cluster == Some(cluster.id)) {
                let _ = writeln!(out, "    {}", node_statement(node));
            }
            out.push_str("  }\n");
        }

        let loose: Vec<&Node> = self.nodes.iter().filter(|n| n.cluster.is_none()).collect();
        if !loose.is_empty() {
            out.push('\n');
            for node in loose {
                let _ = writeln!(out, "  {}", node_statement(node));
            }
        }

        out.push('\n');
        for edge in &self.edges {
            let _ = writeln!(out, "  n{} -> n{};", edge.from.0, edge.to.0);
        }
        out.push_str("}\n");
        out
    }
}

fn node_statement(node: &Node) -> String {
    let label = escape(&node.label);
    match &node.kind {
        NodeKind::Custom { icon } => format!(
            "n{} [label=\"{}\", image=\"{}\", shape=none, style=\"\", labelloc=b, fontcolor=\"#2D3436\", height=1.9, imagescale=true];",
            node.id.0,
            label,
            escape(icon)
        ),
        kind => format!(
            "n{} [label=\"{}\", fillcolor=\"{}\"];",
            node.id.0,
            label,
            kind.category().fill()
        ),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Output format for rendered diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DiagramFormat {
    #[default]
    Dot,
    Png,
    Svg,
}

/// Render `diagram` in `format`. Image formats need Graphviz's `dot` on PATH.
pub async fn render(diagram: &Diagram, format: DiagramFormat) -> Result<Vec<u8>> {
    let dot = diagram.render_dot();
    let target = match format {
        DiagramFormat::Dot => return Ok(dot.into_bytes()),
        DiagramFormat::Png => "-Tpng",
        DiagramFormat::Svg => "-Tsvg",
    };

    let mut child = tokio::process::Command::new("dot")
        .arg(target)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to run Graphviz 'dot'; is Graphviz installed?")?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(dot.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        bail!(
            "Graphviz 'dot' exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output.stdout)
}

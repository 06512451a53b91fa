use serde::{Deserialize, Serialize};

/// A processing station in the production network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_node_color")]
    pub color: String,
    /// Fractional number of machines. `None` renders the node as a placeholder.
    #[serde(default, alias = "machineCount")]
    pub unit_count: Option<f32>,
    /// Key into the unit size table. Unknown keys use the `DEFAULT` entry.
    #[serde(default, alias = "producer")]
    pub unit_kind: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A material flow between two stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub value: f32,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default, alias = "edges")]
    pub links: Vec<FlowEdge>,
}

/// Hover content for a node, as shown in the node's tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub name: String,
    pub kind: String,
    pub unit_count: Option<f32>,
    pub icon: Option<String>,
}

fn default_node_color() -> String {
    "#4e79a7".to_string()
}

impl FlowNode {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: default_node_color(),
            unit_count: None,
            unit_kind: None,
            icon: None,
        }
    }

    pub fn with_units(mut self, count: f32, kind: &str) -> Self {
        self.unit_count = Some(count);
        self.unit_kind = Some(kind.to_string());
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    /// Label drawn in the node's top-left corner, `name (count)`.
    pub fn display_label(&self) -> String {
        match self.unit_count {
            Some(count) => format!("{} ({})", self.name, format_count(count)),
            None => self.name.clone(),
        }
    }
}

impl FlowEdge {
    pub fn new(source: &str, target: &str, value: f32) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            value,
            color: None,
        }
    }
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn add_node(&mut self, node: FlowNode) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, source: &str, target: &str, value: f32) {
        self.links.push(FlowEdge::new(source, target, value));
    }

    /// Metadata lookup used for hover presentation.
    pub fn node_info(&self, id: &str) -> Option<NodeInfo> {
        let node = self.node(id)?;
        Some(NodeInfo {
            name: node.name.clone(),
            kind: node
                .unit_kind
                .clone()
                .unwrap_or_else(|| crate::config::DEFAULT_UNIT_KIND.to_string()),
            unit_count: node.unit_count,
            icon: node.icon.clone(),
        })
    }
}

/// Formats a machine count with at most two decimals and no trailing zeros.
pub fn format_count(count: f32) -> String {
    let rounded = (count * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}

//! An owned, mutable document tree for the preview surface.
//!
//! The markup renderer produces HTML; this module parses it into an arena of
//! nodes the pipeline can mutate (emoji normalization, chrome hiding) and
//! serialize back, without a real browser DOM. Parsing is backed by `scraper`.

use scraper::Html;

/// Handle to a node inside a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to a stylesheet fragment attached to a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylesheetId(u64);

/// Inline style declarations on an element, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    props: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, replacing an existing declaration in place.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.props.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            self.props.push((name.to_string(), value.to_string()));
        }
    }

    /// Remove a property, returning its previous value if present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.props.iter().position(|(k, _)| k == name)?;
        Some(self.props.remove(idx).1)
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Serialize as a `style` attribute value.
    pub fn to_css(&self) -> String {
        self.props
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn parse(css: &str) -> Self {
        let mut style = InlineStyle::default();
        for decl in css.split(';') {
            if let Some((k, v)) = decl.split_once(':') {
                let k = k.trim();
                let v = v.trim();
                if !k.is_empty() && !v.is_empty() {
                    style.set(k, v);
                }
            }
        }
        style
    }
}

/// Element payload: tag, attributes (minus `style`), and inline styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub style: InlineStyle,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    /// Whether the element carries a class token (whitespace-separated match).
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// Node payload variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An owned document tree plus its attached stylesheet fragments.
///
/// Nodes live in an arena; detaching a node leaves its entry in place (handles
/// stay valid) but removes it from the tree, so `is_attached` reports false.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    root: NodeId,
    stylesheets: Vec<(StylesheetId, String)>,
    next_sheet_id: u64,
}

// Tags serialized without a closing pair.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

impl Document {
    /// Create a document with a single empty root element.
    pub fn with_root(tag: &str) -> Self {
        let root_entry = NodeEntry {
            data: NodeData::Element(ElementData {
                tag: tag.to_string(),
                attrs: Vec::new(),
                style: InlineStyle::default(),
            }),
            parent: None,
            children: Vec::new(),
        };
        Document {
            nodes: vec![root_entry],
            root: NodeId(0),
            stylesheets: Vec::new(),
            next_sheet_id: 1,
        }
    }

    /// Parse an HTML fragment into a document rooted at a fresh container.
    pub fn parse_fragment(html: &str, container_tag: &str) -> Self {
        let mut doc = Document::with_root(container_tag);
        let root = doc.root();
        doc.append_fragment(root, html);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeEntry {
            data: NodeData::Element(ElementData {
                tag: tag.to_string(),
                attrs: Vec::new(),
                style: InlineStyle::default(),
            }),
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeEntry {
            data: NodeData::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Remove a node from its parent. The entry stays in the arena.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        if node.0 >= self.nodes.len() {
            return false;
        }
        let mut cur = node;
        loop {
            if cur == self.root {
                return true;
            }
            match self.nodes[cur.0].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// All descendants of `node` in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            for child in self.nodes[n.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Concatenated text content of the subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Serialize the children of `node` as an HTML fragment.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in &self.nodes[node.0].children {
            self.serialize(*child, &mut out);
        }
        out
    }

    /// Replace the children of `node` with a re-parsed HTML fragment.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) {
        let old: Vec<NodeId> = self.nodes[node.0].children.clone();
        for child in old {
            self.detach(child);
        }
        self.append_fragment(node, html);
    }

    fn serialize(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => out.push_str(&escape_text(t)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (k, v) in &el.attrs {
                    out.push_str(&format!(" {}=\"{}\"", k, escape_attr(v)));
                }
                if !el.style.is_empty() {
                    out.push_str(&format!(" style=\"{}\"", escape_attr(&el.style.to_css())));
                }
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in &self.nodes[node.0].children {
                    self.serialize(*child, out);
                }
                out.push_str(&format!("</{}>", el.tag));
            }
        }
    }

    /// Parse `html` and append the resulting nodes to `parent`.
    pub fn append_fragment(&mut self, parent: NodeId, html: &str) {
        let fragment = Html::parse_fragment(html);
        let root = fragment.tree.root();
        for child in root.children() {
            self.import(parent, child);
        }
    }

    fn import(&mut self, parent: NodeId, node: ego_tree::NodeRef<'_, scraper::Node>) {
        match node.value() {
            scraper::Node::Text(t) => {
                let text = self.create_text(t);
                self.append_child(parent, text);
            }
            scraper::Node::Element(el) => {
                // scraper wraps fragments in a synthetic <html> element
                if el.name() == "html" {
                    for child in node.children() {
                        self.import(parent, child);
                    }
                    return;
                }
                let id = self.create_element(el.name());
                for (k, v) in el.attrs() {
                    if k == "style" {
                        let style = InlineStyle::parse(v);
                        if let Some(data) = self.element_mut(id) {
                            data.style = style;
                        }
                    } else if let Some(data) = self.element_mut(id) {
                        data.set_attr(k, v);
                    }
                }
                self.append_child(parent, id);
                for child in node.children() {
                    self.import(id, child);
                }
            }
            _ => {}
        }
    }

    // --- Stylesheet fragments ---

    /// Attach a stylesheet fragment; the returned id releases it again.
    pub fn add_stylesheet(&mut self, css: &str) -> StylesheetId {
        let id = StylesheetId(self.next_sheet_id);
        self.next_sheet_id += 1;
        self.stylesheets.push((id, css.to_string()));
        id
    }

    /// Remove a previously attached stylesheet fragment.
    pub fn remove_stylesheet(&mut self, id: StylesheetId) -> bool {
        let before = self.stylesheets.len();
        self.stylesheets.retain(|(sid, _)| *sid != id);
        self.stylesheets.len() != before
    }

    pub fn stylesheets(&self) -> impl Iterator<Item = &str> {
        self.stylesheets.iter().map(|(_, css)| css.as_str())
    }

    fn push(&mut self, entry: NodeEntry) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(entry);
        id
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

//! SIXX object tree and its serializer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Env {
    Core,
    Arduino,
}

impl Env {
    fn as_str(self) -> &'static str {
        match self {
            Env::Core => "Core",
            Env::Arduino => "Arduino",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    /// Self-closing element.
    Empty,
    /// Already escaped text on the element's line.
    Text(String),
    Children(Vec<Node>),
}

/// One `sixx.object` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Node {
    id: Option<u32>,
    name: Option<&'static str>,
    idref: Option<u32>,
    class: Option<String>,
    env: Option<Env>,
    content: Content,
}

impl Node {
    pub(super) fn object(
        id: Option<u32>,
        name: Option<&'static str>,
        class: impl Into<String>,
        env: Env,
    ) -> Self {
        Self {
            id,
            name,
            idref: None,
            class: Some(class.into()),
            env: Some(env),
            content: Content::Empty,
        }
    }

    /// A back-reference to a node emitted earlier.
    pub(super) fn reference(name: &'static str, idref: u32) -> Self {
        Self {
            id: None,
            name: Some(name),
            idref: Some(idref),
            class: None,
            env: None,
            content: Content::Empty,
        }
    }

    pub(super) fn string(id: u32, name: &'static str, escaped: impl Into<String>) -> Self {
        Self::object(Some(id), Some(name), "String", Env::Core).with_text(escaped)
    }

    pub(super) fn small_integer(id: u32, name: &'static str, value: i64) -> Self {
        Self::object(Some(id), Some(name), "SmallInteger", Env::Core).with_text(value.to_string())
    }

    pub(super) fn flag(name: &'static str, value: bool) -> Self {
        let class = if value { "True" } else { "False" };
        Self::object(None, Some(name), class, Env::Core)
    }

    /// An `OrderedCollection`; without items it collapses to one line.
    pub(super) fn collection(id: u32, name: &'static str, items: Vec<Node>) -> Self {
        let node = Self::object(Some(id), Some(name), "OrderedCollection", Env::Core);
        if items.is_empty() {
            node.with_text("")
        } else {
            node.with_children(items)
        }
    }

    pub(super) fn with_text(mut self, escaped: impl Into<String>) -> Self {
        self.content = Content::Text(escaped.into());
        self
    }

    pub(super) fn with_children(mut self, children: Vec<Node>) -> Self {
        self.content = Content::Children(children);
        self
    }

    /// Serialize this node and its subtree, tab-indented by `depth`.
    pub(super) fn write(&self, out: &mut String, depth: usize) {
        let indent = "\t".repeat(depth);
        out.push_str(&indent);
        out.push_str("<sixx.object");
        if let Some(id) = self.id {
            out.push_str(&format!(" sixx.id=\"{id}\""));
        }
        if let Some(name) = self.name {
            out.push_str(&format!(" sixx.name=\"{name}\""));
        }
        if let Some(idref) = self.idref {
            out.push_str(&format!(" sixx.idref=\"{idref}\""));
        }
        if let Some(class) = self.class.as_deref() {
            out.push_str(&format!(" sixx.type=\"{class}\""));
        }
        if let Some(env) = self.env {
            out.push_str(&format!(" sixx.env=\"{}\"", env.as_str()));
        }

        match &self.content {
            Content::Empty => out.push_str(" />\n"),
            Content::Text(text) => {
                out.push_str(&format!(" >{text}</sixx.object>\n"));
            }
            Content::Children(children) => {
                out.push_str(" >\n");
                for child in children {
                    child.write(out, depth + 1);
                }
                out.push_str(&indent);
                out.push_str("</sixx.object>\n");
            }
        }
    }
}

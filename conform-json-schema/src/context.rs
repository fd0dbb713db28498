//! Tracks the schema subtree corresponding to the current JSON cursor
//! (`spec.md` §3 `ContextTracker`, §4.2 pop policy interplay).

use conform_core::SchemaNode;

/// The schema subtree stack mirroring the JSON container stack (`spec.md`
/// §3). `currentSchema()` is always the top of `schema_path`; it enters
/// `items` when a JSON array opens and `properties[lastKey]` when a JSON
/// object opens immediately after a key closes.
#[derive(Debug, Clone)]
pub struct ContextTracker<'schema> {
    schema_path: Vec<&'schema SchemaNode>,
    last_key: Option<String>,
    in_array_stack: Vec<bool>,
}

impl<'schema> ContextTracker<'schema> {
    #[must_use]
    pub fn new(root: &'schema SchemaNode) -> Self {
        Self {
            schema_path: vec![root],
            last_key: None,
            in_array_stack: Vec::new(),
        }
    }

    /// The schema in effect for whatever JSON value is about to be parsed.
    #[must_use]
    pub fn current_schema(&self) -> &'schema SchemaNode {
        self.schema_path
            .last()
            .copied()
            .expect("schema_path always has a root entry")
    }

    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    /// Record that `key` just closed; the next opened object/value is
    /// scoped to `properties[key]` of the current schema.
    pub fn observed_key(&mut self, key: &str) {
        self.last_key = Some(key.to_string());
    }

    /// A JSON object opened. If it follows a key, descend into that key's
    /// property schema (or `any` if undeclared); otherwise (array element
    /// or root) reuse the current schema unchanged.
    pub fn enter_object(&mut self) {
        let next = self
            .last_key
            .as_deref()
            .and_then(|key| self.current_schema().property(key))
            .unwrap_or_else(|| self.current_schema());
        self.schema_path.push(next);
        self.in_array_stack.push(false);
        self.last_key = None;
    }

    /// A JSON array opened; descend into its `items` schema (or `any` if
    /// absent).
    pub fn enter_array(&mut self) {
        static ANY: std::sync::OnceLock<SchemaNode> = std::sync::OnceLock::new();
        let any = ANY.get_or_init(SchemaNode::any);
        let items = self.current_schema().items().unwrap_or(any);
        self.schema_path.push(items);
        self.in_array_stack.push(true);
    }

    /// The enclosing container (object or array) closed; pop back to the
    /// schema that was in effect before `enter_object`/`enter_array`.
    pub fn exit_container(&mut self) {
        if self.schema_path.len() > 1 {
            self.schema_path.pop();
        }
        self.in_array_stack.pop();
        self.last_key = None;
    }

    #[must_use]
    pub fn in_array(&self) -> bool {
        self.in_array_stack.last().copied().unwrap_or(false)
    }
}

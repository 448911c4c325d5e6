use crate::sax::QualifiedName;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamespaceBinding {
    /// `None` binds the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

/// Prefix bindings scoped to element nesting.
///
/// One scope per open element; lookups walk from the innermost scope
/// outwards so nested declarations shadow inherited ones.
#[derive(Clone, Debug, Default)]
pub struct NamespaceResolver {
    scopes: Vec<Vec<NamespaceBinding>>,
}

/// `xmlns` or `xmlns:*`.
pub fn is_namespace_declaration(qualified_name: &str) -> bool {
    qualified_name == "xmlns" || qualified_name.starts_with("xmlns:")
}

/// Splits on the first `:`. A missing or empty side means "no prefix" and the
/// whole string is the local name.
pub fn split_qualified_name(qualified_name: &str) -> (Option<&str>, &str) {
    match qualified_name.split_once(':') {
        Some((prefix, local_name)) if !prefix.is_empty() && !local_name.is_empty() => {
            (Some(prefix), local_name)
        }
        _ => (None, qualified_name),
    }
}

impl NamespaceResolver {
    pub fn new() -> NamespaceResolver {
        NamespaceResolver::default()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Pops the innermost scope. Returns `false` when there was none.
    pub fn exit_scope(&mut self) -> bool {
        self.scopes.pop().is_some()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Registers a binding in the innermost scope. An empty `uri` on the
    /// default namespace undeclares it for the subtree.
    pub fn bind_prefix(&mut self, prefix: Option<&str>, uri: &str) {
        let binding = NamespaceBinding {
            prefix: prefix.map(str::to_owned),
            uri: uri.to_owned(),
        };
        match self.scopes.last_mut() {
            Some(scope) => scope.push(binding),
            // a binding outside any element still needs somewhere to live
            None => self.scopes.push(vec![binding]),
        }
    }

    pub fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE),
            Some("xmlns") => return Some(XMLNS_NAMESPACE),
            _ => {}
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|binding| binding.prefix.as_deref() == prefix)
            .map(|binding| binding.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Resolves an element name; unprefixed names pick up the default
    /// namespace.
    pub fn resolve(&self, qualified_name: &str) -> QualifiedName {
        let (prefix, local_name) = split_qualified_name(qualified_name);
        QualifiedName {
            local_name: local_name.to_owned(),
            prefix: prefix.map(str::to_owned),
            namespace_uri: self.lookup(prefix).map(str::to_owned),
        }
    }

    /// Resolves an attribute name; the default namespace does not apply to
    /// unprefixed attributes.
    pub fn resolve_attribute(&self, qualified_name: &str) -> QualifiedName {
        let (prefix, local_name) = split_qualified_name(qualified_name);
        let namespace_uri = match prefix {
            Some(_) => self.lookup(prefix).map(str::to_owned),
            None => None,
        };
        QualifiedName {
            local_name: local_name.to_owned(),
            prefix: prefix.map(str::to_owned),
            namespace_uri,
        }
    }

    pub fn clear(&mut self) {
        self.scopes.clear();
    }
}

#[test]
fn test_split_qualified_name() {
    assert_eq!(split_qualified_name("a"), (None, "a"));
    assert_eq!(split_qualified_name("p:b"), (Some("p"), "b"));
    assert_eq!(split_qualified_name("p:b:c"), (Some("p"), "b:c"));
    assert_eq!(split_qualified_name(":no"), (None, ":no"));
    assert_eq!(split_qualified_name("no:"), (None, "no:"));
}

#[test]
fn test_namespace_declaration_detection() {
    assert!(is_namespace_declaration("xmlns"));
    assert!(is_namespace_declaration("xmlns:p"));
    assert!(!is_namespace_declaration("xmlnsfoo"));
    assert!(!is_namespace_declaration("p:xmlns"));
}

#[test]
fn test_scopes_shadow_and_pop() {
    let mut resolver = NamespaceResolver::new();
    resolver.enter_scope();
    resolver.bind_prefix(Some("p"), "urn:outer");
    resolver.bind_prefix(None, "urn:default");

    resolver.enter_scope();
    resolver.bind_prefix(Some("p"), "urn:inner");
    assert_eq!(resolver.depth(), 2);
    assert_eq!(resolver.resolve("p:b").namespace_uri.as_deref(), Some("urn:inner"));
    assert_eq!(resolver.resolve("c").namespace_uri.as_deref(), Some("urn:default"));

    assert!(resolver.exit_scope());
    assert_eq!(resolver.resolve("p:b").namespace_uri.as_deref(), Some("urn:outer"));

    assert!(resolver.exit_scope());
    assert_eq!(resolver.resolve("p:b").namespace_uri, None);
    assert!(!resolver.exit_scope());
}

#[test]
fn test_default_namespace_skips_attributes() {
    let mut resolver = NamespaceResolver::new();
    resolver.enter_scope();
    resolver.bind_prefix(None, "urn:d");
    let name = resolver.resolve_attribute("attr");
    assert_eq!(name.local_name, "attr");
    assert_eq!(name.prefix, None);
    assert_eq!(name.namespace_uri, None);
}

#[test]
fn test_default_namespace_undeclared() {
    let mut resolver = NamespaceResolver::new();
    resolver.enter_scope();
    resolver.bind_prefix(None, "urn:d");
    resolver.enter_scope();
    resolver.bind_prefix(None, "");
    assert_eq!(resolver.resolve("a").namespace_uri, None);
}

#[test]
fn test_xml_prefix_is_implicit() {
    let resolver = NamespaceResolver::new();
    let name = resolver.resolve_attribute("xml:lang");
    assert_eq!(name.prefix.as_deref(), Some("xml"));
    assert_eq!(name.namespace_uri.as_deref(), Some(XML_NAMESPACE));
}

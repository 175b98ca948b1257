//! Tree query capability
//!
//! The upload core never touches the XML parser directly. It only needs to
//! find nodes by name, read their text and read their attributes, so that is
//! all [`TreeNode`] asks of an implementation.

/// Read-only query interface over an element tree
pub trait TreeNode {
    /// Element name
    fn name(&self) -> &str;

    /// Text content of the element (empty when it has none)
    fn text(&self) -> &str;

    /// Value of an attribute, if present
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Direct children with the given name, in document order
    fn children_named<'a>(&'a self, name: &str) -> Vec<&'a Self>;

    /// All descendants (excluding self) with the given name, in document order
    fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Self>;

    /// First direct child with the given name
    fn child<'a>(&'a self, name: &str) -> Option<&'a Self> {
        self.children_named(name).into_iter().next()
    }

    /// Text of the first direct child with the given name
    fn child_text<'a>(&'a self, name: &str) -> Option<&'a str> {
        self.child(name).map(|c| c.text())
    }
}

use super::CpuProfileNode;
use super::revision::Revision;
use super::shape::{GET_CHILD, Shape};
use super::value::{Value, index_argument};
use crate::error::{Error, Result};
use std::fmt;

/// Read-only projection of one profile-tree node.
///
/// A view holds nothing but a borrowed record and the revision's shape.
/// Every field is read from the record on access, never cached. The borrow
/// ties the view to the capture owning the record, so a view cannot outlive
/// its profile.
pub struct ProfileNodeView<'a, R: Revision> {
    node: &'a R::Node,
    shape: &'static Shape<R>,
}

/// Wrap a node record, initializing the revision's shape on first use.
///
/// A missing record yields `None` rather than an error.
pub fn wrap<R: Revision>(node: Option<&R::Node>) -> Option<ProfileNodeView<'_, R>> {
    let shape = R::shape();
    node.map(|node| ProfileNodeView { node, shape })
}

impl<'a, R: Revision> ProfileNodeView<'a, R> {
    /// View of a record known to be present.
    pub fn new(node: &'a R::Node) -> Self {
        ProfileNodeView {
            node,
            shape: R::shape(),
        }
    }

    /// The wrapped record.
    pub fn node(&self) -> &'a R::Node {
        self.node
    }

    pub fn shape(&self) -> &'static Shape<R> {
        self.shape
    }

    pub fn function_name(&self) -> &'a str {
        self.node.function_name()
    }

    pub fn script_name(&self) -> &'a str {
        self.node.script_resource_name()
    }

    pub fn line_number(&self) -> i32 {
        self.node.line_number()
    }

    pub fn total_time(&self) -> Option<f64> {
        R::total_time(self.node)
    }

    pub fn self_time(&self) -> Option<f64> {
        R::self_time(self.node)
    }

    pub fn total_samples_count(&self) -> Option<f64> {
        R::total_samples_count(self.node)
    }

    pub fn self_samples_count(&self) -> f64 {
        R::self_samples_count(self.node)
    }

    pub fn call_uid(&self) -> u32 {
        self.node.call_uid()
    }

    pub fn children_count(&self) -> i32 {
        self.node.children_count()
    }

    /// Child at `index`. Out-of-range lookups are left to the record and
    /// come back as `None`.
    pub fn get_child(&self, index: i32) -> Option<ProfileNodeView<'a, R>> {
        wrap::<R>(R::child(self.node, index))
    }

    pub fn children(&self) -> Children<'a, R> {
        Children {
            parent: *self,
            next: 0,
            count: self.children_count().max(0),
        }
    }

    /// Read a field by its exposed name. `None` when the shape has no such
    /// field; a field without a value reads as [`Value::Undefined`].
    pub fn get(&self, name: &str) -> Option<Value<'a>> {
        self.shape.field(name).map(|field| field.read(self.node))
    }

    /// All exposed fields in shape order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Value<'a>)> + '_ {
        let node = self.node;
        self.shape
            .fields()
            .iter()
            .map(move |field| (field.name, field.read(node)))
    }

    /// Call a method with loosely typed arguments.
    pub fn invoke(
        &self,
        method: &str,
        args: &[Value<'_>],
    ) -> Result<Option<ProfileNodeView<'a, R>>> {
        match self.shape.method(method) {
            Some(m) if m.name == GET_CHILD => {
                let index = index_argument(args)?;
                Ok(self.get_child(index))
            }
            _ => Err(Error::UnknownMethod(method.to_string())),
        }
    }
}

impl<R: Revision> Clone for ProfileNodeView<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Revision> Copy for ProfileNodeView<'_, R> {}

impl<R: Revision> fmt::Debug for ProfileNodeView<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileNodeView")
            .field("revision", &R::NAME)
            .field("function_name", &self.function_name())
            .field("script_name", &self.script_name())
            .field("line_number", &self.line_number())
            .field("call_uid", &self.call_uid())
            .field("children_count", &self.children_count())
            .finish()
    }
}

/// Iterator over the direct children of a view.
pub struct Children<'a, R: Revision> {
    parent: ProfileNodeView<'a, R>,
    next: i32,
    count: i32,
}

impl<'a, R: Revision> Iterator for Children<'a, R> {
    type Item = ProfileNodeView<'a, R>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.count {
            let index = self.next;
            self.next += 1;
            if let Some(child) = self.parent.get_child(index) {
                return Some(child);
            }
        }
        None
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

static NULL: Value = Value::Null;

/// One hop from a container to a member slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Key(String),
    Index(usize),
}

/// Owned chain of slots from the document root.
pub type Location = Vec<Slot>;

#[derive(Debug, Clone, Copy)]
enum Seg<'a> {
    Key(&'a str),
    Index(usize),
}

#[derive(Debug)]
struct Link<'a> {
    parent: Trail<'a>,
    seg: Seg<'a>,
}

/// Persistent parent-linked path; extending it never copies.
#[derive(Debug, Clone, Default)]
struct Trail<'a>(Option<Rc<Link<'a>>>);

impl Trail<'_> {
    fn location(&self) -> Location {
        let mut slots = Vec::new();
        let mut cursor = &self.0;
        while let Some(link) = cursor {
            slots.push(match link.seg {
                Seg::Key(k) => Slot::Key(k.to_string()),
                Seg::Index(i) => Slot::Index(i),
            });
            cursor = &link.parent.0;
        }
        slots.reverse();
        slots
    }
}

/// A value reached during the walk, with where it was found.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    pub value: &'a Value,
    trail: Trail<'a>,
}

impl<'a> Node<'a> {
    pub fn root(value: &'a Value) -> Self {
        Node {
            value,
            trail: Trail::default(),
        }
    }

    /// Result of a soft miss.
    pub fn null() -> Self {
        Node::root(&NULL)
    }
}

/// State shared by one lookup or replace call.
///
/// A replacing context records the location of every slot the final
/// step visits; the plan itself is never touched.
#[derive(Debug)]
pub struct Context<'a> {
    root: &'a Value,
    writes: Option<RefCell<Vec<Location>>>,
}

impl<'a> Context<'a> {
    pub fn reading(root: &'a Value) -> Self {
        Context { root, writes: None }
    }

    pub fn replacing(root: &'a Value) -> Self {
        Context {
            root,
            writes: Some(RefCell::new(Vec::new())),
        }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    pub fn member(&self, parent: &Node<'a>, key: &'a str, value: &'a Value) -> Node<'a> {
        self.child(parent, Seg::Key(key), value)
    }

    pub fn element(&self, parent: &Node<'a>, index: usize, value: &'a Value) -> Node<'a> {
        self.child(parent, Seg::Index(index), value)
    }

    fn child(&self, parent: &Node<'a>, seg: Seg<'a>, value: &'a Value) -> Node<'a> {
        let trail = match self.writes {
            Some(_) => Trail(Some(Rc::new(Link {
                parent: parent.trail.clone(),
                seg,
            }))),
            None => Trail::default(),
        };
        Node { value, trail }
    }

    /// Immediate children of a container, nulls dropped.
    pub fn children(&self, node: &Node<'a>) -> Vec<Node<'a>> {
        match node.value {
            Value::Object(map) => map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| self.member(node, k, v))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| self.element(node, i, v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every element of an array node, nulls kept.
    pub fn elements(&self, node: &Node<'a>) -> Vec<Node<'a>> {
        match node.value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| self.element(node, i, v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Mark a slot for overwriting. No-op for read-only lookups.
    pub fn visit(&self, node: &Node<'a>) {
        if let Some(writes) = &self.writes {
            writes.borrow_mut().push(node.trail.location());
        }
    }

    pub fn into_writes(self) -> Vec<Location> {
        self.writes.map(RefCell::into_inner).unwrap_or_default()
    }
}

//! Arena storage for the spintax tree.
//!
//! Nodes live in a flat `Vec` and refer to their children by [`NodeId`]. The parser's pile holds
//! ids as well, so moving a literal under a new sequence only shuffles indices.

use crate::error::{Error, Invariant};

/// Index of a [`Node`] in its [`Nodes`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    /// The root sequence is always the first node pushed.
    pub(crate) const ROOT: Self = Self(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    /// Fixed text.
    Literal(String),
    /// One of the children, chosen uniformly.
    Alternation(Vec<NodeId>),
    /// All children, concatenated in order.
    Sequence(Vec<NodeId>),
}

impl Node {
    pub(crate) fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub(crate) fn is_alternation(&self) -> bool {
        matches!(self, Self::Alternation(_))
    }
}

#[derive(Debug, Default)]
pub(crate) struct Nodes(Vec<Node>);

impl Nodes {
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        self.0.push(node);
        NodeId(self.0.len() - 1)
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.0[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.0[id.0]
    }

    /// Adds `child` as the last child of `parent`.
    ///
    /// Literals have no children; appending to one is an internal error.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        match self.get_mut(parent) {
            Node::Alternation(v) | Node::Sequence(v) => {
                v.push(child);
                Ok(())
            }
            Node::Literal(_) => Err(Error::internal(Invariant::AppendToLiteral)),
        }
    }

    /// Pushes `node` and appends it to `parent` in one step.
    pub(crate) fn push_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, Error> {
        let id = self.push(node);
        self.append(parent, id)?;
        Ok(id)
    }

    /// Removes `child` from the end of `parent`'s children.
    ///
    /// `child` must be the last child, since only the node on top of the pile is ever detached.
    pub(crate) fn detach_last(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        match self.get_mut(parent) {
            Node::Alternation(v) | Node::Sequence(v) if v.last() == Some(&child) => {
                v.pop();
                Ok(())
            }
            _ => Err(Error::internal(Invariant::Reparent)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.iter()
    }
}

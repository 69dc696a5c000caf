//! Single pass stack machine turning a character stream into a [`Spintax`] tree.
//!
//! The parser keeps a "pile" of the nodes that are currently open, rooted at the record's
//! sequence. Every character is resolved against the node on top of the pile:
//!
//! | top         | `{`                          | `}`                   | `\|`                        | other          |
//! |-------------|------------------------------|-----------------------|-----------------------------|----------------|
//! | sequence    | open a group                 | close nearest group   | close alternative           | start literal  |
//! | alternation | new branch, group inside it  | close this group      | next alternative            | start literal  |
//! | literal     | close literal, open a group  | close nearest group   | close alternative           | extend literal |
//!
//! A literal followed by `{` inside an alternation is moved under a fresh sequence so that
//! `abc{x|y}` stays one alternative. Unbalanced input is absorbed rather than rejected: pipes and
//! closing braces outside of any group are plain text, and groups still open at the end of the
//! record are closed as if their `}` had been written.

use crate::error::{Error, Invariant};
use crate::node::{Node, NodeId, Nodes};
use crate::Spintax;
use log::{debug, trace};

/// Parses one record from `chars`, consuming characters up to and including the first line
/// terminator (or until the iterator is exhausted).
///
/// Characters after the terminator are left in `chars`, so calling `parse` again reads the next
/// record. A `\r` directly before the `\n` is not part of the record.
///
/// # Errors
/// Only [`ErrorKind::Internal`](crate::ErrorKind::Internal): no input is rejected.
pub fn parse<I: Iterator<Item = char>>(chars: &mut I) -> Result<Spintax, Error> {
    let mut parser = Parser::new();
    for c in chars {
        if parser.feed(c)? == Status::EndOfRecord {
            break;
        }
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Continue,
    EndOfRecord,
}

#[derive(Debug)]
pub(crate) struct Parser {
    nodes: Nodes,
    pile: Vec<NodeId>,

    // number of alternations on the pile
    open_groups: usize,

    // the last character handed control to the alternation on top via `|`,
    // i.e. an alternative has been started but nothing written into it yet.
    after_pipe: bool,

    pending_cr: bool,
}

impl Parser {
    pub(crate) fn new() -> Self {
        let mut nodes = Nodes::default();
        let root = nodes.push(Node::Sequence(Vec::new()));
        debug_assert_eq!(root, NodeId::ROOT);
        Self {
            nodes,
            pile: vec![root],
            open_groups: 0,
            after_pipe: false,
            pending_cr: false,
        }
    }

    /// Consumes one character. Returns [`Status::EndOfRecord`] on the line terminator, after
    /// which the parser must not be fed again.
    pub(crate) fn feed(&mut self, c: char) -> Result<Status, Error> {
        if std::mem::take(&mut self.pending_cr) {
            if c == '\n' {
                return self.end_record();
            }
            self.after_pipe = false;
            self.text('\r')?;
        }

        match c {
            '\n' => return self.end_record(),
            '\r' => self.pending_cr = true,
            _ => {
                let after_pipe = std::mem::take(&mut self.after_pipe);
                match c {
                    '{' => self.open()?,
                    '}' => self.close(after_pipe)?,
                    '|' => self.pipe(after_pipe)?,
                    _ => self.text(c)?,
                }
            }
        }
        Ok(Status::Continue)
    }

    /// Closes whatever is still open and hands out the finished tree.
    pub(crate) fn finish(mut self) -> Result<Spintax, Error> {
        if std::mem::take(&mut self.pending_cr) {
            self.after_pipe = false;
            self.text('\r')?;
        }
        self.end_record()?;

        let unclosed = self.open_groups;
        let mut after_pipe = std::mem::take(&mut self.after_pipe);
        while self.open_groups > 0 {
            self.close(after_pipe)?;
            after_pipe = false;
        }

        if self.pile != [NodeId::ROOT] {
            return Err(Error::internal(Invariant::PileNotReduced(self.pile.len())));
        }

        debug!(
            "parsed record into {} nodes ({} unclosed groups)",
            self.nodes.len(),
            unclosed
        );
        Spintax::new(self.nodes)
    }

    fn end_record(&mut self) -> Result<Status, Error> {
        if self.top_node()?.is_literal() {
            self.pile.pop();
        }
        Ok(Status::EndOfRecord)
    }

    fn top(&self) -> Result<NodeId, Error> {
        self.pile
            .last()
            .copied()
            .ok_or_else(|| Error::internal(Invariant::EmptyPile))
    }

    fn top_node(&self) -> Result<&Node, Error> {
        Ok(self.nodes.get(self.top()?))
    }

    /// Appends `node` to `parent` and makes it the top of the pile.
    fn push_open(&mut self, parent: NodeId, node: Node) -> Result<NodeId, Error> {
        if node.is_alternation() {
            self.open_groups += 1;
        }
        let id = self.nodes.push_child(parent, node)?;
        self.pile.push(id);
        Ok(id)
    }

    fn open_group(&mut self, parent: NodeId) -> Result<(), Error> {
        self.push_open(parent, Node::Alternation(Vec::new()))?;
        Ok(())
    }

    fn open(&mut self) -> Result<(), Error> {
        let top = self.top()?;
        let node = self.nodes.get(top);

        if node.is_alternation() {
            trace!("'{{' starts a new branch of {:?}", top);
            let branch = self.push_open(top, Node::Sequence(Vec::new()))?;
            return self.open_group(branch);
        }
        if !node.is_literal() {
            trace!("'{{' opens a group in {:?}", top);
            return self.open_group(top);
        }

        self.pile.pop();
        let parent = self.top()?;
        if self.nodes.get(parent).is_alternation() {
            // the literal is the alternative being written; keep it and the
            // new group together under one sequence
            trace!("'{{' moves {:?} into a new branch of {:?}", top, parent);
            self.nodes.detach_last(parent, top)?;
            let branch = self.push_open(parent, Node::Sequence(vec![top]))?;
            self.open_group(branch)
        } else {
            trace!("'{{' closes {:?} and opens a group in {:?}", top, parent);
            self.open_group(parent)
        }
    }

    fn close(&mut self, after_pipe: bool) -> Result<(), Error> {
        if self.open_groups == 0 {
            return self.text('}');
        }

        let top = self.top()?;
        if matches!(self.nodes.get(top), Node::Alternation(v) if after_pipe || v.is_empty()) {
            self.nodes.push_child(top, Node::Literal(String::new()))?;
        }

        loop {
            let id = self
                .pile
                .pop()
                .ok_or_else(|| Error::internal(Invariant::EmptyPile))?;
            if self.nodes.get(id).is_alternation() {
                trace!("'}}' closes {:?}", id);
                self.open_groups -= 1;
                return Ok(());
            }
        }
    }

    fn pipe(&mut self, after_pipe: bool) -> Result<(), Error> {
        if self.open_groups == 0 {
            return self.text('|');
        }

        let top = self.top()?;
        match self.nodes.get(top) {
            Node::Alternation(v) if after_pipe || v.is_empty() => {
                self.nodes.push_child(top, Node::Literal(String::new()))?;
            }
            Node::Alternation(_) => (),
            _ => {
                while !self.top_node()?.is_alternation() {
                    self.pile.pop();
                }
            }
        }
        trace!("'|' starts the next alternative of {:?}", self.top()?);
        self.after_pipe = true;
        Ok(())
    }

    fn text(&mut self, c: char) -> Result<(), Error> {
        let top = self.top()?;
        if let Node::Literal(s) = self.nodes.get_mut(top) {
            s.push(c);
            return Ok(());
        }
        self.push_open(top, Node::Literal(c.to_string()))?;
        Ok(())
    }
}

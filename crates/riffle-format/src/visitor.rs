//! Callbacks driven by the parser, plus a visitor that rebuilds the tree.

use crate::chunk::Chunk;
use crate::error::Result;

/// Receives the chunks of a parse in file order.
///
/// Group callbacks get the group node as known at that point:
/// `enter_group` sees only the header and inherited properties, while
/// `leave_group` also sees the property and collection chunks attached while
/// its children were parsed, plus any recovery note.
pub trait Visitor {
    /// Return `false` to skip the group's body without parsing it.
    fn entering_group(&mut self, _group: &Chunk) -> bool {
        true
    }

    fn enter_group(&mut self, _group: &Chunk) -> Result<()> {
        Ok(())
    }

    /// Called once for every `enter_group` that succeeded, even when parsing
    /// the children failed.
    fn leave_group(&mut self, _group: &Chunk) -> Result<()> {
        Ok(())
    }

    /// A data chunk (payload present) or, when stop visitation is enabled, a
    /// stop chunk (payload absent). Property and collection chunks of a group
    /// the registry does not report arrive here too, after that group's body,
    /// with the unreported group as `parent`.
    fn visit_chunk(&mut self, parent: &Chunk, chunk: &Chunk) -> Result<()>;
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn entering_group(&mut self, group: &Chunk) -> bool {
        (**self).entering_group(group)
    }

    fn enter_group(&mut self, group: &Chunk) -> Result<()> {
        (**self).enter_group(group)
    }

    fn leave_group(&mut self, group: &Chunk) -> Result<()> {
        (**self).leave_group(group)
    }

    fn visit_chunk(&mut self, parent: &Chunk, chunk: &Chunk) -> Result<()> {
        (**self).visit_chunk(parent, chunk)
    }
}

/// Visitor that reassembles reported groups and visited chunks into a
/// [`Chunk`] tree, keeping the parser's attachments and notes.
///
/// Chunks inside groups the registry does not report are attached to the
/// nearest reported ancestor.
#[derive(Debug, Default)]
pub struct ChunkTree {
    stack: Vec<Chunk>,
    roots: Vec<Chunk>,
}

impl ChunkTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level nodes collected so far, normally a single `RIFF` group.
    pub fn roots(&self) -> &[Chunk] {
        &self.roots
    }

    pub fn into_root(self) -> Option<Chunk> {
        self.roots.into_iter().next()
    }

    fn attach(&mut self, chunk: Chunk) {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(chunk);
            }
            None => self.roots.push(chunk),
        }
    }
}

impl Visitor for ChunkTree {
    fn enter_group(&mut self, group: &Chunk) -> Result<()> {
        self.stack.push(group.clone());
        Ok(())
    }

    fn leave_group(&mut self, group: &Chunk) -> Result<()> {
        if let Some(mut built) = self.stack.pop() {
            built.declared_size = group.declared_size;
            built.properties = group.properties.clone();
            built.inherited = group.inherited.clone();
            built.collections = group.collections.clone();
            built.trailing = group.trailing.clone();
            built.note = group.note.clone();
            built.had_recovery = group.had_recovery;
            self.attach(built);
        }
        Ok(())
    }

    fn visit_chunk(&mut self, _parent: &Chunk, chunk: &Chunk) -> Result<()> {
        self.attach(chunk.clone());
        Ok(())
    }
}

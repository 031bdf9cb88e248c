//! Committed state of the in-memory store.

use std::collections::HashMap;

use threadhub_core::types::CommentId;
use threadhub_entity::{ClosureEdge, Comment, RelatedComment};

/// A comment plus the sequence number it was inserted with. The sequence
/// breaks ties between comments created within the same clock tick.
#[derive(Debug, Clone)]
pub(crate) struct StoredComment {
    pub comment: Comment,
    pub seq: u64,
}

/// Comment rows plus the closure table, indexed by descendant and by
/// ancestor.
#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    pub comments: HashMap<CommentId, StoredComment>,
    pub by_descendant: HashMap<CommentId, Vec<ClosureEdge>>,
    pub by_ancestor: HashMap<CommentId, Vec<ClosureEdge>>,
}

impl MemoryState {
    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.get(&id).map(|stored| &stored.comment)
    }

    pub fn edges_of(&self, descendant: CommentId) -> &[ClosureEdge] {
        self.by_descendant
            .get(&descendant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_edge(&self, descendant: CommentId, ancestor: CommentId) -> bool {
        self.edges_of(descendant)
            .iter()
            .any(|edge| edge.ancestor_id == ancestor)
    }

    pub fn insert_edge(&mut self, edge: ClosureEdge) {
        self.by_descendant
            .entry(edge.descendant_id)
            .or_default()
            .push(edge);
        self.by_ancestor
            .entry(edge.ancestor_id)
            .or_default()
            .push(edge);
    }

    pub fn remove_edges_of(&mut self, descendant: CommentId) -> usize {
        let Some(edges) = self.by_descendant.remove(&descendant) else {
            return 0;
        };
        for edge in &edges {
            if let Some(list) = self.by_ancestor.get_mut(&edge.ancestor_id) {
                list.retain(|e| e.descendant_id != descendant);
                if list.is_empty() {
                    self.by_ancestor.remove(&edge.ancestor_id);
                }
            }
        }
        edges.len()
    }

    /// Proper ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: CommentId) -> Vec<RelatedComment> {
        let mut related: Vec<RelatedComment> = self
            .edges_of(id)
            .iter()
            .filter(|edge| edge.depth > 0)
            .filter_map(|edge| {
                self.comment(edge.ancestor_id).map(|c| RelatedComment {
                    comment: c.clone(),
                    depth: edge.depth,
                })
            })
            .collect();
        related.sort_by_key(|r| r.depth);
        related
    }

    /// Descendants of `id` accepted by `keep`, ordered by depth then creation.
    pub fn descendants(
        &self,
        id: CommentId,
        keep: impl Fn(&ClosureEdge, &Comment) -> bool,
    ) -> Vec<RelatedComment> {
        let mut related: Vec<(RelatedComment, u64)> = self
            .by_ancestor
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(|edge| {
                let stored = self.comments.get(&edge.descendant_id)?;
                keep(edge, &stored.comment).then(|| {
                    (
                        RelatedComment {
                            comment: stored.comment.clone(),
                            depth: edge.depth,
                        },
                        stored.seq,
                    )
                })
            })
            .collect();
        related.sort_by(|(a, a_seq), (b, b_seq)| {
            a.depth
                .cmp(&b.depth)
                .then(a.comment.created_at.cmp(&b.comment.created_at))
                .then(a_seq.cmp(b_seq))
        });
        related.into_iter().map(|(r, _)| r).collect()
    }
}

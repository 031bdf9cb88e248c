//! Verification and rebuilding of the closure table.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use threadhub_core::error::AppError;
use threadhub_core::types::CommentId;
use threadhub_database::CommentStore;
use threadhub_entity::Comment;

use super::maintenance::ClosureMaintainer;

/// A disagreement between the closure table and the parent links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ClosureIssue {
    /// An ancestor of the comment has no edge.
    MissingEdge {
        /// The comment whose edge is missing.
        descendant_id: CommentId,
        /// The ancestor it should point at.
        ancestor_id: CommentId,
        /// The depth the edge should carry.
        depth: u32,
    },
    /// An edge exists but with the wrong depth.
    WrongDepth {
        /// The comment owning the edge.
        descendant_id: CommentId,
        /// The ancestor the edge points at.
        ancestor_id: CommentId,
        /// Depth implied by the parent chain.
        expected: u32,
        /// Depth stored in the edge.
        actual: u32,
    },
    /// An edge points at a comment that is not an ancestor.
    UnexpectedEdge {
        /// The comment owning the edge.
        descendant_id: CommentId,
        /// The comment the edge points at.
        ancestor_id: CommentId,
        /// Stored depth.
        depth: u32,
    },
    /// The same (descendant, ancestor) pair is stored more than once.
    DuplicateEdge {
        /// The comment owning the edges.
        descendant_id: CommentId,
        /// The ancestor the edges point at.
        ancestor_id: CommentId,
        /// How many rows share the pair.
        count: usize,
    },
    /// The parent chain loops or references a missing comment.
    BrokenParentChain {
        /// The comment whose chain cannot be followed.
        comment_id: CommentId,
    },
}

/// Result of [`ClosureRepairService::verify`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    /// Number of comments inspected.
    pub comments_checked: u64,
    /// Number of closure edges inspected.
    pub edges_checked: u64,
    /// Every disagreement found.
    pub issues: Vec<ClosureIssue>,
}

impl VerifyReport {
    /// Whether the closure table matches the parent links exactly.
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Result of [`ClosureRepairService::rebuild`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildReport {
    /// Comments whose edges were regenerated.
    pub comments_rebuilt: u64,
    /// Edges written in total.
    pub edges_written: u64,
    /// Comments left alone because their parent chain is broken.
    pub skipped: Vec<CommentId>,
}

/// Offline tooling that compares the closure table with the parent links
/// and regenerates it with the regular maintenance algorithm.
#[derive(Clone)]
pub struct ClosureRepairService {
    store: Arc<dyn CommentStore>,
    maintainer: ClosureMaintainer,
}

impl std::fmt::Debug for ClosureRepairService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureRepairService").finish_non_exhaustive()
    }
}

impl ClosureRepairService {
    /// Creates a new repair service.
    pub fn new(store: Arc<dyn CommentStore>, maintainer: ClosureMaintainer) -> Self {
        Self { store, maintainer }
    }

    /// Compare every comment's edges with the ones its parent chain implies.
    pub async fn verify(&self) -> Result<VerifyReport, AppError> {
        let comments = self.store.list_all().await?;
        let by_id: HashMap<CommentId, &Comment> = comments.iter().map(|c| (c.id, c)).collect();
        let mut report = VerifyReport::default();

        for comment in &comments {
            report.comments_checked += 1;
            let edges = self.store.find_edges(comment.id).await?;
            report.edges_checked += edges.len() as u64;

            let mut actual: HashMap<CommentId, Vec<u32>> = HashMap::with_capacity(edges.len());
            for edge in &edges {
                actual.entry(edge.ancestor_id).or_default().push(edge.depth);
            }
            for (ancestor_id, depths) in &actual {
                if depths.len() > 1 {
                    report.issues.push(ClosureIssue::DuplicateEdge {
                        descendant_id: comment.id,
                        ancestor_id: *ancestor_id,
                        count: depths.len(),
                    });
                }
            }

            let Some(expected) = expected_ancestors(comment, &by_id) else {
                report.issues.push(ClosureIssue::BrokenParentChain {
                    comment_id: comment.id,
                });
                continue;
            };

            for (ancestor_id, depth) in &expected {
                let Some(stored) = actual.get(ancestor_id) else {
                    report.issues.push(ClosureIssue::MissingEdge {
                        descendant_id: comment.id,
                        ancestor_id: *ancestor_id,
                        depth: *depth,
                    });
                    continue;
                };
                for stored in stored.iter().filter(|stored| *stored != depth) {
                    report.issues.push(ClosureIssue::WrongDepth {
                        descendant_id: comment.id,
                        ancestor_id: *ancestor_id,
                        expected: *depth,
                        actual: *stored,
                    });
                }
            }
            for (ancestor_id, depths) in &actual {
                if expected.contains_key(ancestor_id) {
                    continue;
                }
                for depth in depths {
                    report.issues.push(ClosureIssue::UnexpectedEdge {
                        descendant_id: comment.id,
                        ancestor_id: *ancestor_id,
                        depth: *depth,
                    });
                }
            }
        }

        if report.is_consistent() {
            info!(
                comments = report.comments_checked,
                edges = report.edges_checked,
                "Closure table is consistent"
            );
        } else {
            warn!(
                comments = report.comments_checked,
                issues = report.issues.len(),
                "Closure table disagrees with parent links"
            );
        }
        Ok(report)
    }

    /// Regenerate every comment's edges, parents before children, one
    /// transaction per comment.
    pub async fn rebuild(&self) -> Result<RebuildReport, AppError> {
        let comments = self.store.list_all().await?;
        let total = comments.len();

        let mut children: HashMap<CommentId, Vec<Comment>> = HashMap::new();
        let mut queue = VecDeque::new();
        for comment in comments {
            match comment.parent_id {
                Some(parent_id) => children.entry(parent_id).or_default().push(comment),
                None => queue.push_back(comment),
            }
        }

        let mut report = RebuildReport::default();
        while let Some(comment) = queue.pop_front() {
            let mut tx = self.store.begin().await?;
            let edges = match self.maintainer.populate(tx.as_mut(), &comment).await {
                Ok(edges) => edges,
                Err(e) => {
                    error!(comment_id = %comment.id, error = %e, "Closure rebuild failed");
                    tx.rollback().await?;
                    return Err(e);
                }
            };
            tx.commit().await?;

            report.comments_rebuilt += 1;
            report.edges_written += edges.len() as u64;
            if let Some(replies) = children.remove(&comment.id) {
                queue.extend(replies);
            }
        }

        report.skipped = children.into_values().flatten().map(|c| c.id).collect();
        if !report.skipped.is_empty() {
            warn!(
                skipped = report.skipped.len(),
                "Comments unreachable from a top-level comment were not rebuilt"
            );
        }

        info!(
            total,
            rebuilt = report.comments_rebuilt,
            edges = report.edges_written,
            "Closure table rebuilt"
        );
        Ok(report)
    }
}

/// Ancestors of `comment` (itself included) with their hop distance, or
/// `None` when the chain loops or leaves the known comments.
fn expected_ancestors<'a>(
    comment: &'a Comment,
    by_id: &HashMap<CommentId, &'a Comment>,
) -> Option<HashMap<CommentId, u32>> {
    let mut expected = HashMap::from([(comment.id, 0)]);
    let mut current = comment;
    let mut depth = 0;
    while let Some(parent_id) = current.parent_id {
        depth += 1;
        if expected.insert(parent_id, depth).is_some() {
            return None;
        }
        current = *by_id.get(&parent_id)?;
    }
    Some(expected)
}

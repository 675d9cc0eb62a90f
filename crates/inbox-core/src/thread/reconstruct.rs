//! Reply-chain reconstruction.
//!
//! Turns the flat, unordered message list of a conversation into the forest
//! rendered by the inbox: every message is annotated with reply flags, child
//! ids and depth, and the view exposes a nested tree in which each message
//! appears exactly once.

use super::message::Message;
use serde::Serialize;
use std::collections::HashMap;

/// A message annotated with its position in the reply forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadedMessage {
    #[serde(flatten)]
    pub message: Message,
    /// The message declares a valid (positive) parent id.
    pub is_reply: bool,
    pub has_replies: bool,
    /// Direct replies, in timestamp order.
    pub child_messages: Vec<i64>,
    /// Number of ancestor hops to a message with no resolvable parent.
    pub depth: usize,
    /// The declared parent is not part of the conversation.
    pub orphaned: bool,
    /// The ancestor walk revisited a message; `depth` is clamped.
    pub cyclic: bool,
}

impl ThreadedMessage {
    pub fn id(&self) -> i64 {
        self.message.id
    }

    /// Whether the message needs attention beyond normal rendering.
    pub fn is_anomalous(&self) -> bool {
        self.orphaned || self.cyclic
    }
}

/// A node of the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadNode<'a> {
    pub message: &'a ThreadedMessage,
    pub replies: Vec<ThreadNode<'a>>,
}

/// The reconstructed conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    /// All messages, sorted by timestamp.
    pub messages: Vec<ThreadedMessage>,
    /// Roots of the rendered tree, in timestamp order.
    pub top_level: Vec<i64>,
    #[serde(skip)]
    roots: Vec<usize>,
    #[serde(skip)]
    child_positions: Vec<Vec<usize>>,
}

impl ThreadView {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Looks up a message by id (first occurrence wins on duplicates).
    pub fn get(&self, id: i64) -> Option<&ThreadedMessage> {
        self.messages.iter().find(|m| m.message.id == id)
    }

    pub fn top_level_messages(&self) -> impl Iterator<Item = &ThreadedMessage> {
        self.roots.iter().map(|&pos| &self.messages[pos])
    }

    /// Messages flagged as orphaned or cyclic.
    pub fn anomalies(&self) -> impl Iterator<Item = &ThreadedMessage> {
        self.messages.iter().filter(|m| m.is_anomalous())
    }

    /// Builds the nested tree for rendering.
    pub fn tree(&self) -> Vec<ThreadNode<'_>> {
        let mut visited = vec![false; self.messages.len()];
        let mut nodes = Vec::with_capacity(self.roots.len());
        for &root in &self.roots {
            if !visited[root] {
                nodes.push(self.build_node(root, &mut visited));
            }
        }
        nodes
    }

    fn build_node<'a>(&'a self, pos: usize, visited: &mut [bool]) -> ThreadNode<'a> {
        visited[pos] = true;
        let mut replies = Vec::new();
        for &child in &self.child_positions[pos] {
            if !visited[child] {
                replies.push(self.build_node(child, visited));
            }
        }
        ThreadNode {
            message: &self.messages[pos],
            replies,
        }
    }
}

/// Reconstructs the reply forest of a conversation.
///
/// Orphans (a parent id that is not in `messages`) stay marked as replies but
/// are promoted to the top level. Messages caught in a parent cycle are
/// flagged `cyclic`; the earliest cycle member not reachable from another
/// root is promoted so the cycle still renders, once.
pub fn reconstruct_threads(mut messages: Vec<Message>) -> ThreadView {
    // Vec::sort_by is stable: equal timestamps keep arrival order.
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let parents: Vec<Option<i64>> = messages.iter().map(Message::parent_id).collect();

    let mut index: HashMap<i64, usize> = HashMap::with_capacity(messages.len());
    for (pos, message) in messages.iter().enumerate() {
        index.entry(message.id).or_insert(pos);
    }

    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    for (pos, parent) in parents.iter().enumerate() {
        if let Some(parent_id) = parent {
            children.entry(*parent_id).or_default().push(pos);
        }
    }

    let child_positions: Vec<Vec<usize>> = messages
        .iter()
        .map(|m| children.get(&m.id).cloned().unwrap_or_default())
        .collect();

    let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();

    let placements = resolve_placements(&parents, &index);
    let in_cycle: Vec<bool> = placements.iter().map(|p| p.on_cycle).collect();

    let mut threaded = Vec::with_capacity(messages.len());
    for (pos, message) in messages.into_iter().enumerate() {
        let parent = parents[pos];
        let orphaned = parent.is_some_and(|p| !index.contains_key(&p));

        threaded.push(ThreadedMessage {
            is_reply: parent.is_some(),
            has_replies: !child_positions[pos].is_empty(),
            child_messages: child_positions[pos].iter().map(|&c| ids[c]).collect(),
            depth: placements[pos].depth,
            orphaned,
            cyclic: placements[pos].cyclic,
            message,
        });
    }

    let roots = select_roots(&threaded, &parents, &child_positions, &in_cycle);
    let top_level = roots.iter().map(|&pos| threaded[pos].message.id).collect();

    ThreadView {
        messages: threaded,
        top_level,
        roots,
        child_positions,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Placement {
    depth: usize,
    cyclic: bool,
    /// The position is itself a member of a parent cycle.
    on_cycle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Open,
    Done,
}

/// Resolves the depth of every position in a single pass.
///
/// A walk climbs parent links until it reaches a resolved ancestor, a message
/// without a resolvable parent, or a position still open on the current path.
/// The last case closes a cycle: its members take the cycle length minus one
/// as depth. The path is then unwound so each position is resolved once.
fn resolve_placements(parents: &[Option<i64>], index: &HashMap<i64, usize>) -> Vec<Placement> {
    let mut placements = vec![Placement::default(); parents.len()];
    let mut visit = vec![Visit::New; parents.len()];
    let mut path = Vec::new();

    for start in 0..parents.len() {
        if visit[start] == Visit::Done {
            continue;
        }

        let mut current = start;
        let mut anchor = None;
        loop {
            visit[current] = Visit::Open;
            path.push(current);
            let Some(parent) = parents[current].and_then(|p| index.get(&p).copied()) else {
                break;
            };
            match visit[parent] {
                Visit::New => current = parent,
                Visit::Done => {
                    anchor = Some(parent);
                    break;
                }
                Visit::Open => {
                    let entry = path.iter().position(|&pos| pos == parent).unwrap_or(0);
                    let depth = path.len() - entry - 1;
                    for &pos in &path[entry..] {
                        placements[pos] = Placement {
                            depth,
                            cyclic: true,
                            on_cycle: true,
                        };
                        visit[pos] = Visit::Done;
                    }
                    path.truncate(entry);
                    anchor = Some(parent);
                    break;
                }
            }
        }

        while let Some(pos) = path.pop() {
            placements[pos] = match anchor {
                Some(parent) => Placement {
                    depth: placements[parent].depth + 1,
                    cyclic: placements[parent].cyclic,
                    on_cycle: false,
                },
                None => Placement::default(),
            };
            visit[pos] = Visit::Done;
            anchor = Some(pos);
        }
    }

    placements
}

fn select_roots(
    messages: &[ThreadedMessage],
    parents: &[Option<i64>],
    child_positions: &[Vec<usize>],
    in_cycle: &[bool],
) -> Vec<usize> {
    let mut roots: Vec<usize> = (0..messages.len())
        .filter(|&pos| parents[pos].is_none() || messages[pos].orphaned)
        .collect();

    let mut reachable = vec![false; messages.len()];
    for &root in &roots {
        mark_reachable(root, child_positions, &mut reachable);
    }

    let mut promoted = Vec::new();
    for pos in 0..messages.len() {
        if !reachable[pos] && in_cycle[pos] {
            promoted.push(pos);
            mark_reachable(pos, child_positions, &mut reachable);
        }
    }

    roots.extend(promoted);
    roots.sort_unstable();
    roots
}

fn mark_reachable(start: usize, child_positions: &[Vec<usize>], reachable: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(pos) = stack.pop() {
        if reachable[pos] {
            continue;
        }
        reachable[pos] = true;
        stack.extend(child_positions[pos].iter().copied());
    }
}

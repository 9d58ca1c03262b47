//! Immutable grammar graphs.
//!
//! A [`Grammar`] is an arena of [`Node`]s addressed by [`NodeId`], plus a
//! table of named rules addressed by [`RuleId`]. Rules are the only way a
//! grammar may refer to itself: a rule is declared first, referenced from
//! any expression, and defined later.
//!
//! ```ignore
//! use thicket::grammar::{GrammarBuilder, expr::*};
//!
//! let mut builder = GrammarBuilder::<char, ()>::new();
//! let list = builder.declare("list");
//! // list = 'x' list | 'x'
//! builder.define(list, terminal_any(['x']) + reference(list) | terminal_any(['x']))?;
//! let grammar = builder.build(reference(list))?;
//! ```
//!
//! [`GrammarBuilder::build`] refuses grammars the engine could not run:
//! rules that were never defined, and rules that reach themselves without
//! consuming input (left recursion).

pub mod expr;
mod node;

use index_vec::IndexVec;

pub use expr::Expr;
pub use node::{Emission, EmitFn, Hook, HookFn, Node, ReemitFn};
pub(crate) use node::set_matches;

use crate::Error;

index_vec::define_index_type! {
    /// Index of a [`Node`] in a [`Grammar`]'s arena.
    pub struct NodeId = usize;
}
index_vec::define_index_type! {
    /// Index of a named rule in a [`Grammar`].
    pub struct RuleId = usize;
}

/// A named rule of a built [`Grammar`].
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    body: NodeId,
}

impl Rule {
    /// The name the rule was declared with.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root node of the rule's definition.
    #[inline]
    pub fn body(&self) -> NodeId {
        self.body
    }
}

/// An immutable grammar graph, ready to drive a [`Forest`](crate::Forest).
///
/// `Grammar` is `Send + Sync` whenever the symbol and token types are, so
/// one grammar may back many forests on many threads.
#[derive(Debug)]
pub struct Grammar<S, T> {
    nodes: IndexVec<NodeId, Node<S, T>>,
    rules: IndexVec<RuleId, Rule>,
    nullable: IndexVec<NodeId, bool>,
    start: NodeId,
}

impl<S, T> Grammar<S, T> {
    /// The node every parse starts from.
    #[inline]
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// The node at `id`.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<S, T> {
        &self.nodes[id]
    }

    /// The rule at `id`.
    #[inline]
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    /// The name `id` was declared with.
    #[inline]
    pub fn rule_name(&self, id: RuleId) -> &str {
        self.rules[id].name()
    }

    /// Every rule, in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter_enumerated()
    }

    /// Whether `id` can complete without consuming a symbol.
    #[inline]
    pub fn nullable(&self, id: NodeId) -> bool {
        self.nullable[id]
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

///////////////
// BUILDING  //
///////////////

#[derive(Debug, Clone)]
struct RuleSlot {
    name: String,
    body: Option<NodeId>,
}

/// Two-phase constructor for a [`Grammar`].
///
/// Expressions are lowered into the arena as soon as they are handed over,
/// so the builder never holds [`Expr`] trees.
#[derive(Debug)]
pub struct GrammarBuilder<S, T> {
    nodes: IndexVec<NodeId, Node<S, T>>,
    rules: IndexVec<RuleId, RuleSlot>,
}

impl<S, T> Default for GrammarBuilder<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> GrammarBuilder<S, T> {
    /// An empty builder with no rules.
    pub fn new() -> Self {
        Self {
            nodes: IndexVec::new(),
            rules: IndexVec::new(),
        }
    }

    /// Declares a rule without defining it, so that expressions (including
    /// its own definition) can [`reference`](expr::reference) it.
    ///
    /// The returned id is a plain index into this builder's rule table and
    /// is only meaningful here. Handing it to another builder is not
    /// detected unless it is out of range there.
    pub fn declare(&mut self, name: impl Into<String>) -> RuleId {
        self.rules.push(RuleSlot {
            name: name.into(),
            body: None,
        })
    }

    /// Gives a declared rule its body. Each rule is defined exactly once.
    pub fn define(&mut self, rule: RuleId, expr: Expr<S, T>) -> Result<(), Error> {
        let Some(slot) = self.rules.get(rule) else {
            return Err(Error::UndefinedRule {
                name: unknown_rule_name(rule),
            });
        };
        if slot.body.is_some() {
            return Err(Error::RuleRedefined {
                name: slot.name.clone(),
            });
        }
        let body = self.lower(expr);
        self.rules[rule].body = Some(body);
        Ok(())
    }

    /// Declares and defines a rule in one go.
    pub fn rule(&mut self, name: impl Into<String>, expr: Expr<S, T>) -> Result<RuleId, Error> {
        let rule = self.declare(name);
        self.define(rule, expr)?;
        Ok(rule)
    }

    /// Lowers `start` and validates the whole graph.
    pub fn build(mut self, start: Expr<S, T>) -> Result<Grammar<S, T>, Error> {
        let start = self.lower(start);

        let mut rules = IndexVec::with_capacity(self.rules.len());
        for slot in self.rules {
            let Some(body) = slot.body else {
                return Err(Error::UndefinedRule { name: slot.name });
            };
            rules.push(Rule {
                name: slot.name,
                body,
            });
        }
        let dangling = self.nodes.iter().find_map(|node| match node {
            Node::Reference { rule } if rules.get(*rule).is_none() => Some(*rule),
            _ => None,
        });
        if let Some(rule) = dangling {
            return Err(Error::UndefinedRule {
                name: unknown_rule_name(rule),
            });
        }

        let nullable = compute_nullable(&self.nodes, &rules);
        let grammar = Grammar {
            nodes: self.nodes,
            rules,
            nullable,
            start,
        };
        check_left_recursion(&grammar)?;
        log::debug!(
            "built grammar: {} nodes, {} rules",
            grammar.nodes.len(),
            grammar.rules.len()
        );
        Ok(grammar)
    }

    /// Post-order lowering: children always get smaller ids than parents.
    fn lower(&mut self, expr: Expr<S, T>) -> NodeId {
        let node = match expr {
            Expr::Empty => Node::Empty,
            Expr::TerminalSet { negate, symbols } => Node::TerminalSet { negate, symbols },
            Expr::TerminalLiteral { symbols } if symbols.is_empty() => Node::Empty,
            Expr::TerminalLiteral { symbols } => Node::TerminalLiteral { symbols },
            Expr::Barrier { negate, symbols } => Node::Barrier { negate, symbols },
            Expr::Sequence(children) => Node::Sequence {
                children: children.into_iter().map(|c| self.lower(c)).collect(),
            },
            Expr::Disjunction(children) => Node::Disjunction {
                children: children.into_iter().map(|c| self.lower(c)).collect(),
            },
            Expr::Recurse(body) => Node::Recurse {
                body: self.lower(*body),
            },
            Expr::Repeat(body, count) => Node::Repeat {
                body: self.lower(*body),
                count,
            },
            Expr::Reference(rule) => Node::Reference { rule },
            Expr::Emit(body, emission) => Node::Emit {
                body: self.lower(*body),
                emission,
            },
            Expr::Reemit(body, merge) => Node::Reemit {
                body: self.lower(*body),
                merge,
            },
            Expr::Custom(hook) => Node::Custom { hook },
        };
        self.nodes.push(node)
    }
}

fn unknown_rule_name(rule: RuleId) -> String {
    format!("#{}", rule.index())
}

////////////////
// VALIDATION //
////////////////

/// Least fixpoint of "can match without input". References make this
/// cyclic, so iterate until nothing changes.
fn compute_nullable<S, T>(
    nodes: &IndexVec<NodeId, Node<S, T>>,
    rules: &IndexVec<RuleId, Rule>,
) -> IndexVec<NodeId, bool> {
    let mut nullable: IndexVec<NodeId, bool> = nodes.iter().map(|_| false).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for (id, node) in nodes.iter_enumerated() {
            if nullable[id] {
                continue;
            }
            let now = match node {
                Node::Empty | Node::Barrier { .. } | Node::Recurse { .. } => true,
                Node::TerminalSet { .. } => false,
                Node::TerminalLiteral { symbols } => symbols.is_empty(),
                Node::Sequence { children } => children.iter().all(|c| nullable[*c]),
                Node::Disjunction { children } => children.iter().any(|c| nullable[*c]),
                Node::Repeat { body, count } => *count == 0 || nullable[*body],
                Node::Reference { rule } => nullable[rules[*rule].body],
                Node::Emit { body, .. } | Node::Reemit { body, .. } => nullable[*body],
                Node::Custom { hook } => !hook.consumes_input || hook.matches_without_input,
            };
            if now {
                nullable[id] = true;
                changed = true;
            }
        }
    }
    nullable
}

/// Nodes that a branch entering `id` may enter next without consuming input.
fn entered_without_input<S, T>(grammar: &Grammar<S, T>, id: NodeId) -> Vec<NodeId> {
    match grammar.node(id) {
        Node::Sequence { children } => {
            let mut next = Vec::new();
            for child in children {
                next.push(*child);
                if !grammar.nullable(*child) {
                    break;
                }
            }
            next
        }
        Node::Disjunction { children } => children.clone(),
        Node::Recurse { body } | Node::Emit { body, .. } | Node::Reemit { body, .. } => {
            vec![*body]
        }
        Node::Repeat { body, count } if *count > 0 => vec![*body],
        Node::Reference { rule } => vec![grammar.rule(*rule).body()],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Any cycle in the "entered without input" graph must pass through a
/// reference, since the arena is otherwise a forest of trees.
fn check_left_recursion<S, T>(grammar: &Grammar<S, T>) -> Result<(), Error> {
    let mut marks: IndexVec<NodeId, Mark> = grammar.nodes.iter().map(|_| Mark::Unvisited).collect();
    let mut path = Vec::new();
    for id in grammar.nodes.indices() {
        if marks[id] == Mark::Unvisited {
            visit(grammar, id, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

fn visit<S, T>(
    grammar: &Grammar<S, T>,
    id: NodeId,
    marks: &mut IndexVec<NodeId, Mark>,
    path: &mut Vec<NodeId>,
) -> Result<(), Error> {
    marks[id] = Mark::OnPath;
    path.push(id);
    for next in entered_without_input(grammar, id) {
        match marks[next] {
            Mark::Done => {}
            Mark::Unvisited => visit(grammar, next, marks, path)?,
            Mark::OnPath => {
                let cycle_start = path.iter().rposition(|n| *n == next).unwrap_or(0);
                let name = path[cycle_start..]
                    .iter()
                    .find_map(|n| match grammar.node(*n) {
                        Node::Reference { rule } => Some(grammar.rule(*rule).name().to_owned()),
                        _ => None,
                    })
                    .unwrap_or_else(|| unknown_rule_name(RuleId::new(0)));
                return Err(Error::LeftRecursion { name });
            }
        }
    }
    path.pop();
    marks[id] = Mark::Done;
    Ok(())
}

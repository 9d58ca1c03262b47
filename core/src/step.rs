//! The per-symbol step: resolve zero-width structure, then consume.
//!
//! A branch between steps is either resting on a consuming leaf, complete,
//! or has a pending node to enter. [`Stepper::settle`] walks it through every
//! zero-width construct (forking at alternations) until each resulting branch
//! rests or completes, testing barriers against the lookahead symbol.
//! [`Stepper::advance`] then feeds the symbol to a resting branch.

use crate::branch::{Branch, Frame};
use crate::config::ParseConfig;
use crate::grammar::{Emission, Grammar, Node, NodeId, set_matches};
use crate::Error;

/// Borrowed context for one step over every branch of a forest.
pub(crate) struct Stepper<'a, S, T> {
    grammar: &'a Grammar<S, T>,
    config: &'a ParseConfig,
    /// Symbols consumed before the lookahead.
    consumed: usize,
}

impl<'a, S, T> Stepper<'a, S, T>
where
    S: Clone + PartialEq,
    T: Clone,
{
    pub(crate) fn new(grammar: &'a Grammar<S, T>, config: &'a ParseConfig, consumed: usize) -> Self {
        Self {
            grammar,
            config,
            consumed,
        }
    }

    /// Resolves `branch` and every branch forked from it, pushing those that
    /// come to rest (or complete) onto `settled`.
    ///
    /// `lookahead` is the symbol about to be fed, or `None` at end of input.
    pub(crate) fn settle(
        &self,
        branch: Branch<S, T>,
        lookahead: Option<&S>,
        settled: &mut Vec<Branch<S, T>>,
    ) -> Result<(), Error> {
        let mut work = vec![branch];
        while let Some(branch) = work.pop() {
            if let Some(rested) = self.resolve(branch, lookahead, &mut work)? {
                settled.push(rested);
            }
        }
        Ok(())
    }

    /// Feeds `symbol` to a settled branch. Returns `None` if the branch dies.
    pub(crate) fn advance(&self, mut branch: Branch<S, T>, symbol: &S) -> Option<Branch<S, T>> {
        // A complete branch has no room for more input
        let top = branch.frames.last_mut()?;
        match self.grammar.node(top.node) {
            Node::TerminalSet { negate, symbols } => {
                if !set_matches(*negate, symbols, symbol) {
                    return None;
                }
                branch.frames.pop();
            }
            Node::TerminalLiteral { symbols } => {
                if symbols.get(top.state) != Some(symbol) {
                    return None;
                }
                top.state += 1;
                if top.state == symbols.len() {
                    branch.frames.pop();
                }
            }
            Node::Custom { hook } if hook.consumes_input => {
                (hook.callback)(symbol);
                branch.frames.pop();
            }
            _ => return None,
        }
        branch.record(symbol);
        Some(branch)
    }

    /// Runs one branch until it rests, completes or dies. Forks go to `work`.
    fn resolve(
        &self,
        mut branch: Branch<S, T>,
        lookahead: Option<&S>,
        work: &mut Vec<Branch<S, T>>,
    ) -> Result<Option<Branch<S, T>>, Error> {
        loop {
            let depth = branch.frames.len();
            if depth > self.config.max_recursion_depth {
                return Err(Error::RecursionLimitExceeded {
                    depth,
                    limit: self.config.max_recursion_depth,
                });
            }
            let alive = match branch.pending.take() {
                Some(node) => self.enter(&mut branch, node, lookahead, work),
                None => {
                    let resting = match branch.frames.last() {
                        None => true,
                        Some(top) => self.grammar.node(top.node).is_consuming(),
                    };
                    if resting {
                        return Ok(Some(branch));
                    }
                    self.exit(&mut branch, work)
                }
            };
            if !alive {
                return Ok(None);
            }
        }
    }

    /// Enters `id`. Returns `false` if the branch dies.
    fn enter(
        &self,
        branch: &mut Branch<S, T>,
        id: NodeId,
        lookahead: Option<&S>,
        work: &mut Vec<Branch<S, T>>,
    ) -> bool {
        match self.grammar.node(id) {
            Node::Empty => {}
            Node::TerminalSet { .. } | Node::TerminalLiteral { .. } => {
                self.push_frame(branch, id);
            }
            Node::Barrier { negate, symbols } => {
                return barrier_passes(*negate, symbols, lookahead);
            }
            Node::Sequence { children } => match children.as_slice() {
                [] => {}
                [only] => branch.pending = Some(*only),
                [first, ..] => {
                    self.push_frame(branch, id);
                    branch.pending = Some(*first);
                }
            },
            Node::Disjunction { children } => {
                let mut viable = children
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, child)| self.viable(*child, lookahead));
                let Some((first_index, first)) = viable.next() else {
                    return false;
                };
                for (index, child) in viable {
                    let mut fork = branch.clone();
                    fork.choose(id, index, self.consumed);
                    fork.pending = Some(child);
                    work.push(fork);
                }
                branch.choose(id, first_index, self.consumed);
                branch.pending = Some(first);
            }
            Node::Recurse { body } => {
                // Loop head: leave now, or run one more iteration
                self.fork(branch, id, work);
                let mut frame = Frame::new(id, self.consumed, branch.tokens.len());
                frame.state = self.consumed;
                branch.frames.push(frame);
                branch.pending = Some(*body);
            }
            Node::Repeat { body, count } => match count {
                0 => {}
                1 => branch.pending = Some(*body),
                _ => {
                    self.push_frame(branch, id);
                    branch.pending = Some(*body);
                }
            },
            Node::Reference { rule } => {
                branch.pending = Some(self.grammar.rule(*rule).body());
            }
            Node::Emit { body, emission } => {
                if let Emission::With(_) = emission {
                    branch.open_capture(self.consumed);
                }
                self.push_frame(branch, id);
                branch.pending = Some(*body);
            }
            Node::Reemit { body, .. } => {
                self.push_frame(branch, id);
                branch.pending = Some(*body);
            }
            Node::Custom { hook } => {
                if !hook.consumes_input {
                    if let Some(symbol) = lookahead {
                        (hook.callback)(symbol);
                    }
                    return hook.matches_without_input;
                }
                if hook.matches_without_input {
                    self.fork(branch, id, work);
                }
                self.push_frame(branch, id);
            }
        }
        true
    }

    /// Returns into the top frame after its current child completed.
    /// Returns `false` if the branch dies.
    fn exit(&self, branch: &mut Branch<S, T>, work: &mut Vec<Branch<S, T>>) -> bool {
        let Some(top) = branch.frames.last_mut() else {
            return true;
        };
        let id = top.node;
        match self.grammar.node(id) {
            Node::Sequence { children } => {
                top.state += 1;
                let next = children[top.state];
                // Tail call: the last child runs without the sequence frame
                if top.state + 1 == children.len() {
                    branch.frames.pop();
                }
                branch.pending = Some(next);
            }
            Node::Repeat { body, count } => {
                top.state += 1;
                if top.state + 1 == *count {
                    branch.frames.pop();
                }
                branch.pending = Some(*body);
            }
            Node::Recurse { body } => {
                // An iteration that consumed nothing would only repeat the
                // exit already taken at the loop head
                if top.state == self.consumed {
                    return false;
                }
                top.state = self.consumed;
                let mut leave = branch.clone();
                leave.frames.pop();
                leave.choose(id, 0, self.consumed);
                work.push(leave);
                branch.choose(id, 1, self.consumed);
                branch.pending = Some(*body);
            }
            Node::Emit { emission, .. } => {
                let Some(frame) = branch.frames.pop() else {
                    return false;
                };
                let token = match emission {
                    Emission::Token(token) => token.clone(),
                    Emission::With(f) => {
                        let token = f(branch.symbols_since(frame.symbol_mark));
                        branch.close_capture();
                        token
                    }
                };
                branch.push_token(token);
            }
            Node::Reemit { merge, .. } => {
                let Some(frame) = branch.frames.pop() else {
                    return false;
                };
                let captured = branch.tokens.split_off(frame.token_mark);
                branch.push_token(merge(captured));
            }
            // Zero-width and consuming nodes never wait on a child
            Node::Empty
            | Node::TerminalSet { .. }
            | Node::TerminalLiteral { .. }
            | Node::Barrier { .. }
            | Node::Disjunction { .. }
            | Node::Reference { .. }
            | Node::Custom { .. } => {
                branch.frames.pop();
            }
        }
        true
    }

    /// Cheap pre-check so alternatives guarded by a failing barrier are never
    /// cloned.
    fn viable(&self, id: NodeId, lookahead: Option<&S>) -> bool {
        let first = match self.grammar.node(id) {
            Node::Sequence { children } => match children.first() {
                Some(first) => self.grammar.node(*first),
                None => return true,
            },
            node => node,
        };
        match first {
            Node::Barrier { negate, symbols } => barrier_passes(*negate, symbols, lookahead),
            _ => true,
        }
    }

    #[inline]
    fn push_frame(&self, branch: &mut Branch<S, T>, id: NodeId) {
        let frame = Frame::new(id, self.consumed, branch.tokens.len());
        branch.frames.push(frame);
    }

    /// Splits a two-way fork on `id`: a copy taking alternative 0 goes to
    /// `work`, and `branch` itself continues with alternative 1.
    #[inline]
    fn fork(&self, branch: &mut Branch<S, T>, id: NodeId, work: &mut Vec<Branch<S, T>>) {
        let mut other = branch.clone();
        other.choose(id, 0, self.consumed);
        work.push(other);
        branch.choose(id, 1, self.consumed);
    }
}

/// Barriers see the next symbol; at end of input only negated ones pass.
#[inline]
fn barrier_passes<S: PartialEq>(negate: bool, symbols: &[S], lookahead: Option<&S>) -> bool {
    match lookahead {
        Some(symbol) => set_matches(negate, symbols, symbol),
        None => negate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;
    use crate::grammar::expr::*;

    fn settle_all<S: Clone + PartialEq, T: Clone>(
        grammar: &Grammar<S, T>,
        consumed: usize,
        branches: Vec<Branch<S, T>>,
        lookahead: Option<&S>,
    ) -> Vec<Branch<S, T>> {
        let config = ParseConfig::default();
        let stepper = Stepper::new(grammar, &config, consumed);
        let mut settled = Vec::new();
        for branch in branches {
            stepper.settle(branch, lookahead, &mut settled).unwrap();
        }
        settled
    }

    #[test]
    fn test_disjunction_forks_per_alternative() {
        let grammar = GrammarBuilder::<char, ()>::new()
            .build(terminal_any(['a']) | terminal_any(['b']) | terminal_any(['c']))
            .unwrap();
        let settled = settle_all(&grammar, 0, vec![Branch::new(grammar.start())], Some(&'a'));
        assert_eq!(settled.len(), 3);
        assert!(settled.iter().all(|b| b.depth() == 1));
    }

    #[test]
    fn test_forks_record_distinct_choices() {
        let grammar = GrammarBuilder::<char, ()>::new()
            .build(terminal_any(['a']) | terminal(['a']))
            .unwrap();
        let settled = settle_all(&grammar, 0, vec![Branch::new(grammar.start())], Some(&'a'));
        assert_eq!(settled.len(), 2);
        assert_eq!(settled[0].derivation.len(), 1);
        assert_ne!(settled[0].key(), settled[1].key());
    }

    #[test]
    fn test_barrier_guarded_alternatives_are_not_cloned() {
        let grammar = GrammarBuilder::<char, ()>::new()
            .build(
                (barrier_any(['a']) + any())
                    | (barrier_any(['b']) + any())
                    | (barrier_not(['a']) + any()),
            )
            .unwrap();
        let settled = settle_all(&grammar, 0, vec![Branch::new(grammar.start())], Some(&'a'));
        assert_eq!(settled.len(), 1);
    }

    #[test]
    fn test_barrier_at_end_of_input() {
        let grammar = GrammarBuilder::<char, ()>::new()
            .build(barrier_not(['x']))
            .unwrap();
        let settled = settle_all(&grammar, 0, vec![Branch::new(grammar.start())], None);
        assert_eq!(settled.len(), 1);
        assert!(settled[0].is_complete());

        let grammar = GrammarBuilder::<char, ()>::new()
            .build(barrier_any(['x']))
            .unwrap();
        let settled = settle_all(&grammar, 0, vec![Branch::new(grammar.start())], None);
        assert!(settled.is_empty());
    }

    #[test]
    fn test_sequence_tail_call_pops_frame() {
        let grammar = GrammarBuilder::<char, ()>::new()
            .build(terminal_any(['a']) + terminal_any(['b']))
            .unwrap();
        let config = ParseConfig::default();
        let stepper = Stepper::new(&grammar, &config, 0);
        let mut settled = Vec::new();
        stepper
            .settle(Branch::new(grammar.start()), Some(&'a'), &mut settled)
            .unwrap();
        // sequence frame + terminal frame
        assert_eq!(settled[0].depth(), 2);
        let advanced = stepper.advance(settled.remove(0), &'a').unwrap();

        let stepper = Stepper::new(&grammar, &config, 1);
        let mut settled = Vec::new();
        stepper.settle(advanced, Some(&'b'), &mut settled).unwrap();
        // the last child runs without its sequence
        assert_eq!(settled[0].depth(), 1);
    }

    #[test]
    fn test_recursion_limit() {
        let mut builder = GrammarBuilder::<char, ()>::new();
        let nested = builder.declare("nested");
        builder
            .define(
                nested,
                terminal_any(['(']) + reference(nested) + terminal_any([')'])
                    | terminal_any(['x']),
            )
            .unwrap();
        let grammar = builder.build(reference(nested)).unwrap();
        let config = ParseConfig::new().with_max_recursion_depth(4);

        let mut branches = vec![Branch::new(grammar.start())];
        let mut consumed = 0;
        let result = loop {
            let stepper = Stepper::new(&grammar, &config, consumed);
            let mut settled = Vec::new();
            let mut failed = None;
            for branch in branches.drain(..) {
                if let Err(err) = stepper.settle(branch, Some(&'('), &mut settled) {
                    failed = Some(err);
                    break;
                }
            }
            if let Some(err) = failed {
                break err;
            }
            branches = settled
                .into_iter()
                .filter_map(|b| stepper.advance(b, &'('))
                .collect();
            consumed += 1;
        };
        assert!(matches!(
            result,
            Error::RecursionLimitExceeded { limit: 4, .. }
        ));
    }

    #[test]
    fn test_custom_hook_sees_pending_symbol() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let grammar = GrammarBuilder::<char, ()>::new()
            .build(custom(true, false, move |s: &char| {
                sink.lock().unwrap().push(*s)
            }) + any())
            .unwrap();
        let settled = settle_all(&grammar, 0, vec![Branch::new(grammar.start())], Some(&'q'));
        assert_eq!(settled.len(), 1);
        assert_eq!(*seen.lock().unwrap(), vec!['q']);
    }

    #[test]
    fn test_complete_branch_rejects_more_input() {
        let grammar = GrammarBuilder::<char, ()>::new().build(empty()).unwrap();
        let config = ParseConfig::default();
        let stepper = Stepper::new(&grammar, &config, 0);
        let mut settled = Vec::new();
        stepper
            .settle(Branch::new(grammar.start()), Some(&'a'), &mut settled)
            .unwrap();
        assert!(settled[0].is_complete());
        assert!(stepper.advance(settled.remove(0), &'a').is_none());
    }
}

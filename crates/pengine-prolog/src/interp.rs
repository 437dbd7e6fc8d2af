//! A minimal goal evaluator.
//!
//! Supports exactly what text-encoded responses need: `true`, `fail`,
//! `false`, `!`, `,/2`, `;/2`, `->/2`, `\+/1`, `call/1`, `=/2`, `member/2`,
//! plus native predicates registered by name and arity. There is no clause
//! database; anything else is an unknown procedure.
//!
//! Evaluation is continuation-passing. Each solution of a goal is handed to
//! a continuation, which decides whether to keep backtracking. Side effects
//! of natives live in the caller's state and are rolled back through
//! [`Checkpoint`] when the solver backtracks over them.

use std::cell::Cell;
use std::collections::HashMap;

use pengine_core::{HostTerm, Operators};

use crate::{Bindings, EvalError, SyntaxError, parse_term};

/// A deterministic native predicate. Receives its arguments fully resolved
/// and returns whether it succeeded.
pub type Native<S> = fn(&Interpreter<S>, &mut S, &[HostTerm]) -> Result<bool, EvalError>;

/// What a continuation tells the solver to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep backtracking.
    Fail,
    /// Stop the whole search.
    Halt,
    /// A cut to the given barrier was executed; drop alternatives up to it.
    Cut(usize),
}

type Cont<'k, S> = &'k mut dyn FnMut(&Bindings, &mut S) -> Result<Flow, EvalError>;

/// State whose changes can be undone on backtracking.
pub trait Checkpoint {
    /// Remember the current state.
    fn checkpoint(&self) -> usize;

    /// Drop every change made since `mark` was taken.
    fn rollback(&mut self, mark: usize);
}

/// Goal evaluator over caller-supplied state `S`.
pub struct Interpreter<S> {
    ops: Operators,
    natives: HashMap<(String, usize), Native<S>>,
    barriers: Cell<usize>,
}

impl<S> Interpreter<S> {
    /// Create an evaluator with no native predicates.
    #[must_use]
    pub fn new(ops: Operators) -> Self {
        Self {
            ops,
            natives: HashMap::new(),
            barriers: Cell::new(0),
        }
    }

    #[must_use]
    pub const fn operators(&self) -> &Operators {
        &self.ops
    }

    /// Register (or replace) the native predicate `name/arity`.
    pub fn register(&mut self, name: impl Into<String>, arity: usize, native: Native<S>) {
        self.natives.insert((name.into(), arity), native);
    }

    /// Read one term using this evaluator's operator table.
    ///
    /// # Errors
    /// Returns error if `text` is not a single well-formed term.
    pub fn parse(&self, text: &str) -> Result<HostTerm, SyntaxError> {
        parse_term(text, &self.ops)
    }

    fn next_barrier(&self) -> usize {
        let id = self.barriers.get() + 1;
        self.barriers.set(id);
        id
    }
}

impl<S: Checkpoint> Interpreter<S> {
    /// Run `goal`, calling `on_solution` for each solution until it returns
    /// `false` or the solutions run out.
    ///
    /// # Errors
    /// Returns the first error raised by the goal.
    pub fn execute(
        &self,
        state: &mut S,
        goal: &HostTerm,
        env: &Bindings,
        mut on_solution: impl FnMut(&Bindings, &mut S) -> bool,
    ) -> Result<(), EvalError> {
        let barrier = self.next_barrier();
        self.solve(goal, env, barrier, state, &mut |env, state| {
            Ok(if on_solution(env, state) {
                Flow::Fail
            } else {
                Flow::Halt
            })
        })?;
        Ok(())
    }

    /// First solution of `goal`, if any.
    ///
    /// # Errors
    /// Returns the first error raised by the goal.
    pub fn once(
        &self,
        state: &mut S,
        goal: &HostTerm,
        env: &Bindings,
    ) -> Result<Option<Bindings>, EvalError> {
        let mut found = None;
        self.execute(state, goal, env, |env, _| {
            found = Some(env.clone());
            false
        })?;
        Ok(found)
    }

    /// All solutions of `goal`, in order.
    ///
    /// # Errors
    /// Returns the first error raised by the goal.
    pub fn solutions(
        &self,
        state: &mut S,
        goal: &HostTerm,
        env: &Bindings,
    ) -> Result<Vec<Bindings>, EvalError> {
        let mut all = Vec::new();
        self.execute(state, goal, env, |env, _| {
            all.push(env.clone());
            true
        })?;
        Ok(all)
    }

    fn solve(
        &self,
        goal: &HostTerm,
        env: &Bindings,
        barrier: usize,
        state: &mut S,
        k: Cont<'_, S>,
    ) -> Result<Flow, EvalError> {
        let goal = env.walk(goal);
        let (name, arity) = match goal {
            HostTerm::Variable(_) => return Err(EvalError::Instantiation),
            HostTerm::Atom(name) => (name.as_str(), 0),
            HostTerm::Compound(c) => (c.functor.as_str(), c.args.len()),
            other => return Err(EvalError::type_error("callable", other)),
        };
        let args = goal.args();

        match (name, arity) {
            ("true", 0) => k(env, state),
            ("fail" | "false", 0) => Ok(Flow::Fail),
            ("!", 0) => match k(env, state)? {
                Flow::Fail => Ok(Flow::Cut(barrier)),
                other => Ok(other),
            },
            (",", 2) => {
                let rest = &args[1];
                self.solve(&args[0], env, barrier, state, &mut |env, state| {
                    self.solve(rest, env, barrier, state, &mut *k)
                })
            }
            (";", 2) => {
                let left = env.walk(&args[0]);
                if let Some(("->", 2)) = left.functor() {
                    let (cond, then) = (&left.args()[0], &left.args()[1]);
                    return self.if_then_else(cond, then, Some(&args[1]), env, barrier, state, k);
                }
                match self.solve(&args[0], env, barrier, state, &mut *k)? {
                    Flow::Fail => self.solve(&args[1], env, barrier, state, k),
                    other => Ok(other),
                }
            }
            ("->", 2) => self.if_then_else(&args[0], &args[1], None, env, barrier, state, k),
            ("\\+", 1) => {
                let mark = state.checkpoint();
                let found = self.first(&args[0], env, state)?;
                state.rollback(mark);
                match found {
                    Some(_) => Ok(Flow::Fail),
                    None => k(env, state),
                }
            }
            ("call", 1) => {
                let inner = self.next_barrier();
                match self.solve(&args[0], env, inner, state, k)? {
                    Flow::Cut(b) if b == inner => Ok(Flow::Fail),
                    other => Ok(other),
                }
            }
            ("=", 2) => {
                let mut next = env.clone();
                if next.unify(&args[0], &args[1]) {
                    k(&next, state)
                } else {
                    Ok(Flow::Fail)
                }
            }
            ("member", 2) => self.member(&args[0], &args[1], env, state, k),
            _ => {
                let Some(native) = self.natives.get(&(name.to_string(), arity)) else {
                    return Err(EvalError::UnknownProcedure {
                        name: name.to_string(),
                        arity,
                    });
                };
                let resolved: Vec<HostTerm> = args.iter().map(|a| env.resolve(a)).collect();
                let mark = state.checkpoint();
                let flow = if native(self, state, &resolved)? {
                    k(env, state)?
                } else {
                    Flow::Fail
                };
                if flow != Flow::Halt {
                    state.rollback(mark);
                }
                Ok(flow)
            }
        }
    }

    /// First solution of `goal` behind an opaque cut barrier.
    fn first(
        &self,
        goal: &HostTerm,
        env: &Bindings,
        state: &mut S,
    ) -> Result<Option<Bindings>, EvalError> {
        let mut found = None;
        let inner = self.next_barrier();
        self.solve(goal, env, inner, state, &mut |env, _| {
            found = Some(env.clone());
            Ok(Flow::Halt)
        })?;
        Ok(found)
    }

    #[allow(clippy::too_many_arguments)]
    fn if_then_else(
        &self,
        cond: &HostTerm,
        then: &HostTerm,
        otherwise: Option<&HostTerm>,
        env: &Bindings,
        barrier: usize,
        state: &mut S,
        k: Cont<'_, S>,
    ) -> Result<Flow, EvalError> {
        match (self.first(cond, env, state)?, otherwise) {
            (Some(after), _) => self.solve(then, &after, barrier, state, k),
            (None, Some(otherwise)) => self.solve(otherwise, env, barrier, state, k),
            (None, None) => Ok(Flow::Fail),
        }
    }

    fn member(
        &self,
        elem: &HostTerm,
        list: &HostTerm,
        env: &Bindings,
        state: &mut S,
        k: Cont<'_, S>,
    ) -> Result<Flow, EvalError> {
        let mut cur = env.walk(list);
        // Partial lists are not enumerated.
        while let Some((items, tail)) = cur.as_list() {
            for item in items {
                let mut next = env.clone();
                if next.unify(elem, item) {
                    match k(&next, state)? {
                        Flow::Fail => {}
                        other => return Ok(other),
                    }
                }
            }
            if tail.is_nil() {
                break;
            }
            cur = env.walk(tail);
        }
        Ok(Flow::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<HostTerm>);

    impl Checkpoint for Log {
        fn checkpoint(&self) -> usize {
            self.0.len()
        }

        fn rollback(&mut self, mark: usize) {
            self.0.truncate(mark);
        }
    }

    fn record(_: &Interpreter<Log>, log: &mut Log, args: &[HostTerm]) -> Result<bool, EvalError> {
        log.0.push(args[0].clone());
        Ok(true)
    }

    fn interp() -> Interpreter<Log> {
        let mut i = Interpreter::new(Operators::default());
        i.register("record", 1, record);
        i
    }

    fn solutions_of(text: &str, var: &str) -> Vec<HostTerm> {
        let i = interp();
        let goal = i.parse(text).unwrap();
        i.solutions(&mut Log::default(), &goal, &Bindings::new())
            .unwrap()
            .iter()
            .map(|b| b.resolve(&HostTerm::var(var)))
            .collect()
    }

    #[test]
    fn test_member_enumerates_in_order() {
        assert_eq!(
            solutions_of("member(X, [a, b, c])", "X"),
            vec![HostTerm::atom("a"), HostTerm::atom("b"), HostTerm::atom("c")]
        );
        assert!(solutions_of("member(X, [])", "X").is_empty());
    }

    #[test]
    fn test_disjunction_and_cut() {
        assert_eq!(
            solutions_of("(X = 1 ; X = 2)", "X"),
            vec![HostTerm::from(1), HostTerm::from(2)]
        );
        assert_eq!(
            solutions_of("member(X, [1,2,3]), !", "X"),
            vec![HostTerm::from(1)]
        );
        assert_eq!(
            solutions_of("call((member(X, [1,2]), !)) ; X = 3", "X"),
            vec![HostTerm::from(1), HostTerm::from(3)]
        );
    }

    #[test]
    fn test_if_then_else() {
        assert_eq!(
            solutions_of("( member(L, [x, y]) -> X = L ; X = none )", "X"),
            vec![HostTerm::atom("x")]
        );
        assert_eq!(
            solutions_of("( member(L, []) -> X = L ; X = none )", "X"),
            vec![HostTerm::atom("none")]
        );
        assert!(solutions_of("( fail -> X = 1 )", "X").is_empty());
        assert_eq!(
            solutions_of("\\+ member(z, [a]), X = ok", "X"),
            vec![HostTerm::atom("ok")]
        );
    }

    #[test]
    fn test_natives_receive_resolved_args() {
        let i = interp();
        let goal = i.parse("X = f(Y), Y = 1, record(X)").unwrap();
        let mut log = Log::default();
        assert!(i.once(&mut log, &goal, &Bindings::new()).unwrap().is_some());
        assert_eq!(
            log.0,
            vec![HostTerm::compound("f", vec![HostTerm::from(1)])]
        );
    }

    #[test]
    fn test_backtracking_rolls_back_native_effects() {
        let i = interp();
        let mut log = Log::default();
        let goal = i.parse("(record(a), fail ; record(b)), (\\+ record(c) ; true)").unwrap();
        assert!(i.once(&mut log, &goal, &Bindings::new()).unwrap().is_some());
        assert_eq!(log.0, vec![HostTerm::atom("b")]);

        let mut log = Log::default();
        let cut = i.parse("(record(x), !, fail ; record(y))").unwrap();
        assert!(i.once(&mut log, &cut, &Bindings::new()).unwrap().is_none());
        assert!(log.0.is_empty());
    }

    #[test]
    fn test_member_walks_bound_tail() {
        let i = interp();
        let goal = i.parse("T = [c], member(X, [a, b | T])").unwrap();
        let found: Vec<HostTerm> = i
            .solutions(&mut Log::default(), &goal, &Bindings::new())
            .unwrap()
            .iter()
            .map(|b| b.resolve(&HostTerm::var("X")))
            .collect();
        assert_eq!(
            found,
            vec![HostTerm::atom("a"), HostTerm::atom("b"), HostTerm::atom("c")]
        );
    }

    #[test]
    fn test_errors() {
        let i = interp();
        let mut log = Log::default();
        let unknown = i.parse("nope(1)").unwrap();
        assert_eq!(
            i.once(&mut log, &unknown, &Bindings::new()),
            Err(EvalError::UnknownProcedure {
                name: "nope".into(),
                arity: 1
            })
        );
        let unbound = i.parse("call(G)").unwrap();
        assert_eq!(
            i.once(&mut log, &unbound, &Bindings::new()),
            Err(EvalError::Instantiation)
        );
        let number = HostTerm::from(3);
        assert!(matches!(
            i.once(&mut log, &number, &Bindings::new()),
            Err(EvalError::Type { .. })
        ));
    }
}

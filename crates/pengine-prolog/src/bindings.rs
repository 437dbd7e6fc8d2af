//! Variable bindings and unification.

use std::collections::HashMap;

use pengine_core::HostTerm;
use pengine_core::host::{Compound, List};

/// A substitution from variable names to terms.
///
/// Bindings may chain (`X = Y, Y = 1`); [`Bindings::resolve`] follows them.
/// There is no occurs check, so cyclic bindings are possible; `resolve`
/// stops at a variable it is already expanding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    map: HashMap<String, HostTerm>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct binding of `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HostTerm> {
        self.map.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over direct bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostTerm)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Follow variable-to-variable bindings until reaching a non-variable
    /// or an unbound variable.
    #[must_use]
    pub fn walk<'a>(&'a self, mut term: &'a HostTerm) -> &'a HostTerm {
        // A chain can visit each binding at most once unless it is cyclic.
        for _ in 0..=self.map.len() {
            match term {
                HostTerm::Variable(name) => match self.map.get(name) {
                    Some(next) => term = next,
                    None => return term,
                },
                _ => return term,
            }
        }
        term
    }

    /// Substitute all bound variables in `term`, recursively.
    ///
    /// List tails bound to further lists are followed in a loop, so the
    /// result is one flat list however the list was built up.
    #[must_use]
    pub fn resolve(&self, term: &HostTerm) -> HostTerm {
        let mut expanding = Vec::new();
        self.resolve_inner(term, &mut expanding)
    }

    fn resolve_inner(&self, term: &HostTerm, expanding: &mut Vec<String>) -> HostTerm {
        match term {
            HostTerm::Variable(name) => {
                if expanding.contains(name) {
                    return term.clone();
                }
                match self.map.get(name) {
                    Some(bound) => {
                        expanding.push(name.clone());
                        let out = self.resolve_inner(bound, expanding);
                        expanding.pop();
                        out
                    }
                    None => term.clone(),
                }
            }
            HostTerm::Compound(c) => HostTerm::Compound(Compound {
                functor: c.functor.clone(),
                args: c
                    .args
                    .iter()
                    .map(|arg| self.resolve_inner(arg, expanding))
                    .collect(),
            }),
            HostTerm::List(list) => self.resolve_list(list, expanding),
            _ => term.clone(),
        }
    }

    fn resolve_list(&self, list: &List, expanding: &mut Vec<String>) -> HostTerm {
        let mark = expanding.len();
        let mut items = Vec::new();
        let mut cur = list;
        let tail = loop {
            items.extend(cur.items().iter().map(|item| self.resolve_inner(item, expanding)));
            let mut tail = cur.tail();
            while let HostTerm::Variable(name) = tail {
                if expanding.contains(name) {
                    break;
                }
                let Some(bound) = self.map.get(name) else {
                    break;
                };
                expanding.push(name.clone());
                tail = bound;
            }
            match tail {
                HostTerm::List(next) => cur = next,
                HostTerm::Variable(_) => break tail.clone(),
                other => break self.resolve_inner(other, expanding),
            }
        };
        expanding.truncate(mark);
        HostTerm::list_with_tail(items, tail)
    }

    /// Unify `a` with `b`, extending these bindings.
    ///
    /// On failure the bindings are left exactly as they were.
    pub fn unify(&mut self, a: &HostTerm, b: &HostTerm) -> bool {
        let mut trail = Vec::new();
        let ok = self.unify_inner(a, b, &mut trail);
        if !ok {
            for name in trail {
                self.map.remove(&name);
            }
        }
        ok
    }

    fn unify_inner(&mut self, a: &HostTerm, b: &HostTerm, trail: &mut Vec<String>) -> bool {
        let mut pending = vec![(a.clone(), b.clone())];
        while let Some((x, y)) = pending.pop() {
            let x = self.walk(&x).clone();
            let y = self.walk(&y).clone();
            match (x, y) {
                (HostTerm::Variable(v), HostTerm::Variable(w)) if v == w => {}
                (HostTerm::Variable(v), other) | (other, HostTerm::Variable(v)) => {
                    trail.push(v.clone());
                    self.map.insert(v, other);
                }
                (HostTerm::Compound(c), HostTerm::Compound(d)) => {
                    if c.functor != d.functor || c.args.len() != d.args.len() {
                        return false;
                    }
                    pending.extend(c.args.into_iter().zip(d.args));
                }
                (HostTerm::List(l), HostTerm::List(m)) => {
                    let ((xs, xt), (ys, yt)) = (l.into_parts(), m.into_parts());
                    let n = xs.len().min(ys.len());
                    let mut xs = xs.into_iter();
                    let mut ys = ys.into_iter();
                    pending.extend(xs.by_ref().zip(ys.by_ref()).take(n));
                    // The longer side keeps its leftover elements in front of its tail.
                    let rest_x = HostTerm::list_with_tail(xs, xt);
                    let rest_y = HostTerm::list_with_tail(ys, yt);
                    pending.push((rest_x, rest_y));
                }
                (x, y) => {
                    if x != y {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(args: Vec<HostTerm>) -> HostTerm {
        HostTerm::compound("f", args)
    }

    #[test]
    fn test_unify_binds_both_ways() {
        let mut b = Bindings::new();
        assert!(b.unify(
            &f(vec![HostTerm::var("X"), HostTerm::from(2)]),
            &f(vec![HostTerm::from(1), HostTerm::var("Y")])
        ));
        assert_eq!(b.resolve(&HostTerm::var("X")), HostTerm::from(1));
        assert_eq!(b.resolve(&HostTerm::var("Y")), HostTerm::from(2));
    }

    #[test]
    fn test_failed_unify_leaves_bindings_untouched() {
        let mut b = Bindings::new();
        assert!(!b.unify(
            &f(vec![HostTerm::var("X"), HostTerm::from(2)]),
            &f(vec![HostTerm::from(1), HostTerm::from(3)])
        ));
        assert!(b.is_empty());
        assert!(!b.unify(&HostTerm::from(1), &HostTerm::from(1.0)));
    }

    #[test]
    fn test_chained_and_cyclic_bindings() {
        let mut b = Bindings::new();
        assert!(b.unify(&HostTerm::var("X"), &HostTerm::var("Y")));
        assert!(b.unify(&HostTerm::var("Y"), &HostTerm::atom("a")));
        assert_eq!(b.resolve(&HostTerm::var("X")), HostTerm::atom("a"));

        let mut cyclic = Bindings::new();
        assert!(cyclic.unify(&HostTerm::var("Z"), &f(vec![HostTerm::var("Z")])));
        assert_eq!(
            cyclic.resolve(&HostTerm::var("Z")),
            f(vec![HostTerm::var("Z")])
        );
    }

    #[test]
    fn test_unify_lists_of_different_shape() {
        let atoms = |names: &[&str]| names.iter().map(|n| HostTerm::atom(*n)).collect::<Vec<_>>();
        let mut b = Bindings::new();
        // [a, b, c] = [X | T]
        assert!(b.unify(
            &HostTerm::list(atoms(&["a", "b", "c"])),
            &HostTerm::list_with_tail(vec![HostTerm::var("X")], HostTerm::var("T"))
        ));
        assert_eq!(b.resolve(&HostTerm::var("X")), HostTerm::atom("a"));
        assert_eq!(b.resolve(&HostTerm::var("T")), HostTerm::list(atoms(&["b", "c"])));

        // [a | T] = [a, b] fails once T is bound to [b, c].
        let mut failed = b.clone();
        assert!(!failed.unify(
            &HostTerm::list_with_tail(atoms(&["a"]), HostTerm::var("T")),
            &HostTerm::list(atoms(&["a", "b"]))
        ));
        assert_eq!(failed, b);
        assert!(!b.unify(&HostTerm::list(atoms(&["a"])), &HostTerm::nil()));
    }

    #[test]
    fn test_resolve_joins_bound_tails() {
        let mut b = Bindings::new();
        assert!(b.unify(
            &HostTerm::var("T1"),
            &HostTerm::list_with_tail(vec![HostTerm::from(2)], HostTerm::var("T2"))
        ));
        assert!(b.unify(&HostTerm::var("T2"), &HostTerm::list(vec![HostTerm::from(3)])));
        let whole = b.resolve(&HostTerm::list_with_tail(vec![HostTerm::from(1)], HostTerm::var("T1")));
        assert_eq!(
            whole,
            HostTerm::list(vec![HostTerm::from(1), HostTerm::from(2), HostTerm::from(3)])
        );

        let mut cyclic = Bindings::new();
        let looped = HostTerm::list_with_tail(vec![HostTerm::atom("a")], HostTerm::var("L"));
        assert!(cyclic.unify(&HostTerm::var("L"), &looped));
        assert_eq!(cyclic.resolve(&HostTerm::var("L")), looped);
    }
}

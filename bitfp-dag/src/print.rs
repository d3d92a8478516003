//! SMT-LIB 2 printing for debugging encodings.

use std::fmt::Write as _;

use crate::dag::{TermDag, TermId, TermKind};

impl TermDag {
    /// Render the term reachable from `root` as an SMT-LIB 2 expression.
    ///
    /// Shared subterms are bound once in a chain of `let`s, so the output
    /// size is linear in the dag, not in the unfolded tree. Width-1
    /// comparison results are materialised with `(ite ... #b1 #b0)` to keep
    /// the output well sorted for an SMT-LIB reader.
    #[must_use]
    pub fn to_smtlib(&self, root: TermId) -> String {
        // Ids are topologically ordered by construction: children always
        // precede parents in the arena.
        let mut reachable = vec![false; self.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if reachable[id.index()] {
                continue;
            }
            reachable[id.index()] = true;
            match self.kind(id) {
                TermKind::Const { .. } | TermKind::Var { .. } => {}
                TermKind::Not(a) | TermKind::Neg(a) => stack.push(*a),
                TermKind::Extract { arg, .. }
                | TermKind::ZeroExtend { arg, .. }
                | TermKind::SignExtend { arg, .. } => stack.push(*arg),
                TermKind::And(a, b)
                | TermKind::Or(a, b)
                | TermKind::Xor(a, b)
                | TermKind::Add(a, b)
                | TermKind::Sub(a, b)
                | TermKind::Mul(a, b)
                | TermKind::Shl(a, b)
                | TermKind::Lshr(a, b)
                | TermKind::Ashr(a, b)
                | TermKind::Concat(a, b)
                | TermKind::Ult(a, b)
                | TermKind::Ule(a, b)
                | TermKind::Slt(a, b)
                | TermKind::Sle(a, b)
                | TermKind::Eq(a, b) => {
                    stack.push(*a);
                    stack.push(*b);
                }
                TermKind::Ite { cond, then, els } => {
                    stack.push(*cond);
                    stack.push(*then);
                    stack.push(*els);
                }
            }
        }

        let mut out = String::new();
        let mut lets = 0usize;
        for (index, seen) in reachable.iter().enumerate() {
            if !*seen {
                continue;
            }
            let id = TermId::from_index(index);
            if matches!(self.kind(id), TermKind::Const { .. } | TermKind::Var { .. }) {
                continue;
            }
            if id == root {
                continue;
            }
            let _ = writeln!(out, "(let ((t{} {}))", index, self.render(id));
            lets += 1;
        }
        out.push_str(&self.render_atom_or_root(root));
        for _ in 0..lets {
            out.push(')');
        }
        out
    }

    fn render_atom_or_root(&self, id: TermId) -> String {
        match self.kind(id) {
            TermKind::Const { .. } | TermKind::Var { .. } => self.atom(id),
            _ => self.render(id),
        }
    }

    /// One operator applied to already-named operands.
    fn render(&self, id: TermId) -> String {
        let a = |x: &TermId| self.atom(*x);
        match self.kind(id) {
            TermKind::Const { .. } | TermKind::Var { .. } => self.atom(id),
            TermKind::Not(x) => format!("(bvnot {})", a(x)),
            TermKind::Neg(x) => format!("(bvneg {})", a(x)),
            TermKind::And(x, y) => format!("(bvand {} {})", a(x), a(y)),
            TermKind::Or(x, y) => format!("(bvor {} {})", a(x), a(y)),
            TermKind::Xor(x, y) => format!("(bvxor {} {})", a(x), a(y)),
            TermKind::Add(x, y) => format!("(bvadd {} {})", a(x), a(y)),
            TermKind::Sub(x, y) => format!("(bvsub {} {})", a(x), a(y)),
            TermKind::Mul(x, y) => format!("(bvmul {} {})", a(x), a(y)),
            TermKind::Shl(x, y) => format!("(bvshl {} {})", a(x), a(y)),
            TermKind::Lshr(x, y) => format!("(bvlshr {} {})", a(x), a(y)),
            TermKind::Ashr(x, y) => format!("(bvashr {} {})", a(x), a(y)),
            TermKind::Concat(x, y) => format!("(concat {} {})", a(x), a(y)),
            TermKind::Extract { hi, lo, arg } => {
                format!("((_ extract {hi} {lo}) {})", a(arg))
            }
            TermKind::ZeroExtend { by, arg } => {
                format!("((_ zero_extend {by}) {})", a(arg))
            }
            TermKind::SignExtend { by, arg } => {
                format!("((_ sign_extend {by}) {})", a(arg))
            }
            TermKind::Ult(x, y) => format!("(ite (bvult {} {}) #b1 #b0)", a(x), a(y)),
            TermKind::Ule(x, y) => format!("(ite (bvule {} {}) #b1 #b0)", a(x), a(y)),
            TermKind::Slt(x, y) => format!("(ite (bvslt {} {}) #b1 #b0)", a(x), a(y)),
            TermKind::Sle(x, y) => format!("(ite (bvsle {} {}) #b1 #b0)", a(x), a(y)),
            TermKind::Eq(x, y) => format!("(ite (= {} {}) #b1 #b0)", a(x), a(y)),
            TermKind::Ite { cond, then, els } => {
                format!("(ite (= {} #b1) {} {})", a(cond), a(then), a(els))
            }
        }
    }

    /// Leaf syntax: constants and variables print in place, everything else
    /// refers to its `let` binding.
    fn atom(&self, id: TermId) -> String {
        match self.kind(id) {
            TermKind::Const { width, value } => format!("(_ bv{value} {width})"),
            TermKind::Var { name, .. } => name.clone(),
            _ => format!("t{}", id.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_let_bound_smtlib() {
        let mut dag = TermDag::new();
        let x = dag.mk_var(8, "x");
        let one = dag.mk_const_u64(8, 1);
        let inc = dag.mk_add(x, one);
        let double = dag.mk_add(inc, inc);
        let text = dag.to_smtlib(double);
        assert!(text.contains("(bvadd x (_ bv1 8))"));
        // The shared increment is bound once.
        assert_eq!(text.matches("bvadd x").count(), 1);
    }
}

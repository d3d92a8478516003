//! Constant evaluation of terms under a variable assignment.

use num_bigint::BigUint;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::arith;
use crate::dag::{TermDag, TermId, TermKind};

/// Failure to evaluate a term to a constant.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A variable reachable from the root has no value in the assignment.
    #[error("variable `{name}` (width {width}) has no assigned value")]
    UnassignedVariable {
        /// Name of the variable.
        name: String,
        /// Width of the variable.
        width: u32,
    },
}

impl TermDag {
    /// Evaluate `root` under `env`, which assigns values to variables.
    ///
    /// Values in `env` are reduced modulo the variable's width. Evaluation
    /// is iterative and memoised, so shared subterms are computed once.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnassignedVariable`] when a reachable variable
    /// is missing from `env`.
    pub fn eval(
        &self,
        root: TermId,
        env: &FxHashMap<TermId, BigUint>,
    ) -> Result<BigUint, EvalError> {
        let mut memo: FxHashMap<TermId, BigUint> = FxHashMap::default();
        let mut stack: SmallVec<[(TermId, bool); 64]> = SmallVec::new();
        stack.push((root, false));

        while let Some((id, expanded)) = stack.pop() {
            if memo.contains_key(&id) {
                continue;
            }
            if !expanded {
                stack.push((id, true));
                for child in children(self.kind(id)) {
                    if !memo.contains_key(&child) {
                        stack.push((child, false));
                    }
                }
                continue;
            }
            let value = self.step(id, env, &memo)?;
            memo.insert(id, value);
        }

        tracing::trace!(terms = memo.len(), "evaluated term dag");
        let result = memo.remove(&root).expect("root evaluated");
        Ok(result)
    }

    fn step(
        &self,
        id: TermId,
        env: &FxHashMap<TermId, BigUint>,
        memo: &FxHashMap<TermId, BigUint>,
    ) -> Result<BigUint, EvalError> {
        let v = |child: &TermId| -> &BigUint { &memo[child] };
        let w = self.width(id);
        let truth = |b: bool| BigUint::from(u8::from(b));

        Ok(match self.kind(id) {
            TermKind::Const { value, .. } => value.clone(),
            TermKind::Var { width, name } => match env.get(&id) {
                Some(value) => arith::norm(*width, value),
                None => {
                    return Err(EvalError::UnassignedVariable {
                        name: name.clone(),
                        width: *width,
                    })
                }
            },
            TermKind::Not(a) => arith::not(w, v(a)),
            TermKind::Neg(a) => arith::neg(w, v(a)),
            TermKind::And(a, b) => arith::and(w, v(a), v(b)),
            TermKind::Or(a, b) => arith::or(w, v(a), v(b)),
            TermKind::Xor(a, b) => arith::xor(w, v(a), v(b)),
            TermKind::Add(a, b) => arith::add(w, v(a), v(b)),
            TermKind::Sub(a, b) => arith::sub(w, v(a), v(b)),
            TermKind::Mul(a, b) => arith::mul(w, v(a), v(b)),
            TermKind::Shl(a, b) => arith::shl(w, v(a), v(b)),
            TermKind::Lshr(a, b) => arith::lshr(w, v(a), v(b)),
            TermKind::Ashr(a, b) => arith::ashr(w, v(a), v(b)),
            TermKind::Concat(hi, lo) => arith::concat(self.width(*lo), v(hi), v(lo)),
            TermKind::Extract { hi, lo, arg } => arith::extract(v(arg), *hi, *lo),
            TermKind::ZeroExtend { arg, .. } => v(arg).clone(),
            TermKind::SignExtend { by, arg } => {
                arith::sign_extend(self.width(*arg), *by, v(arg))
            }
            TermKind::Ult(a, b) => truth(arith::ult(v(a), v(b))),
            TermKind::Ule(a, b) => truth(arith::ule(v(a), v(b))),
            TermKind::Slt(a, b) => truth(arith::slt(self.width(*a), v(a), v(b))),
            TermKind::Sle(a, b) => truth(arith::sle(self.width(*a), v(a), v(b))),
            TermKind::Eq(a, b) => truth(v(a) == v(b)),
            TermKind::Ite { cond, then, els } => {
                if v(cond).bit(0) {
                    v(then).clone()
                } else {
                    v(els).clone()
                }
            }
        })
    }
}

fn children(kind: &TermKind) -> SmallVec<[TermId; 3]> {
    match kind {
        TermKind::Const { .. } | TermKind::Var { .. } => SmallVec::new(),
        TermKind::Not(a) | TermKind::Neg(a) => SmallVec::from_slice(&[*a]),
        TermKind::Extract { arg, .. }
        | TermKind::ZeroExtend { arg, .. }
        | TermKind::SignExtend { arg, .. } => SmallVec::from_slice(&[*arg]),
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
        | TermKind::Eq(a, b) => SmallVec::from_slice(&[*a, *b]),
        TermKind::Ite { cond, then, els } => SmallVec::from_slice(&[*cond, *then, *els]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_shared_subterms_once() {
        let mut dag = TermDag::new();
        let x = dag.mk_var(16, "x");
        let sq = dag.mk_mul(x, x);
        let twice = dag.mk_add(sq, sq);

        let mut env = FxHashMap::default();
        env.insert(x, BigUint::from(7u32));
        assert_eq!(dag.eval(twice, &env).unwrap(), BigUint::from(98u32));
    }

    #[test]
    fn unassigned_variable_reports_name() {
        let mut dag = TermDag::new();
        let x = dag.mk_var(4, "missing");
        let err = dag.eval(x, &FxHashMap::default()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn ite_selects_by_condition_bit() {
        let mut dag = TermDag::new();
        let p = dag.mk_var(1, "p");
        let a = dag.mk_const_u64(8, 10);
        let b = dag.mk_const_u64(8, 20);
        let sel = dag.mk_ite(p, a, b);

        let mut env = FxHashMap::default();
        env.insert(p, BigUint::from(1u32));
        assert_eq!(dag.eval(sel, &env).unwrap(), BigUint::from(10u32));
        env.insert(p, BigUint::from(0u32));
        assert_eq!(dag.eval(sel, &env).unwrap(), BigUint::from(20u32));
    }
}

//! Term arena, hash-consing and constructors.

use num_bigint::BigUint;
use num_traits::Zero;
use rustc_hash::FxHashMap;

use crate::arith;

/// Handle to a term in a [`TermDag`].
///
/// Handles are plain indices: they are `Copy`, order-stable and only
/// meaningful together with the dag that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Index of this term in its dag.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("term arena overflow"))
    }
}

/// The operator vocabulary of the dag.
///
/// Comparison operators and `ite` conditions use width-1 bit vectors, so a
/// separate Boolean sort never appears.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Literal constant, reduced modulo `2^width`.
    Const {
        /// Bit width.
        width: u32,
        /// Value in `[0, 2^width)`.
        value: BigUint,
    },
    /// Free variable.
    Var {
        /// Bit width.
        width: u32,
        /// Name, unique per (name, width) pair.
        name: String,
    },
    /// Bitwise complement.
    Not(TermId),
    /// Two's-complement negation.
    Neg(TermId),
    /// Bitwise and.
    And(TermId, TermId),
    /// Bitwise or.
    Or(TermId, TermId),
    /// Bitwise xor.
    Xor(TermId, TermId),
    /// Modular addition.
    Add(TermId, TermId),
    /// Modular subtraction.
    Sub(TermId, TermId),
    /// Modular multiplication.
    Mul(TermId, TermId),
    /// Left shift (amount is the second operand, same width).
    Shl(TermId, TermId),
    /// Logical right shift.
    Lshr(TermId, TermId),
    /// Arithmetic right shift.
    Ashr(TermId, TermId),
    /// Concatenation; the first operand occupies the upper bits.
    Concat(TermId, TermId),
    /// Bit extraction, inclusive of both end points.
    Extract {
        /// Upper bit index.
        hi: u32,
        /// Lower bit index.
        lo: u32,
        /// Operand.
        arg: TermId,
    },
    /// Zero extension by `by` bits.
    ZeroExtend {
        /// Number of bits added.
        by: u32,
        /// Operand.
        arg: TermId,
    },
    /// Sign extension by `by` bits.
    SignExtend {
        /// Number of bits added.
        by: u32,
        /// Operand.
        arg: TermId,
    },
    /// Unsigned less-than, width-1 result.
    Ult(TermId, TermId),
    /// Unsigned less-or-equal, width-1 result.
    Ule(TermId, TermId),
    /// Signed less-than, width-1 result.
    Slt(TermId, TermId),
    /// Signed less-or-equal, width-1 result.
    Sle(TermId, TermId),
    /// Equality, width-1 result.
    Eq(TermId, TermId),
    /// If-then-else; the condition is a width-1 term.
    Ite {
        /// Width-1 condition.
        cond: TermId,
        /// Value when the condition is 1.
        then: TermId,
        /// Value when the condition is 0.
        els: TermId,
    },
}

/// A term: its operator and its width.
#[derive(Debug, Clone)]
pub struct Term {
    /// Operator and operands.
    pub kind: TermKind,
    /// Bit width of the term's value.
    pub width: u32,
}

/// Branch-likelihood hint attached to a width-1 term.
///
/// Hints never change the meaning of a term; a downstream solver may use
/// them to bias decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Likelihood {
    /// The proposition is expected to hold on most inputs.
    Likely,
    /// The proposition is expected to fail on most inputs.
    Unlikely,
    /// The proposition holds only on rare corner inputs.
    VeryUnlikely,
}

/// Append-only, hash-consed term arena.
///
/// Building the same term twice yields the same [`TermId`]. Constructors
/// assert their width contracts and fold constant operands eagerly, so a
/// term built entirely from constants is itself a constant node.
#[derive(Debug, Default)]
pub struct TermDag {
    terms: Vec<Term>,
    cache: FxHashMap<TermKind, TermId>,
    annotations: FxHashMap<TermId, Likelihood>,
}

impl TermDag {
    /// Create an empty dag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when no terms have been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Look up a term.
    ///
    /// # Panics
    ///
    /// Panics when the handle does not belong to this dag.
    #[must_use]
    pub fn get(&self, id: TermId) -> &Term {
        &self.terms[id.index()]
    }

    /// Width of a term.
    #[must_use]
    pub fn width(&self, id: TermId) -> u32 {
        self.get(id).width
    }

    /// Operator of a term.
    #[must_use]
    pub fn kind(&self, id: TermId) -> &TermKind {
        &self.get(id).kind
    }

    /// The constant value of a term, when it is a constant node.
    #[must_use]
    pub fn const_value(&self, id: TermId) -> Option<&BigUint> {
        match &self.get(id).kind {
            TermKind::Const { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Attach a likelihood hint to a width-1 term.
    pub fn annotate(&mut self, id: TermId, likelihood: Likelihood) {
        assert_eq!(self.width(id), 1, "likelihood hints apply to propositions");
        self.annotations.insert(id, likelihood);
    }

    /// Read back a likelihood hint.
    #[must_use]
    pub fn annotation(&self, id: TermId) -> Option<Likelihood> {
        self.annotations.get(&id).copied()
    }

    fn intern(&mut self, kind: TermKind, width: u32) -> TermId {
        if let Some(&id) = self.cache.get(&kind) {
            return id;
        }
        let id = TermId(u32::try_from(self.terms.len()).expect("term arena overflow"));
        self.cache.insert(kind.clone(), id);
        self.terms.push(Term { kind, width });
        id
    }

    /// Build a constant, reducing the value modulo `2^width`.
    pub fn mk_const(&mut self, width: u32, value: BigUint) -> TermId {
        assert!(width > 0, "zero-width term");
        let value = arith::norm(width, &value);
        self.intern(TermKind::Const { width, value }, width)
    }

    /// Build a constant from a machine integer.
    pub fn mk_const_u64(&mut self, width: u32, value: u64) -> TermId {
        self.mk_const(width, BigUint::from(value))
    }

    /// The width-1 constant 1.
    pub fn mk_true(&mut self) -> TermId {
        self.mk_const_u64(1, 1)
    }

    /// The width-1 constant 0.
    pub fn mk_false(&mut self) -> TermId {
        self.mk_const_u64(1, 0)
    }

    /// Build (or look up) a free variable.
    pub fn mk_var(&mut self, width: u32, name: &str) -> TermId {
        assert!(width > 0, "zero-width term");
        self.intern(
            TermKind::Var {
                width,
                name: name.to_owned(),
            },
            width,
        )
    }

    /// Bitwise complement.
    pub fn mk_not(&mut self, a: TermId) -> TermId {
        let w = self.width(a);
        if let Some(v) = self.const_value(a) {
            let folded = arith::not(w, v);
            return self.mk_const(w, folded);
        }
        // not(not(x)) = x
        if let TermKind::Not(inner) = *self.kind(a) {
            return inner;
        }
        self.intern(TermKind::Not(a), w)
    }

    /// Two's-complement negation.
    pub fn mk_neg(&mut self, a: TermId) -> TermId {
        let w = self.width(a);
        if let Some(v) = self.const_value(a) {
            let folded = arith::neg(w, v);
            return self.mk_const(w, folded);
        }
        self.intern(TermKind::Neg(a), w)
    }

    /// Bitwise and.
    pub fn mk_and(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::And, arith::and)
    }

    /// Bitwise or.
    pub fn mk_or(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Or, arith::or)
    }

    /// Bitwise xor.
    pub fn mk_xor(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Xor, arith::xor)
    }

    /// Modular addition.
    pub fn mk_add(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Add, arith::add)
    }

    /// Modular subtraction.
    pub fn mk_sub(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Sub, arith::sub)
    }

    /// Modular multiplication.
    pub fn mk_mul(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Mul, arith::mul)
    }

    /// Left shift by the second operand.
    pub fn mk_shl(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Shl, arith::shl)
    }

    /// Logical right shift by the second operand.
    pub fn mk_lshr(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Lshr, arith::lshr)
    }

    /// Arithmetic right shift by the second operand.
    pub fn mk_ashr(&mut self, a: TermId, b: TermId) -> TermId {
        self.binop(a, b, TermKind::Ashr, arith::ashr)
    }

    /// Concatenation; `hi` occupies the upper bits.
    pub fn mk_concat(&mut self, hi: TermId, lo: TermId) -> TermId {
        let w = self.width(hi) + self.width(lo);
        let lo_width = self.width(lo);
        if let (Some(vh), Some(vl)) = (self.const_value(hi), self.const_value(lo)) {
            let folded = arith::concat(lo_width, vh, vl);
            return self.mk_const(w, folded);
        }
        self.intern(TermKind::Concat(hi, lo), w)
    }

    /// Extract bits `hi..=lo`, inclusive.
    pub fn mk_extract(&mut self, arg: TermId, hi: u32, lo: u32) -> TermId {
        let aw = self.width(arg);
        assert!(hi >= lo && hi < aw, "extract [{hi}:{lo}] out of width {aw}");
        if hi == aw - 1 && lo == 0 {
            return arg;
        }
        let w = hi - lo + 1;
        if let Some(v) = self.const_value(arg) {
            let folded = arith::extract(v, hi, lo);
            return self.mk_const(w, folded);
        }
        self.intern(TermKind::Extract { hi, lo, arg }, w)
    }

    /// Zero extension by `by` bits.
    pub fn mk_zero_extend(&mut self, arg: TermId, by: u32) -> TermId {
        if by == 0 {
            return arg;
        }
        let w = self.width(arg) + by;
        if let Some(v) = self.const_value(arg) {
            let folded = v.clone();
            return self.mk_const(w, folded);
        }
        self.intern(TermKind::ZeroExtend { by, arg }, w)
    }

    /// Sign extension by `by` bits.
    pub fn mk_sign_extend(&mut self, arg: TermId, by: u32) -> TermId {
        if by == 0 {
            return arg;
        }
        let aw = self.width(arg);
        let w = aw + by;
        if let Some(v) = self.const_value(arg) {
            let folded = arith::sign_extend(aw, by, v);
            return self.mk_const(w, folded);
        }
        self.intern(TermKind::SignExtend { by, arg }, w)
    }

    /// Unsigned less-than; width-1 result.
    pub fn mk_ult(&mut self, a: TermId, b: TermId) -> TermId {
        self.cmp(a, b, TermKind::Ult, |_, x, y| arith::ult(x, y))
    }

    /// Unsigned less-or-equal; width-1 result.
    pub fn mk_ule(&mut self, a: TermId, b: TermId) -> TermId {
        self.cmp(a, b, TermKind::Ule, |_, x, y| arith::ule(x, y))
    }

    /// Signed less-than; width-1 result.
    pub fn mk_slt(&mut self, a: TermId, b: TermId) -> TermId {
        self.cmp(a, b, TermKind::Slt, arith::slt)
    }

    /// Signed less-or-equal; width-1 result.
    pub fn mk_sle(&mut self, a: TermId, b: TermId) -> TermId {
        self.cmp(a, b, TermKind::Sle, arith::sle)
    }

    /// Equality; width-1 result.
    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> TermId {
        let (wa, wb) = (self.width(a), self.width(b));
        assert_eq!(wa, wb, "equality over mismatched widths {wa} vs {wb}");
        if a == b {
            return self.mk_true();
        }
        if let (Some(va), Some(vb)) = (self.const_value(a), self.const_value(b)) {
            let folded = va == vb;
            return self.mk_const_u64(1, u64::from(folded));
        }
        self.intern(TermKind::Eq(a, b), 1)
    }

    /// If-then-else over any width; the condition is width-1.
    ///
    /// Applies the simplifications the encoder relies on: a constant
    /// condition selects an arm, equal arms collapse, and a nested ite
    /// sharing an arm with the other branch is merged into a single ite
    /// with a conjoined condition.
    pub fn mk_ite(&mut self, cond: TermId, then: TermId, els: TermId) -> TermId {
        assert_eq!(self.width(cond), 1, "ite condition must have width 1");
        let w = self.width(then);
        assert_eq!(
            w,
            self.width(els),
            "ite arms must agree on width ({} vs {})",
            w,
            self.width(els)
        );
        if let Some(c) = self.const_value(cond) {
            return if c.is_zero() { els } else { then };
        }
        if then == els {
            return then;
        }
        if let TermKind::Ite {
            cond: c2,
            then: t2,
            els: e2,
        } = *self.kind(then)
        {
            if t2 == els {
                let nc2 = self.mk_not(c2);
                let joined = self.mk_and(cond, nc2);
                return self.intern(
                    TermKind::Ite {
                        cond: joined,
                        then: e2,
                        els,
                    },
                    w,
                );
            }
            if e2 == els {
                let joined = self.mk_and(cond, c2);
                return self.intern(
                    TermKind::Ite {
                        cond: joined,
                        then: t2,
                        els,
                    },
                    w,
                );
            }
        }
        if let TermKind::Ite {
            cond: c2,
            then: t2,
            els: e2,
        } = *self.kind(els)
        {
            if t2 == then {
                let nc = self.mk_not(cond);
                let nc2 = self.mk_not(c2);
                let joined = self.mk_and(nc, nc2);
                return self.intern(
                    TermKind::Ite {
                        cond: joined,
                        then: e2,
                        els: then,
                    },
                    w,
                );
            }
            if e2 == then {
                let nc = self.mk_not(cond);
                let joined = self.mk_and(nc, c2);
                return self.intern(
                    TermKind::Ite {
                        cond: joined,
                        then: t2,
                        els: then,
                    },
                    w,
                );
            }
        }
        self.intern(TermKind::Ite { cond, then, els }, w)
    }

    fn binop(
        &mut self,
        a: TermId,
        b: TermId,
        build: fn(TermId, TermId) -> TermKind,
        fold: fn(u32, &BigUint, &BigUint) -> BigUint,
    ) -> TermId {
        let (wa, wb) = (self.width(a), self.width(b));
        assert_eq!(wa, wb, "operator over mismatched widths {wa} vs {wb}");
        if let (Some(va), Some(vb)) = (self.const_value(a), self.const_value(b)) {
            let folded = fold(wa, va, vb);
            return self.mk_const(wa, folded);
        }
        self.intern(build(a, b), wa)
    }

    fn cmp(
        &mut self,
        a: TermId,
        b: TermId,
        build: fn(TermId, TermId) -> TermKind,
        fold: fn(u32, &BigUint, &BigUint) -> bool,
    ) -> TermId {
        let (wa, wb) = (self.width(a), self.width(b));
        assert_eq!(wa, wb, "comparison over mismatched widths {wa} vs {wb}");
        if let (Some(va), Some(vb)) = (self.const_value(a), self.const_value(b)) {
            let folded = fold(wa, va, vb);
            return self.mk_const_u64(1, u64::from(folded));
        }
        self.intern(build(a, b), 1)
    }
}

//! Boolean test trees.
//!
//! Each clause's pattern lowers to a [`Cond`] over atomic [`Step`]s. The
//! builder repeatedly takes the first pending step of the first live clause
//! and rewrites every clause's tree with the step's outcome. The smart
//! constructors keep trees in normal form: no `True`/`False` below the root,
//! no directly nested `And`/`Or`, no double negation.

use sift_ir::{DagEval, TempId, TempTest};

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Step {
    Test(TempTest),
    Eval(DagEval),
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Cond {
    True,
    False,
    Step(Step),
    Not(Box<Cond>),
    And(Vec<Cond>),
    Or(Vec<Cond>),
}

impl Cond {
    pub fn test(test: TempTest) -> Self {
        Cond::Step(Step::Test(test))
    }

    pub fn eval(eval: DagEval) -> Self {
        Cond::Step(Step::Eval(eval))
    }

    pub fn and(parts: Vec<Cond>) -> Self {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Cond::True => {}
                Cond::False => return Cond::False,
                Cond::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Cond::True,
            1 => flat.pop().unwrap_or(Cond::True),
            _ => Cond::And(flat),
        }
    }

    pub fn or(parts: Vec<Cond>) -> Self {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Cond::False => {}
                Cond::True => return Cond::True,
                Cond::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Cond::False,
            1 => flat.pop().unwrap_or(Cond::False),
            _ => Cond::Or(flat),
        }
    }

    #[expect(
        clippy::should_implement_trait,
        reason = "smart constructor that normalizes, not std::ops::Not"
    )]
    pub fn not(inner: Cond) -> Self {
        match inner {
            Cond::True => Cond::False,
            Cond::False => Cond::True,
            Cond::Not(inner) => *inner,
            other => Cond::Not(Box::new(other)),
        }
    }

    #[inline]
    pub fn is_true(&self) -> bool {
        matches!(self, Cond::True)
    }

    #[inline]
    pub fn is_false(&self) -> bool {
        matches!(self, Cond::False)
    }

    /// The leftmost step; the one a sequential evaluator would perform first.
    pub fn first_step(&self) -> Option<&Step> {
        match self {
            Cond::True | Cond::False => None,
            Cond::Step(step) => Some(step),
            Cond::Not(inner) => inner.first_step(),
            Cond::And(parts) | Cond::Or(parts) => parts.first().and_then(Cond::first_step),
        }
    }

    /// Replace every step whose outcome `known` decides, then renormalize.
    #[must_use]
    pub fn rewrite(&self, known: &mut impl FnMut(&Step) -> Option<bool>) -> Cond {
        match self {
            Cond::True | Cond::False => self.clone(),
            Cond::Step(step) => match known(step) {
                Some(true) => Cond::True,
                Some(false) => Cond::False,
                None => self.clone(),
            },
            Cond::Not(inner) => Cond::not(inner.rewrite(known)),
            Cond::And(parts) => Cond::and(parts.iter().map(|p| p.rewrite(known)).collect()),
            Cond::Or(parts) => Cond::or(parts.iter().map(|p| p.rewrite(known)).collect()),
        }
    }

    /// Call `f` on every step, left to right.
    pub fn for_each_step(&self, f: &mut impl FnMut(&Step)) {
        match self {
            Cond::True | Cond::False => {}
            Cond::Step(step) => f(step),
            Cond::Not(inner) => inner.for_each_step(f),
            Cond::And(parts) | Cond::Or(parts) => {
                for part in parts {
                    part.for_each_step(f);
                }
            }
        }
    }

    /// Temps inspected by test steps.
    pub fn tested_temps(&self, out: &mut Vec<TempId>) {
        self.for_each_step(&mut |step| {
            if let Step::Test(test) = step {
                out.push(test.temp);
            }
        });
    }
}

#[cfg(test)]
mod tests;

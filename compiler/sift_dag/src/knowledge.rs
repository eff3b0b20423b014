//! What a dag path has established about each temp.
//!
//! A fork in the builder learns one test outcome on each side. Before the
//! next step is chosen, every clause's remaining tree is rewritten with the
//! outcomes the facts already decide: a repeated test, a null test after a
//! type test, a type test implied or excluded by an earlier one, or a value
//! test whose answer follows from the remaining value set.
//!
//! Once a sequence's length is known exactly, an element read from the end
//! (`^k`) and the same element read from the start (`[n - k]`) share one
//! set of facts.

use std::collections::{BTreeMap, BTreeSet};

use sift_ir::{Accessor, DagTest, TempId, TempTable, TempTest, TypeId};
use sift_types::TypeTable;

use crate::value_set::ValueSet;

#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct TempFacts {
    /// `Some(true)` when the temp is known null, `Some(false)` when known non-null.
    pub null: Option<bool>,
    /// Runtime type tests already taken, with their outcome.
    pub types: BTreeSet<(TypeId, bool)>,
    /// Remaining non-null values, once a value test narrowed them.
    pub values: Option<ValueSet>,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Knowledge {
    facts: BTreeMap<TempId, TempFacts>,
}

impl Knowledge {
    pub fn facts(&self, temp: TempId) -> Option<&TempFacts> {
        self.facts.get(&temp)
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Drop facts about temps no remaining test inspects.
    ///
    /// While an element of a sequence is still tested, facts about its
    /// length and its other elements are kept so reads from the end can
    /// still resolve to reads from the start.
    pub fn retain_tested(&mut self, temps: &TempTable, tested: &BTreeSet<TempId>) {
        let sequences: BTreeSet<TempId> = tested
            .iter()
            .filter_map(|&temp| match origin(temps, temp) {
                Some((parent, Accessor::Index(_) | Accessor::IndexFromEnd(_))) => Some(parent),
                _ => None,
            })
            .collect();
        self.facts.retain(|temp, _| {
            tested.contains(temp)
                || matches!(
                    origin(temps, *temp),
                    Some((parent, Accessor::Length | Accessor::Index(_) | Accessor::IndexFromEnd(_)))
                        if sequences.contains(&parent)
                )
        });
    }

    /// The temp whose facts describe `temp`.
    ///
    /// `^k` of a sequence whose length is exactly `n` resolves to `[n - k]`
    /// when that temp exists; every other temp resolves to itself.
    pub fn resolve(&self, temps: &TempTable, temp: TempId) -> TempId {
        let Some((parent, Accessor::IndexFromEnd(from_end))) = origin(temps, temp) else {
            return temp;
        };
        temps
            .find(parent, Accessor::Length)
            .and_then(|length| self.facts.get(&length)?.values.as_ref()?.single_ordinal())
            .and_then(|len| u32::try_from(len - i64::from(from_end)).ok())
            .and_then(|index| temps.find(parent, Accessor::Index(index)))
            .unwrap_or(temp)
    }

    /// Move facts about reads from the end of `parent` onto the reads from
    /// the start they now resolve to.
    fn realias(&mut self, temps: &TempTable, parent: TempId) {
        let moved: Vec<(TempId, TempId)> = self
            .facts
            .keys()
            .filter(|&&temp| {
                matches!(origin(temps, temp), Some((p, Accessor::IndexFromEnd(_))) if p == parent)
            })
            .map(|&temp| (temp, self.resolve(temps, temp)))
            .filter(|(from, to)| from != to)
            .collect();
        for (from, to) in moved {
            if let Some(facts) = self.facts.remove(&from) {
                let merged = match self.facts.remove(&to) {
                    Some(existing) => existing.merge(facts),
                    None => facts,
                };
                self.facts.insert(to, merged);
            }
        }
    }

    /// The remaining value set of `temp`, or the full family if untested.
    pub fn value_set(&self, types: &TypeTable, temps: &TempTable, temp: TempId) -> Option<ValueSet> {
        if let Some(values) = self.facts.get(&temp).and_then(|f| f.values.clone()) {
            return Some(values);
        }
        let ty = temps.ty(temp);
        let family = types.value_family(ty)?;
        Some(ValueSet::full(family, ty == TypeId::CHAR))
    }

    fn known_null(&self, temp: TempId) -> bool {
        self.facts.get(&temp).and_then(|f| f.null) == Some(true)
    }

    fn known_non_null(&self, types: &TypeTable, temps: &TempTable, temp: TempId) -> bool {
        self.facts.get(&temp).and_then(|f| f.null) == Some(false)
            || !types.may_be_null(temps.ty(temp))
    }

    /// The outcome of `test` if the facts decide it.
    pub fn implies(&self, types: &TypeTable, temps: &TempTable, test: &TempTest) -> Option<bool> {
        let temp = self.resolve(temps, test.temp);
        let known_null = self.known_null(temp);
        let known_non_null = self.known_non_null(types, temps, temp);
        match &test.test {
            DagTest::NonNull => {
                if known_null {
                    Some(false)
                } else if known_non_null {
                    Some(true)
                } else {
                    None
                }
            }
            DagTest::ExplicitNull => {
                if known_null {
                    Some(true)
                } else if known_non_null {
                    Some(false)
                } else {
                    None
                }
            }
            DagTest::Type(target) => {
                if known_null {
                    return Some(false);
                }
                self.implies_type(types, temps, temp, *target, known_non_null)
            }
            DagTest::Value(_) | DagTest::Relational(..) => {
                if known_null {
                    return Some(false);
                }
                let current = self.value_set(types, temps, temp)?;
                let passing = current.passing(&test.test)?;
                if current.intersect(&passing).is_empty() {
                    Some(false)
                } else if known_non_null && current.is_subset_of(&passing) {
                    Some(true)
                } else {
                    None
                }
            }
        }
    }

    fn implies_type(
        &self,
        types: &TypeTable,
        temps: &TempTable,
        temp: TempId,
        target: TypeId,
        known_non_null: bool,
    ) -> Option<bool> {
        if let Some(facts) = self.facts.get(&temp) {
            for &(seen, outcome) in &facts.types {
                if outcome {
                    if types.is_subtype(seen, target) {
                        return Some(true);
                    }
                    if types.is_disjoint(seen, target) {
                        return Some(false);
                    }
                } else if types.is_subtype(target, seen) {
                    return Some(false);
                }
            }
        }
        let static_ty = temps.ty(temp);
        if types.is_disjoint(static_ty, target) {
            return Some(false);
        }
        if known_non_null && types.is_subtype(types.strip_nullable(static_ty), target) {
            return Some(true);
        }
        None
    }

    /// Record the outcome of `test`.
    pub fn learn(&mut self, types: &TypeTable, temps: &TempTable, test: &TempTest, outcome: bool) {
        let temp = self.resolve(temps, test.temp);
        let current = match &test.test {
            DagTest::Value(_) | DagTest::Relational(..) => self.value_set(types, temps, temp),
            _ => None,
        };
        let facts = self.facts.entry(temp).or_default();
        match &test.test {
            DagTest::NonNull => facts.null = Some(!outcome),
            DagTest::ExplicitNull => facts.null = Some(outcome),
            DagTest::Type(ty) => {
                if outcome {
                    facts.null = Some(false);
                }
                facts.types.insert((*ty, outcome));
            }
            DagTest::Value(_) | DagTest::Relational(..) => {
                if outcome {
                    facts.null = Some(false);
                }
                if let Some(current) = current {
                    if let Some(passing) = current.passing(&test.test) {
                        facts.values = Some(if outcome {
                            current.intersect(&passing)
                        } else {
                            current.subtract(&passing)
                        });
                    }
                }
            }
        }
        if let Some((parent, Accessor::Length)) = origin(temps, temp) {
            self.realias(temps, parent);
        }
    }
}

impl TempFacts {
    /// Facts about one value learned under two temps.
    fn merge(mut self, other: TempFacts) -> TempFacts {
        self.null = self.null.or(other.null);
        self.types.extend(other.types);
        self.values = match (self.values, other.values) {
            (Some(a), Some(b)) => Some(a.intersect(&b)),
            (a, b) => a.or(b),
        };
        self
    }
}

fn origin(temps: &TempTable, temp: TempId) -> Option<(TempId, Accessor)> {
    let entry = temps.get(temp);
    Some((entry.parent?, entry.accessor?))
}

#[cfg(test)]
mod tests;

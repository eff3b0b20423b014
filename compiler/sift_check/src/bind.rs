//! Binding pass.
//!
//! Walks a pattern with the static type of the value it is matched
//! against, fills [`Pattern::input_type`] and [`Pattern::narrowed_type`],
//! converts constants to the input type and rejects shapes the input type
//! or the language version does not allow. A node that fails keeps
//! [`TypeId::ERROR`] as its narrowed type; the dag lowers such a pattern to
//! a test that never succeeds, so one error does not cascade into
//! reachability diagnostics.

use sift_dag::ensure_sufficient_stack;
use sift_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use sift_ir::{
    ConstValue, Feature, FeatureSet, LanguageVersion, ListPattern, Name, Pattern, PatternKind,
    PropertySubpattern, RecursivePattern, Span, TypeId,
};
use sift_types::{PatternConversion, TypeKind, TypeTable, ValueFamily};

use crate::CompileOptions;

pub struct Binder<'a> {
    types: &'a TypeTable,
    features: FeatureSet,
    version: LanguageVersion,
    diagnostics: &'a mut DiagnosticQueue,
}

impl<'a> Binder<'a> {
    pub fn new(
        types: &'a TypeTable,
        options: &CompileOptions,
        diagnostics: &'a mut DiagnosticQueue,
    ) -> Self {
        Binder {
            types,
            features: options.features,
            version: options.version,
            diagnostics,
        }
    }

    /// Bind `pattern` against a value of static type `input`.
    ///
    /// Returns whether the whole pattern bound without error.
    pub fn bind(&mut self, pattern: &mut Pattern, input: TypeId) -> bool {
        self.pattern(pattern, input, false);
        !pattern.has_error()
    }

    /// `combinator` is set beneath `not` and `or`, where designations are
    /// illegal.
    fn pattern(&mut self, pattern: &mut Pattern, input: TypeId, combinator: bool) {
        if self.types.is_error(input) {
            poison(pattern);
            return;
        }
        ensure_sufficient_stack(|| self.pattern_inner(pattern, input, combinator));
    }

    fn pattern_inner(&mut self, pattern: &mut Pattern, input: TypeId, combinator: bool) {
        pattern.input_type = input;
        let span = pattern.span;
        let narrowed = match &mut pattern.kind {
            PatternKind::Discard => Some(input),
            PatternKind::Var(name) => self.designation(Some(*name), combinator, span).then_some(input),
            PatternKind::Declaration { ty, name } => {
                let ty = *ty;
                let typed = self.type_pattern(input, ty, span);
                let designated = self.designation(*name, combinator, span);
                (typed && designated).then_some(ty)
            }
            PatternKind::Type(ty) => {
                let ty = *ty;
                self.type_pattern(input, ty, span).then_some(ty)
            }
            PatternKind::Constant { value, ty } => self.constant(input, value, ty, span),
            PatternKind::DefaultLiteral => {
                self.report(
                    Diagnostic::error(ErrorCode::DefaultPattern)
                        .with_message("a default literal is not a valid pattern")
                        .with_label(span, "use `var _`, `_` or an explicit constant instead")
                        .with_suggestion("_"),
                );
                None
            }
            PatternKind::Relational { value, ty, .. } => self.relational(input, value, ty, span),
            PatternKind::Recursive(rec) => self.recursive(rec, input, combinator, span),
            PatternKind::List(list) => self.list(list, input, combinator, span),
            PatternKind::Slice(inner) => {
                self.misplaced_slice(span);
                if let Some(inner) = inner {
                    poison(inner);
                }
                None
            }
            PatternKind::Not(inner) => {
                let enabled = self.feature(Feature::PatternCombinators, span);
                self.pattern(inner, input, true);
                enabled.then_some(input)
            }
            PatternKind::And(left, right) => {
                let enabled = self.feature(Feature::PatternCombinators, span);
                self.pattern(left, input, combinator);
                self.pattern(right, left.narrowed_type, combinator);
                enabled.then_some(right.narrowed_type)
            }
            PatternKind::Or(left, right) => {
                let enabled = self.feature(Feature::PatternCombinators, span);
                self.pattern(left, input, true);
                self.pattern(right, input, true);
                enabled.then_some(input)
            }
        };
        pattern.narrowed_type = narrowed.unwrap_or(TypeId::ERROR);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.types.name(ty).to_owned()
    }

    /// Whether `feature` is enabled, reporting it when it is not.
    fn feature(&mut self, feature: Feature, span: Span) -> bool {
        if self.features.has(feature) {
            return true;
        }
        let required = feature.required_version();
        self.report(
            Diagnostic::error(ErrorCode::FeatureNotAvailableInVersion)
                .with_message(format!(
                    "feature '{}' is not available in language version {}",
                    feature.display_name(),
                    self.version
                ))
                .with_arg(feature.display_name())
                .with_arg(self.version.as_str())
                .with_arg(required.as_str())
                .with_label(span, "not available in this version")
                .with_note(format!("use language version {required} or greater")),
        );
        false
    }

    fn designation(&mut self, name: Option<Name>, combinator: bool, span: Span) -> bool {
        let Some(name) = name else {
            return true;
        };
        if !combinator {
            return true;
        }
        let text = self.types.name_text(name);
        self.report(
            Diagnostic::error(ErrorCode::DesignatorBeneathPatternCombinator)
                .with_message(format!(
                    "variable '{text}' may not be declared within a 'not' or 'or' pattern"
                ))
                .with_arg(text)
                .with_label(span, "declared here"),
        );
        false
    }

    /// Check that a pattern testing for `ty` may be applied to `input`.
    fn type_pattern(&mut self, input: TypeId, ty: TypeId, span: Span) -> bool {
        let types = self.types;
        if types.is_error(ty) {
            return false;
        }
        if types.is_nullable(ty) {
            let underlying = types.strip_nullable(ty);
            self.report(
                Diagnostic::error(ErrorCode::PatternNullableType)
                    .with_message(format!(
                        "it is not legal to use nullable type '{}' in a pattern",
                        types.name(ty)
                    ))
                    .with_arg(self.type_name(ty))
                    .with_arg(self.type_name(underlying))
                    .with_label(span, "nullable type used as a pattern")
                    .with_suggestion(self.type_name(underlying)),
            );
            return false;
        }
        match types.pattern_conversion(input, ty) {
            PatternConversion::Exists => true,
            PatternConversion::OpenTypeOnly if self.features.has(Feature::GenericTypePatterns) => {
                true
            }
            PatternConversion::OpenTypeOnly => {
                let feature = Feature::GenericTypePatterns;
                self.report(
                    Diagnostic::error(ErrorCode::PatternWrongGenericTypeInVersion)
                        .with_message(format!(
                            "an expression of type '{}' cannot be handled by a pattern of type '{}' in language version {}",
                            types.name(input),
                            types.name(ty),
                            self.version
                        ))
                        .with_arg(self.type_name(input))
                        .with_arg(self.type_name(ty))
                        .with_arg(feature.display_name())
                        .with_arg(feature.required_version().as_str())
                        .with_label(span, "requires open type patterns"),
                );
                false
            }
            PatternConversion::None => {
                self.report(
                    Diagnostic::error(ErrorCode::PatternWrongType)
                        .with_message(format!(
                            "an expression of type '{}' cannot be handled by a pattern of type '{}'",
                            types.name(input),
                            types.name(ty)
                        ))
                        .with_arg(self.type_name(input))
                        .with_arg(self.type_name(ty))
                        .with_label(span, "incompatible pattern type"),
                );
                false
            }
        }
    }

    fn constant(
        &mut self,
        input: TypeId,
        value: &mut ConstValue,
        ty: &mut TypeId,
        span: Span,
    ) -> Option<TypeId> {
        let types = self.types;
        let closed = types.strip_nullable(input);

        if value.is_null() {
            if types.is_char_span(closed) {
                self.report(
                    Diagnostic::error(ErrorCode::PatternSpanCharCannotBeStringNull)
                        .with_message(format!(
                            "a '{}' cannot be matched with the constant 'null'",
                            types.name(closed)
                        ))
                        .with_arg(self.type_name(closed))
                        .with_label(span, "use an empty string instead"),
                );
                return None;
            }
            if !types.may_be_null(input) {
                self.report(
                    Diagnostic::error(ErrorCode::ValueCantBeNull)
                        .with_message(format!(
                            "cannot convert null to '{}' because it is a non-nullable value type",
                            types.name(input)
                        ))
                        .with_arg(self.type_name(input))
                        .with_label(span, "value can never be null"),
                );
                return None;
            }
            return Some(input);
        }

        if types.is_char_span(closed) {
            if !matches!(value, ConstValue::Str(_)) {
                self.constant_expected(closed, value, span);
                return None;
            }
            if !self.feature(Feature::SpanCharConstantPattern, span) {
                return None;
            }
            *ty = TypeId::STRING;
            return Some(closed);
        }

        if types.value_family(closed).is_some() {
            return match convert_constant(types, value, *ty, closed) {
                Some(converted) => {
                    *value = converted;
                    *ty = closed;
                    Some(closed)
                }
                None => {
                    self.constant_expected(closed, value, span);
                    None
                }
            };
        }

        // Open input: the constant carries its own type test.
        let const_ty = *ty;
        self.type_pattern(input, const_ty, span).then_some(const_ty)
    }

    fn constant_expected(&mut self, target: TypeId, value: &ConstValue, span: Span) {
        self.report(
            Diagnostic::error(ErrorCode::ConstantValueOfTypeExpected)
                .with_message(format!(
                    "a constant value of type '{}' is expected",
                    self.types.name(target)
                ))
                .with_arg(self.type_name(target))
                .with_arg(value.to_string())
                .with_label(span, format!("{value} does not convert")),
        );
    }

    fn relational(
        &mut self,
        input: TypeId,
        value: &mut ConstValue,
        ty: &mut TypeId,
        span: Span,
    ) -> Option<TypeId> {
        let types = self.types;
        if !self.feature(Feature::RelationalPatterns, span) {
            return None;
        }
        let closed = types.strip_nullable(input);
        let target = if value.is_null() {
            None
        } else if types.value_family(closed).is_some() {
            Some(closed)
        } else {
            Some(*ty)
        };
        let Some(target) = target.filter(|target| types.is_ordered(*target)) else {
            let shown = if value.is_null() {
                String::from("null")
            } else {
                self.type_name(target.unwrap_or(*ty))
            };
            self.report(
                Diagnostic::error(ErrorCode::UnsupportedTypeForRelationalPattern)
                    .with_message(format!(
                        "relational patterns may not be used for a value of type '{shown}'"
                    ))
                    .with_arg(shown)
                    .with_label(span, "type has no ordering"),
            );
            return None;
        };

        if target == closed {
            let Some(converted) = convert_constant(types, value, *ty, closed) else {
                self.constant_expected(closed, value, span);
                return None;
            };
            *value = converted;
            *ty = closed;
            return Some(closed);
        }
        self.type_pattern(input, target, span).then_some(target)
    }

    fn recursive(
        &mut self,
        rec: &mut RecursivePattern,
        input: TypeId,
        combinator: bool,
        span: Span,
    ) -> Option<TypeId> {
        let mut ok = self.feature(Feature::RecursivePatterns, span);
        let narrowed = match rec.ty {
            Some(ty) => {
                if self.type_pattern(input, ty, span) {
                    ty
                } else {
                    ok = false;
                    TypeId::ERROR
                }
            }
            None => self.types.strip_nullable(input),
        };
        ok &= self.designation(rec.designation, combinator, span);
        if let Some(subpatterns) = &mut rec.positional {
            ok &= self.positional(narrowed, subpatterns, combinator, span);
        }
        for prop in rec.properties.iter_mut().flatten() {
            ok &= self.property(narrowed, prop, combinator);
        }
        ok.then_some(narrowed)
    }

    fn positional(
        &mut self,
        narrowed: TypeId,
        subpatterns: &mut [Pattern],
        combinator: bool,
        span: Span,
    ) -> bool {
        let types = self.types;
        let outputs = types
            .tuple_elements(narrowed)
            .or_else(|| types.deconstruct(narrowed))
            .map(<[TypeId]>::to_vec);
        let outputs = match outputs {
            Some(outputs) if outputs.len() == subpatterns.len() => outputs,
            Some(outputs) => {
                self.report(
                    Diagnostic::error(ErrorCode::WrongNumberOfSubpatterns)
                        .with_message(format!(
                            "matching the type '{}' requires {} subpatterns, but {} subpatterns are present",
                            types.name(narrowed),
                            outputs.len(),
                            subpatterns.len()
                        ))
                        .with_arg(self.type_name(narrowed))
                        .with_arg(outputs.len().to_string())
                        .with_arg(subpatterns.len().to_string())
                        .with_label(span, "wrong number of subpatterns"),
                );
                subpatterns.iter_mut().for_each(poison);
                return false;
            }
            None => {
                if !types.is_error(narrowed) {
                    self.report(
                        Diagnostic::error(ErrorCode::MissingDeconstruct)
                            .with_message(format!(
                                "no suitable 'Deconstruct' instance or extension method was found for type '{}', with {} out parameters",
                                types.name(narrowed),
                                subpatterns.len()
                            ))
                            .with_arg(self.type_name(narrowed))
                            .with_arg(subpatterns.len().to_string())
                            .with_label(span, "cannot be deconstructed"),
                    );
                }
                subpatterns.iter_mut().for_each(poison);
                return false;
            }
        };
        for (sub, ty) in subpatterns.iter_mut().zip(outputs) {
            self.pattern(sub, ty, combinator);
        }
        true
    }

    fn property(
        &mut self,
        receiver: TypeId,
        prop: &mut PropertySubpattern,
        combinator: bool,
    ) -> bool {
        let types = self.types;
        let mut ok = true;
        if prop.members.len() > 1 {
            ok &= self.feature(Feature::ExtendedPropertyPatterns, prop.span);
        }
        let mut ty = receiver;
        for member in &prop.members {
            if types.is_error(ty) {
                break;
            }
            let Some(found) = types.member(ty, *member) else {
                let text = types.name_text(*member);
                self.report(
                    Diagnostic::error(ErrorCode::NoSuchMember)
                        .with_message(format!(
                            "'{}' does not contain a definition for '{text}'",
                            types.name(ty)
                        ))
                        .with_arg(self.type_name(ty))
                        .with_arg(text)
                        .with_label(prop.span, "unknown member"),
                );
                poison(&mut prop.pattern);
                return false;
            };
            ty = found.ty;
        }
        self.pattern(&mut prop.pattern, ty, combinator);
        ok
    }

    fn list(
        &mut self,
        list: &mut ListPattern,
        input: TypeId,
        combinator: bool,
        span: Span,
    ) -> Option<TypeId> {
        let types = self.types;
        let enabled = self.feature(Feature::ListPatterns, span);
        let (Some(element_ty), Some(slice_ty)) = (types.element_type(input), types.slice_type(input))
        else {
            self.report(
                Diagnostic::error(ErrorCode::ListPatternRequiresLength)
                    .with_message(format!(
                        "list patterns may not be used for a value of type '{}'; a suitable 'Length' or 'Count' property is required",
                        types.name(input)
                    ))
                    .with_arg(self.type_name(input))
                    .with_label(span, "no length or indexer"),
            );
            list.elements.iter_mut().for_each(poison);
            return None;
        };

        let mut ok = enabled & self.designation(list.designation, combinator, span);
        let mut seen_slice = false;
        for element in &mut list.elements {
            if let PatternKind::Slice(inner) = &mut element.kind {
                element.input_type = input;
                if seen_slice {
                    self.misplaced_slice(element.span);
                    if let Some(inner) = inner {
                        poison(inner);
                    }
                    element.narrowed_type = TypeId::ERROR;
                    ok = false;
                    continue;
                }
                seen_slice = true;
                if let Some(inner) = inner {
                    self.pattern(inner, slice_ty, combinator);
                }
                element.narrowed_type = slice_ty;
            } else {
                self.pattern(element, element_ty, combinator);
            }
        }
        ok.then_some(input)
    }

    fn misplaced_slice(&mut self, span: Span) {
        self.report(
            Diagnostic::error(ErrorCode::MisplacedSlicePattern)
                .with_message("slice patterns may only be used once and directly inside a list pattern")
                .with_label(span, "misplaced slice"),
        );
    }
}

/// Mark a subtree as failed without reporting anything further.
fn poison(pattern: &mut Pattern) {
    pattern.walk_mut(&mut |p| {
        p.input_type = TypeId::ERROR;
        p.narrowed_type = TypeId::ERROR;
    });
}

/// Convert a constant of type `from` to the closed type `target`.
///
/// Mirrors implicit constant conversions: identity, in-range integer
/// constants, widening, `0` to any enum, char to wider integers and
/// integers to double.
pub fn convert_constant(
    types: &TypeTable,
    value: &ConstValue,
    from: TypeId,
    target: TypeId,
) -> Option<ConstValue> {
    let family = types.value_family(target)?;
    let is_enum = |ty: TypeId| matches!(types.kind(ty), TypeKind::Enum { .. });
    match (family, value) {
        (ValueFamily::Bool, ConstValue::Bool(_)) | (ValueFamily::String, ConstValue::Str(_)) => {
            Some(value.clone())
        }
        (ValueFamily::Double, ConstValue::Double(_)) => Some(value.clone().canonical()),
        (ValueFamily::Double, ConstValue::Int(v)) if !is_enum(from) => {
            #[expect(
                clippy::cast_precision_loss,
                reason = "implicit integer to double conversion of a constant"
            )]
            let widened = *v as f64;
            Some(ConstValue::double(widened))
        }
        (ValueFamily::Integral { .. }, ConstValue::Char(_)) if target == TypeId::CHAR => {
            Some(value.clone())
        }
        (ValueFamily::Integral { .. }, ConstValue::Char(c))
            if target == TypeId::INT || target == TypeId::LONG =>
        {
            Some(ConstValue::Int(i64::from(*c)))
        }
        (ValueFamily::Integral { min, max }, ConstValue::Int(v)) => {
            let allowed = if from == target {
                true
            } else if is_enum(target) {
                *v == 0 && !is_enum(from)
            } else if target == TypeId::CHAR || is_enum(from) {
                false
            } else if from == TypeId::INT {
                (min..=max).contains(v)
            } else {
                match types.value_family(from) {
                    Some(ValueFamily::Integral {
                        min: from_min,
                        max: from_max,
                    }) => from_min >= min && from_max <= max,
                    _ => false,
                }
            };
            allowed.then(|| value.clone())
        }
        _ => None,
    }
}

//! The type table the binder hands to the pattern engine.
//!
//! Built-in types occupy the fixed indices named on [`TypeId`]. Declared
//! types (classes, interfaces, structs, enums, type parameters) and compound
//! types (nullables, spans, arrays, tuples) are appended; compound types are
//! deduplicated by kind.

use rustc_hash::FxHashMap;
use sift_ir::{Name, StringInterner, TypeId};

use crate::TypeFlags;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Primitive {
    Bool,
    Char,
    Byte,
    Int,
    Long,
    Double,
}

/// Constraint kind of a type parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ParamConstraint {
    #[default]
    None,
    /// `where T : class`
    Class,
    /// `where T : struct`
    Struct,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    Object,
    Primitive(Primitive),
    String,
    Class {
        base: Option<TypeId>,
        sealed: bool,
        interfaces: Vec<TypeId>,
    },
    Interface {
        bases: Vec<TypeId>,
    },
    Struct {
        ref_like: bool,
        interfaces: Vec<TypeId>,
    },
    Enum {
        underlying: TypeId,
    },
    /// `T?` over a value type.
    Nullable(TypeId),
    Span {
        element: TypeId,
        read_only: bool,
    },
    Array(TypeId),
    Tuple(Vec<TypeId>),
    TypeParam {
        constraint: ParamConstraint,
        bound: Option<TypeId>,
    },
    Error,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MemberKind {
    Property,
    /// The built-in `Length` of strings, spans and arrays.
    Length,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Member {
    pub name: Name,
    pub ty: TypeId,
    pub kind: MemberKind,
}

/// Family of values a constant or relational test can distinguish.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ValueFamily {
    Bool,
    /// Integral types, chars and enums as an inclusive range on the integer line.
    Integral { min: i64, max: i64 },
    Double,
    /// Strings, and char spans matched against string constants.
    String,
}

#[derive(Clone, Debug)]
struct TypeData {
    name: String,
    kind: TypeKind,
    flags: TypeFlags,
    members: Vec<Member>,
    deconstruct: Option<Vec<TypeId>>,
}

/// Registry of every type a pattern may mention.
///
/// Read-only once built; shared across threads when switches are checked
/// in parallel.
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<TypeData>,
    compound: FxHashMap<TypeKind, TypeId>,
    interner: StringInterner,
    length: Name,
}

impl TypeTable {
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let length = interner.intern("Length");
        let mut table = TypeTable {
            types: Vec::with_capacity(32),
            compound: FxHashMap::default(),
            interner,
            length,
        };
        let builtins = [
            ("object", TypeKind::Object),
            ("bool", TypeKind::Primitive(Primitive::Bool)),
            ("char", TypeKind::Primitive(Primitive::Char)),
            ("byte", TypeKind::Primitive(Primitive::Byte)),
            ("int", TypeKind::Primitive(Primitive::Int)),
            ("long", TypeKind::Primitive(Primitive::Long)),
            ("double", TypeKind::Primitive(Primitive::Double)),
            ("string", TypeKind::String),
            ("<error>", TypeKind::Error),
        ];
        for (name, kind) in builtins {
            table.push(name.to_owned(), kind);
        }
        debug_assert_eq!(table.types.len() as u32, TypeId::FIRST_DECLARED);
        table
    }

    fn push(&mut self, name: String, kind: TypeKind) -> TypeId {
        let flags = self.compute_flags(&kind);
        let id = TypeId::new(
            u32::try_from(self.types.len())
                .unwrap_or_else(|_| panic!("type table exceeded u32::MAX entries")),
        );
        self.types.push(TypeData {
            name,
            kind,
            flags,
            members: Vec::new(),
            deconstruct: None,
        });
        id
    }

    fn push_compound(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.compound.get(&kind) {
            return id;
        }
        let name = self.compound_name(&kind);
        let id = self.push(name, kind.clone());
        self.compound.insert(kind, id);
        id
    }

    fn compound_name(&self, kind: &TypeKind) -> String {
        match kind {
            TypeKind::Nullable(inner) => format!("{}?", self.name(*inner)),
            TypeKind::Span { element, read_only } => format!(
                "{}<{}>",
                if *read_only { "ReadOnlySpan" } else { "Span" },
                self.name(*element)
            ),
            TypeKind::Array(element) => format!("{}[]", self.name(*element)),
            TypeKind::Tuple(elements) => {
                let parts: Vec<&str> = elements.iter().map(|e| self.name(*e)).collect();
                format!("({})", parts.join(", "))
            }
            _ => String::from("<compound>"),
        }
    }

    fn compute_flags(&self, kind: &TypeKind) -> TypeFlags {
        let value = TypeFlags::IS_VALUE_TYPE;
        let reference = TypeFlags::IS_REFERENCE_TYPE | TypeFlags::MAY_BE_NULL;
        match kind {
            TypeKind::Object | TypeKind::Class { .. } | TypeKind::Interface { .. } => reference,
            TypeKind::String => {
                reference | TypeFlags::IS_SEQUENCE | TypeFlags::ACCEPTS_CONSTANTS
            }
            TypeKind::Array(_) => reference | TypeFlags::IS_SEQUENCE,
            TypeKind::Primitive(Primitive::Bool) => value | TypeFlags::ACCEPTS_CONSTANTS,
            TypeKind::Primitive(Primitive::Double) => {
                value | TypeFlags::IS_ORDERED | TypeFlags::ACCEPTS_CONSTANTS
            }
            TypeKind::Primitive(_) => {
                value
                    | TypeFlags::IS_INTEGRAL
                    | TypeFlags::IS_ORDERED
                    | TypeFlags::ACCEPTS_CONSTANTS
            }
            TypeKind::Enum { .. } => {
                value
                    | TypeFlags::IS_INTEGRAL
                    | TypeFlags::IS_ORDERED
                    | TypeFlags::ACCEPTS_CONSTANTS
            }
            TypeKind::Struct { ref_like, .. } => {
                if *ref_like {
                    value | TypeFlags::IS_REF_LIKE
                } else {
                    value
                }
            }
            TypeKind::Nullable(_) => value | TypeFlags::MAY_BE_NULL,
            TypeKind::Span { .. } => value | TypeFlags::IS_REF_LIKE | TypeFlags::IS_SEQUENCE,
            TypeKind::Tuple(_) => value,
            TypeKind::TypeParam { constraint, bound } => {
                let bound_is_class = bound.is_some_and(|b| {
                    matches!(
                        self.types.get(b.index()).map(|data| &data.kind),
                        Some(TypeKind::Class { .. })
                    )
                });
                match constraint {
                    ParamConstraint::Struct => TypeFlags::IS_OPEN | value,
                    ParamConstraint::Class => TypeFlags::IS_OPEN | reference,
                    ParamConstraint::None if bound_is_class => TypeFlags::IS_OPEN | reference,
                    ParamConstraint::None => TypeFlags::IS_OPEN | TypeFlags::MAY_BE_NULL,
                }
            }
            TypeKind::Error => TypeFlags::IS_ERROR,
        }
    }

    // Declarations

    pub fn class(&mut self, name: &str, base: Option<TypeId>) -> TypeId {
        self.push(
            name.to_owned(),
            TypeKind::Class {
                base,
                sealed: false,
                interfaces: Vec::new(),
            },
        )
    }

    pub fn sealed_class(&mut self, name: &str, base: Option<TypeId>) -> TypeId {
        self.push(
            name.to_owned(),
            TypeKind::Class {
                base,
                sealed: true,
                interfaces: Vec::new(),
            },
        )
    }

    pub fn interface(&mut self, name: &str, bases: Vec<TypeId>) -> TypeId {
        self.push(name.to_owned(), TypeKind::Interface { bases })
    }

    pub fn struct_type(&mut self, name: &str) -> TypeId {
        self.push(
            name.to_owned(),
            TypeKind::Struct {
                ref_like: false,
                interfaces: Vec::new(),
            },
        )
    }

    pub fn ref_struct(&mut self, name: &str) -> TypeId {
        self.push(
            name.to_owned(),
            TypeKind::Struct {
                ref_like: true,
                interfaces: Vec::new(),
            },
        )
    }

    pub fn enum_type(&mut self, name: &str) -> TypeId {
        self.push(
            name.to_owned(),
            TypeKind::Enum {
                underlying: TypeId::INT,
            },
        )
    }

    pub fn type_param(
        &mut self,
        name: &str,
        constraint: ParamConstraint,
        bound: Option<TypeId>,
    ) -> TypeId {
        self.push(name.to_owned(), TypeKind::TypeParam { constraint, bound })
    }

    /// Record that a class or struct implements an interface.
    pub fn implement(&mut self, ty: TypeId, interface: TypeId) {
        if let Some(data) = self.types.get_mut(ty.index()) {
            match &mut data.kind {
                TypeKind::Class { interfaces, .. } | TypeKind::Struct { interfaces, .. } => {
                    interfaces.push(interface);
                }
                TypeKind::Interface { bases } => bases.push(interface),
                _ => {}
            }
        }
    }

    pub fn add_property(&mut self, ty: TypeId, name: &str, member_ty: TypeId) -> Name {
        let name = self.interner.intern(name);
        if let Some(data) = self.types.get_mut(ty.index()) {
            data.members.push(Member {
                name,
                ty: member_ty,
                kind: MemberKind::Property,
            });
        }
        name
    }

    /// Declare a `Deconstruct(out ...)` method with the given output types.
    pub fn set_deconstruct(&mut self, ty: TypeId, outputs: Vec<TypeId>) {
        if let Some(data) = self.types.get_mut(ty.index()) {
            data.deconstruct = Some(outputs);
        }
    }

    // Compound types

    pub fn nullable(&mut self, inner: TypeId) -> TypeId {
        self.push_compound(TypeKind::Nullable(inner))
    }

    pub fn span(&mut self, element: TypeId) -> TypeId {
        self.push_compound(TypeKind::Span {
            element,
            read_only: false,
        })
    }

    pub fn read_only_span(&mut self, element: TypeId) -> TypeId {
        self.push_compound(TypeKind::Span {
            element,
            read_only: true,
        })
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        self.push_compound(TypeKind::Array(element))
    }

    pub fn tuple(&mut self, elements: Vec<TypeId>) -> TypeId {
        self.push_compound(TypeKind::Tuple(elements))
    }

    // Queries

    #[inline]
    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        self.types
            .get(ty.index())
            .map_or(&TypeKind::Error, |data| &data.kind)
    }

    #[inline]
    pub fn flags(&self, ty: TypeId) -> TypeFlags {
        self.types
            .get(ty.index())
            .map_or(TypeFlags::IS_ERROR, |data| data.flags)
    }

    pub fn name(&self, ty: TypeId) -> &str {
        self.types
            .get(ty.index())
            .map_or("<error>", |data| data.name.as_str())
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn intern(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn name_text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_value_type(&self, ty: TypeId) -> bool {
        self.flags(ty).is_value_type()
    }

    pub fn is_reference_type(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::IS_REFERENCE_TYPE)
    }

    pub fn may_be_null(&self, ty: TypeId) -> bool {
        self.flags(ty).may_be_null()
    }

    pub fn is_ref_like(&self, ty: TypeId) -> bool {
        self.flags(ty).is_ref_like()
    }

    pub fn is_open(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::IS_OPEN)
    }

    pub fn is_error(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::IS_ERROR)
    }

    pub fn is_nullable(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Nullable(_))
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Interface { .. })
    }

    /// `int?` → `int`; other types unchanged.
    pub fn strip_nullable(&self, ty: TypeId) -> TypeId {
        match self.kind(ty) {
            TypeKind::Nullable(inner) => *inner,
            _ => ty,
        }
    }

    /// `Span<char>` or `ReadOnlySpan<char>`.
    pub fn is_char_span(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Span { element, .. } if *element == TypeId::CHAR
        )
    }

    /// Whether constant patterns of this closed type compare values directly.
    pub fn accepts_constants(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::ACCEPTS_CONSTANTS)
    }

    pub fn is_ordered(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::IS_ORDERED)
    }

    pub fn is_sequence(&self, ty: TypeId) -> bool {
        self.flags(ty).contains(TypeFlags::IS_SEQUENCE)
    }

    /// Element type of a string, span or array.
    pub fn element_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::String => Some(TypeId::CHAR),
            TypeKind::Span { element, .. } | TypeKind::Array(element) => Some(*element),
            _ => None,
        }
    }

    /// Type produced by slicing a sequence: the sequence type itself.
    pub fn slice_type(&self, ty: TypeId) -> Option<TypeId> {
        self.is_sequence(ty).then_some(ty)
    }

    pub fn tuple_elements(&self, ty: TypeId) -> Option<&[TypeId]> {
        match self.kind(ty) {
            TypeKind::Tuple(elements) => Some(elements),
            _ => None,
        }
    }

    /// Look up a readable member, searching base classes and type-parameter bounds.
    pub fn member(&self, ty: TypeId, name: Name) -> Option<Member> {
        if name == self.length && self.is_sequence(ty) {
            return Some(Member {
                name,
                ty: TypeId::INT,
                kind: MemberKind::Length,
            });
        }
        let mut current = Some(ty);
        while let Some(id) = current {
            let data = self.types.get(id.index())?;
            if let Some(member) = data.members.iter().find(|m| m.name == name) {
                return Some(*member);
            }
            current = match &data.kind {
                TypeKind::Class { base, .. } => *base,
                TypeKind::TypeParam { bound, .. } => *bound,
                _ => None,
            };
        }
        None
    }

    /// Output types of the type's `Deconstruct`, searching base classes.
    pub fn deconstruct(&self, ty: TypeId) -> Option<&[TypeId]> {
        let mut current = Some(ty);
        while let Some(id) = current {
            let data = self.types.get(id.index())?;
            if let Some(outputs) = &data.deconstruct {
                return Some(outputs);
            }
            current = match &data.kind {
                TypeKind::Class { base, .. } => *base,
                TypeKind::TypeParam { bound, .. } => *bound,
                _ => None,
            };
        }
        None
    }

    /// Values a constant or relational test on `ty` can distinguish.
    pub fn value_family(&self, ty: TypeId) -> Option<ValueFamily> {
        match self.kind(ty) {
            TypeKind::Primitive(Primitive::Bool) => Some(ValueFamily::Bool),
            TypeKind::Primitive(Primitive::Char) => Some(ValueFamily::Integral {
                min: 0,
                max: i64::from(u16::MAX),
            }),
            TypeKind::Primitive(Primitive::Byte) => Some(ValueFamily::Integral {
                min: 0,
                max: i64::from(u8::MAX),
            }),
            TypeKind::Primitive(Primitive::Int) => Some(ValueFamily::Integral {
                min: i64::from(i32::MIN),
                max: i64::from(i32::MAX),
            }),
            TypeKind::Primitive(Primitive::Long) => Some(ValueFamily::Integral {
                min: i64::MIN,
                max: i64::MAX,
            }),
            TypeKind::Primitive(Primitive::Double) => Some(ValueFamily::Double),
            TypeKind::Enum { underlying } => self.value_family(*underlying),
            TypeKind::String => Some(ValueFamily::String),
            TypeKind::Span { element, .. } if *element == TypeId::CHAR => {
                Some(ValueFamily::String)
            }
            _ => None,
        }
    }

    /// Name of the built-in `Length` member.
    pub fn length_name(&self) -> Name {
        self.length
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

//! Type-reference graph: simple, complex, enum and data-io references.
//!
//! Simple references are plain values (`uint 16`). Complex, enum and data-io references
//! name a definition that is owned elsewhere (by whoever compiled the mspec document) and hold a
//! set-once slot for it. The slot stores a [`Weak`] back-reference, so circular type
//! graphs never form ownership cycles and a reference never keeps its definition alive.
//!
//! Slots are filled by [`resolve`](crate::resolve::resolve) after the whole document is
//! known. Until then [`NamedTypeReference::type_definition`] returns
//! [`TypeError::Unresolved`]. Equality and hashing only look at the name and
//! parameters, so references can be deduplicated before resolution.

use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::term::Term;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleBaseType {
    Bit,
    Byte,
    Int,
    Uint,
    Float,
    String,
}

impl SimpleBaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleBaseType::Bit => "bit",
            SimpleBaseType::Byte => "byte",
            SimpleBaseType::Int => "int",
            SimpleBaseType::Uint => "uint",
            SimpleBaseType::Float => "float",
            SimpleBaseType::String => "string",
        }
    }
}

/// Kind of a non-simple definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Complex,
    Enum,
    DataIo,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeKind::Complex => "complex",
            TypeKind::Enum => "enum",
            TypeKind::DataIo => "dataIo",
        })
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("type reference name must not be empty")]
    EmptyName,
    #[error("{base_type:?} type must be at least one bit wide")]
    ZeroWidth { base_type: SimpleBaseType },
    #[error("type reference {name} is not resolved")]
    Unresolved { name: String },
    #[error("definition bound to {name} no longer exists")]
    DefinitionDropped { name: String },
    #[error("type reference {name} expects a {expected} definition, got {actual}")]
    TypeMismatch {
        name: String,
        expected: TypeKind,
        actual: TypeKind,
    },
    #[error("type reference {name} is already bound to a different definition")]
    AlreadyBound { name: String },
}

// ==================== Simple references ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimpleTypeReference {
    base_type: SimpleBaseType,
    size_in_bits: u32,
}

impl SimpleTypeReference {
    pub fn new(base_type: SimpleBaseType, size_in_bits: u32) -> Result<Self, TypeError> {
        if size_in_bits == 0 {
            return Err(TypeError::ZeroWidth { base_type });
        }
        Ok(SimpleTypeReference {
            base_type,
            size_in_bits,
        })
    }

    pub fn bit() -> Self {
        SimpleTypeReference {
            base_type: SimpleBaseType::Bit,
            size_in_bits: 1,
        }
    }

    pub fn byte() -> Self {
        SimpleTypeReference {
            base_type: SimpleBaseType::Byte,
            size_in_bits: 8,
        }
    }

    pub fn base_type(&self) -> SimpleBaseType {
        self.base_type
    }

    pub fn size_in_bits(&self) -> u32 {
        self.size_in_bits
    }
}

impl fmt::Display for SimpleTypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base_type {
            SimpleBaseType::Bit | SimpleBaseType::Byte => f.write_str(self.base_type.as_str()),
            _ => write!(f, "{} {}", self.base_type.as_str(), self.size_in_bits),
        }
    }
}

// ==================== Definitions ====================

/// A typed name: a field of a complex type or a parser argument.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub type_reference: TypeReference,
}

impl Field {
    pub fn new(name: impl Into<String>, type_reference: impl Into<TypeReference>) -> Self {
        Field {
            name: name.into(),
            type_reference: type_reference.into(),
        }
    }
}

pub type Argument = Field;

#[derive(Debug)]
pub struct ComplexTypeDefinition {
    name: String,
    parser_arguments: Vec<Argument>,
    fields: Vec<Field>,
}

impl ComplexTypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        ComplexTypeDefinition {
            name: name.into(),
            parser_arguments: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.parser_arguments.push(argument);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parser_arguments(&self) -> &[Argument] {
        &self.parser_arguments
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    /// Discriminating value as written, e.g. `0x01`.
    pub value: String,
}

#[derive(Debug)]
pub struct EnumTypeDefinition {
    name: String,
    storage: Option<SimpleTypeReference>,
    values: Vec<EnumValue>,
}

impl EnumTypeDefinition {
    pub fn new(name: impl Into<String>, storage: Option<SimpleTypeReference>) -> Self {
        EnumTypeDefinition {
            name: name.into(),
            storage,
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push(EnumValue {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> Option<SimpleTypeReference> {
        self.storage
    }

    pub fn values(&self) -> &[EnumValue] {
        &self.values
    }
}

#[derive(Debug)]
pub struct DataIoTypeDefinition {
    name: String,
    parser_arguments: Vec<Argument>,
}

impl DataIoTypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        DataIoTypeDefinition {
            name: name.into(),
            parser_arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.parser_arguments.push(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parser_arguments(&self) -> &[Argument] {
        &self.parser_arguments
    }
}

/// Shared handle to a declared type. Cloning is cheap.
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Complex(Rc<ComplexTypeDefinition>),
    Enum(Rc<EnumTypeDefinition>),
    DataIo(Rc<DataIoTypeDefinition>),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Complex(d) => d.name(),
            TypeDefinition::Enum(d) => d.name(),
            TypeDefinition::DataIo(d) => d.name(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDefinition::Complex(_) => TypeKind::Complex,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::DataIo(_) => TypeKind::DataIo,
        }
    }

    /// Same underlying definition (not merely the same name).
    pub fn ptr_eq(&self, other: &TypeDefinition) -> bool {
        match (self, other) {
            (TypeDefinition::Complex(a), TypeDefinition::Complex(b)) => Rc::ptr_eq(a, b),
            (TypeDefinition::Enum(a), TypeDefinition::Enum(b)) => Rc::ptr_eq(a, b),
            (TypeDefinition::DataIo(a), TypeDefinition::DataIo(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<ComplexTypeDefinition> for TypeDefinition {
    fn from(d: ComplexTypeDefinition) -> Self {
        TypeDefinition::Complex(Rc::new(d))
    }
}

impl From<EnumTypeDefinition> for TypeDefinition {
    fn from(d: EnumTypeDefinition) -> Self {
        TypeDefinition::Enum(Rc::new(d))
    }
}

impl From<DataIoTypeDefinition> for TypeDefinition {
    fn from(d: DataIoTypeDefinition) -> Self {
        TypeDefinition::DataIo(Rc::new(d))
    }
}

/// Definition kinds a [`NamedTypeReference`] can bind to.
pub trait DefinitionKind: fmt::Debug {
    const KIND: TypeKind;

    fn select(definition: &TypeDefinition) -> Option<&Rc<Self>>;
}

impl DefinitionKind for ComplexTypeDefinition {
    const KIND: TypeKind = TypeKind::Complex;

    fn select(definition: &TypeDefinition) -> Option<&Rc<Self>> {
        match definition {
            TypeDefinition::Complex(d) => Some(d),
            _ => None,
        }
    }
}

impl DefinitionKind for EnumTypeDefinition {
    const KIND: TypeKind = TypeKind::Enum;

    fn select(definition: &TypeDefinition) -> Option<&Rc<Self>> {
        match definition {
            TypeDefinition::Enum(d) => Some(d),
            _ => None,
        }
    }
}

impl DefinitionKind for DataIoTypeDefinition {
    const KIND: TypeKind = TypeKind::DataIo;

    fn select(definition: &TypeDefinition) -> Option<&Rc<Self>> {
        match definition {
            TypeDefinition::DataIo(d) => Some(d),
            _ => None,
        }
    }
}

// ==================== Named references ====================

/// Reference to a complex, enum or data-io definition by name.
pub struct NamedTypeReference<D: DefinitionKind> {
    name: String,
    params: Option<Vec<Term>>,
    definition: OnceCell<Weak<D>>,
}

pub type ComplexTypeReference = NamedTypeReference<ComplexTypeDefinition>;
pub type EnumTypeReference = NamedTypeReference<EnumTypeDefinition>;
pub type DataIoTypeReference = NamedTypeReference<DataIoTypeDefinition>;

impl<D: DefinitionKind> NamedTypeReference<D> {
    pub fn new(name: impl Into<String>, params: Option<Vec<Term>>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::EmptyName);
        }
        Ok(NamedTypeReference {
            name,
            params,
            definition: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> Option<&[Term]> {
        self.params.as_deref()
    }

    pub fn expected_kind(&self) -> TypeKind {
        D::KIND
    }

    pub fn is_bound(&self) -> bool {
        self.definition.get().is_some()
    }

    /// The bound definition.
    pub fn type_definition(&self) -> Result<Rc<D>, TypeError> {
        let weak = self.definition.get().ok_or_else(|| TypeError::Unresolved {
            name: self.name.clone(),
        })?;
        weak.upgrade().ok_or_else(|| TypeError::DefinitionDropped {
            name: self.name.clone(),
        })
    }

    /// Check that `definition` could be bound here, without binding it.
    pub fn check_type_definition(&self, definition: &TypeDefinition) -> Result<(), TypeError> {
        self.select(definition).map(|_| ())
    }

    /// Bind the slot. Rebinding the same definition is a no-op.
    pub fn set_type_definition(&self, definition: &TypeDefinition) -> Result<(), TypeError> {
        if let Some(target) = self.select(definition)? {
            self.definition
                .set(Rc::downgrade(target))
                .map_err(|_| TypeError::AlreadyBound {
                    name: self.name.clone(),
                })?;
        }
        Ok(())
    }

    /// `Some(target)` when the slot is empty and must be filled, `None` when it
    /// already holds `definition`.
    fn select<'d>(&self, definition: &'d TypeDefinition) -> Result<Option<&'d Rc<D>>, TypeError> {
        let target = D::select(definition).ok_or_else(|| TypeError::TypeMismatch {
            name: self.name.clone(),
            expected: D::KIND,
            actual: definition.kind(),
        })?;
        match self.definition.get() {
            None => Ok(Some(target)),
            Some(existing) if std::ptr::eq(existing.as_ptr(), Rc::as_ptr(target)) => Ok(None),
            Some(_) => Err(TypeError::AlreadyBound {
                name: self.name.clone(),
            }),
        }
    }
}

impl EnumTypeReference {
    /// Storage type of the bound enum; `Ok(None)` when it declares no backing width.
    pub fn base_type_reference(&self) -> Result<Option<SimpleTypeReference>, TypeError> {
        Ok(self.type_definition()?.storage())
    }
}

impl<D: DefinitionKind> Clone for NamedTypeReference<D> {
    fn clone(&self) -> Self {
        NamedTypeReference {
            name: self.name.clone(),
            params: self.params.clone(),
            definition: self.definition.clone(),
        }
    }
}

impl<D: DefinitionKind> fmt::Debug for NamedTypeReference<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedTypeReference")
            .field("kind", &D::KIND)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<D: DefinitionKind> PartialEq for NamedTypeReference<D> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params
    }
}

impl<D: DefinitionKind> Eq for NamedTypeReference<D> {}

impl<D: DefinitionKind> Hash for NamedTypeReference<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.params.hash(state);
    }
}

impl<D: DefinitionKind> fmt::Display for NamedTypeReference<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(params) = &self.params {
            f.write_str("(")?;
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", p)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

// ==================== Any reference ====================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReference {
    Simple(SimpleTypeReference),
    Complex(ComplexTypeReference),
    Enum(EnumTypeReference),
    DataIo(DataIoTypeReference),
}

impl TypeReference {
    pub fn is_simple(&self) -> bool {
        matches!(self, TypeReference::Simple(_))
    }

    pub fn as_simple(&self) -> Option<&SimpleTypeReference> {
        match self {
            TypeReference::Simple(s) => Some(s),
            _ => None,
        }
    }

    /// Name of a non-simple reference.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeReference::Simple(_) => None,
            TypeReference::Complex(r) => Some(r.name()),
            TypeReference::Enum(r) => Some(r.name()),
            TypeReference::DataIo(r) => Some(r.name()),
        }
    }

    /// Kind of definition a non-simple reference binds to.
    pub fn expected_kind(&self) -> Option<TypeKind> {
        match self {
            TypeReference::Simple(_) => None,
            TypeReference::Complex(r) => Some(r.expected_kind()),
            TypeReference::Enum(r) => Some(r.expected_kind()),
            TypeReference::DataIo(r) => Some(r.expected_kind()),
        }
    }

    /// Simple references are always bound.
    pub fn is_bound(&self) -> bool {
        match self {
            TypeReference::Simple(_) => true,
            TypeReference::Complex(r) => r.is_bound(),
            TypeReference::Enum(r) => r.is_bound(),
            TypeReference::DataIo(r) => r.is_bound(),
        }
    }

    pub fn check_type_definition(&self, definition: &TypeDefinition) -> Result<(), TypeError> {
        match self {
            TypeReference::Simple(_) => Ok(()),
            TypeReference::Complex(r) => r.check_type_definition(definition),
            TypeReference::Enum(r) => r.check_type_definition(definition),
            TypeReference::DataIo(r) => r.check_type_definition(definition),
        }
    }

    /// Bind a non-simple reference. Simple references ignore the call.
    pub fn set_type_definition(&self, definition: &TypeDefinition) -> Result<(), TypeError> {
        match self {
            TypeReference::Simple(_) => Ok(()),
            TypeReference::Complex(r) => r.set_type_definition(definition),
            TypeReference::Enum(r) => r.set_type_definition(definition),
            TypeReference::DataIo(r) => r.set_type_definition(definition),
        }
    }

    /// The bound definition as a shared handle.
    pub fn type_definition(&self) -> Result<Option<TypeDefinition>, TypeError> {
        Ok(match self {
            TypeReference::Simple(_) => None,
            TypeReference::Complex(r) => Some(TypeDefinition::Complex(r.type_definition()?)),
            TypeReference::Enum(r) => Some(TypeDefinition::Enum(r.type_definition()?)),
            TypeReference::DataIo(r) => Some(TypeDefinition::DataIo(r.type_definition()?)),
        })
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::Simple(r) => fmt::Display::fmt(r, f),
            TypeReference::Complex(r) => fmt::Display::fmt(r, f),
            TypeReference::Enum(r) => fmt::Display::fmt(r, f),
            TypeReference::DataIo(r) => fmt::Display::fmt(r, f),
        }
    }
}

impl From<SimpleTypeReference> for TypeReference {
    fn from(r: SimpleTypeReference) -> Self {
        TypeReference::Simple(r)
    }
}

impl From<ComplexTypeReference> for TypeReference {
    fn from(r: ComplexTypeReference) -> Self {
        TypeReference::Complex(r)
    }
}

impl From<EnumTypeReference> for TypeReference {
    fn from(r: EnumTypeReference) -> Self {
        TypeReference::Enum(r)
    }
}

impl From<DataIoTypeReference> for TypeReference {
    fn from(r: DataIoTypeReference) -> Self {
        TypeReference::DataIo(r)
    }
}

//! # mspec: protocol-description core
//!
//! The reusable core behind message-specification (mspec) driven protocol code: one
//! abstract description yields bit-exact parsers and serializers for unrelated
//! field-bus protocols (S7, ADS, CANopen, Profinet, Modbus, ...).
//!
//! ## Modules
//!
//! - [`types`]: type-reference graph: simple references (`uint 16`) and named
//!   complex / enum / data-io references with a set-once definition slot.
//! - [`term`]: expression AST for lengths, conditions and discriminators, printed as
//!   mspec surface syntax.
//! - [`resolve`]: one-shot pass binding every collected reference, reporting all
//!   duplicate and missing names together.
//! - [`codec`]: bit-level [`ReadBuffer`] / [`WriteBuffer`] with declared widths and
//!   configurable byte order.
//! - [`context`]: structural path (`Message/field/element`) carried by buffer errors.
//!
//! ## Example
//!
//! ```
//! use mspec::{ByteOrder, Contextual, ReadBuffer, WriteBuffer};
//!
//! let mut wb = WriteBuffer::with_byte_order(2, ByteOrder::BigEndian);
//! wb.with_context("header", |wb| {
//!     wb.write_bit(true)?;
//!     wb.write_unsigned_short(7, 0x2A)
//! })?;
//! let bytes = wb.into_bytes();
//!
//! let mut rb = ReadBuffer::new(&bytes);
//! assert!(rb.read_bit()?);
//! assert_eq!(rb.read_unsigned_short(7)?, 0x2A);
//! assert_eq!(rb.pos(), 8);
//! # Ok::<(), mspec::CodecError>(())
//! ```
//!
//! Nothing here performs I/O, caches values between calls or spawns threads: buffers
//! are created per read or write and discarded afterwards.

pub mod codec;
pub mod context;
pub mod resolve;
pub mod term;
pub mod types;

pub use codec::{ByteOrder, CodecError, ReadBuffer, WriteBuffer};
pub use context::{ContextStack, Contextual};
pub use resolve::{
    collect_references, resolve, resolve_all, FieldPath, ReferenceSite, Registry, ResolveError,
    ResolveErrors,
};
pub use term::{
    BinaryTerm, Literal, NumericLiteral, TernaryTerm, Term, TermError, UnaryTerm, VariableLiteral,
};
pub use types::{
    ComplexTypeDefinition, ComplexTypeReference, DataIoTypeDefinition, DataIoTypeReference,
    EnumTypeDefinition, EnumTypeReference, Field, SimpleBaseType, SimpleTypeReference,
    TypeDefinition, TypeError, TypeKind, TypeReference,
};

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use valkit_issue::{ErrorOverride, Issue};
use valkit_value::{BoolCoercion, Map, Value};

use crate::array::TupleDef;
use crate::checks::Check;
use crate::compose::{LazyDef, TransformFn};
use crate::number::{FloatWidth, IntWidth};
use crate::object::ObjectDef;
use crate::record::{MapDef, RecordDef};
use crate::registry::global_registry;
use crate::union::DiscriminatedDef;

/// Process-unique identity of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SchemaId(u64);

impl SchemaId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SchemaId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema#{}", self.0)
    }
}

/// The kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    BigInt,
    Bool,
    Nil,
    Never,
    Any,
    Unknown,
    Date,
    Object,
    Record,
    Map,
    Array,
    Tuple,
    Union,
    Discriminated,
    Xor,
    Intersection,
    Pipe,
    Transform,
    Lazy,
    Literal,
    Enum,
    Email,
    Url,
    Uuid,
    Guid,
    Nanoid,
    Cuid,
    Cuid2,
    Ulid,
    Xid,
    Ksuid,
    Emoji,
    Jwt,
    Base64,
    Base64Url,
    Hex,
    Ipv4,
    Ipv6,
    Cidrv4,
    Cidrv6,
    E164,
    IsoDatetime,
    IsoDate,
    IsoTime,
    IsoDuration,
}

impl TypeCode {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeCode::String => "string",
            TypeCode::Int => "int",
            TypeCode::Int8 => "int8",
            TypeCode::Int16 => "int16",
            TypeCode::Int32 => "int32",
            TypeCode::Int64 => "int64",
            TypeCode::Uint => "uint",
            TypeCode::Uint8 => "uint8",
            TypeCode::Uint16 => "uint16",
            TypeCode::Uint32 => "uint32",
            TypeCode::Uint64 => "uint64",
            TypeCode::Float32 => "float32",
            TypeCode::Float64 => "float64",
            TypeCode::BigInt => "bigint",
            TypeCode::Bool => "bool",
            TypeCode::Nil => "nil",
            TypeCode::Never => "never",
            TypeCode::Any => "any",
            TypeCode::Unknown => "unknown",
            TypeCode::Date => "date",
            TypeCode::Object => "object",
            TypeCode::Record => "record",
            TypeCode::Map => "map",
            TypeCode::Array => "array",
            TypeCode::Tuple => "tuple",
            TypeCode::Union => "union",
            TypeCode::Discriminated => "discriminated",
            TypeCode::Xor => "xor",
            TypeCode::Intersection => "intersection",
            TypeCode::Pipe => "pipe",
            TypeCode::Transform => "transform",
            TypeCode::Lazy => "lazy",
            TypeCode::Literal => "literal",
            TypeCode::Enum => "enum",
            TypeCode::Email => "email",
            TypeCode::Url => "url",
            TypeCode::Uuid => "uuid",
            TypeCode::Guid => "guid",
            TypeCode::Nanoid => "nanoid",
            TypeCode::Cuid => "cuid",
            TypeCode::Cuid2 => "cuid2",
            TypeCode::Ulid => "ulid",
            TypeCode::Xid => "xid",
            TypeCode::Ksuid => "ksuid",
            TypeCode::Emoji => "emoji",
            TypeCode::Jwt => "jwt",
            TypeCode::Base64 => "base64",
            TypeCode::Base64Url => "base64url",
            TypeCode::Hex => "hex",
            TypeCode::Ipv4 => "ipv4",
            TypeCode::Ipv6 => "ipv6",
            TypeCode::Cidrv4 => "cidrv4",
            TypeCode::Cidrv6 => "cidrv6",
            TypeCode::E164 => "e164",
            TypeCode::IsoDatetime => "iso_datetime",
            TypeCode::IsoDate => "iso_date",
            TypeCode::IsoTime => "iso_time",
            TypeCode::IsoDuration => "iso_duration",
        }
    }

    /// Name reported as `expected` in `invalid_type` issues.
    pub fn expected(self) -> &'static str {
        match self {
            TypeCode::Int
            | TypeCode::Int8
            | TypeCode::Int16
            | TypeCode::Int32
            | TypeCode::Int64
            | TypeCode::Uint
            | TypeCode::Uint8
            | TypeCode::Uint16
            | TypeCode::Uint32
            | TypeCode::Uint64 => "int",
            TypeCode::Float32 | TypeCode::Float64 => "number",
            TypeCode::Bool => "boolean",
            TypeCode::Object | TypeCode::Discriminated => "object",
            TypeCode::Union | TypeCode::Xor => "union",
            code if code.is_string_format() => "string",
            code => code.as_str(),
        }
    }

    /// True for `string` and every string format leaf.
    pub fn is_string_format(self) -> bool {
        matches!(
            self,
            TypeCode::String
                | TypeCode::Email
                | TypeCode::Url
                | TypeCode::Uuid
                | TypeCode::Guid
                | TypeCode::Nanoid
                | TypeCode::Cuid
                | TypeCode::Cuid2
                | TypeCode::Ulid
                | TypeCode::Xid
                | TypeCode::Ksuid
                | TypeCode::Emoji
                | TypeCode::Jwt
                | TypeCode::Base64
                | TypeCode::Base64Url
                | TypeCode::Hex
                | TypeCode::Ipv4
                | TypeCode::Ipv6
                | TypeCode::Cidrv4
                | TypeCode::Cidrv6
                | TypeCode::E164
                | TypeCode::IsoDatetime
                | TypeCode::IsoDate
                | TypeCode::IsoTime
                | TypeCode::IsoDuration
        )
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Flags {
    pub(crate) optional: bool,
    pub(crate) nilable: bool,
    pub(crate) non_optional: bool,
    pub(crate) exact_optional: bool,
    pub(crate) readonly: bool,
}

/// A default or prefault source.
#[derive(Clone)]
pub(crate) enum Fill {
    Value(Value),
    Func(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Fill {
    pub(crate) fn get(&self) -> Value {
        match self {
            Fill::Value(v) => v.clone(),
            Fill::Func(f) => f(),
        }
    }
}

/// What a `catch_with` fallback sees.
pub struct CatchContext<'a> {
    /// The issues that are being discarded.
    pub issues: &'a [Issue],
    /// The input the failed frame received.
    pub input: &'a Value,
}

pub(crate) type CatchFn = Arc<dyn Fn(&CatchContext<'_>) -> Value + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Catch {
    Value(Value),
    Func(CatchFn),
}

/// Variant-specific definition of a schema node.
#[derive(Clone)]
pub(crate) enum Def {
    String,
    Int(IntWidth),
    Float(FloatWidth),
    Bool(Arc<BoolCoercion>),
    BigInt,
    Date,
    Nil,
    Never,
    Any,
    Unknown,
    Literal(Vec<Value>),
    Enum(Vec<Value>),
    Array(Schema),
    Tuple(TupleDef),
    Object(ObjectDef),
    Record(RecordDef),
    Map(MapDef),
    Union(Vec<Schema>),
    Discriminated(Arc<DiscriminatedDef>),
    Xor(Vec<Schema>),
    Intersection(Schema, Schema),
    Pipe(Schema, Schema),
    Transform(TransformFn),
    Lazy(Arc<LazyDef>),
}

/// The immutable record behind every schema handle.
#[derive(Clone)]
pub(crate) struct Internals {
    pub(crate) id: SchemaId,
    pub(crate) code: TypeCode,
    pub(crate) def: Def,
    pub(crate) checks: Vec<Check>,
    pub(crate) coerce: bool,
    pub(crate) flags: Flags,
    pub(crate) default: Option<Fill>,
    pub(crate) prefault: Option<Fill>,
    pub(crate) catch: Option<Catch>,
    pub(crate) error: Option<ErrorOverride>,
    pub(crate) bag: Map,
    pub(crate) registered: bool,
}

impl Internals {
    pub(crate) fn new(code: TypeCode, def: Def) -> Self {
        Self {
            id: SchemaId::next(),
            code,
            def,
            checks: Vec::new(),
            coerce: false,
            flags: Flags::default(),
            default: None,
            prefault: None,
            catch: None,
            error: None,
            bag: Map::new(),
            registered: false,
        }
    }
}

impl Drop for Internals {
    fn drop(&mut self) {
        if self.registered {
            global_registry().remove(self.id);
        }
    }
}

/// An immutable, cheaply clonable schema producing `T`.
///
/// Every modifier returns a new schema; the receiver is never changed.
pub struct Schema<T = Value> {
    pub(crate) inner: Arc<Internals>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("id", &self.inner.id)
            .field("code", &self.inner.code)
            .field("checks", &self.inner.checks.len())
            .finish()
    }
}

impl<T> Schema<T> {
    pub(crate) fn new(code: TypeCode, def: Def) -> Self {
        Self::from_internals(Internals::new(code, def))
    }

    pub(crate) fn from_internals(internals: Internals) -> Self {
        Self {
            inner: Arc::new(internals),
            marker: PhantomData,
        }
    }

    /// Clone the internals into a new node and let `f` adjust them.
    pub(crate) fn derive<U>(&self, f: impl FnOnce(&mut Internals)) -> Schema<U> {
        let mut next = Internals::clone(&self.inner);
        next.id = SchemaId::next();
        next.registered = false;
        if self.inner.registered {
            if let Some(meta) = global_registry().get(self.inner.id) {
                global_registry().add(next.id, meta);
                next.registered = true;
            }
        }
        f(&mut next);
        Schema::from_internals(next)
    }

    /// The same node viewed with a different output type.
    pub(crate) fn retype<U>(&self) -> Schema<U> {
        Schema {
            inner: Arc::clone(&self.inner),
            marker: PhantomData,
        }
    }

    /// The same node producing untyped values.
    pub fn erase(&self) -> Schema<Value> {
        self.retype()
    }

    pub fn id(&self) -> SchemaId {
        self.inner.id
    }

    pub fn type_code(&self) -> TypeCode {
        self.inner.code
    }

    /// Opaque per-type metadata (format name, pattern, bounds).
    pub fn bag(&self) -> &Map {
        &self.inner.bag
    }

    pub fn is_optional(&self) -> bool {
        self.inner.flags.optional || self.inner.flags.exact_optional
    }

    pub fn is_nilable(&self) -> bool {
        self.inner.flags.nilable
    }

    pub fn is_readonly(&self) -> bool {
        self.inner.flags.readonly
    }

    pub fn is_coercing(&self) -> bool {
        self.inner.coerce
    }

    pub fn has_default(&self) -> bool {
        self.inner.default.is_some()
    }

    pub fn has_prefault(&self) -> bool {
        self.inner.prefault.is_some()
    }

    /// Number of checks registered on this node.
    pub fn check_count(&self) -> usize {
        self.inner.checks.len()
    }
}

/// Anything that can be used where an untyped schema is expected.
pub trait IntoSchema {
    fn into_schema(self) -> Schema;
}

impl<T> IntoSchema for Schema<T> {
    fn into_schema(self) -> Schema {
        self.retype()
    }
}

impl<T> IntoSchema for &Schema<T> {
    fn into_schema(self) -> Schema {
        self.retype()
    }
}

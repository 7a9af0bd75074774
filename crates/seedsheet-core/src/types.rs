use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Generic value category resolved from a native database type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Integer,
    Decimal,
    Float,
    Boolean,
    String,
    Date,
    Time,
    DateTime,
    Binary,
    Guid,
    Xml,
    Unknown,
}

/// Closed storage vocabulary shared by validation selection and literal rendering.
///
/// The serialized names are part of the header metadata format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorageTag {
    Int64,
    Int32,
    Int16,
    Byte,
    Boolean,
    StringFixed,
    StringVariable,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Single,
    Binary,
    Guid,
    Xml,
    Object,
}

impl StorageTag {
    /// Every tag, in declaration order.
    pub const ALL: [StorageTag; 18] = [
        StorageTag::Int64,
        StorageTag::Int32,
        StorageTag::Int16,
        StorageTag::Byte,
        StorageTag::Boolean,
        StorageTag::StringFixed,
        StorageTag::StringVariable,
        StorageTag::Date,
        StorageTag::Time,
        StorageTag::DateTime,
        StorageTag::DateTimeOffset,
        StorageTag::Decimal,
        StorageTag::Double,
        StorageTag::Single,
        StorageTag::Binary,
        StorageTag::Guid,
        StorageTag::Xml,
        StorageTag::Object,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageTag::Int64 => "int64",
            StorageTag::Int32 => "int32",
            StorageTag::Int16 => "int16",
            StorageTag::Byte => "byte",
            StorageTag::Boolean => "boolean",
            StorageTag::StringFixed => "string_fixed",
            StorageTag::StringVariable => "string_variable",
            StorageTag::Date => "date",
            StorageTag::Time => "time",
            StorageTag::DateTime => "date_time",
            StorageTag::DateTimeOffset => "date_time_offset",
            StorageTag::Decimal => "decimal",
            StorageTag::Double => "double",
            StorageTag::Single => "single",
            StorageTag::Binary => "binary",
            StorageTag::Guid => "guid",
            StorageTag::Xml => "xml",
            StorageTag::Object => "object",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            StorageTag::StringFixed | StorageTag::StringVariable | StorageTag::Xml
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            StorageTag::Int64 | StorageTag::Int32 | StorageTag::Int16 | StorageTag::Byte
        )
    }
}

impl fmt::Display for StorageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageTag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        StorageTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown storage tag '{value}'"))
    }
}

/// Result of looking up a native type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    pub semantic_type: SemanticType,
    pub storage: StorageTag,
}

impl TypeMapping {
    pub const FALLBACK: TypeMapping = TypeMapping {
        semantic_type: SemanticType::Unknown,
        storage: StorageTag::Object,
    };

    pub const fn new(semantic_type: SemanticType, storage: StorageTag) -> Self {
        Self {
            semantic_type,
            storage,
        }
    }
}

/// Native type name → semantic type lookup, keyed case-insensitively.
///
/// Unknown names resolve to [`TypeMapping::FALLBACK`] instead of failing, so a
/// schema read never aborts on an unrecognized column type.
#[derive(Debug, Clone, Default)]
pub struct NativeTypeMapping {
    entries: HashMap<String, TypeMapping>,
}

static SQL_SERVER: LazyLock<NativeTypeMapping> = LazyLock::new(NativeTypeMapping::sql_server);
static POSTGRES: LazyLock<NativeTypeMapping> = LazyLock::new(NativeTypeMapping::postgres);

impl NativeTypeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a native type.
    pub fn with_type(
        mut self,
        native_type: &str,
        semantic_type: SemanticType,
        storage: StorageTag,
    ) -> Self {
        self.insert(native_type, semantic_type, storage);
        self
    }

    pub fn insert(&mut self, native_type: &str, semantic_type: SemanticType, storage: StorageTag) {
        self.entries.insert(
            native_type.trim().to_lowercase(),
            TypeMapping::new(semantic_type, storage),
        );
    }

    pub fn get(&self, native_type: &str) -> Option<TypeMapping> {
        self.entries
            .get(&native_type.trim().to_lowercase())
            .copied()
    }

    /// Resolve a native type, falling back to `unknown`/`object`.
    pub fn resolve(&self, native_type: &str) -> TypeMapping {
        self.get(native_type).unwrap_or(TypeMapping::FALLBACK)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared read-only SQL Server table.
    pub fn default_sql_server() -> &'static NativeTypeMapping {
        &SQL_SERVER
    }

    /// Shared read-only PostgreSQL table.
    pub fn default_postgres() -> &'static NativeTypeMapping {
        &POSTGRES
    }

    pub fn sql_server() -> Self {
        use SemanticType as S;
        use StorageTag as T;

        Self::new()
            .with_type("bigint", S::Integer, T::Int64)
            .with_type("binary", S::Binary, T::Binary)
            .with_type("bit", S::Boolean, T::Boolean)
            .with_type("char", S::String, T::StringFixed)
            .with_type("date", S::Date, T::Date)
            .with_type("datetime", S::DateTime, T::DateTime)
            .with_type("datetime2", S::DateTime, T::DateTime)
            .with_type("datetimeoffset", S::DateTime, T::DateTimeOffset)
            .with_type("decimal", S::Decimal, T::Decimal)
            .with_type("float", S::Float, T::Double)
            .with_type("image", S::Binary, T::Binary)
            .with_type("int", S::Integer, T::Int32)
            .with_type("money", S::Decimal, T::Decimal)
            .with_type("nchar", S::String, T::StringFixed)
            .with_type("ntext", S::String, T::StringVariable)
            .with_type("numeric", S::Decimal, T::Decimal)
            .with_type("nvarchar", S::String, T::StringVariable)
            .with_type("real", S::Float, T::Single)
            .with_type("rowversion", S::Binary, T::Binary)
            .with_type("smalldatetime", S::DateTime, T::DateTime)
            .with_type("smallint", S::Integer, T::Int16)
            .with_type("smallmoney", S::Decimal, T::Decimal)
            .with_type("sql_variant", S::Unknown, T::Object)
            .with_type("text", S::String, T::StringVariable)
            .with_type("time", S::Time, T::Time)
            .with_type("timestamp", S::Binary, T::Binary)
            .with_type("tinyint", S::Integer, T::Byte)
            .with_type("uniqueidentifier", S::Guid, T::Guid)
            .with_type("varbinary", S::Binary, T::Binary)
            .with_type("varchar", S::String, T::StringVariable)
            .with_type("xml", S::Xml, T::Xml)
    }

    pub fn postgres() -> Self {
        use SemanticType as S;
        use StorageTag as T;

        Self::new()
            .with_type("int8", S::Integer, T::Int64)
            .with_type("bigint", S::Integer, T::Int64)
            .with_type("int4", S::Integer, T::Int32)
            .with_type("integer", S::Integer, T::Int32)
            .with_type("int2", S::Integer, T::Int16)
            .with_type("smallint", S::Integer, T::Int16)
            .with_type("bool", S::Boolean, T::Boolean)
            .with_type("boolean", S::Boolean, T::Boolean)
            .with_type("bpchar", S::String, T::StringFixed)
            .with_type("char", S::String, T::StringFixed)
            .with_type("character", S::String, T::StringFixed)
            .with_type("varchar", S::String, T::StringVariable)
            .with_type("character varying", S::String, T::StringVariable)
            .with_type("text", S::String, T::StringVariable)
            .with_type("citext", S::String, T::StringVariable)
            .with_type("json", S::String, T::StringVariable)
            .with_type("jsonb", S::String, T::StringVariable)
            .with_type("date", S::Date, T::Date)
            .with_type("time", S::Time, T::Time)
            .with_type("time without time zone", S::Time, T::Time)
            .with_type("timestamp", S::DateTime, T::DateTime)
            .with_type("timestamp without time zone", S::DateTime, T::DateTime)
            .with_type("timestamptz", S::DateTime, T::DateTimeOffset)
            .with_type("timestamp with time zone", S::DateTime, T::DateTimeOffset)
            .with_type("numeric", S::Decimal, T::Decimal)
            .with_type("decimal", S::Decimal, T::Decimal)
            .with_type("money", S::Decimal, T::Decimal)
            .with_type("float8", S::Float, T::Double)
            .with_type("double precision", S::Float, T::Double)
            .with_type("float4", S::Float, T::Single)
            .with_type("real", S::Float, T::Single)
            .with_type("bytea", S::Binary, T::Binary)
            .with_type("uuid", S::Guid, T::Guid)
            .with_type("xml", S::Xml, T::Xml)
    }
}

//! Validation-rule selection and literal rendering keyed by [`StorageTag`].
//!
//! Export uses [`TypePolicy::resolve_column`] to decide which advisory
//! validation a header column gets; import uses [`render_literal`] to turn a
//! raw cell into source text. Both sides only look at the storage tag, which
//! is what keeps the round trip stable.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{Column, ForeignKeyRef};
use crate::types::{NativeTypeMapping, SemanticType, StorageTag};

/// Literal emitted for a missing cell.
pub const EMPTY_LITERAL: &str = "String::new()";

/// Advisory constraint attached to a column's data range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationRule {
    None,
    BooleanList { values: Vec<String> },
    BoundedInteger { min: i64, max: i64 },
    ForeignKeyList { target_table: String, target_column: String },
    DateFormat,
    TimeFormat,
    TextLength { max: u32 },
}

impl ValidationRule {
    pub fn boolean_list() -> Self {
        ValidationRule::BooleanList {
            values: vec!["0".to_string(), "1".to_string()],
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ValidationRule::None)
    }
}

/// Everything the policy decides for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub semantic_type: SemanticType,
    pub storage: StorageTag,
    pub validation: ValidationRule,
    pub literal_rule: LiteralRule,
    /// Blank cells pass validation when the column is nullable.
    pub allow_blank: bool,
}

/// Maps native types and column constraints to storage tags and validation rules.
#[derive(Debug, Clone)]
pub struct TypePolicy {
    mapping: NativeTypeMapping,
}

impl TypePolicy {
    pub fn new(mapping: NativeTypeMapping) -> Self {
        Self { mapping }
    }

    pub fn sql_server() -> Self {
        Self::new(NativeTypeMapping::default_sql_server().clone())
    }

    pub fn postgres() -> Self {
        Self::new(NativeTypeMapping::default_postgres().clone())
    }

    pub fn mapping(&self) -> &NativeTypeMapping {
        &self.mapping
    }

    /// Resolve a column from raw facts, looking the native type up in the mapping.
    pub fn resolve(
        &self,
        native_type: &str,
        max_length: u32,
        is_nullable: bool,
        foreign_key: Option<&ForeignKeyRef>,
        is_primary_key: bool,
    ) -> Resolution {
        let mapping = self.mapping.resolve(native_type);
        Resolution {
            semantic_type: mapping.semantic_type,
            storage: mapping.storage,
            validation: validation_rule(mapping.storage, max_length, foreign_key, is_primary_key),
            literal_rule: LiteralRule::for_storage(mapping.storage),
            allow_blank: is_nullable,
        }
    }

    /// Resolve an already-typed column; its recorded storage tag wins over the mapping.
    pub fn resolve_column(&self, column: &Column) -> Resolution {
        Resolution {
            semantic_type: column.semantic_type,
            storage: column.storage,
            validation: validation_rule(
                column.storage,
                column.max_length,
                column.foreign_key(),
                column.is_primary_key,
            ),
            literal_rule: LiteralRule::for_storage(column.storage),
            allow_blank: column.is_nullable,
        }
    }
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self::sql_server()
    }
}

/// Pick the validation rule for a column.
///
/// A foreign key pick-list wins over any type-based rule; a foreign key that
/// is also the primary key gets no pick-list and no integer bound.
pub fn validation_rule(
    storage: StorageTag,
    max_length: u32,
    foreign_key: Option<&ForeignKeyRef>,
    is_primary_key: bool,
) -> ValidationRule {
    if let Some(fk) = foreign_key {
        if !is_primary_key {
            return ValidationRule::ForeignKeyList {
                target_table: fk.table_full_name(),
                target_column: fk.column.clone(),
            };
        }
    }

    match storage {
        StorageTag::Date | StorageTag::DateTime | StorageTag::DateTimeOffset => {
            ValidationRule::DateFormat
        }
        StorageTag::Time => ValidationRule::TimeFormat,
        StorageTag::Boolean => ValidationRule::boolean_list(),
        StorageTag::StringFixed | StorageTag::StringVariable if max_length > 0 => {
            ValidationRule::TextLength { max: max_length }
        }
        StorageTag::Int32 if foreign_key.is_none() => ValidationRule::BoundedInteger {
            min: 0,
            max: i64::from(i32::MAX),
        },
        StorageTag::Int16 if foreign_key.is_none() => ValidationRule::BoundedInteger {
            min: i64::from(i16::MIN),
            max: i64::from(i16::MAX),
        },
        StorageTag::Byte if foreign_key.is_none() => ValidationRule::BoundedInteger {
            min: 0,
            max: i64::from(u8::MAX),
        },
        _ => ValidationRule::None,
    }
}

/// How a rendered literal must be treated by templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    /// Ready-to-use source expression.
    Expression,
    /// Raw cell text; the template decides how to quote it.
    Text,
    /// Stand-in for a missing cell.
    Empty,
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub text: String,
    pub kind: LiteralKind,
}

impl Literal {
    pub fn expression(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LiteralKind::Expression,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LiteralKind::Text,
        }
    }

    pub fn empty() -> Self {
        Self {
            text: EMPTY_LITERAL.to_string(),
            kind: LiteralKind::Empty,
        }
    }
}

/// A cell value that cannot be coerced into its column's storage tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot render '{raw}' as {storage}: {reason}")]
pub struct LiteralError {
    pub storage: StorageTag,
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
    DateTimeOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    Int64,
    Int32,
    Int16,
    Byte,
    Decimal,
    Double,
    Single,
}

/// Literal-rendering rule resolved from a storage tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "of", rename_all = "snake_case")]
pub enum LiteralRule {
    Bytes,
    Boolean,
    Text,
    Temporal(TemporalKind),
    Number(NumberKind),
    Guid,
    Quoted,
}

impl LiteralRule {
    fn keeps_whitespace(self) -> bool {
        matches!(self, LiteralRule::Text | LiteralRule::Quoted)
    }

    pub fn for_storage(storage: StorageTag) -> Self {
        match storage {
            StorageTag::Binary => LiteralRule::Bytes,
            StorageTag::Boolean => LiteralRule::Boolean,
            StorageTag::StringFixed | StorageTag::StringVariable | StorageTag::Xml => {
                LiteralRule::Text
            }
            StorageTag::Date => LiteralRule::Temporal(TemporalKind::Date),
            StorageTag::Time => LiteralRule::Temporal(TemporalKind::Time),
            StorageTag::DateTime => LiteralRule::Temporal(TemporalKind::DateTime),
            StorageTag::DateTimeOffset => LiteralRule::Temporal(TemporalKind::DateTimeOffset),
            StorageTag::Int64 => LiteralRule::Number(NumberKind::Int64),
            StorageTag::Int32 => LiteralRule::Number(NumberKind::Int32),
            StorageTag::Int16 => LiteralRule::Number(NumberKind::Int16),
            StorageTag::Byte => LiteralRule::Number(NumberKind::Byte),
            StorageTag::Decimal => LiteralRule::Number(NumberKind::Decimal),
            StorageTag::Double => LiteralRule::Number(NumberKind::Double),
            StorageTag::Single => LiteralRule::Number(NumberKind::Single),
            StorageTag::Guid => LiteralRule::Guid,
            StorageTag::Object => LiteralRule::Quoted,
        }
    }

    /// Render one raw cell. A missing or empty cell always yields [`Literal::empty`];
    /// so does a whitespace-only cell unless the rule keeps text verbatim.
    pub fn render(self, raw: Option<&str>) -> Result<Literal, String> {
        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Literal::empty()),
        };
        if raw.trim().is_empty() && !self.keeps_whitespace() {
            return Ok(Literal::empty());
        }

        match self {
            LiteralRule::Text => Ok(Literal::text(raw)),
            LiteralRule::Quoted => Ok(Literal::expression(format!("{raw:?}"))),
            LiteralRule::Boolean => Ok(Literal::expression(if raw.trim() == "0" {
                "false"
            } else {
                "true"
            })),
            LiteralRule::Bytes => render_bytes(raw.trim()),
            LiteralRule::Temporal(kind) => render_temporal(kind, raw.trim()),
            LiteralRule::Number(kind) => render_number(kind, raw.trim()),
            LiteralRule::Guid => {
                let value = uuid::Uuid::parse_str(raw.trim()).map_err(|err| err.to_string())?;
                Ok(Literal::expression(format!(
                    "uuid::Uuid::parse_str(\"{}\")?",
                    value.hyphenated()
                )))
            }
        }
    }
}

/// Render a raw cell for a storage tag. Total over every tag; only the value
/// can fail, never the tag.
pub fn render_literal(storage: StorageTag, raw: Option<&str>) -> Result<Literal, LiteralError> {
    LiteralRule::for_storage(storage)
        .render(raw)
        .map_err(|reason| LiteralError {
            storage,
            raw: raw.unwrap_or_default().to_string(),
            reason,
        })
}

fn render_bytes(raw: &str) -> Result<Literal, String> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("expected an even number of hex digits after 0x".to_string());
        }
        let bytes: Vec<String> = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| format!("0x{}", String::from_utf8_lossy(pair).to_uppercase()))
            .collect();
        return Ok(Literal::expression(format!("vec![{}]", bytes.join(", "))));
    }

    let value: u64 = raw
        .parse()
        .map_err(|_| "expected an unsigned integer or 0x-prefixed hex".to_string())?;
    Ok(Literal::expression(format!("{value}_u64.to_le_bytes().to_vec()")))
}

fn render_number(kind: NumberKind, raw: &str) -> Result<Literal, String> {
    let parsed = match kind {
        NumberKind::Int64 => raw.parse::<i64>().map(|_| ()).map_err(|e| e.to_string()),
        NumberKind::Int32 => raw.parse::<i32>().map(|_| ()).map_err(|e| e.to_string()),
        NumberKind::Int16 => raw.parse::<i16>().map(|_| ()).map_err(|e| e.to_string()),
        NumberKind::Byte => raw.parse::<u8>().map(|_| ()).map_err(|e| e.to_string()),
        NumberKind::Decimal | NumberKind::Double => finite(raw.parse::<f64>().ok().map(|v| v.is_finite())),
        NumberKind::Single => finite(raw.parse::<f32>().ok().map(|v| v.is_finite())),
    };
    parsed?;
    Ok(Literal::expression(raw))
}

fn finite(parsed: Option<bool>) -> Result<(), String> {
    match parsed {
        Some(true) => Ok(()),
        Some(false) => Err("value is not finite".to_string()),
        None => Err("invalid number".to_string()),
    }
}

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date_time(raw).map(|value| value.date()))
}

fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

fn parse_date_time_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f %z").ok())
}

fn render_temporal(kind: TemporalKind, raw: &str) -> Result<Literal, String> {
    let expression = match kind {
        TemporalKind::Date => parse_date(raw).map(|value| {
            format!(
                "\"{}\".parse::<chrono::NaiveDate>()?",
                value.format("%Y-%m-%d")
            )
        }),
        TemporalKind::Time => parse_time(raw).map(|value| {
            format!(
                "\"{}\".parse::<chrono::NaiveTime>()?",
                value.format("%H:%M:%S%.f")
            )
        }),
        TemporalKind::DateTime => parse_date_time(raw).map(|value| {
            format!(
                "\"{}\".parse::<chrono::NaiveDateTime>()?",
                value.format("%Y-%m-%dT%H:%M:%S%.f")
            )
        }),
        TemporalKind::DateTimeOffset => parse_date_time_offset(raw).map(|value| {
            format!(
                "chrono::DateTime::parse_from_rfc3339(\"{}\")?",
                value.to_rfc3339()
            )
        }),
    };

    expression
        .map(Literal::expression)
        .ok_or_else(|| format!("unrecognized {kind:?} value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(storage: StorageTag) -> &'static str {
        match storage {
            StorageTag::Int64 | StorageTag::Int32 | StorageTag::Int16 | StorageTag::Byte => "42",
            StorageTag::Boolean => "1",
            StorageTag::Date => "2024-01-15",
            StorageTag::Time => "08:30",
            StorageTag::DateTime => "2024-01-15 08:30:00",
            StorageTag::DateTimeOffset => "2024-01-15T08:30:00+02:00",
            StorageTag::Decimal | StorageTag::Double | StorageTag::Single => "12.5",
            StorageTag::Binary => "255",
            StorageTag::Guid => "1f0e8c7a-5b3d-4e2f-9a1b-2c3d4e5f6a7b",
            StorageTag::StringFixed
            | StorageTag::StringVariable
            | StorageTag::Xml
            | StorageTag::Object => "hello",
        }
    }

    #[test]
    fn every_storage_tag_renders_a_literal() {
        for storage in StorageTag::ALL {
            let literal = render_literal(storage, Some(sample(storage)))
                .unwrap_or_else(|err| panic!("{storage}: {err}"));
            assert!(!literal.text.is_empty(), "{storage} rendered empty text");
            assert_ne!(literal.kind, LiteralKind::Empty);
        }
    }

    #[test]
    fn missing_cells_render_the_empty_literal() {
        for storage in StorageTag::ALL {
            assert_eq!(render_literal(storage, None), Ok(Literal::empty()));
            assert_eq!(render_literal(storage, Some("")), Ok(Literal::empty()));
        }
        assert_eq!(Literal::empty().text, EMPTY_LITERAL);
    }

    #[test]
    fn whitespace_only_cells_are_empty_unless_kept_verbatim() {
        for storage in StorageTag::ALL {
            let literal = render_literal(storage, Some("  \t ")).expect("render blank cell");
            match LiteralRule::for_storage(storage) {
                LiteralRule::Text | LiteralRule::Quoted => {
                    assert_ne!(literal.kind, LiteralKind::Empty, "{storage}")
                }
                _ => assert_eq!(literal, Literal::empty(), "{storage}"),
            }
        }
    }

    #[test]
    fn renders_per_storage_family() {
        let render = |storage, raw| render_literal(storage, Some(raw)).expect("render").text;

        assert_eq!(render(StorageTag::Boolean, "0"), "false");
        assert_eq!(render(StorageTag::Boolean, "yes"), "true");
        assert_eq!(render(StorageTag::StringVariable, " as typed "), " as typed ");
        assert_eq!(render(StorageTag::Int32, "-7"), "-7");
        assert_eq!(render(StorageTag::Decimal, "19.99"), "19.99");
        assert_eq!(render(StorageTag::Object, "say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(render(StorageTag::Binary, "1"), "1_u64.to_le_bytes().to_vec()");
        assert_eq!(render(StorageTag::Binary, "0x0aff"), "vec![0x0A, 0xFF]");
        assert_eq!(
            render(StorageTag::Date, "2024-02-29"),
            "\"2024-02-29\".parse::<chrono::NaiveDate>()?"
        );
        assert_eq!(
            render(StorageTag::DateTime, "2024-02-29 13:45"),
            "\"2024-02-29T13:45:00\".parse::<chrono::NaiveDateTime>()?"
        );
        assert_eq!(
            render(StorageTag::Guid, "1F0E8C7A-5B3D-4E2F-9A1B-2C3D4E5F6A7B"),
            "uuid::Uuid::parse_str(\"1f0e8c7a-5b3d-4e2f-9a1b-2c3d4e5f6a7b\")?"
        );
    }

    #[test]
    fn unrenderable_values_are_reported() {
        let err = render_literal(StorageTag::Int32, Some("twelve")).unwrap_err();
        assert_eq!(err.storage, StorageTag::Int32);
        assert_eq!(err.raw, "twelve");
        assert!(render_literal(StorageTag::Byte, Some("256")).is_err());
        assert!(render_literal(StorageTag::Double, Some("NaN")).is_err());
        assert!(render_literal(StorageTag::Date, Some("15/01/2024")).is_err());
        assert!(render_literal(StorageTag::Binary, Some("0xABC")).is_err());
    }

    #[test]
    fn foreign_key_list_takes_precedence() {
        let fk = ForeignKeyRef::new("dbo", "Customers", "Id");
        assert_eq!(
            validation_rule(StorageTag::Int32, 0, Some(&fk), false),
            ValidationRule::ForeignKeyList {
                target_table: "dbo.Customers".to_string(),
                target_column: "Id".to_string(),
            }
        );
        assert_eq!(
            validation_rule(StorageTag::Int32, 0, Some(&fk), true),
            ValidationRule::None
        );
    }

    #[test]
    fn type_based_rules() {
        assert_eq!(
            validation_rule(StorageTag::Boolean, 0, None, false),
            ValidationRule::boolean_list()
        );
        assert_eq!(
            validation_rule(StorageTag::StringVariable, 50, None, false),
            ValidationRule::TextLength { max: 50 }
        );
        assert!(validation_rule(StorageTag::StringVariable, 0, None, false).is_none());
        assert_eq!(
            validation_rule(StorageTag::Int32, 0, None, true),
            ValidationRule::BoundedInteger {
                min: 0,
                max: i64::from(i32::MAX)
            }
        );
        assert!(validation_rule(StorageTag::Int64, 0, None, false).is_none());
        assert_eq!(
            validation_rule(StorageTag::DateTimeOffset, 0, None, false),
            ValidationRule::DateFormat
        );
        assert_eq!(
            validation_rule(StorageTag::Time, 0, None, false),
            ValidationRule::TimeFormat
        );
    }

    #[test]
    fn resolve_uses_mapping_and_nullability() {
        let policy = TypePolicy::sql_server();
        let resolution = policy.resolve("BIT", 0, true, None, false);
        assert_eq!(resolution.storage, StorageTag::Boolean);
        assert_eq!(resolution.literal_rule, LiteralRule::Boolean);
        assert!(resolution.allow_blank);

        let unknown = policy.resolve("hierarchyid", 0, false, None, false);
        assert_eq!(unknown.semantic_type, SemanticType::Unknown);
        assert_eq!(unknown.storage, StorageTag::Object);
        assert_eq!(unknown.literal_rule, LiteralRule::Quoted);
    }
}

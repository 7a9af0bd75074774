//! Turns bindings into the views the seed templates render.

use std::collections::BTreeSet;

use heck::ToSnakeCase;
use serde::Serialize;

use seedsheet_core::{Literal, LiteralKind, StorageTag};

use crate::model::TableBinding;

const RESERVED: [&str; 39] = [
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "try", "type", "unsafe", "use", "where", "while",
];

#[derive(Debug, Clone, Serialize)]
pub struct DataView {
    pub namespace: String,
    pub flavors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlavorView {
    pub name: String,
    pub module: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedView {
    pub flavor: String,
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub function: String,
    pub schema: String,
    pub name: String,
    pub identity_insert: bool,
    pub columns: Vec<String>,
    /// One `SeedValue` expression per column.
    pub rows: Vec<Vec<String>>,
}

/// Snake-case identifier usable as a module or function name.
pub fn rust_ident(name: &str) -> String {
    let mut ident: String = name
        .to_snake_case()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|ch: char| ch.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if ident == "_" {
        ident.push('_');
    }
    if matches!(ident.as_str(), "crate" | "self" | "super") {
        ident.push('_');
    } else if RESERVED.contains(&ident.as_str()) {
        ident = format!("r#{ident}");
    }
    ident
}

/// `populate_<schema>_<table>` names, made unique within one flavor.
pub fn table_functions(tables: &[TableBinding]) -> Vec<String> {
    let mut used = BTreeSet::new();
    tables
        .iter()
        .map(|table| {
            let base = format!(
                "populate_{}",
                rust_ident(&format!("{}_{}", table.schema, table.name)).trim_start_matches("r#")
            );
            let mut candidate = base.clone();
            let mut counter = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{base}_{counter}");
                counter += 1;
            }
            candidate
        })
        .collect()
}

pub fn table_view(table: &TableBinding, function: String) -> TableView {
    TableView {
        function,
        schema: table.schema.clone(),
        name: table.name.clone(),
        identity_insert: table.has_identity(),
        columns: table.columns.iter().map(|column| column.name.clone()).collect(),
        rows: table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&table.columns)
                    .map(|(literal, column)| value_expression(column.storage, literal))
                    .collect()
            })
            .collect(),
    }
}

fn variant(storage: StorageTag) -> &'static str {
    match storage {
        StorageTag::Int64 => "Int64",
        StorageTag::Int32 => "Int32",
        StorageTag::Int16 => "Int16",
        StorageTag::Byte => "Byte",
        StorageTag::Boolean => "Boolean",
        StorageTag::StringFixed | StorageTag::StringVariable => "Text",
        StorageTag::Date => "Date",
        StorageTag::Time => "Time",
        StorageTag::DateTime => "DateTime",
        StorageTag::DateTimeOffset => "DateTimeOffset",
        StorageTag::Decimal => "Decimal",
        StorageTag::Double => "Double",
        StorageTag::Single => "Single",
        StorageTag::Binary => "Binary",
        StorageTag::Guid => "Guid",
        StorageTag::Xml => "Xml",
        StorageTag::Object => "Object",
    }
}

/// Wrap a rendered literal in the `SeedValue` variant for its storage tag.
///
/// Numbers are re-printed in canonical form so the expression is a valid
/// literal for the variant's type (`+7` and `.5` are not).
pub fn value_expression(storage: StorageTag, literal: &Literal) -> String {
    let variant = variant(storage);
    match literal.kind {
        LiteralKind::Empty => format!("SeedValue::from({})", literal.text),
        LiteralKind::Text => format!("SeedValue::{variant}({:?}.to_string())", literal.text),
        LiteralKind::Expression => {
            let text = literal.text.as_str();
            let value = match storage {
                StorageTag::Int64 | StorageTag::Int32 | StorageTag::Int16 | StorageTag::Byte => {
                    canonical(text, |raw| raw.parse::<i64>().map(|v| v.to_string()).ok())
                }
                StorageTag::Double => {
                    canonical(text, |raw| raw.parse::<f64>().map(|v| format!("{v:?}")).ok())
                }
                StorageTag::Single => {
                    canonical(text, |raw| raw.parse::<f32>().map(|v| format!("{v:?}")).ok())
                }
                StorageTag::Decimal => format!("{text:?}.to_string()"),
                StorageTag::Object => format!("{text}.to_string()"),
                _ => text.to_string(),
            };
            format!("SeedValue::{variant}({value})")
        }
    }
}

fn canonical(text: &str, print: impl Fn(&str) -> Option<String>) -> String {
    print(text.trim()).unwrap_or_else(|| text.to_string())
}

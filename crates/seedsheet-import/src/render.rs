use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::errors::ImportError;

pub const POPULATE_DATA: &str = "populate_data";
pub const POPULATE_FLAVOR: &str = "populate_flavor";
pub const POPULATE_CONSOLIDATED: &str = "populate_consolidated";
pub const POPULATE_TABLE: &str = "populate_table";

const TEMPLATES: [(&str, &str); 4] = [
    (POPULATE_DATA, include_str!("../templates/populate_data.tera")),
    (POPULATE_FLAVOR, include_str!("../templates/populate_flavor.tera")),
    (
        POPULATE_CONSOLIDATED,
        include_str!("../templates/populate_consolidated.tera"),
    ),
    (POPULATE_TABLE, include_str!("../templates/populate_table.tera")),
];

/// Renders the embedded seed templates: model in, text out.
#[derive(Debug)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, ImportError> {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        tera.register_filter("rust_str", rust_str);
        Ok(Self { tera })
    }

    pub fn render<T: Serialize>(&self, template: &str, model: &T) -> Result<String, ImportError> {
        let context = Context::from_serialize(model)?;
        Ok(self.tera.render(template, &context)?)
    }
}

/// Quote a string as a Rust string literal.
fn rust_str(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("rust_str expects a string"))?;
    Ok(Value::String(format!("{text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{ConsolidatedView, TableView};

    #[test]
    fn table_template_emits_one_insert_per_row() {
        let renderer = TemplateRenderer::new().expect("templates parse");
        let view = TableView {
            function: "populate_dbo_tags".to_string(),
            schema: "dbo".to_string(),
            name: "Tags".to_string(),
            identity_insert: true,
            columns: vec!["Id".to_string(), "Label".to_string()],
            rows: vec![
                vec![
                    "SeedValue::Int32(1)".to_string(),
                    "SeedValue::Text(\"a\".to_string())".to_string(),
                ],
                vec![
                    "SeedValue::Int32(2)".to_string(),
                    "SeedValue::from(String::new())".to_string(),
                ],
            ],
        };

        let text = renderer.render(POPULATE_TABLE, &view).expect("render");
        assert!(text.contains("pub fn populate_dbo_tags(sink: &mut dyn SeedSink)"));
        assert!(text.contains("const COLUMNS: &[&str] = &[\"Id\", \"Label\"];"));
        assert!(text.contains("sink.begin_table(\"dbo\", \"Tags\", true)?;"));
        assert_eq!(text.matches("sink.insert_row(").count(), 2);
        assert!(text.contains(
            "vec![SeedValue::Int32(2), SeedValue::from(String::new())]"
        ));
    }

    #[test]
    fn consolidated_template_calls_tables_in_order() {
        let renderer = TemplateRenderer::new().expect("templates parse");
        let view = ConsolidatedView {
            flavor: "qa".to_string(),
            functions: vec!["populate_a".to_string(), "populate_b".to_string()],
        };

        let text = renderer.render(POPULATE_CONSOLIDATED, &view).expect("render");
        let a = text.find("populate_a(sink)?;").expect("first call");
        let b = text.find("populate_b(sink)?;").expect("second call");
        assert!(a < b);
    }
}

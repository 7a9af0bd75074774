use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::info;

use seedsheet_core::{ProgressEvent, ProgressObserver};
use seedsheet_workbook::Document;

use crate::codegen::{
    rust_ident, table_functions, table_view, ConsolidatedView, DataView, FlavorView,
};
use crate::errors::ImportError;
use crate::extractor::BindingExtractor;
use crate::model::{ImportIssue, ImportOptions};
use crate::render::{
    TemplateRenderer, POPULATE_CONSOLIDATED, POPULATE_DATA, POPULATE_FLAVOR, POPULATE_TABLE,
};

const FLAVOR_CLOSE: &str = "\n    }\n";
const NAMESPACE_CLOSE: &str = "}\n";

/// A named workbook variant of the seed data.
#[derive(Debug, Clone)]
pub struct Flavor<D> {
    pub name: String,
    pub document: D,
}

impl<D> Flavor<D> {
    pub fn new(name: impl Into<String>, document: D) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }
}

/// Generated source text plus everything noticed while producing it.
#[derive(Debug, Clone, Default)]
pub struct GeneratedSource {
    pub source: String,
    pub tables: usize,
    pub issues: Vec<ImportIssue>,
}

impl GeneratedSource {
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ImportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.source)?;
        Ok(())
    }
}

/// Turns flavors into one Rust source module.
#[derive(Debug)]
pub struct SeedSourceGenerator {
    extractor: BindingExtractor,
    renderer: TemplateRenderer,
}

impl SeedSourceGenerator {
    pub fn new(options: ImportOptions) -> Result<Self, ImportError> {
        Ok(Self {
            extractor: BindingExtractor::new(options),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Render the namespace header, then each flavor in order: its module,
    /// a `populate` function calling every table, and one function per sheet.
    pub fn generate<D: Document>(
        &self,
        namespace: &str,
        flavors: &[Flavor<D>],
        observer: &mut dyn ProgressObserver,
    ) -> Result<GeneratedSource, ImportError> {
        if namespace.trim().is_empty() {
            return Err(ImportError::InvalidNamespace(namespace.to_string()));
        }
        let namespace_ident = rust_ident(namespace);

        info!(
            event = "import_started",
            namespace = %namespace_ident,
            flavors = flavors.len()
        );

        let mut generated = GeneratedSource {
            source: self.renderer.render(
                POPULATE_DATA,
                &DataView {
                    namespace: namespace_ident,
                    flavors: flavors.iter().map(|flavor| flavor.name.clone()).collect(),
                },
            )?,
            ..GeneratedSource::default()
        };
        let mut modules = BTreeSet::new();

        for flavor in flavors {
            observer.on_event(&ProgressEvent::FlavorStarted {
                flavor: flavor.name.clone(),
            });

            let extraction = self.extractor.extract(&flavor.document)?;
            let functions = table_functions(&extraction.tables);

            generated.source.push_str(&self.renderer.render(
                POPULATE_FLAVOR,
                &FlavorView {
                    name: flavor.name.clone(),
                    module: unique_module(&mut modules, &flavor.name),
                },
            )?);
            generated.source.push_str(&self.renderer.render(
                POPULATE_CONSOLIDATED,
                &ConsolidatedView {
                    flavor: flavor.name.clone(),
                    functions: functions.clone(),
                },
            )?);
            for (table, function) in extraction.tables.iter().zip(functions) {
                generated
                    .source
                    .push_str(&self.renderer.render(POPULATE_TABLE, &table_view(table, function))?);
            }
            generated.source.push_str(FLAVOR_CLOSE);

            info!(
                event = "flavor_imported",
                flavor = %flavor.name,
                tables = extraction.tables.len(),
                issues = extraction.issues.len()
            );
            observer.on_event(&ProgressEvent::FlavorImported {
                flavor: flavor.name.clone(),
                tables: extraction.tables.len(),
            });

            generated.tables += extraction.tables.len();
            generated.issues.extend(extraction.issues);
        }

        generated.source.push_str(NAMESPACE_CLOSE);
        Ok(generated)
    }
}

fn unique_module(used: &mut BTreeSet<String>, name: &str) -> String {
    let base = rust_ident(name);
    let mut candidate = base.clone();
    let mut counter = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}_{counter}", base.trim_start_matches("r#"));
        counter += 1;
    }
    candidate
}

//! Source normalization using OXC
//!
//! Turns one virtual source file into a browser-executable ES module: type
//! annotations are stripped and JSX is lowered to plain function calls. While
//! the transformed program is still an AST, every module specifier it
//! references is collected and may be rewritten, so the linker can point
//! local imports at their canonical keys.
//!
//! Supports:
//! - JSX (.jsx)
//! - TSX (.tsx)
//! - JavaScript (.js)
//! - TypeScript (.ts)

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportDeclarationSpecifier, ImportExpression, StringLiteral,
};
use oxc_ast_visit::{VisitMut, walk_mut};
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::{Atom, SourceType};
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during transpilation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranspileError {
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to transform {path}: {message}")]
    TransformError { path: String, message: String },

    #[error("Invalid source type: {0}")]
    InvalidSourceType(String),
}

/// Result type for transpilation operations
pub type TranspileResult<T> = Result<T, TranspileError>;

/// Configuration for the transpiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspilerConfig {
    /// Whether to minify the output
    pub minify: bool,
    /// JSX runtime mode (classic or automatic)
    pub jsx_runtime: JsxRuntimeMode,
    /// JSX pragma for classic runtime (e.g., "React.createElement" or "h")
    pub jsx_pragma: Option<String>,
    /// JSX fragment pragma for classic runtime (e.g., "React.Fragment")
    pub jsx_pragma_frag: Option<String>,
    /// Import source for automatic runtime (e.g., "react" or "preact")
    pub jsx_import_source: Option<String>,
}

/// JSX runtime mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsxRuntimeMode {
    /// Classic mode: React.createElement calls
    Classic,
    /// Automatic mode: automatic JSX runtime (React 17+)
    #[default]
    Automatic,
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            minify: false,
            jsx_runtime: JsxRuntimeMode::Automatic,
            jsx_pragma: None,
            jsx_pragma_frag: None,
            jsx_import_source: Some("react".to_string()),
        }
    }
}

impl TranspilerConfig {
    /// The package every component depends on at runtime
    pub fn runtime_package(&self) -> &str {
        self.jsx_import_source.as_deref().unwrap_or("react")
    }
}

/// How a specifier was referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import ... from "x"`
    Static,
    /// `export ... from "x"`
    ReExport,
    /// `import("x")`
    Dynamic,
    /// `require("x")`
    Require,
}

/// One distinct specifier referenced by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImport {
    /// The specifier as written in source
    pub specifier: String,
    /// How it was first referenced
    pub kind: ImportKind,
    /// Bindings taken from it; `default` for default imports
    pub names: Vec<String>,
}

/// Output of [`Transpiler::transpile_module`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspiledModule {
    pub code: String,
    pub imports: Vec<ModuleImport>,
}

/// Transpiler that converts JSX/TypeScript modules to plain JavaScript
pub struct Transpiler {
    config: TranspilerConfig,
}

impl Transpiler {
    /// Create a new transpiler with default configuration
    pub fn new() -> Self {
        Self {
            config: TranspilerConfig::default(),
        }
    }

    /// Create a new transpiler with custom configuration
    pub fn with_config(config: TranspilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranspilerConfig {
        &self.config
    }

    /// Build JSX options based on config
    fn build_jsx_options(&self) -> JsxOptions {
        let mut jsx_options = JsxOptions::default();

        jsx_options.jsx_plugin = true;

        jsx_options.runtime = match self.config.jsx_runtime {
            JsxRuntimeMode::Classic => JsxRuntime::Classic,
            JsxRuntimeMode::Automatic => JsxRuntime::Automatic,
        };

        if let Some(ref pragma) = self.config.jsx_pragma {
            jsx_options.pragma = Some(pragma.clone());
        }

        if let Some(ref pragma_frag) = self.config.jsx_pragma_frag {
            jsx_options.pragma_frag = Some(pragma_frag.clone());
        }

        if let Some(ref import_source) = self.config.jsx_import_source {
            jsx_options.import_source = Some(import_source.clone());
        }

        jsx_options
    }

    /// Transpile source code to JavaScript without touching its specifiers
    pub fn transpile(&self, source: &str, filename: &str) -> TranspileResult<String> {
        self.transpile_module(source, filename, |_| None)
            .map(|module| module.code)
    }

    /// Transpile a module, collecting and optionally rewriting its specifiers
    ///
    /// `rewrite` is called once per specifier occurrence with the literal as
    /// written; returning `Some` replaces the literal in the emitted code.
    pub fn transpile_module<F>(
        &self,
        source: &str,
        filename: &str,
        rewrite: F,
    ) -> TranspileResult<TranspiledModule>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let allocator = Allocator::default();

        let source_type = SourceType::from_path(filename).map_err(|e| {
            TranspileError::InvalidSourceType(format!("Unknown file extension: {:?}", e))
        })?;

        let parser_return = Parser::new(&allocator, source, source_type).parse();

        if !parser_return.errors.is_empty() {
            let error_messages: Vec<String> = parser_return
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect();
            return Err(TranspileError::ParseError {
                path: filename.to_string(),
                message: error_messages.join("\n"),
            });
        }

        let mut program = parser_return.program;

        let semantic_ret = SemanticBuilder::new().build(&program);

        // Semantic errors are reported but do not stop the module from loading
        for error in &semantic_ret.errors {
            tracing::warn!("{}: {}", filename, error);
        }

        let scoping = semantic_ret.semantic.into_scoping();

        let mut transform_options = TransformOptions::default();
        transform_options.jsx = self.build_jsx_options();

        let source_path = Path::new(filename);

        let transformer_return = Transformer::new(&allocator, source_path, &transform_options)
            .build_with_scoping(scoping, &mut program);

        if !transformer_return.errors.is_empty() {
            let error_messages: Vec<String> = transformer_return
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect();
            return Err(TranspileError::TransformError {
                path: filename.to_string(),
                message: error_messages.join("\n"),
            });
        }

        // Runs after the transform so injected runtime imports are seen too
        let mut rewriter = SpecifierRewriter {
            allocator: &allocator,
            rewrite,
            imports: Vec::new(),
        };
        rewriter.visit_program(&mut program);
        let imports = rewriter.imports;

        let codegen_options = CodegenOptions {
            minify: self.config.minify,
            ..Default::default()
        };

        let codegen_return = Codegen::new()
            .with_options(codegen_options)
            .build(&program);

        Ok(TranspiledModule {
            code: codegen_return.code,
            imports,
        })
    }
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects module specifiers and swaps them for rewritten ones
struct SpecifierRewriter<'a, F> {
    allocator: &'a Allocator,
    rewrite: F,
    imports: Vec<ModuleImport>,
}

impl<'a, F> SpecifierRewriter<'a, F>
where
    F: FnMut(&str) -> Option<String>,
{
    fn record(&mut self, literal: &mut StringLiteral<'a>, kind: ImportKind, names: Vec<String>) {
        let specifier = literal.value.to_string();

        match self.imports.iter_mut().find(|i| i.specifier == specifier) {
            Some(existing) => {
                for name in names {
                    if !existing.names.contains(&name) {
                        existing.names.push(name);
                    }
                }
            }
            None => self.imports.push(ModuleImport {
                specifier: specifier.clone(),
                kind,
                names,
            }),
        }

        if let Some(replacement) = (self.rewrite)(&specifier) {
            let value: &'a str = self.allocator.alloc_str(&replacement);
            literal.value = Atom::from(value);
            literal.raw = None;
        }
    }
}

impl<'a, F> VisitMut<'a> for SpecifierRewriter<'a, F>
where
    F: FnMut(&str) -> Option<String>,
{
    fn visit_import_declaration(&mut self, decl: &mut ImportDeclaration<'a>) {
        let mut names = Vec::new();
        if let Some(specifiers) = &decl.specifiers {
            for specifier in specifiers.iter() {
                match specifier {
                    ImportDeclarationSpecifier::ImportSpecifier(s) => {
                        names.push(s.imported.name().to_string());
                    }
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => {
                        names.push("default".to_string());
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => {}
                }
            }
        }

        self.record(&mut decl.source, ImportKind::Static, names);
    }

    fn visit_export_named_declaration(&mut self, decl: &mut ExportNamedDeclaration<'a>) {
        let names: Vec<String> = decl
            .specifiers
            .iter()
            .map(|s| s.local.name().to_string())
            .collect();

        if let Some(source) = decl.source.as_mut() {
            self.record(source, ImportKind::ReExport, names);
        }

        walk_mut::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &mut ExportAllDeclaration<'a>) {
        self.record(&mut decl.source, ImportKind::ReExport, Vec::new());
    }

    fn visit_import_expression(&mut self, expr: &mut ImportExpression<'a>) {
        if let Expression::StringLiteral(literal) = &mut expr.source {
            self.record(&mut **literal, ImportKind::Dynamic, Vec::new());
        }

        walk_mut::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &mut CallExpression<'a>) {
        let is_require =
            matches!(&call.callee, Expression::Identifier(ident) if ident.name == "require");

        if is_require && call.arguments.len() == 1 {
            if let Some(Argument::StringLiteral(literal)) = call.arguments.first_mut() {
                self.record(&mut **literal, ImportKind::Require, Vec::new());
            }
        }

        walk_mut::walk_call_expression(self, call);
    }
}

//! TJS analysis front-end
//!
//! The pipeline for one document is
//! [`preprocess`](preprocessor::preprocess) → [`Lexer`] → [`Parser`], ending
//! in an arena [`Ast`] plus diagnostics. [`parse_document`] runs all of it.
//!
//! ```
//! use parser::{parse_document, DefineList};
//!
//! let analysis = parse_document("main.tjs", "@set(DEBUG=1)\n@if(DEBUG)\nlog(1);\n@endif\n", &DefineList::new());
//! assert!(analysis.preprocessed.disabled_ranges.is_empty());
//! assert!(analysis.parse.ast.is_completed(analysis.parse.root));
//! assert_eq!(analysis.preprocessed.defines.get("DEBUG"), 1);
//! ```

pub mod analysis_type;
pub mod ast;
pub mod ast_walker;
pub mod cursor;
pub mod define_list;
pub mod lexer;
pub mod macro_parser;
pub mod notification;
pub mod number;
pub mod preprocessor;
pub mod tjs_parser;
mod tjs_parser_decls;
pub mod tjs_parser_expr;
mod tjs_parser_stat;
pub mod token;

pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use source_map::{Position, Range, Span};

pub use analysis_type::{AnalysisType, BasicType, LiteralValue};
pub use ast::{Ast, ExprKind, Node, NodeId, NodeKind, StatKind};
pub use ast_walker::AstWalker;
pub use define_list::DefineList;
pub use lexer::{Lexer, LexerMode, TokenStream};
pub use notification::{InactiveRegionParams, INACTIVE_REGIONS_METHOD};
pub use preprocessor::{preprocess, PreprocessorConfig, PreprocessorOutput};
pub use tjs_parser::{parse_chunk, ParseOutput, Parser};
pub use token::{Token, TokenKind};

use log::debug;

/// Preprocessing and parsing results for one document
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub preprocessed: PreprocessorOutput,
    pub parse: ParseOutput,
}

impl DocumentAnalysis {
    /// Diagnostics of both phases ordered by position
    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = Diagnostics::new();
        all.extend(self.preprocessed.diagnostics.iter().cloned());
        all.extend(self.parse.diagnostics.iter().cloned());
        all.sort_by_position();
        all
    }

    pub fn inactive_regions(&self, file_uri: &str) -> InactiveRegionParams {
        InactiveRegionParams::new(file_uri, &self.preprocessed.disabled_ranges)
    }
}

/// Preprocess `source` with `defines` and parse the result
pub fn parse_document(name: &str, source: &str, defines: &DefineList) -> DocumentAnalysis {
    debug!("{}: analysing {} bytes", name, source.len());
    let config = PreprocessorConfig {
        defines: defines.clone(),
    };
    let preprocessed = preprocess(name, source, &config);
    let parse = parse_chunk(name, &preprocessed.chunk);
    DocumentAnalysis {
        preprocessed,
        parse,
    }
}

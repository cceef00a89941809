//! Analysis-type slot carried by expression nodes
//!
//! The parser only fills in what it knows from syntax: literals get a
//! [`AnalysisType::Literal`], everything else starts as `Unknown`. A type
//! checker refines the slot later through [`crate::ast::Ast::set_analysis_type`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Void,
    Integer,
    Real,
    String,
    Octet,
    Object,
}

impl BasicType {
    pub fn name(self) -> &'static str {
        match self {
            BasicType::Void => "void",
            BasicType::Integer => "int",
            BasicType::Real => "real",
            BasicType::String => "string",
            BasicType::Octet => "octet",
            BasicType::Object => "Object",
        }
    }
}

/// Value of a literal expression
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Real(f64),
    /// Decoded string contents
    String(String),
    Octet(Vec<u8>),
    /// Regex source including slashes and flags
    Regex(String),
    Void,
    Null,
}

impl LiteralValue {
    pub fn basic_type(&self) -> BasicType {
        match self {
            LiteralValue::Integer(_) => BasicType::Integer,
            LiteralValue::Real(_) => BasicType::Real,
            LiteralValue::String(_) => BasicType::String,
            LiteralValue::Octet(_) => BasicType::Octet,
            LiteralValue::Void => BasicType::Void,
            LiteralValue::Regex(_) | LiteralValue::Null => BasicType::Object,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(value) => write!(f, "{}", value),
            LiteralValue::Real(value) => write!(f, "{}", value),
            LiteralValue::String(value) => write!(f, "\"{}\"", value),
            LiteralValue::Octet(bytes) => {
                f.write_str("<% ")?;
                for byte in bytes {
                    write!(f, "{:02x} ", byte)?;
                }
                f.write_str("%>")
            }
            LiteralValue::Regex(source) => f.write_str(source),
            LiteralValue::Void => f.write_str("void"),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnalysisType {
    #[default]
    Unknown,
    Literal(LiteralValue),
    Exact {
        type_name: String,
    },
}

impl AnalysisType {
    pub fn exact(type_name: impl Into<String>) -> Self {
        AnalysisType::Exact {
            type_name: type_name.into(),
        }
    }

    /// Whether a value of type `other` may be stored in a slot of this type
    pub fn can_accept(&self, other: &AnalysisType) -> bool {
        match self {
            AnalysisType::Unknown => true,
            // literals are r-values
            AnalysisType::Literal(_) => false,
            AnalysisType::Exact { type_name } => match other {
                AnalysisType::Unknown => true,
                AnalysisType::Literal(value) => value.basic_type().name() == type_name,
                AnalysisType::Exact { type_name: other } => other == type_name,
            },
        }
    }

    pub fn pretty_string(&self) -> String {
        match self {
            AnalysisType::Unknown => "any".to_string(),
            AnalysisType::Literal(value) => value.to_string(),
            AnalysisType::Exact { type_name } => type_name.clone(),
        }
    }
}

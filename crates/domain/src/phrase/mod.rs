//! Computed phrases: text with embedded `${ expression }$` formulas.
//!
//! Formulas are how sheet authors express default values, label text and
//! visibility conditions in terms of the entity's property bag.
//!
//! # Evaluation rules
//!
//! - A phrase that is exactly one block (`${ str + 2 }$`) yields the typed
//!   value of the expression.
//! - Any other phrase renders each block to text and concatenates.
//! - A phrase without blocks is literal text.
//! - Missing property references resolve to null and never fail.

mod expr;

use std::collections::BTreeMap;

use crate::error::FormulaError;
use crate::types::{PropertyBag, PropertyValue};

/// Where a formula comes from and what to fall back to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluationContext {
    /// Human-readable origin (`stats.hp.defaultValue`), used in diagnostics.
    pub source: String,
    /// Returned instead of a null result.
    pub default_value: PropertyValue,
}

impl EvaluationContext {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            default_value: PropertyValue::Null,
        }
    }

    pub fn with_default(mut self, default_value: PropertyValue) -> Self {
        self.default_value = default_value;
        self
    }
}

/// Outcome of a phrase evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhraseResult {
    pub result: PropertyValue,
    /// Every property reference the phrase read, with the value it saw.
    pub values: BTreeMap<String, PropertyValue>,
}

/// Evaluates formula strings against entity property data.
///
/// Implementations must tolerate references to properties that do not
/// exist and return a result for them instead of an error.
#[cfg_attr(test, mockall::automock)]
pub trait FormulaEvaluator: Send + Sync {
    fn evaluate(
        &self,
        formula: &str,
        props: &PropertyBag,
        context: &EvaluationContext,
    ) -> Result<PhraseResult, FormulaError>;
}

#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Formula { src: &'a str, offset: usize },
}

fn split_phrase(phrase: &str) -> Result<Vec<Segment<'_>>, FormulaError> {
    let mut segments = Vec::new();
    let mut rest = phrase;
    let mut consumed = 0;

    while let Some(open) = rest.find("${") {
        if open > 0 {
            segments.push(Segment::Text(&rest[..open]));
        }
        let body_start = open + 2;
        let close = rest[body_start..]
            .find("}$")
            .ok_or(FormulaError::UnterminatedBlock(consumed + open))?;
        segments.push(Segment::Formula {
            src: &rest[body_start..body_start + close],
            offset: consumed + body_start,
        });
        let next = body_start + close + 2;
        consumed += next;
        rest = &rest[next..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }

    Ok(segments)
}

/// Default formula evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseEvaluator;

impl PhraseEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl FormulaEvaluator for PhraseEvaluator {
    fn evaluate(
        &self,
        formula: &str,
        props: &PropertyBag,
        context: &EvaluationContext,
    ) -> Result<PhraseResult, FormulaError> {
        let segments = split_phrase(formula)?;
        let mut scope = expr::Scope::new(props);

        let result = match segments.as_slice() {
            [] => PropertyValue::String(String::new()),
            [Segment::Formula { src, offset }] => {
                let ast = expr::parse(src, *offset)?;
                expr::evaluate(&ast, &mut scope)?
            }
            _ => {
                let mut text = String::new();
                for segment in &segments {
                    match segment {
                        Segment::Text(literal) => text.push_str(literal),
                        Segment::Formula { src, offset } => {
                            let ast = expr::parse(src, *offset)?;
                            text.push_str(&expr::evaluate(&ast, &mut scope)?.to_string());
                        }
                    }
                }
                PropertyValue::String(text)
            }
        };

        let result = if result.is_null() {
            context.default_value.clone()
        } else {
            result
        };

        Ok(PhraseResult {
            result,
            values: scope.values,
        })
    }
}

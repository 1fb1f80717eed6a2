//! Shared parsing of terms, atoms, conditions, effects and expressions
//!
//! Domain schemas and problem goals use the same grammar; they differ only in
//! which names are in scope. A [`Context`] captures that scope.

use planforge_core::{
    AssignOp, AtomTemplate, BinaryOp, Comparison, Condition, Domain, Effect, EffectTiming,
    FluentTemplate, NumericExpr, ObjectTable, Requirement, Requirements, Term, TimedCondition,
    TimedEffect, Timing, TypeHierarchy, TypeId, TypedParameter,
};
use planforge_core::domain::LiftedExpr;

use crate::error::{Document, ParseError, ParseErrorKind, ParseResult};
use crate::sexpr::SExpr;

pub(crate) fn error_at(document: Document, node: &SExpr, kind: ParseErrorKind) -> ParseError {
    ParseError {
        document,
        line: node.line(),
        column: node.column(),
        kind,
    }
}

pub(crate) fn unexpected(document: Document, node: &SExpr, expected: &str) -> ParseError {
    error_at(
        document,
        node,
        ParseErrorKind::Unexpected {
            found: node.describe(),
            expected: expected.to_string(),
        },
    )
}

pub(crate) fn require(
    document: Document,
    requirements: Requirements,
    node: &SExpr,
    requirement: Requirement,
    construct: &str,
) -> ParseResult<()> {
    if requirements.contains(requirement) {
        Ok(())
    } else {
        Err(error_at(
            document,
            node,
            ParseErrorKind::MissingRequirement {
                construct: construct.to_string(),
                requirement,
            },
        ))
    }
}

pub(crate) fn expect_list<'n>(
    document: Document,
    node: &'n SExpr,
    expected: &str,
) -> ParseResult<&'n [SExpr]> {
    node.as_list().ok_or_else(|| unexpected(document, node, expected))
}

pub(crate) fn check_arity(
    document: Document,
    node: &SExpr,
    name: &str,
    expected: usize,
    found: usize,
) -> ParseResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(error_at(
            document,
            node,
            ParseErrorKind::Arity {
                name: name.to_string(),
                expected,
                found,
            },
        ))
    }
}

/// One entry of a typed list such as `a b - truck c`.
pub(crate) struct TypedName<'n> {
    pub name: String,
    pub node: &'n SExpr,
    /// The type symbol, `None` when the entry is untyped.
    pub ty: Option<&'n SExpr>,
}

/// Splits a typed list into names with their (optional) type symbols.
pub(crate) fn typed_list<'n>(
    document: Document,
    requirements: Requirements,
    items: &'n [SExpr],
    variables: bool,
) -> ParseResult<Vec<TypedName<'n>>> {
    let expected = if variables { "a variable" } else { "a name" };
    let mut out: Vec<TypedName<'n>> = Vec::new();
    let mut pending = 0usize;
    let mut i = 0;
    while i < items.len() {
        let item = &items[i];
        if item.as_symbol() == Some("-") {
            require(document, requirements, item, Requirement::Typing, "a typed list")?;
            if pending == 0 {
                return Err(unexpected(document, item, expected));
            }
            let Some(ty) = items.get(i + 1) else {
                return Err(error_at(
                    document,
                    item,
                    ParseErrorKind::UnexpectedEof {
                        expected: "a type name".to_string(),
                    },
                ));
            };
            if ty.head() == Some("either") {
                return Err(error_at(document, ty, ParseErrorKind::Unsupported("either".to_string())));
            }
            if ty.as_symbol().is_none() {
                return Err(unexpected(document, ty, "a type name"));
            }
            let len = out.len();
            for entry in &mut out[len - pending..] {
                entry.ty = Some(ty);
            }
            pending = 0;
            i += 2;
            continue;
        }
        let name = if variables {
            item.as_variable()
        } else {
            item.as_symbol()
        };
        let Some(name) = name else {
            return Err(unexpected(document, item, expected));
        };
        out.push(TypedName {
            name: name.to_string(),
            node: item,
            ty: None,
        });
        pending += 1;
        i += 1;
    }
    Ok(out)
}

/// Resolves a type symbol; `None` means `object`.
pub(crate) fn resolve_type(
    document: Document,
    types: &TypeHierarchy,
    node: Option<&SExpr>,
) -> ParseResult<TypeId> {
    let Some(node) = node else {
        return Ok(TypeHierarchy::OBJECT);
    };
    let name = node
        .as_symbol()
        .ok_or_else(|| unexpected(document, node, "a type name"))?;
    types.lookup(name).ok_or_else(|| {
        error_at(
            document,
            node,
            ParseErrorKind::Undeclared {
                what: "type",
                name: name.to_string(),
            },
        )
    })
}

/// Parses `?a ?b - t ...` into typed parameters, rejecting duplicates.
pub(crate) fn parameters(
    document: Document,
    requirements: Requirements,
    types: &TypeHierarchy,
    items: &[SExpr],
) -> ParseResult<Vec<TypedParameter>> {
    let mut params: Vec<TypedParameter> = Vec::new();
    for entry in typed_list(document, requirements, items, true)? {
        if params.iter().any(|p| p.name == entry.name) {
            return Err(error_at(
                document,
                entry.node,
                ParseErrorKind::Duplicate {
                    what: "parameter",
                    name: entry.name,
                },
            ));
        }
        let ty = resolve_type(document, types, entry.ty)?;
        params.push(TypedParameter::new(entry.name, ty));
    }
    Ok(params)
}

/// What a timed wrapper such as `(at start ...)` denotes.
pub(crate) fn timed_wrapper(items: &[SExpr]) -> Option<Timing> {
    if items.len() != 3 {
        return None;
    }
    match (items[0].as_symbol(), items[1].as_symbol()) {
        (Some("at"), Some("start")) => Some(Timing::AtStart),
        (Some("at"), Some("end")) => Some(Timing::AtEnd),
        (Some("over"), Some("all")) => Some(Timing::OverAll),
        _ => None,
    }
}

fn comparison(symbol: &str) -> Option<Comparison> {
    match symbol {
        "<" => Some(Comparison::Less),
        "<=" => Some(Comparison::LessOrEqual),
        "=" => Some(Comparison::Equal),
        ">=" => Some(Comparison::GreaterOrEqual),
        ">" => Some(Comparison::Greater),
        _ => None,
    }
}

fn assign_op(symbol: &str) -> Option<AssignOp> {
    match symbol {
        "assign" => Some(AssignOp::Assign),
        "increase" => Some(AssignOp::Increase),
        "decrease" => Some(AssignOp::Decrease),
        "scale-up" => Some(AssignOp::ScaleUp),
        "scale-down" => Some(AssignOp::ScaleDown),
        _ => None,
    }
}

const UNSUPPORTED_CONNECTIVES: &[&str] = &["or", "imply", "exists", "forall", "when", "preference"];

/// `(= a b)` over plain names (not numeric expressions).
fn is_term_equality(items: &[SExpr]) -> bool {
    items.len() == 3
        && items[0].as_symbol() == Some("=")
        && items[1..]
            .iter()
            .all(|t| t.as_symbol().is_some() || t.as_variable().is_some())
}

/// Names in scope while parsing a schema body or a problem goal.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub document: Document,
    pub domain: &'a Domain,
    pub requirements: Requirements,
    pub objects: &'a ObjectTable,
    pub params: &'a [TypedParameter],
    /// Whether `?duration` may appear in numeric expressions.
    pub allow_duration: bool,
}

impl<'a> Context<'a> {
    fn types(&self) -> &'a TypeHierarchy {
        &self.domain.types
    }

    fn err(&self, node: &SExpr, kind: ParseErrorKind) -> ParseError {
        error_at(self.document, node, kind)
    }

    fn unexpected(&self, node: &SExpr, expected: &str) -> ParseError {
        unexpected(self.document, node, expected)
    }

    fn require(&self, node: &SExpr, requirement: Requirement, construct: &str) -> ParseResult<()> {
        require(self.document, self.requirements, node, requirement, construct)
    }

    fn head<'n>(&self, node: &'n SExpr, expected: &str) -> ParseResult<(&'n str, &'n [SExpr])> {
        let items = expect_list(self.document, node, expected)?;
        let head = items
            .first()
            .ok_or_else(|| self.unexpected(node, expected))?;
        let name = head
            .as_symbol()
            .ok_or_else(|| self.unexpected(head, expected))?;
        Ok((name, &items[1..]))
    }

    /// Resolves a variable or object name to a term and its declared type.
    pub fn term(&self, node: &SExpr) -> ParseResult<(Term, TypeId, bool)> {
        if let Some(var) = node.as_variable() {
            return match self.params.iter().position(|p| p.name == var) {
                Some(i) => Ok((Term::Param(i), self.params[i].ty, true)),
                None => Err(self.err(
                    node,
                    ParseErrorKind::Undeclared {
                        what: "variable",
                        name: var.to_string(),
                    },
                )),
            };
        }
        if let Some(name) = node.as_symbol() {
            return match self.objects.lookup(name) {
                Some(id) => Ok((Term::Object(id), self.objects.get(id).ty, false)),
                None => Err(self.err(
                    node,
                    ParseErrorKind::Undeclared {
                        what: match self.document {
                            Document::Domain => "constant",
                            Document::Problem => "object",
                        },
                        name: name.to_string(),
                    },
                )),
            };
        }
        Err(self.unexpected(node, "a variable or object name"))
    }

    /// Resolves argument terms against a parameter signature.
    ///
    /// Variables must share a type chain with the declared type (grounding
    /// drops ill-typed bindings); objects must belong to it.
    fn arguments(&self, args: &[SExpr], signature: &[TypedParameter]) -> ParseResult<Vec<Term>> {
        let mut terms = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(signature) {
            let (term, ty, is_variable) = self.term(arg)?;
            let types = self.types();
            let ok = if is_variable {
                types.compatible(ty, param.ty)
            } else {
                types.is_subtype(ty, param.ty)
            };
            if !ok {
                return Err(self.err(
                    arg,
                    ParseErrorKind::TypeMismatch {
                        name: arg.to_string(),
                        expected: types.name(param.ty).to_string(),
                        actual: types.name(ty).to_string(),
                    },
                ));
            }
            terms.push(term);
        }
        Ok(terms)
    }

    /// `(pred t1 .. tn)`
    pub fn atom(&self, node: &SExpr) -> ParseResult<AtomTemplate> {
        let (name, args) = self.head(node, "an atom")?;
        let predicate = self.domain.lookup_predicate(name).ok_or_else(|| {
            self.err(
                node,
                ParseErrorKind::Undeclared {
                    what: "predicate",
                    name: name.to_string(),
                },
            )
        })?;
        let signature = self.domain.predicate(predicate);
        check_arity(self.document, node, name, signature.arity(), args.len())?;
        Ok(AtomTemplate {
            predicate,
            args: self.arguments(args, &signature.params)?,
        })
    }

    /// `(f t1 .. tn)`
    pub fn fluent(&self, node: &SExpr) -> ParseResult<FluentTemplate> {
        let (name, args) = self.head(node, "a function term")?;
        let function = self.domain.lookup_function(name).ok_or_else(|| {
            self.err(
                node,
                ParseErrorKind::Undeclared {
                    what: "function",
                    name: name.to_string(),
                },
            )
        })?;
        let signature = self.domain.function(function);
        check_arity(self.document, node, name, signature.arity(), args.len())?;
        Ok(FluentTemplate {
            function,
            args: self.arguments(args, &signature.params)?,
        })
    }

    /// Numeric expression: numbers, fluents, `?duration`, `+ - * /`.
    pub fn expr(&self, node: &SExpr) -> ParseResult<LiftedExpr> {
        if let Some(n) = node.as_number() {
            return Ok(NumericExpr::Number(n));
        }
        if let Some(var) = node.as_variable() {
            if var == "?duration" && self.allow_duration {
                return Ok(NumericExpr::Duration);
            }
            return Err(self.unexpected(node, "a numeric expression"));
        }
        let (head, operands) = self.head(node, "a numeric expression")?;
        let op = match head {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(NumericExpr::Fluent(self.fluent(node)?));
        };
        match (op, operands.len()) {
            (BinaryOp::Sub, 1) => Ok(NumericExpr::Negate(Box::new(self.expr(&operands[0])?))),
            (BinaryOp::Add | BinaryOp::Mul, n) if n >= 2 => {
                let mut acc = self.expr(&operands[0])?;
                for operand in &operands[1..] {
                    acc = NumericExpr::binary(op, acc, self.expr(operand)?);
                }
                Ok(acc)
            }
            (_, 2) => Ok(NumericExpr::binary(
                op,
                self.expr(&operands[0])?,
                self.expr(&operands[1])?,
            )),
            (_, n) => Err(self.err(
                node,
                ParseErrorKind::Arity {
                    name: head.to_string(),
                    expected: 2,
                    found: n,
                },
            )),
        }
    }

    fn equality(&self, items: &[SExpr], positive: bool) -> ParseResult<Condition> {
        let (lhs, _, _) = self.term(&items[1])?;
        let (rhs, _, _) = self.term(&items[2])?;
        Ok(Condition::Equality { lhs, rhs, positive })
    }

    /// Untimed goal description, flattened into `out`.
    pub fn condition(&self, node: &SExpr, out: &mut Vec<Condition>) -> ParseResult<()> {
        let items = expect_list(self.document, node, "a condition")?;
        if items.is_empty() {
            return Ok(());
        }
        if timed_wrapper(items).is_some() {
            return Err(self.unexpected(node, "an untimed condition"));
        }
        let (head, operands) = self.head(node, "a condition")?;
        match head {
            "and" => {
                for operand in operands {
                    self.condition(operand, out)?;
                }
            }
            "not" => {
                check_arity(self.document, node, "not", 1, operands.len())?;
                let inner = &operands[0];
                let inner_items = expect_list(self.document, inner, "an atom or equality")?;
                if is_term_equality(inner_items) {
                    self.require(inner, Requirement::Equality, "an equality")?;
                    out.push(self.equality(inner_items, false)?);
                } else {
                    match inner.head() {
                        Some(h) if UNSUPPORTED_CONNECTIVES.contains(&h) || h == "not" || h == "and" => {
                            return Err(self.err(
                                inner,
                                ParseErrorKind::Unsupported(format!("not {}", h)),
                            ));
                        }
                        Some(h) if comparison(h).is_some() => {
                            return Err(self.err(
                                inner,
                                ParseErrorKind::Unsupported(format!("not {}", h)),
                            ));
                        }
                        _ => {}
                    }
                    self.require(node, Requirement::NegativePreconditions, "a negative condition")?;
                    out.push(Condition::Atom {
                        atom: self.atom(inner)?,
                        positive: false,
                    });
                }
            }
            _ if is_term_equality(items) => {
                self.require(node, Requirement::Equality, "an equality")?;
                out.push(self.equality(items, true)?);
            }
            h if comparison(h).is_some() => {
                self.require(node, Requirement::NumericFluents, "a numeric comparison")?;
                check_arity(self.document, node, h, 2, operands.len())?;
                if let Some(op) = comparison(h) {
                    out.push(Condition::Compare {
                        op,
                        lhs: self.expr(&operands[0])?,
                        rhs: self.expr(&operands[1])?,
                    });
                }
            }
            h if UNSUPPORTED_CONNECTIVES.contains(&h) => {
                return Err(self.err(node, ParseErrorKind::Unsupported(h.to_string())));
            }
            _ => out.push(Condition::Atom {
                atom: self.atom(node)?,
                positive: true,
            }),
        }
        Ok(())
    }

    /// Durative `:condition`, every conjunct wrapped in a timing.
    pub fn timed_conditions(&self, node: &SExpr, out: &mut Vec<TimedCondition>) -> ParseResult<()> {
        let items = expect_list(self.document, node, "a timed condition")?;
        if items.is_empty() {
            return Ok(());
        }
        if let Some(timing) = timed_wrapper(items) {
            let mut conditions = Vec::new();
            self.condition(&items[2], &mut conditions)?;
            out.extend(
                conditions
                    .into_iter()
                    .map(|condition| TimedCondition { timing, condition }),
            );
            return Ok(());
        }
        if items[0].as_symbol() == Some("and") {
            for item in &items[1..] {
                self.timed_conditions(item, out)?;
            }
            return Ok(());
        }
        Err(self.unexpected(node, "an `at start`, `at end` or `over all` condition"))
    }

    /// Untimed effect, flattened into `out` with the given timing.
    pub fn effect(&self, node: &SExpr, timing: EffectTiming, out: &mut Vec<TimedEffect>) -> ParseResult<()> {
        let items = expect_list(self.document, node, "an effect")?;
        if items.is_empty() {
            return Ok(());
        }
        if timed_wrapper(items).is_some() {
            return Err(self.unexpected(node, "an untimed effect"));
        }
        let (head, operands) = self.head(node, "an effect")?;
        let effect = match head {
            "and" => {
                for operand in operands {
                    self.effect(operand, timing, out)?;
                }
                return Ok(());
            }
            "not" => {
                check_arity(self.document, node, "not", 1, operands.len())?;
                Effect::Delete(self.atom(&operands[0])?)
            }
            h => match assign_op(h) {
                Some(op) => {
                    self.require(node, Requirement::NumericFluents, "a numeric effect")?;
                    check_arity(self.document, node, h, 2, operands.len())?;
                    Effect::Numeric {
                        op,
                        fluent: self.fluent(&operands[0])?,
                        value: self.expr(&operands[1])?,
                    }
                }
                None if UNSUPPORTED_CONNECTIVES.contains(&h) => {
                    return Err(self.err(node, ParseErrorKind::Unsupported(h.to_string())));
                }
                None => Effect::Add(self.atom(node)?),
            },
        };
        out.push(TimedEffect { timing, effect });
        Ok(())
    }

    /// Durative `:effect`, every conjunct wrapped in `at start` or `at end`.
    pub fn timed_effects(&self, node: &SExpr, out: &mut Vec<TimedEffect>) -> ParseResult<()> {
        let items = expect_list(self.document, node, "a timed effect")?;
        if items.is_empty() {
            return Ok(());
        }
        match timed_wrapper(items) {
            Some(Timing::AtStart) => return self.effect(&items[2], EffectTiming::AtStart, out),
            Some(Timing::AtEnd) => return self.effect(&items[2], EffectTiming::AtEnd, out),
            Some(Timing::OverAll) => {
                return Err(self.err(
                    node,
                    ParseErrorKind::Unsupported("continuous effect".to_string()),
                ));
            }
            None => {}
        }
        if items[0].as_symbol() == Some("and") {
            for item in &items[1..] {
                self.timed_effects(item, out)?;
            }
            return Ok(());
        }
        Err(self.unexpected(node, "an `at start` or `at end` effect"))
    }
}

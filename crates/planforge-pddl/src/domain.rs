//! Domain document parsing

use planforge_core::domain::LiftedExpr;
use planforge_core::{
    ActionSchema, Domain, DurationConstraint, EffectTiming, FunctionSignature, PredicateSignature,
    Requirement, Requirements, TimedCondition, Timing, TypeHierarchy, TypedParameter,
};
use tracing::debug;

use crate::context::{
    error_at, expect_list, parameters, require, resolve_type, typed_list, unexpected, Context,
};
use crate::error::{Document, ParseErrorKind, ParseResult};
use crate::lexer::tokenize;
use crate::sexpr::{read_document, SExpr};

const DOC: Document = Document::Domain;

/// Parses a `(define (domain ...) ...)` document.
pub fn parse_domain(text: &str) -> ParseResult<Domain> {
    let root = read_document(tokenize(text, DOC)?, DOC)?;
    let (name, sections) = define_header(DOC, &root, "domain")?;
    let mut domain = Domain::new(name);
    domain.requirements = Requirements::strips();
    let mut seen_requirements = false;

    for section in sections {
        let items = expect_list(DOC, section, "a domain section")?;
        let keyword = items
            .first()
            .and_then(SExpr::as_keyword)
            .ok_or_else(|| unexpected(DOC, section, "a domain section keyword"))?;
        match keyword {
            "requirements" => {
                if seen_requirements {
                    return Err(error_at(
                        DOC,
                        section,
                        ParseErrorKind::Duplicate {
                            what: "section",
                            name: ":requirements".to_string(),
                        },
                    ));
                }
                seen_requirements = true;
                domain.requirements = parse_requirements(DOC, &items[1..])?;
            }
            "types" => {
                require(DOC, domain.requirements, section, Requirement::Typing, ":types")?;
                parse_types(&mut domain, &items[1..])?;
            }
            "constants" => parse_constants(&mut domain, &items[1..])?,
            "predicates" => parse_predicates(&mut domain, &items[1..])?,
            "functions" => {
                require(
                    DOC,
                    domain.requirements,
                    section,
                    Requirement::NumericFluents,
                    ":functions",
                )?;
                parse_functions(&mut domain, &items[1..])?;
            }
            "action" => {
                let action = parse_action(&domain, section, items, false)?;
                domain.actions.push(action);
            }
            "durative-action" => {
                require(
                    DOC,
                    domain.requirements,
                    section,
                    Requirement::DurativeActions,
                    ":durative-action",
                )?;
                let action = parse_action(&domain, section, items, true)?;
                domain.actions.push(action);
            }
            "derived" | "timeless" | "constraints" => {
                return Err(error_at(
                    DOC,
                    section,
                    ParseErrorKind::Unsupported(format!(":{}", keyword)),
                ));
            }
            _ => return Err(unexpected(DOC, &items[0], "a domain section keyword")),
        }
    }

    debug!(
        event = "domain_parsed",
        domain = %domain.name,
        types = domain.types.len(),
        predicates = domain.predicates.len(),
        functions = domain.functions.len(),
        actions = domain.actions.len(),
    );
    Ok(domain)
}

/// Checks `(define (<kind> NAME) ...)` and returns the name and sections.
pub(crate) fn define_header<'n>(
    document: Document,
    root: &'n SExpr,
    kind: &str,
) -> ParseResult<(String, &'n [SExpr])> {
    let expected = format!("`(define ({} NAME) ...)`", kind);
    let items = expect_list(document, root, &expected)?;
    match items.first() {
        Some(head) if head.as_symbol() == Some("define") => {}
        Some(head) => return Err(unexpected(document, head, "`define`")),
        None => return Err(unexpected(document, root, &expected)),
    }
    let header = items
        .get(1)
        .ok_or_else(|| unexpected(document, root, &expected))?;
    let header_items = expect_list(document, header, &expected)?;
    if header_items.len() != 2 || header_items[0].as_symbol() != Some(kind) {
        return Err(unexpected(document, header, &expected));
    }
    let name = header_items[1]
        .as_symbol()
        .ok_or_else(|| unexpected(document, &header_items[1], "a name"))?;
    Ok((name.to_string(), &items[2..]))
}

pub(crate) fn parse_requirements(document: Document, items: &[SExpr]) -> ParseResult<Requirements> {
    let mut requirements = Requirements::strips();
    for item in items {
        let keyword = item
            .as_keyword()
            .ok_or_else(|| unexpected(document, item, "a requirement flag"))?;
        let requirement = Requirement::from_keyword(keyword).ok_or_else(|| {
            error_at(
                document,
                item,
                ParseErrorKind::UnsupportedRequirement(keyword.to_string()),
            )
        })?;
        requirements.insert(requirement);
    }
    Ok(requirements)
}

fn parse_types(domain: &mut Domain, items: &[SExpr]) -> ParseResult<()> {
    for entry in typed_list(DOC, domain.requirements, items, false)? {
        let child = domain.types.declare(&entry.name);
        let parent = match entry.ty.and_then(SExpr::as_symbol) {
            Some(parent) => domain.types.declare(parent),
            None => TypeHierarchy::OBJECT,
        };
        domain
            .types
            .set_parent(child, parent)
            .map_err(|e| error_at(DOC, entry.node, ParseErrorKind::InvalidType(e.to_string())))?;
    }
    Ok(())
}

fn parse_constants(domain: &mut Domain, items: &[SExpr]) -> ParseResult<()> {
    for entry in typed_list(DOC, domain.requirements, items, false)? {
        let ty = resolve_type(DOC, &domain.types, entry.ty)?;
        domain.constants.insert(entry.name.clone(), ty).map_err(|_| {
            error_at(
                DOC,
                entry.node,
                ParseErrorKind::Duplicate {
                    what: "constant",
                    name: entry.name,
                },
            )
        })?;
    }
    Ok(())
}

/// Name and parameters of a `(name ?x - t ...)` declaration.
fn signature(domain: &Domain, node: &SExpr, what: &str) -> ParseResult<(String, Vec<TypedParameter>)> {
    let items = expect_list(DOC, node, what)?;
    let name = items
        .first()
        .and_then(SExpr::as_symbol)
        .ok_or_else(|| unexpected(DOC, node, what))?;
    let params = parameters(DOC, domain.requirements, &domain.types, &items[1..])?;
    Ok((name.to_string(), params))
}

fn parse_predicates(domain: &mut Domain, items: &[SExpr]) -> ParseResult<()> {
    for item in items {
        let (name, params) = signature(domain, item, "a predicate declaration")?;
        domain
            .add_predicate(PredicateSignature {
                name: name.clone(),
                params,
            })
            .map_err(|_| {
                error_at(
                    DOC,
                    item,
                    ParseErrorKind::Duplicate {
                        what: "predicate",
                        name,
                    },
                )
            })?;
    }
    Ok(())
}

fn parse_functions(domain: &mut Domain, items: &[SExpr]) -> ParseResult<()> {
    let mut i = 0;
    while i < items.len() {
        let item = &items[i];
        if item.as_symbol() == Some("-") {
            match items.get(i + 1).and_then(SExpr::as_symbol) {
                Some("number") => {
                    i += 2;
                    continue;
                }
                Some(other) => {
                    return Err(error_at(
                        DOC,
                        &items[i + 1],
                        ParseErrorKind::Unsupported(format!("function type {}", other)),
                    ));
                }
                None => return Err(unexpected(DOC, item, "`- number`")),
            }
        }
        let (name, params) = signature(domain, item, "a function declaration")?;
        domain
            .add_function(FunctionSignature {
                name: name.clone(),
                params,
            })
            .map_err(|_| {
                error_at(
                    DOC,
                    item,
                    ParseErrorKind::Duplicate {
                        what: "function",
                        name,
                    },
                )
            })?;
        i += 1;
    }
    Ok(())
}

fn parse_action(
    domain: &Domain,
    section: &SExpr,
    items: &[SExpr],
    durative: bool,
) -> ParseResult<ActionSchema> {
    let name_node = items
        .get(1)
        .ok_or_else(|| unexpected(DOC, section, "an action name"))?;
    let name = name_node
        .as_symbol()
        .ok_or_else(|| unexpected(DOC, name_node, "an action name"))?;
    if domain.action(name).is_some() {
        return Err(error_at(
            DOC,
            name_node,
            ParseErrorKind::Duplicate {
                what: "action",
                name: name.to_string(),
            },
        ));
    }

    let mut params = Vec::new();
    let mut condition = None;
    let mut effect = None;
    let mut duration = None;
    let condition_key = if durative { "condition" } else { "precondition" };

    let mut i = 2;
    while i < items.len() {
        let key_node = &items[i];
        let key = key_node
            .as_keyword()
            .ok_or_else(|| unexpected(DOC, key_node, "an action field keyword"))?;
        let value = items.get(i + 1).ok_or_else(|| {
            error_at(
                DOC,
                key_node,
                ParseErrorKind::UnexpectedEof {
                    expected: format!("a value for :{}", key),
                },
            )
        })?;
        match key {
            "parameters" => {
                let list = expect_list(DOC, value, "a parameter list")?;
                params = parameters(DOC, domain.requirements, &domain.types, list)?;
            }
            "duration" if durative => duration = Some(value),
            "effect" => effect = Some(value),
            k if k == condition_key => condition = Some(value),
            _ => {
                return Err(unexpected(
                    DOC,
                    key_node,
                    if durative {
                        "`:parameters`, `:duration`, `:condition` or `:effect`"
                    } else {
                        "`:parameters`, `:precondition` or `:effect`"
                    },
                ))
            }
        }
        i += 2;
    }

    let ctx = Context {
        document: DOC,
        domain,
        requirements: domain.requirements,
        objects: &domain.constants,
        params: &params,
        allow_duration: durative,
    };

    let mut conditions = Vec::new();
    let mut effects = Vec::new();
    if durative {
        if let Some(node) = condition {
            ctx.timed_conditions(node, &mut conditions)?;
        }
        if let Some(node) = effect {
            ctx.timed_effects(node, &mut effects)?;
        }
    } else {
        if let Some(node) = condition {
            let mut untimed = Vec::new();
            ctx.condition(node, &mut untimed)?;
            conditions.extend(untimed.into_iter().map(|condition| TimedCondition {
                timing: Timing::AtStart,
                condition,
            }));
        }
        if let Some(node) = effect {
            ctx.effect(node, EffectTiming::AtStart, &mut effects)?;
        }
    }

    let duration = if durative {
        let node = duration.ok_or_else(|| {
            error_at(
                DOC,
                section,
                ParseErrorKind::InvalidDuration(format!("{} has no :duration", name)),
            )
        })?;
        let duration_ctx = Context {
            allow_duration: false,
            ..ctx
        };
        Some(parse_duration(&duration_ctx, node)?)
    } else {
        None
    };

    Ok(ActionSchema {
        name: name.to_string(),
        parameters: params,
        duration,
        conditions,
        effects,
    })
}

#[derive(Default)]
struct DurationBounds {
    exact: Option<LiftedExpr>,
    lower: Option<LiftedExpr>,
    upper: Option<LiftedExpr>,
}

fn parse_duration(ctx: &Context<'_>, node: &SExpr) -> ParseResult<DurationConstraint> {
    let mut bounds = DurationBounds::default();
    collect_duration(ctx, node, &mut bounds)?;
    let invalid = |msg: &str| error_at(DOC, node, ParseErrorKind::InvalidDuration(msg.to_string()));
    match bounds {
        DurationBounds {
            exact: Some(exact),
            lower: None,
            upper: None,
        } => Ok(DurationConstraint::Exact(exact)),
        DurationBounds { exact: Some(_), .. } => {
            Err(invalid("an exact duration cannot be combined with bounds"))
        }
        DurationBounds {
            exact: None,
            lower: None,
            upper: None,
        } => Err(invalid("empty duration constraint")),
        DurationBounds { lower, upper, .. } => {
            if let (Some(lo), Some(hi)) = (
                lower.as_ref().and_then(LiftedExpr::as_number),
                upper.as_ref().and_then(LiftedExpr::as_number),
            ) {
                if lo > hi {
                    return Err(invalid("lower bound exceeds upper bound"));
                }
            }
            Ok(DurationConstraint::Bounded { lower, upper })
        }
    }
}

fn collect_duration(ctx: &Context<'_>, node: &SExpr, bounds: &mut DurationBounds) -> ParseResult<()> {
    let items = expect_list(DOC, node, "a duration constraint")?;
    let Some(head) = items.first().and_then(SExpr::as_symbol) else {
        return Err(unexpected(DOC, node, "a duration constraint"));
    };
    if head == "and" {
        for item in &items[1..] {
            collect_duration(ctx, item, bounds)?;
        }
        return Ok(());
    }
    if items.len() != 3 || items[1].as_variable() != Some("?duration") {
        return Err(unexpected(
            DOC,
            node,
            "`(= ?duration ...)`, `(<= ?duration ...)` or `(>= ?duration ...)`",
        ));
    }
    let slot = match head {
        "=" => &mut bounds.exact,
        "<=" | ">=" => {
            require(
                DOC,
                ctx.requirements,
                node,
                Requirement::DurationInequalities,
                "a duration inequality",
            )?;
            if head == "<=" {
                &mut bounds.upper
            } else {
                &mut bounds.lower
            }
        }
        "<" | ">" => {
            return Err(error_at(
                DOC,
                node,
                ParseErrorKind::Unsupported(format!("strict duration bound {}", head)),
            ));
        }
        _ => return Err(unexpected(DOC, &items[0], "`=`, `<=` or `>=`")),
    };
    let expr = ctx.expr(&items[2])?;
    if expr.as_number().is_some_and(|n| n < 0.0) {
        return Err(error_at(
            DOC,
            &items[2],
            ParseErrorKind::InvalidDuration("negative duration".to_string()),
        ));
    }
    if slot.is_some() {
        return Err(error_at(
            DOC,
            node,
            ParseErrorKind::InvalidDuration("conflicting duration constraints".to_string()),
        ));
    }
    *slot = Some(expr);
    Ok(())
}

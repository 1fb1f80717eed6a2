//! Problem document parsing

use planforge_core::{
    BinaryOp, Domain, GroundAtom, GroundFluent, Metric, MetricDirection, MetricTerm, NumericExpr,
    ObjectId, Problem, Requirement, Term,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::context::{
    check_arity, error_at, expect_list, require, resolve_type, typed_list, unexpected, Context,
};
use crate::domain::{define_header, parse_requirements};
use crate::error::{Document, ParseErrorKind, ParseResult};
use crate::lexer::tokenize;
use crate::sexpr::{read_document, SExpr};

const DOC: Document = Document::Problem;

/// Parses a `(define (problem ...) ...)` document against `domain`.
pub fn parse_problem(text: &str, domain: &Domain) -> ParseResult<Problem> {
    let root = read_document(tokenize(text, DOC)?, DOC)?;
    let (name, sections) = define_header(DOC, &root, "problem")?;

    let mut problem = Problem {
        name,
        domain_name: String::new(),
        requirements: domain.requirements,
        objects: domain.constants.clone(),
        init: Vec::new(),
        init_fluents: Vec::new(),
        goal: Vec::new(),
        deadline: None,
        metric: None,
    };
    let mut seen_domain = false;
    let mut seen_goal = false;

    for section in sections {
        let items = expect_list(DOC, section, "a problem section")?;
        let keyword = items
            .first()
            .and_then(SExpr::as_keyword)
            .ok_or_else(|| unexpected(DOC, section, "a problem section keyword"))?;
        let body = &items[1..];
        match keyword {
            "domain" => {
                let found = body
                    .first()
                    .and_then(SExpr::as_symbol)
                    .ok_or_else(|| unexpected(DOC, section, "a domain name"))?;
                if found != domain.name {
                    return Err(error_at(
                        DOC,
                        section,
                        ParseErrorKind::DomainMismatch {
                            expected: domain.name.clone(),
                            found: found.to_string(),
                        },
                    ));
                }
                problem.domain_name = found.to_string();
                seen_domain = true;
            }
            "requirements" => {
                let extra = parse_requirements(DOC, body)?;
                problem.requirements = problem.requirements.union(&extra);
            }
            "objects" => parse_objects(domain, &mut problem, body)?,
            "init" => parse_init(domain, &mut problem, body)?,
            "goal" => {
                let node = body
                    .first()
                    .ok_or_else(|| unexpected(DOC, section, "a goal condition"))?;
                let ctx = ground_context(domain, &problem);
                let mut goal = Vec::new();
                ctx.condition(node, &mut goal)?;
                problem.goal = goal;
                seen_goal = true;
            }
            "metric" => problem.metric = Some(parse_metric(domain, &problem, section, body)?),
            "deadline" => {
                let value = body.first().and_then(SExpr::as_number);
                match value {
                    Some(d) if d.is_finite() && d >= 0.0 && body.len() == 1 => {
                        problem.deadline = Some(d);
                    }
                    _ => return Err(unexpected(DOC, section, "`(:deadline <non-negative number>)`")),
                }
            }
            "constraints" => {
                return Err(error_at(
                    DOC,
                    section,
                    ParseErrorKind::Unsupported(":constraints".to_string()),
                ));
            }
            _ => return Err(unexpected(DOC, &items[0], "a problem section keyword")),
        }
    }

    if !seen_domain {
        return Err(error_at(
            DOC,
            &root,
            ParseErrorKind::UnexpectedEof {
                expected: "a `(:domain ...)` section".to_string(),
            },
        ));
    }
    if !seen_goal {
        return Err(error_at(
            DOC,
            &root,
            ParseErrorKind::UnexpectedEof {
                expected: "a `(:goal ...)` section".to_string(),
            },
        ));
    }

    debug!(
        event = "problem_parsed",
        problem = %problem.name,
        objects = problem.objects.len(),
        init_facts = problem.init.len(),
        init_fluents = problem.init_fluents.len(),
        goal_conditions = problem.goal.len(),
    );
    Ok(problem)
}

fn ground_context<'a>(domain: &'a Domain, problem: &'a Problem) -> Context<'a> {
    Context {
        document: DOC,
        domain,
        requirements: problem.requirements,
        objects: &problem.objects,
        params: &[],
        allow_duration: false,
    }
}

fn parse_objects(domain: &Domain, problem: &mut Problem, items: &[SExpr]) -> ParseResult<()> {
    for entry in typed_list(DOC, problem.requirements, items, false)? {
        let ty = resolve_type(DOC, &domain.types, entry.ty)?;
        problem.objects.insert(entry.name.clone(), ty).map_err(|_| {
            error_at(
                DOC,
                entry.node,
                ParseErrorKind::Duplicate {
                    what: "object",
                    name: entry.name,
                },
            )
        })?;
    }
    Ok(())
}

fn ground_args(args: &[Term]) -> SmallVec<[ObjectId; 4]> {
    args.iter()
        .filter_map(|t| match t {
            Term::Object(o) => Some(*o),
            Term::Param(_) => None,
        })
        .collect()
}

fn parse_init(domain: &Domain, problem: &mut Problem, items: &[SExpr]) -> ParseResult<()> {
    let mut facts = Vec::new();
    let mut fluents = Vec::new();
    {
        let ctx = ground_context(domain, problem);
        for item in items {
            let list = expect_list(DOC, item, "an initial fact")?;
            match item.head() {
                Some("=") => {
                    require(
                        DOC,
                        problem.requirements,
                        item,
                        Requirement::NumericFluents,
                        "a fluent initialisation",
                    )?;
                    check_arity(DOC, item, "=", 2, list.len() - 1)?;
                    let fluent = ctx.fluent(&list[1])?;
                    let value = list[2]
                        .as_number()
                        .ok_or_else(|| unexpected(DOC, &list[2], "a number"))?;
                    fluents.push((GroundFluent::new(fluent.function, ground_args(&fluent.args)), value));
                }
                Some("at") if list.len() == 3 && list[1].as_number().is_some() => {
                    return Err(error_at(
                        DOC,
                        item,
                        ParseErrorKind::Unsupported("timed initial literal".to_string()),
                    ));
                }
                Some("not") => return Err(unexpected(DOC, item, "a positive initial fact")),
                _ => {
                    let atom = ctx.atom(item)?;
                    facts.push(GroundAtom::new(atom.predicate, ground_args(&atom.args)));
                }
            }
        }
    }
    problem.init.extend(facts);
    for (fluent, value) in fluents {
        match problem.init_fluents.iter_mut().find(|(f, _)| *f == fluent) {
            Some(slot) => slot.1 = value,
            None => problem.init_fluents.push((fluent, value)),
        }
    }
    Ok(())
}

fn parse_metric(
    domain: &Domain,
    problem: &Problem,
    section: &SExpr,
    items: &[SExpr],
) -> ParseResult<Metric> {
    if items.len() != 2 {
        return Err(unexpected(DOC, section, "`(:metric minimize|maximize <expression>)`"));
    }
    let direction = match items[0].as_symbol() {
        Some("minimize") => MetricDirection::Minimize,
        Some("maximize") => MetricDirection::Maximize,
        _ => return Err(unexpected(DOC, &items[0], "`minimize` or `maximize`")),
    };
    let ctx = ground_context(domain, problem);
    Ok(Metric {
        direction,
        expr: metric_expr(&ctx, &items[1])?,
    })
}

fn metric_expr(ctx: &Context<'_>, node: &SExpr) -> ParseResult<NumericExpr<MetricTerm>> {
    if let Some(n) = node.as_number() {
        return Ok(NumericExpr::Number(n));
    }
    let items = expect_list(DOC, node, "a metric expression")?;
    let op = match node.head() {
        Some("total-time") => return Ok(NumericExpr::Fluent(MetricTerm::TotalTime)),
        Some("+") => BinaryOp::Add,
        Some("-") => BinaryOp::Sub,
        Some("*") => BinaryOp::Mul,
        Some("/") => BinaryOp::Div,
        _ => {
            let fluent = ctx.fluent(node)?;
            return Ok(NumericExpr::Fluent(MetricTerm::Fluent(GroundFluent::new(
                fluent.function,
                ground_args(&fluent.args),
            ))));
        }
    };
    match (op, items.len()) {
        (BinaryOp::Sub, 2) => Ok(NumericExpr::Negate(Box::new(metric_expr(ctx, &items[1])?))),
        (_, 3) => Ok(NumericExpr::binary(
            op,
            metric_expr(ctx, &items[1])?,
            metric_expr(ctx, &items[2])?,
        )),
        (_, n) => Err(error_at(
            DOC,
            node,
            ParseErrorKind::Arity {
                name: op.symbol().to_string(),
                expected: 2,
                found: n - 1,
            },
        )),
    }
}

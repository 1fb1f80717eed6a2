//! Colorful console output for planner events.
//!
//! Provides a custom `tracing` layer that formats planner events with colors.
//! Enabled with the `console` feature.

use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "planforge=info,planforge_solver=info";

/// Initializes the planner console output.
///
/// Safe to call multiple times - only the first call has effect. `RUST_LOG`
/// overrides the default filter. Does nothing if another global subscriber
/// is already installed.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(PlannerConsoleLayer)
            .try_init();
    });
}

fn print_banner() {
    let banner = r#"
 ____  _             _____
|  _ \| | __ _ _ __ |  ___|__  _ __ __ _  ___
| |_) | |/ _` | '_ \| |_ / _ \| '__/ _` |/ _ \
|  __/| | (_| | | | |  _| (_) | | | (_| |  __/
|_|   |_|\__,_|_| |_|_|  \___/|_|  \__, |\___|
                                   |___/
"#;

    let version_line = format!(
        "              v{} - Temporal PDDL Planner\n",
        env!("CARGO_PKG_VERSION")
    );

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats planner events with colors.
pub struct PlannerConsoleLayer;

impl<S: Subscriber> Layer<S> for PlannerConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("planforge") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    outcome: Option<String>,
    domain: Option<String>,
    problem: Option<String>,
    strategy: Option<String>,
    heuristic: Option<String>,
    error: Option<String>,
    facts: Option<u64>,
    actions: Option<u64>,
    expanded: Option<u64>,
    generated: Option<u64>,
    open: Option<u64>,
    steps: Option<u64>,
    plan_length: Option<u64>,
    duration_ms: Option<u64>,
    speed: Option<u64>,
    makespan: Option<f64>,
}

impl EventVisitor {
    fn set_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "event" => self.event = Some(value),
            "outcome" => self.outcome = Some(value),
            "domain" => self.domain = Some(value),
            "problem" => self.problem = Some(value),
            "strategy" => self.strategy = Some(value),
            "heuristic" => self.heuristic = Some(value),
            "error" => self.error = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field, s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "facts" => self.facts = Some(value),
            "actions" => self.actions = Some(value),
            "expanded" => self.expanded = Some(value),
            "generated" => self.generated = Some(value),
            "open" => self.open = Some(value),
            "steps" => self.steps = Some(value),
            "plan_length" => self.plan_length = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "speed" => self.speed = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if field.name() == "makespan" {
            self.makespan = Some(value);
        }
    }
}

fn format_event(v: &EventVisitor) -> String {
    match v.event.as_deref().unwrap_or("") {
        "solve_start" => format_solve_start(v),
        "grounding_end" => format_grounding_end(v),
        "search_start" => format_search_start(v),
        "progress" => format_progress(v),
        "search_end" => format_search_end(v),
        "plan_validated" => format_plan_validated(v),
        "plan_rejected" => format_plan_rejected(v),
        _ => String::new(),
    }
}

fn prefix(tag: &str) -> String {
    format!(
        "{} {} {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", tag).bright_cyan()
    )
}

fn count(n: Option<u64>) -> String {
    n.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn format_solve_start(v: &EventVisitor) -> String {
    format!(
        "{} Solving problem ({}) of domain ({})",
        prefix("Planner"),
        v.problem.as_deref().unwrap_or("?").white().bold(),
        v.domain.as_deref().unwrap_or("?").white().bold(),
    )
}

fn format_grounding_end(v: &EventVisitor) -> String {
    format!(
        "{} ground facts ({}), ground actions ({}), time spent ({})",
        prefix("Grounder"),
        count(v.facts).bright_yellow(),
        count(v.actions).bright_yellow(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
    )
}

fn format_search_start(v: &EventVisitor) -> String {
    format!(
        "{} {} search with {} heuristic started",
        prefix("Search"),
        v.strategy.as_deref().unwrap_or("?").white().bold(),
        v.heuristic.as_deref().unwrap_or("?").bright_magenta(),
    )
}

fn format_progress(v: &EventVisitor) -> String {
    format!(
        "    {} expanded {:>10} | generated {:>10} | open {:>8}",
        "->".bright_blue(),
        count(v.expanded).white(),
        count(v.generated).white(),
        count(v.open).bright_black(),
    )
}

fn format_search_end(v: &EventVisitor) -> String {
    let outcome = v.outcome.as_deref().unwrap_or("unknown");
    let colored = match outcome {
        "solved" => outcome.bright_green().bold().to_string(),
        "no_solution" => outcome.bright_red().bold().to_string(),
        _ => outcome.yellow().bold().to_string(),
    };
    let mut line = format!(
        "{} Search ended ({}): time spent ({}), expanded ({}), speed ({}/sec)",
        prefix("Search"),
        colored,
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        count(v.expanded).white(),
        count(v.speed).bright_magenta().bold(),
    );
    if let (Some(length), Some(makespan)) = (v.plan_length, v.makespan) {
        line.push_str(&format!(
            ", plan length ({}), makespan ({})",
            length.to_formatted_string(&Locale::en).bright_green(),
            format!("{:.3}", makespan).bright_green(),
        ));
    }
    line
}

fn format_plan_validated(v: &EventVisitor) -> String {
    format!(
        "{} Plan of {} steps validated, makespan ({})",
        prefix("Validator"),
        count(v.steps).white(),
        format!("{:.3}", v.makespan.unwrap_or(0.0)).bright_green(),
    )
}

fn format_plan_rejected(v: &EventVisitor) -> String {
    format!(
        "{} {} {} {}",
        timestamp().bright_black(),
        "WARN".bright_red(),
        "[Validator]".bright_cyan(),
        v.error.as_deref().unwrap_or("plan rejected").bright_red(),
    )
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

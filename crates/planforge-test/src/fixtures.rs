//! Hand-written planning problems.
//!
//! Each fixture documents the outcome a correct planner produces, so tests
//! across crates can share one set of expectations.

/// A domain/problem text pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixture {
    pub name: &'static str,
    pub domain: &'static str,
    pub problem: &'static str,
}

/// One durative action whose condition is the initial state and whose
/// effect is the goal. Solved by a single step of duration 1.
pub const TRIVIAL: Fixture = Fixture {
    name: "trivial",
    domain: r#"
(define (domain trivial)
  (:requirements :strips :durative-actions)
  (:predicates (ready) (done))
  (:durative-action finish
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (ready))
    :effect (at end (done))))
"#,
    problem: r#"
(define (problem trivial-1)
  (:domain trivial)
  (:init (ready))
  (:goal (done)))
"#,
};

/// A robot fetches a parcel from the hall and drops it in the office.
///
/// Needs four steps: move, pick, move, drop (makespan 6). `connected` is
/// static, so only the four moves between adjacent rooms survive grounding.
pub const DELIVERY: Fixture = Fixture {
    name: "delivery",
    domain: r#"
; Rooms are connected in a line: depot - hall - office.
(define (domain delivery)
  (:requirements :strips :typing :durative-actions)
  (:types robot parcel room)
  (:predicates
    (at ?r - robot ?l - room)
    (in ?p - parcel ?l - room)
    (holding ?r - robot ?p - parcel)
    (free ?r - robot)
    (connected ?a ?b - room))
  (:durative-action move
    :parameters (?r - robot ?from ?to - room)
    :duration (= ?duration 2)
    :condition (and (at start (at ?r ?from))
                    (over all (connected ?from ?to)))
    :effect (and (at start (not (at ?r ?from)))
                 (at end (at ?r ?to))))
  (:durative-action pick
    :parameters (?r - robot ?p - parcel ?l - room)
    :duration (= ?duration 1)
    :condition (and (at start (free ?r))
                    (at start (in ?p ?l))
                    (over all (at ?r ?l)))
    :effect (and (at start (not (free ?r)))
                 (at start (not (in ?p ?l)))
                 (at end (holding ?r ?p))))
  (:durative-action drop
    :parameters (?r - robot ?p - parcel ?l - room)
    :duration (= ?duration 1)
    :condition (and (at start (holding ?r ?p))
                    (over all (at ?r ?l)))
    :effect (and (at start (not (holding ?r ?p)))
                 (at end (in ?p ?l))
                 (at end (free ?r)))))
"#,
    problem: r#"
(define (problem deliver-parcel)
  (:domain delivery)
  (:objects r1 - robot p1 - parcel depot hall office - room)
  (:init (at r1 depot) (in p1 hall) (free r1)
         (connected depot hall) (connected hall depot)
         (connected hall office) (connected office hall))
  (:goal (in p1 office)))
"#,
};

/// `maintain` cuts the power that `operate` needs over all; the two can
/// never overlap. Every valid plan sequences them (makespan 6).
pub const POWER: Fixture = Fixture {
    name: "power",
    domain: r#"
(define (domain power)
  (:requirements :strips :durative-actions)
  (:predicates (powered) (operated) (maintained))
  (:durative-action operate
    :parameters ()
    :duration (= ?duration 4)
    :condition (and (at start (powered)) (over all (powered)))
    :effect (at end (operated)))
  (:durative-action maintain
    :parameters ()
    :duration (= ?duration 2)
    :condition (at start (powered))
    :effect (and (at start (not (powered)))
                 (at end (powered))
                 (at end (maintained)))))
"#,
    problem: r#"
(define (problem power-1)
  (:domain power)
  (:init (powered))
  (:goal (and (operated) (maintained))))
"#,
};

/// Walking takes 5, fetching a bike then riding takes 3. The deadline
/// forces the bike.
pub const COURIER: Fixture = Fixture {
    name: "courier",
    domain: r#"
(define (domain courier)
  (:requirements :strips :durative-actions)
  (:predicates (at-depot) (has-bike) (delivered))
  (:durative-action walk
    :parameters ()
    :duration (= ?duration 5)
    :condition (at start (at-depot))
    :effect (at end (delivered)))
  (:durative-action get-bike
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (at-depot))
    :effect (at end (has-bike)))
  (:durative-action ride
    :parameters ()
    :duration (= ?duration 2)
    :condition (and (at start (at-depot)) (at start (has-bike)))
    :effect (at end (delivered))))
"#,
    problem: r#"
(define (problem courier-rush)
  (:domain courier)
  (:init (at-depot))
  (:goal (delivered))
  (:deadline 3.5))
"#,
};

/// Same courier domain without a deadline; the fastest plan has makespan 3.
pub const COURIER_RELAXED: Fixture = Fixture {
    name: "courier-relaxed",
    domain: COURIER.domain,
    problem: r#"
(define (problem courier-any)
  (:domain courier)
  (:init (at-depot))
  (:goal (delivered)))
"#,
};

/// Numeric fluents: one `produce` run lifts the stock from 3 to 6.
pub const FACTORY: Fixture = Fixture {
    name: "factory",
    domain: r#"
(define (domain factory)
  (:requirements :typing :durative-actions :numeric-fluents)
  (:types machine)
  (:predicates (idle ?m - machine))
  (:functions (stock) - number (rate ?m - machine) - number)
  (:durative-action produce
    :parameters (?m - machine)
    :duration (= ?duration (/ 10 (rate ?m)))
    :condition (and (at start (idle ?m)) (at start (>= (stock) 1)))
    :effect (and (at start (not (idle ?m)))
                 (at start (decrease (stock) 1))
                 (at end (increase (stock) (* 2 ?duration)))
                 (at end (idle ?m)))))
"#,
    problem: r#"
(define (problem stock-up)
  (:domain factory)
  (:objects m1 - machine)
  (:init (idle m1) (= (stock) 3) (= (rate m1) 5))
  (:goal (>= (stock) 5)))
"#,
};

/// The only action divides by a fluent that is zero.
pub const LEDGER: Fixture = Fixture {
    name: "ledger",
    domain: r#"
(define (domain ledger)
  (:requirements :durative-actions :numeric-fluents)
  (:predicates (open) (settled))
  (:functions (balance) - number (divisor) - number)
  (:durative-action settle
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (open))
    :effect (and (at start (not (open)))
                 (at end (settled))
                 (at end (scale-down (balance) (divisor))))))
"#,
    problem: r#"
(define (problem ledger-1)
  (:domain ledger)
  (:init (open) (= (balance) 10) (= (divisor) 0))
  (:goal (settled)))
"#,
};

/// The goal literal is never added by any action.
pub const UNSOLVABLE: Fixture = Fixture {
    name: "unsolvable",
    domain: r#"
(define (domain lights)
  (:requirements :strips :durative-actions)
  (:predicates (off) (on) (broken))
  (:durative-action switch-on
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (off))
    :effect (and (at start (not (off))) (at end (on)))))
"#,
    problem: r#"
(define (problem lights-1)
  (:domain lights)
  (:init (off))
  (:goal (broken)))
"#,
};

/// The action precondition names a predicate that was never declared.
pub const UNDECLARED_PREDICATE: Fixture = Fixture {
    name: "undeclared-predicate",
    domain: r#"
(define (domain broken)
  (:requirements :strips :durative-actions)
  (:predicates (ready) (done))
  (:durative-action finish
    :parameters ()
    :duration (= ?duration 1)
    :condition (at start (prepared))
    :effect (at end (done))))
"#,
    problem: r#"
(define (problem broken-1)
  (:domain broken)
  (:init (ready))
  (:goal (done)))
"#,
};

/// Fixtures that have a plan under default settings.
pub const SOLVABLE: &[Fixture] = &[TRIVIAL, DELIVERY, POWER, COURIER, COURIER_RELAXED, FACTORY];

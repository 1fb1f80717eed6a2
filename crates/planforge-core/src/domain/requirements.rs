//! Requirement flags

use std::fmt;

/// A requirement flag the planner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    Strips,
    Typing,
    NegativePreconditions,
    Equality,
    DurativeActions,
    DurationInequalities,
    NumericFluents,
    Fluents,
    Adl,
}

impl Requirement {
    pub const ALL: [Requirement; 9] = [
        Requirement::Strips,
        Requirement::Typing,
        Requirement::NegativePreconditions,
        Requirement::Equality,
        Requirement::DurativeActions,
        Requirement::DurationInequalities,
        Requirement::NumericFluents,
        Requirement::Fluents,
        Requirement::Adl,
    ];

    /// Keyword as written in a `:requirements` list, without the colon.
    pub fn keyword(self) -> &'static str {
        match self {
            Requirement::Strips => "strips",
            Requirement::Typing => "typing",
            Requirement::NegativePreconditions => "negative-preconditions",
            Requirement::Equality => "equality",
            Requirement::DurativeActions => "durative-actions",
            Requirement::DurationInequalities => "duration-inequalities",
            Requirement::NumericFluents => "numeric-fluents",
            Requirement::Fluents => "fluents",
            Requirement::Adl => "adl",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.keyword() == keyword)
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Flags implied by this one.
    fn implied(self) -> &'static [Requirement] {
        match self {
            Requirement::Adl => &[
                Requirement::Strips,
                Requirement::Typing,
                Requirement::NegativePreconditions,
                Requirement::Equality,
            ],
            Requirement::Fluents => &[Requirement::NumericFluents],
            Requirement::DurationInequalities => &[Requirement::DurativeActions],
            _ => &[],
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.keyword())
    }
}

/// A set of requirement flags, closed under implication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Requirements {
    bits: u16,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set assumed when a document declares no requirements.
    pub fn strips() -> Self {
        let mut set = Self::new();
        set.insert(Requirement::Strips);
        set
    }

    /// Adds a flag and everything it implies.
    pub fn insert(&mut self, requirement: Requirement) {
        self.bits |= requirement.bit();
        for &implied in requirement.implied() {
            self.insert(implied);
        }
    }

    pub fn contains(&self, requirement: Requirement) -> bool {
        self.bits & requirement.bit() != 0
    }

    pub fn union(&self, other: &Requirements) -> Requirements {
        Requirements {
            bits: self.bits | other.bits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Requirement> + '_ {
        Requirement::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Requirement> for Requirements {
    fn from_iter<I: IntoIterator<Item = Requirement>>(iter: I) -> Self {
        let mut set = Requirements::new();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

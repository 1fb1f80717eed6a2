//! Tests for lifted declarations (types, objects, requirements, domain).

use super::*;

// ============================================================================
// Type Hierarchy Tests
// ============================================================================

mod type_tests {
    use super::*;

    #[test]
    fn test_object_is_root() {
        let types = TypeHierarchy::new();
        assert_eq!(types.lookup("object"), Some(TypeHierarchy::OBJECT));
        assert_eq!(types.parent(TypeHierarchy::OBJECT), None);
    }

    #[test]
    fn test_subtype_chain() {
        let mut types = TypeHierarchy::new();
        let vehicle = types.declare("vehicle");
        let truck = types.declare("truck");
        let place = types.declare("place");
        types.set_parent(truck, vehicle).unwrap();

        assert!(types.is_subtype(truck, vehicle));
        assert!(types.is_subtype(truck, TypeHierarchy::OBJECT));
        assert!(!types.is_subtype(vehicle, truck));
        assert!(types.compatible(vehicle, truck));
        assert!(!types.compatible(truck, place));
        assert_eq!(types.parent(place), Some(TypeHierarchy::OBJECT));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut types = TypeHierarchy::new();
        let a = types.declare("a");
        let b = types.declare("b");
        types.set_parent(a, b).unwrap();
        let err = types.set_parent(b, a).unwrap_err();
        assert!(matches!(err, TypeHierarchyError::Cycle { .. }));
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut types = TypeHierarchy::new();
        let a = types.declare("a");
        assert!(types.set_parent(a, a).is_err());
    }

    #[test]
    fn test_conflicting_parent_rejected() {
        let mut types = TypeHierarchy::new();
        let a = types.declare("a");
        let b = types.declare("b");
        let c = types.declare("c");
        types.set_parent(a, b).unwrap();
        types.set_parent(a, b).unwrap();
        assert!(matches!(
            types.set_parent(a, c),
            Err(TypeHierarchyError::ConflictingParent { .. })
        ));
    }

    #[test]
    fn test_object_cannot_extend() {
        let mut types = TypeHierarchy::new();
        let a = types.declare("a");
        assert_eq!(
            types.set_parent(TypeHierarchy::OBJECT, a),
            Err(TypeHierarchyError::RootHasParent)
        );
        assert!(types.set_parent(TypeHierarchy::OBJECT, TypeHierarchy::OBJECT).is_ok());
    }
}

// ============================================================================
// Object Table Tests
// ============================================================================

mod object_tests {
    use super::*;

    #[test]
    fn test_type_extension_includes_subtypes() {
        let mut types = TypeHierarchy::new();
        let vehicle = types.declare("vehicle");
        let truck = types.declare("truck");
        let place = types.declare("place");
        types.set_parent(truck, vehicle).unwrap();

        let mut objects = ObjectTable::new();
        let t1 = objects.insert("t1", truck).unwrap();
        let v1 = objects.insert("v1", vehicle).unwrap();
        let p1 = objects.insert("p1", place).unwrap();

        assert_eq!(objects.of_type(&types, vehicle), vec![t1, v1]);
        assert_eq!(objects.of_type(&types, truck), vec![t1]);
        assert_eq!(
            objects.of_type(&types, TypeHierarchy::OBJECT),
            vec![t1, v1, p1]
        );
    }

    #[test]
    fn test_duplicate_object() {
        let mut objects = ObjectTable::new();
        let a = objects.insert("a", TypeHierarchy::OBJECT).unwrap();
        assert_eq!(objects.insert("a", TypeHierarchy::OBJECT), Err(a));
        assert_eq!(objects.len(), 1);
        assert_eq!(objects.name(a), "a");
    }
}

// ============================================================================
// Requirement Tests
// ============================================================================

mod requirement_tests {
    use super::*;

    #[test]
    fn test_adl_implies_typing_and_equality() {
        let reqs: Requirements = [Requirement::Adl].into_iter().collect();
        assert!(reqs.contains(Requirement::Typing));
        assert!(reqs.contains(Requirement::NegativePreconditions));
        assert!(reqs.contains(Requirement::Equality));
        assert!(!reqs.contains(Requirement::DurativeActions));
    }

    #[test]
    fn test_fluents_alias() {
        let reqs: Requirements = [Requirement::Fluents].into_iter().collect();
        assert!(reqs.contains(Requirement::NumericFluents));
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(
            Requirement::from_keyword("durative-actions"),
            Some(Requirement::DurativeActions)
        );
        assert_eq!(Requirement::from_keyword("timed-initial-literals"), None);
        assert_eq!(Requirement::Typing.to_string(), ":typing");
    }

    #[test]
    fn test_strips_default() {
        let reqs = Requirements::strips();
        assert_eq!(reqs.iter().collect::<Vec<_>>(), vec![Requirement::Strips]);
    }
}

// ============================================================================
// Domain Tests
// ============================================================================

mod domain_tests {
    use super::*;

    fn sample_domain() -> Domain {
        let mut domain = Domain::new("sample");
        let at = domain
            .add_predicate(PredicateSignature {
                name: "at".to_string(),
                params: vec![TypedParameter::new("?x", TypeHierarchy::OBJECT)],
            })
            .unwrap();
        domain
            .add_predicate(PredicateSignature {
                name: "road".to_string(),
                params: vec![],
            })
            .unwrap();
        domain.actions.push(ActionSchema {
            name: "go".to_string(),
            parameters: vec![TypedParameter::new("?x", TypeHierarchy::OBJECT)],
            duration: None,
            conditions: vec![],
            effects: vec![TimedEffect {
                timing: EffectTiming::AtStart,
                effect: Effect::Add(AtomTemplate {
                    predicate: at,
                    args: vec![Term::Param(0)],
                }),
            }],
        });
        domain
    }

    #[test]
    fn test_duplicate_predicate() {
        let mut domain = sample_domain();
        let err = domain.add_predicate(PredicateSignature {
            name: "at".to_string(),
            params: vec![],
        });
        assert_eq!(err, Err(PredicateId(0)));
    }

    #[test]
    fn test_static_predicates() {
        let domain = sample_domain();
        assert_eq!(domain.static_predicates(), vec![false, true]);
        assert!(!domain.has_durative_actions());
        assert!(domain.action("go").is_some());
    }

    #[test]
    fn test_term_resolve() {
        let binding = [ObjectId(3), ObjectId(5)];
        assert_eq!(Term::Param(1).resolve(&binding), ObjectId(5));
        assert_eq!(Term::Object(ObjectId(9)).resolve(&binding), ObjectId(9));
    }
}

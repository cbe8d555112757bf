//! Navigation resolution between two entity types
//!
//! Given two entity descriptors, [`resolve`] determines whether and how
//! they are linked:
//!
//! - **Bidirectional**: both sides declare a navigation field and the two
//!   fields share an association identity.
//! - **Unidirectional**: only one side declares a navigation field.
//! - **Self-referential**: source and target are the same type; the first
//!   declared field wins and the relation is treated as one-sided.
//!
//! The resulting [`NavInfo`] is a transient, request-scoped value; it is
//! never cached.

use crate::core::error::{EngineResult, MetadataError};
use crate::model::descriptor::{EntityDescriptor, Multiplicity, NavigationDescriptor};

/// Build the canonical association name from two role names.
///
/// The smaller name (by lexicographic comparison) always comes first, so
/// both sides of a relation derive the identical canonical name.
pub fn canonical_association(first_role: &str, second_role: &str) -> String {
    if first_role > second_role {
        format!("{}_2_{}", second_role, first_role)
    } else {
        format!("{}_2_{}", first_role, second_role)
    }
}

/// Association identity of a navigation field as declared on its owner:
/// the explicit association name, or the canonical name built from the two
/// entity-type names.
fn declared_association(owner: &EntityDescriptor, navigation: &NavigationDescriptor) -> String {
    match &navigation.association {
        Some(association) => association.clone(),
        None => canonical_association(owner.entity(), &navigation.target),
    }
}

/// Resolved navigation between two entity types.
///
/// At least one of `from_field`/`to_field` is always present; both are
/// present only for a bidirectional relation.
#[derive(Debug, Clone)]
pub struct NavInfo {
    from_field: Option<NavigationDescriptor>,
    to_field: Option<NavigationDescriptor>,
    source_entity: String,
    target_entity: String,
}

impl NavInfo {
    /// The navigation field declared on the source side, if any
    pub fn from_field(&self) -> Option<&NavigationDescriptor> {
        self.from_field.as_ref()
    }

    /// The navigation field declared on the target side, if any
    pub fn to_field(&self) -> Option<&NavigationDescriptor> {
        self.to_field.as_ref()
    }

    /// Whether both sides declare the relation
    pub fn is_bidirectional(&self) -> bool {
        self.from_field.is_some() && self.to_field.is_some()
    }

    /// Entity-type name of the source side
    pub fn source_entity(&self) -> &str {
        &self.source_entity
    }

    /// Entity-type name of the target side
    pub fn target_entity(&self) -> &str {
        &self.target_entity
    }

    /// Role name of the source side.
    ///
    /// Derived from the target side's field when present; for a one-sided
    /// relation the absent side is named after the owning entity type.
    pub fn from_role(&self) -> String {
        match &self.to_field {
            Some(to_field) => to_field.role_name(),
            None => self.source_entity.clone(),
        }
    }

    /// Role name of the target side
    pub fn to_role(&self) -> String {
        match &self.from_field {
            Some(from_field) => from_field.role_name(),
            None => self.target_entity.clone(),
        }
    }

    /// Multiplicity of the source side (how many sources per target)
    pub fn from_multiplicity(&self) -> Multiplicity {
        match &self.to_field {
            Some(to_field) => to_field.multiplicity(),
            None => Multiplicity::One,
        }
    }

    /// Multiplicity of the target side (how many targets per source).
    ///
    /// When only the target side declares the relation, the multiplicity is
    /// the inverse of that declaration: a to-one back-pointer implies a
    /// collection of targets per source.
    pub fn to_multiplicity(&self) -> Multiplicity {
        match &self.from_field {
            Some(from_field) => from_field.multiplicity(),
            None => match self.to_field.as_ref().map(|f| f.multiplicity()) {
                Some(Multiplicity::Many) => Multiplicity::One,
                _ => Multiplicity::Many,
            },
        }
    }

    /// The association name of the relation.
    ///
    /// An explicit association name on either side wins; both sides
    /// declaring different names is a metadata error. Without explicit
    /// names the canonical `role_2_role` form is derived from the two role
    /// names in sorted order.
    pub fn association(&self) -> EngineResult<String> {
        let from_association = self
            .from_field
            .as_ref()
            .and_then(|f| f.association.as_deref());
        let to_association = self.to_field.as_ref().and_then(|f| f.association.as_deref());

        match (from_association, to_association) {
            (Some(a), Some(b)) if a != b => Err(MetadataError::AmbiguousAssociation {
                from_association: a.to_string(),
                to_association: b.to_string(),
            }
            .into()),
            (Some(a), _) => Ok(a.to_string()),
            (None, Some(b)) => Ok(b.to_string()),
            (None, None) => Ok(canonical_association(&self.from_role(), &self.to_role())),
        }
    }
}

/// Resolve the navigation between `source` and `target`, if any.
pub fn resolve(source: &EntityDescriptor, target: &EntityDescriptor) -> Option<NavInfo> {
    let source_fields: Vec<&NavigationDescriptor> = source
        .navigations()
        .iter()
        .filter(|n| n.target == target.entity())
        .collect();
    let target_fields: Vec<&NavigationDescriptor> = target
        .navigations()
        .iter()
        .filter(|n| n.target == source.entity())
        .collect();

    // Self-navigation: the first declared field wins, one-sided.
    if source.entity() == target.entity() {
        return source_fields.first().map(|field| NavInfo {
            from_field: Some((*field).clone()),
            to_field: None,
            source_entity: source.entity().to_string(),
            target_entity: target.entity().to_string(),
        });
    }

    // Bidirectional: first pair with matching association identity, in
    // declaration order on both sides.
    for source_field in source_fields.iter().copied() {
        let source_association = declared_association(source, source_field);
        for target_field in target_fields.iter().copied() {
            if source_association == declared_association(target, target_field) {
                return Some(NavInfo {
                    from_field: Some(source_field.clone()),
                    to_field: Some(target_field.clone()),
                    source_entity: source.entity().to_string(),
                    target_entity: target.entity().to_string(),
                });
            }
        }
    }

    // Unidirectional fallback: prefer the source side.
    if let Some(field) = source_fields.first() {
        return Some(NavInfo {
            from_field: Some((*field).clone()),
            to_field: None,
            source_entity: source.entity().to_string(),
            target_entity: target.entity().to_string(),
        });
    }
    if let Some(field) = target_fields.first() {
        return Some(NavInfo {
            from_field: None,
            to_field: Some((*field).clone()),
            source_entity: source.entity().to_string(),
            target_entity: target.entity().to_string(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::PropertyType;

    fn building() -> EntityDescriptor {
        EntityDescriptor::builder("Building")
            .entity_set("Buildings")
            .key("id", PropertyType::Int32)
            .property("name", PropertyType::String)
            .navigation(NavigationDescriptor::to_many("rooms", "Room"))
            .build()
            .unwrap()
    }

    fn room() -> EntityDescriptor {
        EntityDescriptor::builder("Room")
            .entity_set("Rooms")
            .key("id", PropertyType::Int32)
            .property("name", PropertyType::String)
            .navigation(NavigationDescriptor::to_one("building", "Building"))
            .build()
            .unwrap()
    }

    fn employee_with_manager() -> EntityDescriptor {
        EntityDescriptor::builder("Employee")
            .entity_set("Employees")
            .key("id", PropertyType::Int32)
            .navigation(NavigationDescriptor::to_one("manager", "Employee"))
            .navigation(NavigationDescriptor::to_many("reports", "Employee"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_bidirectional_resolution() {
        let info = resolve(&room(), &building()).unwrap();

        assert!(info.is_bidirectional());
        assert_eq!(info.from_field().unwrap().name, "Building");
        assert_eq!(info.to_field().unwrap().name, "Rooms");
        assert_eq!(info.from_multiplicity(), Multiplicity::Many);
        assert_eq!(info.to_multiplicity(), Multiplicity::One);
        assert_eq!(info.from_role(), "r_Rooms");
        assert_eq!(info.to_role(), "r_Building");
    }

    #[test]
    fn test_bidirectional_roles_mirror_each_other() {
        let forward = resolve(&room(), &building()).unwrap();
        let reverse = resolve(&building(), &room()).unwrap();

        assert_eq!(forward.from_role(), reverse.to_role());
        assert_eq!(forward.to_role(), reverse.from_role());
        assert_eq!(forward.from_multiplicity(), reverse.to_multiplicity());
        assert_eq!(forward.to_multiplicity(), reverse.from_multiplicity());
        assert_eq!(
            forward.association().unwrap(),
            reverse.association().unwrap()
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let first = resolve(&room(), &building()).unwrap();
        let second = resolve(&room(), &building()).unwrap();

        assert_eq!(first.from_role(), second.from_role());
        assert_eq!(first.to_role(), second.to_role());
        assert_eq!(first.association().unwrap(), second.association().unwrap());
    }

    #[test]
    fn test_self_navigation_is_one_sided() {
        let employee = employee_with_manager();
        let info = resolve(&employee, &employee).unwrap();

        assert!(!info.is_bidirectional());
        assert!(info.to_field().is_none());
        // First declared field wins.
        assert_eq!(info.from_field().unwrap().name, "Manager");
        assert_eq!(info.from_multiplicity(), Multiplicity::One);
    }

    #[test]
    fn test_unidirectional_forward() {
        let team = EntityDescriptor::builder("Team")
            .key("id", PropertyType::Int32)
            .navigation(NavigationDescriptor::to_many("members", "Employee"))
            .build()
            .unwrap();
        let employee = EntityDescriptor::builder("Employee")
            .key("id", PropertyType::Int32)
            .build()
            .unwrap();

        let info = resolve(&team, &employee).unwrap();
        assert!(!info.is_bidirectional());
        assert_eq!(info.from_field().unwrap().name, "Members");
        assert_eq!(info.to_role(), "r_Members");
        // The absent side is named after its entity type.
        assert_eq!(info.from_role(), "Team");
        assert_eq!(info.from_multiplicity(), Multiplicity::One);
    }

    #[test]
    fn test_unidirectional_reverse() {
        let team = EntityDescriptor::builder("Team")
            .key("id", PropertyType::Int32)
            .build()
            .unwrap();
        let employee = EntityDescriptor::builder("Employee")
            .key("id", PropertyType::Int32)
            .navigation(NavigationDescriptor::to_one("team", "Team"))
            .build()
            .unwrap();

        // Resolving from the side without a field still finds the relation.
        let info = resolve(&team, &employee).unwrap();
        assert!(info.from_field().is_none());
        assert_eq!(info.to_field().unwrap().name, "Team");
        // A to-one back-pointer implies many targets per source.
        assert_eq!(info.to_multiplicity(), Multiplicity::Many);
    }

    #[test]
    fn test_no_navigation() {
        let a = EntityDescriptor::builder("A")
            .key("id", PropertyType::Int32)
            .build()
            .unwrap();
        let b = EntityDescriptor::builder("B")
            .key("id", PropertyType::Int32)
            .build()
            .unwrap();
        assert!(resolve(&a, &b).is_none());
    }

    #[test]
    fn test_explicit_association_pairs_fields() {
        // Two independent relations between the same pair of types; the
        // explicit association names decide which fields belong together.
        let user = EntityDescriptor::builder("User")
            .key("id", PropertyType::Int32)
            .navigation(
                NavigationDescriptor::to_many("ownedCars", "Car").association("Ownership"),
            )
            .navigation(
                NavigationDescriptor::to_many("drivenCars", "Car").association("Driving"),
            )
            .build()
            .unwrap();
        let car = EntityDescriptor::builder("Car")
            .key("id", PropertyType::Int32)
            .navigation(NavigationDescriptor::to_one("driver", "User").association("Driving"))
            .build()
            .unwrap();

        let info = resolve(&user, &car).unwrap();
        assert!(info.is_bidirectional());
        assert_eq!(info.from_field().unwrap().name, "DrivenCars");
        assert_eq!(info.to_field().unwrap().name, "Driver");
        assert_eq!(info.association().unwrap(), "Driving");
    }

    #[test]
    fn test_canonical_association_is_sorted() {
        assert_eq!(canonical_association("b", "a"), "a_2_b");
        assert_eq!(canonical_association("a", "b"), "a_2_b");
    }

    #[test]
    fn test_ambiguous_association_is_error() {
        let info = NavInfo {
            from_field: Some(
                NavigationDescriptor::to_one("building", "Building").association("First"),
            ),
            to_field: Some(
                NavigationDescriptor::to_many("rooms", "Room").association("Second"),
            ),
            source_entity: "Room".to_string(),
            target_entity: "Building".to_string(),
        };
        assert!(info.association().is_err());
    }
}

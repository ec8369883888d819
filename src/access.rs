// 🔐 Actors and scoping
// Administrators see everything. A representative sees population records of
// their own family and projects of their own tribe; donations are shared.

use crate::error::{RegistryError, Result};
use crate::records::{FamilyRepresentative, PersonRecord, Project};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Admin {
        email: String,
    },
    Representative {
        email: String,
        family_name: String,
        tribe_name: String,
    },
}

impl Actor {
    pub fn admin(email: &str) -> Self {
        Actor::Admin {
            email: email.to_string(),
        }
    }

    pub fn representative(email: &str, family_name: &str, tribe_name: &str) -> Self {
        Actor::Representative {
            email: email.to_string(),
            family_name: family_name.to_string(),
            tribe_name: tribe_name.to_string(),
        }
    }

    pub fn from_representative(rep: &FamilyRepresentative) -> Self {
        Actor::representative(&rep.email, &rep.family_name, &rep.tribe_name)
    }

    pub fn email(&self) -> &str {
        match self {
            Actor::Admin { email } => email,
            Actor::Representative { email, .. } => email,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }

    /// Family a population view must be restricted to
    pub fn population_scope(&self) -> Option<&str> {
        match self {
            Actor::Admin { .. } => None,
            Actor::Representative { family_name, .. } => Some(family_name),
        }
    }

    /// Tribe a project view must be restricted to
    pub fn project_scope(&self) -> Option<&str> {
        match self {
            Actor::Admin { .. } => None,
            Actor::Representative { tribe_name, .. } => Some(tribe_name),
        }
    }

    pub fn can_access_person(&self, person: &PersonRecord) -> bool {
        self.population_scope()
            .map_or(true, |family| person.family_name == family)
    }

    pub fn can_access_project(&self, project: &Project) -> bool {
        self.project_scope().map_or(true, |tribe| project.tribe == tribe)
    }

    pub fn ensure_person(&self, person: &PersonRecord) -> Result<()> {
        if self.can_access_person(person) {
            Ok(())
        } else {
            Err(RegistryError::Access(format!(
                "{} may only manage records of their own family",
                self.email()
            )))
        }
    }

    pub fn ensure_project(&self, project: &Project) -> Result<()> {
        if self.can_access_project(project) {
            Ok(())
        } else {
            Err(RegistryError::Access(format!(
                "{} may only manage projects of their own tribe",
                self.email()
            )))
        }
    }

    pub fn ensure_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(RegistryError::Access(format!("{} is not an administrator", self.email())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_no_scope() {
        let admin = Actor::admin("admin@example.com");
        assert_eq!(admin.population_scope(), None);
        assert_eq!(admin.project_scope(), None);
        assert!(admin.ensure_admin().is_ok());
    }

    #[test]
    fn test_representative_limited_to_family() {
        let rep = Actor::representative("rep@example.com", "بكاي", "انشاشبة");
        let own = PersonRecord::new("a", "بكاي", "انشاشبة", "20");
        let other = PersonRecord::new("b", "دبوز", "انشاشبة", "20");

        assert!(rep.ensure_person(&own).is_ok());
        assert!(matches!(rep.ensure_person(&other), Err(RegistryError::Access(_))));
        assert!(rep.ensure_admin().is_err());
    }

    #[test]
    fn test_actor_from_stored_representative() {
        let stored = FamilyRepresentative {
            id: "rep_1_abcdefghi".to_string(),
            email: "rep@example.com".to_string(),
            password: "secret".to_string(),
            name: "Ahmed".to_string(),
            family_name: "بكاي".to_string(),
            tribe_name: "انشاشبة".to_string(),
            contact: None,
        };
        let actor = Actor::from_representative(&stored);

        assert_eq!(actor, Actor::representative("rep@example.com", "بكاي", "انشاشبة"));
        assert_eq!(actor.email(), "rep@example.com");
        assert_eq!(actor.population_scope(), Some("بكاي"));
        assert_eq!(actor.project_scope(), Some("انشاشبة"));
    }
}

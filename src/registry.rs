// 📋 Registry - population, donation and representative bookkeeping
// Every change is a full-collection read-modify-write through the store.
// Representatives are checked against their family before anything is saved.

use log::info;

use crate::access::Actor;
use crate::error::{RegistryError, Result};
use crate::filter::{apply_filters, FilterCriteria};
use crate::records::{Donation, FamilyRepresentative, PersonRecord};
use crate::store::{self, RecordStore};

// ============================================================================
// POPULATION
// ============================================================================

pub fn add_person(store: &dyn RecordStore, actor: &Actor, person: PersonRecord) -> Result<PersonRecord> {
    person.validate()?;
    actor.ensure_person(&person)?;

    store::insert_record(store, person.clone())?;
    info!("➕ Added person {} ({})", person.id, person.family_name);
    Ok(person)
}

/// Replace a person; both the stored and the edited version must be in scope
pub fn update_person(store: &dyn RecordStore, actor: &Actor, person: PersonRecord) -> Result<()> {
    person.validate()?;
    actor.ensure_person(&person)?;

    let existing = find_person(store, &person.id)?;
    actor.ensure_person(&existing)?;

    store::replace_record(store, person)
}

pub fn delete_person(store: &dyn RecordStore, actor: &Actor, id: &str) -> Result<PersonRecord> {
    let existing = find_person(store, id)?;
    actor.ensure_person(&existing)?;

    let removed: PersonRecord = store::remove_record(store, id)?;
    info!("🗑️  Deleted person {}", removed.id);
    Ok(removed)
}

fn find_person(store: &dyn RecordStore, id: &str) -> Result<PersonRecord> {
    store::load_all::<PersonRecord>(store)?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| RegistryError::not_found(store::POPULATION, id))
}

/// Population visible to the actor, narrowed by `criteria`.
///
/// The actor's family scope always wins over any scope set in `criteria`.
/// A storage fault degrades to an empty list.
pub fn list_people(store: &dyn RecordStore, actor: &Actor, criteria: &FilterCriteria) -> Vec<PersonRecord> {
    let people: Vec<PersonRecord> = store::load_or_empty(store, store::POPULATION);
    let scoped = scoped_criteria(criteria, actor.population_scope());
    apply_filters(&people, &scoped)
}

fn scoped_criteria(criteria: &FilterCriteria, scope: Option<&str>) -> FilterCriteria {
    match scope {
        Some(owner) => criteria.clone().with_owner_scope(Some(owner)),
        None => criteria.clone(),
    }
}

// ============================================================================
// DONATIONS
// ============================================================================

pub fn add_donation(store: &dyn RecordStore, donation: Donation) -> Result<Donation> {
    donation.validate()?;
    store::insert_record(store, donation.clone())?;
    info!("➕ Recorded donation {} from {}", donation.id, donation.donor_name);
    Ok(donation)
}

pub fn update_donation(store: &dyn RecordStore, donation: Donation) -> Result<()> {
    donation.validate()?;
    store::replace_record(store, donation)
}

pub fn delete_donation(store: &dyn RecordStore, id: &str) -> Result<Donation> {
    store::remove_record(store, id)
}

/// Donations are shared by every actor; only `criteria` narrows them
pub fn list_donations(store: &dyn RecordStore, criteria: &FilterCriteria) -> Vec<Donation> {
    let donations: Vec<Donation> = store::load_or_empty(store, store::DONATIONS);
    apply_filters(&donations, criteria)
}

// ============================================================================
// REPRESENTATIVES
// ============================================================================

pub fn add_representative(
    store: &dyn RecordStore,
    actor: &Actor,
    rep: FamilyRepresentative,
) -> Result<FamilyRepresentative> {
    actor.ensure_admin()?;
    rep.validate()?;

    let existing: Vec<FamilyRepresentative> = store::load_all(store)?;
    if existing.iter().any(|r| same_email(&r.email, &rep.email)) {
        return Err(RegistryError::validation(
            "email",
            format!("{} is already registered", rep.email),
        ));
    }

    store::insert_record(store, rep.clone())?;
    info!("👤 Registered representative {} for {}", rep.email, rep.family_name);
    Ok(rep)
}

pub fn update_representative(store: &dyn RecordStore, actor: &Actor, rep: FamilyRepresentative) -> Result<()> {
    actor.ensure_admin()?;
    rep.validate()?;

    let existing: Vec<FamilyRepresentative> = store::load_all(store)?;
    if existing
        .iter()
        .any(|r| r.id != rep.id && same_email(&r.email, &rep.email))
    {
        return Err(RegistryError::validation(
            "email",
            format!("{} is already registered", rep.email),
        ));
    }

    store::replace_record(store, rep)
}

pub fn delete_representative(store: &dyn RecordStore, actor: &Actor, id: &str) -> Result<FamilyRepresentative> {
    actor.ensure_admin()?;
    store::remove_record(store, id)
}

/// Look up a representative by email and password
pub fn find_representative(store: &dyn RecordStore, email: &str, password: &str) -> Option<FamilyRepresentative> {
    store::load_or_empty::<FamilyRepresentative>(store, store::REPRESENTATIVES)
        .into_iter()
        .find(|r| same_email(&r.email, email) && r.password == password)
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DonationPurpose;
    use crate::store::MemoryStore;

    fn create_test_person(first: &str, family: &str) -> PersonRecord {
        let mut p = PersonRecord::new(first, family, "انشاشبة", "30");
        p.father_name = "علي".to_string();
        p.residential_area = "حي باسة".to_string();
        p
    }

    fn create_test_representative(email: &str) -> FamilyRepresentative {
        FamilyRepresentative {
            id: crate::records::new_record_id("rep"),
            email: email.to_string(),
            password: "secret".to_string(),
            name: "Ahmed".to_string(),
            family_name: "بكاي".to_string(),
            tribe_name: "انشاشبة".to_string(),
            contact: None,
        }
    }

    #[test]
    fn test_representative_adds_only_own_family() {
        let store = MemoryStore::new();
        let rep = Actor::representative("rep@example.com", "بكاي", "انشاشبة");

        assert!(add_person(&store, &rep, create_test_person("a", "بكاي")).is_ok());
        let result = add_person(&store, &rep, create_test_person("b", "دبوز"));
        assert!(matches!(result, Err(RegistryError::Access(_))));

        let all: Vec<PersonRecord> = store::load_all(&store).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_invalid_person_is_not_saved() {
        let store = MemoryStore::new();
        let admin = Actor::admin("admin@example.com");
        let mut person = create_test_person("a", "بكاي");
        person.age = "abc".to_string();

        let result = add_person(&store, &admin, person);
        assert!(matches!(result, Err(RegistryError::Validation { .. })));
        assert!(store.read_raw(store::POPULATION).unwrap().is_none());
    }

    #[test]
    fn test_list_people_is_scoped_to_family() {
        let store = MemoryStore::new();
        let admin = Actor::admin("admin@example.com");
        add_person(&store, &admin, create_test_person("a", "بكاي")).unwrap();
        add_person(&store, &admin, create_test_person("b", "دبوز")).unwrap();
        add_person(&store, &admin, create_test_person("c", "بكاي")).unwrap();

        let rep = Actor::representative("rep@example.com", "بكاي", "انشاشبة");
        let loose = FilterCriteria::new().with_owner_scope(Some("دبوز"));
        let visible = list_people(&store, &rep, &loose);
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|p| p.family_name == "بكاي"));

        assert_eq!(list_people(&store, &admin, &FilterCriteria::new()).len(), 3);
    }

    #[test]
    fn test_update_and_delete_person() {
        let store = MemoryStore::new();
        let admin = Actor::admin("admin@example.com");
        let mut person = add_person(&store, &admin, create_test_person("a", "بكاي")).unwrap();

        person.age = "31".to_string();
        update_person(&store, &admin, person.clone()).unwrap();
        let all: Vec<PersonRecord> = store::load_all(&store).unwrap();
        assert_eq!(all[0].age, "31");

        let rep = Actor::representative("rep@example.com", "دبوز", "انشاشبة");
        assert!(delete_person(&store, &rep, &person.id).is_err());
        assert!(delete_person(&store, &admin, &person.id).is_ok());
        assert!(matches!(
            delete_person(&store, &admin, &person.id),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_unavailable_store_lists_nothing() {
        let store = MemoryStore::unavailable();
        let admin = Actor::admin("admin@example.com");
        assert!(list_people(&store, &admin, &FilterCriteria::new()).is_empty());
        assert!(list_donations(&store, &FilterCriteria::new()).is_empty());
    }

    #[test]
    fn test_donation_lifecycle() {
        let store = MemoryStore::new();
        let donation = Donation::new("Ali", 120.0, "2024-04-02", DonationPurpose::SchoolEquipment, "Omar");
        let saved = add_donation(&store, donation).unwrap();

        let mut edited = saved.clone();
        edited.usage_status = "spent".to_string();
        update_donation(&store, edited).unwrap();

        let by_purpose = FilterCriteria::new().with_category("purpose", "school_equipment");
        assert_eq!(list_donations(&store, &by_purpose)[0].usage_status, "spent");

        delete_donation(&store, &saved.id).unwrap();
        assert!(list_donations(&store, &FilterCriteria::new()).is_empty());
    }

    #[test]
    fn test_duplicate_representative_email_rejected() {
        let store = MemoryStore::new();
        let admin = Actor::admin("admin@example.com");
        add_representative(&store, &admin, create_test_representative("rep@example.com")).unwrap();

        let result = add_representative(&store, &admin, create_test_representative("REP@example.com"));
        match result {
            Err(RegistryError::Validation { field, .. }) => assert_eq!(field, "email"),
            other => panic!("expected validation fault, got {:?}", other),
        }
    }

    #[test]
    fn test_only_admin_manages_representatives() {
        let store = MemoryStore::new();
        let rep = Actor::representative("rep@example.com", "بكاي", "انشاشبة");
        let result = add_representative(&store, &rep, create_test_representative("x@example.com"));
        assert!(matches!(result, Err(RegistryError::Access(_))));
    }

    #[test]
    fn test_find_representative_by_credentials() {
        let store = MemoryStore::new();
        let admin = Actor::admin("admin@example.com");
        let rep = add_representative(&store, &admin, create_test_representative("rep@example.com")).unwrap();

        let found = find_representative(&store, "rep@example.com", "secret").unwrap();
        assert_eq!(found.id, rep.id);
        assert!(find_representative(&store, "rep@example.com", "wrong").is_none());

        delete_representative(&store, &admin, &rep.id).unwrap();
        assert!(find_representative(&store, "rep@example.com", "secret").is_none());
    }
}

// 🎲 Random Data Generator - synthetic population records
// Tribes are assigned round-robin so `generate(8 * k)` gives k per tribe.
// Saving replaces the whole population collection.

use chrono::{Datelike, NaiveDate, Utc};
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{
    FAMILY_NAMES, FEMALE_FIRST_NAMES, MALE_FIRST_NAMES, PHONE_PREFIXES, RESIDENTIAL_AREAS,
    STUDY_PLACES, TRIBES, WORK_PLACES,
};
use crate::error::Result;
use crate::records::{EmploymentStatus, PersonRecord, TraditionalInstitution};
use crate::store::{self, RecordStore};

/// Above this many records a caller must confirm before generating
pub const LARGE_GENERATION_THRESHOLD: usize = 1000;

pub const MIN_AGE: u8 = 1;
pub const MAX_GENERATED_AGE: u8 = 80;

const MALE_PROBABILITY: f64 = 0.5;
const RETIRED_PROBABILITY: f64 = 0.7;
const EMPLOYED_PROBABILITY: f64 = 0.6;
const STUDENT_PROBABILITY: f64 = 0.2;
const NO_INSTITUTION_PROBABILITY: f64 = 0.4;
const HAFIZ_PROBABILITY: f64 = 0.3;
const RECITER_PROBABILITY: f64 = 0.4;

const HAFIZ_YEARS_BACK: i32 = 10;
const RECITER_YEARS_BACK: i32 = 5;

pub fn requires_confirmation(count: usize) -> bool {
    count > LARGE_GENERATION_THRESHOLD
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Employment status conditioned on age
pub fn employment_for_age<R: Rng + ?Sized>(rng: &mut R, age: u8) -> EmploymentStatus {
    if age < 18 {
        return EmploymentStatus::Student;
    }
    if age > 60 {
        return if rng.gen_bool(RETIRED_PROBABILITY) {
            EmploymentStatus::Retired
        } else {
            EmploymentStatus::Unemployed
        };
    }

    let roll: f64 = rng.gen();
    if roll < EMPLOYED_PROBABILITY {
        EmploymentStatus::Employed
    } else if roll < EMPLOYED_PROBABILITY + STUDENT_PROBABILITY {
        EmploymentStatus::Student
    } else {
        EmploymentStatus::Unemployed
    }
}

/// A day within the last `years_back` years, formatted `YYYY-MM-DD`
fn completion_date<R: Rng + ?Sized>(rng: &mut R, this_year: i32, years_back: i32) -> Option<String> {
    let year = this_year - rng.gen_range(0..years_back);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn phone_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut phone = pick(rng, &PHONE_PREFIXES).to_string();
    for _ in 0..8 {
        let digit: u8 = rng.gen_range(0..10);
        phone.push(char::from(b'0' + digit));
    }
    phone
}

/// One synthetic record for position `index` in a generation run
pub fn generate_person<R: Rng + ?Sized>(rng: &mut R, index: usize, this_year: i32) -> PersonRecord {
    let tribe = TRIBES[index % TRIBES.len()];
    let family = if index % TRIBES.len() == 0 {
        FAMILY_NAMES[index % FAMILY_NAMES.len()].to_string()
    } else {
        format!("{} {}", tribe, rng.gen_range(0..100))
    };

    let first_names: &[&str] = if rng.gen_bool(MALE_PROBABILITY) {
        &MALE_FIRST_NAMES
    } else {
        &FEMALE_FIRST_NAMES
    };
    let first_name = pick(rng, first_names);

    let age = rng.gen_range(MIN_AGE..=MAX_GENERATED_AGE);
    let mut person = PersonRecord::new(first_name, &family, tribe, &age.to_string());
    person.father_name = pick(rng, &MALE_FIRST_NAMES).to_string();
    person.mother_name = pick(rng, &FEMALE_FIRST_NAMES).to_string();
    person.residential_area = pick(rng, &RESIDENTIAL_AREAS).to_string();

    person.employment_status = employment_for_age(rng, age);
    person.place_details = match person.employment_status {
        EmploymentStatus::Student => pick(rng, &STUDY_PLACES).to_string(),
        EmploymentStatus::Employed => pick(rng, &WORK_PLACES).to_string(),
        EmploymentStatus::Unemployed | EmploymentStatus::Retired => String::new(),
    };

    if !rng.gen_bool(NO_INSTITUTION_PROBABILITY) {
        person.traditional_institution = TraditionalInstitution::ALL.choose(rng).copied();

        if rng.gen_bool(HAFIZ_PROBABILITY) {
            person.is_hafiz = true;
            person.hafiz_date = completion_date(rng, this_year, HAFIZ_YEARS_BACK);
        } else if rng.gen_bool(RECITER_PROBABILITY) {
            person.is_reciter = true;
            person.reciter_date = completion_date(rng, this_year, RECITER_YEARS_BACK);
        }
    }

    person.contact = phone_number(rng);
    person
}

/// Generate `count` records from the given random source
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<PersonRecord> {
    let this_year = Utc::now().year();
    (0..count).map(|i| generate_person(rng, i, this_year)).collect()
}

pub fn generate(count: usize) -> Vec<PersonRecord> {
    generate_with(&mut rand::thread_rng(), count)
}

/// Generate and overwrite the population collection
pub fn generate_and_save<R: Rng + ?Sized>(
    store: &dyn RecordStore,
    rng: &mut R,
    count: usize,
) -> Result<Vec<PersonRecord>> {
    let records = generate_with(rng, count);
    store::save(store, store::POPULATION, &records)?;
    info!("🎲 Generated {} population record(s)", records.len());
    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DISTINGUISHED_TRIBE;
    use crate::store::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn create_test_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_tribes_are_round_robin() {
        let records = generate_with(&mut create_test_rng(), 8 * 5);

        let mut per_tribe: HashMap<&str, usize> = HashMap::new();
        for r in &records {
            *per_tribe.entry(r.tribe_name.as_str()).or_default() += 1;
        }
        assert_eq!(per_tribe.len(), 8);
        assert!(per_tribe.values().all(|&n| n == 5));
    }

    #[test]
    fn test_distinguished_tribe_uses_family_catalog() {
        let records = generate_with(&mut create_test_rng(), 80);

        for (i, r) in records.iter().enumerate() {
            if r.tribe_name == DISTINGUISHED_TRIBE {
                assert_eq!(r.family_name, FAMILY_NAMES[i % FAMILY_NAMES.len()]);
            } else {
                assert!(r.family_name.starts_with(&r.tribe_name));
            }
        }
    }

    #[test]
    fn test_ages_and_employment_rules() {
        let records = generate_with(&mut create_test_rng(), 500);

        for r in &records {
            let age = r.parsed_age().unwrap();
            assert!((MIN_AGE..=MAX_GENERATED_AGE).contains(&age));
            if age < 18 {
                assert_eq!(r.employment_status, EmploymentStatus::Student);
            }
            if age > 60 {
                assert!(matches!(
                    r.employment_status,
                    EmploymentStatus::Retired | EmploymentStatus::Unemployed
                ));
            }
            if r.employment_status.has_place() {
                assert!(!r.place_details.is_empty());
            }
            assert!(r.validate().is_ok());
        }
    }

    #[test]
    fn test_hafiz_and_reciter_are_exclusive() {
        let this_year = Utc::now().year();
        let records = generate_with(&mut create_test_rng(), 500);

        for r in &records {
            assert!(!(r.is_hafiz && r.is_reciter));
            if r.is_hafiz || r.is_reciter {
                assert!(r.traditional_institution.is_some());
            }
            if let Some(date) = &r.hafiz_date {
                let year: i32 = date[..4].parse().unwrap();
                assert!(year > this_year - HAFIZ_YEARS_BACK && year <= this_year);
            }
            if let Some(date) = &r.reciter_date {
                let year: i32 = date[..4].parse().unwrap();
                assert!(year > this_year - RECITER_YEARS_BACK && year <= this_year);
            }
        }
        assert!(records.iter().any(|r| r.is_hafiz));
        assert!(records.iter().any(|r| r.traditional_institution.is_none()));
    }

    #[test]
    fn test_first_names_come_from_both_lists() {
        let records = generate_with(&mut create_test_rng(), 400);

        let male = records
            .iter()
            .filter(|r| MALE_FIRST_NAMES.contains(&r.first_name.as_str()))
            .count();
        let female = records
            .iter()
            .filter(|r| FEMALE_FIRST_NAMES.contains(&r.first_name.as_str()))
            .count();

        assert_eq!(male + female, records.len());
        assert!(male > 100);
        assert!(female > 100);
    }

    fn share(hits: usize, total: usize) -> f64 {
        hits as f64 / total as f64
    }

    fn assert_near(actual: f64, expected: f64, what: &str) {
        assert!(
            (actual - expected).abs() < 0.03,
            "{}: expected about {}, got {:.3}",
            what,
            expected,
            actual
        );
    }

    #[test]
    fn test_generated_distribution_matches_probabilities() {
        let records = generate_with(&mut StdRng::seed_from_u64(2024), 20_000);

        let seniors: Vec<&PersonRecord> = records
            .iter()
            .filter(|r| r.parsed_age().map_or(false, |a| a > 60))
            .collect();
        let retired = seniors
            .iter()
            .filter(|r| r.employment_status == EmploymentStatus::Retired)
            .count();
        assert_near(share(retired, seniors.len()), RETIRED_PROBABILITY, "retired over 60");

        let adults: Vec<&PersonRecord> = records
            .iter()
            .filter(|r| r.parsed_age().map_or(false, |a| (18..=60).contains(&a)))
            .collect();
        let count_status = |status: EmploymentStatus| adults.iter().filter(|r| r.employment_status == status).count();
        assert_near(share(count_status(EmploymentStatus::Employed), adults.len()), 0.6, "employed adults");
        assert_near(share(count_status(EmploymentStatus::Student), adults.len()), 0.2, "student adults");
        assert_near(share(count_status(EmploymentStatus::Unemployed), adults.len()), 0.2, "unemployed adults");

        let without_institution = records.iter().filter(|r| r.traditional_institution.is_none()).count();
        assert_near(
            share(without_institution, records.len()),
            NO_INSTITUTION_PROBABILITY,
            "no institution",
        );

        let enrolled: Vec<&PersonRecord> = records
            .iter()
            .filter(|r| r.traditional_institution.is_some())
            .collect();
        let hafiz = enrolled.iter().filter(|r| r.is_hafiz).count();
        let reciter = enrolled.iter().filter(|r| r.is_reciter).count();
        assert_near(share(hafiz, enrolled.len()), HAFIZ_PROBABILITY, "hafiz");
        // Reciter is only drawn for the non-hafiz share
        assert_near(
            share(reciter, enrolled.len()),
            (1.0 - HAFIZ_PROBABILITY) * RECITER_PROBABILITY,
            "reciter",
        );
    }

    #[test]
    fn test_same_seed_same_records() {
        let a = generate_with(&mut StdRng::seed_from_u64(7), 20);
        let b = generate_with(&mut StdRng::seed_from_u64(7), 20);
        let ages_a: Vec<&str> = a.iter().map(|r| r.age.as_str()).collect();
        let ages_b: Vec<&str> = b.iter().map(|r| r.age.as_str()).collect();
        assert_eq!(ages_a, ages_b);
    }

    #[test]
    fn test_phone_contact_shape() {
        let records = generate_with(&mut create_test_rng(), 30);
        for r in &records {
            assert_eq!(r.contact.len(), 10);
            assert!(PHONE_PREFIXES.iter().any(|p| r.contact.starts_with(p)));
            assert!(r.contact.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_and_save_replaces_collection() {
        let store = MemoryStore::new();
        generate_and_save(&store, &mut create_test_rng(), 16).unwrap();
        generate_and_save(&store, &mut create_test_rng(), 8).unwrap();

        let saved: Vec<PersonRecord> = store::load(&store, store::POPULATION).unwrap();
        assert_eq!(saved.len(), 8);
    }

    #[test]
    fn test_large_runs_need_confirmation() {
        assert!(!requires_confirmation(1000));
        assert!(requires_confirmation(1001));
    }
}

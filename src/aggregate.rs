// 📊 Aggregation Engine - grouped counts, percentage shares, top-N rankings
//
// bucketize → with_percentages / top_n, plus the population and donation
// reports built from them.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::access::Actor;
use crate::filter::{apply_filters, FilterCriteria};
use crate::records::{Donation, DonationPurpose, EmploymentStatus, PersonRecord, TraditionalInstitution};

/// Residential areas listed in the population report
pub const TOP_AREAS: usize = 10;

// ============================================================================
// BUCKETS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

impl Bucket {
    pub fn new(label: &str, count: usize) -> Self {
        Bucket {
            label: label.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketShare {
    pub label: String,
    pub count: usize,
    /// count / total * 100; 0 when the total is 0
    pub percentage: f64,
}

/// Group records under the label `bucket_fn` returns, in first-encountered
/// order. Records mapped to None are left out of every bucket.
pub fn bucketize<T, F>(records: &[T], bucket_fn: F) -> Vec<Bucket>
where
    F: Fn(&T) -> Option<String>,
{
    bucketize_seeded(&[], records, bucket_fn)
}

/// Like `bucketize`, but `seed_labels` come first in the given order and are
/// reported even with a zero count
pub fn bucketize_seeded<T, F>(seed_labels: &[&str], records: &[T], bucket_fn: F) -> Vec<Bucket>
where
    F: Fn(&T) -> Option<String>,
{
    let mut buckets: Vec<Bucket> = seed_labels.iter().map(|label| Bucket::new(label, 0)).collect();

    for record in records {
        let Some(label) = bucket_fn(record) else {
            continue;
        };
        match buckets.iter_mut().find(|b| b.label == label) {
            Some(bucket) => bucket.count += 1,
            None => buckets.push(Bucket { label, count: 1 }),
        }
    }

    buckets
}

pub fn total(buckets: &[Bucket]) -> usize {
    buckets.iter().map(|b| b.count).sum()
}

pub fn with_percentages(buckets: &[Bucket]) -> Vec<BucketShare> {
    let total = total(buckets);
    buckets
        .iter()
        .map(|b| BucketShare {
            label: b.label.clone(),
            count: b.count,
            percentage: if total == 0 {
                0.0
            } else {
                b.count as f64 / total as f64 * 100.0
            },
        })
        .collect()
}

/// Highest counts first; ties keep their original order
pub fn top_n(buckets: &[Bucket], n: usize) -> Vec<Bucket> {
    let mut sorted = buckets.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.truncate(n);
    sorted
}

// ============================================================================
// AGE BANDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    UpTo18,
    From19To30,
    From31To45,
    From46To60,
    Over60,
}

impl AgeBand {
    pub const ALL: [AgeBand; 5] = [
        AgeBand::UpTo18,
        AgeBand::From19To30,
        AgeBand::From31To45,
        AgeBand::From46To60,
        AgeBand::Over60,
    ];

    /// Upper bounds are inclusive
    pub fn from_age(age: u8) -> Self {
        match age {
            0..=18 => AgeBand::UpTo18,
            19..=30 => AgeBand::From19To30,
            31..=45 => AgeBand::From31To45,
            46..=60 => AgeBand::From46To60,
            _ => AgeBand::Over60,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::UpTo18 => "0-18",
            AgeBand::From19To30 => "19-30",
            AgeBand::From31To45 => "31-45",
            AgeBand::From46To60 => "46-60",
            AgeBand::Over60 => "60+",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|b| b.label()).collect()
    }
}

/// Band of a record, or None when its age is unclassifiable
pub fn age_band(person: &PersonRecord) -> Option<AgeBand> {
    match person.parsed_age() {
        Some(age) => Some(AgeBand::from_age(age)),
        None => {
            debug!("Skipping record {} with unclassifiable age '{}'", person.id, person.age);
            None
        }
    }
}

pub fn age_distribution(records: &[PersonRecord]) -> Vec<Bucket> {
    bucketize_seeded(&AgeBand::labels(), records, |p| {
        age_band(p).map(|band| band.label().to_string())
    })
}

pub fn employment_distribution(records: &[PersonRecord]) -> Vec<Bucket> {
    let labels: Vec<&str> = EmploymentStatus::ALL.iter().map(|s| s.label()).collect();
    bucketize_seeded(&labels, records, |p| Some(p.employment_status.label().to_string()))
}

pub fn tribe_distribution(records: &[PersonRecord]) -> Vec<Bucket> {
    bucketize(records, |p| Some(p.tribe_name.clone()))
}

/// Records without an area are left out
pub fn area_distribution(records: &[PersonRecord]) -> Vec<Bucket> {
    bucketize(records, |p| {
        let area = p.residential_area.trim();
        (!area.is_empty()).then(|| area.to_string())
    })
}

pub fn institution_distribution(records: &[PersonRecord]) -> Vec<Bucket> {
    bucketize_seeded(&[TraditionalInstitution::NONE_LABEL], records, |p| {
        Some(TraditionalInstitution::label_of(p.traditional_institution).to_string())
    })
}

/// Mean of the classifiable ages, rounded
pub fn average_age(records: &[PersonRecord]) -> Option<u32> {
    let ages: Vec<u32> = records
        .iter()
        .filter_map(|p| p.parsed_age())
        .map(u32::from)
        .collect();
    if ages.is_empty() {
        return None;
    }
    let sum: u32 = ages.iter().sum();
    Some((sum as f64 / ages.len() as f64).round() as u32)
}

// ============================================================================
// POPULATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationReport {
    pub total_records: usize,
    pub average_age: Option<u32>,
    pub age_distribution: Vec<BucketShare>,
    /// Administrators only
    pub tribe_distribution: Option<Vec<BucketShare>>,
    pub employment: Vec<BucketShare>,
    pub top_areas: Vec<Bucket>,
    pub institutions: Vec<BucketShare>,
    pub hafiz_count: usize,
    pub reciter_count: usize,
}

impl PopulationReport {
    /// Build the dashboard summary over the records `actor` may see
    pub fn build(records: &[PersonRecord], actor: &Actor) -> Self {
        let criteria = FilterCriteria::new().with_owner_scope(actor.population_scope());
        let visible = apply_filters(records, &criteria);

        PopulationReport {
            total_records: visible.len(),
            average_age: average_age(&visible),
            age_distribution: with_percentages(&age_distribution(&visible)),
            tribe_distribution: actor
                .is_admin()
                .then(|| with_percentages(&tribe_distribution(&visible))),
            employment: with_percentages(&employment_distribution(&visible)),
            top_areas: top_n(&area_distribution(&visible), TOP_AREAS),
            institutions: with_percentages(&institution_distribution(&visible)),
            hafiz_count: visible.iter().filter(|p| p.is_hafiz).count(),
            reciter_count: visible.iter().filter(|p| p.is_reciter).count(),
        }
    }
}

// ============================================================================
// DONATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeTotal {
    pub purpose: DonationPurpose,
    pub count: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationSummary {
    pub count: usize,
    pub total_amount: f64,
    pub by_purpose: Vec<PurposeTotal>,
}

impl DonationSummary {
    pub fn build(donations: &[Donation]) -> Self {
        let by_purpose = DonationPurpose::ALL
            .iter()
            .map(|purpose| {
                let matching: Vec<&Donation> = donations.iter().filter(|d| d.purpose == *purpose).collect();
                PurposeTotal {
                    purpose: *purpose,
                    count: matching.len(),
                    amount: matching.iter().map(|d| d.amount).sum(),
                }
            })
            .collect();

        DonationSummary {
            count: donations.len(),
            total_amount: donations.iter().map(|d| d.amount).sum(),
            by_purpose,
        }
    }
}

/// Donations matched by donor name or contact, with their total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorLookup {
    pub matches: Vec<Donation>,
    pub total_donated: f64,
}

impl DonorLookup {
    /// Blank terms find nothing
    pub fn search(donations: &[Donation], term: &str) -> Self {
        let term = term.trim().to_lowercase();
        let matches: Vec<Donation> = if term.is_empty() {
            Vec::new()
        } else {
            donations
                .iter()
                .filter(|d| {
                    d.donor_name.to_lowercase().contains(&term)
                        || d
                            .donor_contact
                            .as_deref()
                            .map_or(false, |c| c.to_lowercase().contains(&term))
                })
                .cloned()
                .collect()
        };

        DonorLookup {
            total_donated: matches.iter().map(|d| d.amount).sum(),
            matches,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_person(age: &str, family: &str) -> PersonRecord {
        let mut p = PersonRecord::new("a", family, "انشاشبة", age);
        p.residential_area = "حي باسة".to_string();
        p
    }

    fn count_of(buckets: &[Bucket], label: &str) -> usize {
        buckets.iter().find(|b| b.label == label).map_or(0, |b| b.count)
    }

    #[test]
    fn test_age_band_boundaries() {
        let records = vec![
            create_test_person("17", "x"),
            create_test_person("18", "x"),
            create_test_person("19", "x"),
            create_test_person("60", "x"),
            create_test_person("61", "x"),
        ];
        let buckets = age_distribution(&records);

        assert_eq!(count_of(&buckets, "0-18"), 2);
        assert_eq!(count_of(&buckets, "19-30"), 1);
        assert_eq!(count_of(&buckets, "46-60"), 1);
        assert_eq!(count_of(&buckets, "60+"), 1);
    }

    #[test]
    fn test_unparseable_age_is_excluded() {
        let records = vec![
            create_test_person("abc", "x"),
            create_test_person("30", "x"),
            create_test_person("999", "x"),
        ];
        let buckets = age_distribution(&records);

        assert_eq!(total(&buckets), 1);
        assert!(total(&buckets) < records.len());
        assert_eq!(average_age(&records), Some(30));
    }

    #[test]
    fn test_seeded_labels_keep_order_and_zeros() {
        let buckets = age_distribution(&[create_test_person("70", "x")]);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["0-18", "19-30", "31-45", "46-60", "60+"]);
        assert_eq!(buckets[0].count, 0);
    }

    #[test]
    fn test_institution_has_explicit_none_bucket() {
        let mut a = create_test_person("20", "x");
        a.traditional_institution = Some(TraditionalInstitution::Taqdima);
        let b = create_test_person("20", "x");
        let buckets = institution_distribution(&[a, b]);

        assert_eq!(buckets[0], Bucket::new("لا يوجد", 1));
        assert_eq!(count_of(&buckets, "مدرسة تقديمة"), 1);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let buckets = vec![Bucket::new("a", 1), Bucket::new("b", 2), Bucket::new("c", 4)];
        let shares = with_percentages(&buckets);
        let sum: f64 = shares.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((shares[2].percentage - 400.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentages_zero_total_is_zero_not_nan() {
        let buckets = vec![Bucket::new("a", 0), Bucket::new("b", 0)];
        let shares = with_percentages(&buckets);
        assert!(shares.iter().all(|s| s.percentage == 0.0));
        assert!(with_percentages(&[]).is_empty());
    }

    #[test]
    fn test_top_n_is_stable_and_truncated() {
        let buckets = vec![
            Bucket::new("a", 2),
            Bucket::new("b", 5),
            Bucket::new("c", 2),
            Bucket::new("d", 5),
            Bucket::new("e", 1),
        ];
        let top = top_n(&buckets, 3);
        let labels: Vec<&str> = top.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "d", "a"]);
        assert!(top_n(&buckets, 0).is_empty());
        assert_eq!(top_n(&buckets, 10).len(), 5);
    }

    #[test]
    fn test_report_scopes_representative_and_hides_tribes() {
        let records = vec![
            create_test_person("10", "بكاي"),
            create_test_person("40", "بكاي"),
            create_test_person("70", "دبوز"),
        ];
        let rep = Actor::representative("rep@example.com", "بكاي", "انشاشبة");
        let report = PopulationReport::build(&records, &rep);

        assert_eq!(report.total_records, 2);
        assert!(report.tribe_distribution.is_none());
        assert_eq!(report.average_age, Some(25));

        let admin = PopulationReport::build(&records, &Actor::admin("admin@example.com"));
        assert_eq!(admin.total_records, 3);
        let tribes = admin.tribe_distribution.unwrap();
        assert_eq!(tribes.len(), 1);
        assert_eq!(tribes[0].percentage, 100.0);
    }

    #[test]
    fn test_area_ranking_skips_empty_areas() {
        let mut a = create_test_person("20", "x");
        a.residential_area = String::new();
        let records = vec![a, create_test_person("20", "x")];
        let areas = area_distribution(&records);
        assert_eq!(areas, vec![Bucket::new("حي باسة", 1)]);
    }

    #[test]
    fn test_donation_summary_and_donor_lookup() {
        let mut first = Donation::new("Ahmed Salah", 100.0, "2024-01-01", DonationPurpose::MosqueRenovation, "Omar");
        first.donor_contact = Some("0661000000".to_string());
        let second = Donation::new("ahmed salah", 50.5, "2024-02-01", DonationPurpose::Other, "Omar");
        let third = Donation::new("Karim", 10.0, "2024-03-01", DonationPurpose::Other, "Omar");
        let donations = vec![first, second, third];

        let summary = DonationSummary::build(&donations);
        assert_eq!(summary.count, 3);
        assert!((summary.total_amount - 160.5).abs() < 1e-9);
        let other = summary.by_purpose.iter().find(|p| p.purpose == DonationPurpose::Other).unwrap();
        assert_eq!(other.count, 2);

        let lookup = DonorLookup::search(&donations, "AHMED");
        assert_eq!(lookup.matches.len(), 2);
        assert!((lookup.total_donated - 150.5).abs() < 1e-9);

        assert_eq!(DonorLookup::search(&donations, "0661").matches.len(), 1);
        assert!(DonorLookup::search(&donations, "  ").matches.is_empty());
    }
}

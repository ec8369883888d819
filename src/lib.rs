// Community Registry - Core Library
// Population, donation and project records with filtering, aggregation and
// spreadsheet merge/export. Used by the CLI and by tests.

pub mod error;
pub mod catalog;
pub mod records;
pub mod store;
pub mod access;
pub mod filter;     // Scope / category / date / search predicates
pub mod aggregate;  // Bucket counts, percentages, top-N, reports
pub mod merge;      // Spreadsheet upload screening + merge
pub mod generator;  // Synthetic population data
pub mod registry;   // Person / donation / representative bookkeeping
pub mod projects;   // Projects, members, workshops
pub mod export;     // Population xlsx / CSV export
pub mod config;

// Re-export commonly used types
pub use error::{RegistryError, Result};
pub use records::{
    Donation, DonationPurpose, EmploymentStatus, FamilyRepresentative,
    MemberRole, PersonRecord, Project, ProjectMember, ProjectStatus,
    TraditionalInstitution, UserPreferences, Workshop,
};
pub use store::{MemoryStore, Record, RecordStore, SqliteStore};
pub use access::Actor;
pub use filter::{apply_filters, DateRange, FilterCriteria, Filterable};
pub use aggregate::{
    Bucket, BucketShare, AgeBand, PopulationReport, DonationSummary, DonorLookup,
    bucketize, with_percentages, top_n,
};
pub use merge::{merge, merge_uploads, screen_uploads, Cell, MergeOutput, Upload};
pub use generator::{generate, generate_and_save, generate_with, requires_confirmation};
pub use export::{export_population_csv, export_population_xlsx};
pub use config::{Config, Verbosity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

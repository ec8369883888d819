use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use community_registry::aggregate::{BucketShare, DonationSummary, DonorLookup, PopulationReport};
use community_registry::config::{init_logging, Config, Verbosity};
use community_registry::export::{export_file_name, export_population_csv, export_population_xlsx};
use community_registry::filter::{DateRange, FilterCriteria};
use community_registry::generator::{self, requires_confirmation, LARGE_GENERATION_THRESHOLD};
use community_registry::merge::{merge_uploads, screen_uploads, Upload};
use community_registry::records::{parse_day, PersonRecord};
use community_registry::store::{self, RecordStore, SqliteStore};
use community_registry::{projects, registry, Actor, RegistryError};

#[derive(Parser, Debug)]
#[command(name = "community-registry", version, about = "Community population, donation and project registry")]
struct Cli {
    /// SQLite file holding the record collections
    #[arg(long, global = true, env = "REGISTRY_DB", default_value = "registry.db")]
    db: PathBuf,

    /// Directory for exported and merged files
    #[arg(long, global = true, env = "REGISTRY_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Act as the representative of this family (requires --as-tribe)
    #[arg(long, global = true, requires = "as_tribe")]
    as_family: Option<String>,

    /// Tribe of the representative given by --as-family
    #[arg(long, global = true, requires = "as_family")]
    as_tribe: Option<String>,

    /// Act as the stored representative with this email (requires --password)
    #[arg(long, global = true, requires = "password", conflicts_with = "as_family")]
    login: Option<String>,

    /// Password of the representative given by --login
    #[arg(long, global = true, env = "REGISTRY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the population with synthetic records
    Generate {
        #[arg(default_value_t = 100)]
        count: usize,
        /// Confirm runs above the large-generation threshold
        #[arg(long)]
        yes: bool,
    },
    /// Population dashboard summary
    Stats,
    /// List population records
    People(PeopleArgs),
    /// List donations with per-purpose totals
    Donations(DonationArgs),
    /// Look up a donor by name or contact
    Donor { term: String },
    /// List projects
    Projects {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a project with its members and workshops
    DeleteProject { id: String },
    /// Merge spreadsheets into one workbook
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output file name
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Forget the saved dashboard preferences of the current account
    ResetPreferences,
    /// Export the visible population
    Export {
        /// Base file name, without extension
        #[arg(long, default_value = "population_data")]
        name: String,
        /// Write CSV instead of xlsx
        #[arg(long)]
        csv: bool,
    },
}

#[derive(Args, Debug)]
struct PeopleArgs {
    #[arg(long)]
    tribe: Option<String>,
    #[arg(long)]
    family: Option<String>,
    #[arg(long)]
    area: Option<String>,
    /// student | employed | unemployed | retired
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    institution: Option<String>,
    #[arg(long)]
    search: Option<String>,
    /// Print records as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DonationArgs {
    #[arg(long)]
    purpose: Option<String>,
    /// First day, YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,
    /// Last day, YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,
    #[arg(long)]
    search: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let mut config = Config::new()
        .with_db_path(cli.db.clone())
        .with_output_dir(cli.output_dir.clone())
        .with_verbosity(verbosity);
    if let (Some(family), Some(tribe)) = (&cli.as_family, &cli.as_tribe) {
        config = config.with_representative(family, tribe);
    }
    init_logging(config.verbosity);

    let login = cli.login.clone().zip(cli.password.clone());
    if let Err(e) = run(cli.command, login, config) {
        match e.downcast_ref::<RegistryError>() {
            Some(fault) => eprintln!("❌ {}: {}", fault.title(), fault),
            None => eprintln!("❌ {:#}", e),
        }
        std::process::exit(1);
    }
}

/// Swap in the stored representative matching `--login`/`--password`
fn resolve_login(store: &dyn RecordStore, config: Config, login: Option<(String, String)>) -> Result<Config> {
    match login {
        Some((email, password)) => {
            let rep = registry::find_representative(store, &email, &password)
                .with_context(|| format!("No representative matches {} with that password", email))?;
            println!("👤 Acting as {} ({} / {})", rep.name, rep.family_name, rep.tribe_name);
            Ok(config.with_actor(Actor::from_representative(&rep)))
        }
        None => Ok(config),
    }
}

fn run(command: Command, login: Option<(String, String)>, config: Config) -> Result<()> {
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open store at {}", config.db_path.display()))?;
    let config = resolve_login(&store, config, login)?;
    let config = &config;

    store::record_visit_or_warn(&store, config.actor.email(), "overview");

    match command {
        Command::Generate { count, yes } => run_generate(&store, count, yes),
        Command::Stats => run_stats(&store, config),
        Command::People(args) => run_people(&store, config, &args),
        Command::Donations(args) => run_donations(&store, &args),
        Command::Donor { term } => run_donor(&store, &term),
        Command::Projects { status, search } => run_projects(&store, config, status, search),
        Command::DeleteProject { id } => {
            let removed = projects::delete_project(&store, &config.actor, &id)?;
            println!(
                "✓ Deleted '{}' with {} member(s) and {} workshop(s)",
                removed.title,
                removed.members.len(),
                removed.workshops.len()
            );
            Ok(())
        }
        Command::Merge { files, output } => run_merge(config, &files, output.as_deref()),
        Command::ResetPreferences => {
            store::clear_preferences(&store, config.actor.email())?;
            println!("✓ Preferences cleared for {}", config.actor.email());
            Ok(())
        }
        Command::Export { name, csv } => run_export(&store, config, &name, csv),
    }
}

fn run_generate(store: &dyn RecordStore, count: usize, confirmed: bool) -> Result<()> {
    if requires_confirmation(count) && !confirmed {
        bail!(
            "Generating {} records (more than {}) replaces the population; pass --yes to confirm",
            count,
            LARGE_GENERATION_THRESHOLD
        );
    }

    println!("🎲 Generating {} records...", count);
    let records = generator::generate_and_save(store, &mut rand::thread_rng(), count)?;
    println!("✓ Population replaced with {} records", records.len());
    Ok(())
}

fn print_shares(title: &str, shares: &[BucketShare]) {
    println!("\n{}", title);
    for share in shares {
        println!("  {:<30} {:>6}  {:>5.1}%", share.label, share.count, share.percentage);
    }
}

fn run_stats(store: &dyn RecordStore, config: &Config) -> Result<()> {
    let people: Vec<PersonRecord> = store::load_or_empty(store, store::POPULATION);
    let report = PopulationReport::build(&people, &config.actor);

    println!("📊 Population Overview");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total records: {}", report.total_records);
    match report.average_age {
        Some(age) => println!("Average age:   {}", age),
        None => println!("Average age:   -"),
    }
    println!("Hafiz:         {}", report.hafiz_count);
    println!("Reciters:      {}", report.reciter_count);

    print_shares("Age bands", &report.age_distribution);
    if let Some(tribes) = &report.tribe_distribution {
        print_shares("Tribes", tribes);
    }
    print_shares("Employment", &report.employment);
    print_shares("Institutions", &report.institutions);

    println!("\nTop residential areas");
    for bucket in &report.top_areas {
        println!("  {:<30} {:>6}", bucket.label, bucket.count);
    }
    Ok(())
}

fn run_people(store: &dyn RecordStore, config: &Config, args: &PeopleArgs) -> Result<()> {
    let mut criteria = FilterCriteria::new();
    let categories = [
        ("tribeName", &args.tribe),
        ("familyName", &args.family),
        ("residentialArea", &args.area),
        ("employmentStatus", &args.status),
        ("traditionalInstitution", &args.institution),
    ];
    for (field, value) in categories {
        if let Some(value) = value {
            criteria = criteria.with_category(field, value);
        }
    }
    if let Some(term) = &args.search {
        criteria = criteria.with_search(term);
    }

    let people = registry::list_people(store, &config.actor, &criteria);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&people)?);
        return Ok(());
    }

    for p in &people {
        println!(
            "{:<28} {} {} ({}) | {} | {} | {}",
            p.id,
            p.first_name,
            p.family_name,
            p.tribe_name,
            p.age,
            p.employment_status.label(),
            p.residential_area
        );
    }
    println!("\n{} record(s)", people.len());
    Ok(())
}

fn parse_day_arg(flag: &str, raw: &Option<String>) -> Result<Option<NaiveDate>> {
    match raw {
        Some(text) => parse_day(text)
            .map(Some)
            .with_context(|| format!("--{} expects YYYY-MM-DD, got '{}'", flag, text)),
        None => Ok(None),
    }
}

fn run_donations(store: &dyn RecordStore, args: &DonationArgs) -> Result<()> {
    let mut criteria = FilterCriteria::new()
        .with_date_range(DateRange::new(parse_day_arg("from", &args.from)?, parse_day_arg("to", &args.to)?));
    if let Some(purpose) = &args.purpose {
        criteria = criteria.with_category("purpose", purpose);
    }
    if let Some(term) = &args.search {
        criteria = criteria.with_search(term);
    }

    let donations = registry::list_donations(store, &criteria);
    for d in &donations {
        println!(
            "{} | {:<24} | {:>10.2} | {} | {}",
            d.date,
            d.donor_name,
            d.amount,
            d.purpose.label(),
            d.verified_by
        );
    }

    let summary = DonationSummary::build(&donations);
    println!("\n💰 {} donation(s), total {:.2}", summary.count, summary.total_amount);
    for line in summary.by_purpose.iter().filter(|p| p.count > 0) {
        println!("  {:<20} {:>4}  {:>10.2}", line.purpose.label(), line.count, line.amount);
    }
    Ok(())
}

fn run_donor(store: &dyn RecordStore, term: &str) -> Result<()> {
    let donations = registry::list_donations(store, &FilterCriteria::new());
    let lookup = DonorLookup::search(&donations, term);

    if lookup.matches.is_empty() {
        println!("No donations found for '{}'", term);
        return Ok(());
    }
    for d in &lookup.matches {
        println!("{} | {} | {:.2} | {}", d.date, d.donor_name, d.amount, d.purpose.label());
    }
    println!("\nTotal donated: {:.2}", lookup.total_donated);
    Ok(())
}

fn run_projects(store: &dyn RecordStore, config: &Config, status: Option<String>, search: Option<String>) -> Result<()> {
    let mut criteria = FilterCriteria::new();
    if let Some(status) = &status {
        criteria = criteria.with_category("status", status);
    }
    if let Some(term) = &search {
        criteria = criteria.with_search(term);
    }

    let projects = projects::list_projects(store, &config.actor, &criteria);
    for p in &projects {
        println!(
            "{:<28} {} [{}] {} | {} member(s), {} workshop(s)",
            p.id,
            p.title,
            p.status.label(),
            p.tribe,
            p.members.len(),
            p.workshops.len()
        );
    }
    println!("\n{} project(s)", projects.len());
    Ok(())
}

fn run_merge(config: &Config, files: &[PathBuf], output: Option<&str>) -> Result<()> {
    let uploads = files
        .iter()
        .map(|path| Upload::from_path(path))
        .collect::<Result<Vec<_>>>()?;

    let screening = screen_uploads(uploads);
    if let Some(fault) = screening.fault() {
        eprintln!("⚠️  {}", fault);
        for name in &screening.rejected {
            eprintln!("   skipped {}", name);
        }
    }
    if screening.accepted.is_empty() {
        bail!("No spreadsheet files to merge");
    }

    println!("📑 Merging {} file(s)...", screening.accepted.len());
    let merged = merge_uploads(&screening.accepted, output)?;

    let path = config.output_path(&merged.file_name);
    fs::write(&path, &merged.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ Wrote {} rows to {}", merged.row_count, path.display());
    Ok(())
}

fn run_export(store: &dyn RecordStore, config: &Config, name: &str, csv: bool) -> Result<()> {
    let people = registry::list_people(store, &config.actor, &FilterCriteria::new());

    let path = if csv {
        let path = config.output_path(&format!("{}.csv", name));
        let file = fs::File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        export_population_csv(&people, file)?;
        path
    } else {
        let path = config.output_path(&export_file_name(name));
        let bytes = export_population_xlsx(&people)?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        path
    };

    println!("📤 Exported {} record(s) to {}", people.len(), path.display());
    Ok(())
}

// 📤 Population export - fixed, human-labeled columns
// One sheet, one row per person, in the column order below.

use anyhow::{Context, Result};
use std::io::Write;

use crate::merge::{text_row, write_rows, Row};
use crate::records::{EmploymentStatus, PersonRecord, TraditionalInstitution};

pub const POPULATION_SHEET_NAME: &str = "بيانات السكان";

pub const NOT_AVAILABLE: &str = "غير متوفر";
pub const UNSPECIFIED: &str = "غير محدد";
pub const YES: &str = "نعم";
pub const NO: &str = "لا";

pub const POPULATION_HEADERS: [&str; 14] = [
    "الاسم الأول",
    "اسم العائلة",
    "اسم العشيرة",
    "اسم الأب",
    "اسم الأم",
    "العمر",
    "الحالة الوظيفية",
    "حي السكن",
    "المؤسسة التقليدية",
    "خاتم (حافظ للقرآن)",
    "مستظهر (حافظ لأجزاء من القرآن)",
    "تاريخ الختم",
    "تاريخ الاستظهار",
    "معلومات الاتصال",
];

fn or_not_available(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

fn optional_or_not_available(value: &Option<String>) -> &str {
    or_not_available(value.as_deref().unwrap_or(""))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        YES
    } else {
        NO
    }
}

/// Composite employment description, e.g. "student at <place>"
pub fn status_description(person: &PersonRecord) -> String {
    let place = if person.place_details.trim().is_empty() {
        UNSPECIFIED
    } else {
        person.place_details.as_str()
    };

    match person.employment_status {
        EmploymentStatus::Student => format!("طالب في {}", place),
        EmploymentStatus::Employed => format!("يعمل في {}", place),
        EmploymentStatus::Retired => "متقاعد".to_string(),
        EmploymentStatus::Unemployed => "غير موظف".to_string(),
    }
}

/// Export cells for one person, in `POPULATION_HEADERS` order
pub fn population_row(person: &PersonRecord) -> Vec<String> {
    vec![
        person.first_name.clone(),
        person.family_name.clone(),
        person.tribe_name.clone(),
        person.father_name.clone(),
        or_not_available(&person.mother_name).to_string(),
        person.age.clone(),
        status_description(person),
        or_not_available(&person.residential_area).to_string(),
        TraditionalInstitution::label_of(person.traditional_institution).to_string(),
        yes_no(person.is_hafiz).to_string(),
        yes_no(person.is_reciter).to_string(),
        optional_or_not_available(&person.hafiz_date).to_string(),
        optional_or_not_available(&person.reciter_date).to_string(),
        or_not_available(&person.contact).to_string(),
    ]
}

fn population_rows(people: &[PersonRecord]) -> Vec<Row> {
    let mut rows = Vec::with_capacity(people.len() + 1);
    rows.push(text_row(&POPULATION_HEADERS));
    for person in people {
        let cells = population_row(person);
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        rows.push(text_row(&cells));
    }
    rows
}

/// Download name for an export base name
pub fn export_file_name(base: &str) -> String {
    format!("{}.xlsx", base)
}

/// Single-sheet xlsx workbook of the given people
pub fn export_population_xlsx(people: &[PersonRecord]) -> Result<Vec<u8>> {
    write_rows(POPULATION_SHEET_NAME, &population_rows(people))
        .context("Failed to write population workbook")
}

/// Same columns as the workbook, as CSV
pub fn export_population_csv<W: Write>(people: &[PersonRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(POPULATION_HEADERS)
        .context("Failed to write CSV header")?;

    for person in people {
        wtr.write_record(population_row(person))
            .with_context(|| format!("Failed to write CSV row for {}", person.id))?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

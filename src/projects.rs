// 🏗️ Projects - student projects, their members and workshops
// Members and workshops live inside their project record, so deleting a
// project removes them with it.

use chrono::NaiveDate;
use log::info;

use crate::access::Actor;
use crate::error::{RegistryError, Result};
use crate::filter::{apply_filters, matches_term, FilterCriteria};
use crate::records::{new_record_id, EmploymentStatus, MemberRole, PersonRecord, Project, ProjectMember, Workshop};
use crate::store::{self, RecordStore};

fn find_project(store: &dyn RecordStore, id: &str) -> Result<Project> {
    store::load_all::<Project>(store)?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| RegistryError::not_found(store::PROJECTS, id))
}

/// Load a project the actor may manage
fn load_for_edit(store: &dyn RecordStore, actor: &Actor, id: &str) -> Result<Project> {
    let project = find_project(store, id)?;
    actor.ensure_project(&project)?;
    Ok(project)
}

// ============================================================================
// PROJECT LIFECYCLE
// ============================================================================

pub fn add_project(store: &dyn RecordStore, actor: &Actor, project: Project) -> Result<Project> {
    project.validate()?;
    actor.ensure_project(&project)?;

    store::insert_record(store, project.clone())?;
    info!("🏗️  Created project {} for {}", project.title, project.tribe);
    Ok(project)
}

/// Replace a project's fields. Members and workshops are taken from the
/// stored record so an edit form cannot drop them.
pub fn update_project(store: &dyn RecordStore, actor: &Actor, mut project: Project) -> Result<()> {
    project.validate()?;
    actor.ensure_project(&project)?;

    let existing = load_for_edit(store, actor, &project.id)?;
    project.members = existing.members;
    project.workshops = existing.workshops;
    project.created_by = existing.created_by;
    project.created_at = existing.created_at;

    store::replace_record(store, project)
}

/// Delete a project together with its members and workshops
pub fn delete_project(store: &dyn RecordStore, actor: &Actor, id: &str) -> Result<Project> {
    load_for_edit(store, actor, id)?;

    let removed: Project = store::remove_record(store, id)?;
    info!(
        "🗑️  Deleted project {} ({} member(s), {} workshop(s))",
        removed.id,
        removed.members.len(),
        removed.workshops.len()
    );
    Ok(removed)
}

/// Projects visible to the actor, narrowed by `criteria`
pub fn list_projects(store: &dyn RecordStore, actor: &Actor, criteria: &FilterCriteria) -> Vec<Project> {
    let projects: Vec<Project> = store::load_or_empty(store, store::PROJECTS);
    let criteria = match actor.project_scope() {
        Some(tribe) => criteria.clone().with_owner_scope(Some(tribe)),
        None => criteria.clone(),
    };
    apply_filters(&projects, &criteria)
}

// ============================================================================
// MEMBERS
// ============================================================================

/// Snapshot `person` into the project's member list
pub fn add_member(
    store: &dyn RecordStore,
    actor: &Actor,
    project_id: &str,
    person: &PersonRecord,
    role: MemberRole,
    join_date: NaiveDate,
) -> Result<ProjectMember> {
    let mut project = load_for_edit(store, actor, project_id)?;

    if project.has_person(&person.id) {
        return Err(RegistryError::validation(
            "personId",
            format!("{} is already a member of this project", person.id),
        ));
    }

    let member = ProjectMember::from_person(person, role, join_date);
    project.members.push(member.clone());
    store::replace_record(store, project)?;
    Ok(member)
}

pub fn remove_member(store: &dyn RecordStore, actor: &Actor, project_id: &str, member_id: &str) -> Result<ProjectMember> {
    let mut project = load_for_edit(store, actor, project_id)?;

    let position = project
        .members
        .iter()
        .position(|m| m.id == member_id)
        .ok_or_else(|| RegistryError::not_found("members", member_id))?;
    let removed = project.members.remove(position);

    // A removed member no longer attends anything
    for workshop in &mut project.workshops {
        workshop.attendees.retain(|id| id != member_id);
    }

    store::replace_record(store, project)?;
    Ok(removed)
}

/// Students of `tribe` who could join a project, optionally narrowed by a
/// search over first, family and tribe name
pub fn candidate_members(people: &[PersonRecord], tribe: &str, term: &str) -> Vec<PersonRecord> {
    let term = term.trim().to_lowercase();
    people
        .iter()
        .filter(|p| p.employment_status == EmploymentStatus::Student && p.tribe_name == tribe)
        .filter(|p| {
            term.is_empty()
                || [&p.first_name, &p.family_name, &p.tribe_name]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}

// ============================================================================
// WORKSHOPS
// ============================================================================

/// Schedule a workshop under an existing project
pub fn add_workshop(store: &dyn RecordStore, actor: &Actor, project_id: &str, mut workshop: Workshop) -> Result<Workshop> {
    workshop.validate()?;
    let mut project = load_for_edit(store, actor, project_id)?;

    if workshop.id.trim().is_empty() {
        workshop.id = new_record_id("workshop");
    }
    workshop.project_id = project.id.clone();

    project.workshops.push(workshop.clone());
    store::replace_record(store, project)?;
    info!("📅 Scheduled workshop '{}' on {}", workshop.title, workshop.date);
    Ok(workshop)
}

pub fn remove_workshop(store: &dyn RecordStore, actor: &Actor, project_id: &str, workshop_id: &str) -> Result<Workshop> {
    let mut project = load_for_edit(store, actor, project_id)?;

    let position = project
        .workshops
        .iter()
        .position(|w| w.id == workshop_id)
        .ok_or_else(|| RegistryError::not_found("workshops", workshop_id))?;
    let removed = project.workshops.remove(position);

    store::replace_record(store, project)?;
    Ok(removed)
}

/// Every workshop stored under `project_id`, across all projects
pub fn workshops_for_project(store: &dyn RecordStore, project_id: &str) -> Vec<Workshop> {
    store::load_or_empty::<Project>(store, store::PROJECTS)
        .into_iter()
        .flat_map(|p| p.workshops)
        .filter(|w| w.project_id == project_id)
        .collect()
}

/// Workshops whose title, description or location contain `term`
pub fn search_workshops<'a>(project: &'a Project, term: &str) -> Vec<&'a Workshop> {
    let term = term.trim().to_lowercase();
    project
        .workshops
        .iter()
        .filter(|w| {
            term.is_empty()
                || [&w.title, &w.description, &w.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
        })
        .collect()
}

/// Projects matching a search term, for quick lookup in listings
pub fn search_projects<'a>(projects: &'a [Project], term: &str) -> Vec<&'a Project> {
    let term = term.trim().to_lowercase();
    projects.iter().filter(|p| term.is_empty() || matches_term(*p, &term)).collect()
}

// ============================================================================
// TESTS
// ============================================================================

use crate::infra::{open_repository, seed_demo_data, DemoSeed};
use chrono::{Local, NaiveDate};
use clap::Args;
use food_safety::config::StorageConfig;
use food_safety::error::AppError;
use food_safety::inspections::{
    ActionFilter, InspectionRecord, ItemResult, NewInspection, ReinspectionScope, Sort,
};
use food_safety::InspectionTracker;
use food_safety::SqliteRepository;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Inspection date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Write demo data to this SQLite file instead of an in-memory database.
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { date, database } = args;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    let storage = StorageConfig {
        database_path: database,
    };
    let repository = Arc::new(open_repository(&storage)?);
    let seed = seed_demo_data(repository.clone())?;
    let tracker = InspectionTracker::new(repository);

    println!("Food safety inspection demo");
    println!(
        "- School: {} (manager #{}, kitchen #{})",
        seed.school.name, seed.manager.id, seed.kitchen.id
    );
    println!(
        "- Checklist: {} ({} items)",
        seed.checklist.name,
        seed.checklist.items.len()
    );

    let record = tracker.create_inspection(
        NewInspection {
            school_id: seed.school.id,
            checklist_id: Some(seed.checklist.id),
            inspector_id: Some(seed.inspector.id),
            date,
            notes: Some("Scheduled visit".to_string()),
        },
        &seed.inspector,
    )?;
    println!("\nInspection #{} created for {}", record.id(), date);
    render_record(&record);

    let results = demo_results(&record);
    let record = tracker.record_results(record.id(), &results, true, &seed.inspector)?;
    println!("\nResults submitted and inspection completed");
    render_record(&record);

    remediate(&tracker, &seed, &record)?;

    let reinspection = tracker.reinspect(
        record.id(),
        ReinspectionScope::AllUnresolved,
        &record
            .actions
            .iter()
            .map(|action| ItemResult::passed(action.inspection_item_id))
            .collect::<Vec<_>>(),
        &seed.inspector,
    )?;
    println!(
        "\nReinspection: {} action(s) cleared, {} reopened",
        reinspection.outcome.reinspected, reinspection.outcome.reopened
    );
    render_record(&reinspection.record);

    let view = tracker.inspection(record.id(), &seed.manager)?;
    println!("  Read-only for further edits: {}", view.read_only);

    let actions = tracker.visible_actions(ActionFilter::default(), Sort::default(), &seed.admin)?;
    match serde_json::to_string_pretty(&actions) {
        Ok(json) => println!("\nCorrective action list payload:\n{}", json),
        Err(err) => println!("\nCorrective action list unavailable: {}", err),
    }

    Ok(())
}

/// Passes the first item and fails the rest.
fn demo_results(record: &InspectionRecord) -> Vec<ItemResult> {
    record
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if index == 0 {
                ItemResult::passed(item.id)
            } else {
                ItemResult::failed(item.id, format!("{} not met on arrival", item.text))
            }
        })
        .collect()
}

fn remediate(
    tracker: &InspectionTracker<SqliteRepository>,
    seed: &DemoSeed,
    record: &InspectionRecord,
) -> Result<(), AppError> {
    println!("\nRemediation");
    for action in &record.actions {
        let started = tracker.start_action(action.id, &seed.kitchen)?;
        println!(
            "  - action #{} started by kitchen #{} -> {}",
            started.id,
            seed.kitchen.id,
            started.status.label()
        );
        let resolved = tracker.resolve_action(action.id, &seed.kitchen)?;
        println!("    resolved -> {}", resolved.status.label());
        let requested = tracker.request_reinspection(action.id, &seed.manager)?;
        println!(
            "    reinspection requested by manager #{} -> {}",
            seed.manager.id,
            requested.status.label()
        );
    }
    Ok(())
}

fn render_record(record: &InspectionRecord) {
    println!("  Status: {}", record.inspection.status.label());
    for item in &record.items {
        let result = match item.passed {
            Some(true) => "pass",
            Some(false) => "FAIL",
            None => "----",
        };
        println!("  [{result}] {}", item.text);
    }
    for action in &record.actions {
        let owner = action
            .assigned_to
            .map(|id| format!("user #{id}"))
            .unwrap_or_else(|| "unassigned".to_string());
        println!(
            "  * action #{} ({}, {}): {}",
            action.id,
            action.status.label(),
            owner,
            action.description
        );
    }
}

use super::common::*;
use crate::access::Operation;
use crate::directory::Actor;
use crate::error::LifecycleError;
use crate::inspections::domain::{
    ActionStatus, InspectionStatus, InspectionSummary, ItemResult, ReinspectionScope,
};
use crate::inspections::policy::is_read_only;
use crate::inspections::query::{ActionFilter, InspectionFilter, Sort, SortDirection, SortKey};

fn seed_both_schools(fx: &Fixture) {
    fx.failed_inspection();
    let mut request = fx.new_inspection(fx.other_school.id);
    request.inspector_id = Some(fx.other_inspector.id);
    let record = fx
        .tracker
        .create_inspection(request, &fx.admin)
        .expect("create");
    let results = [
        ItemResult::failed(record.items[0].id, "warm"),
        ItemResult::passed(record.items[1].id),
    ];
    fx.tracker
        .record_results(record.id(), &results, true, &fx.other_inspector)
        .expect("complete");
}

fn school_names(rows: &[InspectionSummary]) -> Vec<&str> {
    rows.iter().map(|row| row.school_name.as_str()).collect()
}

#[test]
fn each_role_sees_its_own_slice_of_inspections() {
    let fx = fixture();
    seed_both_schools(&fx);
    let list = |actor: &Actor| {
        fx.tracker
            .visible_inspections(InspectionFilter::default(), Sort::default(), actor)
            .expect("list")
    };

    assert_eq!(list(&fx.admin).len(), 2);
    assert_eq!(school_names(&list(&fx.kitchen)), ["Lincoln Elementary"]);
    assert_eq!(school_names(&list(&fx.other_kitchen)), ["Harbor Middle"]);
    assert_eq!(school_names(&list(&fx.manager)), ["Lincoln Elementary"]);
    assert_eq!(school_names(&list(&fx.other_inspector)), ["Harbor Middle"]);
}

#[test]
fn kitchen_staff_cannot_open_other_schools_inspections() {
    let fx = fixture();
    let (record, _) = fx.failed_inspection();

    assert!(fx.tracker.inspection(record.id(), &fx.kitchen).is_ok());
    assert!(matches!(
        fx.tracker.inspection(record.id(), &fx.other_kitchen),
        Err(LifecycleError::Permission {
            operation: Operation::ViewInspection
        })
    ));
}

#[test]
fn inspection_filters_and_sorting_apply_together() {
    let fx = fixture();
    seed_both_schools(&fx);

    let by_school = Sort {
        key: SortKey::SchoolName,
        direction: SortDirection::Ascending,
    };
    let rows = fx
        .tracker
        .visible_inspections(InspectionFilter::default(), by_school, &fx.admin)
        .expect("list");
    assert_eq!(school_names(&rows), ["Harbor Middle", "Lincoln Elementary"]);

    let filter = InspectionFilter {
        school_id: Some(fx.school.id),
        status: Some(InspectionStatus::Failed),
        date: None,
    };
    let rows = fx
        .tracker
        .visible_inspections(filter, Sort::default(), &fx.admin)
        .expect("list");
    assert_eq!(school_names(&rows), ["Lincoln Elementary"]);

    let filter = InspectionFilter {
        status: Some(InspectionStatus::Passed),
        ..InspectionFilter::default()
    };
    let rows = fx
        .tracker
        .visible_inspections(filter, Sort::default(), &fx.admin)
        .expect("list");
    assert!(rows.is_empty());
}

#[test]
fn actions_follow_assignment_staffing_and_inspection_ownership() {
    let fx = fixture();
    seed_both_schools(&fx);
    let list = |actor: &Actor| {
        fx.tracker
            .visible_actions(ActionFilter::default(), Sort::default(), actor)
            .expect("list")
    };

    assert_eq!(list(&fx.admin).len(), 2);

    let kitchen = list(&fx.kitchen);
    assert_eq!(kitchen.len(), 1);
    assert_eq!(kitchen[0].school_name, "Lincoln Elementary");
    assert_eq!(kitchen[0].item_text, "Hand wash station");

    let inspected = list(&fx.other_inspector);
    assert_eq!(inspected.len(), 1);
    assert_eq!(inspected[0].item_text, "Fridge below 5C");

    // Assignment alone grants visibility outside the staffed school.
    fx.tracker
        .assign_action(inspected[0].id, Some(fx.kitchen.id), &fx.admin)
        .expect("assign");
    assert_eq!(list(&fx.kitchen).len(), 2);
}

#[test]
fn action_filters_use_action_status_and_parent_school() {
    let fx = fixture();
    seed_both_schools(&fx);
    let (_, action) = fx.failed_inspection();
    fx.tracker
        .resolve_action(action.id, &fx.kitchen)
        .expect("resolve");

    let filter = ActionFilter {
        school_id: Some(fx.school.id),
        status: Some(ActionStatus::Open),
        date: None,
    };
    let rows = fx
        .tracker
        .visible_actions(filter, Sort::default(), &fx.admin)
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].id, action.id);
}

#[test]
fn read_only_once_passed_with_nothing_outstanding() {
    let fx = fixture();
    let (record, action) = fx.failed_inspection();
    let view = fx.tracker.inspection(record.id(), &fx.inspector).expect("view");
    assert!(!view.read_only);

    let reinspection = fx
        .tracker
        .reinspect(
            record.id(),
            ReinspectionScope::Action(action.id),
            &[ItemResult::passed(action.inspection_item_id)],
            &fx.inspector,
        )
        .expect("reinspect");
    assert!(is_read_only(&reinspection.record, None));
    assert!(!is_read_only(
        &reinspection.record,
        Some(ReinspectionScope::AllUnresolved)
    ));

    let view = fx.tracker.inspection(record.id(), &fx.inspector).expect("view");
    assert!(view.read_only);

    let scoped = fx
        .tracker
        .inspection_in_scope(
            record.id(),
            Some(ReinspectionScope::Action(action.id)),
            &fx.inspector,
        )
        .expect("scoped view");
    assert!(!scoped.read_only);
}

#[test]
fn scoped_view_requires_an_action_of_the_inspection() {
    let fx = fixture();
    let (record, _) = fx.failed_inspection();
    let (_, foreign) = fx.failed_inspection();

    assert!(matches!(
        fx.tracker.inspection_in_scope(
            record.id(),
            Some(ReinspectionScope::Action(foreign.id)),
            &fx.inspector,
        ),
        Err(LifecycleError::NotFound { .. })
    ));
}

use std::sync::Arc;

use super::common::*;
use crate::workflows::direct_hire::checklist::Transition;
use crate::workflows::direct_hire::coordinator::{
    ChecklistCoordinator, CoordinatorError, CoordinatorStep, GenerateOutcome, SaveOutcome,
};
use crate::workflows::direct_hire::documents::{Completion, DocumentKind, UploadPolicy};
use crate::workflows::direct_hire::domain::{
    ChecklistSnapshot, Milestone, MilestoneEntry, StatusChecklist,
};
use crate::workflows::direct_hire::gateway::{GatewayError, NotificationLevel, PortalCollaborators};
use crate::workflows::direct_hire::ChecklistError;

fn open(
    service: Arc<MemoryService>,
    id: &crate::workflows::direct_hire::ApplicationId,
) -> (ChecklistCoordinator, Arc<RecordingNotifier>) {
    let (collaborators, notifier) = in_process(service);
    let coordinator = ChecklistCoordinator::open(id.clone(), collaborators, UploadPolicy::default())
        .expect("session opens");
    (coordinator, notifier)
}

#[test]
fn evaluated_is_gated_on_required_documents() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let (mut coordinator, notifier) = open(service, &application.id);

    let step = coordinator
        .toggle(Milestone::Evaluated, true)
        .expect("opens tracker");
    assert_eq!(
        step,
        CoordinatorStep::DocumentsRequired(Completion { completed: 0, total: 4 })
    );
    assert!(coordinator.tracker().is_some());
    assert!(!coordinator.draft().is_checked(Milestone::Evaluated));

    let err = coordinator.finish_documents().expect_err("nothing uploaded");
    assert_eq!(
        err,
        CoordinatorError::DocumentsIncomplete(Completion { completed: 0, total: 4 })
    );
    assert_eq!(notifier.count(NotificationLevel::Warning), 1);

    let err = coordinator
        .toggle_document(DocumentKind::Passport, true)
        .expect_err("document required");
    assert!(err.to_string().starts_with("document required"));
}

#[test]
fn completing_documents_then_saving_requires_confirmation_once() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let (mut coordinator, notifier) = open(service.clone(), &application.id);

    coordinator
        .toggle(Milestone::Evaluated, true)
        .expect("opens tracker");
    for kind in DocumentKind::required_kinds() {
        coordinator
            .select_document(kind, pdf(&format!("{}.pdf", kind.key()), 2048))
            .expect("valid file");
        let entry = coordinator
            .upload_document(kind, None)
            .expect("upload succeeds");
        assert!(entry.checked);
    }

    let transition = coordinator.finish_documents().expect("requirements met");
    assert!(matches!(
        transition,
        Transition::Applied {
            milestone: Milestone::Evaluated,
            ..
        }
    ));
    assert!(coordinator.tracker().is_none());
    let evaluated = coordinator.draft().entry(Milestone::Evaluated);
    assert!(evaluated.checked);
    assert!(evaluated.timestamp.is_some());

    assert_eq!(
        coordinator.save(false).expect("save attempt"),
        SaveOutcome::ConfirmationRequired(vec![Milestone::Evaluated])
    );
    assert_eq!(
        coordinator.save(false).expect("second attempt"),
        SaveOutcome::ConfirmationRequired(vec![Milestone::Evaluated])
    );
    assert_eq!(
        notifier.count(NotificationLevel::Warning),
        1,
        "irreversible warning shown once"
    );

    let outcome = coordinator.save(true).expect("confirmed save");
    assert!(matches!(outcome, SaveOutcome::Saved(checklist) if checklist.evaluated.checked));
    assert_eq!(
        notifier.last().map(|event| event.level),
        Some(NotificationLevel::Success)
    );

    let stored = service.get(&application.id).expect("stored");
    assert!(stored.status_checklist.evaluated.checked);
    assert_eq!(stored.version, coordinator.version());
    assert_eq!(coordinator.save(false).expect("no-op"), SaveOutcome::NoChanges);
}

#[test]
fn persisted_evaluated_cannot_be_unchecked() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    upload_required_documents(&service, &application.id);

    let mut checklist = StatusChecklist::default();
    checklist.evaluated.checked = true;
    service
        .update_checklist(&application.id, checklist, None)
        .expect("evaluated persisted");

    let (mut coordinator, notifier) = open(service, &application.id);
    let err = coordinator
        .toggle(Milestone::Evaluated, false)
        .expect_err("irreversible");

    assert_eq!(
        err,
        CoordinatorError::Checklist(ChecklistError::CannotUncheck(Milestone::Evaluated))
    );
    assert!(err.to_string().contains("cannot uncheck status"));
    assert!(coordinator.draft().is_checked(Milestone::Evaluated));
    assert_eq!(notifier.count(NotificationLevel::Error), 1);

    let step = coordinator
        .toggle(Milestone::Evaluated, true)
        .expect("re-check is a no-op");
    assert_eq!(step, CoordinatorStep::Updated(Transition::Unchanged));
}

#[test]
fn newly_checked_milestone_clears_other_pending_ones() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let (mut coordinator, _) = open(service, &application.id);

    coordinator
        .toggle(Milestone::ForConfirmation, true)
        .expect("check a");
    coordinator
        .toggle(Milestone::EmailedToDhad, true)
        .expect("check b");

    assert!(!coordinator.draft().is_checked(Milestone::ForConfirmation));
    assert!(coordinator.draft().is_checked(Milestone::EmailedToDhad));
    assert_eq!(
        coordinator.session().pending_transitions(),
        vec![Milestone::EmailedToDhad]
    );
}

#[test]
fn failed_save_keeps_the_draft() {
    let (service, _, _) = build_service();
    let (collaborators, notifier) = in_process(service);
    let collaborators = PortalCollaborators {
        applications: Arc::new(ReadOnlyApplications {
            snapshot: ChecklistSnapshot {
                status_checklist: StatusChecklist::default(),
                version: 1,
            },
        }),
        ..collaborators
    };
    let mut coordinator = ChecklistCoordinator::open(
        crate::workflows::direct_hire::ApplicationId("dh-readonly".to_string()),
        collaborators,
        UploadPolicy::default(),
    )
    .expect("snapshot loads");

    coordinator
        .toggle(Milestone::ForInterview, true)
        .expect("check");
    let err = coordinator.save(true).expect_err("write fails");

    assert!(matches!(
        err,
        CoordinatorError::Gateway(GatewayError::Unavailable(_))
    ));
    assert!(coordinator.draft().is_checked(Milestone::ForInterview));
    assert!(!coordinator.session().persisted().is_checked(Milestone::ForInterview));
    assert_eq!(notifier.count(NotificationLevel::Error), 1);
}

#[test]
fn concurrent_editor_save_is_reported_as_conflict() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let (mut first, _) = open(service.clone(), &application.id);
    let (mut second, notifier) = open(service, &application.id);

    first
        .toggle(Milestone::ForConfirmation, true)
        .expect("check");
    first.save(true).expect("first editor saves");

    second
        .toggle(Milestone::ForInterview, true)
        .expect("check");
    let err = second.save(true).expect_err("stale version");

    assert!(matches!(err, CoordinatorError::Gateway(GatewayError::Conflict(_))));
    assert_eq!(notifier.count(NotificationLevel::Error), 1);
}

#[test]
fn checklist_document_conflict_then_override() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let (mut coordinator, _) = open(service.clone(), &application.id);

    let err = coordinator
        .generate_checklist_document(false)
        .expect_err("documents missing");
    assert!(matches!(err, CoordinatorError::DocumentsIncomplete(_)));

    upload_required_documents(&service, &application.id);

    let first = coordinator
        .generate_checklist_document(false)
        .expect("generated");
    assert!(matches!(first, GenerateOutcome::Generated(ref doc) if !doc.regenerated));

    assert_eq!(
        coordinator
            .generate_checklist_document(false)
            .expect("conflict reported"),
        GenerateOutcome::AlreadyExists
    );

    let regenerated = coordinator
        .generate_checklist_document(true)
        .expect("override");
    assert!(matches!(regenerated, GenerateOutcome::Generated(ref doc) if doc.regenerated));
}

#[test]
fn unchecking_a_draft_milestone_is_allowed() {
    let (service, _, _) = build_service();
    let application = created_application(&service);
    let (mut coordinator, _) = open(service, &application.id);

    coordinator
        .toggle(Milestone::ReceivedFromDhad, true)
        .expect("check");
    let step = coordinator
        .toggle(Milestone::ReceivedFromDhad, false)
        .expect("uncheck draft");

    assert_eq!(
        step,
        CoordinatorStep::Updated(Transition::Cleared(Milestone::ReceivedFromDhad))
    );
    assert_eq!(
        *coordinator.draft().entry(Milestone::ReceivedFromDhad),
        MilestoneEntry::default()
    );
    assert_eq!(coordinator.save(false).expect("nothing to save"), SaveOutcome::NoChanges);
}

//! Status checklist state machine.
//!
//! A session pairs the last persisted checklist with an editable draft. Persisted
//! milestones are irreversible, at most one unpersisted milestone may be pending
//! at a time, and `evaluated` can only be newly checked by presenting a
//! [`RequirementsSatisfied`] proof from the document tracker.

use chrono::{DateTime, Utc};

use super::documents::RequirementsSatisfied;
use super::domain::{Milestone, MilestoneEntry, StatusChecklist};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("cannot uncheck status: {0} has already been saved")]
    CannotUncheck(Milestone),
}

/// Result of a milestone edit against the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The milestone was checked; `cleared` lists pending milestones that were reset.
    Applied {
        milestone: Milestone,
        cleared: Vec<Milestone>,
    },
    /// A draft-only milestone was unchecked.
    Cleared(Milestone),
    /// `evaluated` needs the document requirements before it can be applied.
    DocumentsRequired,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistSession {
    persisted: StatusChecklist,
    draft: StatusChecklist,
}

impl ChecklistSession {
    pub fn new(persisted: StatusChecklist) -> Self {
        Self {
            persisted,
            draft: persisted,
        }
    }

    pub fn persisted(&self) -> &StatusChecklist {
        &self.persisted
    }

    pub fn draft(&self) -> &StatusChecklist {
        &self.draft
    }

    pub fn set_milestone(
        &mut self,
        milestone: Milestone,
        checked: bool,
        now: DateTime<Utc>,
    ) -> Result<Transition, ChecklistError> {
        if self.persisted.is_checked(milestone) {
            return if checked {
                Ok(Transition::Unchanged)
            } else {
                Err(ChecklistError::CannotUncheck(milestone))
            };
        }

        if !checked {
            if !self.draft.is_checked(milestone) {
                return Ok(Transition::Unchanged);
            }
            *self.draft.entry_mut(milestone) = MilestoneEntry::default();
            return Ok(Transition::Cleared(milestone));
        }

        if self.draft.is_checked(milestone) {
            return Ok(Transition::Unchanged);
        }

        if milestone == Milestone::Evaluated {
            return Ok(Transition::DocumentsRequired);
        }

        Ok(self.apply(milestone, now))
    }

    /// Completion callback for the document prerequisite of `evaluated`.
    pub fn complete_evaluation(
        &mut self,
        _proof: RequirementsSatisfied,
        now: DateTime<Utc>,
    ) -> Transition {
        if self.draft.is_checked(Milestone::Evaluated) {
            return Transition::Unchanged;
        }
        self.apply(Milestone::Evaluated, now)
    }

    fn apply(&mut self, milestone: Milestone, now: DateTime<Utc>) -> Transition {
        let mut cleared = Vec::new();
        for other in Milestone::ALL {
            if other != milestone
                && !self.persisted.is_checked(other)
                && self.draft.is_checked(other)
            {
                *self.draft.entry_mut(other) = MilestoneEntry::default();
                cleared.push(other);
            }
        }
        *self.draft.entry_mut(milestone) = MilestoneEntry::checked_at(now);
        Transition::Applied { milestone, cleared }
    }

    /// Milestones that go from unchecked to checked if the draft is saved.
    pub fn pending_transitions(&self) -> Vec<Milestone> {
        Milestone::ALL
            .into_iter()
            .filter(|milestone| {
                !self.persisted.is_checked(*milestone) && self.draft.is_checked(*milestone)
            })
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        self.persisted != self.draft
    }

    /// Adopts `saved` as the new persisted snapshot and resets the draft to it.
    pub fn commit(&mut self, saved: StatusChecklist) {
        self.persisted = saved;
        self.draft = saved;
    }

    pub fn discard(&mut self) {
        self.draft = self.persisted;
    }
}

/// Rejects a write that would uncheck a milestone already stored as checked.
pub fn ensure_no_uncheck(
    previous: &StatusChecklist,
    next: &StatusChecklist,
) -> Result<(), ChecklistError> {
    match Milestone::ALL
        .into_iter()
        .find(|milestone| previous.is_checked(*milestone) && !next.is_checked(*milestone))
    {
        Some(milestone) => Err(ChecklistError::CannotUncheck(milestone)),
        None => Ok(()),
    }
}

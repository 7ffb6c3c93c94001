//! # Row Edit Controller
//!
//! Tracks which row of a collection is in inline-edit mode and holds that
//! row's unsaved draft. A collection is either `Viewing` or `Editing` exactly
//! one row; there is no state in which two rows are editable.
//!
//! Switching the edit target away from a row with unsaved changes either
//! discards them and reports the discard ([`EditPolicy::DiscardSilently`]) or
//! is refused until the caller saves or discards ([`EditPolicy::RequireResolve`]).

use std::fmt::Debug;

use clinicsched_core::{ScheduleError, ScheduleResult};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditPolicy {
    /// A new edit target silently replaces the old one; the lost draft is
    /// still returned to the caller.
    #[default]
    DiscardSilently,
    /// A dirty session must be saved or discarded before another row is edited.
    RequireResolve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditSession<D> {
    /// Draft is identical to the row it was opened from.
    Clean(D),
    /// Draft has been touched since the edit started.
    Dirty(D),
}

impl<D> EditSession<D> {
    pub fn draft(&self) -> &D {
        match self {
            EditSession::Clean(draft) | EditSession::Dirty(draft) => draft,
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, EditSession::Dirty(_))
    }

    fn into_draft(self) -> D {
        match self {
            EditSession::Clean(draft) | EditSession::Dirty(draft) => draft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEditState<K, D> {
    Viewing,
    Editing { key: K, session: EditSession<D> },
}

/// A draft that was dropped because the edit target changed or was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discarded<K, D> {
    pub key: K,
    pub draft: D,
    pub was_dirty: bool,
}

#[derive(Debug, Clone)]
pub struct RowEditController<K, D> {
    state: RowEditState<K, D>,
    policy: EditPolicy,
}

impl<K, D> Default for RowEditController<K, D> {
    fn default() -> Self {
        Self {
            state: RowEditState::Viewing,
            policy: EditPolicy::default(),
        }
    }
}

impl<K, D> RowEditController<K, D>
where
    K: Clone + PartialEq + Debug,
{
    pub fn new(policy: EditPolicy) -> Self {
        Self {
            state: RowEditState::Viewing,
            policy,
        }
    }

    pub fn policy(&self) -> EditPolicy {
        self.policy
    }

    pub fn state(&self) -> &RowEditState<K, D> {
        &self.state
    }

    pub fn editing(&self) -> Option<&K> {
        match &self.state {
            RowEditState::Editing { key, .. } => Some(key),
            RowEditState::Viewing => None,
        }
    }

    pub fn is_editing(&self, key: &K) -> bool {
        self.editing() == Some(key)
    }

    pub fn draft(&self, key: &K) -> Option<&D> {
        match &self.state {
            RowEditState::Editing { key: current, session } if current == key => {
                Some(session.draft())
            }
            _ => None,
        }
    }

    /// Makes `key` the edit target with `draft` as its starting point.
    ///
    /// Editing the row that is already the target keeps its session. Any other
    /// open session is discarded and returned, unless the policy forbids
    /// discarding a dirty one.
    pub fn begin_edit(&mut self, key: K, draft: D) -> ScheduleResult<Option<Discarded<K, D>>> {
        if let RowEditState::Editing { key: current, session } = &self.state {
            if *current == key {
                return Ok(None);
            }
            if session.is_dirty() && self.policy == EditPolicy::RequireResolve {
                return Err(ScheduleError::EditConflict(format!(
                    "{:?} has unsaved changes; save or discard them before editing {:?}",
                    current, key
                )));
            }
        }

        let previous = std::mem::replace(
            &mut self.state,
            RowEditState::Editing {
                key: key.clone(),
                session: EditSession::Clean(draft),
            },
        );
        debug!("edit target is now {:?}", key);
        Ok(Self::into_discarded(previous))
    }

    /// Mutable access to the draft of `key`; marks the session dirty.
    pub fn draft_mut(&mut self, key: &K) -> ScheduleResult<&mut D> {
        if !self.is_editing(key) {
            return Err(Self::not_editing(key));
        }
        let clean = matches!(
            &self.state,
            RowEditState::Editing {
                session: EditSession::Clean(_),
                ..
            }
        );
        if clean {
            if let RowEditState::Editing { key, session } =
                std::mem::replace(&mut self.state, RowEditState::Viewing)
            {
                self.state = RowEditState::Editing {
                    key,
                    session: EditSession::Dirty(session.into_draft()),
                };
            }
        }
        match &mut self.state {
            RowEditState::Editing {
                session: EditSession::Clean(draft) | EditSession::Dirty(draft),
                ..
            } => Ok(draft),
            RowEditState::Viewing => Err(Self::not_editing(key)),
        }
    }

    /// Returns to `Viewing` after `key` was saved. A no-op if `key` is no
    /// longer the edit target.
    pub fn finish(&mut self, key: &K) -> bool {
        if self.is_editing(key) {
            self.state = RowEditState::Viewing;
            debug!("finished editing {:?}", key);
            true
        } else {
            false
        }
    }

    /// Leaves edit mode without saving.
    pub fn cancel_edit(&mut self) -> Option<Discarded<K, D>> {
        let previous = std::mem::replace(&mut self.state, RowEditState::Viewing);
        Self::into_discarded(previous)
    }

    /// Drops the session of `key` if it is the edit target.
    pub fn discard(&mut self, key: &K) -> Option<Discarded<K, D>> {
        if self.is_editing(key) {
            self.cancel_edit()
        } else {
            None
        }
    }

    fn into_discarded(state: RowEditState<K, D>) -> Option<Discarded<K, D>> {
        match state {
            RowEditState::Viewing => None,
            RowEditState::Editing { key, session } => {
                let was_dirty = session.is_dirty();
                if was_dirty {
                    debug!("discarded unsaved changes on {:?}", key);
                }
                Some(Discarded {
                    key,
                    draft: session.into_draft(),
                    was_dirty,
                })
            }
        }
    }

    fn not_editing(key: &K) -> ScheduleError {
        ScheduleError::EditConflict(format!("{:?} is not being edited", key))
    }
}

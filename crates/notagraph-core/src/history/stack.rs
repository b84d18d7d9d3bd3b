use std::collections::{HashSet, VecDeque};

use crate::errors::{NotationError, Result};
use crate::model::{ChangeRecord, ElementId, NotationModel};

use super::command::{Command, Edit, EditCommand};

/// Linear undo/redo history with a cursor
///
/// `commands[..position]` are applied, `commands[position..]` are undone and
/// available for redo. With a limit set, the oldest commands are evicted
/// once more than `limit` are held; `evicted` keeps the revision count
/// monotonic across evictions.
///
/// Dropping a command, by eviction or by discarding redo history, also
/// discards the free elements that only it could re-attach.
#[derive(Debug, Default)]
pub struct CommandStack {
    commands: VecDeque<Box<dyn Command>>,
    position: usize,
    limit: Option<usize>,
    evicted: usize,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack that holds at most `limit` commands (at least one)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Apply a command and record it
    ///
    /// On success any redo history is discarded. On failure the stack is
    /// untouched and the command is dropped.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the command's `apply`.
    pub fn execute(
        &mut self,
        mut command: Box<dyn Command>,
        model: &mut NotationModel,
    ) -> Result<Vec<ChangeRecord>> {
        let records = command.apply(model)?;

        let mut dropped: Vec<Box<dyn Command>> = self.commands.drain(self.position..).collect();
        if !dropped.is_empty() {
            tracing::debug!(discarded = dropped.len(), "discarding redo history");
        }
        tracing::debug!(label = command.label(), records = records.len(), "command executed");
        self.commands.push_back(command);
        self.position += 1;

        if let Some(limit) = self.limit {
            while self.commands.len() > limit {
                if let Some(oldest) = self.commands.pop_front() {
                    dropped.push(oldest);
                }
                self.position -= 1;
                self.evicted += 1;
            }
        }
        self.release(&dropped, model);
        Ok(records)
    }

    /// Discard free elements that only `dropped` commands could re-attach
    ///
    /// An element survives while it is owned, while a held command names it,
    /// or while it contains something a held command names.
    fn release(&self, dropped: &[Box<dyn Command>], model: &mut NotationModel) {
        if dropped.is_empty() {
            return;
        }
        let held: HashSet<ElementId> = self
            .commands
            .iter()
            .flat_map(|c| c.held_elements())
            .collect();

        let mut discarded = 0;
        for id in dropped.iter().flat_map(|c| c.held_elements()) {
            let free = id != *model.root()
                && model
                    .element(&id)
                    .is_some_and(|element| element.container().is_none());
            if !free || held.contains(&id) {
                continue;
            }
            if model.descendants(&id).iter().any(|d| held.contains(d)) {
                continue;
            }
            if model.discard(&id).is_ok() {
                discarded += 1;
            }
        }
        if discarded > 0 {
            tracing::debug!(discarded, "released unreachable elements");
        }
    }

    /// Wrap an [`Edit`] in an [`EditCommand`] and execute it
    ///
    /// # Errors
    ///
    /// See [`CommandStack::execute`].
    pub fn execute_edit(
        &mut self,
        edit: Edit,
        model: &mut NotationModel,
    ) -> Result<Vec<ChangeRecord>> {
        self.execute(Box::new(EditCommand::new(edit)), model)
    }

    /// # Errors
    ///
    /// Returns `NothingToUndo` when no command is applied, or the command's
    /// error (the cursor does not move).
    pub fn undo(&mut self, model: &mut NotationModel) -> Result<Vec<ChangeRecord>> {
        if !self.can_undo() {
            return Err(NotationError::NothingToUndo);
        }
        let command = self
            .commands
            .get_mut(self.position - 1)
            .ok_or_else(|| cursor_error(self.position))?;
        let records = command.invert(model)?;
        tracing::debug!(label = command.label(), "command undone");
        self.position -= 1;
        Ok(records)
    }

    /// # Errors
    ///
    /// Returns `NothingToRedo` when no command is undone, or the command's
    /// error (the cursor does not move).
    pub fn redo(&mut self, model: &mut NotationModel) -> Result<Vec<ChangeRecord>> {
        if !self.can_redo() {
            return Err(NotationError::NothingToRedo);
        }
        let command = self
            .commands
            .get_mut(self.position)
            .ok_or_else(|| cursor_error(self.position))?;
        let records = command.apply(model)?;
        tracing::debug!(label = command.label(), "command redone");
        self.position += 1;
        Ok(records)
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.commands.len()
    }

    /// Number of applied commands held by the stack
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands evicted by the history limit
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Applied commands since the stack was created, evicted ones included
    pub fn revision(&self) -> usize {
        self.evicted + self.position
    }

    /// Oldest revision the stack can still reach by undoing
    pub fn oldest_revision(&self) -> usize {
        self.evicted
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(|c| c.label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.commands.get(self.position).map(|c| c.label())
    }
}

fn cursor_error(position: usize) -> NotationError {
    NotationError::Internal {
        message: format!("history cursor {} points outside the stack", position),
    }
}

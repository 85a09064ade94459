//! Step Ordering
//!
//! Position management for the steps of one workflow: insertion at a
//! position, moving a step up or down, deletion with renumbering, and
//! normalization of loaded definitions.
//!
//! Every operation computes the complete new position assignment first and
//! commits it in one pass, so positions are `1..=len` with no duplicates
//! whenever an operation returns.

use log::debug;

use super::model::{Step, StepId, Workflow, WorkflowError};

/// Returns true if `positions` is exactly `{1, ..., len}`.
pub fn is_dense(positions: &[u32]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(index, &position)| position == index as u32 + 1)
}

impl Workflow {
    /// Inserts a step at `position`, or appends it when `position` is `None`.
    ///
    /// Steps at or after the target position shift down by one. A target
    /// beyond the end is clamped to the end so no gap is created.
    ///
    /// # Example
    ///
    /// ```
    /// use steprunner::workflow::{Step, Workflow};
    ///
    /// let mut workflow = Workflow::new("deploy check");
    /// workflow.insert_step(Step::delay(1.0), None).unwrap();
    /// let id = workflow.insert_step(Step::http_check("https://example.com"), Some(1)).unwrap();
    ///
    /// assert_eq!(workflow.step_at(1).unwrap().id, id);
    /// ```
    pub fn insert_step(
        &mut self,
        mut step: Step,
        position: Option<u32>,
    ) -> Result<StepId, WorkflowError> {
        if self.steps.iter().any(|s| s.id == step.id) {
            return Err(WorkflowError::DuplicateStep(step.id));
        }

        let end = self.steps.len() as u32 + 1;
        let target = match position {
            None => end,
            Some(0) => return Err(WorkflowError::InvalidPosition(0)),
            Some(p) => p.min(end),
        };

        let mut positions: Vec<u32> = self
            .steps
            .iter()
            .map(|s| if s.position >= target { s.position + 1 } else { s.position })
            .collect();
        positions.push(target);

        let id = step.id;
        step.workflow_id = self.id;
        self.steps.push(step);
        self.commit_positions(positions);

        debug!("Inserted step {} at position {}", id, target);
        Ok(id)
    }

    /// Swaps a step with its predecessor.
    ///
    /// Returns false (and changes nothing) when the step is already first.
    pub fn move_up(&mut self, id: StepId) -> Result<bool, WorkflowError> {
        let current = self.position_of(id)?;
        let previous = self
            .steps
            .iter()
            .filter(|s| s.position < current)
            .max_by_key(|s| s.position)
            .map(|s| s.id);

        Ok(match previous {
            Some(other) => self.swap_positions(id, other),
            None => false,
        })
    }

    /// Swaps a step with its successor.
    ///
    /// Returns false (and changes nothing) when the step is already last.
    pub fn move_down(&mut self, id: StepId) -> Result<bool, WorkflowError> {
        let current = self.position_of(id)?;
        let next = self
            .steps
            .iter()
            .filter(|s| s.position > current)
            .min_by_key(|s| s.position)
            .map(|s| s.id);

        Ok(match next {
            Some(other) => self.swap_positions(id, other),
            None => false,
        })
    }

    /// Removes a step and renumbers the survivors, keeping their relative order.
    pub fn remove_step(&mut self, id: StepId) -> Result<Step, WorkflowError> {
        let index = self
            .steps
            .iter()
            .position(|s| s.id == id)
            .ok_or(WorkflowError::StepNotFound(id))?;

        let removed = self.steps.remove(index);
        let positions = (1..=self.steps.len() as u32).collect();
        self.commit_positions(positions);

        debug!("Removed step {} from position {}", id, removed.position);
        Ok(removed)
    }

    /// Renumbers steps to `1..=len` by a stable sort of their current positions.
    ///
    /// Unplaced steps (position 0) keep their list order after all placed ones.
    pub fn normalize_positions(&mut self) {
        self.steps.sort_by_key(|s| match s.position {
            0 => u32::MAX,
            p => p,
        });
        let positions = (1..=self.steps.len() as u32).collect();
        self.commit_positions(positions);
        self.attach_steps();
    }

    /// Returns true if the positions of this workflow are `1..=len`.
    pub fn positions_are_dense(&self) -> bool {
        let positions: Vec<u32> = self.steps.iter().map(|s| s.position).collect();
        is_dense(&positions)
    }

    fn position_of(&self, id: StepId) -> Result<u32, WorkflowError> {
        self.get_step(id)
            .map(|s| s.position)
            .ok_or(WorkflowError::StepNotFound(id))
    }

    fn swap_positions(&mut self, a: StepId, b: StepId) -> bool {
        let (Ok(pos_a), Ok(pos_b)) = (self.position_of(a), self.position_of(b)) else {
            return false;
        };

        let positions = self
            .steps
            .iter()
            .map(|s| match s.id {
                id if id == a => pos_b,
                id if id == b => pos_a,
                _ => s.position,
            })
            .collect();
        self.commit_positions(positions);

        debug!("Swapped positions {} and {}", pos_a, pos_b);
        true
    }

    /// Applies a complete assignment, index-aligned with `self.steps`, then
    /// restores ascending order.
    fn commit_positions(&mut self, positions: Vec<u32>) {
        debug_assert_eq!(positions.len(), self.steps.len());
        debug_assert!(is_dense(&positions), "non-dense assignment {:?}", positions);

        for (step, position) in self.steps.iter_mut().zip(positions) {
            step.position = position;
        }
        self.steps.sort_by_key(|s| s.position);
    }
}

// Recursive look-ahead rating
//
// Scores a cell by walking every non-reversing path from it up to a depth bound.
// Each node contributes its own value times the average of its children (always
// divided by three, so cells with fewer open exits are discounted harder). Dead
// ends still report how far the branch got, which the move selection falls back
// on when every branch is worth nothing.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{GameRulesConfig, HungerConfig};
use crate::grid::Grid;
use crate::types::{Direction, Position};

/// Result of rating one branch
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    /// Aggregated desirability of the branch
    pub value: f32,
    /// Furthest simulated turn reached by any path of the branch
    pub distance: i32,
}

impl Rating {
    /// Zero-value rating for a branch that ends at `distance`
    pub fn dead_end(distance: i32) -> Self {
        Rating {
            value: 0.0,
            distance,
        }
    }
}

/// Cells visited along one branch, oldest first.
///
/// Only the most recent cells are kept: once the simulated body has moved past a
/// cell its tail no longer covers it. The window never grows past `capacity`,
/// which the caller sets to the look-ahead depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    cells: VecDeque<Position>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        History {
            cells: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, pos: &Position) -> bool {
        self.cells.contains(pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Copy of this history with `pos` appended, dropping the oldest cells so
    /// that at most `min(body_length, capacity)` remain
    pub fn extended(&self, pos: Position, body_length: usize) -> History {
        let window = body_length.min(self.capacity);
        let mut next = self.clone();
        next.cells.push_back(pos);
        while next.cells.len() > window {
            next.cells.pop_front();
        }
        next
    }
}

/// Read-only context shared by every branch of one decision
#[derive(Debug, Clone, Copy)]
pub struct Rater<'a> {
    grid: &'a Grid,
    hunger: &'a HungerConfig,
    rules: &'a GameRulesConfig,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Rater<'a> {
    pub fn new(grid: &'a Grid, hunger: &'a HungerConfig, rules: &'a GameRulesConfig) -> Self {
        Rater {
            grid,
            hunger,
            rules,
            cancel: None,
        }
    }

    /// Stops the search once `cancel` is set: every node visited afterwards
    /// reports a dead end, so the recursion unwinds quickly.
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Rates `position`, reached `distance` turns from now, exploring `depth`
    /// further turns.
    ///
    /// `origin` is the direction leading back to the previous cell and is never
    /// explored. `growth` counts food eaten earlier on this branch; it delays
    /// the moment our own tail frees a cell.
    #[allow(clippy::too_many_arguments)]
    pub fn rate(
        &self,
        position: Position,
        origin: Direction,
        distance: i32,
        depth: u32,
        own_length: usize,
        mut growth: usize,
        mut health: i32,
        history: &History,
    ) -> Rating {
        if self.cancelled() {
            return Rating::dead_end(distance);
        }

        let Some(cell) = self.grid.cell(&position) else {
            return Rating::dead_end(distance);
        };

        if cell.base == 0.0 {
            return Rating::dead_end(distance);
        }

        let offset = if cell.self_occupied { growth as i32 } else { 0 };
        if cell.tenure + offset >= distance {
            return Rating::dead_end(distance);
        }

        if history.contains(&position) {
            return Rating::dead_end(distance);
        }

        let mut value = cell.base;
        if cell.food {
            growth += 1;
            value += self.food_bonus(distance, health);
            health = self.rules.health_on_food;
        }

        health -= self.rules.health_loss_per_turn;

        if depth == 0 {
            return Rating { value, distance };
        }

        let history = history.extended(position, own_length + growth);
        let mut rating = Rating::dead_end(distance);

        for dir in Direction::others(origin) {
            let child = self.rate(
                dir.apply(&position),
                dir.opposite(),
                distance + 1,
                depth - 1,
                own_length,
                growth,
                health,
                &history,
            );
            rating.value += value * child.value / 3.0;
            rating.distance = rating.distance.max(child.distance);
        }

        rating
    }

    /// Reward for reaching food `distance` turns out with the given health
    pub fn food_bonus(&self, distance: i32, health: i32) -> f32 {
        let discount = self.hunger.food_reward / (distance * distance) as f32;
        discount * self.hunger.hunger_weight * self.hunger.hunger_modifier(health)
    }
}

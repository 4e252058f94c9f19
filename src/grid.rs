// Per-turn board model
//
// The grid is built fresh from each /move snapshot: terrain values first, then
// food, body occupancy and head danger are stamped on top. After population it
// is only read, so search workers can share it by reference.

use rand::Rng;
use std::fmt::Write;

use crate::config::TerrainConfig;
use crate::types::{Battlesnake, Board, Direction, Position};

/// One square of the board
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    /// Static desirability; 0 marks the cell as forbidden
    pub base: f32,
    /// Turns until the body segment on this cell moves away (0 = free now)
    pub tenure: i32,
    pub food: bool,
    pub self_occupied: bool,
    /// +1 next to a head at least as long as ours, -1 next to a shorter one
    pub danger: i8,
}

/// Head of another snake together with its length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub position: Position,
    pub length: usize,
}

/// Which attribute `Grid::render` prints per cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridView {
    /// `F` for food, otherwise the cell's tenure
    Occupancy,
    /// The cell's base value
    Values,
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    heads: Vec<Head>,
}

impl Grid {
    /// Allocates a grid and assigns every cell its terrain value.
    ///
    /// Edge cells lose `edge_penalty` per edge they touch, cells on the ring
    /// `ring_offset` away from an edge gain `ring_bonus` per axis, and a jitter
    /// in `[0, random_modifier)` breaks ties between otherwise equal cells.
    pub fn new<R: Rng + ?Sized>(
        width: i32,
        height: i32,
        terrain: &TerrainConfig,
        rng: &mut R,
    ) -> Self {
        let mut cells = Vec::with_capacity((width * height) as usize);

        for y in 0..height {
            for x in 0..width {
                let mut base = terrain.base_value;

                if x == 0 || x == width - 1 {
                    base -= terrain.edge_penalty;
                }
                if y == 0 || y == height - 1 {
                    base -= terrain.edge_penalty;
                }

                if x == terrain.ring_offset || x == width - 1 - terrain.ring_offset {
                    base += terrain.ring_bonus;
                }
                if y == terrain.ring_offset || y == height - 1 - terrain.ring_offset {
                    base += terrain.ring_bonus;
                }

                if terrain.random_modifier != 0.0 {
                    base += rng.random::<f32>() * terrain.random_modifier;
                }

                cells.push(Cell {
                    base,
                    ..Cell::default()
                });
            }
        }

        Grid {
            width,
            height,
            cells,
            heads: Vec::new(),
        }
    }

    /// Builds and populates the grid for one turn
    pub fn from_board<R: Rng + ?Sized>(
        board: &Board,
        you: &Battlesnake,
        terrain: &TerrainConfig,
        rng: &mut R,
    ) -> Self {
        let mut grid = Grid::new(board.width, board.height, terrain, rng);
        grid.populate(board, you);
        grid
    }

    /// Stamps food, body tenure, self occupancy and head danger onto the grid.
    ///
    /// A segment at index `i` of a snake of length `L` keeps its cell for
    /// `L - 1 - i` more turns. When segments are stacked (start of game, or
    /// right after eating) the cell keeps the longest tenure.
    pub fn populate(&mut self, board: &Board, you: &Battlesnake) {
        for food in &board.food {
            if let Some(cell) = self.cell_mut(food) {
                cell.food = true;
            }
        }

        let own_length = you.body.len();

        for snake in &board.snakes {
            let length = snake.body.len();
            let is_self = snake.id == you.id;

            for (index, segment) in snake.body.iter().enumerate() {
                if let Some(cell) = self.cell_mut(segment) {
                    cell.tenure = cell.tenure.max((length - 1 - index) as i32);
                    if is_self {
                        cell.self_occupied = true;
                    }
                }
            }

            if is_self {
                continue;
            }

            let Some(&head) = snake.body.first() else {
                continue;
            };
            self.heads.push(Head {
                position: head,
                length,
            });

            let danger = if length >= own_length { 1 } else { -1 };
            for dir in Direction::all() {
                self.mark_danger(&dir.apply(&head), danger);
            }
        }
    }

    /// Flags a cell next to an enemy head. Positive danger also forbids the
    /// cell; off-board positions are ignored.
    pub fn mark_danger(&mut self, pos: &Position, danger: i8) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.danger = danger;
            if danger > 0 {
                cell.base = 0.0;
            }
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Heads of the other snakes recorded during population
    pub fn heads(&self) -> &[Head] {
        &self.heads
    }

    pub fn in_bounds(&self, pos: &Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Returns the cell at `pos`, or None when it lies off the board
    pub fn cell(&self, pos: &Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    fn cell_mut(&mut self, pos: &Position) -> Option<&mut Cell> {
        let i = self.index(pos)?;
        Some(&mut self.cells[i])
    }

    fn index(&self, pos: &Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    /// Text dump of the grid, top row (highest y) first
    pub fn render(&self, view: GridView) -> String {
        let mut out = String::new();

        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let cell = &self.cells[(y * self.width + x) as usize];
                // Writing into a String cannot fail
                let _ = match view {
                    GridView::Occupancy if cell.food => write!(out, "{:>3}", "F"),
                    GridView::Occupancy => write!(out, "{:>3}", cell.tenure),
                    GridView::Values => write!(out, "{:>6.2}", cell.base),
                };
            }
            out.push('\n');
        }

        out
    }
}

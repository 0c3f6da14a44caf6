//! Tetris: falling tetrominoes on a fixed grid
//!
//! The grid stores colour indices (0 = empty). Every move, rotation and drop
//! is validated against the grid first and silently dropped if the piece
//! would overlap a filled cell or leave the grid. Pieces come from a
//! shuffled 7-bag so each kind appears once per cycle.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::director::{GravityCurve, tetris_lines_for_level};
use super::engine::{Game, snapshot_of};
use super::rng::{RngState, SimRng};
use super::state::{GameEvent, Hud};
use crate::input::Intent;
use crate::settings::Difficulty;

/// Tetris tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetrisConfig {
    pub columns: usize,
    pub rows: usize,
    pub gravity: GravityCurve,
    /// Row interval while soft drop is held
    pub soft_drop_interval: f32,
    /// Delay before a held sideways key starts repeating
    pub das_delay: f32,
    /// Interval between repeated sideways moves
    pub arr_interval: f32,
    /// Upcoming pieces exposed for the preview
    pub preview: usize,
}

impl Default for TetrisConfig {
    fn default() -> Self {
        Self {
            columns: 10,
            rows: 20,
            gravity: GravityCurve {
                base: 0.8,
                decay: 0.85,
                min: 0.05,
            },
            soft_drop_interval: 0.05,
            das_delay: 0.17,
            arr_interval: 0.05,
            preview: 3,
        }
    }
}

impl TetrisConfig {
    pub fn start_level(difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy | Difficulty::Normal => 1,
            Difficulty::Hard => 5,
        }
    }
}

/// The seven tetrominoes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Grid colour index (never 0)
    pub fn color(self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::S => 4,
            PieceKind::Z => 5,
            PieceKind::J => 6,
            PieceKind::L => 7,
        }
    }

    /// Spawn orientation
    pub fn shape(self) -> Shape {
        let (size, rows): (usize, [&str; 4]) = match self {
            PieceKind::I => (4, ["....", "####", "....", "...."]),
            PieceKind::O => (2, ["##", "##", "", ""]),
            PieceKind::T => (3, [".#.", "###", "...", ""]),
            PieceKind::S => (3, [".##", "##.", "...", ""]),
            PieceKind::Z => (3, ["##.", ".##", "...", ""]),
            PieceKind::J => (3, ["#..", "###", "...", ""]),
            PieceKind::L => (3, ["..#", "###", "...", ""]),
        };
        Shape::parse(size, &rows)
    }
}

/// Square rotation matrix of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub size: usize,
    pub cells: [[bool; 4]; 4],
}

impl Shape {
    fn parse(size: usize, rows: &[&str; 4]) -> Self {
        let mut cells = [[false; 4]; 4];
        for (r, row) in rows.iter().enumerate().take(size) {
            for (c, ch) in row.chars().enumerate().take(size) {
                cells[r][c] = ch == '#';
            }
        }
        Self { size, cells }
    }

    /// Rotate 90 degrees clockwise within the same matrix
    pub fn rotated_cw(&self) -> Self {
        let n = self.size;
        let mut cells = [[false; 4]; 4];
        for (r, row) in cells.iter_mut().enumerate().take(n) {
            for (c, cell) in row.iter_mut().enumerate().take(n) {
                *cell = self.cells[n - 1 - c][r];
            }
        }
        Self { size: n, cells }
    }

    /// Occupied (column, row) offsets
    pub fn blocks(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.size).flat_map(move |r| {
            (0..self.size).filter(move |&c| self.cells[r][c]).map(move |c| (c as i32, r as i32))
        })
    }
}

/// The falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    /// Grid column of the matrix's left edge
    pub x: i32,
    /// Grid row of the matrix's top edge
    pub y: i32,
}

impl Piece {
    /// New piece centred at the top of a grid `columns` wide
    pub fn spawn(kind: PieceKind, columns: usize) -> Self {
        let shape = kind.shape();
        Self {
            kind,
            shape,
            x: (columns as i32 - shape.size as i32) / 2,
            y: 0,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.blocks().map(move |(c, r)| (self.x + c, self.y + r))
    }

    pub fn moved(&self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..*self }
    }

    pub fn rotated(&self) -> Self {
        Self { shape: self.shape.rotated_cw(), ..*self }
    }
}

/// Settled cells, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub columns: usize,
    pub rows: usize,
    pub cells: Vec<u8>,
}

impl Grid {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![0; columns * rows],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let in_bounds = x >= 0 && y >= 0 && (x as usize) < self.columns && (y as usize) < self.rows;
        in_bounds.then(|| y as usize * self.columns + x as usize)
    }

    /// Cell value, or None outside the grid
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: i32, y: i32, value: u8) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    /// Inside the grid and empty
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(0)
    }

    pub fn fits(&self, piece: &Piece) -> bool {
        piece.cells().all(|(x, y)| self.is_free(x, y))
    }

    /// Write a piece into the grid
    pub fn lock(&mut self, piece: &Piece) {
        let color = piece.kind.color();
        for (x, y) in piece.cells() {
            self.set(x, y, color);
        }
    }

    pub fn row_full(&self, y: usize) -> bool {
        self.cells[y * self.columns..(y + 1) * self.columns].iter().all(|&c| c != 0)
    }

    /// Remove full rows, shifting the rest down and adding empty rows at the
    /// top. Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let kept: Vec<u8> = (0..self.rows)
            .filter(|&y| !self.row_full(y))
            .flat_map(|y| self.cells[y * self.columns..(y + 1) * self.columns].iter().copied())
            .collect();
        let cleared = self.rows - kept.len() / self.columns;
        if cleared > 0 {
            let mut cells = vec![0; cleared * self.columns];
            cells.extend(kept);
            self.cells = cells;
        }
        cleared as u32
    }
}

/// 7-bag randomizer with lookahead for the preview
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PieceBag {
    queue: VecDeque<PieceKind>,
}

impl PieceBag {
    /// Queue at least `count` upcoming pieces, one shuffled bag at a time
    fn fill<R: Rng>(&mut self, rng: &mut R, count: usize) {
        while self.queue.len() < count {
            let mut bag = PieceKind::ALL;
            bag.shuffle(rng);
            self.queue.extend(bag);
        }
    }

    pub fn next<R: Rng>(&mut self, rng: &mut R) -> PieceKind {
        self.fill(rng, 1);
        let kind = self.queue.pop_front().unwrap_or(PieceKind::I);
        self.fill(rng, PieceKind::ALL.len());
        kind
    }

    /// Upcoming pieces, nearest first
    pub fn peek(&self, count: usize) -> Vec<PieceKind> {
        self.queue.iter().take(count).copied().collect()
    }
}

/// Sideways auto-repeat state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct Shift {
    dir: i32,
    held_for: f32,
    repeat: f32,
}

/// Tetris state
#[derive(Debug, Clone, Serialize)]
pub struct Tetris {
    pub config: TetrisConfig,
    pub grid: Grid,
    pub active: Option<Piece>,
    pub hold: Option<PieceKind>,
    /// Hold already used for the current piece
    pub hold_used: bool,
    pub bag: PieceBag,
    pub score: u64,
    pub lines: u32,
    pub level: u32,
    pub over: bool,
    gravity_timer: f32,
    shift: Shift,
    pub rng_state: RngState,
    #[serde(skip)]
    rng: SimRng,
}

impl Tetris {
    pub fn new(config: TetrisConfig, difficulty: Difficulty, seed: Option<u64>) -> Self {
        let rng_state = RngState::from_seed_or_entropy(seed);
        let mut tetris = Self {
            grid: Grid::new(config.columns, config.rows),
            active: None,
            hold: None,
            hold_used: false,
            bag: PieceBag::default(),
            score: 0,
            lines: 0,
            level: TetrisConfig::start_level(difficulty),
            over: false,
            gravity_timer: 0.0,
            shift: Shift::default(),
            rng: rng_state.to_rng(),
            rng_state,
            config,
        };
        tetris.spawn_next(&mut Vec::new());
        tetris
    }

    /// Seconds per gravity row at the current level
    pub fn gravity_interval(&self) -> f32 {
        self.config.gravity.interval(self.level)
    }

    pub fn preview(&self) -> Vec<PieceKind> {
        self.bag.peek(self.config.preview)
    }

    /// Rows the active piece can still fall
    pub fn drop_distance(&self) -> i32 {
        let Some(piece) = self.active else {
            return 0;
        };
        let mut distance = 0;
        while self.grid.fits(&piece.moved(0, distance + 1)) {
            distance += 1;
        }
        distance
    }

    fn spawn(&mut self, kind: PieceKind, events: &mut Vec<GameEvent>) {
        let piece = Piece::spawn(kind, self.grid.columns);
        self.gravity_timer = 0.0;
        if self.grid.fits(&piece) {
            self.active = Some(piece);
        } else {
            self.active = None;
            self.over = true;
            events.push(GameEvent::GameOver);
            log::info!("Topped out: score {} with {} lines", self.score, self.lines);
        }
    }

    fn spawn_next(&mut self, events: &mut Vec<GameEvent>) {
        let kind = self.bag.next(&mut self.rng);
        self.hold_used = false;
        self.spawn(kind, events);
    }

    /// Replace the active piece if `candidate` is a valid placement
    fn try_place(&mut self, candidate: Piece) -> bool {
        if self.grid.fits(&candidate) {
            self.active = Some(candidate);
            true
        } else {
            false
        }
    }

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        match self.active {
            Some(piece) => self.try_place(piece.moved(dx, dy)),
            None => false,
        }
    }

    fn try_rotate(&mut self) -> bool {
        match self.active {
            Some(piece) => self.try_place(piece.rotated()),
            None => false,
        }
    }

    /// Settle the active piece, clear rows, score, and bring in the next one
    fn lock(&mut self, events: &mut Vec<GameEvent>) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.grid.lock(&piece);
        events.push(GameEvent::PieceLocked);

        let rows = self.grid.clear_full_rows();
        if rows > 0 {
            let points = rows * rows * 100;
            self.score += u64::from(points);
            self.lines += rows;
            events.push(GameEvent::LinesCleared { rows });
            events.push(GameEvent::Scored { points, total: self.score });
        }
        self.spawn_next(events);
    }

    fn hold_piece(&mut self, events: &mut Vec<GameEvent>) {
        if self.hold_used {
            return;
        }
        let Some(piece) = self.active.take() else {
            return;
        };
        match self.hold.replace(piece.kind) {
            Some(held) => self.spawn(held, events),
            None => {
                let kind = self.bag.next(&mut self.rng);
                self.spawn(kind, events);
            }
        }
        self.hold_used = true;
        events.push(GameEvent::PieceHeld);
    }

    fn hard_drop(&mut self, events: &mut Vec<GameEvent>) {
        let distance = self.drop_distance();
        self.try_shift(0, distance);
        self.lock(events);
    }

    /// Press moves once; holding repeats after the DAS delay
    fn handle_shift(&mut self, intent: &Intent, dt: f32) {
        let pressed = if intent.pressed.left {
            Some(-1)
        } else if intent.pressed.right {
            Some(1)
        } else {
            None
        };
        if let Some(dir) = pressed {
            self.try_shift(dir, 0);
            self.shift = Shift { dir, held_for: 0.0, repeat: 0.0 };
            return;
        }

        let held = intent.direction.x as i32;
        if held == 0 || held != self.shift.dir {
            self.shift = Shift::default();
            return;
        }
        self.shift.held_for += dt;
        let past_delay = self.shift.held_for - self.config.das_delay;
        if past_delay < 0.0 {
            return;
        }
        self.shift.repeat += past_delay.min(dt);
        while self.shift.repeat >= self.config.arr_interval {
            self.shift.repeat -= self.config.arr_interval;
            if !self.try_shift(held, 0) {
                self.shift.repeat = 0.0;
                break;
            }
        }
    }

    fn apply_gravity(&mut self, soft_drop: bool, dt: f32, events: &mut Vec<GameEvent>) {
        let mut interval = self.gravity_interval();
        if soft_drop {
            interval = interval.min(self.config.soft_drop_interval);
        }
        self.gravity_timer += dt;
        while self.gravity_timer >= interval {
            self.gravity_timer -= interval;
            if !self.try_shift(0, 1) {
                self.lock(events);
                break;
            }
        }
    }
}

impl Game for Tetris {
    fn step(&mut self, intent: &Intent, dt: f32, events: &mut Vec<GameEvent>) {
        if intent.pressed.hold {
            self.hold_piece(events);
        }
        self.handle_shift(intent, dt);
        if intent.pressed.up {
            self.try_rotate();
        }
        if intent.pressed.fire {
            self.hard_drop(events);
        }
        if !self.over {
            self.apply_gravity(intent.direction.y > 0.0, dt, events);
        }
    }

    fn is_over(&self) -> bool {
        self.over
    }

    fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            opponent_score: None,
            lives: None,
            level: self.level,
            game_over: self.over,
        }
    }

    fn level_cleared(&self) -> bool {
        self.lines >= tetris_lines_for_level(self.level)
    }

    fn start_next_level(&mut self) {
        self.level += 1;
    }

    fn snapshot(&self) -> serde_json::Value {
        let mut value = snapshot_of(self);
        if let Some(map) = value.as_object_mut() {
            map.insert("preview".into(), snapshot_of(&self.preview()));
            map.insert("drop_distance".into(), self.drop_distance().into());
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Pressed;
    use crate::sim::director;
    use glam::Vec2;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn tetris() -> Tetris {
        Tetris::new(TetrisConfig::default(), Difficulty::Normal, Some(11))
    }

    fn press(pressed: Pressed) -> Intent {
        Intent { pressed, ..Default::default() }
    }

    fn fill_row(grid: &mut Grid, y: i32, except: &[i32]) {
        for x in 0..grid.columns as i32 {
            if !except.contains(&x) {
                grid.set(x, y, 9);
            }
        }
    }

    #[test]
    fn test_o_piece_clears_bottom_row() {
        let mut game = tetris();
        fill_row(&mut game.grid, 19, &[4, 5]);
        game.active = Some(Piece::spawn(PieceKind::O, 10));
        assert_eq!(game.active.map(|p| p.x), Some(4));

        let events = game.advance(&press(Pressed { fire: true, ..Default::default() }), DT);

        assert!(events.contains(&GameEvent::LinesCleared { rows: 1 }));
        assert_eq!(game.score, 100);
        assert_eq!(game.lines, 1);
        // Upper half of the O dropped into the new bottom row
        let bottom: Vec<u8> = (0..10).map(|x| game.grid.get(x, 19).unwrap_or(0)).collect();
        assert_eq!(bottom, vec![0, 0, 0, 0, 2, 2, 0, 0, 0, 0]);
        assert!((0..10).all(|x| game.grid.get(x, 18) == Some(0)));
    }

    #[test]
    fn test_two_rows_score_quadratically() {
        let mut grid = Grid::new(10, 20);
        fill_row(&mut grid, 18, &[]);
        fill_row(&mut grid, 19, &[]);
        grid.set(3, 17, 1);
        assert_eq!(grid.clear_full_rows(), 2);
        assert_eq!(grid.get(3, 19), Some(1));
        assert_eq!(grid.cells.len(), 200);

        let mut game = tetris();
        fill_row(&mut game.grid, 18, &[0]);
        fill_row(&mut game.grid, 19, &[0]);
        let mut vertical = Piece::spawn(PieceKind::I, 10).rotated();
        // Column 2 of the rotated matrix lands on grid column 0
        vertical.x = -2;
        game.active = Some(vertical);
        game.advance(&press(Pressed { fire: true, ..Default::default() }), DT);
        assert_eq!(game.score, 400);
        assert_eq!(game.lines, 2);
    }

    #[test]
    fn test_rotation_cycle() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            assert_eq!(shape.blocks().count(), 4, "{kind:?}");
            let spun = shape.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
            assert_eq!(spun, shape, "{kind:?}");
        }
        assert_eq!(PieceKind::O.shape().rotated_cw(), PieceKind::O.shape());
    }

    #[test]
    fn test_rotation_rejected_below_floor() {
        let mut game = tetris();
        let mut piece = Piece::spawn(PieceKind::I, 10);
        piece.y = 18;
        game.active = Some(piece);
        game.advance(&press(Pressed { up: true, ..Default::default() }), 0.0);
        assert_eq!(game.active, Some(piece));
    }

    #[test]
    fn test_walls_block_moves() {
        let mut game = tetris();
        game.active = Some(Piece::spawn(PieceKind::O, 10));
        for _ in 0..12 {
            game.advance(&press(Pressed { left: true, ..Default::default() }), 0.0);
        }
        assert_eq!(game.active.map(|p| p.x), Some(0));
    }

    #[test]
    fn test_held_key_auto_repeats() {
        let mut game = tetris();
        game.active = Some(Piece::spawn(PieceKind::O, 10));
        let first = Intent {
            direction: Vec2::new(1.0, 0.0),
            pressed: Pressed { right: true, ..Default::default() },
            ..Default::default()
        };
        game.advance(&first, 0.0);
        assert_eq!(game.active.map(|p| p.x), Some(5));

        let held = Intent { direction: Vec2::new(1.0, 0.0), ..Default::default() };
        // 0.21 s held: past the 0.17 s delay but only 0.04 s of repeat time
        for _ in 0..7 {
            game.advance(&held, 0.03);
        }
        assert_eq!(game.active.map(|p| p.x), Some(5));
        game.advance(&held, 0.03);
        assert_eq!(game.active.map(|p| p.x), Some(6));
    }

    #[test]
    fn test_hold_once_per_piece() {
        let mut game = tetris();
        let first = game.active.map(|p| p.kind);
        let events = game.advance(&press(Pressed { hold: true, ..Default::default() }), 0.0);
        assert!(events.contains(&GameEvent::PieceHeld));
        assert_eq!(game.hold, first);
        let second = game.active.map(|p| p.kind);

        let events = game.advance(&press(Pressed { hold: true, ..Default::default() }), 0.0);
        assert!(events.is_empty());
        assert_eq!(game.active.map(|p| p.kind), second);
    }

    #[test]
    fn test_gravity_moves_and_locks() {
        let mut game = tetris();
        let start = game.active.map(|p| p.y);
        game.advance(&Intent::default(), 0.0);
        game.gravity_timer = 0.79;
        game.advance(&Intent::default(), 0.02);
        assert_eq!(game.active.map(|p| p.y), start.map(|y| y + 1));

        // Resting on the floor: the next tick locks
        let mut piece = Piece::spawn(PieceKind::O, 10);
        piece.y = 18;
        game.active = Some(piece);
        game.gravity_timer = 0.79;
        let events = game.advance(&Intent::default(), 0.02);
        assert!(events.contains(&GameEvent::PieceLocked));
        assert_eq!(game.grid.get(4, 19), Some(PieceKind::O.color()));
    }

    #[test]
    fn test_top_out_ends_game() {
        let mut game = tetris();
        for y in 0..2 {
            fill_row(&mut game.grid, y, &[0]);
        }
        let mut piece = Piece::spawn(PieceKind::O, 10);
        piece.y = 10;
        game.active = Some(piece);
        let events = game.advance(&press(Pressed { fire: true, ..Default::default() }), DT);
        assert!(events.contains(&GameEvent::GameOver));
        assert!(game.is_over());
        assert!(game.active.is_none());
    }

    #[test]
    fn test_level_up_after_ten_lines() {
        let mut game = tetris();
        game.lines = 10;
        let mut events = Vec::new();
        director::direct(&mut game, &mut events);
        assert_eq!(game.level, 2);
        assert!(game.gravity_interval() < 0.8);
        assert_eq!(events, vec![GameEvent::LevelCleared { level: 2 }]);
    }

    #[test]
    fn test_preview_and_snapshot() {
        let game = tetris();
        assert_eq!(game.preview().len(), 3);
        let snapshot = game.snapshot();
        assert_eq!(snapshot["preview"].as_array().map(Vec::len), Some(3));
        assert_eq!(snapshot["grid"]["columns"], 10);
    }

    proptest! {
        #[test]
        fn prop_bag_has_each_kind_once_per_cycle(seed in any::<u64>()) {
            let mut rng = RngState::new(seed).to_rng();
            let mut bag = PieceBag::default();
            for _ in 0..4 {
                let mut cycle: Vec<PieceKind> = (0..7).map(|_| bag.next(&mut rng)).collect();
                cycle.sort_by_key(|k| k.color());
                prop_assert_eq!(cycle, PieceKind::ALL.to_vec());
            }
        }

        #[test]
        fn prop_active_piece_always_fits(seed in any::<u64>(), moves in proptest::collection::vec(0u8..6, 1..200)) {
            let mut game = Tetris::new(TetrisConfig::default(), Difficulty::Normal, Some(seed));
            for m in moves {
                let pressed = match m {
                    0 => Pressed { left: true, ..Default::default() },
                    1 => Pressed { right: true, ..Default::default() },
                    2 => Pressed { up: true, ..Default::default() },
                    3 => Pressed { fire: true, ..Default::default() },
                    4 => Pressed { hold: true, ..Default::default() },
                    _ => Pressed::default(),
                };
                game.advance(&press(pressed), 0.2);
                if let Some(piece) = game.active {
                    prop_assert!(game.grid.fits(&piece));
                }
                prop_assert!(game.active.is_some() || game.is_over());
            }
        }
    }
}

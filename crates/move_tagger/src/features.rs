//! Board metrics feeding the tag context
//!
//! Every metric is computed for one colour on a bare [`Board`] and normalised
//! to `[0, 1]`, so before/after deltas are comparable across families:
//!
//! - `mobility` - squares reached by minor and major pieces, over 40
//! - `center_control` - attackers plus occupancy of d4/e4/d5/e5, over 12
//! - `king_safety` - unattacked king zone (70%) and pawn shield (30%)
//! - `structure` - 1 minus 1/8 per doubled or isolated pawn
//! - `tactics` - value of enemy pieces under favourable attack, over 9

use serde::{Deserialize, Serialize};
use shakmaty::attacks::king_attacks;
use shakmaty::{Bitboard, Board, Color, Role, Square};

const MOBILITY_NORM: f64 = 40.0;
const CENTER_NORM: f64 = 12.0;
const TACTICS_NORM: f64 = 9.0;
/// Non-pawn material of both sides in the starting position
const FULL_NON_PAWN_MATERIAL: f64 = 62.0;
const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Metric vector of one side
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub mobility: f64,
    pub center_control: f64,
    pub king_safety: f64,
    pub structure: f64,
    pub tactics: f64,
}

impl Metrics {
    pub fn compute(board: &Board, color: Color) -> Self {
        Self {
            mobility: mobility(board, color),
            center_control: center_control(board, color),
            king_safety: king_safety(board, color),
            structure: structure(board, color),
            tactics: tactics(board, color),
        }
    }

    /// Component-wise `self - earlier`
    pub fn delta(&self, earlier: &Metrics) -> Metrics {
        Metrics {
            mobility: self.mobility - earlier.mobility,
            center_control: self.center_control - earlier.center_control,
            king_safety: self.king_safety - earlier.king_safety,
            structure: self.structure - earlier.structure,
            tactics: self.tactics - earlier.tactics,
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.mobility,
            self.center_control,
            self.king_safety,
            self.structure,
            self.tactics,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Game phase derived from remaining non-pawn material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    pub fn classify(fullmoves: u32, phase_ratio: f64) -> Phase {
        if fullmoves <= 12 && phase_ratio >= 0.8 {
            Phase::Opening
        } else if phase_ratio <= 0.35 {
            Phase::Endgame
        } else {
            Phase::Middlegame
        }
    }
}

/// Piece value in pawns
pub const fn pawn_value(role: Role) -> f64 {
    match role {
        Role::Pawn => 1.0,
        Role::Knight | Role::Bishop => 3.0,
        Role::Rook => 5.0,
        Role::Queen => 9.0,
        Role::King => 0.0,
    }
}

pub fn is_minor(role: Role) -> bool {
    matches!(role, Role::Knight | Role::Bishop)
}

/// Total material of `color` in pawns
pub fn material(board: &Board, color: Color) -> f64 {
    board
        .by_color(color)
        .into_iter()
        .filter_map(|sq| board.role_at(sq))
        .map(pawn_value)
        .sum()
}

/// Material of `color` minus material of the opponent, in pawns
pub fn material_balance(board: &Board, color: Color) -> f64 {
    material(board, color) - material(board, !color)
}

/// Remaining non-pawn material of both sides over the starting amount
pub fn phase_ratio(board: &Board) -> f64 {
    let non_pawn: f64 = board
        .occupied()
        .into_iter()
        .filter_map(|sq| board.role_at(sq))
        .filter(|role| *role != Role::Pawn)
        .map(pawn_value)
        .sum();
    (non_pawn / FULL_NON_PAWN_MATERIAL).min(1.0)
}

pub fn mobility(board: &Board, color: Color) -> f64 {
    let own = board.by_color(color);
    let reach: usize = own
        .into_iter()
        .filter(|sq| !matches!(board.role_at(*sq), Some(Role::Pawn | Role::King) | None))
        .map(|sq| (board.attacks_from(sq) & !own).count())
        .sum();
    (reach as f64 / MOBILITY_NORM).min(1.0)
}

pub fn center_control(board: &Board, color: Color) -> f64 {
    let occupied = board.occupied();
    let control: usize = CENTER
        .iter()
        .map(|&sq| {
            let occupant = usize::from(board.color_at(sq) == Some(color));
            board.attacks_to(sq, color, occupied).count() + occupant
        })
        .sum();
    (control as f64 / CENTER_NORM).min(1.0)
}

pub fn king_safety(board: &Board, color: Color) -> f64 {
    let Some(king) = board.king_of(color) else {
        return 0.0;
    };
    let occupied = board.occupied();
    let zone = king_attacks(king) | Bitboard::from_square(king);
    let attacked = zone
        .into_iter()
        .filter(|sq| board.attacks_to(*sq, !color, occupied).any())
        .count();
    let zone_safety = 1.0 - attacked as f64 / zone.count() as f64;

    let forward = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let own_pawns = board.by_color(color) & board.by_role(Role::Pawn);
    let (file, rank) = coords(king);
    let shield = (-1..=1)
        .filter_map(|df| square_at(file + df, rank + forward))
        .filter(|sq| own_pawns.contains(*sq))
        .count();

    0.7 * zone_safety + 0.3 * (shield as f64 / 3.0)
}

pub fn structure(board: &Board, color: Color) -> f64 {
    let pawns = board.by_color(color) & board.by_role(Role::Pawn);
    let mut per_file = [0u32; 8];
    for sq in pawns {
        per_file[coords(sq).0 as usize] += 1;
    }

    let doubled: u32 = per_file.iter().map(|n| n.saturating_sub(1)).sum();
    let isolated: u32 = (0..8)
        .filter(|&f| {
            let left = f > 0 && per_file[f - 1] > 0;
            let right = f < 7 && per_file[f + 1] > 0;
            !left && !right
        })
        .map(|f| per_file[f])
        .sum();

    (1.0 - 0.125 * f64::from(doubled + isolated)).clamp(0.0, 1.0)
}

pub fn tactics(board: &Board, color: Color) -> f64 {
    let occupied = board.occupied();
    let mut pressure = 0.0;
    for sq in board.by_color(!color) {
        let Some(target) = board.role_at(sq) else { continue };
        if target == Role::King {
            continue;
        }
        let attackers = board.attacks_to(sq, color, occupied);
        if attackers.is_empty() {
            continue;
        }
        let defended = board.attacks_to(sq, !color, occupied).any();
        let cheapest = attackers
            .into_iter()
            .filter_map(|a| board.role_at(a))
            .map(pawn_value)
            .fold(f64::INFINITY, f64::min);
        if !defended || cheapest < pawn_value(target) {
            pressure += pawn_value(target);
        }
    }
    (pressure / TACTICS_NORM).min(1.0)
}

/// Share of non-king pieces that attack or are attacked by an enemy piece
pub fn contact_ratio(board: &Board) -> f64 {
    let occupied = board.occupied();
    let mut total = 0usize;
    let mut in_contact = 0usize;
    for sq in occupied {
        let Some(piece) = board.piece_at(sq) else { continue };
        if piece.role == Role::King {
            continue;
        }
        total += 1;
        let enemies = board.by_color(!piece.color);
        let touches = (board.attacks_from(sq) & enemies).any()
            || board.attacks_to(sq, !piece.color, occupied).any();
        if touches {
            in_contact += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        in_contact as f64 / total as f64
    }
}

fn coords(sq: Square) -> (i32, i32) {
    let idx = sq as i32;
    (idx % 8, idx / 8)
}

fn square_at(file: i32, rank: i32) -> Option<Square> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::new((rank * 8 + file) as u32))
    } else {
        None
    }
}

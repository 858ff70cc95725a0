//! 没有可连接配对时的障碍物放置。

use crate::game::{BoardLayout, Candidate, Entity, GameStateView, Vec3};
use crate::utils::console_warn;

pub const OBSTACLE_PRIORITY: f64 = 100.0;

/// 参与干扰度计算的玩家候选步数。
const SAMPLED_PLAYER_MOVES: usize = 5;
const CENTER_SCORE_BASE: f64 = 10.0;
const DISRUPTION_WEIGHT: f64 = 20.0;
const SPECIAL_PROXIMITY_WEIGHT: f64 = 15.0;
const SPECIAL_PROXIMITY_RADIUS: f64 = 5.0;

/// 玩家可能走的配对：同类、存活、不同 id，不受 AI 的距离限制。
fn sampled_player_moves(view: &GameStateView) -> Vec<(&Entity, &Entity)> {
    let entities = &view.entities;
    let mut moves = Vec::with_capacity(SAMPLED_PLAYER_MOVES);
    'outer: for (i, first) in entities.iter().enumerate() {
        if !first.is_active() {
            continue;
        }
        for second in &entities[i + 1..] {
            if second.is_active() && second.id != first.id && second.kind == first.kind {
                moves.push((first, second));
                if moves.len() == SAMPLED_PLAYER_MOVES {
                    break 'outer;
                }
            }
        }
    }
    moves
}

/// 采样步中至少有一个实体紧邻该格（一个格宽以内）的比例。
fn disruption(layout: &BoardLayout, cell: &Vec3, moves: &[(&Entity, &Entity)]) -> f64 {
    if moves.is_empty() {
        return 0.0;
    }
    let touched = moves
        .iter()
        .filter(|(first, second)| {
            first.position.distance(cell) <= layout.cell_size
                || second.position.distance(cell) <= layout.cell_size
        })
        .count();
    touched as f64 / moves.len() as f64
}

fn special_proximity(cell: &Vec3, specials: &[&Entity]) -> f64 {
    if specials.is_empty() {
        return 0.0;
    }
    let total: f64 = specials
        .iter()
        .map(|special| (1.0 - special.position.distance(cell) / SPECIAL_PROXIMITY_RADIUS).max(0.0))
        .sum();
    total / specials.len() as f64
}

pub fn score_cell(
    layout: &BoardLayout,
    cell: &Vec3,
    moves: &[(&Entity, &Entity)],
    specials: &[&Entity],
) -> f64 {
    (CENTER_SCORE_BASE - layout.center_distance(cell))
        + disruption(layout, cell, moves) * DISRUPTION_WEIGHT
        + special_proximity(cell, specials) * SPECIAL_PROXIMITY_WEIGHT
}

/// 选出得分最高的空格（平局取行优先的第一个）；棋盘已满时退回中心。
pub fn place_obstacle(layout: &BoardLayout, view: &GameStateView) -> Candidate {
    let moves = sampled_player_moves(view);
    let specials: Vec<&Entity> = view
        .active_entities()
        .filter(|entity| entity.is_special)
        .collect();

    let mut best: Option<(Vec3, f64)> = None;
    for cell in layout.free_cells(view) {
        let score = score_cell(layout, &cell, &moves, &specials);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((cell, score)),
        }
    }

    let position = match best {
        Some((cell, _)) => cell,
        None => {
            console_warn!("no free cell for an obstacle, using board center");
            layout.center
        }
    };
    Candidate::Obstacle {
        position,
        priority: OBSTACLE_PRIORITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Difficulty;

    fn obstacle_position(candidate: &Candidate) -> Vec3 {
        match candidate {
            Candidate::Obstacle { position, priority } => {
                assert_eq!(*priority, OBSTACLE_PRIORITY);
                *position
            }
            Candidate::Match { .. } => panic!("expected an obstacle"),
        }
    }

    #[test]
    fn empty_board_gets_central_obstacle() {
        let view = GameStateView::new(Vec::new(), Difficulty::Medium);
        let candidate = place_obstacle(&BoardLayout::default(), &view);
        assert_eq!(obstacle_position(&candidate), Vec3::default());
    }

    #[test]
    fn occupied_center_is_skipped() {
        let view = GameStateView::new(
            vec![Entity::new(1, "apple", Vec3::new(0.0, 0.0, 0.0))],
            Difficulty::Medium,
        );
        let layout = BoardLayout::default();
        let position = obstacle_position(&place_obstacle(&layout, &view));
        assert_ne!(position, Vec3::default());
        assert!((layout.center_distance(&position) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn special_fruit_pulls_the_obstacle() {
        let view = GameStateView::new(
            vec![Entity::new(1, "cherry", Vec3::new(6.0, 0.0, 6.0)).special()],
            Difficulty::Medium,
        );
        let layout = BoardLayout::default();
        let position = obstacle_position(&place_obstacle(&layout, &view));
        // (10 - d) + 15 * (1 - d_special / 5) 在特殊水果旁边取得最大值
        assert!(position.distance(&Vec3::new(6.0, 0.0, 6.0)) <= 2.0 + 1e-9);
    }

    #[test]
    fn disruption_counts_sampled_moves_near_cell() {
        let a = Entity::new(1, "apple", Vec3::new(-30.0, 0.0, 0.0));
        let b = Entity::new(2, "apple", Vec3::new(2.0, 0.0, 0.0));
        let c = Entity::new(3, "grape", Vec3::new(30.0, 0.0, 0.0));
        let d = Entity::new(4, "grape", Vec3::new(40.0, 0.0, 0.0));
        let layout = BoardLayout::default();
        let moves = vec![(&a, &b), (&c, &d)];
        assert_eq!(disruption(&layout, &Vec3::default(), &moves), 0.5);
        assert_eq!(disruption(&layout, &Vec3::default(), &[]), 0.0);
    }

    #[test]
    fn player_move_sample_is_capped() {
        let entities = (0..8)
            .map(|id| Entity::new(id, "apple", Vec3::new(id as f64 * 30.0, 0.0, 0.0)))
            .collect();
        let view = GameStateView::new(entities, Difficulty::Medium);
        assert_eq!(sampled_player_moves(&view).len(), SAMPLED_PLAYER_MOVES);
    }

    #[test]
    fn full_board_falls_back_to_center() {
        let layout = BoardLayout::new(Vec3::new(1.0, 0.0, 1.0), 1, 1, 2.0);
        let view = GameStateView::new(
            vec![Entity::new(1, "apple", Vec3::new(1.0, 0.0, 1.0))],
            Difficulty::Medium,
        );
        assert_eq!(
            obstacle_position(&place_obstacle(&layout, &view)),
            Vec3::new(1.0, 0.0, 1.0)
        );
    }
}

//! Self-play: two scripted players run a whole match through the engine and
//! the hub.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::board::random_fleet;
use crate::config::BOARD_SIZE;
use crate::domain::{GameStatus, PlayerId};
use crate::game::GameEngine;
use crate::gateway::Gateway;
use crate::geometry::{self, Coord};
use crate::hub::Hub;

/// Upper bound on shots in one match; both grids together have 200 cells.
const MAX_SHOTS: usize = 2 * (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

/// Queue size for the observer connections; large enough to hold every
/// event of a match.
const OBSERVER_CAPACITY: usize = 1024;

/// Hunt on a checkerboard until something is hit, then work through the
/// neighbours of each hit.
pub struct Shooter {
    rng: SmallRng,
    fired: HashSet<Coord>,
    follow_ups: VecDeque<Coord>,
}

impl Shooter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            fired: HashSet::new(),
            follow_ups: VecDeque::new(),
        }
    }

    pub fn next_target(&mut self) -> Option<Coord> {
        while let Some(c) = self.follow_ups.pop_front() {
            if !self.fired.contains(&c) {
                return Some(c);
            }
        }
        let open: Vec<Coord> = (0..BOARD_SIZE as i32)
            .flat_map(|y| (0..BOARD_SIZE as i32).map(move |x| Coord::new(x, y)))
            .filter(|c| !self.fired.contains(c))
            .collect();
        let parity: Vec<Coord> = open.iter().copied().filter(|c| (c.x + c.y) % 2 == 0).collect();
        let pool = if parity.is_empty() { &open } else { &parity };
        if pool.is_empty() {
            return None;
        }
        Some(pool[self.rng.random_range(0..pool.len())])
    }

    /// Record the result of a shot at `target`.
    pub fn record(&mut self, target: Coord, hit: bool) {
        self.fired.insert(target);
        if hit {
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let c = Coord::new(target.x + dx, target.y + dy);
                if geometry::in_bounds(c) && !self.fired.contains(&c) {
                    self.follow_ups.push_back(c);
                }
            }
        }
    }

    pub fn shots(&self) -> usize {
        self.fired.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SideReport {
    pub player_id: PlayerId,
    pub shots: usize,
    pub hits: usize,
    /// Frames the player's connection received from the hub.
    pub events: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimReport {
    pub player1: SideReport,
    pub player2: SideReport,
    pub winner: PlayerId,
}

/// Play one match between two scripted players seeded with `seed_a` and
/// `seed_b`. Player 1 creates the game, player 2 joins.
pub async fn play(seed_a: u64, seed_b: u64) -> anyhow::Result<SimReport> {
    let gateway = Gateway::new(Arc::new(GameEngine::in_memory()), Hub::spawn());
    let engine = gateway.engine().clone();
    let p1 = PlayerId(1);
    let p2 = PlayerId(2);

    let mut obs1 = gateway.hub().open(Some(p1), None, OBSERVER_CAPACITY);
    let mut obs2 = gateway.hub().open(Some(p2), None, OBSERVER_CAPACITY);

    let created = engine.create_game(p1).await?;
    let game_id = created.value.id;
    gateway.hub().change_subscription(obs1.id, Some(game_id));
    gateway.hub().change_subscription(obs2.id, Some(game_id));
    gateway.publish(&created.events);

    let joined = engine.join_game(game_id, p2).await?;
    gateway.publish(&joined.events);

    for (player, seed) in [(p1, seed_a), (p2, seed_b)] {
        let mut rng = SmallRng::seed_from_u64(seed);
        let fleet = random_fleet(&mut rng)?;
        let placed = engine.place_ships(game_id, player, &fleet).await?;
        gateway.publish(&placed.events);
    }

    let mut shooters = [Shooter::new(!seed_a), Shooter::new(!seed_b)];
    let mut hits = [0usize; 2];
    let mut game = engine.game(game_id).await?;
    while game.status == GameStatus::Active {
        let turn = game
            .current_turn
            .ok_or_else(|| anyhow::anyhow!("active game {} has no turn", game_id))?;
        let side = if turn == p1 { 0 } else { 1 };
        if shooters[0].shots() + shooters[1].shots() >= MAX_SHOTS {
            anyhow::bail!("game {} did not finish within {} shots", game_id, MAX_SHOTS);
        }
        let target = shooters[side]
            .next_target()
            .ok_or_else(|| anyhow::anyhow!("player {} ran out of targets", turn))?;
        let outcome = engine.make_move(game_id, turn, target).await?;
        shooters[side].record(target, outcome.value.mv.hit);
        if outcome.value.mv.hit {
            hits[side] += 1;
        }
        gateway.publish(&outcome.events);
        game = outcome.value.game;
    }

    let winner = game
        .winner
        .ok_or_else(|| anyhow::anyhow!("finished game {} has no winner", game_id))?;

    // the stats round trip orders after every delivery above
    gateway.hub().stats().await;
    let mut events = [0usize; 2];
    for (count, obs) in events.iter_mut().zip([&mut obs1, &mut obs2]) {
        while obs.rx.try_recv().is_ok() {
            *count += 1;
        }
    }

    Ok(SimReport {
        player1: SideReport {
            player_id: p1,
            shots: shooters[0].shots(),
            hits: hits[0],
            events: events[0],
        },
        player2: SideReport {
            player_id: p2,
            shots: shooters[1].shots(),
            hits: hits[1],
            events: events[1],
        },
        winner,
    })
}

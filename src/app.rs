//! App wiring: config -> world -> scheduler -> tick-driven draw pump.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use carve_draw::{
    BeginHooks, Clipboard, DrawOpKind, DrawOperation, DrawQueue, Player, SolidBrush, UndoState,
};
use carve_geom::{BoundingBox, Position, Vec3I};
use carve_map::{Block, Map};
use carve_sched::{BackgroundTaskQueue, Scheduler, SchedulerTask};

use crate::config::Config;

const DEMO_PLAYER: &str = "demo";

/// Everything the tick task mutates, behind one lock.
struct WorldState {
    map: Map,
    queue: DrawQueue,
    players: hashbrown::HashMap<String, Player>,
}

impl WorldState {
    fn route_completed(&mut self) {
        for done in self.queue.take_completed() {
            let player = self
                .players
                .entry(DEMO_PLAYER.to_string())
                .or_insert_with(|| Player::new(DEMO_PLAYER, 16));
            match done.kind {
                DrawOpKind::Undo => player.record_undo(done.undo),
                DrawOpKind::Redo => player.record_redo(done.undo),
                _ => player.record_draw(done.undo),
            }
        }
    }
}

pub struct App {
    cfg: Config,
    world: Arc<Mutex<WorldState>>,
}

impl App {
    pub fn new(cfg: Config) -> Self {
        let mut players = hashbrown::HashMap::new();
        players.insert(
            DEMO_PLAYER.to_string(),
            Player::new(DEMO_PLAYER, cfg.undo_depth),
        );
        let world = Arc::new(Mutex::new(WorldState {
            map: Map::new(cfg.map_sx, cfg.map_sy, cfg.map_sz),
            queue: DrawQueue::new(),
            players,
        }));
        Self { cfg, world }
    }

    fn begin_and_queue(&self, mut op: DrawOperation, marks: &[Vec3I]) {
        op.set_max_batch_time(Duration::from_millis(self.cfg.max_batch_time_ms));
        let mut world = self.world.lock().unwrap();
        match op.prepare(&world.map, marks) {
            Ok(true) => {}
            Ok(false) => {
                log::warn!(target: "draw", "{} rejected its marks", op.kind());
                return;
            }
            Err(e) => {
                log::error!(target: "draw", "bad draw request: {e}");
                return;
            }
        }
        match op.begin(&mut BeginHooks::new()) {
            Ok(true) => {
                if let Err(e) = world.queue.queue(op) {
                    log::error!(target: "draw", "queue refused operation: {e}");
                }
            }
            Ok(false) => log::info!(target: "draw", "operation vetoed before start"),
            Err(e) => log::error!(target: "draw", "begin failed: {e}"),
        }
    }

    fn wait_drained(&self, tick: Duration, ticks_left: &mut u64) {
        while *ticks_left > 0 {
            thread::sleep(tick);
            *ticks_left -= 1;
            if self.world.lock().unwrap().queue.pending() == 0 {
                return;
            }
        }
    }

    fn take_journal(
        &self,
        pick: impl FnOnce(&mut Player) -> Option<UndoState>,
    ) -> Option<UndoState> {
        let mut world = self.world.lock().unwrap();
        world.players.get_mut(DEMO_PLAYER).and_then(pick)
    }

    pub fn run(&self) {
        let cfg = &self.cfg;
        let tick = Duration::from_millis(cfg.tick_interval_ms);
        log::info!(
            "starting: {}x{}x{} map, {} blocks/tick, tick {:?}",
            cfg.map_sx,
            cfg.map_sy,
            cfg.map_sz,
            cfg.draw_blocks_per_tick,
            tick
        );

        let mut scheduler = Scheduler::new();
        let mut bgq = BackgroundTaskQueue::new();
        bgq.start();

        // Foreground pump: one batch round per tick, budget split across
        // whatever is pending.
        let pump_world = self.world.clone();
        let budget = cfg.draw_blocks_per_tick;
        let pump = SchedulerTask::run_forever(tick, Duration::ZERO, move || {
            let mut world = pump_world.lock().unwrap();
            let world = &mut *world;
            world.queue.run_batches(&mut world.map, budget);
            world.route_completed();
        });
        pump.set_adjust_for_execution_time(true);
        scheduler.add_task(pump);

        // Background stats heartbeat, off the tick thread.
        let stats_world = self.world.clone();
        let stats = SchedulerTask::run_forever(
            Duration::from_secs(1),
            Duration::from_secs(1),
            move || {
                let world = stats_world.lock().unwrap();
                let s = world.map.stats();
                log::debug!(
                    target: "stats",
                    "rev={} changed={} pending_ops={}",
                    s.rev,
                    s.blocks_changed,
                    world.queue.pending()
                );
            },
        );
        stats.set_background(true);
        scheduler.add_task(stats);

        let mut ticks_left = cfg.run_ticks;
        self.demo_sequence(tick, &mut ticks_left, &bgq);

        // Idle out any remaining ticks so recurring tasks keep exercising.
        while ticks_left > 0 && self.world.lock().unwrap().queue.pending() > 0 {
            thread::sleep(tick);
            ticks_left -= 1;
        }

        let final_world = self.world.clone();
        bgq.add(move || {
            let world = final_world.lock().unwrap();
            log::info!(
                "final map: {} non-air blocks, {} total changes",
                world.map.count_non_air(),
                world.map.stats().blocks_changed
            );
        });

        bgq.shutdown();
        scheduler.stop();
        log::info!("clean shutdown");
    }

    /// Sphere + line, copy/paste, then undo and redo: touches every
    /// operation family once.
    fn demo_sequence(&self, tick: Duration, ticks_left: &mut u64, bgq: &BackgroundTaskQueue) {
        let cfg = &self.cfg;
        let center = Vec3I::new(
            cfg.map_sx as i32 / 2,
            cfg.map_sy as i32 / 2,
            cfg.map_sz as i32 / 2,
        );
        let stone = Block::new(1);
        let glass = Block::new(20);
        // Demo player standing at a map corner; the line runs from their
        // feet to the sphere center.
        let spawn = Position::new(0, 1, 0, 0, 0);

        self.begin_and_queue(
            DrawOperation::sphere(Box::new(SolidBrush::new(glass)), true),
            &[center, center + Vec3I::new(0, 0, 6)],
        );
        self.begin_and_queue(
            DrawOperation::line(Box::new(SolidBrush::new(stone))),
            &[spawn.to_block_coords(), center],
        );
        self.wait_drained(tick, ticks_left);

        // Copy a slab around the center and stamp it next to itself.
        let slab = {
            let world = self.world.lock().unwrap();
            Clipboard::from_map_region(
                &world.map,
                BoundingBox::from_corners(
                    center - Vec3I::new(2, 2, 2),
                    center + Vec3I::new(2, 2, 2),
                ),
            )
        };
        if let Some(clip) = slab {
            let anchor = Vec3I::new(4, 4, 4);
            self.begin_and_queue(DrawOperation::quick_paste(clip), &[anchor, anchor]);
            self.wait_drained(tick, ticks_left);
        }

        if let Some(journal) = self.take_journal(Player::undo_begin) {
            bgq.add(|| log::info!(target: "draw", "undo requested"));
            self.begin_and_queue(DrawOperation::undo(journal), &[]);
            self.wait_drained(tick, ticks_left);
        }
        if let Some(journal) = self.take_journal(Player::redo_begin) {
            self.begin_and_queue(DrawOperation::redo(journal), &[]);
            self.wait_drained(tick, ticks_left);
        }
    }
}

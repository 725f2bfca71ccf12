//! Idle Bricks headless host
//!
//! Drives the simulation at a fixed timestep, autosaves on an interval and
//! saves on exit.
//!
//! Usage: `idle-bricks [SECONDS] [--auto-buy]`
//!
//! Environment:
//! - `IDLE_BRICKS_CONFIG`: path to a `SimConfig` JSON file
//! - `IDLE_BRICKS_SAVE`: save file path (default `idle-bricks-save.json`)
//! - `RUST_LOG`: log filter

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use idle_bricks::consts::*;
    use idle_bricks::persistence::{self, FileStore};
    use idle_bricks::{BallKind, BigNumber, SimConfig, SimEvent, Simulator, UpgradeKind};

    /// Frame length the host pretends to present at
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    #[derive(Debug, Clone, Copy)]
    enum Purchase {
        Ball(BallKind),
        Upgrade(UpgradeKind),
    }

    pub struct Host {
        sim: Simulator,
        store: FileStore,
        accumulator: f32,
        since_save: f32,
        autosave_secs: f32,
        auto_buy: bool,
        // Session stats
        destroyed: u64,
        explosions: u64,
        earned: BigNumber,
    }

    impl Host {
        pub fn new(config: SimConfig, store: FileStore, seed: u64, auto_buy: bool) -> Self {
            let autosave_secs = config.autosave_secs;
            let mut sim = Simulator::new(config, seed);
            match persistence::load_from(&store, &mut sim, persistence::now_ms()) {
                Ok(Some(report)) => log::info!(
                    "Continuing saved game ({} balls, {:.0}s offline)",
                    report.balls,
                    report.offline_secs
                ),
                Ok(None) => log::info!("No save found, starting fresh"),
                Err(e) => log::warn!("Could not load save, starting fresh: {e}"),
            }
            Self {
                sim,
                store,
                accumulator: 0.0,
                since_save: 0.0,
                autosave_secs,
                auto_buy,
                destroyed: 0,
                explosions: 0,
                earned: BigNumber::ZERO,
            }
        }

        /// Run fixed simulation steps for one frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                for event in self.sim.tick(SIM_DT) {
                    match event {
                        SimEvent::BrickDestroyed { reward, .. } => {
                            self.destroyed += 1;
                            self.earned = self.earned + reward;
                        }
                        SimEvent::Explosion { .. } => self.explosions += 1,
                        SimEvent::DepthAdvanced { viewport } => {
                            log::debug!("Play area now at y={:.0}", viewport.y)
                        }
                        SimEvent::BrickDamaged { .. } => {}
                    }
                }
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            if self.auto_buy {
                self.spend();
            }

            self.since_save += dt;
            if self.since_save >= self.autosave_secs {
                self.since_save = 0.0;
                self.save();
            }
        }

        /// Idle mode: prestige when possible, then buy the cheapest item
        /// until nothing is affordable
        fn spend(&mut self) {
            if self.sim.economy().can_prestige() && self.sim.prestige() {
                return;
            }
            for _ in 0..16 {
                let eco = self.sim.economy();
                let cheapest = BallKind::ALL
                    .into_iter()
                    .map(|k| (eco.ball_cost(k), Purchase::Ball(k)))
                    .chain(
                        UpgradeKind::ALL
                            .into_iter()
                            .map(|k| (eco.cost(k), Purchase::Upgrade(k))),
                    )
                    .min_by(|a, b| a.0.cmp(&b.0));
                let Some((_, purchase)) = cheapest else {
                    return;
                };
                let bought = match purchase {
                    Purchase::Ball(kind) => self.sim.buy_ball(kind),
                    Purchase::Upgrade(kind) => self.sim.buy_upgrade(kind),
                };
                if !bought {
                    return;
                }
                log::debug!("Auto-bought {purchase:?}");
            }
        }

        fn save(&mut self) {
            if let Err(e) = persistence::save_to(&mut self.store, &self.sim, persistence::now_ms()) {
                log::warn!("Save failed: {e}");
            }
        }

        /// Simulate `seconds` of play, then save
        pub fn run(&mut self, seconds: f32) {
            let frames = (seconds / FRAME_DT).ceil().max(0.0) as u64;
            for _ in 0..frames {
                self.update(FRAME_DT);
            }
            self.save();

            let eco = self.sim.economy();
            log::info!(
                "Session: {} bricks destroyed, {} explosions, {} coins earned",
                self.destroyed,
                self.explosions,
                self.earned.format(2)
            );
            log::info!(
                "Balance {} | balls {} | tier {} | prestige {} | depth {:.0}px",
                eco.balance().format(2),
                self.sim.balls().len(),
                eco.current_tier(),
                eco.prestige_level(),
                self.sim.viewport().y
            );
        }
    }

    pub fn load_config() -> SimConfig {
        let Ok(path) = std::env::var("IDLE_BRICKS_CONFIG") else {
            return SimConfig::default();
        };
        match SimConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default config ({path}: {e})");
                SimConfig::default()
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Idle Bricks (headless) starting...");

    let mut seconds = 300.0_f32;
    let mut auto_buy = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--auto-buy" => auto_buy = true,
            other => match other.parse::<f32>() {
                Ok(s) if s.is_finite() && s >= 0.0 => seconds = s,
                _ => log::warn!("Ignoring argument {other:?}"),
            },
        }
    }

    let save_path =
        std::env::var("IDLE_BRICKS_SAVE").unwrap_or_else(|_| "idle-bricks-save.json".to_string());
    let store = idle_bricks::persistence::FileStore::new(save_path);
    let seed = idle_bricks::persistence::now_ms();

    let mut host = host::Host::new(host::load_config(), store, seed, auto_buy);
    log::info!("Simulating {seconds}s (seed {seed}, auto-buy {auto_buy})");
    host.run(seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded directly on wasm; there is no host binary
}

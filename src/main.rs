//! Scroll Quest entry point
//!
//! Headless native runner: loads a level, drives the simulation with a
//! scripted pilot at a fixed timestep and logs what happens.
//!
//! Usage: `scroll-quest [WORLD LEVEL | LEVEL.json | --generated WIDTH] [--seed N] [--frames N]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;

    use scroll_quest::consts::{MAX_SUBSTEPS, SIM_DT};
    use scroll_quest::sim::{GameEvent, GameState, LevelData, TickInput, tick};
    use scroll_quest::{FlowPhase, Tuning};

    /// Simulated display refresh
    const FRAME_DT: f32 = 1.0 / 144.0;
    const DEFAULT_FRAMES: u32 = 144 * 120;

    struct Options {
        level: LevelSource,
        seed: u64,
        frames: u32,
    }

    enum LevelSource {
        Builtin { world: u32, level: u32 },
        File(String),
        Generated { width: usize },
    }

    fn parse_args() -> Result<Options, Box<dyn Error>> {
        let mut positional = Vec::new();
        let mut seed = 1;
        let mut frames = DEFAULT_FRAMES;
        let mut generated = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => seed = args.next().ok_or("--seed needs a value")?.parse()?,
                "--frames" => frames = args.next().ok_or("--frames needs a value")?.parse()?,
                "--generated" => generated = Some(args.next().ok_or("--generated needs a width")?.parse()?),
                _ => positional.push(arg),
            }
        }

        let level = match (generated, positional.as_slice()) {
            (Some(width), _) => LevelSource::Generated { width },
            (None, []) => LevelSource::Builtin { world: 1, level: 1 },
            (None, [path]) => LevelSource::File(path.clone()),
            (None, [world, level, ..]) => LevelSource::Builtin {
                world: world.parse()?,
                level: level.parse()?,
            },
        };
        Ok(Options { level, seed, frames })
    }

    /// Runs right and hops over whatever is in the way
    #[derive(Default)]
    struct Pilot {
        holding_jump: u32,
        last_x: f32,
        stuck: u32,
    }

    impl Pilot {
        fn next_input(&mut self, state: &GameState) -> TickInput {
            let player = &state.player;
            let x = player.body.position().x;
            if (x - self.last_x).abs() < 0.5 && player.body.grounded {
                self.stuck += 1;
            } else {
                self.stuck = 0;
            }
            self.last_x = x;

            // Jump when blocked, and every so often anyway for enemies
            let wants_jump = self.stuck > 3 || state.time_ticks % 90 == 0;
            if self.holding_jump > 0 {
                self.holding_jump -= 1;
                TickInput {
                    move_right: true,
                    jump_pressed: true,
                    ..Default::default()
                }
            } else if wants_jump && player.body.grounded {
                self.holding_jump = 15;
                TickInput {
                    move_right: true,
                    jump_pressed: true,
                    ..Default::default()
                }
            } else {
                TickInput {
                    move_right: true,
                    jump_released: true,
                    ..Default::default()
                }
            }
        }
    }

    struct Runner {
        state: GameState,
        pilot: Pilot,
        accumulator: f32,
        events: Vec<GameEvent>,
    }

    impl Runner {
        fn new(state: GameState) -> Self {
            Self {
                state,
                pilot: Pilot::default(),
                accumulator: 0.0,
                events: Vec::new(),
            }
        }

        /// Run simulation ticks for one display frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.pilot.next_input(&self.state);
                self.events.extend(tick(&mut self.state, &input, SIM_DT));
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            if self.state.session.phase == FlowPhase::LifeLost {
                log::info!("Lives left: {}, restarting level", self.state.session.lives);
                self.state.restart();
                self.pilot = Pilot::default();
                self.accumulator = 0.0;
            }
        }

        fn finished(&self) -> bool {
            matches!(self.state.session.phase, FlowPhase::LevelCleared | FlowPhase::GameOver)
        }
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        env_logger::init();
        log::info!("Scroll Quest (headless) starting...");

        let options = parse_args()?;
        let tuning = Tuning::load_or_default("tuning.json");
        let level = match &options.level {
            LevelSource::Builtin { world, level } => LevelData::builtin_or_default(*world, *level, options.seed)?,
            LevelSource::File(path) => LevelData::load(path)?,
            LevelSource::Generated { width } => LevelData::generated(*width, options.seed),
        };

        let mut state = GameState::new(level, tuning);
        state.events.subscribe(|e: &GameEvent| match e {
            GameEvent::ScoreAwarded(_) | GameEvent::PlayerJumped => log::debug!("{e:?}"),
            _ => log::info!("{e:?}"),
        });

        let mut runner = Runner::new(state);
        let mut frame = 0;
        while frame < options.frames && !runner.finished() {
            runner.update(FRAME_DT);
            frame += 1;
        }

        let session = &runner.state.session;
        let kills = runner
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EntityDied { .. }))
            .count();
        println!(
            "{}: {:?} after {} ticks | score {} | coins {} | lives {} | {} deaths",
            runner.state.level.name,
            session.phase,
            runner.state.time_ticks,
            session.score,
            session.coins,
            session.lives,
            kills
        );
        log::debug!("final snapshot: {}", runner.state.snapshot_json()?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless runner is native only; the library is the wasm surface
}

//! Simulation module: the fixed-order tick pipeline.
//!
//! The `Simulation` struct owns one match and advances it one tick per
//! [`Simulation::step`]:
//!
//! 1. **INPUT**: Apply the tick's intents (rotate, move, fire, restart, menu)
//! 2. **VISION**: Recompute every living tank's field of view
//! 3. **AI**: Decide, steer and fire for every enemy tank
//! 4. **PLAYER**: Continue a held move in the facing direction
//! 5. **RESOLUTION**: Bullet motion, then wall, tank and base impacts
//! 6. **SWEEP**: Remove everything flagged during the tick
//! 7. **EVALUATE**: Base lost or player dead → enemy wins; no enemies → player wins
//! 8. **ADVANCE**: Increment the tick counter
//!
//! Once a winner is decided the world stops changing until
//! [`Simulation::restart`] or a `Restart` intent.
//!
//! # Determinism
//!
//! All randomness (map generation, spawn positions, AI waypoints and turns)
//! draws from one `ChaCha8Rng` seeded at construction, entities are walked in
//! id order, and time is derived from the tick counter. The same seed, map
//! source and inputs always reproduce the same match.
//!
//! # Example
//!
//! ```
//! use tankbattle_core::event::Winner;
//! use tankbattle_core::input::InputFrame;
//! use tankbattle_core::map::parse;
//! use tankbattle_core::settings::Settings;
//! use tankbattle_core::simulation::{Control, Simulation};
//!
//! let settings = Settings::default();
//! let layout = parse("P", settings.game.wall_size, &settings.playfield()).unwrap();
//!
//! let mut sim = Simulation::new(settings, 42).unwrap();
//! sim.start_match(layout);
//!
//! // No enemies were ever placed, so the player wins on the first tick.
//! assert_eq!(sim.step(&InputFrame::new()), Control::Over(Winner::Player));
//! ```

use std::fmt;
use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, info_span, warn};

use crate::ai::{AiContext, AiEngine, AiState};
use crate::arena::Arena;
use crate::entity::{EntityId, TankComponents, TankKind};
use crate::event::{EventLog, GameEvent, TimedEvent, Winner};
use crate::geometry::Direction;
use crate::input::{InputFrame, Intent};
use crate::map::{self, MapLayout};
use crate::resolver::{default_pipeline, Resolver};
use crate::settings::{Settings, SettingsError};
use crate::snapshot::WorldSnapshot;
use crate::spawn::{place_layout, spawn_roster};
use crate::vision::VisionSystem;

// =============================================================================
// Map source and step result
// =============================================================================

/// Where a match's layout comes from. Restarting replays the same source.
#[derive(Debug, Clone, PartialEq)]
pub enum MapSource {
    /// A fresh procedural map with the settings-driven roster.
    Random,
    /// A fixed layout; its tank spawns are the whole roster.
    Layout(MapLayout),
    /// A map file, read again on every start. Unreadable files fall back to
    /// a random map.
    File(PathBuf),
}

/// What the caller's run loop should do after a step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Control {
    /// The match is in progress.
    Running,
    /// The match has a winner and is frozen.
    Over(Winner),
    /// No match is active (never started, or the player left for the menu).
    Menu,
}

// =============================================================================
// Simulation
// =============================================================================

/// One match of the game plus everything needed to advance it.
///
/// # Ownership
///
/// The simulation owns the arena, the settings, the RNG, the vision and AI
/// state, the resolver list and the event log. Callers interact through
/// [`InputFrame`]s, [`WorldSnapshot`]s and drained [`TimedEvent`]s.
pub struct Simulation {
    settings: Settings,
    arena: Arena,
    rng: ChaCha8Rng,
    seed: u64,
    vision: VisionSystem,
    ai: AiEngine,
    resolvers: Vec<Box<dyn Resolver>>,
    events: EventLog,
    /// Direction the player is holding, if any.
    held: Option<Direction>,
    outcome: Option<Winner>,
    source: MapSource,
    active: bool,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &self.arena)
            .field("seed", &self.seed)
            .field("resolvers", &format!("[{} resolvers]", self.resolvers.len()))
            .field("held", &self.held)
            .field("outcome", &self.outcome)
            .field("source", &self.source)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an idle simulation. Call one of the `start_*` methods to begin
    /// a match.
    ///
    /// # Arguments
    ///
    /// * `settings` - Fully resolved tuning; apply difficulty presets first
    /// * `seed` - Seed for every random draw in the match
    ///
    /// # Errors
    ///
    /// Returns the first problem [`Settings::validate`] finds.
    pub fn new(settings: Settings, seed: u64) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            arena: Arena::new(settings.playfield()),
            settings,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            vision: VisionSystem::new(),
            ai: AiEngine::new(),
            resolvers: default_pipeline(),
            events: EventLog::new(),
            held: None,
            outcome: None,
            source: MapSource::Random,
            active: false,
        })
    }

    /// Starts a match on a procedural map.
    pub fn start_random_match(&mut self) {
        self.start(MapSource::Random);
    }

    /// Starts a match on a fixed layout.
    pub fn start_match(&mut self, layout: MapLayout) {
        self.start(MapSource::Layout(layout));
    }

    /// Starts a match from a map file, falling back to a procedural map if
    /// the file cannot be read or parsed.
    pub fn start_match_from_file(&mut self, path: impl Into<PathBuf>) {
        self.start(MapSource::File(path.into()));
    }

    /// Starts a match from `source`, discarding any match in progress.
    pub fn start(&mut self, source: MapSource) {
        self.arena.clear();
        self.vision.clear();
        self.ai.clear();
        self.events.clear();
        self.held = None;
        self.outcome = None;

        let layout = match &source {
            MapSource::Random => None,
            MapSource::Layout(layout) => Some(layout.clone()),
            MapSource::File(path) => {
                let cell = self.settings.game.wall_size;
                match map::load_file(path, cell, &self.settings.playfield()) {
                    Ok(layout) => Some(layout),
                    Err(error) => {
                        warn!(path = %path.display(), %error, "map unusable; generating a random map");
                        None
                    }
                }
            }
        };

        match layout {
            Some(layout) => {
                place_layout(&mut self.arena, &layout, &self.settings, &mut self.rng);
            }
            None => {
                let layout = map::generate_random(&mut self.rng, &self.settings);
                place_layout(&mut self.arena, &layout, &self.settings, &mut self.rng);
                let report = spawn_roster(&mut self.arena, &self.settings, &mut self.rng);
                for kind in report.skipped {
                    self.events.record(0, GameEvent::SpawnSkipped { kind });
                }
            }
        }

        let tanks = self.arena.tanks().count();
        let walls = self.arena.walls().count();
        info!(seed = self.seed, tanks, walls, "match started");
        self.events.record(0, GameEvent::MatchStarted { tanks, walls });
        self.source = source;
        self.active = true;
    }

    /// Starts the current map source over.
    ///
    /// The RNG is not reseeded, so a random source yields a new map.
    pub fn restart(&mut self) {
        self.start(self.source.clone());
    }

    /// Advances the match by one tick.
    ///
    /// Never fails: blocked moves are vetoed, shots on cooldown are dropped,
    /// and intents for a dead player are ignored.
    pub fn step(&mut self, input: &InputFrame) -> Control {
        let span = info_span!("tick", tick = self.arena.current_tick());
        let _entered = span.enter();

        for intent in input.intents() {
            match intent {
                Intent::Restart => {
                    self.restart();
                    return Control::Running;
                }
                Intent::ReturnToMenu => {
                    info!("returned to menu");
                    self.active = false;
                    return Control::Menu;
                }
                _ if !self.active || self.outcome.is_some() => {}
                other => self.apply_intent(*other),
            }
        }

        if !self.active {
            return Control::Menu;
        }
        if let Some(winner) = self.outcome {
            return Control::Over(winner);
        }

        let tick = self.arena.current_tick();
        let now_ms = self.now_ms();

        self.vision.recompute(&self.arena);
        let mut ctx = AiContext {
            vision: &self.vision,
            settings: &self.settings,
            now_ms,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        self.ai.update(&mut self.arena, &mut ctx);

        if let Some(direction) = self.held {
            if self.player_facing() == Some(direction) {
                self.move_player(direction);
            }
        }

        let had_base = self.arena.base().is_some();
        for resolver in &self.resolvers {
            resolver.resolve(&mut self.arena, &mut self.events);
        }
        self.arena.sweep();

        let winner = if had_base && self.arena.base().is_none() {
            Some(Winner::Enemy)
        } else if self.arena.player().is_none() {
            Some(Winner::Enemy)
        } else if !self.arena.living_tanks().any(|(_, t)| t.kind.is_enemy()) {
            Some(Winner::Player)
        } else {
            None
        };

        self.arena.advance_tick();

        match winner {
            Some(winner) => {
                info!(%winner, tick, "match over");
                self.events.record(tick, GameEvent::MatchOver { winner });
                self.outcome = Some(winner);
                Control::Over(winner)
            }
            None => Control::Running,
        }
    }

    fn apply_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Rotate(direction) => {
                if let Some(tank) = self.player_mut() {
                    tank.rotate(direction);
                }
            }
            Intent::BeginMove(direction) => {
                if let Some(tank) = self.player_mut() {
                    tank.rotate(direction);
                    self.held = Some(direction);
                    self.move_player(direction);
                }
            }
            Intent::EndMove(direction) => {
                if self.held == Some(direction) {
                    self.held = None;
                }
            }
            Intent::Fire => self.fire_player(),
            Intent::Restart | Intent::ReturnToMenu => {}
        }
    }

    fn player_id(&self) -> Option<EntityId> {
        self.arena.player().map(|(id, _)| id)
    }

    fn player_facing(&self) -> Option<Direction> {
        self.arena.player().map(|(_, t)| t.facing)
    }

    fn player_mut(&mut self) -> Option<&mut TankComponents> {
        let id = self.player_id()?;
        self.arena.tank_mut(id)
    }

    /// One player step with the prospective veto.
    fn move_player(&mut self, direction: Direction) {
        let Some(id) = self.player_id() else {
            return;
        };
        let step = direction.step();
        let Some(rect) = self.arena.tank(id).map(|t| t.prospective_rect(step)) else {
            return;
        };
        if self.arena.is_blocked(&rect, Some(id)) {
            return;
        }
        let field = *self.arena.playfield();
        if let Some(tank) = self.arena.tank_mut(id) {
            tank.move_by(step, &field);
        }
    }

    fn fire_player(&mut self) {
        let Some(id) = self.player_id() else {
            return;
        };
        let now_ms = self.now_ms();
        let tick = self.arena.current_tick();
        let size = self.settings.game.bullet_size;
        let speed = self.settings.bullet.speed;
        let shot = self
            .arena
            .tank_mut(id)
            .and_then(|t| t.try_shoot(now_ms, id, size, speed));
        if let Some(bullet) = shot {
            let bullet = self.arena.spawn(bullet);
            self.events.record(tick, GameEvent::BulletFired { bullet, owner: id });
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Read-only copy of everything drawable.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.arena, self.vision.shared_vision_enabled(), self.outcome)
    }

    /// Drains the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<TimedEvent> {
        self.events.take()
    }

    /// Winner of the current match, once decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Winner> {
        self.outcome
    }

    /// True while a match is active and undecided.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.active && self.outcome.is_none()
    }

    /// Current tick of the match.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.arena.current_tick()
    }

    /// Simulated milliseconds at the current tick.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.settings.tick_to_ms(self.arena.current_tick())
    }

    /// The world state.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable world state, for scenario setup.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Visibility as of the last step.
    #[must_use]
    pub const fn vision(&self) -> &VisionSystem {
        &self.vision
    }

    /// AI state of an enemy tank.
    #[must_use]
    pub fn ai_state(&self, id: EntityId) -> Option<&AiState> {
        self.ai.state(id)
    }

    /// Settings the match runs with.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Seed given at construction.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Where the current match's layout came from.
    #[must_use]
    pub const fn source(&self) -> &MapSource {
        &self.source
    }

    /// The current world in layout form, for saving.
    #[must_use]
    pub fn export_layout(&self) -> MapLayout {
        MapLayout::from_arena(&self.arena)
    }

    /// Number of living tanks of a kind.
    #[must_use]
    pub fn count(&self, kind: TankKind) -> usize {
        self.arena.living_tanks().filter(|(_, t)| t.kind == kind).count()
    }

    /// Hash of the world state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.arena.state_hash()
    }
}

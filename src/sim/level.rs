//! Level descriptions
//!
//! Levels are authored as ASCII maps, one character per tile with the first
//! row at the top:
//!
//! | char | meaning |
//! |---|---|
//! | `G` | ground |
//! | `B` | brick |
//! | `P` | pipe (solid like ground) |
//! | `Q` | question block, contents drawn from the level RNG |
//! | `E` / `T` / `F` | goomba / turtle / flower enemy |
//! | `C` / `M` / `S` | coin / mushroom / star |
//! | `Z` | end flag |
//! | `@` | player start |
//!
//! Lower-case letters work the same; anything else is empty space. A JSON
//! level file wraps a layout and can add spawns or pin block contents.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::BlockReward;
use super::collision::Group;
use crate::consts::TILE_SIZE;
use crate::error::LevelError;

/// Tile coordinate; `row` counts up from the bottom of the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub col: usize,
    pub row: usize,
}

impl GridPos {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Ground,
    Brick,
    Pipe,
}

impl TileKind {
    pub fn group(self) -> Group {
        match self {
            TileKind::Ground | TileKind::Pipe => Group::Ground,
            TileKind::Brick => Group::Brick,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub kind: TileKind,
    #[serde(flatten)]
    pub pos: GridPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    Goomba,
    Turtle,
    FlowerEnemy,
    Coin,
    Mushroom,
    Star,
    FireFlower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub kind: SpawnKind,
    #[serde(flatten)]
    pub pos: GridPos,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(flatten)]
    pub pos: GridPos,
    pub reward: Option<BlockReward>,
    #[serde(default = "one")]
    pub uses: u32,
}

/// Everything needed to populate a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    /// Size in tiles
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub tiles: Vec<TileRecord>,
    pub blocks: Vec<BlockRecord>,
    pub spawns: Vec<SpawnRecord>,
    pub flags: Vec<GridPos>,
    pub player_start: GridPos,
}

/// On-disk level file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LevelFile {
    name: String,
    layout: Vec<String>,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    spawns: Vec<SpawnRecord>,
    #[serde(default)]
    blocks: Vec<BlockRecord>,
    #[serde(default)]
    player_start: Option<GridPos>,
}

/// Question block contents: 70% coin, 20% mushroom, 10% star
fn roll_block_reward(rng: &mut Pcg32) -> BlockReward {
    let roll: f32 = rng.random();
    if roll < 0.7 {
        BlockReward::Coin
    } else if roll < 0.9 {
        BlockReward::Mushroom
    } else {
        BlockReward::Star
    }
}

impl LevelData {
    /// Parse an ASCII layout (first row is the top of the level)
    pub fn from_ascii<S: AsRef<str>>(name: &str, rows: &[S], seed: u64) -> Result<Self, LevelError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(LevelError::EmptyLayout);
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut level = LevelData {
            name: name.to_string(),
            width,
            height,
            seed,
            tiles: Vec::new(),
            blocks: Vec::new(),
            spawns: Vec::new(),
            flags: Vec::new(),
            player_start: GridPos::new(3usize.min(width - 1), height.saturating_sub(2)),
        };

        let mut unknown = 0usize;
        for (y, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }

            let row = height - 1 - y;
            for (col, ch) in line.chars().enumerate() {
                let pos = GridPos::new(col, row);
                match ch.to_ascii_uppercase() {
                    'G' => level.tiles.push(TileRecord { kind: TileKind::Ground, pos }),
                    'B' => level.tiles.push(TileRecord { kind: TileKind::Brick, pos }),
                    'P' => level.tiles.push(TileRecord { kind: TileKind::Pipe, pos }),
                    'Q' => level.blocks.push(BlockRecord {
                        pos,
                        reward: Some(roll_block_reward(&mut rng)),
                        uses: 1,
                    }),
                    'E' => level.spawn(SpawnKind::Goomba, pos),
                    'T' => level.spawn(SpawnKind::Turtle, pos),
                    'F' => level.spawn(SpawnKind::FlowerEnemy, pos),
                    'C' => level.spawn(SpawnKind::Coin, pos),
                    'M' => level.spawn(SpawnKind::Mushroom, pos),
                    'S' => level.spawn(SpawnKind::Star, pos),
                    'Z' => level.flags.push(pos),
                    '@' => level.player_start = pos,
                    ' ' | '.' => {}
                    _ => unknown += 1,
                }
            }
        }

        if unknown > 0 {
            log::warn!("Level '{name}': {unknown} unknown tile character(s) treated as empty");
        }
        log::debug!(
            "Parsed level '{name}' ({width}x{height}): {} tiles, {} blocks, {} spawns",
            level.tiles.len(),
            level.blocks.len(),
            level.spawns.len()
        );
        Ok(level)
    }

    fn spawn(&mut self, kind: SpawnKind, pos: GridPos) {
        self.spawns.push(SpawnRecord { kind, pos });
    }

    /// Parse a JSON level file
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json)?;
        let mut level = Self::from_ascii(&file.name, file.layout.as_slice(), file.seed)?;
        level.spawns.extend(file.spawns);
        if let Some(start) = file.player_start {
            level.player_start = start;
        }
        for record in file.blocks {
            match level.blocks.iter_mut().find(|b| b.pos == record.pos) {
                Some(existing) => *existing = record,
                None => level.blocks.push(record),
            }
        }
        Ok(level)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let level = Self::from_json(&text)?;
        log::info!("Loaded level '{}' from {}", level.name, path.display());
        Ok(level)
    }

    /// One of the bundled levels
    pub fn builtin(world: u32, level: u32, seed: u64) -> Result<Self, LevelError> {
        match (world, level) {
            (1, 1) => Self::from_ascii("1-1", LEVEL_1_1, seed),
            (1, 2) => Self::from_ascii("1-2", LEVEL_1_2, seed),
            _ => Err(LevelError::UnknownLevel { world, level }),
        }
    }

    /// A bundled level, or the small test map if there is none
    pub fn builtin_or_default(world: u32, level: u32, seed: u64) -> Result<Self, LevelError> {
        match Self::builtin(world, level, seed) {
            Err(LevelError::UnknownLevel { .. }) => {
                log::warn!("No level {world}-{level}, using the default map");
                Self::default_map(seed)
            }
            other => other,
        }
    }

    pub fn default_map(seed: u64) -> Result<Self, LevelError> {
        Self::from_ascii("default", DEFAULT_MAP, seed)
    }

    /// Procedural strip of ground with pipes, bricks and the odd goomba
    pub fn generated(width: usize, seed: u64) -> Self {
        let width = width.max(8);
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut level = LevelData {
            name: format!("generated-{seed}"),
            width,
            height: 15,
            seed,
            tiles: Vec::new(),
            blocks: Vec::new(),
            spawns: Vec::new(),
            flags: vec![GridPos::new(width - 5, 1)],
            player_start: GridPos::new(3, 13),
        };

        for x in 0..width {
            level.tiles.push(TileRecord {
                kind: TileKind::Ground,
                pos: GridPos::new(x, 0),
            });
            if x % 20 == 10 {
                for row in 1..=2 {
                    level.tiles.push(TileRecord {
                        kind: TileKind::Pipe,
                        pos: GridPos::new(x, row),
                    });
                }
            }
            if x % 5 == 0 && x > 10 {
                level.tiles.push(TileRecord {
                    kind: TileKind::Brick,
                    pos: GridPos::new(x, 4),
                });
            } else if x % 7 == 0 && x > 15 {
                level.blocks.push(BlockRecord {
                    pos: GridPos::new(x, 4),
                    reward: Some(roll_block_reward(&mut rng)),
                    uses: 1,
                });
            }
            if x % 15 == 5 && x > 20 {
                level.spawn(SpawnKind::Goomba, GridPos::new(x, 1));
            }
        }
        level
    }

    pub fn world_width(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn world_height(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }
}

const LEVEL_1_1: &[&str] = &[
    "                                                                                                ",
    "                                                                                                ",
    "                                                                                                ",
    "                            Q     B     Q     B                                                 ",
    "                                                                                                ",
    "                                                            BBBBBBBBBBBBBB                      ",
    "                   Q                                                                            ",
    "                                                                                              Z ",
    "                                                Q                                               ",
    "                                                                                                ",
    "                      E       E                       T      T                                  ",
    "                                          P                                                     ",
    "                                          P                                                     ",
    "GGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
    "GGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
];

const LEVEL_1_2: &[&str] = &[
    "                                                                                                ",
    "                                                                                                ",
    "                 S                                                                              ",
    "                                                                                                ",
    "                       BBBQBBB                                                                  ",
    "         BQBQBQB                                            BBBBBBBBBBBBBB                      ",
    "                                                                                                ",
    "                                                                                              Z ",
    "                                                Q                                               ",
    "                                                                                                ",
    "                      E       E                       T      T      F                           ",
    "                                          P                         P                           ",
    "                                          P           P             P                           ",
    "GGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
    "GGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGG    GGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
];

const DEFAULT_MAP: &[&str] = &[
    "                                                ",
    "                                                ",
    "                                                ",
    "                                                ",
    "                Q   B   Q                       ",
    "                                                ",
    "                                                ",
    "                                              Z ",
    "                                                ",
    "                                                ",
    "        E                   T                   ",
    "                                                ",
    "GGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
    "GGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG",
];

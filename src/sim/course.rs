//! Course assembly
//!
//! One initial segment, `maps_per_biome` segments each of grass, ice and
//! obsidian with a randomly chosen map variant, and a final darkness
//! segment. Segment `i` starts at `i * MAP_WIDTH * TILE_SIZE * TILE_SCALING`.
//! Map geometry comes from a [`MapSource`]; this module only places it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::checkpoint::Checkpoint;
use super::collision::{Hazard, HazardKind, Wall};
use super::rect::Rect;
use crate::consts::{PLAYER_HEIGHT, PLAYER_SPAWN_DROP, SPECTRE_HEIGHT};
use crate::error::SimError;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Init,
    Grass,
    Ice,
    Obsidian,
    Darkness,
}

impl Biome {
    /// Kind given to hazards found in this biome's maps
    pub fn hazard_kind(self) -> HazardKind {
        match self {
            Biome::Ice => HazardKind::Dripstone,
            _ => HazardKind::Static,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    pub biome: Biome,
    /// Map variant (0 for the single-map biomes)
    pub variant: u32,
    pub offset_x: f32,
}

/// Geometry of one map in its own coordinates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentGeometry {
    pub walls: Vec<Wall>,
    pub hazards: Vec<Rect>,
    /// Player spawn marker (initial map only)
    pub player_spawn: Option<Vec2>,
    /// Spectre spawn marker (initial map only)
    pub spectre_spawn: Option<Vec2>,
}

/// Supplies map geometry; implemented by the tilemap loader
pub trait MapSource {
    fn load(&self, biome: Biome, variant: u32) -> Result<SegmentGeometry, SimError>;
}

/// Spectre spawn on the flat map, in tiles left of the course start
const FLAT_SPECTRE_TILES_BEHIND: f32 = 2.0;

/// A flat, hazard-free floor for every map.
///
/// Used by the headless runner and tests.
#[derive(Debug, Clone)]
pub struct FlatMapSource {
    tile: f32,
    width_tiles: u32,
}

impl FlatMapSource {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tile: tuning.world_tile(),
            width_tiles: tuning.map_width,
        }
    }
}

impl MapSource for FlatMapSource {
    fn load(&self, biome: Biome, _variant: u32) -> Result<SegmentGeometry, SimError> {
        let walls = (0..self.width_tiles)
            .map(|i| Wall::checkable(Rect::new(i as f32 * self.tile, 0.0, self.tile, self.tile)))
            .collect();
        let mut geometry = SegmentGeometry {
            walls,
            ..Default::default()
        };
        if biome == Biome::Init {
            let floor = self.tile;
            geometry.player_spawn = Some(Vec2::new(
                self.tile * 6.0,
                floor + PLAYER_HEIGHT / 2.0 + PLAYER_SPAWN_DROP,
            ));
            // starts off screen, far enough back to survive an early hop
            geometry.spectre_spawn = Some(Vec2::new(
                -self.tile * FLAT_SPECTRE_TILES_BEHIND,
                floor + SPECTRE_HEIGHT / 2.0,
            ));
        }
        Ok(geometry)
    }
}

/// Static course data, immutable after generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub segments: Vec<Segment>,
    pub walls: Vec<Wall>,
    pub player_spawn: Vec2,
    pub spectre_spawn: Vec2,
    segment_width: f32,
    maps_per_biome: u32,
}

/// Generated course plus the parts that change during a run
#[derive(Debug, Clone)]
pub struct Layout {
    pub course: Course,
    pub hazards: Vec<Hazard>,
    pub checkpoints: Vec<Checkpoint>,
}

impl Course {
    /// Assemble a course. Same seed and source give the same layout.
    pub fn generate(tuning: &Tuning, source: &dyn MapSource, seed: u64) -> Result<Layout, SimError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let segment_width = tuning.segment_width();
        let mpb = tuning.maps_per_biome;

        let mut plan = vec![(Biome::Init, 0)];
        for (biome, variants) in [
            (Biome::Grass, tuning.grass_variants),
            (Biome::Ice, tuning.ice_variants),
            (Biome::Obsidian, tuning.obsidian_variants),
        ] {
            for _ in 0..mpb {
                plan.push((biome, rng.random_range(1..=variants)));
            }
        }
        plan.push((Biome::Darkness, 0));

        let mut segments = Vec::with_capacity(plan.len());
        let mut walls = Vec::new();
        let mut hazards = Vec::new();
        let mut player_spawn = None;
        let mut spectre_spawn = None;

        for (index, (biome, variant)) in plan.into_iter().enumerate() {
            let offset_x = index as f32 * segment_width;
            debug_assert!(
                segments.last().is_none_or(|s: &Segment| s.offset_x < offset_x),
                "segment offsets must increase"
            );
            let offset = Vec2::new(offset_x, 0.0);
            let geometry = source.load(biome, variant)?;

            walls.extend(geometry.walls.iter().map(|w| Wall {
                rect: w.rect.translated(offset),
                checkable: w.checkable,
            }));
            hazards.extend(
                geometry
                    .hazards
                    .iter()
                    .map(|r| Hazard::new(r.translated(offset), biome.hazard_kind())),
            );
            if index == 0 {
                player_spawn = geometry.player_spawn.map(|p| p + offset);
                spectre_spawn = geometry.spectre_spawn.map(|p| p + offset);
            }
            segments.push(Segment {
                index: index as u32,
                biome,
                variant,
                offset_x,
            });
        }

        let player_spawn = player_spawn.ok_or(SimError::MissingSpawn("player"))?;
        let spectre_spawn = spectre_spawn.ok_or(SimError::MissingSpawn("spectre"))?;

        let checkpoints = place_checkpoints(&walls, &hazards, tuning, &mut rng);

        log::info!(
            "course generated: seed {seed}, {} segments, {} walls, {} hazards, {} checkpoints",
            segments.len(),
            walls.len(),
            hazards.len(),
            checkpoints.len()
        );

        Ok(Layout {
            course: Course {
                segments,
                walls,
                player_spawn: player_spawn - Vec2::new(0.0, PLAYER_SPAWN_DROP),
                spectre_spawn,
                segment_width,
                maps_per_biome: mpb,
            },
            hazards,
            checkpoints,
        })
    }

    #[inline]
    pub fn segment_width(&self) -> f32 {
        self.segment_width
    }

    /// Left edge of segment `index`
    #[inline]
    pub fn boundary(&self, index: u32) -> f32 {
        index as f32 * self.segment_width
    }

    /// Where a biome's first segment starts
    pub fn biome_start(&self, biome: Biome) -> f32 {
        let mpb = self.maps_per_biome;
        let index = match biome {
            Biome::Init => 0,
            Biome::Grass => 1,
            Biome::Ice => mpb + 1,
            Biome::Obsidian => 2 * mpb + 1,
            Biome::Darkness => 3 * mpb + 1,
        };
        self.boundary(index)
    }

    /// End of the initial segment
    pub fn first_boundary(&self) -> f32 {
        self.boundary(1)
    }

    /// Start of the darkness segment; the victory line is measured from here
    pub fn final_boundary(&self) -> f32 {
        self.biome_start(Biome::Darkness)
    }

    /// Decorative clouds and butterflies stop spawning past this x
    pub fn decoration_limit(&self) -> f32 {
        self.boundary(self.maps_per_biome)
    }

    pub fn biome_at(&self, x: f32) -> Biome {
        let index = (x / self.segment_width).floor().max(0.0) as usize;
        self.segments
            .get(index.min(self.segments.len().saturating_sub(1)))
            .map_or(Biome::Init, |s| s.biome)
    }
}

/// Sparse checkpoints on checkable walls past the initial segment
fn place_checkpoints(walls: &[Wall], hazards: &[Hazard], tuning: &Tuning, rng: &mut Pcg32) -> Vec<Checkpoint> {
    let tile = tuning.world_tile();
    let first_boundary = tuning.segment_width();
    let mut checkpoints = Vec::new();
    for wall in walls.iter().filter(|w| w.checkable) {
        let center = wall.rect.center();
        if center.x <= first_boundary {
            continue;
        }
        if !rng.random_bool(tuning.checkpoint_probability) {
            continue;
        }
        let rect = Rect::from_center(center + Vec2::new(0.0, tile), Vec2::splat(tile));
        if hazards.iter().any(|h| h.rect.overlaps(&rect)) {
            continue;
        }
        checkpoints.push(Checkpoint::new(rect));
    }
    checkpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SPECTRE_WIDTH;

    fn small_tuning() -> Tuning {
        Tuning {
            maps_per_biome: 3,
            ..Default::default()
        }
    }

    /// Flat floor with a hazard sitting on every ice tile
    struct SpikedIce(FlatMapSource);

    impl MapSource for SpikedIce {
        fn load(&self, biome: Biome, variant: u32) -> Result<SegmentGeometry, SimError> {
            let mut geometry = self.0.load(biome, variant)?;
            if biome == Biome::Ice {
                geometry.hazards = geometry
                    .walls
                    .iter()
                    .map(|w| w.rect.translated(Vec2::new(0.0, w.rect.height)))
                    .collect();
            }
            Ok(geometry)
        }
    }

    struct NoSpawns;

    impl MapSource for NoSpawns {
        fn load(&self, _biome: Biome, _variant: u32) -> Result<SegmentGeometry, SimError> {
            Ok(SegmentGeometry::default())
        }
    }

    struct Missing;

    impl MapSource for Missing {
        fn load(&self, biome: Biome, variant: u32) -> Result<SegmentGeometry, SimError> {
            Err(SimError::MissingMap { biome, variant })
        }
    }

    #[test]
    fn test_segment_plan() {
        let t = small_tuning();
        let layout = Course::generate(&t, &FlatMapSource::new(&t), 7).unwrap();
        let course = &layout.course;
        assert_eq!(course.segments.len(), 3 * 3 + 2);
        assert_eq!(course.segments[0].biome, Biome::Init);
        assert_eq!(course.segments[1].biome, Biome::Grass);
        assert_eq!(course.segments[4].biome, Biome::Ice);
        assert_eq!(course.segments[7].biome, Biome::Obsidian);
        assert_eq!(course.segments[10].biome, Biome::Darkness);
        for (i, seg) in course.segments.iter().enumerate() {
            assert_eq!(seg.offset_x, i as f32 * 1920.0);
        }
        for seg in &course.segments {
            match seg.biome {
                Biome::Grass => assert!((1..=6).contains(&seg.variant)),
                Biome::Ice | Biome::Obsidian => assert!((1..=3).contains(&seg.variant)),
                _ => assert_eq!(seg.variant, 0),
            }
        }
        assert_eq!(course.final_boundary(), 10.0 * 1920.0);
        assert_eq!(course.biome_start(Biome::Ice), 4.0 * 1920.0);
        assert_eq!(course.biome_at(4.5 * 1920.0), Biome::Ice);
        assert_eq!(course.biome_at(1e9), Biome::Darkness);
    }

    #[test]
    fn test_same_seed_same_course() {
        let t = Tuning {
            checkpoint_probability: 0.2,
            ..small_tuning()
        };
        let source = FlatMapSource::new(&t);
        let a = Course::generate(&t, &source, 42).unwrap();
        let b = Course::generate(&t, &source, 42).unwrap();
        assert_eq!(a.course.segments, b.course.segments);
        assert_eq!(a.checkpoints, b.checkpoints);
        assert!(!a.checkpoints.is_empty());
    }

    #[test]
    fn test_checkpoints_skip_init_and_hazards() {
        let t = Tuning {
            checkpoint_probability: 1.0,
            ..small_tuning()
        };
        let layout = Course::generate(&t, &SpikedIce(FlatMapSource::new(&t)), 3).unwrap();
        let course = &layout.course;
        assert!(!layout.checkpoints.is_empty());
        for cp in &layout.checkpoints {
            let x = cp.rect.center().x;
            assert!(x > course.first_boundary());
            assert_ne!(course.biome_at(x), Biome::Ice);
            assert!(!cp.is_active());
            // one tile above the floor
            assert_eq!(cp.rect.bottom, 64.0);
        }
        assert!(layout.hazards.iter().all(|h| h.kind == HazardKind::Dripstone));
    }

    #[test]
    fn test_spawn_offsets() {
        let t = small_tuning();
        let layout = Course::generate(&t, &FlatMapSource::new(&t), 1).unwrap();
        let spawn = layout.course.player_spawn;
        assert_eq!(spawn.y - PLAYER_HEIGHT / 2.0, 64.0);
        // spectre starts behind the course, well clear of the capture margin
        let spectre = layout.course.spectre_spawn;
        assert_eq!(spectre.x, -128.0);
        assert!(spectre.x + SPECTRE_WIDTH / 2.0 + t.capture_margin < spawn.x - 400.0);
    }

    #[test]
    fn test_missing_spawn_is_error() {
        let t = small_tuning();
        assert!(matches!(
            Course::generate(&t, &NoSpawns, 1),
            Err(SimError::MissingSpawn("player"))
        ));
    }

    #[test]
    fn test_loader_error_propagates() {
        let t = small_tuning();
        assert!(matches!(
            Course::generate(&t, &Missing, 1),
            Err(SimError::MissingMap { biome: Biome::Init, .. })
        ));
    }
}

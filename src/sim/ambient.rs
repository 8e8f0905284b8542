//! Decorative background layer
//!
//! Clouds, butterflies and stars in screen space plus the background
//! colour. Nothing here affects gameplay; it is seeded so runs replay the
//! same way.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::animation::{Animator, ClipId, ClipLibrary, Facing};
use super::course::Biome;
use crate::tuning::Tuning;

pub type Rgb = [u8; 3];

/// Sky over the grass biome
pub const FRESH_AIR: Rgb = [166, 231, 255];
pub const ICE_NIGHT: Rgb = [0, 51, 96];
pub const OBSIDIAN_NIGHT: Rgb = [20, 20, 20];

const CLOUD_SPEED: f32 = -20.0;
const BUTTERFLY_SPEED: f32 = -35.0;
const CLOUD_DROP: f32 = 200.0;
const STAR_MARGIN: f32 = 10.0;
/// On-screen widths of the decorative sprites
const CLOUD_WIDTH: f32 = 256.0;
const BUTTERFLY_WIDTH: f32 = 32.0;
const STAR_WIDTH: f32 = 8.0;

/// `steps` colours from `start` to `end` inclusive, channels truncated
pub fn gradient(start: Rgb, end: Rgb, steps: usize) -> Vec<Rgb> {
    match steps {
        0 => Vec::new(),
        1 => vec![end],
        _ => {
            let span = (steps - 1) as f32;
            (0..steps)
                .map(|i| {
                    let t = i as f32;
                    std::array::from_fn(|c| {
                        let from = f32::from(start[c]);
                        (from + (f32::from(end[c]) - from) * t / span) as u8
                    })
                })
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorKind {
    Cloud { variant: u8 },
    Butterfly { variant: u8 },
    IceStar { scale: u8 },
    /// Blinking star
    ObsidianStar { scale: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorKind,
    /// Centre in screen pixels
    pub pos: Vec2,
    pub vel_x: f32,
    pub width: f32,
    pub animator: Option<Animator>,
}

impl Decoration {
    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.width / 2.0
    }

    fn clip(&self) -> Option<ClipId> {
        match self.kind {
            DecorKind::Butterfly { .. } => Some(ClipId::Butterfly),
            DecorKind::ObsidianStar { .. } => Some(ClipId::StarBlink),
            _ => None,
        }
    }
}

/// Background colour, decorations and the star pools
#[derive(Debug, Clone)]
pub struct Ambient {
    pub background: Rgb,
    pub decorations: Vec<Decoration>,
    ice_stars: Vec<Decoration>,
    obsidian_stars: Vec<Decoration>,
    /// Colours still to apply, next one last
    pending_colours: Vec<Rgb>,
    viewport: Vec2,
    rng: Pcg32,
}

impl Ambient {
    /// Prepare the star pools up front
    pub fn new(tuning: &Tuning, mut rng: Pcg32) -> Self {
        let viewport = Vec2::new(tuning.viewport_width, tuning.viewport_height);
        let ice_stars = (0..tuning.ice_star_count)
            .map(|_| {
                let scale = rng.random_range(1..=3);
                star(DecorKind::IceStar { scale }, random_star_pos(&mut rng, viewport), scale, None)
            })
            .collect();
        let obsidian_stars = (0..tuning.obsidian_star_count)
            .map(|_| {
                let scale = rng.random_range(1..=2);
                let pos = random_star_pos(&mut rng, viewport);
                star(DecorKind::ObsidianStar { scale }, pos, scale, Some(Animator::default()))
            })
            .collect();
        Self {
            background: FRESH_AIR,
            decorations: Vec::new(),
            ice_stars,
            obsidian_stars,
            pending_colours: Vec::new(),
            viewport,
            rng,
        }
    }

    /// New cloud entering at the right screen edge
    pub fn spawn_cloud(&mut self) {
        let variant = self.rng.random_range(1..=3);
        self.decorations.push(Decoration {
            kind: DecorKind::Cloud { variant },
            pos: Vec2::new(self.viewport.x + CLOUD_WIDTH / 2.0, self.viewport.y - CLOUD_DROP),
            vel_x: CLOUD_SPEED,
            width: CLOUD_WIDTH,
            animator: None,
        });
    }

    pub fn spawn_butterfly(&mut self) {
        let variant = self.rng.random_range(1..=3);
        let drop = self.rng.random_range(350..=500) as f32;
        self.decorations.push(Decoration {
            kind: DecorKind::Butterfly { variant },
            pos: Vec2::new(self.viewport.x + BUTTERFLY_WIDTH / 2.0, self.viewport.y - drop),
            vel_x: BUTTERFLY_SPEED,
            width: BUTTERFLY_WIDTH,
            animator: Some(Animator::default()),
        });
    }

    /// Move up to `count` stars of the biome's pool onto the screen.
    ///
    /// An exhausted pool adds nothing. Returns how many were added.
    pub fn add_stars(&mut self, biome: Biome, count: usize) -> usize {
        let pool = match biome {
            Biome::Ice => &mut self.ice_stars,
            Biome::Obsidian => &mut self.obsidian_stars,
            _ => return 0,
        };
        let take = count.min(pool.len());
        let start = pool.len() - take;
        self.decorations.extend(pool.drain(start..).rev());
        take
    }

    pub fn remaining_stars(&self, biome: Biome) -> usize {
        match biome {
            Biome::Ice => self.ice_stars.len(),
            Biome::Obsidian => self.obsidian_stars.len(),
            _ => 0,
        }
    }

    /// Begin a background transition and clear the current decorations.
    ///
    /// The first colour is the current sky, so it is skipped.
    pub fn start_gradient(&mut self, from: Rgb, to: Rgb, steps: usize) {
        let mut colours = gradient(from, to, steps);
        colours.reverse();
        colours.pop();
        self.pending_colours = colours;
        self.decorations.clear();
    }

    /// Apply the next transition colour. False once the transition is done.
    pub fn gradient_step(&mut self) -> bool {
        match self.pending_colours.pop() {
            Some(colour) => {
                self.background = colour;
                true
            }
            None => false,
        }
    }

    /// Scroll and animate decorations, dropping the ones that left the screen
    pub fn update(&mut self, dt: f32, clips: &ClipLibrary) {
        for decoration in &mut self.decorations {
            decoration.pos.x += decoration.vel_x * dt;
            let Some(clip) = decoration.clip() else {
                continue;
            };
            if let (Some(animator), Some(def)) = (decoration.animator.as_mut(), clips.get(clip)) {
                animator.advance(clip, def, Facing::Right, dt);
            }
        }
        self.decorations.retain(|d| d.right() >= 0.0);
    }
}

fn random_star_pos(rng: &mut Pcg32, viewport: Vec2) -> Vec2 {
    Vec2::new(
        rng.random_range(STAR_MARGIN..=viewport.x - STAR_MARGIN),
        rng.random_range(STAR_MARGIN..=viewport.y - STAR_MARGIN),
    )
}

fn star(kind: DecorKind, pos: Vec2, scale: u8, animator: Option<Animator>) -> Decoration {
    Decoration {
        kind,
        pos,
        vel_x: 0.0,
        width: STAR_WIDTH * f32::from(scale),
        animator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn ambient() -> Ambient {
        Ambient::new(&Tuning::default(), Pcg32::seed_from_u64(5))
    }

    #[test]
    fn test_gradient_endpoints() {
        let colours = gradient(FRESH_AIR, ICE_NIGHT, 30);
        assert_eq!(colours.len(), 30);
        assert_eq!(colours[0], FRESH_AIR);
        assert_eq!(colours[29], ICE_NIGHT);
    }

    #[test]
    fn test_gradient_steps_then_stops() {
        let mut a = ambient();
        a.spawn_cloud();
        a.start_gradient(FRESH_AIR, ICE_NIGHT, 30);
        assert!(a.decorations.is_empty());
        let mut steps = 0;
        while a.gradient_step() {
            steps += 1;
        }
        assert_eq!(steps, 29);
        assert_eq!(a.background, ICE_NIGHT);
        assert!(!a.gradient_step());
    }

    #[test]
    fn test_star_pools_exhaust_quietly() {
        let mut a = ambient();
        let mut added = 0;
        for _ in 0..15 {
            added += a.add_stars(Biome::Obsidian, 2);
        }
        assert_eq!(added, 20);
        assert_eq!(a.remaining_stars(Biome::Obsidian), 0);
        assert_eq!(a.add_stars(Biome::Obsidian, 2), 0);
        assert_eq!(a.add_stars(Biome::Grass, 2), 0);
        assert_eq!(a.remaining_stars(Biome::Ice), 100);
    }

    #[test]
    fn test_stars_inside_viewport() {
        let mut a = ambient();
        a.add_stars(Biome::Ice, 100);
        for star in &a.decorations {
            assert!((10.0..=1910.0).contains(&star.pos.x));
            assert!((10.0..=1070.0).contains(&star.pos.y));
        }
    }

    #[test]
    fn test_clouds_drift_off_screen() {
        let mut a = ambient();
        a.spawn_cloud();
        a.spawn_butterfly();
        let clips = ClipLibrary::standard();
        let cloud = a.decorations[0];
        assert_eq!(cloud.pos.y, 880.0);
        assert!((cloud.pos.x - cloud.width / 2.0 - 1920.0).abs() < 1e-3);
        let butterfly = a.decorations[1];
        assert!((580.0..=730.0).contains(&butterfly.pos.y));

        // butterfly needs ~56 s to cross, cloud ~109 s
        for _ in 0..60 {
            a.update(1.0, &clips);
        }
        assert_eq!(a.decorations.len(), 1);
        for _ in 0..60 {
            a.update(1.0, &clips);
        }
        assert!(a.decorations.is_empty());
    }
}

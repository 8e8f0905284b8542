//! Screen fade timing
//!
//! Opacity of a black overlay in `0..=255`. Fading out ramps the overlay up
//! and holds it at full; fading in ramps it down and then clears it. The
//! renderer only reads [`Fade::opacity`].

use serde::{Deserialize, Serialize};

const OPAQUE: f32 = 255.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fade {
    /// Opacity change per second
    pub rate: f32,
    fade_out: Option<f32>,
    fade_in: Option<f32>,
}

impl Fade {
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            fade_out: None,
            fade_in: None,
        }
    }

    /// Start from black and clear up
    pub fn start_fade_in(&mut self) {
        self.fade_in = Some(OPAQUE);
    }

    /// Darken from clear
    pub fn start_fade_out(&mut self) {
        self.fade_out = Some(0.0);
    }

    /// Drop the fade-out overlay so a fade-in can show
    pub fn stop_fade_out(&mut self) {
        self.fade_out = None;
    }

    pub fn update(&mut self, dt: f32) {
        let step = self.rate * dt.max(0.0);
        if let Some(out) = self.fade_out.as_mut() {
            *out = (*out + step).min(OPAQUE);
        }
        if let Some(alpha) = self.fade_in {
            let alpha = alpha - step;
            self.fade_in = (alpha > 0.0).then_some(alpha);
        }
    }

    /// Overlay opacity to draw, 0 when no fade is active
    pub fn opacity(&self) -> f32 {
        self.fade_out.unwrap_or(0.0).max(self.fade_in.unwrap_or(0.0))
    }

    /// A fade-out has reached full black
    pub fn is_black(&self) -> bool {
        self.fade_out.is_some_and(|out| out >= OPAQUE)
    }

    pub fn is_idle(&self) -> bool {
        self.fade_out.is_none() && self.fade_in.is_none()
    }
}

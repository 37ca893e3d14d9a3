// SPDX-License-Identifier: GPL-3.0-only

//! Adaptive framerate override
//!
//! When enabled, every `framerate=<digits>/1` match in a pipeline description
//! is rewritten to the override before the pipeline is built. The match is
//! textual, so `framerate=30000/1001` becomes `framerate=<rate>/1001`.
//! Settings only affect the next pipeline creation.

use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, AtomicI16, Ordering};

// ASCII digits only; `\d` would also match other Unicode digits
static FRAMERATE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"framerate=[0-9]+/1").expect("framerate pattern is valid"));

/// Replace every `framerate=<n>/1` clause with `framerate=<rate>/1`
pub fn rewrite_framerate(description: &str, rate: i16) -> Cow<'_, str> {
    let replacement = format!("framerate={}/1", rate);
    FRAMERATE_CLAUSE.replace_all(description, NoExpand(&replacement))
}

/// Framerate override settings read at pipeline creation
#[derive(Debug, Default)]
pub struct FramerateSettings {
    change: AtomicI16,
    adaptive: AtomicBool,
}

impl FramerateSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target framerate; zero or negative means "no override"
    pub fn set_change(&self, rate: i16) {
        self.change.store(rate, Ordering::SeqCst);
    }

    pub fn set_adaptive(&self, enabled: bool) {
        self.adaptive.store(enabled, Ordering::SeqCst);
    }

    pub fn change(&self) -> i16 {
        self.change.load(Ordering::SeqCst)
    }

    pub fn adaptive(&self) -> bool {
        self.adaptive.load(Ordering::SeqCst)
    }

    /// Apply the override if adaptive mode is on and the rate is positive
    pub fn apply<'a>(&self, description: &'a str) -> Cow<'a, str> {
        let rate = self.change();
        if rate > 0 && self.adaptive() {
            rewrite_framerate(description, rate)
        } else {
            Cow::Borrowed(description)
        }
    }
}

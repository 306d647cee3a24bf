// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-signal transition logic.
//!
//! [`evaluate`] is a pure function: given the configuration and a
//! [`Snapshot`] of one element at the moment a signal arrives, it returns the
//! [`Plan`] of side effects the session must apply. It never touches the DOM,
//! the callback registry, or the subscription itself.
//!
//! # Element states
//!
//! ```text
//!   Attached ──► Visible ⇄ Hidden        (returns = true)
//!   Attached ──► Visible ──► Released    (returns = false)
//!   Attached ──► Hidden  ──► Released    (returns = false, after batch 0)
//! ```
//!
//! `Released` is terminal: the element has been detached and any later
//! signal for it is ignored.

use crate::config::Config;

/// Which side of the threshold a signal landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// `ratio > threshold`.
    Visible,
    /// `ratio <= threshold`.
    Hidden,
}

impl Visibility {
    /// Classifies `ratio` against `threshold`.
    #[must_use]
    pub fn classify(ratio: f64, threshold: f64) -> Self {
        if ratio > threshold {
            Self::Visible
        } else {
            Self::Hidden
        }
    }

    /// Returns `true` for [`Visibility::Visible`].
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }
}

/// Logical state of a watched element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Attached, no signal processed yet.
    #[default]
    Attached,
    /// Last signal was above the threshold.
    Visible,
    /// Last signal was at or below the threshold.
    Hidden,
    /// Detached for good.
    Released,
}

impl ElementState {
    /// Returns the state that follows applying `plan`.
    #[must_use]
    pub const fn after(self, plan: &Plan) -> Self {
        match (self, plan.release, plan.visibility) {
            (Self::Released, _, _) | (_, true, _) => Self::Released,
            (_, false, Visibility::Visible) => Self::Visible,
            (_, false, Visibility::Hidden) => Self::Hidden,
        }
    }
}

/// Everything [`evaluate`] needs to know about one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    /// Intersection ratio carried by the signal.
    pub ratio: f64,
    /// The element carries the loaded marker.
    pub loaded: bool,
    /// A resource swap was started and has not completed yet.
    pub load_pending: bool,
    /// The element names a registered callback and callback mode is on.
    pub dispatch_eligible: bool,
    /// The session has finished its first signal batch.
    pub started: bool,
}

/// Side effects decided for one signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Plan {
    /// Classification of the signal.
    pub visibility: Visibility,
    /// Swap the deferred resource in and arm the completion handler.
    pub begin_load: bool,
    /// Reflect the visibility through classes and the tri-state attribute.
    pub mark: Option<Visibility>,
    /// Dispatch to the element's callback with this `visible` flag.
    pub dispatch: Option<bool>,
    /// Detach the element; terminal.
    pub release: bool,
}

impl Plan {
    const fn idle(visibility: Visibility) -> Self {
        Self {
            visibility,
            begin_load: false,
            mark: None,
            dispatch: None,
            release: false,
        }
    }

    /// Returns `true` if the plan has no side effects.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.begin_load && self.mark.is_none() && self.dispatch.is_none() && !self.release
    }
}

/// Decides the side effects of one signal.
#[must_use]
pub fn evaluate(config: &Config, snapshot: &Snapshot) -> Plan {
    let visibility = Visibility::classify(snapshot.ratio, config.threshold);
    let mut plan = Plan::idle(visibility);

    match visibility {
        Visibility::Visible => {
            plan.begin_load = config.lazy_mode && !snapshot.loaded && !snapshot.load_pending;
            if config.set_class_mode {
                plan.mark = Some(Visibility::Visible);
            }
            if snapshot.dispatch_eligible {
                plan.dispatch = Some(true);
            }
            // One-shot elements are done once they have been seen.
            plan.release = !config.returns;
        }
        Visibility::Hidden if config.returns => {
            if config.set_class_mode {
                plan.mark = Some(Visibility::Hidden);
            }
            if snapshot.dispatch_eligible {
                plan.dispatch = Some(false);
            }
        }
        Visibility::Hidden => {
            // Initial layout can report a transient miss; never release on
            // the first batch.
            plan.release = snapshot.started;
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(ratio: f64) -> Snapshot {
        Snapshot {
            ratio,
            loaded: false,
            load_pending: false,
            dispatch_eligible: false,
            started: true,
        }
    }

    fn config(f: impl FnOnce(&mut Config)) -> Config {
        let mut config = Config::default();
        f(&mut config);
        config
    }

    #[test]
    fn threshold_is_exclusive() {
        let config = Config::default();
        assert_eq!(
            evaluate(&config, &snapshot(0.01)).visibility,
            Visibility::Hidden
        );
        assert_eq!(
            evaluate(&config, &snapshot(0.010_001)).visibility,
            Visibility::Visible
        );
    }

    #[test]
    fn visible_with_all_modes() {
        let config = config(|c| {
            c.lazy_mode = true;
            c.set_class_mode = true;
            c.returns = true;
        });
        let plan = evaluate(
            &config,
            &Snapshot {
                dispatch_eligible: true,
                ..snapshot(0.5)
            },
        );
        assert_eq!(
            plan,
            Plan {
                visibility: Visibility::Visible,
                begin_load: true,
                mark: Some(Visibility::Visible),
                dispatch: Some(true),
                release: false,
            }
        );
    }

    #[test]
    fn one_shot_visible_releases_even_on_first_batch() {
        let plan = evaluate(
            &Config::default(),
            &Snapshot {
                started: false,
                ..snapshot(1.0)
            },
        );
        assert!(plan.release);
        assert_eq!(ElementState::Attached.after(&plan), ElementState::Released);
    }

    #[test]
    fn one_shot_hidden_waits_for_first_batch() {
        let config = Config::default();
        let first = evaluate(
            &config,
            &Snapshot {
                started: false,
                ..snapshot(0.0)
            },
        );
        assert!(first.is_noop());
        assert_eq!(ElementState::Attached.after(&first), ElementState::Hidden);

        let later = evaluate(&config, &snapshot(0.0));
        assert!(later.release);
    }

    #[test]
    fn one_shot_hidden_has_no_class_or_callback_effect() {
        let config = config(|c| c.set_class_mode = true);
        let plan = evaluate(
            &config,
            &Snapshot {
                dispatch_eligible: true,
                ..snapshot(0.0)
            },
        );
        assert_eq!(plan.mark, None);
        assert_eq!(plan.dispatch, None);
        assert!(plan.release);
    }

    #[test]
    fn persistent_hidden_resets_and_dispatches() {
        let config = config(|c| {
            c.returns = true;
            c.set_class_mode = true;
        });
        let plan = evaluate(
            &config,
            &Snapshot {
                dispatch_eligible: true,
                started: false,
                ..snapshot(0.0)
            },
        );
        assert_eq!(plan.mark, Some(Visibility::Hidden));
        assert_eq!(plan.dispatch, Some(false));
        assert!(!plan.release);
    }

    #[test]
    fn load_starts_only_once() {
        let config = config(|c| c.lazy_mode = true);
        let loaded = Snapshot {
            loaded: true,
            ..snapshot(1.0)
        };
        let pending = Snapshot {
            load_pending: true,
            ..snapshot(1.0)
        };
        assert!(evaluate(&config, &snapshot(1.0)).begin_load);
        assert!(!evaluate(&config, &loaded).begin_load);
        assert!(!evaluate(&config, &pending).begin_load);
    }

    #[test]
    fn ineligible_element_never_dispatches() {
        let config = config(|c| c.returns = true);
        assert_eq!(evaluate(&config, &snapshot(1.0)).dispatch, None);
        assert_eq!(evaluate(&config, &snapshot(0.0)).dispatch, None);
    }

    #[test]
    fn released_is_terminal() {
        let plan = Plan::idle(Visibility::Visible);
        assert_eq!(ElementState::Released.after(&plan), ElementState::Released);
    }
}

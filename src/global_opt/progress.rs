//! Optional textual progress indicator.
//!
//! Display only: it never changes what a search evaluates or in which order
//! results are combined.

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Progress display that does nothing unless enabled.
#[cfg(feature = "progress")]
pub(crate) struct Progress {
    bar: Option<ProgressBar>,
}

#[cfg(feature = "progress")]
impl Progress {
    pub(crate) fn new(len: u64, enabled: bool, label: &'static str) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new(len);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len} ({eta})")
            {
                bar.set_style(style);
            }
            bar.set_message(label);
            bar
        });
        Self { bar }
    }

    pub(crate) fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(not(feature = "progress"))]
pub(crate) struct Progress;

#[cfg(not(feature = "progress"))]
impl Progress {
    pub(crate) fn new(_len: u64, _enabled: bool, _label: &'static str) -> Self {
        Progress
    }

    pub(crate) fn inc(&self) {}

    pub(crate) fn finish(&self) {}
}

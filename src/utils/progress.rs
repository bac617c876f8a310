//! Spinner shown while a directory is walked.
//!
//! Draws through `indicatif` when the `progress` feature is on. Without the
//! feature, or when disabled at runtime, every call does nothing.

pub struct Spinner {
    #[cfg(feature = "progress")]
    bar: Option<indicatif::ProgressBar>,
}

#[cfg(feature = "progress")]
impl Spinner {
    pub fn start(enabled: bool, message: String) -> Self {
        let bar = enabled.then(|| {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")
            {
                bar.set_style(style);
            }
            bar.set_message(message);
            bar.enable_steady_tick(std::time::Duration::from_millis(80));
            bar
        });
        Spinner { bar }
    }

    /// Replace the message; `message` is only built when something is drawn.
    pub fn update(&self, message: impl FnOnce() -> String) {
        if let Some(bar) = &self.bar {
            bar.set_message(message());
        }
    }

    pub fn finish(self, message: impl FnOnce() -> String) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(message());
        }
    }
}

#[cfg(not(feature = "progress"))]
impl Spinner {
    pub fn start(_enabled: bool, _message: String) -> Self {
        Spinner {}
    }

    pub fn update(&self, _message: impl FnOnce() -> String) {}

    pub fn finish(self, _message: impl FnOnce() -> String) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_never_formats() {
        let spinner = Spinner::start(false, "walking".into());
        spinner.update(|| panic!("message built for a hidden spinner"));
        spinner.finish(|| panic!("message built for a hidden spinner"));
    }
}

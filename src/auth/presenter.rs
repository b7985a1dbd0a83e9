//! How the device code reaches the operator.
//!
//! [`select_presenter`] probes the platform once; the flow controller only
//! talks to the [`Presenter`] trait.

use std::io::{BufRead, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use super::device_code::DeviceAuthorization;
use super::error::AuthError;

/// Operator-facing side of the device-code login.
pub trait Presenter: Send + Sync {
    /// Show the user code and verification URL; may block on the operator.
    fn present(&self, authorization: &DeviceAuthorization) -> Result<(), AuthError>;

    /// Called before each token poll.
    fn poll_started(&self, _attempt: u32) {}

    /// Called once polling stops, whatever the outcome.
    fn finished(&self) {}

    /// Non-fatal problem the operator should know about.
    fn warn(&self, message: &str);
}

/// Pick the presenter for this platform. Browser opening is only attempted on
/// Linux and macOS, and only when `open_browser` is set.
pub fn select_presenter(open_browser: bool) -> Arc<dyn Presenter> {
    let opener = match std::env::consts::OS {
        "linux" => Some("xdg-open"),
        "macos" => Some("open"),
        _ => None,
    };
    match opener {
        Some(opener) if open_browser => Arc::new(BrowserPresenter::new(opener)),
        _ => Arc::new(PrintPresenter::new()),
    }
}

fn print_code(authorization: &DeviceAuthorization) {
    println!(
        "We need to authenticate you through a browser. Verify code shown is {}",
        authorization.user_code
    );
}

fn print_url(url: &str) {
    println!("To continue authentication, open this url in a browser: {url}");
}

/// Native-open variant: waits for Enter, then hands the URL to the desktop opener.
pub struct BrowserPresenter {
    opener: &'static str,
    progress: PollProgress,
}

impl BrowserPresenter {
    pub fn new(opener: &'static str) -> Self {
        Self {
            opener,
            progress: PollProgress::default(),
        }
    }

    fn wait_for_key_press() -> Result<(), AuthError> {
        println!("Press Enter to open a browser");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}

impl Presenter for BrowserPresenter {
    fn present(&self, authorization: &DeviceAuthorization) -> Result<(), AuthError> {
        print_code(authorization);
        Self::wait_for_key_press()?;
        let spawned = Command::new(self.opener)
            .arg(&authorization.verification_uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => debug!(opener = self.opener, "Opened verification URL"),
            Err(err) => {
                self.warn(&format!("unable to launch {}: {err}", self.opener));
                print_url(&authorization.verification_uri);
            }
        }
        Ok(())
    }

    fn poll_started(&self, attempt: u32) {
        self.progress.tick(attempt);
    }

    fn finished(&self) {
        self.progress.finish();
    }

    fn warn(&self, message: &str) {
        self.progress.warn(message);
    }
}

/// Print-only variant: never blocks, the operator opens the URL themselves.
#[derive(Default)]
pub struct PrintPresenter {
    progress: PollProgress,
}

impl PrintPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for PrintPresenter {
    fn present(&self, authorization: &DeviceAuthorization) -> Result<(), AuthError> {
        print_code(authorization);
        print_url(&authorization.verification_uri);
        Ok(())
    }

    fn poll_started(&self, attempt: u32) {
        self.progress.tick(attempt);
    }

    fn finished(&self) {
        self.progress.finish();
    }

    fn warn(&self, message: &str) {
        self.progress.warn(message);
    }
}

/// Spinner on stderr while the token endpoint is polled; created on first tick.
#[derive(Default)]
struct PollProgress {
    bar: OnceLock<ProgressBar>,
}

impl PollProgress {
    fn bar(&self) -> &ProgressBar {
        self.bar.get_or_init(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        })
    }

    fn tick(&self, attempt: u32) {
        self.bar()
            .set_message(format!("Waiting for browser confirmation (poll {attempt})"));
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.get() {
            bar.finish_and_clear();
        }
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
        let line = format!("WARNING: {message}");
        match self.bar.get() {
            Some(bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }
}

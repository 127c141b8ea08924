// SPDX-License-Identifier: GPL-3.0-only

//! Cooperative session scheduling
//!
//! A single-threaded, self-rescheduling loop drives the whole
//! appliance: one timer chain polls the trigger input, another keeps
//! credentials fresh. A tick re-arms its timer only after its body has
//! completed, so execution time extends the effective period; the
//! appliance accepts that drift. The single-flight guard guarantees
//! that no two capture sessions ever overlap; triggers arriving while
//! one is in flight are dropped, not queued.

use crate::auth::CredentialRefreshLoop;
use crate::config::Config;
use crate::hardware::{Camera, CloudService, PreviewScreen, Printer, TriggerCode, TriggerInput};
use crate::persist::PersistenceRouter;
use crate::session::{CaptureMode, CaptureSession, SessionContext, SessionState};
use crate::status::StatusLine;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Single boolean permit serializing capture sessions
///
/// Owned by the scheduler; the scheduler guarantees release on every
/// session exit path, including panics.
#[derive(Debug, Default)]
pub struct SingleFlightGuard {
    held: bool,
}

impl SingleFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit; false when a session already holds it
    pub fn try_acquire(&mut self) -> bool {
        if self.held {
            return false;
        }
        self.held = true;
        true
    }

    /// Return the permit; always succeeds
    pub fn release(&mut self) {
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

/// Cancellable repeating timer deadline for one chain
#[derive(Debug)]
pub struct RepeatingTimer {
    period: Duration,
    next: Instant,
    cancelled: bool,
}

impl RepeatingTimer {
    pub fn new(period: Duration) -> Self {
        Self::with_initial_delay(period, period)
    }

    /// First firing after `initial`, then every `period`
    pub fn with_initial_delay(initial: Duration, period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + initial,
            cancelled: false,
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        !self.cancelled && now >= self.next
    }

    /// Schedule the next firing relative to `now`; callers invoke this
    /// after the tick body, which is what makes the chain
    /// self-rescheduling
    pub fn rearm(&mut self, now: Instant) {
        self.next = now + self.period;
    }

    /// Stop the chain; safe to call twice
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Next firing instant, None once cancelled
    pub fn deadline(&self) -> Option<Instant> {
        (!self.cancelled).then_some(self.next)
    }
}

/// The appliance's one control loop
pub struct SessionScheduler {
    config: Config,
    guard: SingleFlightGuard,
    poll_timer: RepeatingTimer,
    refresh_timer: RepeatingTimer,
    input: Box<dyn TriggerInput>,
    camera: Box<dyn Camera>,
    cloud: Box<dyn CloudService>,
    preview: Box<dyn PreviewScreen>,
    printer: Box<dyn Printer>,
    router: PersistenceRouter,
    credentials: CredentialRefreshLoop,
    status: StatusLine,
    selected_effect: String,
    last_picture: Option<(PathBuf, String)>,
    stop: Arc<AtomicBool>,
    shut_down: bool,
}

impl SessionScheduler {
    pub fn new(
        config: Config,
        input: Box<dyn TriggerInput>,
        camera: Box<dyn Camera>,
        cloud: Box<dyn CloudService>,
        preview: Box<dyn PreviewScreen>,
        printer: Box<dyn Printer>,
        status: StatusLine,
    ) -> Self {
        let poll_period = Duration::from_millis(config.poll_period_ms);
        let refresh_period = Duration::from_millis(config.oauth_refresh_period_ms);
        let router = PersistenceRouter::from_config(&config);
        let credentials = CredentialRefreshLoop::new(config.cloud_enabled());

        Self {
            poll_timer: RepeatingTimer::new(poll_period),
            // first refresh right after startup, full period afterwards
            refresh_timer: RepeatingTimer::with_initial_delay(poll_period, refresh_period),
            guard: SingleFlightGuard::new(),
            input,
            camera,
            cloud,
            preview,
            printer,
            router,
            credentials,
            status,
            selected_effect: "none".to_string(),
            last_picture: None,
            stop: Arc::new(AtomicBool::new(false)),
            shut_down: false,
            config,
        }
    }

    /// Flag observed by the loop; shared with the signal handler
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Select a builtin image effect for the next session
    pub fn select_effect(&mut self, effect: &str) {
        self.selected_effect = effect.to_string();
    }

    /// Final location and title of the most recent picture
    pub fn last_picture(&self) -> Option<&(PathBuf, String)> {
        self.last_picture.as_ref()
    }

    /// Run both timer chains until stopped, then shut down
    pub async fn run(&mut self) {
        info!(
            poll_ms = self.config.poll_period_ms,
            refresh_ms = self.config.oauth_refresh_period_ms,
            "Scheduler started"
        );

        while !self.stop.load(Ordering::SeqCst) {
            let Some(deadline) = self.next_deadline() else {
                break;
            };

            let now = Instant::now();
            if deadline > now {
                tokio::time::sleep(deadline - now).await;
            }

            let now = Instant::now();
            if self.poll_timer.due(now) {
                self.poll_tick();
                self.poll_timer.rearm(Instant::now());
            }
            if self.refresh_timer.due(now) {
                self.refresh_tick();
                self.refresh_timer.rearm(Instant::now());
            }
        }

        self.shutdown();
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.poll_timer.deadline(), self.refresh_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// One input poll: map a recognized trigger to a session
    pub fn poll_tick(&mut self) {
        let mode = match self.input.state() {
            TriggerCode::None => return,
            TriggerCode::Single => CaptureMode::Single,
            TriggerCode::Collage => CaptureMode::Collage {
                shots: self.config.collage_shots,
            },
        };
        self.try_begin_session(mode);
    }

    /// One credential refresh attempt; the chain re-arms regardless
    pub fn refresh_tick(&mut self) {
        self.credentials.tick(self.cloud.as_mut());
    }

    /// Start a session if the permit is free; a held permit drops the
    /// trigger. Returns whether a session ran.
    pub fn try_begin_session(&mut self, mode: CaptureMode) -> bool {
        if !self.guard.try_acquire() {
            // capture in progress: no queueing, no error
            debug!(mode = mode.name(), "Trigger dropped, session in flight");
            return false;
        }

        let mut session = CaptureSession::new(mode);
        let mut ctx = SessionContext {
            camera: self.camera.as_mut(),
            cloud: self.cloud.as_mut(),
            preview: self.preview.as_mut(),
            router: &self.router,
            status: &self.status,
            config: &self.config,
            signed_in: self.credentials.signed_in(),
            effect: &self.selected_effect,
        };

        // a panicking session must not leak the permit or unwind into
        // the timer loop
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| session.run(&mut ctx)));
        drop(ctx);

        match outcome {
            Ok(SessionState::Done) => {
                if let Some(output) = session.output_file() {
                    self.last_picture = Some((output.to_path_buf(), session.title()));
                }
            }
            Ok(state) => {
                debug!(state = ?state, "Session ended without a picture");
            }
            Err(_) => {
                error!("Capture session panicked");
                self.status.set("Snap failed :(");
            }
        }

        // effect selection never outlives a session
        if self.selected_effect != "none" {
            self.selected_effect = "none".to_string();
            if let Err(e) = self.camera.set_effect("none") {
                warn!(error = %e, "Cannot reset image effect");
            }
        }

        self.guard.release();
        true
    }

    /// Email the most recent picture; no-op until one exists
    pub fn dispatch_email(&mut self, to: &str, consent: bool) {
        if !self.config.enable_email {
            return;
        }
        if !self.credentials.signed_in() {
            error!("Not signed in, cannot send email");
            self.status.set("Send failed :(");
            return;
        }
        let Some((file, _)) = self.last_picture.clone() else {
            warn!("No picture to send yet");
            return;
        };

        self.status.set("Sending Email");
        if self.router.send_email(self.cloud.as_mut(), to, &file, consent) {
            self.status.clear();
        } else {
            self.status.set("Send failed :(");
        }
    }

    /// Print the most recent picture, fire-and-forget
    pub fn dispatch_print(&mut self) {
        if !self.config.enable_print {
            return;
        }
        let Some((file, title)) = self.last_picture.clone() else {
            warn!("No picture to print yet");
            return;
        };
        self.router.print(self.printer.as_mut(), &file, &title);
    }

    /// Cancel every timer chain, then release the camera. Idempotent;
    /// the camera is never touched while a chain is still armed.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        info!("Shutting down scheduler");
        self.poll_timer.cancel();
        self.refresh_timer.cancel();

        self.camera.stop_preview();
        self.preview.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::fake::{FakeButtons, FakeCamera, FakeCloud, FakePreview, FakePrinter};

    fn test_scheduler(config: Config, buttons: FakeButtons) -> SessionScheduler {
        SessionScheduler::new(
            config,
            Box::new(buttons),
            Box::new(FakeCamera::new()),
            Box::new(FakeCloud::new()),
            Box::new(FakePreview::default()),
            Box::new(FakePrinter::default()),
            StatusLine::new(),
        )
    }

    fn quick_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.countdown_seconds = 0;
        config.enable_upload = false;
        config.enable_email = false;
        config.work_dir = dir.join("work");
        config.archive_dir = dir.join("archive");
        config
    }

    #[test]
    fn test_guard_single_permit() {
        let mut guard = SingleFlightGuard::new();
        assert!(guard.try_acquire());
        assert!(guard.is_held());
        assert!(!guard.try_acquire());

        guard.release();
        assert!(guard.try_acquire());

        // release always succeeds, even when not held
        guard.release();
        guard.release();
        assert!(!guard.is_held());
    }

    #[test]
    fn test_timer_due_rearm_cancel() {
        let mut timer = RepeatingTimer::new(Duration::from_millis(50));
        let start = Instant::now();
        assert!(!timer.due(start));
        assert!(timer.due(start + Duration::from_millis(60)));

        timer.rearm(start + Duration::from_millis(60));
        assert!(!timer.due(start + Duration::from_millis(100)));
        assert!(timer.due(start + Duration::from_millis(120)));

        timer.cancel();
        timer.cancel(); // idempotent
        assert!(timer.is_cancelled());
        assert!(!timer.due(start + Duration::from_secs(10)));
        assert!(timer.deadline().is_none());
    }

    #[test]
    fn test_trigger_dropped_while_guard_held() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("archive")).unwrap();
        let mut buttons = FakeButtons::new(true);
        buttons.push(TriggerCode::Single);
        let mut scheduler = test_scheduler(quick_config(dir.path()), buttons);

        // simulate a session in flight
        assert!(scheduler.guard.try_acquire());
        scheduler.poll_tick();

        // the trigger was consumed but no session ran
        assert!(std::fs::read_dir(dir.path().join("archive")).unwrap().next().is_none());
        assert!(scheduler.guard.is_held());

        // once released, the next trigger goes through
        scheduler.guard.release();
        assert!(scheduler.try_begin_session(CaptureMode::Single));
        assert!(!scheduler.guard.is_held());
        assert_eq!(
            std::fs::read_dir(dir.path().join("archive")).unwrap().count(),
            1
        );
    }

    #[test]
    fn test_session_completion_records_last_picture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("archive")).unwrap();
        let mut scheduler = test_scheduler(quick_config(dir.path()), FakeButtons::new(true));

        assert!(scheduler.last_picture().is_none());
        assert!(scheduler.try_begin_session(CaptureMode::Single));

        let (file, _title) = scheduler.last_picture().unwrap();
        assert!(file.starts_with(dir.path().join("archive")));
        assert!(file.exists());
    }

    #[test]
    fn test_shutdown_cancels_timers_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut scheduler = test_scheduler(quick_config(dir.path()), FakeButtons::new(true));

        scheduler.shutdown();
        assert!(scheduler.poll_timer.is_cancelled());
        assert!(scheduler.refresh_timer.is_cancelled());
        assert!(scheduler.next_deadline().is_none());

        scheduler.shutdown(); // safe to call twice
    }

    #[test]
    fn test_effect_selection_resets_after_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("archive")).unwrap();
        let mut config = quick_config(dir.path());
        config.enable_effects = true;
        let mut scheduler = test_scheduler(config, FakeButtons::new(true));

        scheduler.select_effect("negative");
        assert!(scheduler.try_begin_session(CaptureMode::Single));
        assert_eq!(scheduler.selected_effect, "none");
    }

    #[test]
    fn test_dispatch_email_audits_last_picture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("archive")).unwrap();
        let mut config = quick_config(dir.path());
        config.enable_email = true;
        config.enable_email_logging = true;
        config.audit_log_file = dir.path().join("sendmail.log");
        let mut scheduler = test_scheduler(config, FakeButtons::new(true));

        // sign in, take a picture, then send it
        scheduler.refresh_tick();
        assert!(scheduler.try_begin_session(CaptureMode::Single));
        scheduler.dispatch_email("guest@example.org", true);

        assert_eq!(scheduler.status.get(), "");
        let log = std::fs::read_to_string(dir.path().join("sendmail.log")).unwrap();
        assert!(log.contains("(*) guest@example.org"));
    }

    #[test]
    fn test_dispatch_email_without_picture_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());
        config.enable_email = true;
        config.audit_log_file = dir.path().join("sendmail.log");
        let mut scheduler = test_scheduler(config, FakeButtons::new(true));

        scheduler.refresh_tick();
        scheduler.dispatch_email("guest@example.org", true);
        assert!(!dir.path().join("sendmail.log").exists());
    }

    #[tokio::test]
    async fn test_run_exits_on_stop_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());
        config.poll_period_ms = 5;
        let mut scheduler = test_scheduler(config, FakeButtons::new(true));

        let stop = scheduler.stop_handle();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(40));
            stop.store(true, Ordering::SeqCst);
        });

        scheduler.run().await;
        assert!(scheduler.shut_down);
        assert!(scheduler.poll_timer.is_cancelled());
    }
}

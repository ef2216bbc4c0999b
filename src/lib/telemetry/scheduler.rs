use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    settings::manager::{SleepSettings, TelemetrySettings},
    telemetry::{frame::Frame, monitor::Pipeline},
    transport::{self, SerialLink, Transport},
};

/// Daily quiet-hours window. The interval may wrap past midnight, e.g.
/// 22:00 to 06:00.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ScheduleWindow {
    /// Build the window from the stored settings. Returns `None` when quiet
    /// hours are disabled: either explicitly (start equals end) or because a
    /// time string does not parse, in which case monitoring simply runs
    /// around the clock instead of failing.
    pub fn from_settings(sleep: &SleepSettings) -> Option<Self> {
        if sleep.start == sleep.end {
            return None;
        }

        let start = match NaiveTime::parse_from_str(&sleep.start, "%H:%M") {
            Ok(time) => time,
            Err(error) => {
                warn!(
                    "Invalid sleep start {:?}, disabling quiet hours: {error}",
                    sleep.start
                );
                return None;
            }
        };
        let end = match NaiveTime::parse_from_str(&sleep.end, "%H:%M") {
            Ok(time) => time,
            Err(error) => {
                warn!(
                    "Invalid sleep end {:?}, disabling quiet hours: {error}",
                    sleep.end
                );
                return None;
            }
        };

        Some(Self { start, end })
    }

    /// Next instant the quiet window opens, strictly after `now`.
    pub fn next_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        next_occurrence(now, self.start)
    }

    /// Next instant the quiet window closes, strictly after `now`.
    pub fn next_end(&self, now: NaiveDateTime) -> NaiveDateTime {
        next_occurrence(now, self.end)
    }

    /// Whether `now` lies inside the quiet window. With both instants
    /// advanced past `now`, being inside the window is equivalent to the
    /// close coming up sooner than the open, which holds uniformly for
    /// windows that wrap past midnight.
    pub fn is_sleep_time(&self, now: NaiveDateTime) -> bool {
        self.next_end(now) < self.next_start(now)
    }
}

/// Today's occurrence of `time`, pushed one day forward while it is not
/// strictly in the future.
fn next_occurrence(now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let candidate = now.date().and_time(time);
    if candidate <= now {
        candidate + Duration::days(1)
    } else {
        candidate
    }
}

/// Two-state timer chain driving the monitoring pipeline through the daily
/// quiet-hours cycle. Owns the pipeline incarnation of the moment; cancelling
/// the scheduler tears that pipeline down before the task finishes.
pub struct SleepScheduler {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl SleepScheduler {
    pub fn start(settings: TelemetrySettings, transport: Box<dyn Transport>) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(settings, transport, cancel.clone()));
        Self { cancel, handle }
    }

    /// Cancel the armed timer and whatever pipeline the scheduler currently
    /// owns, waiting until both are fully gone.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(error) = self.handle.await {
            warn!("Sleep scheduler task failed to join: {error:?}");
        }
    }
}

async fn run(settings: TelemetrySettings, transport: Box<dyn Transport>, cancel: CancellationToken) {
    let Some(window) = ScheduleWindow::from_settings(&settings.sleep) else {
        info!("Quiet hours disabled, monitoring runs until stopped");
        let pipeline = Pipeline::start(settings, transport, &cancel);
        cancel.cancelled().await;
        pipeline.shutdown().await;
        return;
    };

    let mut asleep = window.is_sleep_time(Local::now().naive_local());
    let mut pipeline = if asleep {
        // Started inside the quiet window: dim the display and drop the
        // connection until the window closes
        let mut transport = transport;
        if let Err(error) =
            transport.write_frame(&Frame::Brightness(settings.sleep.sleep_brightness).encode())
        {
            warn!("Failed to dim the display: {error}");
        }
        info!("Inside the sleep window, display dimmed and monitoring postponed");
        None
    } else {
        Some(Pipeline::start(settings.clone(), transport, &cancel))
    };

    loop {
        let now = Local::now().naive_local();
        let deadline = if asleep {
            window.next_end(now)
        } else {
            window.next_start(now)
        };
        let wait = (deadline - now).to_std().unwrap_or_default();
        info!(
            "Next sleep {} at {deadline}",
            if asleep { "end" } else { "start" }
        );

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        if asleep {
            info!("Sleep window over, reconnecting the display and restarting monitoring");
            pipeline = connect_pipeline(&settings, &cancel).await;
            asleep = false;
        } else {
            info!("Sleep window begins, dimming the display and stopping monitoring");
            if let Some(active) = pipeline.take() {
                active
                    .set_brightness(settings.sleep.sleep_brightness)
                    .await;
                active.shutdown().await;
            }
            asleep = true;
        }
    }

    if let Some(active) = pipeline.take() {
        active.shutdown().await;
    }
}

/// Reopen the serial link and start a fresh pipeline incarnation on it.
/// Failure is not fatal: the scheduler stays up and retries at the next
/// wake transition, or earlier through a configuration update.
async fn connect_pipeline(
    settings: &TelemetrySettings,
    cancel: &CancellationToken,
) -> Option<Pipeline> {
    match SerialLink::connect(&settings.serial) {
        Ok(link) => {
            tokio::time::sleep(transport::SETTLE_DELAY).await;
            Some(Pipeline::start(settings.clone(), Box::new(link), cancel))
        }
        Err(error) => {
            error!("Failed to reconnect the display after the sleep window: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: &str, end: &str) -> ScheduleWindow {
        ScheduleWindow::from_settings(&SleepSettings {
            start: start.to_string(),
            end: end.to_string(),
            normal_brightness: 80,
            sleep_brightness: 10,
        })
        .unwrap()
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")
            .unwrap()
    }

    #[test]
    fn degenerate_window_disables_quiet_hours() {
        let sleep = SleepSettings {
            start: "07:30".to_string(),
            end: "07:30".to_string(),
            normal_brightness: 80,
            sleep_brightness: 10,
        };
        assert_eq!(ScheduleWindow::from_settings(&sleep), None);
    }

    #[test]
    fn malformed_times_disable_quiet_hours() {
        let sleep = SleepSettings {
            start: "25:99".to_string(),
            end: "06:00".to_string(),
            normal_brightness: 80,
            sleep_brightness: 10,
        };
        assert_eq!(ScheduleWindow::from_settings(&sleep), None);

        let sleep = SleepSettings {
            start: "22:00".to_string(),
            end: "potato".to_string(),
            normal_brightness: 80,
            sleep_brightness: 10,
        };
        assert_eq!(ScheduleWindow::from_settings(&sleep), None);
    }

    #[test]
    fn instants_always_lie_ahead() {
        let now = at("2024-05-14", "23:00");
        let window = window("22:00", "06:00");

        assert_eq!(window.next_start(now), at("2024-05-15", "22:00"));
        assert_eq!(window.next_end(now), at("2024-05-15", "06:00"));
    }

    #[test]
    fn inside_wrapping_window_is_sleep_time() {
        let window = window("22:00", "06:00");

        // Late evening, inside the window: wake at the coming 06:00
        let now = at("2024-05-14", "23:00");
        assert!(window.is_sleep_time(now));
        assert_eq!(window.next_end(now), at("2024-05-15", "06:00"));

        // Early morning, still inside
        assert!(window.is_sleep_time(at("2024-05-14", "03:00")));

        // Daytime, outside
        assert!(!window.is_sleep_time(at("2024-05-14", "12:00")));
        assert!(!window.is_sleep_time(at("2024-05-14", "21:59")));

        // The window is closed-open: asleep exactly at start, awake at end
        assert!(window.is_sleep_time(at("2024-05-14", "22:00")));
        assert!(!window.is_sleep_time(at("2024-05-14", "06:00")));
    }

    #[test]
    fn non_wrapping_window() {
        let window = window("01:00", "06:00");

        assert!(window.is_sleep_time(at("2024-05-14", "03:00")));
        assert!(!window.is_sleep_time(at("2024-05-14", "00:30")));
        assert!(!window.is_sleep_time(at("2024-05-14", "07:00")));
        assert_eq!(
            window.next_end(at("2024-05-14", "03:00")),
            at("2024-05-14", "06:00")
        );
    }
}

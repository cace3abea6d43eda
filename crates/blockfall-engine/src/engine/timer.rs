use std::time::Duration;

/// Shortest period a periodic timer will run at.
///
/// Keeps a fully decayed gravity interval from firing infinitely often
/// within one [`Scheduler::pop_due`] sweep.
pub const MIN_PERIOD: Duration = Duration::from_nanos(1);

/// Token identifying one arming of a timer.
///
/// Re-arming or cancelling a timer invalidates the previous token, so a
/// handler can recognise a callback that belongs to an earlier arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A timer callback that has come due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The periodic gravity timer fired.
    Gravity(TimerId),
    /// The one-shot line-clear settle delay elapsed.
    LineClear(TimerId),
}

#[derive(Debug, Clone, Copy)]
struct PeriodicTimer {
    id: TimerId,
    period: Duration,
    next_due: Duration,
}

#[derive(Debug, Clone, Copy)]
struct OneShotTimer {
    id: TimerId,
    due: Duration,
}

/// Virtual-time scheduler for the two timers a session needs: periodic
/// gravity and the one-shot line-clear delay.
///
/// Time only moves when the owner calls [`Scheduler::pop_due`] or
/// [`Scheduler::advance_to`], which lets the host drive it from any real
/// clock (a frame loop, an interval timer, a test).
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::{Scheduler, TimerEvent};
///
/// let mut scheduler = Scheduler::new();
/// let gravity = scheduler.arm_gravity(Duration::from_millis(100));
///
/// let deadline = Duration::from_millis(250);
/// assert_eq!(scheduler.pop_due(deadline), Some(TimerEvent::Gravity(gravity)));
/// assert_eq!(scheduler.pop_due(deadline), Some(TimerEvent::Gravity(gravity)));
/// assert_eq!(scheduler.pop_due(deadline), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: Duration,
    last_id: u64,
    gravity: Option<PeriodicTimer>,
    line_clear: Option<OneShotTimer>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the scheduler was created.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    fn next_id(&mut self) -> TimerId {
        self.last_id += 1;
        TimerId(self.last_id)
    }

    /// Arms (or re-arms) gravity with `period`, first firing one period from now.
    ///
    /// Any earlier arming is replaced and its token goes stale.
    pub fn arm_gravity(&mut self, period: Duration) -> TimerId {
        let id = self.next_id();
        let period = period.max(MIN_PERIOD);
        self.gravity = Some(PeriodicTimer {
            id,
            period,
            next_due: self.now.saturating_add(period),
        });
        id
    }

    pub fn disarm_gravity(&mut self) {
        self.gravity = None;
    }

    #[must_use]
    pub fn gravity_id(&self) -> Option<TimerId> {
        self.gravity.map(|timer| timer.id)
    }

    #[must_use]
    pub fn gravity_period(&self) -> Option<Duration> {
        self.gravity.map(|timer| timer.period)
    }

    /// Arms the one-shot line-clear timer to fire `delay` from now.
    pub fn arm_line_clear(&mut self, delay: Duration) -> TimerId {
        let id = self.next_id();
        self.line_clear = Some(OneShotTimer {
            id,
            due: self.now.saturating_add(delay),
        });
        id
    }

    pub fn cancel_line_clear(&mut self) {
        self.line_clear = None;
    }

    #[must_use]
    pub fn line_clear_id(&self) -> Option<TimerId> {
        self.line_clear.map(|timer| timer.id)
    }

    /// Cancels every armed timer.
    pub fn cancel_all(&mut self) {
        self.disarm_gravity();
        self.cancel_line_clear();
    }

    /// Returns when the next timer is due, if any is armed.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        let gravity = self.gravity.map(|timer| timer.next_due);
        let line_clear = self.line_clear.map(|timer| timer.due);
        match (gravity, line_clear) {
            (Some(g), Some(l)) => Some(g.min(l)),
            (g, l) => g.or(l),
        }
    }

    /// Fires the earliest timer due at or before `deadline`.
    ///
    /// The clock moves to the fire time. A one-shot timer is removed; a
    /// periodic timer is rescheduled one period later, or disarmed when that
    /// would pass [`Duration::MAX`]. The line-clear timer wins ties. Returns
    /// `None`, leaving the clock alone, when nothing is due.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<TimerEvent> {
        let gravity_due = self.gravity.map(|timer| timer.next_due);
        if let Some(timer) = self
            .line_clear
            .filter(|timer| timer.due <= deadline)
            .filter(|timer| gravity_due.is_none_or(|due| timer.due <= due))
        {
            self.line_clear = None;
            self.now = self.now.max(timer.due);
            return Some(TimerEvent::LineClear(timer.id));
        }
        let gravity = self.gravity.filter(|timer| timer.next_due <= deadline)?;
        self.now = self.now.max(gravity.next_due);
        self.gravity = gravity
            .next_due
            .checked_add(gravity.period)
            .map(|next_due| PeriodicTimer { next_due, ..gravity });
        Some(TimerEvent::Gravity(gravity.id))
    }

    /// Moves the clock forward to `time` without firing anything.
    ///
    /// Call after draining [`Self::pop_due`] for the same deadline.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn drain(scheduler: &mut Scheduler, deadline: Duration) -> Vec<(Duration, TimerEvent)> {
        let mut fired = vec![];
        while let Some(event) = scheduler.pop_due(deadline) {
            fired.push((scheduler.now(), event));
        }
        scheduler.advance_to(deadline);
        fired
    }

    #[test]
    fn test_periodic_fires_each_period() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.arm_gravity(ms(800));
        assert_eq!(scheduler.next_due(), Some(ms(800)));

        let fired = drain(&mut scheduler, ms(2500));
        assert_eq!(
            fired,
            vec![
                (ms(800), TimerEvent::Gravity(id)),
                (ms(1600), TimerEvent::Gravity(id)),
                (ms(2400), TimerEvent::Gravity(id)),
            ]
        );
        assert_eq!(scheduler.now(), ms(2500));
        assert_eq!(scheduler.next_due(), Some(ms(3200)));
    }

    #[test]
    fn test_rearm_resets_phase_and_stales_token() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.arm_gravity(ms(800));
        drain(&mut scheduler, ms(500));

        let second = scheduler.arm_gravity(ms(760));
        assert_ne!(first, second);
        assert_eq!(scheduler.gravity_id(), Some(second));
        assert_eq!(scheduler.gravity_period(), Some(ms(760)));
        assert_eq!(scheduler.next_due(), Some(ms(1260)));
        assert_eq!(drain(&mut scheduler, ms(1000)), vec![]);
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.arm_line_clear(ms(300));
        assert_eq!(
            drain(&mut scheduler, ms(1000)),
            vec![(ms(300), TimerEvent::LineClear(id))]
        );
        assert_eq!(scheduler.line_clear_id(), None);
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn test_zero_delay_one_shot_is_due_immediately() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.arm_line_clear(Duration::ZERO);
        assert_eq!(
            scheduler.pop_due(Duration::ZERO),
            Some(TimerEvent::LineClear(id))
        );
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = Scheduler::new();
        scheduler.arm_gravity(ms(100));
        scheduler.arm_line_clear(ms(50));
        scheduler.cancel_all();
        assert_eq!(scheduler.next_due(), None);
        assert_eq!(drain(&mut scheduler, ms(1000)), vec![]);
    }

    #[test]
    fn test_line_clear_wins_ties() {
        let mut scheduler = Scheduler::new();
        let gravity = scheduler.arm_gravity(ms(100));
        let clear = scheduler.arm_line_clear(ms(100));
        assert_eq!(
            drain(&mut scheduler, ms(100)),
            vec![
                (ms(100), TimerEvent::LineClear(clear)),
                (ms(100), TimerEvent::Gravity(gravity)),
            ]
        );
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut scheduler = Scheduler::new();
        scheduler.arm_gravity(Duration::ZERO);
        assert_eq!(scheduler.gravity_period(), Some(MIN_PERIOD));
        assert_eq!(drain(&mut scheduler, Duration::from_nanos(3)).len(), 3);
    }

    #[test]
    fn test_arming_near_the_end_of_time_saturates() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(Duration::MAX - ms(100));

        let clear = scheduler.arm_line_clear(ms(500));
        assert_eq!(scheduler.next_due(), Some(Duration::MAX));
        let gravity = scheduler.arm_gravity(ms(800));
        assert_eq!(
            drain(&mut scheduler, Duration::MAX),
            vec![
                (Duration::MAX, TimerEvent::LineClear(clear)),
                (Duration::MAX, TimerEvent::Gravity(gravity)),
            ]
        );
        // No later period fits, so gravity is disarmed instead of refiring.
        assert_eq!(scheduler.gravity_id(), None);
        assert_eq!(scheduler.next_due(), None);
    }
}

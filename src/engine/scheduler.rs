/*
Audio-Clock Timers
==================

Deferred work (spawn the next chime, release a finished chime) is keyed to
the audio clock rather than wall time. The host polls with the context's
current time and gets back every task whose due time has passed:

    now = 12.0                       timers
    ─────────────────────────►       [#3 chime     due 12.0  every 17.4]
         pop_due(12.0) -> #3         [#7 cleanup   due 19.2           ]
         pop_due(12.0) -> None

Because the clock only moves while the context renders, suspending the
context freezes every timer with it.

Repeating timers re-arm one interval after their due time. If the host
fell behind by more than a whole interval, the missed firings are skipped
and the next one lands one interval after `now`.
*/

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    due: f64,
    interval: Option<f64>,
    task: T,
}

/// Shortest allowed repeat interval, in seconds.
const MIN_INTERVAL: f64 = 1e-3;

#[derive(Debug)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    /// Run `task` once at `due`.
    pub fn schedule_once(&mut self, due: f64, task: T) -> TimerId {
        self.push(due, None, task)
    }

    /// Run `task` at `first_due` and every `interval` seconds after.
    pub fn schedule_repeating(&mut self, first_due: f64, interval: f64, task: T) -> TimerId {
        self.push(first_due, Some(interval.max(MIN_INTERVAL)), task)
    }

    /// Returns `false` if the timer already fired (one-shot) or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn due_of(&self, id: TimerId) -> Option<f64> {
        self.timers
            .iter()
            .find(|timer| timer.id == id)
            .map(|timer| timer.due)
    }

    pub fn next_due(&self) -> Option<f64> {
        self.timers.iter().map(|timer| timer.due).reduce(f64::min)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pending timers whose task matches `predicate`.
    pub fn count(&self, predicate: impl Fn(&T) -> bool) -> usize {
        self.timers.iter().filter(|timer| predicate(&timer.task)).count()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Take the earliest task due at or before `now`. Call repeatedly until
    /// it returns `None`.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerId, T)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(index, _)| index)?;

        let timer = &mut self.timers[index];
        match timer.interval {
            Some(interval) => {
                timer.due += interval;
                if timer.due <= now {
                    timer.due = now + interval;
                }
                Some((timer.id, timer.task.clone()))
            }
            None => {
                let timer = self.timers.swap_remove(index);
                Some((timer.id, timer.task))
            }
        }
    }

    fn push(&mut self, due: f64, interval: Option<f64>, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due,
            interval,
            task,
        });
        id
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_once(2.0, "cleanup");

        assert_eq!(scheduler.pop_due(1.9), None);
        assert_eq!(scheduler.pop_due(2.0), Some((id, "cleanup")));
        assert_eq!(scheduler.pop_due(5.0), None);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_repeating_rearms() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_repeating(10.0, 5.0, 'c');

        assert_eq!(scheduler.pop_due(10.0), Some((id, 'c')));
        assert_eq!(scheduler.due_of(id), Some(15.0));
        assert_eq!(scheduler.pop_due(14.9), None);
        assert_eq!(scheduler.pop_due(15.0), Some((id, 'c')));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_repeating_skips_missed_periods() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_repeating(1.0, 1.0, ());

        assert!(scheduler.pop_due(10.5).is_some());
        assert_eq!(scheduler.due_of(id), Some(11.5));
        assert_eq!(scheduler.pop_due(10.5), None);
    }

    #[test]
    fn test_earliest_due_pops_first() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(3.0, "late");
        scheduler.schedule_once(1.0, "early");
        scheduler.schedule_once(2.0, "middle");

        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(5.0))
            .map(|(_, task)| task)
            .collect();
        assert_eq!(order, ["early", "middle", "late"]);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_repeating(1.0, 1.0, ());
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert_eq!(scheduler.pop_due(100.0), None);
    }

    #[test]
    fn test_count_by_task() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(1.0, 1);
        scheduler.schedule_once(2.0, 2);
        scheduler.schedule_repeating(3.0, 1.0, 2);

        assert_eq!(scheduler.count(|&task| task == 2), 2);
        assert_eq!(scheduler.next_due(), Some(1.0));
        scheduler.clear();
        assert_eq!(scheduler.next_due(), None);
    }
}

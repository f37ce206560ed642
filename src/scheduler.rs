#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TaskHandle,
    due_at: f64,
    payload: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    tasks: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due_at: f64, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push(Scheduled {
            handle,
            due_at,
            payload,
        });
        handle
    }

    pub fn schedule_after(&mut self, now: f64, delay_ms: f64, payload: T) -> TaskHandle {
        self.schedule(now + delay_ms.max(0.0), payload)
    }

    /// Returns false if the task already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Removes and returns every payload due at `now`, earliest deadline
    /// first; equal deadlines keep scheduling order.
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.tasks).into_iter().partition(|t| t.due_at <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.handle.cmp(&b.handle)));
        due.into_iter().map(|t| t.payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule(30.0, "c");
        s.schedule(10.0, "a");
        s.schedule(10.0, "b");
        s.schedule(99.0, "later");
        assert_eq!(s.drain_due(30.0), vec!["a", "b", "c"]);
        assert_eq!(s.len(), 1);
        assert!(s.drain_due(31.0).is_empty());
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut s = Scheduler::new();
        let keep = s.schedule_after(0.0, 250.0, 1);
        let drop = s.schedule_after(0.0, 250.0, 2);
        assert!(s.cancel(drop));
        assert!(!s.cancel(drop));
        assert!(s.is_pending(keep));
        assert_eq!(s.drain_due(250.0), vec![1]);
        assert!(!s.is_pending(keep));
    }

    #[test]
    fn negative_delay_fires_immediately() {
        let mut s = Scheduler::new();
        s.schedule_after(100.0, -5.0, ());
        assert_eq!(s.drain_due(100.0).len(), 1);
    }
}

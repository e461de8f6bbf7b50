/// Reports fractional completion of a long running call to an observer, at a
/// bounded cadence.
///
/// Reports are purely observational: the observer cannot influence the call.
pub struct Progress<'a> {
    report: Option<&'a mut dyn FnMut(f32)>,
    total: usize,
    interval: usize,
}

impl<'a> Progress<'a> {
    /// Reports every `interval` steps and once more when step `total` is reached.
    pub fn new(total: usize, interval: usize, report: &'a mut dyn FnMut(f32)) -> Progress<'a> {
        Progress {
            report: Some(report),
            total,
            interval: interval.max(1),
        }
    }

    /// A progress that never reports anything.
    pub fn silent() -> Progress<'static> {
        Progress {
            report: None,
            total: 0,
            interval: 1,
        }
    }

    /// Marks step `done` (1-based) as completed.
    pub fn step(&mut self, done: usize) {
        if let Some(report) = self.report.as_mut() {
            if done % self.interval == 0 || done == self.total {
                report(done as f32 / self.total as f32);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::Progress;

    #[test]
    fn test_reports_at_cadence_and_completion() {
        let mut reports = Vec::new();
        let mut report = |fraction: f32| reports.push(fraction);
        let mut progress = Progress::new(10, 4, &mut report);
        for done in 1..=10 {
            progress.step(done);
        }
        assert_eq!(reports, vec![0.4, 0.8, 1.0]);
    }

    #[test]
    fn test_silent() {
        let mut progress = Progress::silent();
        progress.step(1);
    }
}

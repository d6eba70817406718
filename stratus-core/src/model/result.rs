use super::{ServiceState, Status};
use std::{cmp::Ordering, time::Duration};

/// Aggregate outcome of one run, built after every service finished.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub services: Vec<ServiceState>,
    pub success_count: usize,
    pub total_count: usize,
    /// Sum over services with a measured size only.
    pub total_size_gb: f64,
    pub duration: Duration,
}

impl RunResult {
    pub fn new(services: Vec<ServiceState>, duration: Duration) -> Self {
        let success_count = services
            .iter()
            .filter(|s| s.status() == Status::Success)
            .count();
        let total_size_gb = services
            .iter()
            .filter_map(|s| s.size.as_ref().and_then(|size| size.gb()))
            .sum();
        RunResult {
            total_count: services.len(),
            services,
            success_count,
            total_size_gb,
            duration,
        }
    }

    pub fn empty(duration: Duration) -> Self {
        Self::new(Vec::new(), duration)
    }

    /// True if at least one service ran and every service succeeded. A run
    /// that found nothing to back up is a failure.
    pub fn succeeded(&self) -> bool {
        self.total_count > 0 && self.success_count == self.total_count
    }

    pub fn success_rate(&self) -> u32 {
        if self.total_count == 0 {
            0
        } else {
            (self.success_count as f64 / self.total_count as f64 * 100.0).round() as u32
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &ServiceState> {
        self.services.iter().filter(|s| s.is_failed())
    }

    pub fn size_error_count(&self) -> usize {
        self.services
            .iter()
            .filter(|s| s.size.as_ref().map_or(false, |size| size.gb().is_none()))
            .count()
    }

    pub fn measured_count(&self) -> usize {
        self.services
            .iter()
            .filter(|s| s.size.as_ref().and_then(|size| size.gb()).is_some())
            .count()
    }

    /// Percentage of the total size taken up by one service, if known.
    pub fn share_of(&self, service: &ServiceState) -> Option<f64> {
        let gb = service.size.as_ref()?.gb()?;
        if self.total_size_gb > 0.0 {
            Some(gb / self.total_size_gb * 100.0)
        } else {
            None
        }
    }

    /// Services ordered by descending share of the total size. Services
    /// without a known share sort after all others, keeping discovery order.
    pub fn by_share(&self) -> Vec<&ServiceState> {
        const UNKNOWN: f64 = -1.0;
        let mut services = self.services.iter().collect::<Vec<_>>();
        services.sort_by(|a, b| {
            let a = self.share_of(a).unwrap_or(UNKNOWN);
            let b = self.share_of(b).unwrap_or(UNKNOWN);
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        });
        services
    }
}

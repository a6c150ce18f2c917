//! Prometheus metrics (lock-free atomics).

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Traffic ---
    pub requests_total: AtomicU64,
    pub request_errors: AtomicU64,

    // --- Configuration ---
    pub settings_updates: AtomicU64,
    pub tier_mutations: AtomicU64,
    pub tier_rejections: AtomicU64,

    // --- Balances ---
    pub adjustments: AtomicU64,
    pub adjustment_rejections: AtomicU64,
    pub deposits_credited: AtomicU64,

    // --- Calculator ---
    pub previews: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            request_errors: AtomicU64::new(0),
            settings_updates: AtomicU64::new(0),
            tier_mutations: AtomicU64::new(0),
            tier_rejections: AtomicU64::new(0),
            adjustments: AtomicU64::new(0),
            adjustment_rejections: AtomicU64::new(0),
            deposits_credited: AtomicU64::new(0),
            previews: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, tier_count: usize, bonus_enabled: bool) -> String {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let request_errors = self.request_errors.load(Ordering::Relaxed);
        let settings_updates = self.settings_updates.load(Ordering::Relaxed);
        let tier_mutations = self.tier_mutations.load(Ordering::Relaxed);
        let tier_rejections = self.tier_rejections.load(Ordering::Relaxed);
        let adjustments = self.adjustments.load(Ordering::Relaxed);
        let adjustment_rejections = self.adjustment_rejections.load(Ordering::Relaxed);
        let deposits = self.deposits_credited.load(Ordering::Relaxed);
        let previews = self.previews.load(Ordering::Relaxed);
        let enabled = u8::from(bonus_enabled);

        format!(
            "\
# HELP bonus_admin_requests_total Admin API requests received.\n\
# TYPE bonus_admin_requests_total counter\n\
bonus_admin_requests_total {requests}\n\
# HELP bonus_admin_request_errors_total Admin API requests answered with an error.\n\
# TYPE bonus_admin_request_errors_total counter\n\
bonus_admin_request_errors_total {request_errors}\n\
# HELP bonus_admin_settings_updates_total Settings updates applied.\n\
# TYPE bonus_admin_settings_updates_total counter\n\
bonus_admin_settings_updates_total {settings_updates}\n\
# HELP bonus_admin_tier_mutations_total Tier adds, edits and removals applied.\n\
# TYPE bonus_admin_tier_mutations_total counter\n\
bonus_admin_tier_mutations_total {tier_mutations}\n\
# HELP bonus_admin_tier_rejections_total Tier mutations rejected (range, overlap, not found).\n\
# TYPE bonus_admin_tier_rejections_total counter\n\
bonus_admin_tier_rejections_total {tier_rejections}\n\
# HELP bonus_admin_adjustments_total Manual balance adjustments applied.\n\
# TYPE bonus_admin_adjustments_total counter\n\
bonus_admin_adjustments_total {adjustments}\n\
# HELP bonus_admin_adjustment_rejections_total Manual balance adjustments rejected.\n\
# TYPE bonus_admin_adjustment_rejections_total counter\n\
bonus_admin_adjustment_rejections_total {adjustment_rejections}\n\
# HELP bonus_admin_deposits_credited_total Deposits recorded through the API.\n\
# TYPE bonus_admin_deposits_credited_total counter\n\
bonus_admin_deposits_credited_total {deposits}\n\
# HELP bonus_admin_previews_total Bonus calculator previews served.\n\
# TYPE bonus_admin_previews_total counter\n\
bonus_admin_previews_total {previews}\n\
# HELP bonus_admin_tiers Configured bonus tiers.\n\
# TYPE bonus_admin_tiers gauge\n\
bonus_admin_tiers {tier_count}\n\
# HELP bonus_admin_enabled Whether deposit bonuses are enabled.\n\
# TYPE bonus_admin_enabled gauge\n\
bonus_admin_enabled {enabled}\n"
        )
    }
}

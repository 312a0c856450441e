//! Per-staff mutual exclusion backed by a lease row in `staff_locks`.
//!
//! The lease lives in the database rather than in process memory so that
//! several server processes sharing one database still serialize writes to the
//! same staff calendar. Leases expire on their own if a holder dies.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, Instant};

use crate::db::{self, queries, Db};
use crate::errors::SchedulingError;

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Held lease on one staff member's calendar. Released on drop.
pub struct StaffLease {
    db: Db,
    staff_id: String,
    holder: String,
}

impl StaffLease {
    /// Polls for the lease until `timeout` elapses, then gives up with `Busy`.
    pub async fn acquire(
        db: &Db,
        staff_id: &str,
        timeout: Duration,
        lease_secs: i64,
    ) -> Result<Self, SchedulingError> {
        let holder = uuid::Uuid::new_v4().to_string();
        let deadline = Instant::now() + timeout;

        loop {
            let acquired = {
                let conn = db::lock(db);
                let now = Utc::now().naive_utc();
                let expires_at = now + chrono::Duration::seconds(lease_secs);
                queries::try_acquire_staff_lock(&conn, staff_id, &holder, &now, &expires_at)?
            };

            if acquired {
                tracing::debug!(staff_id, holder = %holder, "staff lease acquired");
                return Ok(Self {
                    db: db.clone(),
                    staff_id: staff_id.to_string(),
                    holder,
                });
            }

            if Instant::now() >= deadline {
                tracing::warn!(staff_id, timeout_ms = timeout.as_millis() as u64, "staff lease timed out");
                return Err(SchedulingError::Busy);
            }
            sleep(RETRY_INTERVAL).await;
        }
    }
}

impl Drop for StaffLease {
    fn drop(&mut self) {
        let conn = db::lock(&self.db);
        match queries::release_staff_lock(&conn, &self.staff_id, &self.holder) {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                staff_id = %self.staff_id,
                "staff lease expired before release"
            ),
            Err(e) => tracing::error!(
                staff_id = %self.staff_id,
                "failed to release staff lease: {e:#}"
            ),
        }
    }
}

//! Fan-out of the program stream to every enabled destination.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use stagecast_core::{
    ChannelId, Destination, DestinationId, DestinationStore, FanoutFailure, FanoutReport, RoomName,
};
use stagecast_transport::EgressService;
use tracing::{info, instrument, warn};

use crate::job::{EgressJob, EgressJobState};

/// Starts and stops one egress job per enabled destination.
///
/// Every live session begins with a clean slate: `start_fanout` drops the
/// jobs of the previous session before creating new ones. A destination
/// that fails to start is reported and skipped; it never blocks the
/// others. The store's connected flag follows each job individually.
pub struct FanoutController {
    egress: Arc<dyn EgressService>,
    store: Arc<dyn DestinationStore>,
    jobs: Mutex<HashMap<DestinationId, EgressJob>>,
}

impl FanoutController {
    pub fn new(egress: Arc<dyn EgressService>, store: Arc<dyn DestinationStore>) -> Self {
        Self {
            egress,
            store,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Pushes the room to every enabled destination of the channel.
    #[instrument(name = "start_fanout", skip(self))]
    pub async fn start_fanout(&self, channel: &ChannelId, room: &RoomName) -> FanoutReport {
        // Jobs lingering from a previous live period are stopped first.
        if self.live_count() > 0 {
            self.stop_fanout().await;
        }
        self.jobs.lock().clear();

        let destinations = self.store.enabled_destinations(channel);
        info!(count = destinations.len(), "starting fan-out");

        let mut report = FanoutReport::default();
        for destination in destinations {
            match self.start_one(room, &destination).await {
                Ok(()) => report.started.push(destination.id),
                Err(reason) => {
                    warn!(destination = %destination.id, platform = %destination.platform, %reason, "destination failed to start");
                    report.failed.push(FanoutFailure {
                        destination: destination.id,
                        reason,
                    });
                }
            }
        }
        report
    }

    async fn start_one(&self, room: &RoomName, destination: &Destination) -> Result<(), String> {
        self.jobs.lock().insert(
            destination.id.clone(),
            EgressJob::starting(destination.id.clone()),
        );

        match self
            .egress
            .start_egress(room, &destination.url, &destination.stream_key)
            .await
        {
            Ok(egress) => {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(&destination.id) {
                    job.egress = Some(egress);
                    job.state = EgressJobState::Live;
                }
                self.store.mark_connected(&destination.id, Utc::now());
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(&destination.id) {
                    job.state = EgressJobState::Failed {
                        reason: reason.clone(),
                    };
                }
                Err(reason)
            }
        }
    }

    /// Stops every live job and marks its destination disconnected.
    /// Returns how many jobs were stopped.
    #[instrument(name = "stop_fanout", skip(self))]
    pub async fn stop_fanout(&self) -> usize {
        let live: Vec<(DestinationId, stagecast_core::EgressId)> = {
            let jobs = self.jobs.lock();
            jobs.values()
                .filter(|job| job.state.is_live())
                .filter_map(|job| {
                    job.egress
                        .clone()
                        .map(|egress| (job.destination.clone(), egress))
                })
                .collect()
        };

        let mut stopped = 0;
        for (destination, egress) in live {
            if let Err(e) = self.egress.stop_egress(&egress).await {
                warn!(destination = %destination, error = %e, "egress stop failed");
            }
            self.store.mark_disconnected(&destination);
            let mut jobs = self.jobs.lock();
            if let Some(job) = jobs.get_mut(&destination) {
                job.state = EgressJobState::Stopped;
            }
            stopped += 1;
        }
        info!(stopped, "fan-out stopped");
        stopped
    }

    pub fn job(&self, destination: &DestinationId) -> Option<EgressJob> {
        self.jobs.lock().get(destination).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.jobs
            .lock()
            .values()
            .filter(|job| job.state.is_live())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecast_core::InMemoryDestinationStore;
    use stagecast_transport::LocalMediaCloud;

    fn setup() -> (
        Arc<LocalMediaCloud>,
        Arc<InMemoryDestinationStore>,
        FanoutController,
        ChannelId,
    ) {
        let cloud = Arc::new(LocalMediaCloud::new());
        let store = Arc::new(InMemoryDestinationStore::new());
        let controller = FanoutController::new(cloud.clone(), store.clone());
        (cloud, store, controller, ChannelId::new())
    }

    fn seed(store: &InMemoryDestinationStore, channel: &ChannelId, platform: &str, url: &str) -> DestinationId {
        let destination = Destination::new(channel.clone(), platform, url, format!("{platform}-key"));
        let id = destination.id.clone();
        store.upsert(destination);
        id
    }

    #[tokio::test]
    async fn test_fanout_starts_every_enabled_destination() {
        let (cloud, store, controller, channel) = setup();
        let a = seed(&store, &channel, "twitch", "rtmp://live.twitch.example/app");
        let b = seed(&store, &channel, "youtube", "rtmp://a.rtmp.youtube.example/live2");
        let c = seed(&store, &channel, "kick", "rtmps://kick.example/app");
        store.set_enabled(&c, false);

        let report = controller
            .start_fanout(&channel, &RoomName::from("studio-1"))
            .await;
        assert!(report.is_complete());
        assert_eq!(report.started.len(), 2);
        assert_eq!(cloud.egress_count(), 2);
        assert!(store.get(&a).unwrap().is_connected);
        assert!(store.get(&b).unwrap().is_connected);
        assert!(!store.get(&c).unwrap().is_connected);
        assert!(store.get(&a).unwrap().last_stream_at.is_some());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let (cloud, store, controller, channel) = setup();
        let good = seed(&store, &channel, "youtube", "rtmp://good.example/live");
        let bad = seed(&store, &channel, "twitch", "rtmp://bad-ingest.example/app");
        cloud.fail_egress_containing("bad-ingest");

        let report = controller
            .start_fanout(&channel, &RoomName::from("studio-1"))
            .await;
        assert!(!report.is_complete());
        assert_eq!(report.started, vec![good.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].destination, bad);
        assert!(!report.failed[0].reason.is_empty());

        assert!(controller.job(&good).unwrap().state.is_live());
        assert!(controller.job(&bad).unwrap().state.is_failed());
        assert!(store.get(&good).unwrap().is_connected);
        assert!(!store.get(&bad).unwrap().is_connected);
    }

    #[tokio::test]
    async fn test_invalid_url_reported_as_failure() {
        let (_cloud, store, controller, channel) = setup();
        let bad = seed(&store, &channel, "web", "https://not-rtmp.example/live");

        let report = controller
            .start_fanout(&channel, &RoomName::from("studio-1"))
            .await;
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].destination, bad);
    }

    #[tokio::test]
    async fn test_stop_fanout_disconnects_everything() {
        let (cloud, store, controller, channel) = setup();
        let a = seed(&store, &channel, "twitch", "rtmp://live.twitch.example/app");
        let b = seed(&store, &channel, "youtube", "rtmp://yt.example/live");

        controller
            .start_fanout(&channel, &RoomName::from("studio-1"))
            .await;
        assert_eq!(controller.live_count(), 2);

        let stopped = controller.stop_fanout().await;
        assert_eq!(stopped, 2);
        assert_eq!(cloud.egress_count(), 0);
        assert_eq!(controller.live_count(), 0);
        assert!(!store.get(&a).unwrap().is_connected);
        assert!(!store.get(&b).unwrap().is_connected);
    }

    #[tokio::test]
    async fn test_restart_without_stop_reclaims_old_jobs() {
        let (cloud, store, controller, channel) = setup();
        let a = seed(&store, &channel, "twitch", "rtmp://live.twitch.example/app");
        let room = RoomName::from("studio-1");

        controller.start_fanout(&channel, &room).await;
        assert_eq!(cloud.egress_count(), 1);

        // a second start without an explicit stop never leaks the old egress
        controller.start_fanout(&channel, &room).await;
        assert_eq!(cloud.egress_count(), 1);
        assert!(store.get(&a).unwrap().is_connected);
    }

    #[tokio::test]
    async fn test_each_session_starts_clean() {
        let (cloud, store, controller, channel) = setup();
        let a = seed(&store, &channel, "twitch", "rtmp://live.twitch.example/app");
        let room = RoomName::from("studio-1");

        controller.start_fanout(&channel, &room).await;
        controller.stop_fanout().await;

        store.set_enabled(&a, false);
        let b = seed(&store, &channel, "youtube", "rtmp://yt.example/live");
        let report = controller.start_fanout(&channel, &room).await;

        assert_eq!(report.started, vec![b.clone()]);
        assert_eq!(cloud.egress_count(), 1);
        // the disabled destination's old job is gone
        assert!(controller.job(&a).is_none());
        assert!(controller.job(&b).unwrap().state.is_live());
    }
}

use async_trait::async_trait;
use nearby_client::{
    CaptureHandle, MediaBackend, MediaError, MediaTransport, SessionKey, TransportEvent,
};
use nearby_core::{IceCandidate, SessionDescription};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Counts everything the fake backend hands out and takes back.
#[derive(Debug, Default)]
pub struct FakeLog {
    pub captures_acquired: AtomicUsize,
    pub captures_stopped: AtomicUsize,
    pub transports_opened: AtomicUsize,
    pub transports_closed: AtomicUsize,
    pub remote_candidates: Mutex<Vec<IceCandidate>>,
}

impl FakeLog {
    pub fn live_captures(&self) -> usize {
        self.captures_acquired.load(Ordering::SeqCst) - self.captures_stopped.load(Ordering::SeqCst)
    }

    pub fn live_transports(&self) -> usize {
        self.transports_opened.load(Ordering::SeqCst)
            - self.transports_closed.load(Ordering::SeqCst)
    }
}

/// Media backend that negotiates instantly and carries no media.
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub log: Arc<FakeLog>,
    fail_capture: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose camera is never available.
    pub fn without_camera() -> Self {
        Self {
            fail_capture: true,
            ..Self::default()
        }
    }
}

pub struct FakeCapture(Arc<FakeLog>);

impl CaptureHandle for FakeCapture {
    fn stop(self) {
        self.0.captures_stopped.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeTransport {
    session: SessionKey,
    log: Arc<FakeLog>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl FakeTransport {
    fn gather(&self) {
        let candidate = IceCandidate::new(format!("candidate:fake {}", self.session));
        let _ = self.events.send(TransportEvent::CandidateGenerated {
            session: self.session,
            candidate,
        });
    }

    fn remote_video(&self) {
        let _ = self.events.send(TransportEvent::RemoteTrack {
            session: self.session,
            kind: "video".to_owned(),
        });
    }
}

#[async_trait]
impl MediaTransport for FakeTransport {
    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        self.gather();
        Ok(SessionDescription::offer(format!("fake offer {}", self.session)))
    }

    async fn accept_offer(
        &self,
        _offer: SessionDescription,
    ) -> Result<SessionDescription, MediaError> {
        self.gather();
        self.remote_video();
        Ok(SessionDescription::answer(format!(
            "fake answer {}",
            self.session
        )))
    }

    async fn accept_answer(&self, _answer: SessionDescription) -> Result<(), MediaError> {
        self.remote_video();
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        self.log.remote_candidates.lock().unwrap().push(candidate);
        Ok(())
    }

    async fn close(&self) {
        self.log.transports_closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    type Capture = FakeCapture;
    type Transport = FakeTransport;

    async fn acquire_capture(&self) -> Result<FakeCapture, MediaError> {
        if self.fail_capture {
            return Err(MediaError::CaptureUnavailable(
                "no camera attached".to_owned(),
            ));
        }
        self.log.captures_acquired.fetch_add(1, Ordering::SeqCst);
        Ok(FakeCapture(self.log.clone()))
    }

    async fn open_transport(
        &self,
        session: SessionKey,
        _capture: &FakeCapture,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<FakeTransport, MediaError> {
        self.log.transports_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeTransport {
            session,
            log: self.log.clone(),
            events,
        })
    }
}

use async_trait::async_trait;
use nearby_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::error::MediaError;
use crate::session::{CaptureHandle, MediaBackend, MediaTransport, SessionKey, TransportEvent};

const STREAM_ID: &str = "nearby";

fn transport_err(e: webrtc::Error) -> MediaError {
    MediaError::Transport(e.to_string())
}

fn negotiation_err(e: webrtc::Error) -> MediaError {
    MediaError::Negotiation(e.to_string())
}

/// Local VP8 video and Opus audio tracks. Whatever feeds the camera and
/// microphone writes samples into them.
pub struct WebRtcCapture {
    video: Arc<TrackLocalStaticSample>,
    audio: Arc<TrackLocalStaticSample>,
}

impl WebRtcCapture {
    pub fn video_track(&self) -> Arc<TrackLocalStaticSample> {
        self.video.clone()
    }

    pub fn audio_track(&self) -> Arc<TrackLocalStaticSample> {
        self.audio.clone()
    }
}

impl CaptureHandle for WebRtcCapture {
    /// Drops our references to the tracks. Senders on a peer connection hold
    /// their own until that connection is closed, so close the transport first.
    fn stop(self) {
        let WebRtcCapture { video, audio } = self;
        debug!("Releasing local tracks {} / {}", video.id(), audio.id());
        drop(video);
        drop(audio);
    }
}

/// One `RTCPeerConnection` to a remote participant.
pub struct WebRtcTransport {
    session: SessionKey,
    peer_connection: Arc<RTCPeerConnection>,
}

#[async_trait]
impl MediaTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription, MediaError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(negotiation_err)?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(negotiation_err)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn accept_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, MediaError> {
        self.set_remote(offer).await?;
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(negotiation_err)?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(negotiation_err)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn accept_answer(&self, answer: SessionDescription) -> Result<(), MediaError> {
        self.set_remote(answer).await
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(transport_err)
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            debug!("Closing peer connection {} failed: {}", self.session, e);
        }
    }
}

impl WebRtcTransport {
    async fn set_remote(&self, description: SessionDescription) -> Result<(), MediaError> {
        let remote = match description.kind {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp),
            SdpType::Answer => RTCSessionDescription::answer(description.sdp),
        }
        .map_err(negotiation_err)?;
        self.peer_connection
            .set_remote_description(remote)
            .await
            .map_err(negotiation_err)
    }
}

/// Media backend built on the `webrtc` crate.
#[derive(Debug, Clone)]
pub struct WebRtcBackend {
    ice_servers: Vec<IceServerConfig>,
}

impl Default for WebRtcBackend {
    fn default() -> Self {
        Self::new(vec![IceServerConfig::default()])
    }
}

impl WebRtcBackend {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    fn rtc_configuration(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaBackend for WebRtcBackend {
    type Capture = WebRtcCapture;
    type Transport = WebRtcTransport;

    async fn acquire_capture(&self) -> Result<WebRtcCapture, MediaError> {
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            STREAM_ID.to_owned(),
        ));
        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            STREAM_ID.to_owned(),
        ));
        Ok(WebRtcCapture { video, audio })
    }

    async fn open_transport(
        &self,
        session: SessionKey,
        capture: &WebRtcCapture,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<WebRtcTransport, MediaError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(transport_err)?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(transport_err)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(self.rtc_configuration())
                .await
                .map_err(transport_err)?,
        );

        for track in [capture.video_track(), capture.audio_track()] {
            if let Err(e) = peer_connection
                .add_track(track as Arc<dyn TrackLocal + Send + Sync>)
                .await
            {
                let _ = peer_connection.close().await;
                return Err(transport_err(e));
            }
        }

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection {} is {:?}", session, state);
                    if matches!(
                        state,
                        RTCPeerConnectionState::Failed
                            | RTCPeerConnectionState::Disconnected
                            | RTCPeerConnectionState::Closed
                    ) {
                        let _ = tx.send(TransportEvent::Disconnected { session });
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx.send(TransportEvent::CandidateGenerated { session, candidate });
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let kind = track.kind().to_string();
                    debug!("Remote {} track on {}", kind, session);
                    let _ = tx.send(TransportEvent::RemoteTrack { session, kind });
                })
            },
        ));

        Ok(WebRtcTransport {
            session,
            peer_connection,
        })
    }
}

use anyhow::{Context as _, Result};
use iroh::EndpointId;
use tracing::info;

use crate::config::Config;
use crate::core::engine::Engine;
use crate::core::network::{spawn_link, NetworkManager, PeerChannel};
use crate::core::session::Session;
use crate::sim::Role;

/// Parses the id the host shared out of band.
pub fn parse_endpoint_id(raw: &str) -> Result<EndpointId> {
    raw.trim()
        .parse::<EndpointId>()
        .with_context(|| format!("invalid host endpoint id '{}'", raw.trim()))
}

/// Binds the endpoint, starts connecting in the background and returns a frame
/// loop that is already rendering while the link negotiates.
/// Host: `peer` is ignored. Guest: `peer` is the host's endpoint id.
pub async fn launch(role: Role, peer: Option<&str>, config: &Config) -> Result<Engine<PeerChannel>> {
    let peer = match role {
        Role::Host => None,
        Role::Guest => {
            let raw = peer.context("joining requires the host's endpoint id")?;
            Some(parse_endpoint_id(raw)?)
        }
    };

    let net = NetworkManager::bind().await?;
    let local_id = net.local_id().to_string();
    if role == Role::Host {
        info!(endpoint = %local_id, "share this endpoint id with the guest");
    }

    let (channel, events) = spawn_link(net, role, peer);
    let session = Session::new(role, config.sim());
    Ok(Engine::new(session, channel, events, config.fps, local_id))
}

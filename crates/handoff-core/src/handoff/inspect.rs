//! Looking up a scanned token on the approving device.

use crate::error::InspectError;
use crate::rpc::{Call, Response};
use crate::session::Session;
use crate::token::TokenInfo;

use super::send;

/// Fetch metadata about the device that requested `token`.
///
/// Read-only and safe to call repeatedly.
///
/// # Errors
///
/// `Invalid`, `Expired` and `AlreadyAccepted` for the matching remote error
/// codes; `Generic` for anything else, transport failures included.
pub async fn inspect(session: &Session, token: &[u8]) -> Result<TokenInfo, InspectError> {
    let call = Call::CheckLoginToken {
        token: token.to_vec(),
    };
    let name = call.name();

    match send(session, call).await {
        Ok(Response::LoginTokenInfo(info)) => {
            tracing::debug!(
                "Token belongs to {} {} on {}",
                info.app_name,
                info.app_version,
                info.datacenter_id
            );
            Ok(info)
        }
        Ok(other @ (Response::LoginToken(_) | Response::Updates(_))) => {
            tracing::warn!("{} returned unexpected {}", name, other.name());
            Err(InspectError::Generic)
        }
        Err(e) => {
            let error = InspectError::from_rpc(&e);
            if error == InspectError::Generic {
                tracing::warn!("{} failed: {}", name, e);
            }
            Err(error)
        }
    }
}

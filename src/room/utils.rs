use crate::room::config::RoomConfig;
use crate::room::consts::AUTHORIZATION_HEADER;
use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

pub fn build_request(config: &RoomConfig) -> tokio_tungstenite::tungstenite::Result<Request> {
    let mut request =
        format!("{}/rtc?identity={}", config.url(), config.identity()).into_client_request()?;
    request.headers_mut().insert(
        AUTHORIZATION_HEADER,
        format!("Bearer {}", config.token().expose_secret())
            .as_str()
            .parse()?,
    );
    Ok(request)
}

//! Windows integrated (NTLMv2) authentication.

use super::{
    http_client, into_reply, post, Credentials, Reply, Request, Transport, TransportError,
    TransportOptions,
};

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;
use reqwest::{header::WWW_AUTHENTICATE, StatusCode};
use std::time::{SystemTime, UNIX_EPOCH};

type HmacMd5 = Hmac<Md5>;

const SIGNATURE: &[u8] = b"NTLMSSP\0";

// UNICODE | OEM | REQUEST_TARGET | NTLM | ALWAYS_SIGN | EXTENDED_SESSIONSECURITY
const NEGOTIATE_FLAGS: u32 =
    0x0000_0001 | 0x0000_0002 | 0x0000_0004 | 0x0000_0200 | 0x0000_8000 | 0x0008_0000;
const AUTHENTICATE_FLAGS: u32 = 0x0000_0001 | 0x0000_0200 | 0x0000_8000 | 0x0008_0000;

// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_EPOCH_OFFSET: u64 = 11_644_473_600;

/// Runs the NTLM negotiate/challenge/authenticate exchange before posting
/// the envelope. A `DOMAIN\user` username carries the domain.
#[derive(Debug, Clone)]
pub struct WindowsHttpAuthenticated {
    username: String,
    domain: String,
    password: String,
    workstation: String,
}

impl WindowsHttpAuthenticated {
    pub fn new(credentials: Credentials) -> Self {
        let (domain, username) = match credentials.username.split_once('\\') {
            Some((domain, username)) => (domain.to_owned(), username.to_owned()),
            None => (String::new(), credentials.username),
        };

        Self {
            username,
            domain,
            password: credentials.password,
            workstation: "WORKSTATION".to_owned(),
        }
    }

    fn negotiate_message(&self) -> Vec<u8> {
        let mut message = SIGNATURE.to_vec();
        message.extend_from_slice(&1u32.to_le_bytes());
        message.extend_from_slice(&NEGOTIATE_FLAGS.to_le_bytes());

        let domain = self.domain.as_bytes();
        let workstation = self.workstation.as_bytes();

        push_buffer(&mut message, domain.len(), 32 + workstation.len());
        push_buffer(&mut message, workstation.len(), 32);

        message.extend_from_slice(workstation);
        message.extend_from_slice(domain);
        message
    }

    fn authenticate_message(&self, challenge: &[u8]) -> Result<Vec<u8>, TransportError> {
        if challenge.len() < 32 || !challenge.starts_with(SIGNATURE) {
            return Err(TransportError::Authentication(
                "malformed NTLM challenge".to_owned(),
            ));
        }

        let server_challenge = &challenge[24..32];
        let client_challenge: [u8; 8] = rand::random();

        let key = self.ntlmv2_hash()?;
        let lm_response = lmv2_response(&key, server_challenge, &client_challenge)?;
        let nt_response = ntlmv2_response(&key, server_challenge, &client_challenge, filetime())?;

        let domain = utf16(&self.domain);
        let user = utf16(&self.username);
        let workstation = utf16(&self.workstation);

        let lm_offset = 88;
        let nt_offset = lm_offset + lm_response.len();
        let domain_offset = nt_offset + nt_response.len();
        let user_offset = domain_offset + domain.len();
        let workstation_offset = user_offset + user.len();
        let end = workstation_offset + workstation.len();

        let mut message = SIGNATURE.to_vec();
        message.extend_from_slice(&3u32.to_le_bytes());
        push_buffer(&mut message, lm_response.len(), lm_offset);
        push_buffer(&mut message, nt_response.len(), nt_offset);
        push_buffer(&mut message, domain.len(), domain_offset);
        push_buffer(&mut message, user.len(), user_offset);
        push_buffer(&mut message, workstation.len(), workstation_offset);
        // Empty session key.
        push_buffer(&mut message, 0, end);
        message.extend_from_slice(&AUTHENTICATE_FLAGS.to_le_bytes());
        // Version and MIC.
        message.extend_from_slice(&[0u8; 24]);

        message.extend_from_slice(&lm_response);
        message.extend_from_slice(&nt_response);
        message.extend_from_slice(&domain);
        message.extend_from_slice(&user);
        message.extend_from_slice(&workstation);

        Ok(message)
    }

    fn ntlmv2_hash(&self) -> Result<[u8; 16], TransportError> {
        let mut hasher = Md4::new();
        hasher.update(utf16(&self.password));

        let mut nt_hash = [0u8; 16];
        nt_hash.copy_from_slice(&hasher.finalize());

        let identity = format!("{}{}", self.username.to_uppercase(), self.domain);
        hmac_md5(&nt_hash, &utf16(&identity))
    }
}

impl Transport for WindowsHttpAuthenticated {
    fn name(&self) -> &'static str {
        "ntlm"
    }

    fn send(&self, request: &Request, options: &TransportOptions) -> Result<Reply, TransportError> {
        tracing::debug!(url = %request.url, "Negotiating NTLM");

        let client = http_client(options)?;

        let negotiate = client
            .post(&request.url)
            .header(
                "Authorization",
                format!("NTLM {}", STANDARD.encode(self.negotiate_message())),
            )
            .send()?;

        if negotiate.status() != StatusCode::UNAUTHORIZED {
            return Err(TransportError::Authentication(format!(
                "expected an NTLM challenge, got HTTP {}",
                negotiate.status().as_u16()
            )));
        }

        let challenge = negotiate
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| value.strip_prefix("NTLM "))
            .ok_or_else(|| TransportError::Authentication("no NTLM challenge".to_owned()))?;

        let challenge = STANDARD
            .decode(challenge.trim())
            .map_err(|err| TransportError::Authentication(err.to_string()))?;

        let authenticate = STANDARD.encode(self.authenticate_message(&challenge)?);

        into_reply(
            post(&client, request)?
                .header("Authorization", format!("NTLM {}", authenticate))
                .send()?,
        )
    }
}

fn push_buffer(message: &mut Vec<u8>, length: usize, offset: usize) {
    let length = length as u16;
    message.extend_from_slice(&length.to_le_bytes());
    message.extend_from_slice(&length.to_le_bytes());
    message.extend_from_slice(&(offset as u32).to_le_bytes());
}

fn utf16(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn filetime() -> u64 {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    (seconds + FILETIME_EPOCH_OFFSET) * 10_000_000
}

fn lmv2_response(
    key: &[u8; 16],
    server_challenge: &[u8],
    client_challenge: &[u8; 8],
) -> Result<Vec<u8>, TransportError> {
    let mut data = server_challenge.to_vec();
    data.extend_from_slice(client_challenge);

    let mut response = hmac_md5(key, &data)?.to_vec();
    response.extend_from_slice(client_challenge);
    Ok(response)
}

fn ntlmv2_response(
    key: &[u8; 16],
    server_challenge: &[u8],
    client_challenge: &[u8; 8],
    timestamp: u64,
) -> Result<Vec<u8>, TransportError> {
    let mut blob = Vec::new();
    blob.extend_from_slice(&0x0101u32.to_le_bytes());
    blob.extend_from_slice(&0u32.to_le_bytes());
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&0u32.to_le_bytes());

    let mut data = server_challenge.to_vec();
    data.extend_from_slice(&blob);

    let mut response = hmac_md5(key, &data)?.to_vec();
    response.extend_from_slice(&blob);
    Ok(response)
}

fn hmac_md5(key: &[u8], data: &[u8]) -> Result<[u8; 16], TransportError> {
    let mut mac = HmacMd5::new_from_slice(key)
        .map_err(|err| TransportError::Authentication(err.to_string()))?;
    mac.update(data);

    let mut digest = [0u8; 16];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
    }

    #[test]
    fn hmac_md5_matches_rfc_2104_vector() {
        let digest = hmac_md5(&[0x0b; 16], b"Hi There").unwrap();
        assert_eq!(hex(&digest), "9294727a3638bb1c13f48ef8158bfc9d");
    }

    #[test]
    fn hmac_md5_accepts_keys_longer_than_a_block() {
        // RFC 2202 test case 6
        let digest = hmac_md5(
            &[0xaa; 80],
            b"Test Using Larger Than Block-Size Key - Hash Key First",
        )
        .unwrap();
        assert_eq!(hex(&digest), "6b1ab7fe4bd7bf8f0b62e6ce61b9d0cd");
    }

    #[test]
    fn ntlmv2_hash_matches_reference_vector() {
        // MS-NLMP 4.2.4.1.1
        let transport = WindowsHttpAuthenticated::new(Credentials::new("Domain\\User", "Password"));
        assert_eq!(
            hex(&transport.ntlmv2_hash().unwrap()),
            "0c868a403bfd7a93a3001ef22ef02e3f"
        );
    }

    #[test]
    fn splits_domain_from_username() {
        let transport = WindowsHttpAuthenticated::new(Credentials::new("CORP\\ann", "secret"));
        assert_eq!(transport.domain, "CORP");
        assert_eq!(transport.username, "ann");
    }

    #[test]
    fn negotiate_message_has_signature_and_type() {
        let message = WindowsHttpAuthenticated::new(Credentials::new("ann", "secret")).negotiate_message();

        assert!(message.starts_with(SIGNATURE));
        assert_eq!(&message[8..12], &1u32.to_le_bytes());
    }

    #[test]
    fn short_challenge_is_rejected() {
        let transport = WindowsHttpAuthenticated::new(Credentials::new("ann", "secret"));
        assert!(matches!(
            transport.authenticate_message(b"NTLMSSP\0"),
            Err(TransportError::Authentication(_))
        ));
    }

    #[test]
    fn handshake_answers_challenge() {
        let mut challenge = SIGNATURE.to_vec();
        challenge.extend_from_slice(&2u32.to_le_bytes());
        challenge.resize(48, 0);
        let challenge = format!("NTLM {}", STANDARD.encode(challenge));

        let mut server = mockito::Server::new();
        let negotiate = server
            .mock("POST", "/wsman")
            .match_header("authorization", mockito::Matcher::Regex("^NTLM TlRMTVNTUAAB".into()))
            .with_status(401)
            .with_header("www-authenticate", &challenge)
            .create();
        let authenticate = server
            .mock("POST", "/wsman")
            .match_header("authorization", mockito::Matcher::Regex("^NTLM TlRMTVNTUAAD".into()))
            .match_body("<envelope/>")
            .with_status(200)
            .with_body("<ok/>")
            .create();

        let reply = WindowsHttpAuthenticated::new(Credentials::new("CORP\\ann", "secret"))
            .send(
                &Request {
                    url: format!("{}/wsman", server.url()),
                    message: b"<envelope/>".to_vec(),
                    headers: Default::default(),
                },
                &Default::default(),
            )
            .unwrap();

        negotiate.assert();
        authenticate.assert();
        assert_eq!(&reply.message[..], b"<ok/>");
    }
}

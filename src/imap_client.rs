use std::time::Duration;

use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use async_trait::async_trait;
use futures::stream::StreamExt;
use log::{debug, info};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use crate::config::MailboxConfig;

/// Bound applied to every network step so an unresponsive server cannot
/// stall a reconciliation cycle indefinitely.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
}

/// The narrow mailbox surface the reconciliation loop needs: status
/// classification only cares about the presence of a matching message and
/// its subject line, never message bodies.
#[async_trait]
pub trait MailboxSession {
    /// Sequence numbers of all inbox messages from the given sender, in
    /// mailbox-native order (ascending sequence number, oldest first).
    /// Empty when nothing matches.
    async fn search_from_sender(&mut self, mail_address: &str) -> Result<Vec<u32>, MailboxError>;

    /// Decoded Subject header of one message.
    async fn fetch_subject(&mut self, message_id: u32) -> Result<String, MailboxError>;
}

pub struct ImapClient {
    session: Session<TlsStream<Compat<TcpStream>>>,
}

impl ImapClient {
    /// Opens an authenticated TLS session. No partial success: on any
    /// failure the caller holds nothing that needs releasing.
    pub async fn connect(config: &MailboxConfig) -> Result<Self, MailboxError> {
        info!("Connecting to IMAP server {}:{}", config.server, config.port);

        let tcp_stream = timeout(
            OPERATION_TIMEOUT,
            TcpStream::connect((config.server.as_str(), config.port)),
        )
        .await
        .map_err(|_| MailboxError::Timeout("connect"))?
        .map_err(|e| MailboxError::Connection(e.to_string()))?;

        // async-imap wants a futures-io stream
        let tls = TlsConnector::new();
        let tls_stream = timeout(OPERATION_TIMEOUT, tls.connect(&config.server, tcp_stream.compat()))
            .await
            .map_err(|_| MailboxError::Timeout("TLS handshake"))?
            .map_err(|e| MailboxError::Connection(e.to_string()))?;

        let client = async_imap::Client::new(tls_stream);

        let session = timeout(OPERATION_TIMEOUT, client.login(&config.address, &config.password))
            .await
            .map_err(|_| MailboxError::Timeout("login"))?
            .map_err(|e| MailboxError::Authentication(format!("{:?}", e.0)))?;

        info!("IMAP session established");

        Ok(ImapClient { session })
    }

    pub async fn logout(mut self) -> Result<(), MailboxError> {
        debug!("Closing IMAP session");
        timeout(OPERATION_TIMEOUT, self.session.logout())
            .await
            .map_err(|_| MailboxError::Timeout("logout"))?
            .map_err(|e| MailboxError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl MailboxSession for ImapClient {
    async fn search_from_sender(&mut self, mail_address: &str) -> Result<Vec<u32>, MailboxError> {
        timeout(OPERATION_TIMEOUT, self.session.select("INBOX"))
            .await
            .map_err(|_| MailboxError::Timeout("select"))?
            .map_err(|e| MailboxError::Search(e.to_string()))?;

        let criteria = format!("FROM \"{}\"", mail_address);
        debug!("Search criteria: {}", criteria);

        let message_ids = timeout(OPERATION_TIMEOUT, self.session.search(&criteria))
            .await
            .map_err(|_| MailboxError::Timeout("search"))?
            .map_err(|e| MailboxError::Search(e.to_string()))?;

        // The SEARCH result set is unordered in memory; ascending sequence
        // number restores mailbox-native order.
        let mut ids: Vec<u32> = message_ids.into_iter().collect();
        ids.sort_unstable();

        debug!("Found {} message(s) from {}", ids.len(), mail_address);
        Ok(ids)
    }

    async fn fetch_subject(&mut self, message_id: u32) -> Result<String, MailboxError> {
        debug!("Fetching headers of message {}", message_id);

        let messages_stream = timeout(
            OPERATION_TIMEOUT,
            self.session.fetch(message_id.to_string(), "RFC822.HEADER"),
        )
        .await
        .map_err(|_| MailboxError::Timeout("fetch"))?
        .map_err(|e| MailboxError::Fetch(e.to_string()))?;

        let messages: Vec<_> = messages_stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();

        let message = messages
            .first()
            .ok_or_else(|| MailboxError::Fetch(format!("message {} not found", message_id)))?;
        let header = message
            .header()
            .ok_or_else(|| MailboxError::Fetch(format!("message {} has no header data", message_id)))?;

        // mail-parser handles RFC 2047 encoded subjects
        let subject = mail_parser::MessageParser::default()
            .parse(header)
            .and_then(|parsed| parsed.subject().map(|s| s.to_string()))
            .unwrap_or_else(|| "(no subject)".to_string());

        Ok(subject)
    }
}

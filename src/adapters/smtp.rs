use crate::adapters::mail::build_message;
use crate::config::credentials::{MailCredentials, TransportProtocol, TransportSecret};
use crate::domain::model::Digest;
use crate::domain::ports::Dispatcher;
use crate::utils::error::{GradiatorError, Result};
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
const HELLO_NAME: &str = "localhost";

/// The parts of an open SMTP session the dispatcher drives.
pub trait SmtpSession {
    fn send(&mut self, envelope: &Envelope, email: &[u8]) -> Result<()>;
    fn quit(&mut self) -> Result<()>;
    fn abort(&mut self);
}

impl SmtpSession for SmtpConnection {
    fn send(&mut self, envelope: &Envelope, email: &[u8]) -> Result<()> {
        let response = SmtpConnection::send(self, envelope, email)?;
        tracing::debug!("Server answered {:?}", response.code());
        Ok(())
    }

    fn quit(&mut self) -> Result<()> {
        SmtpConnection::quit(self)?;
        Ok(())
    }

    fn abort(&mut self) {
        SmtpConnection::abort(self);
    }
}

/// One authenticated SMTP session shared by every digest of the batch.
pub struct SmtpDispatcher<S: SmtpSession = SmtpConnection> {
    session: Option<S>,
    host: String,
}

impl SmtpDispatcher<SmtpConnection> {
    pub fn connect(credentials: &MailCredentials, secret: &TransportSecret) -> Result<Self> {
        let host = credentials.host.clone();
        let hello = ClientId::Domain(HELLO_NAME.to_string());
        let tls = TlsParameters::new(host.clone())?;

        tracing::info!(
            "Connecting to {}:{} ({:?})",
            host,
            credentials.port,
            credentials.protocol
        );
        let server = (host.as_str(), credentials.port);
        let mut connection = match credentials.protocol {
            TransportProtocol::ImplicitTls => {
                SmtpConnection::connect(server, Some(CONNECT_TIMEOUT), &hello, Some(&tls), None)?
            }
            TransportProtocol::StartTls => {
                let mut connection =
                    SmtpConnection::connect(server, Some(CONNECT_TIMEOUT), &hello, None, None)?;
                connection.starttls(&tls, &hello)?;
                connection
            }
        };

        // lettre keeps its own copy of the password; it is dropped right after login.
        {
            let login = Credentials::new(
                credentials.username.clone(),
                secret.expose().to_string(),
            );
            connection.auth(&[Mechanism::Plain, Mechanism::Login], &login)?;
        }
        tracing::info!("Authenticated as {}", credentials.username);

        Ok(Self::with_session(connection, host))
    }
}

impl<S: SmtpSession> SmtpDispatcher<S> {
    /// Wraps an already authenticated session.
    pub fn with_session(session: S, host: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            host: host.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

impl<S: SmtpSession> Dispatcher for SmtpDispatcher<S> {
    fn dispatch(&mut self, nick: &str, digest: &Digest) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| GradiatorError::SessionClosed {
                host: self.host.clone(),
            })?;
        let message = build_message(digest)?;

        tracing::info!("Sending digest to {} ...", nick);
        session.send(message.envelope(), &message.formatted())?;
        tracing::info!("... done.");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            session.quit()?;
            tracing::info!("Closed SMTP session with {}", self.host);
        }
        Ok(())
    }
}

impl<S: SmtpSession> Drop for SmtpDispatcher<S> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            tracing::warn!("Aborting unfinished SMTP session with {}", self.host);
            session.abort();
        }
    }
}

//! TLS trust policy for the profile service
//!
//! Certificates are verified against the bundled WebPKI roots, with one
//! exception: a chain that presents a self-signed certificate, either the
//! end-entity itself or one sent along as an intermediate, is accepted even
//! though WebPKI cannot anchor it. That covers both a bare self-signed leaf
//! (which WebPKI reports as `UnknownIssuer`, or as a CA used as an end
//! entity when it carries `CA:TRUE`) and a chain ending in a private root.
//! The end-entity must still match the server name and be within its
//! validity period. Every other verification error fails the handshake.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use x509_parser::certificate::X509Certificate;

use crate::error::{Error, Result};

/// Client TLS configuration with the tolerant verifier installed
pub fn client_config() -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = SelfSignedTolerantVerifier::new(Arc::clone(&provider))?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(format!("unsupported protocol versions: {}", e)))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    Ok(config)
}

/// WebPKI verification that lets self-signed chains through
#[derive(Debug)]
pub struct SelfSignedTolerantVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl SelfSignedTolerantVerifier {
    pub fn new(provider: Arc<CryptoProvider>) -> Result<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| Error::Tls(format!("failed to build certificate verifier: {}", e)))?;

        Ok(Self { inner })
    }
}

impl ServerCertVerifier for SelfSignedTolerantVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let error = match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(verified) => return Ok(verified),
            Err(error) => error,
        };

        match error {
            rustls::Error::InvalidCertificate(ref reason)
                if is_untrusted_issuer(reason) && presents_self_signed(end_entity, intermediates) =>
            {
                check_end_entity(end_entity, server_name, now)?;
                tracing::debug!(reason = ?reason, "Accepting self-signed certificate chain");
                Ok(ServerCertVerified::assertion())
            }
            other => Err(other),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Errors WebPKI raises for a chain it cannot anchor in a trusted root.
///
/// A self-signed leaf with `CA:TRUE` is reported through the catch-all
/// `Other` before issuer lookup happens.
fn is_untrusted_issuer(reason: &CertificateError) -> bool {
    matches!(reason, CertificateError::UnknownIssuer | CertificateError::Other(_))
}

fn presents_self_signed(end_entity: &CertificateDer<'_>, intermediates: &[CertificateDer<'_>]) -> bool {
    std::iter::once(end_entity)
        .chain(intermediates)
        .any(|cert| is_self_issued(cert.as_ref()))
}

/// Whether a DER certificate names itself as its issuer
fn is_self_issued(der: &[u8]) -> bool {
    x509_parser::parse_x509_certificate(der)
        .is_ok_and(|(_, cert)| cert.issuer().as_raw() == cert.subject().as_raw())
}

/// The checks a tolerated chain must still pass: server name and validity
fn check_end_entity(
    end_entity: &CertificateDer<'_>,
    server_name: &ServerName<'_>,
    now: UnixTime,
) -> std::result::Result<(), rustls::Error> {
    let parsed = ParsedCertificate::try_from(end_entity)?;
    rustls::client::verify_server_name(&parsed, server_name)?;

    let (_, cert) = x509_parser::parse_x509_certificate(end_entity.as_ref())
        .map_err(|_| rustls::Error::InvalidCertificate(CertificateError::BadEncoding))?;
    check_validity(&cert, now)
}

fn check_validity(cert: &X509Certificate<'_>, now: UnixTime) -> std::result::Result<(), rustls::Error> {
    let now = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);
    let validity = cert.validity();

    if now < validity.not_before.timestamp() {
        return Err(rustls::Error::InvalidCertificate(CertificateError::NotValidYet));
    }
    if now > validity.not_after.timestamp() {
        return Err(rustls::Error::InvalidCertificate(CertificateError::Expired));
    }
    Ok(())
}

use http::StatusCode;

/// Domain errors that know how they surface over HTTP
///
/// The gateway speaks several wire protocols, each with its own error body.
/// Implementors only describe the status, a machine-readable category and a
/// client-safe message; the route layer renders the protocol-specific shape.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error category (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}
